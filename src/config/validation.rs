use crate::config::types::{
    CatalogConfig, Config, OutputConfig, ScraperConfig, SelectorOverrides, TestingConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_output_config(&config.output)?;
    validate_testing_config(&config.testing)?;
    validate_catalog(&config.catalog)?;
    validate_selector_overrides(&config.selectors)?;

    if config.browser.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates timing and retry settings
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    // Exponential backoff of 2^attempt must stay representable
    if config.max_attempts > 16 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be <= 16, got {}",
            config.max_attempts
        )));
    }

    for (name, value) in [
        ("grid-timeout-ms", config.grid_timeout_ms),
        ("navigation-timeout-ms", config.navigation_timeout_ms),
        ("page-timeout-ms", config.page_timeout_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be > 0", name)));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("checkpoint-path", &config.checkpoint_path),
        ("results-path", &config.results_path),
        ("report-path", &config.report_path),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.checkpoint_path == config.results_path {
        return Err(ConfigError::Validation(
            "checkpoint-path and results-path must differ".to_string(),
        ));
    }

    Ok(())
}

fn validate_testing_config(config: &TestingConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if config.items_per_page < 1 {
        return Err(ConfigError::Validation(
            "items-per-page must be >= 1 when testing is enabled".to_string(),
        ));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1 when testing is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Validates the catalog categories
fn validate_catalog(config: &CatalogConfig) -> Result<(), ConfigError> {
    if config.categories.is_empty() {
        return Err(ConfigError::Validation(
            "catalog must have at least one category".to_string(),
        ));
    }

    for category in &config.categories {
        let url = Url::parse(&category.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid category URL '{}': {}", category.url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Category URL '{}' must use HTTP(S)",
                category.url
            )));
        }
    }

    // Checkpoint files are keyed by badge
    for (i, category) in config.categories.iter().enumerate() {
        if config.categories[..i]
            .iter()
            .any(|earlier| earlier.badge == category.badge)
        {
            return Err(ConfigError::Validation(format!(
                "Badge '{}' is used by more than one category",
                category.badge
            )));
        }
    }

    Ok(())
}

/// Checks that every overridden selector parses
fn validate_selector_overrides(overrides: &SelectorOverrides) -> Result<(), ConfigError> {
    for (name, selector) in overrides.selectors() {
        scraper::Selector::parse(selector).map_err(|_| {
            ConfigError::Validation(format!("Invalid selector for {}: '{}'", name, selector))
        })?;
    }
    Ok(())
}
