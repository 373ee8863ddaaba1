use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a results file can be traced back to the
/// configuration that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&content)))
}

/// Loads a configuration and returns both the config and its hash
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok((Config, String))` - Validated configuration and the hex SHA-256 of the file
/// * `Err(ConfigError)` - Failed to read, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use stockwatch::config::load_config_with_hash;
///
/// let (config, hash) = load_config_with_hash(Path::new("stockwatch.toml")).unwrap();
/// println!("{} categories (config {})", config.catalog.categories.len(), hash);
/// ```
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogFamily;
    use crate::state::{Badge, StockStatus};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID: &str = r#"
[scraper]
throttle-delay-ms = 500
max-attempts = 4

[output]
checkpoint-path = "./out/checkpoint.json"
results-path = "./out/results.json"
report-path = "./out/report.md"

[testing]
enabled = true
items-per-page = 5

[catalog]
family = "dss"
name = "Discount School Supply"

[[catalog.category]]
url = "https://shop.test/search/?q=:relevance:badge:new"
badge = "New"
stock-status = "In Stock"

[[catalog.category]]
url = "https://shop.test/search/?q=:relevance:badge:soon"
badge = "Coming Soon"
stock-status = "Coming Soon"

[selectors]
product-grid = "section.grid"
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scraper.throttle_delay_ms, 500);
        assert_eq!(config.scraper.max_attempts, 4);
        // Unset keys keep their defaults
        assert_eq!(config.scraper.settle_delay_ms, 2000);
        assert_eq!(config.scraper.page_timeout_ms, 160_000);

        assert_eq!(config.catalog.family, CatalogFamily::Dss);
        assert_eq!(config.catalog.categories.len(), 2);
        assert_eq!(config.catalog.categories[1].badge, Badge::ComingSoon);
        assert_eq!(
            config.catalog.categories[1].stock_status,
            StockStatus::ComingSoon
        );

        assert_eq!(config.testing.item_cap(), Some(5));
        assert_eq!(config.testing.page_cap(), Some(2));
        assert_eq!(config.selector_set().product_grid, "section.grid");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config(
            r#"
[catalog]
family = "rgs"

[[catalog.category]]
url = "https://shop.test/search/?q=oos"
badge = "Out of Stock"
stock-status = "Out of Stock"
"#,
        )
        .unwrap();

        assert_eq!(config.output.checkpoint_path, "./checkpoint.json");
        assert!(config.browser.user_agent.contains("Chrome/91"));
        assert_eq!(config.testing.item_cap(), None);
        assert_eq!(config.catalog.display_name(), "rgs");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/stockwatch.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_badge_is_parse_error() {
        let result = parse_config(
            r#"
[catalog]
family = "dss"

[[catalog.category]]
url = "https://shop.test/search/?q=x"
badge = "Bestseller"
stock-status = "In Stock"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config(
            r#"
[scraper]
max-attempts = 0

[catalog]
family = "dss"

[[catalog.category]]
url = "https://shop.test/search/?q=x"
badge = "New"
stock-status = "In Stock"
"#,
        );
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_load_config_with_hash() {
        let file = create_temp_config(VALID);
        let other = create_temp_config(&VALID.replace("500", "750"));

        let (_, hash) = load_config_with_hash(file.path()).unwrap();
        let (config, other_hash) = load_config_with_hash(other.path()).unwrap();

        assert_eq!(config.scraper.throttle_delay_ms, 750);
        assert_ne!(hash, other_hash);
    }
}
