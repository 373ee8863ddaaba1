//! URL handling for catalog pages
//!
//! This module builds listing-page URLs, resolves hrefs found on pages, and
//! derives product identifiers from product URLs.

use url::Url;

/// Path marker that precedes the product identifier in product URLs
const PRODUCT_PATH_MARKER: &str = "/p/";

/// Builds the URL of a listing page from the category's base URL
///
/// The page index is 0-based and appended as query parameters exactly as the
/// catalog search expects them.
///
/// # Examples
///
/// ```
/// use stockwatch::url::listing_page_url;
///
/// assert_eq!(
///     listing_page_url("https://shop.test/search/?q=new", 2),
///     "https://shop.test/search/?q=new&page=2&pageSize="
/// );
/// ```
pub fn listing_page_url(base_url: &str, page_index: u32) -> String {
    format!("{}&page={}&pageSize=", base_url, page_index)
}

/// Returns the product identifier encoded in a product URL
///
/// This is the text after the last `/p/` segment, without query string or
/// fragment. When `trim_trailing_slash` is set a trailing `/` is removed as
/// well. URLs without the marker yield an empty string.
///
/// # Examples
///
/// ```
/// use stockwatch::url::product_id;
///
/// assert_eq!(product_id("https://shop.test/paint/p/12345", false), "12345");
/// assert_eq!(product_id("https://shop.test/paint/p/ABC-1/", true), "ABC-1");
/// assert_eq!(product_id("https://shop.test/about", false), "");
/// ```
pub fn product_id(url: &str, trim_trailing_slash: bool) -> String {
    let Some(idx) = url.rfind(PRODUCT_PATH_MARKER) else {
        return String::new();
    };

    let tail = &url[idx + PRODUCT_PATH_MARKER.len()..];
    let tail = tail.split(['?', '#']).next().unwrap_or_default();

    if trim_trailing_slash {
        tail.trim_end_matches('/').to_string()
    } else {
        tail.to_string()
    }
}

/// Resolves an href against the page it was found on
///
/// Returns None for empty hrefs, fragment-only links, `javascript:` links and
/// anything that does not resolve to an HTTP(S) URL.
pub fn resolve_href(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    let resolved = base_url.join(href).ok()?;
    if resolved.scheme() == "http" || resolved.scheme() == "https" {
        Some(resolved)
    } else {
        None
    }
}
