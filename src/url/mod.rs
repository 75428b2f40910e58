//! URL handling for Carfeed
//!
//! Builds paginated search URLs and turns the relative links found on result cards into
//! stable absolute detail URLs, which serve as the dedup key everywhere else.

mod normalize;

pub use normalize::{origin_of, resolve_detail_url};

use crate::{UrlError, UrlResult};
use url::Url;

/// Query parameter carrying the result page number
pub const PAGE_PARAM: &str = "page";

/// Builds the URL of one results page
///
/// Sets the `page` query parameter, replacing any existing value and preserving every
/// other parameter in its original order.
///
/// # Examples
///
/// ```
/// use carfeed::url::build_page_url;
///
/// let url = build_page_url("https://www.autoscout24.com/lst?sort=standard", 3).unwrap();
/// assert_eq!(url, "https://www.autoscout24.com/lst?sort=standard&page=3");
/// ```
pub fn build_page_url(start_url: &str, page: u32) -> UrlResult<String> {
    let mut url = Url::parse(start_url).map_err(|e| UrlError::Parse(e.to_string()))?;

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(PAGE_PARAM, &page.to_string());

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_param_appended() {
        let url = build_page_url("https://www.autoscout24.com/lst?sort=standard", 1).unwrap();
        assert_eq!(url, "https://www.autoscout24.com/lst?sort=standard&page=1");
    }

    #[test]
    fn test_page_param_replaced() {
        let url =
            build_page_url("https://www.autoscout24.com/lst?page=7&sort=standard", 2).unwrap();
        assert_eq!(url, "https://www.autoscout24.com/lst?sort=standard&page=2");
    }

    #[test]
    fn test_page_param_without_query() {
        let url = build_page_url("https://www.autoscout24.com/lst", 4).unwrap();
        assert_eq!(url, "https://www.autoscout24.com/lst?page=4");
    }

    #[test]
    fn test_multi_valued_params_preserved() {
        let url = build_page_url("https://example.com/lst?fuel=B&fuel=D", 2).unwrap();
        assert_eq!(url, "https://example.com/lst?fuel=B&fuel=D&page=2");
    }

    #[test]
    fn test_invalid_start_url() {
        assert!(matches!(
            build_page_url("not a url", 1),
            Err(UrlError::Parse(_))
        ));
    }
}
