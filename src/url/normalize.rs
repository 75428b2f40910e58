use crate::{UrlError, UrlResult};
use url::Url;

/// List of tracking query parameters to remove from detail URLs
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
];

/// Resolves a card link into the absolute detail URL used as the dedup key
///
/// # Steps
///
/// 1. Join the href onto `base` (absolute hrefs are kept as they are)
/// 2. Reject anything that is not http(s) or has no host
/// 3. Drop the fragment
/// 4. Drop tracking query parameters, keeping the rest in order
/// 5. Drop an empty query string
///
/// # Examples
///
/// ```
/// use carfeed::url::resolve_detail_url;
///
/// let url = resolve_detail_url(
///     "https://www.autoscout24.com",
///     "/offers/vw-golf-abc?utm_source=list#gallery",
/// )
/// .unwrap();
/// assert_eq!(url, "https://www.autoscout24.com/offers/vw-golf-abc");
/// ```
pub fn resolve_detail_url(base: &str, href: &str) -> UrlResult<String> {
    let base = Url::parse(base).map_err(|e| UrlError::Parse(e.to_string()))?;
    let mut url = base
        .join(href.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(url.to_string()));
    }

    url.set_fragment(None);

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if retained.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(retained);
    }

    Ok(url.to_string())
}

/// Returns `scheme://host[:port]` of a URL
pub fn origin_of(url_str: &str) -> UrlResult<String> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    match url.origin() {
        url::Origin::Tuple(..) => Ok(url.origin().ascii_serialization()),
        url::Origin::Opaque(_) => Err(UrlError::MissingHost(url_str.to_string())),
    }
}
