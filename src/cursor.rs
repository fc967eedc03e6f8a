//! Pagination cursor extraction
//!
//! The Graph API hands out absolute "next page" URLs. Only the opaque `after`
//! query parameter is kept and forwarded on the following request.

use reqwest::Url;

/// Query parameter carrying the cursor
pub const CURSOR_PARAM: &str = "after";

/// Extract the `after` cursor from a provider-supplied next-page URL
///
/// Returns `None` when no URL is given, when it does not parse as an absolute
/// URL, or when it carries no cursor. Never panics.
pub fn extract_next_cursor(next_page_url: Option<&str>) -> Option<String> {
    let url = Url::parse(next_page_url?).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == CURSOR_PARAM)
        .map(|(_, value)| value.into_owned())
}
