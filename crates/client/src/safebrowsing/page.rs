//! Warning page that blocked navigations are diverted to.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left unescaped in a URI component.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Default warning page path.
pub const SAFEBROWSING_PAGE_PATH: &str = "pages/safebrowsing.html";

/// Whether a list reports malware rather than phishing.
pub fn is_malware_list(list: &str) -> bool {
    list.contains("malware")
}

/// Build the warning page URL for a blocked navigation.
pub fn warning_page_url(page: &str, host: &str, request_url: &str, referrer_url: &str, list: &str) -> String {
    format!(
        "{page}?malware={}&host={}&url={}&ref={}",
        is_malware_list(list),
        encode(host),
        encode(request_url),
        encode(referrer_url),
    )
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}
