//! Request URL to lookup host.

/// Error type for host extraction failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Extract the lower-cased host of an http(s) URL.
///
/// IPv6 hosts keep their brackets, matching how hostnames appear in
/// navigations and therefore how they were hashed by the lookup service.
pub fn host_of(input: &str) -> Result<String, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(host.to_lowercase()),
        _ => Err(UrlError::MissingHost),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of_basic() {
        assert_eq!(host_of("http://test.yandex.ru/someurl.html").unwrap(), "test.yandex.ru");
    }

    #[test]
    fn test_host_of_lowercases_and_drops_port() {
        assert_eq!(host_of("https://WWW.Example.COM:8443/path?q=1#frag").unwrap(), "www.example.com");
    }

    #[test]
    fn test_host_of_ip_literals() {
        assert_eq!(host_of("http://192.168.0.1/").unwrap(), "192.168.0.1");
        assert_eq!(host_of("http://[::1]:8080/").unwrap(), "[::1]");
    }

    #[test]
    fn test_host_of_trims_whitespace() {
        assert_eq!(host_of("  https://example.com  ").unwrap(), "example.com");
    }

    #[test]
    fn test_host_of_empty() {
        assert!(matches!(host_of(""), Err(UrlError::Empty)));
        assert!(matches!(host_of("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_host_of_unsupported_scheme() {
        assert!(matches!(host_of("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(host_of("chrome-extension://abc/page.html"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_host_of_relative() {
        assert!(matches!(host_of("/just/a/path"), Err(UrlError::InvalidUrl(_))));
    }
}
