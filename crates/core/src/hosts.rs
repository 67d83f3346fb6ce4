//! Host decomposition into lookup candidates.

use std::net::IpAddr;

/// Whether `host` is an IPv4 or IPv6 literal. IPv6 may be bracketed as in URLs.
pub fn is_ip_literal(host: &str) -> bool {
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    bare.parse::<IpAddr>().is_ok()
}

/// Extract the candidate hosts to check for `host`.
///
/// IP literals and hosts with at most two labels are returned as-is. Longer
/// hosts yield every right-aligned suffix of at least two labels, most
/// specific first: `a.b.c.com` gives `a.b.c.com`, `b.c.com`, `c.com`.
pub fn extract_hosts(host: &str) -> Vec<String> {
    if host.is_empty() {
        return Vec::new();
    }

    if is_ip_literal(host) {
        return vec![host.to_string()];
    }

    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() <= 2 {
        return vec![host.to_string()];
    }

    (0..parts.len() - 1).map(|i| parts[i..].join(".")).collect()
}
