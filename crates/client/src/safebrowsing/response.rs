//! Lookup response parsing.
//!
//! Body lines look like `adguard-malware-shavar:35176:AE617C83...`, that is
//! list name, a backend counter, and the full host hash.

use sbguard_core::ResultCache;
use sbguard_core::hash::HashesMap;

/// Bodies larger than this are ignored.
pub const MAX_RESPONSE_BYTES: usize = 10 * 1024;

/// Length of a hex SHA-256 digest.
const FULL_HASH_LENGTH: usize = 64;

/// One parsed response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEntry {
    pub list: String,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed response line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },
}

/// Parse every non-empty line of a response body.
///
/// Hashes are normalized to upper case so they share the cache key space.
pub fn parse_lines(body: &str) -> Result<Vec<ResponseEntry>, ParseError> {
    body.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line_no, line)| parse_line(line).ok_or_else(|| malformed(line_no, line)))
        .collect()
}

fn parse_line(line: &str) -> Option<ResponseEntry> {
    let mut fields = line.split(':');
    let list = fields.next().filter(|list| !list.is_empty())?;
    let _count = fields.next()?;
    let hash = fields.next()?;

    if hash.len() != FULL_HASH_LENGTH || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    Some(ResponseEntry { list: list.to_string(), hash: hash.to_ascii_uppercase() })
}

fn malformed(line: usize, content: &str) -> ParseError {
    ParseError::MalformedLine { line, content: content.to_string() }
}

/// Find the list matching one of the queried hosts.
///
/// Every parsed entry is stored in `cache`, including those for hosts that were
/// not asked about, so later navigations to them are answered locally. Returns
/// `None` for an empty, oversized or malformed body, or when no entry matches
/// `hashes_map`.
pub async fn process_response(body: &str, hashes_map: &HashesMap, cache: &ResultCache) -> Option<String> {
    if body.is_empty() || body.len() > MAX_RESPONSE_BYTES {
        tracing::debug!(bytes = body.len(), "ignoring empty or oversized safebrowsing response");
        return None;
    }

    let entries = match parse_lines(body) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(error = %e, "error parsing safebrowsing response");
            return None;
        }
    };

    for entry in &entries {
        cache.set(entry.hash.clone(), entry.list.clone()).await;
    }

    entries
        .into_iter()
        .find(|entry| hashes_map.contains_key(&entry.hash))
        .map(|entry| entry.list)
}
