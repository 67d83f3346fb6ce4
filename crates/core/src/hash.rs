//! Host hashing for the short-hash lookup protocol.
//!
//! A host is hashed as upper-case hex SHA-256 of `"<host>/"`. Only the first
//! [`SHORT_HASH_LENGTH`] hex characters of that digest are sent to the lookup
//! backend; full hashes are used as cache keys and to match response lines.

use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Number of leading hex characters sent to the backend.
pub const SHORT_HASH_LENGTH: usize = 4;

/// Full hash to host, for reverse lookup when parsing a response.
pub type HashesMap = HashMap<String, String>;

/// Full and short hash of one candidate host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashEntry {
    pub full_hash: String,
    pub short_hash: String,
}

impl HashEntry {
    pub fn for_host(host: &str) -> Self {
        let full_hash = create_hash(host);
        let short_hash = short_hash(&full_hash).to_string();
        Self { full_hash, short_hash }
    }
}

/// Compute the upper-case hex SHA-256 of `"<host>/"`.
pub fn create_hash(host: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(host.as_bytes());
    hasher.update(b"/");
    hex::encode_upper(hasher.finalize())
}

/// Prefix of a full hash sent to the backend.
pub fn short_hash(full_hash: &str) -> &str {
    full_hash.get(..SHORT_HASH_LENGTH).unwrap_or(full_hash)
}

/// Map every host's full hash back to the host.
pub fn create_hashes_map(hosts: &[String]) -> HashesMap {
    hosts.iter().map(|host| (create_hash(host), host.clone())).collect()
}
