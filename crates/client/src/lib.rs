//! Client code for sbguard.
//!
//! This crate provides the HTTP client for the safebrowsing lookup backend and
//! the service that decides whether a navigation has to be diverted to the
//! warning page.

pub mod lookup;
pub mod safebrowsing;
pub mod url;

pub use lookup::{LookupClient, LookupConfig, LookupError, LookupResponse, SafebrowsingLookup};
pub use safebrowsing::{HeadersReceived, RequestType, SafebrowsingService, should_check};
pub use url::{UrlError, host_of};
