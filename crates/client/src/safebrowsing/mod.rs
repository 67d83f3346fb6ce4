//! Safebrowsing lookup orchestration.
//!
//! [`SafebrowsingService`] owns the result cache, the request cache and the
//! suspend state, and decides for each top-level navigation whether the lookup
//! backend has to be asked at all:
//!
//! 1. A hit in the result cache for any candidate host answers immediately.
//! 2. While suspended after a backend failure, nothing is checked.
//! 3. Short hashes already queried this session are not sent again; if none are
//!    left the host is recorded as allowed.
//! 4. Otherwise the backend is queried and its verdict cached for the host.
//!
//! Every failure fails open: a broken backend or storage never blocks a page.
//!
//! Concurrent lookups of the same unseen host are not coalesced; each issues
//! its own backend request.

pub mod page;
pub mod response;

pub use page::{SAFEBROWSING_PAGE_PATH, is_malware_list, warning_page_url};
pub use response::{MAX_RESPONSE_BYTES, ParseError, ResponseEntry, parse_lines, process_response};

use sbguard_core::hash::{HashEntry, create_hashes_map};
use sbguard_core::hosts::extract_hosts;
use sbguard_core::{
    ALLOW_SENTINEL, Clock, Error, RequestCache, ResultCache, SettingChange, SettingOption, Settings, Storage,
    SuspendState, SystemClock,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

use crate::lookup::SafebrowsingLookup;
use crate::url::host_of;

/// Type of the request reported by the filtering engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    #[default]
    Document,
    Subdocument,
    Stylesheet,
    Script,
    Image,
    Xhr,
    Other,
}

/// Response headers received for a request, as reported by the engine.
#[derive(Debug, Clone)]
pub struct HeadersReceived {
    pub request_type: RequestType,
    pub status_code: u16,
    pub request_url: String,
    pub referrer_url: String,
}

/// Only top-level documents that are not redirects are checked.
pub fn should_check(request_type: RequestType, status_code: u16) -> bool {
    request_type == RequestType::Document && status_code != 301 && status_code != 302
}

pub struct SafebrowsingService {
    settings: Arc<Settings>,
    lookup: Arc<dyn SafebrowsingLookup>,
    clock: Arc<dyn Clock>,
    result_cache: ResultCache,
    request_cache: RequestCache,
    suspend: SuspendState,
    warning_page: String,
    settings_listener: Mutex<Option<JoinHandle<()>>>,
}

impl SafebrowsingService {
    pub fn new(storage: Arc<dyn Storage>, lookup: Arc<dyn SafebrowsingLookup>, settings: Arc<Settings>) -> Self {
        Self {
            settings,
            lookup,
            clock: Arc::new(SystemClock),
            result_cache: ResultCache::new(storage.clone()),
            request_cache: RequestCache::new(),
            suspend: SuspendState::new(storage),
            warning_page: SAFEBROWSING_PAGE_PATH.to_string(),
            settings_listener: Mutex::new(None),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_warning_page(mut self, page: impl Into<String>) -> Self {
        self.warning_page = page.into();
        self
    }

    /// Restore persisted state and start clearing the result cache whenever the
    /// "safebrowsing disabled" setting changes.
    pub async fn init(self: &Arc<Self>) {
        self.result_cache.init().await;
        self.suspend.init().await;

        let changes = self.settings.subscribe();
        let listener = tokio::spawn(listen_for_settings(Arc::downgrade(self), changes));

        if let Some(previous) = self.settings_listener.lock().await.replace(listener) {
            previous.abort();
        }

        let cached = self.result_cache.len().await;
        let suspended = self.suspend.suspended_from().await.is_some();
        tracing::info!(cached, suspended, "safebrowsing service initialized");
    }

    /// Stop the settings listener and flush the result cache.
    pub async fn shutdown(&self) -> Result<(), Error> {
        if let Some(listener) = self.settings_listener.lock().await.take() {
            listener.abort();
        }
        self.result_cache.save().await
    }

    pub fn result_cache(&self) -> &ResultCache {
        &self.result_cache
    }

    pub fn request_cache(&self) -> &RequestCache {
        &self.request_cache
    }

    pub fn suspend_state(&self) -> &SuspendState {
        &self.suspend
    }

    pub async fn clear_cache(&self) {
        self.result_cache.clear().await;
    }

    /// Mark the URL's host as trusted so it is never diverted.
    pub async fn add_to_safebrowsing_trusted(&self, url: &str) -> Result<(), Error> {
        let host = host_of(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        self.result_cache
            .set(HashEntry::for_host(&host).full_hash, ALLOW_SENTINEL)
            .await;
        tracing::debug!(host, "added host to safebrowsing trusted");
        Ok(())
    }

    /// Engine hook for received response headers.
    pub async fn on_headers_received(&self, details: &HeadersReceived) -> Option<String> {
        if !should_check(details.request_type, details.status_code) {
            return None;
        }
        self.check_safebrowsing_filter(&details.request_url, &details.referrer_url)
            .await
    }

    /// Check a navigation, returning the warning page URL if it must be diverted.
    pub async fn check_safebrowsing_filter(&self, request_url: &str, referrer_url: &str) -> Option<String> {
        if self.settings.is_safebrowsing_disabled() {
            return None;
        }

        tracing::debug!(url = request_url, "checking safebrowsing filter");

        let Some(list) = self.lookup_url(request_url).await else {
            tracing::debug!("no safebrowsing rule found");
            return None;
        };

        tracing::debug!(list, "safebrowsing filter fired");
        let host = host_of(request_url).ok()?;
        Some(warning_page_url(&self.warning_page, &host, request_url, referrer_url, &list))
    }

    /// Detect the blocklist the URL's host is on, if any.
    pub async fn lookup_url(&self, request_url: &str) -> Option<String> {
        let host = match host_of(request_url) {
            Ok(host) => host,
            Err(e) => {
                tracing::debug!(url = request_url, error = %e, "skipping safebrowsing lookup");
                return None;
            }
        };

        let hosts = extract_hosts(&host);
        if hosts.is_empty() {
            return None;
        }

        let entries: Vec<HashEntry> = hosts.iter().map(|h| HashEntry::for_host(h)).collect();
        // the first candidate is `host` itself
        let host_hash = entries[0].full_hash.clone();

        if let Some(list) = self.check_entries_in_cache(&entries).await {
            return visible_list(list);
        }

        if self.suspend.is_suspended(self.clock.now_ms()).await {
            tracing::debug!(host, "safebrowsing lookups suspended");
            return None;
        }

        let short_hashes: Vec<String> = entries.iter().map(|e| e.short_hash.clone()).collect();
        let hashes_map = create_hashes_map(&hosts);

        let short_hashes = self.request_cache.unseen(short_hashes).await;
        if short_hashes.is_empty() {
            // every prefix was already answered this session without a match
            self.result_cache.set(host_hash, ALLOW_SENTINEL).await;
            return None;
        }

        let response = match self.lookup.lookup(&short_hashes).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(host, error = %e, "error response from safebrowsing lookup server");
                self.suspend.suspend(self.clock.now_ms()).await;
                return None;
            }
        };

        if response.is_server_error() {
            tracing::error!(status = response.status, "error response status received from safebrowsing lookup server");
            self.suspend.suspend(self.clock.now_ms()).await;
            return None;
        }

        self.suspend.resume().await;
        self.request_cache.mark_seen(short_hashes).await;

        let list = if response.is_no_content() {
            ALLOW_SENTINEL.to_string()
        } else {
            process_response(&response.body, &hashes_map, &self.result_cache)
                .await
                .unwrap_or_else(|| ALLOW_SENTINEL.to_string())
        };

        self.result_cache.set(host_hash, list.clone()).await;
        visible_list(list)
    }

    async fn check_entries_in_cache(&self, entries: &[HashEntry]) -> Option<String> {
        for entry in entries {
            if let Some(list) = self.result_cache.get(&entry.full_hash).await {
                return Some(list);
            }
        }
        None
    }
}

/// Hide the allow sentinel from callers.
fn visible_list(list: String) -> Option<String> {
    (list != ALLOW_SENTINEL).then_some(list)
}

async fn listen_for_settings(service: Weak<SafebrowsingService>, mut changes: broadcast::Receiver<SettingChange>) {
    loop {
        let cleared_for = match changes.recv().await {
            Ok(change) if change.option == SettingOption::DisableSafebrowsing => change.value,
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "missed settings changes");
                true
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let Some(service) = service.upgrade() else { break };
        tracing::debug!(disabled = cleared_for, "safebrowsing setting changed, clearing cache");
        service.clear_cache().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{LookupError, LookupResponse};
    use sbguard_core::cache::SUSPEND_TTL_MS;
    use sbguard_core::hash::create_hash;
    use sbguard_core::{ManualClock, StorageDb};
    use std::time::Duration;

    type Answer = Box<dyn FnMut(&[String]) -> Result<LookupResponse, LookupError> + Send>;

    /// Lookup backend answering from a script and recording every query.
    struct ScriptedLookup {
        answer: std::sync::Mutex<Answer>,
        calls: std::sync::Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedLookup {
        fn new(answer: impl FnMut(&[String]) -> Result<LookupResponse, LookupError> + Send + 'static) -> Arc<Self> {
            let answer: Answer = Box::new(answer);
            Arc::new(Self { answer: std::sync::Mutex::new(answer), calls: std::sync::Mutex::new(Vec::new()) })
        }

        fn status(status: u16) -> Arc<Self> {
            Self::new(move |_| Ok(LookupResponse { status, body: String::new() }))
        }

        fn body(body: String) -> Arc<Self> {
            Self::new(move |_| Ok(LookupResponse { status: 200, body: body.clone() }))
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl SafebrowsingLookup for ScriptedLookup {
        async fn lookup(&self, short_hashes: &[String]) -> Result<LookupResponse, LookupError> {
            self.calls.lock().unwrap().push(short_hashes.to_vec());
            let mut answer = self.answer.lock().unwrap();
            answer(short_hashes)
        }
    }

    /// Storage that fails every operation.
    struct BrokenStorage;

    #[async_trait::async_trait]
    impl Storage for BrokenStorage {
        async fn get(&self, _key: &str) -> Result<Option<String>, Error> {
            Err(Error::Storage("unavailable".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), Error> {
            Err(Error::Storage("unavailable".into()))
        }

        async fn remove(&self, _key: &str) -> Result<(), Error> {
            Err(Error::Storage("unavailable".into()))
        }
    }

    const START_MS: i64 = 1_700_000_000_000;

    struct Harness {
        service: Arc<SafebrowsingService>,
        lookup: Arc<ScriptedLookup>,
        clock: Arc<ManualClock>,
        settings: Arc<Settings>,
        storage: Arc<StorageDb>,
    }

    async fn harness(lookup: Arc<ScriptedLookup>) -> Harness {
        let storage = Arc::new(StorageDb::open_in_memory().await.unwrap());
        harness_with_storage(lookup, storage).await
    }

    async fn harness_with_storage(lookup: Arc<ScriptedLookup>, storage: Arc<StorageDb>) -> Harness {
        let clock = Arc::new(ManualClock::new(START_MS));
        let settings = Arc::new(Settings::new(false));
        let service = Arc::new(
            SafebrowsingService::new(storage.clone(), lookup.clone(), settings.clone()).with_clock(clock.clone()),
        );
        service.init().await;
        Harness { service, lookup, clock, settings, storage }
    }

    fn malware_body(host: &str) -> String {
        format!("adguard-malware-shavar:35176:{}", create_hash(host))
    }

    #[test]
    fn test_should_check_documents_only() {
        assert!(should_check(RequestType::Document, 200));
        assert!(should_check(RequestType::Document, 404));
        assert!(!should_check(RequestType::Document, 301));
        assert!(!should_check(RequestType::Document, 302));
        assert!(!should_check(RequestType::Script, 200));
        assert!(!should_check(RequestType::Subdocument, 200));
    }

    #[tokio::test]
    async fn test_no_content_is_cached() {
        let h = harness(ScriptedLookup::status(204)).await;

        assert!(h.service.lookup_url("http://google.com").await.is_none());
        assert_eq!(h.lookup.call_count(), 1);

        assert!(h.service.lookup_url("http://google.com").await.is_none());
        assert_eq!(h.lookup.call_count(), 1);
    }

    #[tokio::test]
    async fn test_request_cache_skips_known_prefixes() {
        let h = harness(ScriptedLookup::status(204)).await;

        assert!(h.service.lookup_url("http://google.co.jp").await.is_none());
        assert!(h.service.lookup_url("http://yahoo.co.jp").await.is_none());
        assert!(h.service.lookup_url("http://co.jp").await.is_none());

        assert_eq!(h.lookup.calls(), vec![vec!["6830".to_string(), "D617".to_string()], vec!["20E4".to_string()]]);
        // the fully covered host is now answered by the result cache
        assert_eq!(h.service.result_cache().get(&create_hash("co.jp")).await.as_deref(), Some(ALLOW_SENTINEL));
    }

    #[tokio::test]
    async fn test_blocked_host_is_diverted() {
        let h = harness(ScriptedLookup::body(malware_body("evil.example.com"))).await;

        let redirect = h
            .service
            .check_safebrowsing_filter("http://evil.example.com/login", "https://ref.example/")
            .await
            .unwrap();

        assert_eq!(
            redirect,
            "pages/safebrowsing.html?malware=true&host=evil.example.com\
             &url=http%3A%2F%2Fevil.example.com%2Flogin&ref=https%3A%2F%2Fref.example%2F"
        );
        assert_eq!(h.lookup.calls(), vec![vec![
            create_hash("evil.example.com")[..4].to_string(),
            create_hash("example.com")[..4].to_string(),
        ]]);

        // served from the result cache afterwards
        let list = h.service.lookup_url("https://evil.example.com/other").await;
        assert_eq!(list.as_deref(), Some("adguard-malware-shavar"));
        assert_eq!(h.lookup.call_count(), 1);
    }

    #[tokio::test]
    async fn test_parent_domain_hit_covers_subdomains() {
        let h = harness(ScriptedLookup::body(malware_body("example.net"))).await;

        assert_eq!(h.service.lookup_url("http://example.net").await.as_deref(), Some("adguard-malware-shavar"));
        let list = h.service.lookup_url("http://www.example.net").await;

        assert_eq!(list.as_deref(), Some("adguard-malware-shavar"));
        assert_eq!(h.lookup.call_count(), 1);
    }

    #[tokio::test]
    async fn test_response_entries_are_prefetched() {
        let body = format!(
            "adguard-phishing-shavar:1:{}\n{}",
            create_hash("sibling.example"),
            malware_body("queried.example")
        );
        let h = harness(ScriptedLookup::body(body)).await;

        assert!(h.service.lookup_url("http://queried.example").await.is_some());
        let sibling = h.service.lookup_url("http://sibling.example").await;

        assert_eq!(sibling.as_deref(), Some("adguard-phishing-shavar"));
        assert_eq!(h.lookup.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unmatched_or_unusable_body_is_allowed() {
        for body in [malware_body("other.example"), "x".repeat(MAX_RESPONSE_BYTES + 1), "broken".to_string()] {
            let h = harness(ScriptedLookup::body(body)).await;

            assert!(h.service.lookup_url("http://clean.example").await.is_none());
            assert_eq!(
                h.service.result_cache().get(&create_hash("clean.example")).await.as_deref(),
                Some(ALLOW_SENTINEL)
            );
            assert!(!h.service.suspend_state().is_suspended(START_MS).await);
        }
    }

    #[tokio::test]
    async fn test_server_error_suspends_lookups() {
        let h = harness(ScriptedLookup::status(500)).await;

        assert!(h.service.lookup_url("https://example.com").await.is_none());
        assert_eq!(h.lookup.call_count(), 1);
        assert_eq!(h.service.suspend_state().suspended_from().await, Some(START_MS));

        h.clock.advance(SUSPEND_TTL_MS - 1);
        assert!(h.service.lookup_url("https://example.org").await.is_none());
        assert_eq!(h.lookup.call_count(), 1);

        h.clock.advance(1);
        assert!(h.service.lookup_url("https://example.org").await.is_none());
        assert_eq!(h.lookup.call_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_suspends_lookups() {
        let h = harness(ScriptedLookup::new(|_| Err(LookupError::Timeout))).await;

        assert!(h.service.lookup_url("https://example.org").await.is_none());
        assert!(h.service.lookup_url("https://example.net").await.is_none());

        assert_eq!(h.lookup.call_count(), 1);
        assert!(h.service.suspend_state().is_suspended(START_MS).await);
        // nothing was learned, so nothing is cached
        assert!(h.service.result_cache().is_empty().await);
        assert!(h.service.request_cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_success_after_window_resumes() {
        let mut failing = true;
        let lookup = ScriptedLookup::new(move |_| {
            let status = if failing { 503 } else { 204 };
            failing = false;
            Ok(LookupResponse { status, body: String::new() })
        });
        let h = harness(lookup).await;

        h.service.lookup_url("https://example.com").await;
        assert!(h.service.suspend_state().suspended_from().await.is_some());

        h.clock.advance(SUSPEND_TTL_MS);
        h.service.lookup_url("https://example.com").await;

        assert_eq!(h.lookup.call_count(), 2);
        assert!(h.service.suspend_state().suspended_from().await.is_none());
        assert!(h.storage.get("safebrowsing-suspended-from").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_suspend_state_survives_restart() {
        let storage = Arc::new(StorageDb::open_in_memory().await.unwrap());
        let first = harness_with_storage(ScriptedLookup::status(500), storage.clone()).await;
        first.service.lookup_url("https://example.com").await;

        let second = harness_with_storage(ScriptedLookup::status(204), storage).await;
        assert!(second.service.lookup_url("https://example.com").await.is_none());
        assert_eq!(second.lookup.call_count(), 0);
    }

    #[tokio::test]
    async fn test_trusted_host_is_not_checked() {
        let h = harness(ScriptedLookup::body(malware_body("test.yandex.ru"))).await;
        let url = "http://test.yandex.ru/someurl.html";

        h.service.add_to_safebrowsing_trusted(url).await.unwrap();

        assert!(h.service.check_safebrowsing_filter(url, "http://example.com").await.is_none());
        assert_eq!(h.lookup.call_count(), 0);
    }

    #[tokio::test]
    async fn test_trusting_invalid_url_fails() {
        let h = harness(ScriptedLookup::status(204)).await;
        let result = h.service.add_to_safebrowsing_trusted("not a url").await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_disabled_setting_skips_lookup() {
        let h = harness(ScriptedLookup::body(malware_body("evil.example"))).await;
        h.settings.set_safebrowsing_disabled(true);

        assert!(h.service.check_safebrowsing_filter("http://evil.example", "").await.is_none());
        assert_eq!(h.lookup.call_count(), 0);
    }

    #[tokio::test]
    async fn test_setting_change_clears_result_cache() {
        let h = harness(ScriptedLookup::status(204)).await;
        h.service.add_to_safebrowsing_trusted("http://trusted.example").await.unwrap();
        assert!(!h.service.result_cache().is_empty().await);

        h.settings.set_safebrowsing_disabled(true);

        let mut cleared = false;
        for _ in 0..50 {
            if h.service.result_cache().is_empty().await {
                cleared = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(cleared);
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_checked() {
        let h = harness(ScriptedLookup::status(204)).await;

        assert!(h.service.lookup_url("not a url").await.is_none());
        assert!(h.service.lookup_url("about:blank").await.is_none());
        assert_eq!(h.lookup.call_count(), 0);
    }

    #[tokio::test]
    async fn test_headers_hook_filters_requests() {
        let h = harness(ScriptedLookup::body(malware_body("evil.example"))).await;
        let mut details = HeadersReceived {
            request_type: RequestType::Image,
            status_code: 200,
            request_url: "http://evil.example/pic.png".into(),
            referrer_url: String::new(),
        };

        assert!(h.service.on_headers_received(&details).await.is_none());
        assert_eq!(h.lookup.call_count(), 0);

        details.request_type = RequestType::Document;
        let redirect = h.service.on_headers_received(&details).await.unwrap();
        assert!(redirect.contains("malware=true"));
    }

    #[tokio::test]
    async fn test_result_cache_survives_shutdown() {
        let storage = Arc::new(StorageDb::open_in_memory().await.unwrap());
        let first = harness_with_storage(ScriptedLookup::body(malware_body("evil.example")), storage.clone()).await;
        assert!(first.service.lookup_url("http://evil.example").await.is_some());
        first.service.shutdown().await.unwrap();

        let second = harness_with_storage(ScriptedLookup::status(204), storage).await;
        let list = second.service.lookup_url("http://evil.example").await;

        assert_eq!(list.as_deref(), Some("adguard-malware-shavar"));
        assert_eq!(second.lookup.call_count(), 0);
    }

    #[tokio::test]
    async fn test_storage_failures_do_not_change_verdicts() {
        let lookup = ScriptedLookup::body(malware_body("evil.example"));
        let settings = Arc::new(Settings::default());
        let service = Arc::new(SafebrowsingService::new(Arc::new(BrokenStorage), lookup.clone(), settings));
        service.init().await;

        for i in 0..25 {
            service.add_to_safebrowsing_trusted(&format!("http://site{i}.example")).await.unwrap();
        }
        let list = service.lookup_url("http://evil.example").await;

        assert_eq!(list.as_deref(), Some("adguard-malware-shavar"));
        assert!(service.shutdown().await.is_err());
    }
}
