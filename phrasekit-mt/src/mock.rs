//! Deterministic in-process translator.
//!
//! Stands in for a real provider in tests and in `phrasekit-mt --mock`. It
//! can replay scripted failures, fail one language permanently and records
//! every request it receives.
//!
//! # Example
//!
//! ```ignore
//! use phrasekit_mt::{BatchRequest, MachineTranslator, MockMode, MockTranslator, MtError};
//!
//! #[tokio::test]
//! async fn test_rate_limited_then_ok() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     mock.fail_next(MtError::RateLimited("slow down".into()));
//!     let request = BatchRequest::new(vec!["hello".into()], "en", "fr");
//!     assert!(mock.translate_batch(&request).await.is_err());
//!     assert_eq!(mock.translate_batch(&request).await.unwrap(), vec!["hello_fr"]);
//! }
//! ```

use crate::error::{MtError, MtResult};
use crate::translator::{BatchRequest, MachineTranslator};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How the mock turns a source text into a "translation"
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append the target code: "hello" → "hello_fr"
    Suffix,

    /// Look up (text, target code); unknown pairs fall back to `Suffix`
    Mappings(HashMap<(String, String), String>),

    /// Reverse the order of words separated by spaces
    /// (simulates word-order-changing languages such as Japanese)
    Reorder,

    /// Return one result fewer than requested
    Truncate,

    /// Simulate API errors
    Error(String),

    /// Echo the input
    NoOp,
}

#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    /// Per-call latency in milliseconds
    delay_ms: u64,
    scripted: Mutex<VecDeque<MtError>>,
    failing_languages: Mutex<HashMap<String, MtError>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<BatchRequest>>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self::with_delay(mode, 0)
    }

    /// Add a fixed latency to every call.
    ///
    /// The delay uses `tokio::time::sleep`, so it follows the paused clock
    /// in `start_paused` tests.
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            mode,
            delay_ms,
            scripted: Mutex::new(VecDeque::new()),
            failing_languages: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Make the next call fail with `error`; queued errors are replayed in order
    pub fn fail_next(&self, error: MtError) -> &Self {
        if let Ok(mut scripted) = self.scripted.lock() {
            scripted.push_back(error);
        }
        self
    }

    /// Make every call for `target_code` fail with `error`
    pub fn fail_language(&self, target_code: &str, error: MtError) -> &Self {
        if let Ok(mut failing) = self.failing_languages.lock() {
            failing.insert(target_code.to_string(), error);
        }
        self
    }

    /// Number of `translate_batch` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in arrival order
    pub fn requests(&self) -> Vec<BatchRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn scripted_failure(&self, target: &str) -> Option<MtError> {
        if let Some(error) = self.scripted.lock().ok()?.pop_front() {
            return Some(error);
        }
        self.failing_languages.lock().ok()?.get(target).cloned()
    }

    fn apply_translation(&self, text: &str, target: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::Suffix | MockMode::Truncate => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::Reorder => {
                let words: Vec<&str> = text.split_whitespace().rev().collect();
                Ok(words.join(" "))
            }
            MockMode::Error(msg) => Err(MtError::TranslationError(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate_batch(&self, request: &BatchRequest) -> MtResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        self.apply_delay().await;

        if let Some(error) = self.scripted_failure(&request.target_lang) {
            return Err(error);
        }

        let mut results = request
            .texts
            .iter()
            .map(|text| self.apply_translation(text, &request.target_lang))
            .collect::<MtResult<Vec<String>>>()?;
        if matches!(self.mode, MockMode::Truncate) {
            results.pop();
        }
        Ok(results)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(texts: &[&str], target: &str) -> BatchRequest {
        BatchRequest::new(texts.iter().map(|s| s.to_string()).collect(), "en", target)
    }

    // ========== Translation Mode Tests ==========

    #[tokio::test]
    async fn test_suffix_appends_target() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let results = mock
            .translate_batch(&request(&["save", "open"], "fr"))
            .await
            .unwrap();
        assert_eq!(results, vec!["save_fr", "open_fr"]);
    }

    #[tokio::test]
    async fn test_suffix_preserves_markers() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let results = mock
            .translate_batch(&request(&["__PLACEHOLDER_0__ sent"], "fr"))
            .await
            .unwrap();
        assert!(results[0].contains("__PLACEHOLDER_0__"));
    }

    #[tokio::test]
    async fn test_mapping_with_fallback() {
        let mut map = HashMap::new();
        map.insert(
            ("hello".to_string(), "fr".to_string()),
            "bonjour".to_string(),
        );
        let mock = MockTranslator::new(MockMode::Mappings(map));
        let results = mock
            .translate_batch(&request(&["hello", "unknown"], "fr"))
            .await
            .unwrap();
        assert_eq!(results, vec!["bonjour", "unknown_fr"]);
    }

    // ========== Reorder / Truncate Mode Tests ==========

    #[tokio::test]
    async fn test_reorder_reverses_words() {
        let mock = MockTranslator::new(MockMode::Reorder);
        let results = mock
            .translate_batch(&request(&["one two three"], "ja"))
            .await
            .unwrap();
        assert_eq!(results, vec!["three two one"]);
    }

    #[tokio::test]
    async fn test_truncate_drops_last() {
        let mock = MockTranslator::new(MockMode::Truncate);
        let results = mock
            .translate_batch(&request(&["a", "b"], "de"))
            .await
            .unwrap();
        assert_eq!(results, vec!["a_de"]);
    }

    // ========== Error Tests ==========

    #[tokio::test]
    async fn test_error_mode_fails_whole_batch() {
        let mock = MockTranslator::new(MockMode::Error("backend down".to_string()));
        match mock.translate_batch(&request(&["hello", "world"], "fr")).await {
            Err(MtError::TranslationError(msg)) => assert_eq!(msg, "backend down"),
            other => panic!("Expected TranslationError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scripted_failures_replay_in_order() {
        let mock = MockTranslator::new(MockMode::NoOp);
        mock.fail_next(MtError::RateLimited("1".into()))
            .fail_next(MtError::AuthFailure("2".into()));

        let req = request(&["x"], "de");
        assert!(matches!(mock.translate_batch(&req).await, Err(MtError::RateLimited(_))));
        assert!(matches!(mock.translate_batch(&req).await, Err(MtError::AuthFailure(_))));
        assert_eq!(mock.translate_batch(&req).await.unwrap(), vec!["x"]);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failing_language() {
        let mock = MockTranslator::new(MockMode::Suffix);
        mock.fail_language("ja", MtError::AuthFailure("no".into()));
        assert!(mock.translate_batch(&request(&["x"], "ja")).await.is_err());
        assert!(mock.translate_batch(&request(&["x"], "de")).await.is_ok());
    }

    // ========== Recording Tests ==========

    #[tokio::test]
    async fn test_records_requests() {
        let mock = MockTranslator::new(MockMode::NoOp);
        let req = request(&["a", "b"], "de").with_context(Some("menu".into()));
        mock.translate_batch(&req).await.unwrap();
        let recorded = mock.requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].texts, vec!["a", "b"]);
        assert_eq!(recorded[0].context.as_deref(), Some("menu"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_uses_tokio_clock() {
        let mock = MockTranslator::with_delay(MockMode::Suffix, 50);
        let start = tokio::time::Instant::now();
        mock.translate_batch(&request(&["hello"], "fr")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_provider_name() {
        let mock = MockTranslator::new(MockMode::Suffix);
        assert_eq!(mock.provider_name(), "Mock Translator");
    }
}
