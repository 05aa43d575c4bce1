//! End-to-End Integration Tests for the translation pipeline
//!
//! These tests drive `TranslationSession` with mock providers: parse,
//! batch, translate, reconstruct. The live-provider test at the bottom is
//! ignored by default.
//!
//! # Running the live test
//!
//! ```bash
//! export GOOGLE_TRANSLATE_API_KEY=...
//! cargo test -p phrasekit-mt integration_tests -- --ignored --nocapture
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{RetryPolicy, TranslationClient};
use crate::data::SourceEntry;
use crate::error::MtError;
use crate::log::LogEvent;
use crate::mock::{MockMode, MockTranslator};
use crate::session::TranslationSession;
use phrasekit::ReconstructionIssue;

fn session(mock: &Arc<MockTranslator>) -> TranslationSession {
    TranslationSession::new(TranslationClient::new(mock.clone()))
}

fn mappings(target: &str, pairs: &[(&str, &str)]) -> MockMode {
    let map = pairs
        .iter()
        .map(|(from, to)| ((from.to_string(), target.to_string()), to.to_string()))
        .collect();
    MockMode::Mappings(map)
}

fn locales(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_scenario_a_echo_round_trip() {
    let source = "You have {count:plural:{} item|{} items}";
    let mock = Arc::new(MockTranslator::new(MockMode::NoOp));
    let mut session = session(&mock);

    let result = session.translate(source, "de", None).await;
    assert_eq!(result.as_deref(), Some(source));
}

#[tokio::test]
async fn test_scenario_b_gender_and_plural() {
    let mock = Arc::new(MockTranslator::new(mappings(
        "de",
        &[
            ("__PLACEHOLDER_0__ found __PLACEHOLDER_1__", "__PLACEHOLDER_0__ fand __PLACEHOLDER_1__"),
            ("He", "Er"),
            ("She", "Sie"),
            ("item", "Gegenstand"),
            ("items", "Gegenstände"),
        ],
    )));
    let mut session = session(&mock);

    let result = session
        .translate(
            "{player:gender(male,female):He|She} found {count:plural:{item}|{items}}",
            "de",
            None,
        )
        .await;
    assert_eq!(
        result.as_deref(),
        Some("{player:gender(male,female):Er|Sie} fand {count:plural:{Gegenstand}|{Gegenstände}}")
    );

    // Carrier and all fragments travel in one request, in positional order
    assert_eq!(mock.call_count(), 1);
    assert_eq!(
        mock.requests()[0].texts,
        vec![
            "__PLACEHOLDER_0__ found __PLACEHOLDER_1__",
            "He",
            "She",
            "item",
            "items"
        ]
    );
}

#[tokio::test]
async fn test_scenario_c_unterminated() {
    let mock = Arc::new(MockTranslator::new(MockMode::NoOp));
    let mut session = session(&mock);
    let result = session.translate("{unterminated", "fr", None).await;
    assert_eq!(result.as_deref(), Some("{unterminated"));
}

// ============================================================================
// Batching
// ============================================================================

#[tokio::test]
async fn test_batch_ordering_maps_back_by_position() {
    let mock = Arc::new(MockTranslator::new(mappings(
        "de",
        &[("A", "a"), ("B", "b"), ("C", "c")],
    )));
    let mut session = session(&mock);

    let entries = vec![
        SourceEntry::new("first", "A"),
        SourceEntry::new("second", "B"),
        SourceEntry::new("third", "C"),
    ];
    let results = session.translate_entries(&entries, &locales(&["de"])).await;

    let pairs: Vec<(&str, Option<&str>)> = results
        .iter()
        .map(|r| (r.key.as_str(), r.text.as_deref()))
        .collect();
    assert_eq!(
        pairs,
        vec![("first", Some("a")), ("second", Some("b")), ("third", Some("c"))]
    );
    assert_eq!(mock.requests()[0].texts, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_chunks_respect_max_batch_size() {
    let mock = Arc::new(MockTranslator::new(MockMode::Suffix));
    let client = TranslationClient::new(mock.clone()).with_max_batch_size(2);
    let mut session = TranslationSession::new(client);

    let entries: Vec<SourceEntry> = ["one", "two", "three", "four", "five"]
        .iter()
        .map(|t| SourceEntry::new(t, t))
        .collect();
    let results = session.translate_entries(&entries, &locales(&["fr"])).await;

    assert_eq!(mock.call_count(), 3);
    assert!(mock.requests().iter().all(|r| r.texts.len() <= 2));
    assert_eq!(results[4].text.as_deref(), Some("five_fr"));
}

#[tokio::test]
async fn test_contexts_are_not_mixed_in_one_request() {
    let mock = Arc::new(MockTranslator::new(MockMode::NoOp));
    let mut session = session(&mock);

    let entries = vec![
        SourceEntry::new("a", "Open").with_context("menu"),
        SourceEntry::new("b", "Open").with_context("door"),
        SourceEntry::new("c", "Close").with_context("menu"),
    ];
    session.translate_entries(&entries, &locales(&["de"])).await;

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].context.as_deref(), Some("menu"));
    assert_eq!(requests[0].texts, vec!["Open", "Close"]);
    assert_eq!(requests[1].context.as_deref(), Some("door"));
}

#[tokio::test]
async fn test_construct_only_carrier_is_not_sent() {
    let mock = Arc::new(MockTranslator::new(MockMode::Suffix));
    let mut session = session(&mock);

    let result = session
        .translate("{count:plural:{item}|{items}}", "de", None)
        .await;
    assert_eq!(result.as_deref(), Some("{count:plural:{item_de}|{items_de}}"));
    assert_eq!(mock.requests()[0].texts, vec!["item", "items"]);
}

#[tokio::test]
async fn test_locales_sharing_a_code_share_a_batch() {
    let mock = Arc::new(MockTranslator::new(MockMode::Suffix));
    let mut session = session(&mock);

    let results = session
        .translate_all("Hello", &locales(&["de", "de-AT"]), None)
        .await;
    assert_eq!(mock.call_count(), 1);
    assert_eq!(
        results,
        vec![
            ("de".to_string(), Some("Hello_de".to_string())),
            ("de-AT".to_string(), Some("Hello_de".to_string())),
        ]
    );
}

// ============================================================================
// Failure isolation
// ============================================================================

#[tokio::test]
async fn test_failed_language_does_not_block_others() {
    let mock = Arc::new(MockTranslator::new(MockMode::Suffix));
    mock.fail_language("ja", MtError::AuthFailure("bad key".into()));
    let mut session = session(&mock);

    let results = session
        .translate_all("Hello {name}", &locales(&["de", "ja", "fr"]), None)
        .await;
    assert_eq!(
        results,
        vec![
            ("de".to_string(), Some("Hello {name}_de".to_string())),
            ("ja".to_string(), None),
            ("fr".to_string(), Some("Hello {name}_fr".to_string())),
        ]
    );
    assert_eq!(session.log().events(LogEvent::Failure).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_language_retries_alone() {
    let mock = Arc::new(MockTranslator::new(MockMode::Suffix));
    mock.fail_language("ja", MtError::RateLimited("429".into()));
    let client = TranslationClient::new(mock.clone()).with_retry(RetryPolicy::default());
    let mut session = TranslationSession::new(client);

    let start = tokio::time::Instant::now();
    let results = session
        .translate_all("Hello", &locales(&["ja", "de"]), None)
        .await;

    assert_eq!(results[0].1, None);
    assert_eq!(results[1].1.as_deref(), Some("Hello_de"));
    // 1 request for de, 1 + 3 retries for ja
    assert_eq!(mock.call_count(), 5);
    assert!(start.elapsed() >= Duration::from_millis(7000));

    let retries: Vec<Option<u64>> = session
        .log()
        .events(LogEvent::Retry)
        .iter()
        .map(|e| e.delay_ms)
        .collect();
    assert_eq!(retries, vec![Some(1000), Some(2000), Some(4000)]);

    // de finishes while ja is still backing off
    let entries = session.log().entries();
    let positions = |event: LogEvent, language: &str| -> Vec<usize> {
        entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.event == event && e.language == language)
            .map(|(i, _)| i)
            .collect()
    };
    let de_done = positions(LogEvent::Success, "de");
    let ja_retries = positions(LogEvent::Retry, "ja");
    let ja_failed = positions(LogEvent::Failure, "ja");
    assert_eq!(de_done.len(), 1);
    assert!(de_done[0] < ja_retries[1]);
    assert!(de_done[0] < ja_failed[0]);
}

#[tokio::test(start_paused = true)]
async fn test_languages_translate_concurrently() {
    let mock = Arc::new(MockTranslator::with_delay(MockMode::Suffix, 500));
    let mut session = session(&mock);

    let start = tokio::time::Instant::now();
    let results = session
        .translate_all("Hello", &locales(&["de", "fr", "ja"]), None)
        .await;
    let elapsed = start.elapsed();

    assert_eq!(mock.call_count(), 3);
    assert!(results.iter().all(|(_, text)| text.is_some()));
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_millis(1000), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_provider_error_leaves_every_language_untranslated() {
    let mock = Arc::new(MockTranslator::new(MockMode::Error("backend down".into())));
    let mut session = session(&mock);

    let results = session
        .translate_all("Hello {name}", &locales(&["de", "fr"]), None)
        .await;
    assert!(results.iter().all(|(_, text)| text.is_none()));
    // not retryable
    assert_eq!(mock.call_count(), 2);
    assert!(session.log().events(LogEvent::Retry).is_empty());

    let failures = session.log().events(LogEvent::Failure);
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|e| e.message.contains("backend down")));
}

#[tokio::test]
async fn test_failed_chunk_only_affects_its_entries() {
    let mock = Arc::new(MockTranslator::new(MockMode::Suffix));
    mock.fail_next(MtError::BadResponse("garbage".into()));
    let client = TranslationClient::new(mock.clone()).with_max_batch_size(1);
    let mut session = TranslationSession::new(client);

    let entries = vec![SourceEntry::new("a", "Alpha"), SourceEntry::new("b", "Beta")];
    let results = session.translate_entries(&entries, &locales(&["de"])).await;
    assert_eq!(results[0].text, None);
    assert!(results[0].needs_review());
    assert_eq!(results[1].text.as_deref(), Some("Beta_de"));
}

#[tokio::test]
async fn test_invalid_locale_is_untranslated() {
    let mock = Arc::new(MockTranslator::new(MockMode::Suffix));
    let mut session = session(&mock);

    let results = session
        .translate_all("Hello", &locales(&["bad@code", "fr"]), None)
        .await;
    assert_eq!(results[0].1, None);
    assert_eq!(results[1].1.as_deref(), Some("Hello_fr"));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_translate_missing_skips_existing() {
    let mock = Arc::new(MockTranslator::new(MockMode::Suffix));
    let mut session = session(&mock);

    let mut existing = HashMap::new();
    existing.insert("de".to_string(), "Hallo".to_string());
    existing.insert("es".to_string(), "  ".to_string());

    let results = session
        .translate_missing("Hello", &existing, &locales(&["de", "fr", "es"]), None)
        .await;
    let translated: Vec<&str> = results.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(translated, vec!["fr", "es"]);
}

// ============================================================================
// Reconstruction through the session
// ============================================================================

#[tokio::test]
async fn test_corrupted_marker_is_repaired() {
    let mock = Arc::new(MockTranslator::new(mappings(
        "de",
        &[
            ("You have __PLACEHOLDER_0__", "Du hast __PLACEHOLDER_0.__"),
            ("item", "Gegenstand"),
            ("items", "Gegenstände"),
        ],
    )));
    let mut session = session(&mock);

    let entries = vec![SourceEntry::new("k", "You have {count:plural:{} item|{} items}")];
    let results = session.translate_entries(&entries, &locales(&["de"])).await;
    assert_eq!(
        results[0].text.as_deref(),
        Some("Du hast {count:plural:{} Gegenstand|{} Gegenstände}")
    );
    assert_eq!(results[0].issues, vec![ReconstructionIssue::Repaired(0)]);
    assert!(!results[0].needs_review());
}

#[tokio::test]
async fn test_dropped_marker_is_flagged() {
    let mock = Arc::new(MockTranslator::new(mappings(
        "fr",
        &[("Hello __PLACEHOLDER_0__", "Bonjour")],
    )));
    let mut session = session(&mock);

    let entries = vec![SourceEntry::new("k", "Hello {name}")];
    let results = session.translate_entries(&entries, &locales(&["fr"])).await;
    assert_eq!(results[0].text.as_deref(), Some("Bonjour {name}"));
    assert!(results[0].needs_review());
}

#[tokio::test]
async fn test_classifier_language_collapses_plural() {
    let mock = Arc::new(MockTranslator::new(mappings(
        "ja",
        &[
            ("You have __PLACEHOLDER_0__", "__PLACEHOLDER_0__を持っています"),
            ("item", "個"),
            ("items", "個のアイテム"),
        ],
    )));
    let mut session = session(&mock);

    let result = session
        .translate("You have {count:plural:{} item|{} items}", "ja", None)
        .await;
    assert_eq!(
        result.as_deref(),
        Some("{count:plural:{} 個のアイテム}を持っています")
    );
    assert_eq!(session.adapters().get("ja").map(|c| c.len()), Some(1));
}

#[tokio::test]
async fn test_provider_word_order_is_kept() {
    let mock = Arc::new(MockTranslator::new(MockMode::Reorder));
    let mut session = session(&mock);

    let result = session
        .translate("{count:plural:{one item}|{many items}} for {name}", "de", None)
        .await;
    assert_eq!(
        result.as_deref(),
        Some("{name} for {count:plural:{item one}|{items many}}")
    );
}

#[tokio::test]
async fn test_literal_marker_text_in_source() {
    let mock = Arc::new(MockTranslator::new(MockMode::Suffix));
    let mut session = session(&mock);

    let result = session
        .translate("Literal __PLACEHOLDER_0__ then {name}", "de", None)
        .await;
    assert_eq!(
        result.as_deref(),
        Some("Literal __PLACEHOLDER_0__ then {name}_de")
    );
    assert_eq!(
        mock.requests()[0].texts,
        vec!["Literal __PLACEHOLDER_0__ then __PLACEHOLDERX_0__"]
    );
}

// ============================================================================
// Live provider
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_e2e_google_translate() {
    if std::env::var("GOOGLE_TRANSLATE_API_KEY").is_err() {
        eprintln!("Skipping: GOOGLE_TRANSLATE_API_KEY not set");
        return;
    }

    let provider = crate::google_translate::GoogleTranslateProvider::from_env().unwrap();
    let mut session = TranslationSession::new(TranslationClient::new(Arc::new(provider)));
    let source = "{player:gender(male,female):He|She} found {count:plural:{item}|{items}}";

    let results = session
        .translate_all(source, &locales(&["de", "ja", "fr"]), None)
        .await;
    for (locale, text) in &results {
        println!("{}: {:?}", locale, text);
        let text = text.as_deref().unwrap_or_default();
        assert!(text.contains("{player:gender(male,female):"));
        assert!(text.contains("{count:plural:"));
    }
    for entry in session.log().entries() {
        println!("{}", entry);
    }
}
