//! The provider seam: one batch in, one ordered list of translations out.
//!
//! Google Translate, DeepL and the mock all sit behind `MachineTranslator`.
//! Providers only adapt the wire format;
//! batching limits, retries and logging live in
//! [`TranslationClient`](crate::client::TranslationClient).
//!
//! # Example
//!
//! ```ignore
//! use phrasekit_mt::{BatchRequest, GoogleTranslateProvider, MachineTranslator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::from_env()?;
//!     let request = BatchRequest::new(vec!["Hello".into(), "Goodbye".into()], "en", "fr");
//!     for text in provider.translate_batch(&request).await? {
//!         println!("{}", text);
//!     }
//!     Ok(())
//! }
//! ```

use crate::error::{MtError, MtResult};
use async_trait::async_trait;
use phrasekit::normalize_locale;
use serde::{Deserialize, Serialize};

/// Requested register of the translation, for providers that support it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formality {
    #[default]
    Default,
    More,
    Less,
}

impl std::str::FromStr for Formality {
    type Err = MtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Formality::Default),
            "more" | "formal" => Ok(Formality::More),
            "less" | "informal" => Ok(Formality::Less),
            other => Err(MtError::ConfigError(format!(
                "Unknown formality '{}' (expected default, more or less)",
                other
            ))),
        }
    }
}

/// Per-request settings shared by every batch of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub source_locale: String,
    pub formality: Formality,
    pub preserve_formatting: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        RequestOptions {
            source_locale: "en".to_string(),
            formality: Formality::Default,
            preserve_formatting: true,
        }
    }
}

/// One outbound provider request.
///
/// `target_lang` and `source_lang` are already provider codes (see
/// [`MachineTranslator::language_code`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub texts: Vec<String>,
    pub source_lang: String,
    pub target_lang: String,
    pub formality: Formality,
    pub preserve_formatting: bool,
    pub context: Option<String>,
}

impl BatchRequest {
    pub fn new(texts: Vec<String>, source_lang: &str, target_lang: &str) -> Self {
        BatchRequest {
            texts,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            formality: Formality::Default,
            preserve_formatting: true,
            context: None,
        }
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_options(mut self, options: &RequestOptions) -> Self {
        self.formality = options.formality;
        self.preserve_formatting = options.preserve_formatting;
        self
    }
}

/// A machine translation backend
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate every text of `request` in a single provider call.
    ///
    /// # Returns
    ///
    /// * `Ok(translations)` - one per input text, index-aligned
    /// * `Err(MtError)` - the whole call failed; there are no partial results
    async fn translate_batch(&self, request: &BatchRequest) -> MtResult<Vec<String>>;

    /// Map a locale to the code this provider expects
    ///
    /// Units are grouped by this code, so two locales mapping to the same
    /// code share one batch.
    fn language_code(&self, locale: &str) -> String {
        normalize_locale(locale)
    }

    /// Most texts one request may carry
    fn max_batch_size(&self) -> usize {
        usize::MAX
    }

    /// Human-readable name, used in log messages
    fn provider_name(&self) -> &str;
}

/// Check that `locale` looks like a BCP 47 tag before it reaches a provider.
///
/// The language subtag must be 2-8 ASCII letters; further subtags are 1-8
/// ASCII alphanumerics separated by `-` or `_`. `en`, `zh-Hans`, `de_DE`
/// and `sr-Latn-RS` pass; `bad@code`, `en-` and `e` do not.
pub fn validate_locale(locale: &str) -> MtResult<()> {
    let mut subtags = locale.split(['-', '_']);
    let language = subtags.next().unwrap_or_default();
    if language.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }
    if !(2..=8).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(MtError::InvalidLocale(format!(
            "'{}' has no valid language subtag",
            locale
        )));
    }
    if let Some(bad) = subtags.find(|subtag| {
        !(1..=8).contains(&subtag.len()) || !subtag.chars().all(|c| c.is_ascii_alphanumeric())
    }) {
        return Err(MtError::InvalidLocale(format!(
            "'{}' has a malformed subtag '{}'",
            locale, bad
        )));
    }
    Ok(())
}
