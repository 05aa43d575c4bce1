//! Google Cloud Translation (v2 REST) backend.
//!
//! Authenticates with an API key passed as the `key` query parameter,
//! usually taken from `GOOGLE_TRANSLATE_API_KEY`. Texts are sent with
//! `format=text` so markers are not HTML-escaped.
//!
//! v2 has no formality or context parameters; those request fields are
//! ignored.

use crate::error::{MtError, MtResult};
use crate::translator::{BatchRequest, MachineTranslator, validate_locale};
use async_trait::async_trait;
use phrasekit::normalize_locale;
use serde_json::{Value, json};

const DEFAULT_BASE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

#[derive(Clone)]
pub struct GoogleTranslateProvider {
    api_key: String,
    client: reqwest::Client,
    /// `translate` endpoint, without query string
    base_url: String,
}

impl GoogleTranslateProvider {
    /// Texts per v2 request
    pub const MAX_BATCH_SIZE: usize = 128;

    /// Per-text size cap enforced before sending
    const MAX_CHARS_PER_STRING: usize = 30_000;

    /// Fails with `ConfigError` on a blank key.
    pub fn new(api_key: String) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::ConfigError("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Key from `GOOGLE_TRANSLATE_API_KEY`
    pub fn from_env() -> MtResult<Self> {
        let api_key = std::env::var("GOOGLE_TRANSLATE_API_KEY").map_err(|_| {
            MtError::ConfigError("GOOGLE_TRANSLATE_API_KEY is not set".to_string())
        })?;

        Self::new(api_key)
    }

    /// Point the provider at another endpoint (proxies, test servers)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// JSON body for one v2 `translate` call
    pub fn build_request_body(request: &BatchRequest) -> Value {
        json!({
            "q": request.texts,
            "source": request.source_lang,
            "target": request.target_lang,
            "format": "text"
        })
    }

    /// Pull `data.translations[].translatedText` out of a v2 response
    pub fn parse_response_body(json: &Value) -> MtResult<Vec<String>> {
        let translations = json["data"]["translations"].as_array().ok_or_else(|| {
            MtError::BadResponse("response has no 'data.translations' array".to_string())
        })?;

        translations
            .iter()
            .map(|t| {
                t["translatedText"]
                    .as_str()
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        MtError::BadResponse(
                            "translation without 'translatedText'".to_string(),
                        )
                    })
            })
            .collect()
    }
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for GoogleTranslateProvider {
    async fn translate_batch(&self, request: &BatchRequest) -> MtResult<Vec<String>> {
        validate_locale(&request.source_lang)?;
        validate_locale(&request.target_lang)?;

        if request.texts.is_empty() {
            return Ok(Vec::new());
        }
        if request.texts.len() > Self::MAX_BATCH_SIZE {
            return Err(MtError::BatchTooLarge {
                size: request.texts.len(),
                max: Self::MAX_BATCH_SIZE,
            });
        }
        for (i, text) in request.texts.iter().enumerate() {
            if text.len() > Self::MAX_CHARS_PER_STRING {
                return Err(MtError::TranslationError(format!(
                    "text {} is {} bytes, over the {} limit",
                    i,
                    text.len(),
                    Self::MAX_CHARS_PER_STRING
                )));
            }
        }

        let url = format!("{}?key={}", self.base_url, self.api_key);
        let response = self
            .client
            .post(&url)
            .json(&Self::build_request_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MtError::from_status(status.as_u16(), body));
        }

        let json: Value = response.json().await.map_err(|e| {
            MtError::BadResponse(format!("Failed to parse API response: {}", e))
        })?;
        Self::parse_response_body(&json)
    }

    fn language_code(&self, locale: &str) -> String {
        match locale.to_ascii_lowercase().replace('_', "-").as_str() {
            "zh-hans" | "zh-cn" | "zh-sg" => "zh-CN".to_string(),
            "zh-hant" | "zh-tw" | "zh-hk" => "zh-TW".to_string(),
            _ => normalize_locale(locale),
        }
    }

    fn max_batch_size(&self) -> usize {
        Self::MAX_BATCH_SIZE
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}
