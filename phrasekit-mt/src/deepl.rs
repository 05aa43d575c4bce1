//! DeepL API provider.
//!
//! Keys ending in `:fx` belong to the free plan and are sent to
//! `api-free.deepl.com`; all others go to `api.deepl.com`. Requests use the
//! JSON form of the v2 `translate` endpoint, which carries formality,
//! formatting preservation and context alongside the texts.

use crate::error::{MtError, MtResult};
use crate::translator::{BatchRequest, Formality, MachineTranslator, validate_locale};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

const FREE_BASE_URL: &str = "https://api-free.deepl.com/v2";
const PRO_BASE_URL: &str = "https://api.deepl.com/v2";

/// Regional target variants DeepL distinguishes
const REGIONAL_TARGETS: [&str; 6] = ["EN-GB", "EN-US", "PT-BR", "PT-PT", "ZH-HANS", "ZH-HANT"];

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

/// DeepL v2 provider
#[derive(Clone)]
pub struct DeepLProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl DeepLProvider {
    /// DeepL accepts up to 50 texts per request
    pub const MAX_BATCH_SIZE: usize = 50;

    pub fn new(api_key: String) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::ConfigError("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = if api_key.ends_with(":fx") {
            FREE_BASE_URL
        } else {
            PRO_BASE_URL
        };

        Ok(Self {
            api_key,
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Create a DeepLProvider from the `DEEPL_API_KEY` environment variable
    pub fn from_env() -> MtResult<Self> {
        let api_key = std::env::var("DEEPL_API_KEY").map_err(|_| {
            MtError::ConfigError("DEEPL_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// JSON body for one `translate` call
    pub fn build_request_body(request: &BatchRequest) -> Value {
        // Source languages never carry a region for DeepL
        let source = request
            .source_lang
            .split('-')
            .next()
            .unwrap_or(&request.source_lang)
            .to_string();

        let mut body = json!({
            "text": request.texts,
            "source_lang": source,
            "target_lang": request.target_lang,
            "preserve_formatting": request.preserve_formatting,
        });
        let formality = match request.formality {
            Formality::Default => None,
            Formality::More => Some("prefer_more"),
            Formality::Less => Some("prefer_less"),
        };
        if let Some(formality) = formality {
            body["formality"] = json!(formality);
        }
        if let Some(context) = &request.context {
            body["context"] = json!(context);
        }
        body
    }

    pub fn parse_response_body(body: &str) -> MtResult<Vec<String>> {
        let response: DeepLResponse = serde_json::from_str(body)
            .map_err(|e| MtError::BadResponse(format!("Failed to parse DeepL response: {}", e)))?;
        Ok(response.translations.into_iter().map(|t| t.text).collect())
    }
}

impl std::fmt::Debug for DeepLProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepLProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for DeepLProvider {
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

        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&Self::build_request_body(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(MtError::from_status(status.as_u16(), body));
        }
        Self::parse_response_body(&body)
    }

    fn language_code(&self, locale: &str) -> String {
        let code = locale.to_ascii_uppercase().replace('_', "-");
        if REGIONAL_TARGETS.contains(&code.as_str()) {
            return code;
        }
        match code.split('-').next().unwrap_or(&code) {
            "EN" => "EN-US".to_string(),
            "PT" => "PT-PT".to_string(),
            base => base.to_string(),
        }
    }

    fn max_batch_size(&self) -> usize {
        Self::MAX_BATCH_SIZE
    }

    fn provider_name(&self) -> &str {
        "DeepL"
    }
}
