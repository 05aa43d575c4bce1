//! Provider and session configuration.
//!
//! Values come from a JSON file, from environment variables, or from
//! defaults; the CLI layers its flags on top.
//!
//! ```json
//! {
//!   "provider": "deepl",
//!   "api_key": "xxxx:fx",
//!   "source_locale": "en",
//!   "max_batch_size": 50,
//!   "retry": { "max_retries": 3, "initial_delay_ms": 1000 },
//!   "formality": "less"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::client::{RetryPolicy, TranslationClient};
use crate::deepl::DeepLProvider;
use crate::error::{MtError, MtResult};
use crate::google_translate::GoogleTranslateProvider;
use crate::log::TranslationLog;
use crate::mock::{MockMode, MockTranslator};
use crate::translator::{Formality, MachineTranslator, RequestOptions, validate_locale};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Google,
    Deepl,
    Mock,
}

impl std::str::FromStr for ProviderKind {
    type Err = MtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "deepl" => Ok(ProviderKind::Deepl),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(MtError::ConfigError(format!("Unknown provider '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MtConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Override for the provider's base URL
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_source_locale")]
    pub source_locale: String,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub formality: Formality,
    #[serde(default = "default_preserve_formatting")]
    pub preserve_formatting: bool,
}

fn default_source_locale() -> String {
    "en".to_string()
}

fn default_max_batch_size() -> usize {
    TranslationClient::DEFAULT_MAX_BATCH_SIZE
}

fn default_preserve_formatting() -> bool {
    true
}

impl Default for MtConfig {
    fn default() -> Self {
        MtConfig {
            provider: ProviderKind::default(),
            api_key: None,
            endpoint: None,
            source_locale: default_source_locale(),
            max_batch_size: default_max_batch_size(),
            retry: RetryPolicy::default(),
            formality: Formality::default(),
            preserve_formatting: default_preserve_formatting(),
        }
    }
}

impl MtConfig {
    /// Load a JSON config file; absent fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> MtResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MtError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: MtConfig = serde_json::from_str(&content).map_err(|e| {
            MtError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with the environment
    pub fn from_env() -> MtResult<Self> {
        Self::default().with_env()
    }

    /// Overlay `PHRASEKIT_*` variables and the provider's API key variable
    pub fn with_env(mut self) -> MtResult<Self> {
        if let Ok(provider) = std::env::var("PHRASEKIT_PROVIDER") {
            self.provider = provider.parse()?;
        }
        if let Ok(endpoint) = std::env::var("PHRASEKIT_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Ok(size) = std::env::var("PHRASEKIT_MAX_BATCH_SIZE") {
            self.max_batch_size = size.trim().parse().map_err(|_| {
                MtError::ConfigError(format!("PHRASEKIT_MAX_BATCH_SIZE is not a number: {}", size))
            })?;
        }
        if let Ok(formality) = std::env::var("PHRASEKIT_FORMALITY") {
            self.formality = formality.parse()?;
        }
        if self.api_key.is_none() {
            let var = match self.provider {
                ProviderKind::Google => Some("GOOGLE_TRANSLATE_API_KEY"),
                ProviderKind::Deepl => Some("DEEPL_API_KEY"),
                ProviderKind::Mock => None,
            };
            self.api_key = var.and_then(|var| std::env::var(var).ok());
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> MtResult<()> {
        validate_locale(&self.source_locale)?;
        if self.max_batch_size == 0 {
            return Err(MtError::ConfigError(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn require_api_key(&self) -> MtResult<String> {
        self.api_key.clone().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            MtError::ConfigError(format!("No API key configured for {:?}", self.provider))
        })
    }

    /// Instantiate the configured provider
    pub fn build_translator(&self) -> MtResult<Arc<dyn MachineTranslator>> {
        Ok(match self.provider {
            ProviderKind::Google => {
                let mut provider = GoogleTranslateProvider::new(self.require_api_key()?)?;
                if let Some(endpoint) = &self.endpoint {
                    provider = provider.with_base_url(endpoint);
                }
                Arc::new(provider)
            }
            ProviderKind::Deepl => {
                let mut provider = DeepLProvider::new(self.require_api_key()?)?;
                if let Some(endpoint) = &self.endpoint {
                    provider = provider.with_base_url(endpoint);
                }
                Arc::new(provider)
            }
            ProviderKind::Mock => Arc::new(MockTranslator::new(MockMode::Suffix)),
        })
    }

    pub fn request_options(&self) -> RequestOptions {
        RequestOptions {
            source_locale: self.source_locale.clone(),
            formality: self.formality,
            preserve_formatting: self.preserve_formatting,
        }
    }

    /// A client for `translator` using this config's limits and options
    pub fn build_client(&self, translator: Arc<dyn MachineTranslator>) -> TranslationClient {
        TranslationClient::new(translator)
            .with_retry(self.retry)
            .with_max_batch_size(self.max_batch_size)
            .with_options(self.request_options())
            .with_log(TranslationLog::new())
    }
}
