//! Machine translation for placeholder strings.
//!
//! Builds on `phrasekit` to send strings with an embedded formatting
//! micro-language through a machine translation provider and get back
//! structurally equivalent translations.
//!
//! # Overview
//!
//! 1. **Providers** - `MachineTranslator` with Google Translate, DeepL and mock backends
//! 2. **TranslationClient** - batch submission, rate-limit backoff, structured log
//! 3. **TranslationSession** - groups units per provider language, translates
//!    languages concurrently and reconstructs every entry
//!
//! # Example
//!
//! ```ignore
//! use phrasekit_mt::{MtConfig, TranslationSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MtConfig::from_env()?;
//!     let client = config.build_client(config.build_translator()?);
//!     let mut session = TranslationSession::new(client);
//!
//!     let translated = session
//!         .translate("You have {count:plural:{} item|{} items}", "de", None)
//!         .await;
//!     println!("{:?}", translated);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod data;
pub mod deepl;
pub mod error;
pub mod google_translate;
pub mod log;
pub mod mock;
pub mod session;
pub mod translator;

#[cfg(test)]
mod integration_tests;

pub use client::{RetryPolicy, TranslationClient};
pub use config::{MtConfig, ProviderKind};
pub use data::{Batch, EntryTranslation, SourceEntry, TranslationUnit};
pub use deepl::DeepLProvider;
pub use error::{MtError, MtResult};
pub use google_translate::GoogleTranslateProvider;
pub use log::{LogEntry, LogEvent, LogLevel, TranslationLog};
pub use mock::{MockMode, MockTranslator};
pub use session::TranslationSession;
pub use translator::{BatchRequest, Formality, MachineTranslator, RequestOptions, validate_locale};
