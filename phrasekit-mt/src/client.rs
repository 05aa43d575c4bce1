//! Batch submission with bounded rate-limit retry.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::data::{Batch, TranslationUnit};
use crate::error::{MtError, MtResult};
use crate::log::TranslationLog;
use crate::translator::{BatchRequest, MachineTranslator, RequestOptions};

/// Backoff settings for rate-limited batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each one after it
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

/// Submits batches to one provider.
///
/// Holds no per-batch state: every call runs its own retry loop, so batches
/// for different languages can be in flight at the same time without
/// affecting each other.
#[derive(Clone)]
pub struct TranslationClient {
    translator: Arc<dyn MachineTranslator>,
    retry: RetryPolicy,
    max_batch_size: usize,
    options: RequestOptions,
    log: TranslationLog,
}

impl TranslationClient {
    /// Default cap on texts per request
    pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

    pub fn new(translator: Arc<dyn MachineTranslator>) -> Self {
        TranslationClient {
            translator,
            retry: RetryPolicy::default(),
            max_batch_size: Self::DEFAULT_MAX_BATCH_SIZE,
            options: RequestOptions::default(),
            log: TranslationLog::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Share an existing log instead of the client's own
    pub fn with_log(mut self, log: TranslationLog) -> Self {
        self.log = log;
        self
    }

    pub fn log(&self) -> &TranslationLog {
        &self.log
    }

    pub fn translator(&self) -> &dyn MachineTranslator {
        self.translator.as_ref()
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Largest batch callers may submit: the configured cap, further
    /// limited by what the provider accepts
    pub fn batch_limit(&self) -> usize {
        self.max_batch_size.min(self.translator.max_batch_size())
    }

    /// Provider code for a locale
    pub fn language_code(&self, locale: &str) -> String {
        self.translator.language_code(locale)
    }

    /// Translate one batch, all or nothing.
    ///
    /// # Returns
    ///
    /// * `Some(translations)` - one translation per unit, in unit order
    /// * `None` - the batch failed; the reason is in the log
    pub async fn translate_batch(
        &self,
        units: &[TranslationUnit],
        target_code: &str,
    ) -> Option<Vec<String>> {
        self.try_translate_batch(units, target_code).await.ok()
    }

    /// Like [`translate_batch`](Self::translate_batch), keeping the error.
    ///
    /// Rate-limited calls are retried up to `max_retries` times, sleeping
    /// `initial_delay`, then twice that, and so on between attempts. Every
    /// other failure ends the batch immediately.
    pub async fn try_translate_batch(
        &self,
        units: &[TranslationUnit],
        target_code: &str,
    ) -> MtResult<Vec<String>> {
        let limit = self.batch_limit();
        if units.len() > limit {
            let err = MtError::BatchTooLarge {
                size: units.len(),
                max: limit,
            };
            self.log.failure(target_code, err.to_string());
            return Err(err);
        }
        if units.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch = Batch::new(units.to_vec(), target_code, self.retry.initial_delay());
        let source = self.translator.language_code(&self.options.source_locale);
        let request = BatchRequest::new(batch.texts(), &source, target_code)
            .with_options(&self.options)
            .with_context(batch.context());
        let provider = self.translator.provider_name().to_string();

        loop {
            batch.attempt += 1;
            self.log.request(
                target_code,
                format!(
                    "{} attempt {}: {} texts {} → {}",
                    provider,
                    batch.attempt,
                    batch.len(),
                    source,
                    target_code
                ),
            );

            match self.translator.translate_batch(&request).await {
                Ok(translations) if translations.len() == batch.len() => {
                    self.log.success(
                        target_code,
                        format!("{} translations after {} attempt(s)", translations.len(), batch.attempt),
                    );
                    return Ok(translations);
                }
                Ok(translations) => {
                    let err = MtError::BadResponse(format!(
                        "Expected {} translations, got {}",
                        batch.len(),
                        translations.len()
                    ));
                    self.log.failure(target_code, err.to_string());
                    return Err(err);
                }
                Err(err) if err.is_retryable() && batch.attempt <= self.retry.max_retries => {
                    let delay = batch.next_delay;
                    self.log.retry(
                        target_code,
                        delay,
                        format!(
                            "{}; retry {}/{} in {}ms",
                            err,
                            batch.attempt,
                            self.retry.max_retries,
                            delay.as_millis()
                        ),
                    );
                    tokio::time::sleep(delay).await;
                    batch.next_delay = delay * 2;
                }
                Err(err) => {
                    self.log.failure(
                        target_code,
                        format!("{} (gave up after {} attempt(s))", err, batch.attempt),
                    );
                    return Err(err);
                }
            }
        }
    }
}

impl std::fmt::Debug for TranslationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationClient")
            .field("provider", &self.translator.provider_name())
            .field("retry", &self.retry)
            .field("max_batch_size", &self.max_batch_size)
            .finish()
    }
}
