use std::time::Duration;

/// One item to translate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    pub text: String,
    /// Provider code of the target language
    pub target_code: String,
    /// Free-text hint for the provider
    pub context: Option<String>,
}

impl TranslationUnit {
    pub fn new(text: &str, target_code: &str) -> Self {
        TranslationUnit {
            text: text.to_string(),
            target_code: target_code.to_string(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: Option<&str>) -> Self {
        self.context = context.map(|c| c.to_string());
        self
    }
}

/// Units bound for one provider request, with their retry state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub units: Vec<TranslationUnit>,
    pub target_code: String,
    /// Provider calls made so far
    pub attempt: u32,
    /// Backoff to wait if the next call is rate limited
    pub next_delay: Duration,
}

impl Batch {
    pub fn new(units: Vec<TranslationUnit>, target_code: &str, initial_delay: Duration) -> Self {
        Batch {
            units,
            target_code: target_code.to_string(),
            attempt: 0,
            next_delay: initial_delay,
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.units.iter().map(|u| u.text.clone()).collect()
    }

    /// Context shared by every unit, if they agree on one
    pub fn context(&self) -> Option<String> {
        let first = self.units.first()?.context.clone();
        if self.units.iter().all(|u| u.context == first) {
            first
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// A source string handed to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Caller's identifier, echoed in the results
    pub key: String,
    pub text: String,
    pub context: Option<String>,
}

impl SourceEntry {
    pub fn new(key: &str, text: &str) -> Self {
        SourceEntry {
            key: key.to_string(),
            text: text.to_string(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.context = Some(context.to_string()).filter(|c| !c.trim().is_empty());
        self
    }
}

/// Outcome for one (entry, target locale) pair.
///
/// `text` is `None` when the entry could not be translated; it is never
/// an empty stand-in for a failed translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTranslation {
    pub key: String,
    pub locale: String,
    pub text: Option<String>,
    pub issues: Vec<phrasekit::ReconstructionIssue>,
}

impl EntryTranslation {
    pub fn needs_review(&self) -> bool {
        self.text.is_none()
            || self
                .issues
                .iter()
                .any(|issue| !matches!(issue, phrasekit::ReconstructionIssue::Repaired(_)))
    }
}
