//! Orchestration of a translation sweep.
//!
//! A session parses every source entry once, collects the texts that need a
//! provider (carriers and inner fragments), translates them per provider
//! language code and reconstructs each entry for each requested locale.
//!
//! Languages are translated concurrently; the chunks of one language are
//! sent one after another. A failed chunk only affects the entries that
//! have a unit in it.

use futures_util::future::join_all;
use phrasekit::syntax::is_translatable;
use phrasekit::{LanguageAdapters, Reconstructor, Tokenized, parse};
use std::collections::HashMap;

use crate::client::TranslationClient;
use crate::data::{EntryTranslation, SourceEntry, TranslationUnit};
use crate::log::TranslationLog;
use crate::translator::validate_locale;

/// Where the translated carrier of an entry comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CarrierSource {
    /// Nothing translatable outside the constructs; reuse the carrier
    Verbatim,
    /// Result of this unit
    Unit(usize),
}

/// Language-independent translation plan for one entry
#[derive(Debug)]
struct EntryPlan {
    tokenized: Tokenized,
    carrier: CarrierSource,
    /// Unit index of every fragment, per descriptor
    fragments: Vec<Vec<usize>>,
}

/// Deduplicated texts to translate, shared by all languages
#[derive(Debug, Default)]
struct SweepPlan {
    entries: Vec<EntryPlan>,
    texts: Vec<(String, Option<String>)>,
    index: HashMap<(String, Option<String>), usize>,
}

impl SweepPlan {
    fn build(entries: &[SourceEntry]) -> Self {
        let mut plan = SweepPlan::default();
        for entry in entries {
            let tokenized = parse(&entry.text);
            let carrier = if carrier_needs_translation(&tokenized) {
                CarrierSource::Unit(plan.unit(&tokenized.carrier, &entry.context))
            } else {
                CarrierSource::Verbatim
            };
            let fragments = tokenized
                .descriptors
                .iter()
                .map(|descriptor| {
                    descriptor
                        .fragments
                        .iter()
                        .map(|fragment| plan.unit(&fragment.text, &entry.context))
                        .collect()
                })
                .collect();
            plan.entries.push(EntryPlan {
                tokenized,
                carrier,
                fragments,
            });
        }
        plan
    }

    fn unit(&mut self, text: &str, context: &Option<String>) -> usize {
        let key = (text.to_string(), context.clone());
        if let Some(&index) = self.index.get(&key) {
            return index;
        }
        let index = self.texts.len();
        self.texts.push(key.clone());
        self.index.insert(key, index);
        index
    }

    /// Unit indices grouped by context, each group in first-seen order
    fn context_groups(&self) -> Vec<Vec<usize>> {
        let mut groups: Vec<(Option<String>, Vec<usize>)> = Vec::new();
        for (index, (_, context)) in self.texts.iter().enumerate() {
            match groups.iter_mut().find(|(c, _)| c == context) {
                Some((_, members)) => members.push(index),
                None => groups.push((context.clone(), vec![index])),
            }
        }
        groups.into_iter().map(|(_, members)| members).collect()
    }
}

/// Whether the carrier holds any text besides its markers
fn carrier_needs_translation(tokenized: &Tokenized) -> bool {
    let mut bare = tokenized.carrier.clone();
    for index in 0..tokenized.descriptors.len() {
        bare = bare.replace(&tokenized.markers.marker(index), " ");
    }
    is_translatable(&bare)
}

/// Owns the per-session state of a translation sweep: the client (and its
/// log) and the per-language template caches.
#[derive(Debug)]
pub struct TranslationSession {
    client: TranslationClient,
    adapters: LanguageAdapters,
}

impl TranslationSession {
    pub fn new(client: TranslationClient) -> Self {
        Self::with_adapters(client, LanguageAdapters::new())
    }

    pub fn with_adapters(client: TranslationClient, adapters: LanguageAdapters) -> Self {
        TranslationSession { client, adapters }
    }

    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    pub fn log(&self) -> &TranslationLog {
        self.client.log()
    }

    pub fn adapters(&self) -> &LanguageAdapters {
        &self.adapters
    }

    pub fn adapters_mut(&mut self) -> &mut LanguageAdapters {
        &mut self.adapters
    }

    /// Translate one string into one locale
    ///
    /// # Returns
    ///
    /// * `Some(text)` - the reconstructed translation
    /// * `None` - untranslated; see the log for why
    pub async fn translate(
        &mut self,
        text: &str,
        locale: &str,
        context: Option<&str>,
    ) -> Option<String> {
        let entry = Self::entry(text, context);
        self.translate_entries(&[entry], &[locale.to_string()])
            .await
            .pop()
            .and_then(|result| result.text)
    }

    /// Translate one string into every locale in `locales`
    ///
    /// Results are returned in `locales` order.
    pub async fn translate_all(
        &mut self,
        text: &str,
        locales: &[String],
        context: Option<&str>,
    ) -> Vec<(String, Option<String>)> {
        let entry = Self::entry(text, context);
        self.translate_entries(&[entry], locales)
            .await
            .into_iter()
            .map(|result| (result.locale, result.text))
            .collect()
    }

    /// Translate only into the locales that have no (non-empty) value in
    /// `existing` yet.
    pub async fn translate_missing(
        &mut self,
        text: &str,
        existing: &HashMap<String, String>,
        locales: &[String],
        context: Option<&str>,
    ) -> Vec<(String, Option<String>)> {
        let missing: Vec<String> = locales
            .iter()
            .filter(|locale| existing.get(*locale).is_none_or(|value| value.trim().is_empty()))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Vec::new();
        }
        self.translate_all(text, &missing, context).await
    }

    /// Translate many entries into many locales.
    ///
    /// # Returns
    ///
    /// One [`EntryTranslation`] per (entry, locale), entries in input order
    /// and locales in `locales` order within each entry.
    pub async fn translate_entries(
        &mut self,
        entries: &[SourceEntry],
        locales: &[String],
    ) -> Vec<EntryTranslation> {
        let plan = SweepPlan::build(entries);

        // Provider code per requested locale; invalid locales map to None
        let codes: Vec<Option<String>> = locales
            .iter()
            .map(|locale| match validate_locale(locale) {
                Ok(()) => Some(self.client.language_code(locale)),
                Err(err) => {
                    self.log().failure(locale, err.to_string());
                    None
                }
            })
            .collect();

        let mut unique_codes: Vec<String> = Vec::new();
        for code in codes.iter().flatten() {
            if !unique_codes.contains(code) {
                unique_codes.push(code.clone());
            }
        }

        let results = join_all(
            unique_codes
                .iter()
                .map(|code| Self::translate_language(&self.client, &plan, code)),
        )
        .await;
        let results: HashMap<&String, Vec<Option<String>>> =
            unique_codes.iter().zip(results).collect();

        let mut output = Vec::with_capacity(entries.len() * locales.len());
        for (entry, entry_plan) in entries.iter().zip(&plan.entries) {
            for (locale, code) in locales.iter().zip(&codes) {
                let outcome = code.as_ref().and_then(|code| {
                    let translated = results.get(code)?;
                    let cache = self.adapters.cache_mut(code);
                    rebuild_entry(entry_plan, translated, Reconstructor::with_templates(cache))
                });
                output.push(match outcome {
                    Some(reconstruction) => EntryTranslation {
                        key: entry.key.clone(),
                        locale: locale.clone(),
                        text: Some(reconstruction.text),
                        issues: reconstruction.issues,
                    },
                    None => EntryTranslation {
                        key: entry.key.clone(),
                        locale: locale.clone(),
                        text: None,
                        issues: Vec::new(),
                    },
                });
            }
        }
        output
    }

    /// All units of the plan for one provider code, chunked by context and
    /// batch limit and submitted one chunk after another.
    async fn translate_language(
        client: &TranslationClient,
        plan: &SweepPlan,
        code: &str,
    ) -> Vec<Option<String>> {
        let mut translated: Vec<Option<String>> = vec![None; plan.texts.len()];
        let limit = client.batch_limit();

        for group in plan.context_groups() {
            for chunk in group.chunks(limit) {
                let units: Vec<TranslationUnit> = chunk
                    .iter()
                    .map(|&index| {
                        let (text, context) = &plan.texts[index];
                        TranslationUnit::new(text, code).with_context(context.as_deref())
                    })
                    .collect();
                if let Some(results) = client.translate_batch(&units, code).await {
                    for (&index, result) in chunk.iter().zip(results) {
                        translated[index] = Some(result);
                    }
                }
            }
        }
        translated
    }

    fn entry(text: &str, context: Option<&str>) -> SourceEntry {
        let entry = SourceEntry::new("", text);
        match context {
            Some(context) => entry.with_context(context),
            None => entry,
        }
    }
}

/// Reconstruct one entry from the unit results of one language.
///
/// Returns `None` if any unit the entry depends on is untranslated.
fn rebuild_entry(
    plan: &EntryPlan,
    translated: &[Option<String>],
    reconstructor: Reconstructor<'_>,
) -> Option<phrasekit::Reconstruction> {
    let carrier = match plan.carrier {
        CarrierSource::Verbatim => plan.tokenized.carrier.clone(),
        CarrierSource::Unit(index) => translated.get(index)?.clone()?,
    };
    let fragments = plan
        .fragments
        .iter()
        .map(|units| {
            units
                .iter()
                .map(|&index| translated.get(index).cloned().flatten())
                .collect::<Option<Vec<String>>>()
                .map(Some)
        })
        .collect::<Option<Vec<Option<Vec<String>>>>>()?;

    Some(
        reconstructor
            .with_markers(plan.tokenized.markers.clone())
            .reconstruct(&carrier, &plan.tokenized.descriptors, &fragments),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carrier_short_circuit() {
        assert!(!carrier_needs_translation(&parse("{count:plural:{item}|{items}}")));
        assert!(!carrier_needs_translation(&parse("{a}: {b} (42)")));
        assert!(carrier_needs_translation(&parse("You have {n}")));
        assert!(!carrier_needs_translation(&parse("")));
    }

    #[test]
    fn test_plan_deduplicates_units() {
        let entries = vec![
            SourceEntry::new("a", "{n:plural:{item}|{items}} left"),
            SourceEntry::new("b", "{m:plural:{item}|{items}}"),
            SourceEntry::new("c", "{m:plural:{item}|{items}}").with_context("shop"),
        ];
        let plan = SweepPlan::build(&entries);
        let texts: Vec<&str> = plan.texts.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(
            texts,
            vec!["__PLACEHOLDER_0__ left", "item", "items", "item", "items"]
        );
        assert_eq!(plan.entries[1].carrier, CarrierSource::Verbatim);
        assert_eq!(plan.entries[1].fragments, vec![vec![1, 2]]);
        assert_eq!(plan.entries[2].fragments, vec![vec![3, 4]]);
        assert_eq!(plan.context_groups(), vec![vec![0, 1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_rebuild_needs_every_unit() {
        let plan = SweepPlan::build(&[SourceEntry::new("k", "You have {n:plural:{item}|{items}}")]);
        let entry = &plan.entries[0];

        let partial = vec![Some("Du hast __PLACEHOLDER_0__".to_string()), Some("Stück".to_string()), None];
        assert!(rebuild_entry(entry, &partial, Reconstructor::new()).is_none());

        let full = vec![
            Some("Du hast __PLACEHOLDER_0__".to_string()),
            Some("Stück".to_string()),
            Some("Stücke".to_string()),
        ];
        let result = rebuild_entry(entry, &full, Reconstructor::new()).unwrap();
        assert_eq!(result.text, "Du hast {n:plural:{Stück}|{Stücke}}");
    }
}
