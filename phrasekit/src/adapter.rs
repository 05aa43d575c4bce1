//! Per-language restructuring of placeholder constructs.
//!
//! Some target languages have no inflectional plural (Japanese, Chinese,
//! Korean, Thai, ...): CLDR gives them a single `other` category. Keeping a
//! `one|other` Plural construct there only duplicates the same translated
//! phrase, so for those languages a Plural is collapsed to its last
//! (`other`) variant.
//!
//! Templates are built lazily and cached per (language, raw construct) in a
//! [`TemplateCache`]. Caches live in a [`LanguageAdapters`] table owned by
//! whoever drives the session; there is no process-wide state.

use icu_locale::Locale;
use icu_plurals::{PluralCategory, PluralRuleType, PluralRules};
use std::collections::HashMap;
use std::ops::Range;

use crate::descriptor::{PlaceholderDescriptor, PlaceholderKind};
use crate::extractor::{sanitize_fragment, splice};
use crate::syntax::{parse_header, split_top_level};

/// Counts chosen to hit every CLDR cardinal category somewhere
const SAMPLE_COUNTS: [usize; 10] = [0, 1, 2, 3, 4, 5, 7, 11, 21, 101];

/// Transformation applied to constructs for one target language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterRule {
    /// Keep constructs as they are
    Identity,
    /// Reduce Plural constructs to their `other` variant
    CollapsePlural,
}

/// A construct rewritten for a target language, with slots for fragment
/// translations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTemplate {
    pub text: String,
    pub slots: Vec<TemplateSlot>,
}

/// Where one fragment translation goes inside a [`LanguageTemplate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSlot {
    /// Byte range inside `LanguageTemplate::text`
    pub span: Range<usize>,
    /// Index into the owning descriptor's fragment list
    pub fragment: usize,
}

impl LanguageTemplate {
    /// Fill the slots with translations given in the descriptor's fragment
    /// order.
    pub fn render(&self, descriptor: &PlaceholderDescriptor, translations: &[String]) -> String {
        let replacements = self
            .slots
            .iter()
            .filter_map(|slot| {
                let source = descriptor.fragments.get(slot.fragment)?;
                let translated = translations.get(slot.fragment)?;
                Some((slot.span.clone(), sanitize_fragment(&source.text, translated)))
            })
            .collect();
        splice(&self.text, replacements)
    }
}

/// Strip region/script from a locale code and lower-case it.
///
/// - `en-US` → `en`
/// - `zh_Hans` → `zh`
/// - `PT-BR` → `pt`
pub fn normalize_locale(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or(locale)
        .to_lowercase()
}

/// Whether CLDR gives `language` more than the single `other` cardinal
/// category.
///
/// Returns `None` if the language is unknown to ICU.
pub fn has_inflectional_plurals(language: &str) -> Option<bool> {
    let locale: Locale = normalize_locale(language).parse().ok()?;
    let rules = PluralRules::try_new(locale.into(), PluralRuleType::Cardinal.into()).ok()?;
    Some(
        SAMPLE_COUNTS
            .iter()
            .any(|&n| rules.category_for(n) != PluralCategory::Other),
    )
}

/// Default rule for a language, derived from its plural rules
pub fn rule_for_language(language: &str) -> AdapterRule {
    match has_inflectional_plurals(language) {
        Some(false) => AdapterRule::CollapsePlural,
        _ => AdapterRule::Identity,
    }
}

/// Build the collapsed form of a Plural construct.
///
/// `{count:plural:{} item|{} items}` becomes `{count:plural:{} items}`,
/// with the slot of `items` kept.
pub fn collapse_plural(descriptor: &PlaceholderDescriptor) -> Option<LanguageTemplate> {
    if descriptor.kind != PlaceholderKind::Plural {
        return None;
    }
    let raw = &descriptor.raw;
    let body = parse_header(raw).ok()??.body?;
    let variants = split_top_level(raw, body.clone(), b'|');
    if variants.len() < 2 {
        return None;
    }
    let other = variants
        .iter()
        .rev()
        .find(|v| !raw[(*v).clone()].trim().is_empty())?
        .clone();

    let mut text = String::with_capacity(raw.len());
    text.push_str(&raw[..body.start]);
    text.push_str(&raw[other.clone()]);
    text.push_str(&raw[body.end..]);

    let slots = descriptor
        .fragments
        .iter()
        .enumerate()
        .filter(|(_, f)| f.span.start >= other.start && f.span.end <= other.end)
        .map(|(index, f)| TemplateSlot {
            span: f.span.start - other.start + body.start..f.span.end - other.start + body.start,
            fragment: index,
        })
        .collect();

    Some(LanguageTemplate { text, slots })
}

/// Template cache for one target language.
#[derive(Debug, Clone)]
pub struct TemplateCache {
    language: String,
    rule: Option<AdapterRule>,
    templates: HashMap<String, Option<LanguageTemplate>>,
}

impl TemplateCache {
    pub fn new(language: &str) -> Self {
        TemplateCache {
            language: language.to_string(),
            rule: None,
            templates: HashMap::new(),
        }
    }

    /// Create a cache with a fixed rule instead of the CLDR-derived one
    pub fn with_rule(language: &str, rule: AdapterRule) -> Self {
        TemplateCache {
            rule: Some(rule),
            ..TemplateCache::new(language)
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// The rule for this language, resolved on first use
    pub fn rule(&mut self) -> AdapterRule {
        *self
            .rule
            .get_or_insert_with(|| rule_for_language(&self.language))
    }

    /// The adapted template for `descriptor`, if its language needs one.
    ///
    /// Only Plural constructs are ever adapted. Results (including "no
    /// template") are cached by the construct's raw text.
    pub fn template_for(&mut self, descriptor: &PlaceholderDescriptor) -> Option<&LanguageTemplate> {
        if descriptor.kind != PlaceholderKind::Plural {
            return None;
        }
        let rule = self.rule();
        self.templates
            .entry(descriptor.raw.clone())
            .or_insert_with(|| match rule {
                AdapterRule::Identity => None,
                AdapterRule::CollapsePlural => collapse_plural(descriptor),
            })
            .as_ref()
    }

    /// Number of constructs looked up so far
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Session-scoped table of template caches, keyed by language code.
#[derive(Debug, Clone, Default)]
pub struct LanguageAdapters {
    overrides: HashMap<String, AdapterRule>,
    caches: HashMap<String, TemplateCache>,
}

impl LanguageAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a rule for a language, bypassing the CLDR lookup
    pub fn set_rule(&mut self, language: &str, rule: AdapterRule) -> &mut Self {
        self.overrides.insert(language.to_string(), rule);
        self.caches.remove(language);
        self
    }

    /// The cache for `language`, created empty on first use
    pub fn cache_mut(&mut self, language: &str) -> &mut TemplateCache {
        let overrides = &self.overrides;
        self.caches
            .entry(language.to_string())
            .or_insert_with(|| match overrides.get(language) {
                Some(rule) => TemplateCache::with_rule(language, *rule),
                None => TemplateCache::new(language),
            })
    }

    pub fn get(&self, language: &str) -> Option<&TemplateCache> {
        self.caches.get(language)
    }
}
