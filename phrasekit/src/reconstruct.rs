//! Merging translated carriers and fragments back into placeholder strings.

use tracing::{debug, warn};

use crate::adapter::TemplateCache;
use crate::descriptor::PlaceholderDescriptor;
use crate::extractor::{sanitize_fragment, splice};
use crate::marker::MarkerStyle;

/// Something the reconstructor had to work around for one marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructionIssue {
    /// The marker came back corrupted and was rewritten
    Repaired(usize),
    /// The marker was not found, or only overlapping another marker; the
    /// [`MissingMarker`] fallback was appended at the end
    Missing(usize),
    /// The marker appeared more than once; only the first was substituted
    Duplicated(usize),
}

impl ReconstructionIssue {
    pub fn index(&self) -> usize {
        match self {
            ReconstructionIssue::Repaired(i)
            | ReconstructionIssue::Missing(i)
            | ReconstructionIssue::Duplicated(i) => *i,
        }
    }
}

impl std::fmt::Display for ReconstructionIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconstructionIssue::Repaired(i) => write!(f, "marker {} repaired", i),
            ReconstructionIssue::Missing(i) => write!(f, "marker {} missing", i),
            ReconstructionIssue::Duplicated(i) => write!(f, "marker {} duplicated", i),
        }
    }
}

/// Final text plus everything that needed attention while producing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    pub text: String,
    pub issues: Vec<ReconstructionIssue>,
}

impl Reconstruction {
    /// True when nothing was repaired, lost or duplicated
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Whether a human should look at the result
    pub fn needs_review(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| !matches!(issue, ReconstructionIssue::Repaired(_)))
    }
}

/// What to put in the output for a marker that cannot be found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingMarker {
    /// Append the rebuilt construct, so the output keeps every construct
    #[default]
    AppendConstruct,
    /// Append the literal marker, so the loss shows in the output itself
    AppendMarker,
}

/// Rebuilds placeholder strings from translated pieces.
///
/// Without a template cache every construct keeps its source structure.
/// With one, Plural constructs are rewritten for the cache's language
/// before fragment translations are spliced in.
///
/// A marker the provider dropped is reported as
/// [`ReconstructionIssue::Missing`]; by default its construct is appended
/// at the end of the text, see [`MissingMarker`] for the alternative.
///
/// # Example
///
/// ```ignore
/// let tokenized = parse("You have {count:plural:{} item|{} items}");
/// let result = Reconstructor::new().reconstruct(
///     "Du hast __PLACEHOLDER_0__",
///     &tokenized.descriptors,
///     &[Some(vec!["Gegenstand".into(), "Gegenstände".into()])],
/// );
/// assert_eq!(result.text, "Du hast {count:plural:{} Gegenstand|{} Gegenstände}");
/// ```
#[derive(Default)]
pub struct Reconstructor<'a> {
    templates: Option<&'a mut TemplateCache>,
    markers: MarkerStyle,
    missing: MissingMarker,
}

impl<'a> Reconstructor<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consult (and fill) a language's template cache while rebuilding
    pub fn with_templates(templates: &'a mut TemplateCache) -> Self {
        Reconstructor {
            templates: Some(templates),
            ..Self::default()
        }
    }

    /// Look for the markers of this style instead of the default ones.
    ///
    /// Pass the [`Tokenized::markers`](crate::Tokenized::markers) of the
    /// parse that produced the carrier.
    pub fn with_markers(mut self, markers: MarkerStyle) -> Self {
        self.markers = markers;
        self
    }

    pub fn on_missing(mut self, missing: MissingMarker) -> Self {
        self.missing = missing;
        self
    }

    /// Rebuild one construct from its fragment translations.
    ///
    /// Falls back to the source construct verbatim when there are no
    /// translations or their count does not match the fragment count.
    pub fn rebuild(
        &mut self,
        descriptor: &PlaceholderDescriptor,
        translations: Option<&[String]>,
    ) -> String {
        let Some(translations) = translations else {
            return descriptor.raw.clone();
        };
        if descriptor.fragments.is_empty() {
            return descriptor.raw.clone();
        }
        if translations.len() != descriptor.fragments.len() {
            warn!(
                "Expected {} fragment translations for {:?}, got {}; keeping source",
                descriptor.fragments.len(),
                descriptor.raw,
                translations.len()
            );
            return descriptor.raw.clone();
        }

        if let Some(cache) = self.templates.as_deref_mut()
            && let Some(template) = cache.template_for(descriptor)
        {
            return template.render(descriptor, translations);
        }

        let replacements = descriptor
            .fragments
            .iter()
            .zip(translations)
            .map(|(fragment, translated)| {
                (
                    fragment.span.clone(),
                    sanitize_fragment(&fragment.text, translated),
                )
            })
            .collect();
        splice(&descriptor.raw, replacements)
    }

    /// Merge a translated carrier with rebuilt constructs.
    ///
    /// # Arguments
    ///
    /// * `carrier` - the carrier as it came back from translation
    /// * `descriptors` - descriptors from the parse that produced the carrier
    /// * `fragments` - fragment translations per descriptor index; `None` (or
    ///   a missing entry) keeps that construct verbatim
    ///
    /// # Returns
    ///
    /// Never fails. Every descriptor's construct appears once in the text,
    /// unless the [`MissingMarker::AppendMarker`] fallback was chosen.
    pub fn reconstruct(
        &mut self,
        carrier: &str,
        descriptors: &[PlaceholderDescriptor],
        fragments: &[Option<Vec<String>>],
    ) -> Reconstruction {
        let repair = self.markers.repair(carrier, descriptors.len());
        let text = repair.text;
        let mut issues: Vec<ReconstructionIssue> = repair
            .repaired
            .iter()
            .map(|&index| {
                debug!("Repaired corrupted marker {}", index);
                ReconstructionIssue::Repaired(index)
            })
            .collect();

        let placements = locate_markers(&text, &self.markers, descriptors.len());

        let mut rebuilt: Vec<String> = descriptors
            .iter()
            .enumerate()
            .map(|(index, descriptor)| {
                let translations = fragments.get(index).and_then(|f| f.as_deref());
                self.rebuild(descriptor, translations)
            })
            .collect();

        let mut result = String::with_capacity(text.len());
        let mut cursor = 0;
        for placement in &placements.accepted {
            result.push_str(&text[cursor..placement.start]);
            result.push_str(&rebuilt[placement.index]);
            cursor = placement.end;
        }
        result.push_str(&text[cursor..]);

        for (index, descriptor) in descriptors.iter().enumerate() {
            let marker = self.markers.marker(index);
            if !placements.is_placed(index) {
                warn!("Marker {} for {:?} lost in translation", marker, descriptor.raw);
                issues.push(ReconstructionIssue::Missing(index));
                let tail = match self.missing {
                    MissingMarker::AppendConstruct => std::mem::take(&mut rebuilt[index]),
                    MissingMarker::AppendMarker => marker,
                };
                if !result.is_empty() && !result.ends_with(char::is_whitespace) {
                    result.push(' ');
                }
                result.push_str(&tail);
            } else if placements.duplicated.contains(&index) {
                warn!("Marker {} appears more than once; extra copies left as is", marker);
                issues.push(ReconstructionIssue::Duplicated(index));
            }
        }

        Reconstruction {
            text: result,
            issues,
        }
    }
}

/// One marker occurrence chosen for substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    start: usize,
    end: usize,
    index: usize,
}

#[derive(Debug, Default)]
struct Placements {
    /// Non-overlapping, in text order
    accepted: Vec<Placement>,
    duplicated: Vec<usize>,
}

impl Placements {
    fn is_placed(&self, index: usize) -> bool {
        self.accepted.iter().any(|p| p.index == index)
    }
}

/// Pick at most one occurrence per marker in a single left-to-right pass.
///
/// Occurrences that overlap an accepted one are skipped, except that two
/// markers sharing only underscores (`__PLACEHOLDER_0___PLACEHOLDER_1__`)
/// are split between them.
fn locate_markers(text: &str, markers: &MarkerStyle, count: usize) -> Placements {
    let mut occurrences: Vec<Placement> = (0..count)
        .flat_map(|index| {
            let marker = markers.marker(index);
            text.match_indices(&marker)
                .map(|(start, found)| Placement {
                    start,
                    end: start + found.len(),
                    index,
                })
                .collect::<Vec<_>>()
        })
        .collect();
    occurrences.sort_by_key(|p| (p.start, p.index));

    let mut placements = Placements::default();
    for occurrence in occurrences {
        if placements.is_placed(occurrence.index) {
            if !placements.duplicated.contains(&occurrence.index) {
                placements.duplicated.push(occurrence.index);
            }
            continue;
        }
        if let Some(last) = placements.accepted.last_mut()
            && occurrence.start < last.end
        {
            let shared = &text[occurrence.start..last.end];
            if occurrence.start > last.start && shared.bytes().all(|b| b == b'_') {
                last.end = occurrence.start;
            } else {
                continue;
            }
        }
        placements.accepted.push(occurrence);
    }
    placements
}

/// Reconstruct without any language adaptation
pub fn reconstruct(
    carrier: &str,
    descriptors: &[PlaceholderDescriptor],
    fragments: &[Option<Vec<String>>],
) -> Reconstruction {
    Reconstructor::new().reconstruct(carrier, descriptors, fragments)
}
