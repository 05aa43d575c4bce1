//! Opaque positional markers standing in for placeholder constructs.
//!
//! Format: `__PLACEHOLDER_{index}__`, 0-indexed in descriptor order. When a
//! source string already contains the word `PLACEHOLDER` (in any case), the
//! parse picks a longer tag (`PLACEHOLDERX`, `PLACEHOLDERXX`, ...) that the
//! source does not contain, so markers stay a bijection onto descriptors.
//!
//! Translation providers treat these as untranslatable tokens most of the
//! time, but they do occasionally mangle the punctuation around them. The
//! repair pass recognises a bounded family of such corruptions:
//!
//! - stray periods or spaces: `__PLACEHOLDER_0.__`, `__PLACEHOLDER_ 0__`
//! - dropped underscores: `_PLACEHOLDER_0_`, `PLACEHOLDER_0`
//! - case changes: `__placeholder_0__`
//!
//! At most two underscores are taken on either side, so a repair never eats
//! into an adjacent marker.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Tag used unless the source already contains it
pub const DEFAULT_MARKER_TAG: &str = "PLACEHOLDER";

static DEFAULT_CORRUPTED_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&corrupted_pattern(DEFAULT_MARKER_TAG)).expect("marker pattern is valid")
});

fn corrupted_pattern(tag: &str) -> String {
    format!(
        r"(?i)(?:_{{1,2}} ?)?{} ?[_.]? ?(\d+)(?: ?\.?_{{1,2}})?",
        regex::escape(tag)
    )
}

/// Result of the repair pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRepair {
    /// Text with every repairable marker rewritten to canonical form
    pub text: String,
    /// Marker indices that were rewritten
    pub repaired: Vec<usize>,
}

/// The marker vocabulary of one parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerStyle {
    tag: String,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        MarkerStyle {
            tag: DEFAULT_MARKER_TAG.to_string(),
        }
    }
}

impl MarkerStyle {
    /// A style whose tag does not occur anywhere in `source`, ignoring case
    pub fn for_source(source: &str) -> Self {
        let lowered = source.to_lowercase();
        let mut tag = DEFAULT_MARKER_TAG.to_string();
        while lowered.contains(&tag.to_lowercase()) {
            tag.push('X');
        }
        MarkerStyle { tag }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The canonical marker for descriptor `index`
    pub fn marker(&self, index: usize) -> String {
        format!("__{}_{}__", self.tag, index)
    }

    /// Rewrite corrupted markers in `text` back to canonical form.
    ///
    /// Only indices below `count` whose canonical marker is absent are
    /// touched, and only their first corrupted occurrence; everything else
    /// is left as the provider returned it.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let repair = MarkerStyle::default().repair("Du hast __PLACEHOLDER_0.__", 1);
    /// assert_eq!(repair.text, "Du hast __PLACEHOLDER_0__");
    /// assert_eq!(repair.repaired, vec![0]);
    /// ```
    pub fn repair(&self, text: &str, count: usize) -> MarkerRepair {
        if self.tag == DEFAULT_MARKER_TAG {
            return self.repair_with(&DEFAULT_CORRUPTED_MARKER, text, count);
        }
        match Regex::new(&corrupted_pattern(&self.tag)) {
            Ok(pattern) => self.repair_with(&pattern, text, count),
            Err(_) => MarkerRepair {
                text: text.to_string(),
                repaired: Vec::new(),
            },
        }
    }

    fn repair_with(&self, pattern: &Regex, text: &str, count: usize) -> MarkerRepair {
        let mut repaired = Vec::new();
        let mut result = String::with_capacity(text.len());
        let mut cursor = 0;

        for captures in pattern.captures_iter(text) {
            let (Some(whole), Some(digits)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let Ok(index) = digits.as_str().parse::<usize>() else {
                continue;
            };
            let canonical = self.marker(index);
            if index >= count
                || whole.as_str() == canonical
                || text.contains(&canonical)
                || repaired.contains(&index)
            {
                continue;
            }
            result.push_str(&text[cursor..whole.start()]);
            result.push_str(&canonical);
            cursor = whole.end();
            repaired.push(index);
        }
        result.push_str(&text[cursor..]);

        MarkerRepair {
            text: result,
            repaired,
        }
    }
}

/// The canonical marker for descriptor `index` under the default tag
pub fn marker_for(index: usize) -> String {
    MarkerStyle::default().marker(index)
}

/// [`MarkerStyle::repair`] under the default tag
pub fn repair_markers(text: &str, count: usize) -> MarkerRepair {
    MarkerStyle::default().repair(text, count)
}
