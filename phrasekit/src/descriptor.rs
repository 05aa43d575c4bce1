use serde::Serialize;
use std::ops::Range;

use crate::marker::MarkerStyle;

/// Kind of placeholder construct found in a source string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlaceholderKind {
    /// `{name}` or a format string such as `{price:N2}`
    Variable,
    /// `{name:plural:<variant>|<variant>|...}`
    Plural,
    /// `{name:gender(opt1,opt2,...):<variant>|...}`
    Gender,
    /// `{name:choose(opt1,opt2,...):<variant>|...}`
    Choose,
    /// `{name:list:...}`
    List,
    /// `{name:date:...}` / `{name:time:...}`
    DateTime,
    /// Any other composition containing nested braces
    Nested,
}

impl PlaceholderKind {
    /// Whether constructs of this kind carry human-readable fragments
    pub fn has_fragments(self) -> bool {
        matches!(
            self,
            PlaceholderKind::Plural | PlaceholderKind::Gender | PlaceholderKind::Choose
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlaceholderKind::Variable => "variable",
            PlaceholderKind::Plural => "plural",
            PlaceholderKind::Gender => "gender",
            PlaceholderKind::Choose => "choose",
            PlaceholderKind::List => "list",
            PlaceholderKind::DateTime => "datetime",
            PlaceholderKind::Nested => "nested",
        }
    }
}

impl std::fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A human-readable piece nested inside a construct.
///
/// `span` is the byte range of `text` inside the owning descriptor's `raw`
/// string; leading and trailing whitespace is left outside the span so it
/// survives translation untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub text: String,
    pub span: Range<usize>,
}

/// One top-level placeholder construct taken out of a source string.
///
/// # Example
///
/// For `"You have {count:plural:{} item|{} items}"`:
///
/// ```ignore
/// PlaceholderDescriptor {
///     kind: PlaceholderKind::Plural,
///     raw: "{count:plural:{} item|{} items}",
///     name: "count",
///     options: vec![],
///     fragments: vec![Fragment { text: "item", .. }, Fragment { text: "items", .. }],
///     depth: 2,
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderDescriptor {
    pub kind: PlaceholderKind,
    /// The construct exactly as it appeared in the source
    pub raw: String,
    /// Variable the construct selects on
    pub name: String,
    /// Option list for Gender/Choose (and optional locale hints elsewhere)
    pub options: Vec<String>,
    /// Translatable fragments, in positional order
    pub fragments: Vec<Fragment>,
    /// Deepest brace nesting inside `raw`
    pub depth: usize,
}

impl PlaceholderDescriptor {
    /// Fragment texts in positional order, ready to submit for translation
    pub fn fragment_texts(&self) -> Vec<String> {
        self.fragments.iter().map(|f| f.text.clone()).collect()
    }
}

/// Carrier string plus the descriptors its markers stand for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tokenized {
    /// Source text with every top-level construct replaced by a marker
    pub carrier: String,
    /// Descriptors indexed by marker number
    pub descriptors: Vec<PlaceholderDescriptor>,
    /// Marker vocabulary used in `carrier`
    pub markers: MarkerStyle,
}

impl Tokenized {
    /// Total number of fragments across all descriptors
    pub fn fragment_count(&self) -> usize {
        self.descriptors.iter().map(|d| d.fragments.len()).sum()
    }
}
