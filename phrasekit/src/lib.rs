//! Placeholder-preserving preparation of strings for machine translation.
//!
//! A source string such as
//! `"{player:gender(male,female):He|She} found {count:plural:{item}|{items}}"`
//! is split into a carrier string with opaque markers plus one descriptor per
//! construct. The carrier and the constructs' inner fragments are translated
//! separately and merged back by the [`Reconstructor`].
//!
//! ```ignore
//! use phrasekit::{parse, reconstruct};
//!
//! let tokenized = parse("You have {count:plural:{} item|{} items}");
//! assert_eq!(tokenized.carrier, "You have __PLACEHOLDER_0__");
//!
//! let result = reconstruct(
//!     "Du hast __PLACEHOLDER_0__",
//!     &tokenized.descriptors,
//!     &[Some(vec!["Gegenstand".to_string(), "Gegenstände".to_string()])],
//! );
//! assert_eq!(result.text, "Du hast {count:plural:{} Gegenstand|{} Gegenstände}");
//! ```

pub mod adapter;
pub mod descriptor;
pub mod error;
pub mod extractor;
pub mod marker;
pub mod parser;
pub mod reconstruct;
pub mod syntax;

pub use adapter::{
    AdapterRule, LanguageAdapters, LanguageTemplate, TemplateCache, normalize_locale,
    rule_for_language,
};
pub use descriptor::{Fragment, PlaceholderDescriptor, PlaceholderKind, Tokenized};
pub use error::ParseFailure;
pub use extractor::{extract_fragments, sanitize_fragment};
pub use marker::{DEFAULT_MARKER_TAG, MarkerRepair, MarkerStyle, marker_for, repair_markers};
pub use parser::{DEFAULT_MATCHERS, Matcher, Parser, parse};
pub use reconstruct::{
    MissingMarker, Reconstruction, ReconstructionIssue, Reconstructor, reconstruct,
};
