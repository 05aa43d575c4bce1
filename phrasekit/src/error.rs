/// Reasons a candidate construct is left in the carrier as literal text.
///
/// These are never fatal: the tokenizer logs them and keeps going with the
/// rest of the string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// A `{` with no matching `}` at the given byte offset
    UnbalancedBraces { offset: usize },
    /// The span names a known formatter but its header cannot be read
    MalformedHeader { formatter: String, reason: String },
}

impl ParseFailure {
    pub fn malformed(formatter: &str, reason: &str) -> Self {
        ParseFailure::MalformedHeader {
            formatter: formatter.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseFailure::UnbalancedBraces { offset } => {
                write!(f, "Unbalanced brace at offset {}", offset)
            }
            ParseFailure::MalformedHeader { formatter, reason } => {
                write!(f, "Malformed '{}' construct: {}", formatter, reason)
            }
        }
    }
}

impl std::error::Error for ParseFailure {}
