use tracing::debug;

use crate::descriptor::{PlaceholderDescriptor, PlaceholderKind, Tokenized};
use crate::error::ParseFailure;
use crate::extractor::extract_fragments;
use crate::marker::MarkerStyle;
use crate::syntax::{Header, nesting_depth, parse_header, scan_braces};

/// What a matcher decided about one top-level span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: PlaceholderKind,
    pub name: String,
    pub options: Vec<String>,
}

/// Outcome of running one matcher against one balanced span.
///
/// * `Ok(Some(_))` - the span is this matcher's construct
/// * `Ok(None)` - not this matcher's construct, later matchers may try
/// * `Err(_)` - this matcher's construct, but malformed; the span stays literal
pub type MatchOutcome = Result<Option<Classified>, ParseFailure>;

/// A pure classifier for balanced `{...}` spans
pub type Matcher = fn(&str) -> MatchOutcome;

/// The matcher chain, most specific first.
pub const DEFAULT_MATCHERS: [Matcher; 7] = [
    match_gender,
    match_choose,
    match_plural,
    match_list,
    match_date_time,
    match_nested,
    match_variable,
];

fn formatter_construct(
    raw: &str,
    formatters: &[&str],
    kind: PlaceholderKind,
    require_body: bool,
    require_options: bool,
) -> MatchOutcome {
    let header: Header = match parse_header(raw) {
        Ok(Some(header)) if formatters.contains(&header.formatter.as_str()) => header,
        Ok(_) => return Ok(None),
        Err(ParseFailure::MalformedHeader { formatter, reason })
            if formatters.contains(&formatter.as_str()) =>
        {
            return Err(ParseFailure::MalformedHeader { formatter, reason });
        }
        Err(_) => return Ok(None),
    };

    if require_body && header.body.is_none() {
        return Err(ParseFailure::malformed(&header.formatter, "missing body"));
    }
    if require_options && header.options.as_ref().is_none_or(|o| o.is_empty()) {
        return Err(ParseFailure::malformed(&header.formatter, "missing options"));
    }

    Ok(Some(Classified {
        kind,
        name: header.name,
        options: header.options.unwrap_or_default(),
    }))
}

/// Gender selection, including gender bodies whose variants carry nested
/// plurals (the combined gender+plural form).
pub fn match_gender(raw: &str) -> MatchOutcome {
    formatter_construct(raw, &["gender"], PlaceholderKind::Gender, true, false)
}

pub fn match_choose(raw: &str) -> MatchOutcome {
    formatter_construct(raw, &["choose"], PlaceholderKind::Choose, true, true)
}

pub fn match_plural(raw: &str) -> MatchOutcome {
    formatter_construct(raw, &["plural"], PlaceholderKind::Plural, true, false)
}

pub fn match_list(raw: &str) -> MatchOutcome {
    formatter_construct(raw, &["list"], PlaceholderKind::List, false, false)
}

pub fn match_date_time(raw: &str) -> MatchOutcome {
    formatter_construct(raw, &["date", "time"], PlaceholderKind::DateTime, false, false)
}

/// Any remaining span that has braces inside it
pub fn match_nested(raw: &str) -> MatchOutcome {
    let inner = &raw[1..raw.len() - 1];
    if !inner.contains('{') {
        return Ok(None);
    }
    let name_end = inner.find([':', '{']).unwrap_or(inner.len());
    Ok(Some(Classified {
        kind: PlaceholderKind::Nested,
        name: inner[..name_end].trim().to_string(),
        options: Vec::new(),
    }))
}

/// `{name}`, `{}` and format strings like `{price:N2}`
pub fn match_variable(raw: &str) -> MatchOutcome {
    let inner = &raw[1..raw.len() - 1];
    if inner.contains(['{', '}']) {
        return Ok(None);
    }
    let name_end = inner.find(':').unwrap_or(inner.len());
    Ok(Some(Classified {
        kind: PlaceholderKind::Variable,
        name: inner[..name_end].trim().to_string(),
        options: Vec::new(),
    }))
}

/// Piece of the progressively tokenized string
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Not yet claimed by any matcher
    Text(String),
    /// Replaced by descriptor `n`
    Marker(usize),
    /// Rejected by a matcher; kept verbatim and hidden from later matchers
    Literal(String),
}

/// Tokenizer for placeholder strings.
///
/// Runs each matcher of the chain over the spans that earlier matchers left
/// untouched. A matched span is replaced with a numbered marker before the
/// next matcher runs, so a coarse matcher can never capture text a more
/// specific one already claimed. Only top-level spans are considered; a
/// construct nested inside another one belongs to its outer descriptor.
///
/// # Example
///
/// ```ignore
/// let parser = Parser::new("You have {count:plural:{} item|{} items}");
/// let tokenized = parser.parse();
/// assert_eq!(tokenized.carrier, "You have __PLACEHOLDER_0__");
/// ```
pub struct Parser<'a> {
    input: &'a str,
    matchers: Vec<Matcher>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            input,
            matchers: DEFAULT_MATCHERS.to_vec(),
        }
    }

    /// Use a custom matcher chain instead of [`DEFAULT_MATCHERS`]
    pub fn with_matchers(input: &'a str, matchers: Vec<Matcher>) -> Self {
        Parser { input, matchers }
    }

    pub fn parse(&self) -> Tokenized {
        let mut segments = vec![Segment::Text(self.input.to_string())];
        let mut descriptors = Vec::new();

        for unmatched in scan_braces(self.input, 0..self.input.len()).unmatched {
            debug!(
                "Leaving literal: {}",
                ParseFailure::UnbalancedBraces { offset: unmatched }
            );
        }

        for matcher in &self.matchers {
            segments = Self::apply_matcher(*matcher, segments, &mut descriptors);
        }

        let markers = MarkerStyle::for_source(self.input);
        let mut carrier = String::with_capacity(self.input.len());
        for segment in &segments {
            match segment {
                Segment::Text(text) | Segment::Literal(text) => carrier.push_str(text),
                Segment::Marker(index) => carrier.push_str(&markers.marker(*index)),
            }
        }

        Tokenized {
            carrier,
            descriptors,
            markers,
        }
    }

    fn apply_matcher(
        matcher: Matcher,
        segments: Vec<Segment>,
        descriptors: &mut Vec<PlaceholderDescriptor>,
    ) -> Vec<Segment> {
        let mut result = Vec::with_capacity(segments.len());
        for segment in segments {
            let Segment::Text(text) = segment else {
                result.push(segment);
                continue;
            };

            let mut cursor = 0;
            for span in scan_braces(&text, 0..text.len()).spans {
                let raw = &text[span.clone()];
                match matcher(raw) {
                    Ok(Some(classified)) => {
                        push_text(&mut result, &text[cursor..span.start]);
                        result.push(Segment::Marker(descriptors.len()));
                        descriptors.push(build_descriptor(raw, classified));
                        cursor = span.end;
                    }
                    Ok(None) => {}
                    Err(failure) => {
                        debug!("Leaving literal {:?}: {}", raw, failure);
                        push_text(&mut result, &text[cursor..span.start]);
                        result.push(Segment::Literal(raw.to_string()));
                        cursor = span.end;
                    }
                }
            }
            push_text(&mut result, &text[cursor..]);
        }
        result
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Text(text.to_string()));
    }
}

fn build_descriptor(raw: &str, classified: Classified) -> PlaceholderDescriptor {
    let mut descriptor = PlaceholderDescriptor {
        kind: classified.kind,
        raw: raw.to_string(),
        name: classified.name,
        options: classified.options,
        fragments: Vec::new(),
        depth: nesting_depth(raw),
    };
    descriptor.fragments = extract_fragments(&descriptor);
    descriptor
}

/// Tokenize `source` with the default matcher chain
pub fn parse(source: &str) -> Tokenized {
    Parser::new(source).parse()
}
