//! Low-level helpers for the brace micro-language.
//!
//! Everything here works on byte offsets. The grammar's delimiters (`{`, `}`,
//! `|`, `:`, `(`, `)`, `,`) are all ASCII, so byte scanning never splits a
//! multi-byte character.

use std::ops::Range;

use crate::error::ParseFailure;

/// Header of a formatted construct such as `{count:plural:...}` or
/// `{player:gender(male,female):...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Variable name (text before the first `:`), trimmed
    pub name: String,
    /// Formatter keyword, lower-cased (`plural`, `gender`, `choose`, ...)
    pub formatter: String,
    /// Comma-separated options from `formatter(a,b,...)`, if present
    pub options: Option<Vec<String>>,
    /// Byte range of the body inside the raw span (excludes the closing `}`)
    pub body: Option<Range<usize>>,
}

/// Result of scanning a region for top-level brace spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BraceScan {
    /// Balanced `{...}` spans at depth zero, in source order
    pub spans: Vec<Range<usize>>,
    /// Offsets of braces that have no partner
    pub unmatched: Vec<usize>,
}

/// Find the `}` closing the `{` at `open`, looking no further than `limit`.
pub fn find_closing_brace(text: &str, open: usize, limit: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().take(limit).skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Collect the balanced top-level spans inside `range`.
///
/// An opening brace without a partner is skipped (and reported) so the
/// constructs after it are still found: `"{oops {name}"` yields one span
/// for `{name}`.
pub fn scan_braces(text: &str, range: Range<usize>) -> BraceScan {
    let bytes = text.as_bytes();
    let mut scan = BraceScan::default();
    let mut i = range.start;
    while i < range.end {
        match bytes[i] {
            b'{' => match find_closing_brace(text, i, range.end) {
                Some(close) => {
                    scan.spans.push(i..close + 1);
                    i = close + 1;
                }
                None => {
                    scan.unmatched.push(i);
                    i += 1;
                }
            },
            b'}' => {
                scan.unmatched.push(i);
                i += 1;
            }
            _ => i += 1,
        }
    }
    scan
}

/// Split `range` on `separator` wherever the brace depth is zero.
pub fn split_top_level(text: &str, range: Range<usize>, separator: u8) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = range.start;
    for i in range.clone() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b if b == separator && depth == 0 => {
                parts.push(start..i);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(start..range.end);
    parts
}

/// Deepest brace nesting inside `raw`; a flat `{name}` has depth 1.
pub fn nesting_depth(raw: &str) -> usize {
    let mut depth = 0usize;
    let mut max_depth = 0usize;
    for b in raw.bytes() {
        match b {
            b'{' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max_depth
}

/// Narrow `range` so it excludes leading and trailing whitespace.
pub fn trim_range(text: &str, range: Range<usize>) -> Range<usize> {
    let slice = &text[range.clone()];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading == slice.len() {
        return range.start..range.start;
    }
    range.start + leading..range.end - trailing
}

/// Whether `text` carries any human-readable content.
///
/// Runs made only of digits, punctuation, braces and whitespace are
/// formatting and never go to the translator.
pub fn is_translatable(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

/// Read the header of a formatted construct.
///
/// # Returns
///
/// * `Ok(Some(header))` - `raw` is `{name:formatter...}`
/// * `Ok(None)` - `raw` is not a formatter construct (plain variable,
///   format string like `{price:N2}`, or a generic nested scope)
/// * `Err(ParseFailure)` - a formatter keyword is present but the header
///   around it is broken
pub fn parse_header(raw: &str) -> Result<Option<Header>, ParseFailure> {
    let bytes = raw.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'{' || bytes[bytes.len() - 1] != b'}' {
        return Ok(None);
    }
    let end = raw.len() - 1;

    let mut colon = None;
    for (i, &b) in bytes.iter().enumerate().take(end).skip(1) {
        match b {
            b':' => {
                colon = Some(i);
                break;
            }
            b'{' | b'}' | b'|' => return Ok(None),
            _ => {}
        }
    }
    let Some(colon) = colon else {
        return Ok(None);
    };

    let name = raw[1..colon].trim().to_string();
    let keyword_start = colon + 1;
    let mut cursor = keyword_start;
    while cursor < end && bytes[cursor].is_ascii_alphabetic() {
        cursor += 1;
    }
    if cursor == keyword_start {
        return Ok(None);
    }
    let formatter = raw[keyword_start..cursor].to_ascii_lowercase();

    let mut options = None;
    if cursor < end && bytes[cursor] == b'(' {
        let close = raw[cursor..end]
            .find(')')
            .map(|offset| cursor + offset)
            .filter(|&close| !raw[cursor + 1..close].contains([':', '{', '}', '|']))
            .ok_or_else(|| ParseFailure::malformed(&formatter, "unclosed option list"))?;
        options = Some(
            raw[cursor + 1..close]
                .split(',')
                .map(|option| option.trim().to_string())
                .collect(),
        );
        cursor = close + 1;
    }

    let body = if cursor == end {
        None
    } else if bytes[cursor] == b':' {
        Some(cursor + 1..end)
    } else if options.is_some() {
        return Err(ParseFailure::malformed(
            &formatter,
            "expected ':' after option list",
        ));
    } else {
        // `{price:N2}` and friends: a format string, not a formatter keyword
        return Ok(None);
    };

    Ok(Some(Header {
        name,
        formatter,
        options,
        body,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Brace Scanning Tests ==========

    #[test]
    fn test_find_closing_brace_nested() {
        let text = "{a:{b}|{c}} tail";
        assert_eq!(find_closing_brace(text, 0, text.len()), Some(10));
        assert_eq!(find_closing_brace(text, 3, text.len()), Some(5));
    }

    #[test]
    fn test_find_closing_brace_unterminated() {
        let text = "{unterminated";
        assert_eq!(find_closing_brace(text, 0, text.len()), None);
    }

    #[test]
    fn test_scan_skips_unmatched_open_brace() {
        let text = "{oops {name} done";
        let scan = scan_braces(text, 0..text.len());
        assert_eq!(scan.spans, vec![6..12]);
        assert_eq!(scan.unmatched, vec![0]);
    }

    #[test]
    fn test_scan_reports_stray_close_brace() {
        let text = "a } {b}";
        let scan = scan_braces(text, 0..text.len());
        assert_eq!(scan.spans, vec![4..7]);
        assert_eq!(scan.unmatched, vec![2]);
    }

    #[test]
    fn test_split_top_level_ignores_nested_separators() {
        let text = "{a|b}|c|{d}";
        let parts = split_top_level(text, 0..text.len(), b'|');
        let parts: Vec<&str> = parts.into_iter().map(|r| &text[r]).collect();
        assert_eq!(parts, vec!["{a|b}", "c", "{d}"]);
    }

    #[test]
    fn test_nesting_depth() {
        assert_eq!(nesting_depth("{name}"), 1);
        assert_eq!(nesting_depth("{n:plural:{item}|{items}}"), 2);
        assert_eq!(nesting_depth("{g:gender:{n:plural:{a}|{b}}|x}"), 3);
    }

    #[test]
    fn test_trim_range() {
        let text = "  item  ";
        assert_eq!(trim_range(text, 0..text.len()), 2..6);
        assert_eq!(trim_range("   ", 0..3), 0..0);
    }

    #[test]
    fn test_is_translatable() {
        assert!(is_translatable(" items"));
        assert!(is_translatable("個"));
        assert!(!is_translatable("12, 3."));
        assert!(!is_translatable("  "));
    }

    // ========== Header Tests ==========

    #[test]
    fn test_header_plural() {
        let raw = "{count:plural:{} item|{} items}";
        let header = parse_header(raw).unwrap().unwrap();
        assert_eq!(header.name, "count");
        assert_eq!(header.formatter, "plural");
        assert_eq!(header.options, None);
        assert_eq!(&raw[header.body.unwrap()], "{} item|{} items");
    }

    #[test]
    fn test_header_with_options() {
        let raw = "{player:gender(male, female):He|She}";
        let header = parse_header(raw).unwrap().unwrap();
        assert_eq!(header.formatter, "gender");
        assert_eq!(
            header.options,
            Some(vec!["male".to_string(), "female".to_string()])
        );
        assert_eq!(&raw[header.body.unwrap()], "He|She");
    }

    #[test]
    fn test_header_without_body() {
        let header = parse_header("{when:date}").unwrap().unwrap();
        assert_eq!(header.formatter, "date");
        assert_eq!(header.body, None);
    }

    #[test]
    fn test_header_not_a_formatter() {
        assert_eq!(parse_header("{name}").unwrap(), None);
        assert_eq!(parse_header("{price:N2}").unwrap(), None);
        assert_eq!(parse_header("{{a}:plural:x}").unwrap(), None);
    }

    #[test]
    fn test_header_unclosed_options() {
        let result = parse_header("{p:choose(a,b:x|y}");
        assert!(matches!(
            result,
            Err(ParseFailure::MalformedHeader { ref formatter, .. }) if formatter == "choose"
        ));
    }

    #[test]
    fn test_header_missing_colon_after_options() {
        assert!(parse_header("{p:choose(a,b)x|y}").is_err());
    }
}
