//! Inner fragment extraction.
//!
//! Plural, Gender and Choose constructs embed natural-language text that
//! needs its own translation. Fragments are correlated with their
//! translations purely by position, so the order produced here is the order
//! the reconstructor splices back in.
//!
//! # Rules
//!
//! For every variant of the construct body (split on top-level `|`):
//!
//! 1. Nested `{...}` bodies are fragments unless they are a variable
//!    reference (contain `.` or `:`) or blank. `{}` stays as formatting.
//! 2. A nested Plural/Gender/Choose is descended into and contributes its
//!    own fragments in place.
//! 3. If the variant produced no fragment through rule 1, its free-text
//!    runs outside nested braces are fragments when they contain letters.

use std::ops::Range;

use crate::descriptor::{Fragment, PlaceholderDescriptor};
use crate::syntax::{is_translatable, parse_header, scan_braces, split_top_level, trim_range};

const FRAGMENT_FORMATTERS: [&str; 3] = ["plural", "gender", "choose"];

/// Extract the translatable fragments of a descriptor in positional order.
///
/// Returns an empty list for kinds that carry no fragments.
pub fn extract_fragments(descriptor: &PlaceholderDescriptor) -> Vec<Fragment> {
    if !descriptor.kind.has_fragments() {
        return Vec::new();
    }
    extract_from_raw(&descriptor.raw)
}

/// Extract fragments straight from a construct's raw text.
pub fn extract_from_raw(raw: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    collect_construct(raw, 0..raw.len(), &mut fragments);
    fragments.sort_by_key(|f| f.span.start);
    fragments
}

/// Body text of a nested `{...}` that only refers to a variable
fn is_variable_reference(body: &str) -> bool {
    body.contains('.') || body.contains(':')
}

fn is_fragment_construct(raw: &str) -> bool {
    matches!(
        parse_header(raw),
        Ok(Some(header)) if header.body.is_some()
            && FRAGMENT_FORMATTERS.contains(&header.formatter.as_str())
    )
}

fn fragment_at(source: &str, range: Range<usize>) -> Fragment {
    let span = trim_range(source, range);
    Fragment {
        text: source[span.clone()].to_string(),
        span,
    }
}

fn collect_construct(source: &str, span: Range<usize>, out: &mut Vec<Fragment>) {
    let Ok(Some(header)) = parse_header(&source[span.clone()]) else {
        return;
    };
    let Some(body) = header.body else {
        return;
    };
    let body = span.start + body.start..span.start + body.end;
    for variant in split_top_level(source, body, b'|') {
        collect_variant(source, variant, out);
    }
}

fn collect_variant(source: &str, variant: Range<usize>, out: &mut Vec<Fragment>) {
    let nested = scan_braces(source, variant.clone()).spans;
    let mut bodies = Vec::new();

    for span in &nested {
        if is_fragment_construct(&source[span.clone()]) {
            collect_construct(source, span.clone(), out);
            continue;
        }
        let inner = span.start + 1..span.end - 1;
        let body = &source[inner.clone()];
        if body.trim().is_empty() || is_variable_reference(body) {
            continue;
        }
        bodies.push(fragment_at(source, inner));
    }

    if !bodies.is_empty() {
        out.extend(bodies);
        return;
    }

    let mut cursor = variant.start;
    let boundaries = nested
        .iter()
        .cloned()
        .chain(std::iter::once(variant.end..variant.end));
    for span in boundaries {
        let run = cursor..span.start;
        if is_translatable(&source[run.clone()]) {
            out.push(fragment_at(source, run));
        }
        cursor = span.end;
    }
}

/// Make a translated fragment safe to splice into construct syntax.
///
/// Providers sometimes invent braces or pipes; those would change the
/// structure of the rebuilt construct, so they are dropped unless the
/// source fragment itself contained them. Surrounding whitespace is trimmed.
pub fn sanitize_fragment(source: &str, translated: &str) -> String {
    let cleaned: String = translated
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '|') || source.contains(*c))
        .collect();
    cleaned.trim().to_string()
}

/// Replace the byte ranges in `text` with new contents.
///
/// Ranges must not overlap; they may be given in any order.
pub fn splice(text: &str, mut replacements: Vec<(Range<usize>, String)>) -> String {
    replacements.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    let mut result = text.to_string();
    for (range, replacement) in replacements {
        result.replace_range(range, &replacement);
    }
    result
}
