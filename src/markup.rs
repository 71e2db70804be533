//! Markup preparation: fragment wrapping and a best-effort structural lint.
//!
//! The lint is a heuristic built on tag and brace counting. It produces false
//! positives and negatives and is only enforced when the service runs with
//! `--strict-markup`.

use regex::Regex;
use std::sync::OnceLock;

/// Imbalance between opening and closing tags tolerated by the lint
pub const TAG_IMBALANCE_TOLERANCE: usize = 5;

static OPEN_TAG: OnceLock<Option<Regex>> = OnceLock::new();
static CLOSE_TAG: OnceLock<Option<Regex>> = OnceLock::new();
static STYLE_BLOCK: OnceLock<Option<Regex>> = OnceLock::new();
static STYLE_TAG: OnceLock<Option<Regex>> = OnceLock::new();

fn pattern(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(source).ok()).as_ref()
}

/// Whether the markup carries its own root document declaration
pub fn is_full_document(markup: &str) -> bool {
    let lower = markup.to_ascii_lowercase();
    lower.contains("<!doctype") || lower.contains("<html")
}

/// Wrap a bare fragment in a minimal document skeleton.
///
/// Markup that already declares a doctype or an `<html>` root is returned
/// unchanged.
pub fn wrap_fragment(markup: &str) -> String {
    if is_full_document(markup) {
        return markup.to_string();
    }
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n<body>\n{}\n</body>\n</html>",
        markup
    )
}

/// Run the structural lint and return every finding, in a stable order.
pub fn lint(code: &str) -> Vec<String> {
    let mut findings = Vec::new();
    let lower = code.to_ascii_lowercase();

    if !lower.contains("<!doctype") {
        findings.push("Missing DOCTYPE declaration".to_string());
    }
    for (needle, finding) in [
        ("<html", "Missing <html> tag"),
        ("</html>", "Missing closing </html> tag"),
        ("<head", "Missing <head> section"),
        ("<body", "Missing <body> section"),
    ] {
        if !lower.contains(needle) {
            findings.push(finding.to_string());
        }
    }

    if let (Some(open), Some(close)) = (
        pattern(&OPEN_TAG, r"<[^/!][^>]*>"),
        pattern(&CLOSE_TAG, r"</[^>]*>"),
    ) {
        let opened = open.find_iter(code).count();
        let closed = close.find_iter(code).count();
        if opened.abs_diff(closed) > TAG_IMBALANCE_TOLERANCE {
            findings.push("Possible unclosed HTML tags detected".to_string());
        }
    }

    if let (Some(block), Some(tag)) = (
        pattern(&STYLE_BLOCK, r"(?is)<style[^>]*>.*?</style>"),
        pattern(&STYLE_TAG, r"(?i)</?style[^>]*>"),
    ) {
        for (index, found) in block.find_iter(code).enumerate() {
            let css = tag.replace_all(found.as_str(), "");
            let opening = css.matches('{').count();
            let closing = css.matches('}').count();
            if opening != closing {
                findings.push(format!(
                    "CSS syntax error in style block {}: Mismatched braces",
                    index + 1
                ));
            }
        }
    }

    if code.contains("<<") || code.contains(">>") {
        findings.push("Invalid HTML syntax: Double angle brackets detected".to_string());
    }

    findings
}
