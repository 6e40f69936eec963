//! Inline Markdown-to-LaTeX conversion for section text.
//!
//! Conversion is an ordered list of pure rewrite rules folded over the text.
//! The order matters: math spans are converted first so that the later
//! emphasis and escaping rules can treat them as opaque.
//!
//! The pipeline is not idempotent. Running it over its own output may
//! rewrite text again, so each section body is converted exactly once.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// A pure rewrite from one text to another.
pub type Rule = fn(&str) -> String;

/// `$$...$$`, possibly spanning lines.
static DISPLAY_MATH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$(.+?)\$\$").unwrap());

/// Already-converted math spans: `\(...\)` or `\[...\]`.
static MATH_SPAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\(.*?\\\)|\\\[.*?\\\]").unwrap());

/// `**...**` on a single line.
static BOLD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

/// Characters or patterns that make bold text look like a formula.
static MATH_HINT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\^_{}]|\[.\]").unwrap());

/// Placeholder for a masked math span.
static MASK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E000}(\d+)\x{E001}").unwrap());

const MASK_OPEN: char = '\u{E000}';
const MASK_CLOSE: char = '\u{E001}';

/// A conversion rule with a name for logging.
#[derive(Debug, Clone, Copy)]
pub struct NamedRule {
    pub name: &'static str,
    pub apply: Rule,
}

/// The conversion rules in the order they must run.
pub const DEFAULT_RULES: [NamedRule; 5] = [
    NamedRule {
        name: "display-math",
        apply: convert_display_math,
    },
    NamedRule {
        name: "inline-math",
        apply: convert_inline_math,
    },
    NamedRule {
        name: "bold",
        apply: convert_bold,
    },
    NamedRule {
        name: "italic",
        apply: convert_italic,
    },
    NamedRule {
        name: "escape",
        apply: escape_reserved,
    },
];

/// Applies the inline conversion rules to section text.
#[derive(Debug, Clone)]
pub struct InlineTransformer {
    rules: Vec<NamedRule>,
}

impl Default for InlineTransformer {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
        }
    }
}

impl InlineTransformer {
    /// Create a transformer with the standard rule order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the rules in application order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Convert one section's raw text.
    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| (rule.apply)(&acc))
    }

    /// Convert each item of a list independently.
    pub fn apply_all(&self, items: &[String]) -> Vec<String> {
        items.iter().map(|item| self.apply(item)).collect()
    }
}

/// Convert text with the standard rule order.
pub fn convert(text: &str) -> String {
    InlineTransformer::new().apply(text)
}

/// `$$...$$` to `\[...\]`.
pub fn convert_display_math(text: &str) -> String {
    DISPLAY_MATH_REGEX.replace_all(text, r"\[${1}\]").into_owned()
}

/// `$...$` to `\(...\)`.
///
/// A `$` adjacent to another `$` never opens a span. The span must close on
/// the same line and hold at least one character.
pub fn convert_inline_math(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut output = String::with_capacity(text.len() + 8);
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let opens = bytes[i] == b'$'
            && (i == 0 || bytes[i - 1] != b'$')
            && bytes.get(i + 1) != Some(&b'$');

        if opens {
            if let Some(close) = find_span_close(bytes, i + 1, b'$', |_| true) {
                output.push_str(&text[copied..i]);
                output.push_str(r"\(");
                output.push_str(&text[i + 1..close]);
                output.push_str(r"\)");
                i = close + 1;
                copied = i;
                continue;
            }
        }
        i += 1;
    }

    output.push_str(&text[copied..]);
    output
}

/// `**...**` to `\textbf{...}`, or to `\(\mathbf{...}\)` when the content
/// looks like a formula (`^`, `_`, braces, or `[x]`).
pub fn convert_bold(text: &str) -> String {
    with_math_masked(text, |masked| {
        BOLD_REGEX
            .replace_all(masked, |caps: &Captures| {
                let content = &caps[1];
                if MATH_HINT_REGEX.is_match(content) {
                    format!(r"\(\mathbf{{{}}}\)", content)
                } else {
                    format!(r"\textbf{{{}}}", content)
                }
            })
            .into_owned()
    })
}

/// `*...*` to `\textit{...}`, skipping `**` markers.
pub fn convert_italic(text: &str) -> String {
    with_math_masked(text, italicize)
}

fn italicize(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut output = String::with_capacity(text.len() + 8);
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let opens = bytes[i] == b'*'
            && (i == 0 || bytes[i - 1] != b'*')
            && bytes.get(i + 1).is_some_and(|&b| b != b'*');

        if opens {
            let closes = |j: usize| bytes.get(j + 1) != Some(&b'*');
            if let Some(close) = find_span_close(bytes, i + 1, b'*', closes) {
                output.push_str(&text[copied..i]);
                output.push_str(r"\textit{");
                output.push_str(&text[i + 1..close]);
                output.push('}');
                i = close + 1;
                copied = i;
                continue;
            }
        }
        i += 1;
    }

    output.push_str(&text[copied..]);
    output
}

/// Find the closing marker of a single-line span whose content starts at
/// `start` and holds at least one byte.
fn find_span_close(
    bytes: &[u8],
    start: usize,
    marker: u8,
    accept: impl Fn(usize) -> bool,
) -> Option<usize> {
    let mut j = start;
    while j < bytes.len() && bytes[j] != b'\n' {
        if j > start && bytes[j] == marker && accept(j) {
            return Some(j);
        }
        j += 1;
    }
    None
}

/// Escape reserved characters outside math spans.
pub fn escape_reserved(text: &str) -> String {
    let mut output = String::with_capacity(text.len() + text.len() / 10);
    let mut last = 0;

    for span in MATH_SPAN_REGEX.find_iter(text) {
        output.push_str(&escape_segment(&text[last..span.start()]));
        output.push_str(span.as_str());
        last = span.end();
    }
    output.push_str(&escape_segment(&text[last..]));

    output
}

/// Escape `&`, `%`, `#`, `_` and `^` in plain text.
///
/// A character already preceded by a backslash is left alone, as is a caret
/// followed by `{` or `[`.
pub fn escape_segment(text: &str) -> String {
    let mut output = String::with_capacity(text.len() + text.len() / 10);
    let mut prev: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let unescaped = prev != Some('\\');
        match c {
            '&' | '%' | '#' | '_' if unescaped => {
                output.push('\\');
                output.push(c);
            }
            '^' if unescaped && !matches!(chars.peek(), Some('{') | Some('[')) => {
                output.push_str(r"\^{}");
            }
            _ => output.push(c),
        }
        prev = Some(c);
    }

    output
}

/// Run `rewrite` with every converted math span replaced by a placeholder,
/// then put the spans back.
fn with_math_masked(text: &str, rewrite: impl FnOnce(&str) -> String) -> String {
    let mut spans: Vec<String> = Vec::new();
    let masked = MATH_SPAN_REGEX.replace_all(text, |caps: &Captures| {
        spans.push(caps[0].to_string());
        format!("{}{}{}", MASK_OPEN, spans.len() - 1, MASK_CLOSE)
    });

    if spans.is_empty() {
        return rewrite(text);
    }

    let rewritten = rewrite(masked.as_ref());
    MASK_REGEX
        .replace_all(&rewritten, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|idx| spans.get(idx).cloned())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Collect `-` bullet lines as item texts, dropping all other lines.
pub fn extract_bullets(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-'))
        .map(|line| line.trim_matches(|c| c == '-' || c == ' ').trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rule_order() {
        let transformer = InlineTransformer::new();
        assert_eq!(
            transformer.rule_names(),
            vec!["display-math", "inline-math", "bold", "italic", "escape"]
        );
    }

    #[test]
    fn test_display_math() {
        let out = convert("Sum: $$z = w_1 x_1 + b$$ done");
        assert_eq!(out, r"Sum: \[z = w_1 x_1 + b\] done");
        assert!(!out.contains("$$"));
    }

    #[test]
    fn test_display_math_spans_lines() {
        let out = convert("$$\n\\sigma(z) = \\frac{1}{1+e^{-z}}\n$$");
        assert_eq!(out, "\\[\n\\sigma(z) = \\frac{1}{1+e^{-z}}\n\\]");
    }

    #[test]
    fn test_inline_math() {
        assert_eq!(convert("Weight $w_1$ scales"), r"Weight \(w_1\) scales");
    }

    #[test]
    fn test_inline_math_two_spans() {
        assert_eq!(
            convert_inline_math("$a$ and $b$"),
            r"\(a\) and \(b\)"
        );
    }

    #[test]
    fn test_unmatched_dollar_left_alone() {
        assert_eq!(convert("costs $5 today"), "costs $5 today");
    }

    #[test]
    fn test_inline_math_does_not_cross_lines() {
        assert_eq!(convert_inline_math("$a\nb$"), "$a\nb$");
    }

    #[test]
    fn test_bold_text() {
        assert_eq!(convert("**Neuron** fires"), r"\textbf{Neuron} fires");
    }

    #[test]
    fn test_bold_formula_becomes_math() {
        assert_eq!(convert("**x^2**"), r"\(\mathbf{x^2}\)");
        assert_eq!(convert("**w_1**"), r"\(\mathbf{w_1}\)");
        assert_eq!(convert("**w[1]**"), r"\(\mathbf{w[1]}\)");
    }

    #[test]
    fn test_bold_heuristic_misfires_on_identifiers() {
        assert_eq!(convert("**file_name**"), r"\(\mathbf{file_name}\)");
    }

    #[test]
    fn test_bold_around_inline_math() {
        assert_eq!(convert("**value $x$**"), r"\textbf{value \(x\)}");
    }

    #[test]
    fn test_italic() {
        assert_eq!(convert("*weights* matter"), r"\textit{weights} matter");
    }

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(
            convert("**bold** and *soft*"),
            r"\textbf{bold} and \textit{soft}"
        );
    }

    #[test]
    fn test_italic_skips_math() {
        assert_eq!(convert("$a*b*c$"), r"\(a*b*c\)");
    }

    #[test]
    fn test_italic_requires_content() {
        assert_eq!(convert_italic("a ** b"), "a ** b");
        assert_eq!(convert_italic("2 * 3"), "2 * 3");
    }

    #[test]
    fn test_escape_reserved() {
        assert_eq!(
            escape_segment("R&D 50% #1 a_b x^y"),
            r"R\&D 50\% \#1 a\_b x\^{}y"
        );
    }

    #[test]
    fn test_escape_keeps_caret_before_brace() {
        assert_eq!(escape_segment("e^{x} and w^[2]"), "e^{x} and w^[2]");
    }

    #[test]
    fn test_escape_skips_escaped() {
        assert_eq!(escape_segment(r"already \& done"), r"already \& done");
    }

    #[test]
    fn test_math_is_opaque_to_escaping() {
        assert_eq!(convert("$a_1 & b$ & c"), r"\(a_1 & b\) \& c");
    }

    #[test]
    fn test_full_pipeline() {
        assert_eq!(
            convert("**Total** $x_i^2$ costs 5% of *net_value*"),
            r"\textbf{Total} \(x_i^2\) costs 5\% of \textit{net\_value}"
        );
    }

    #[test]
    fn test_apply_all() {
        let transformer = InlineTransformer::new();
        let items = vec!["a_b".to_string(), "**c**".to_string()];
        assert_eq!(
            transformer.apply_all(&items),
            vec![r"a\_b".to_string(), r"\textbf{c}".to_string()]
        );
    }

    #[test]
    fn test_extract_bullets() {
        let text = "Intro line\n- First point\n  - Second point\nnot a bullet\n-\n";
        assert_eq!(extract_bullets(text), vec!["First point", "Second point"]);
    }

    #[test]
    fn test_extract_bullets_none() {
        assert!(extract_bullets("Plain summary text.").is_empty());
    }

    proptest! {
        #[test]
        fn test_escape_never_loses_reserved(text in "[a-z &%#_^]{0,40}") {
            let raw = text
                .chars()
                .filter(|c| matches!(c, '&' | '%' | '#' | '_' | '^'))
                .count();
            let out = escape_reserved(&text);
            let escaped = ["\\&", "\\%", "\\#", "\\_", "\\^"]
                .iter()
                .map(|pat| out.matches(pat).count())
                .sum::<usize>();
            prop_assert!(escaped >= raw);
        }

        #[test]
        fn test_display_math_always_converted(
            before in "[a-z ]{0,20}",
            body in "[a-z0-9+=^ ]{1,20}",
            after in "[a-z ]{0,20}",
        ) {
            let out = convert(&format!("{}$${}$${}", before, body, after));
            prop_assert!(!out.contains("$$"));
            let expected = format!("\\[{}\\]", body);
            prop_assert!(out.contains(&expected));
        }

        #[test]
        fn test_formula_like_bold_is_math(content in "[a-z]{1,6}[_^][a-z0-9]{1,6}") {
            let out = convert(&format!("**{}**", content));
            prop_assert_eq!(out, format!("\\(\\mathbf{{{}}}\\)", content));
        }
    }
}
