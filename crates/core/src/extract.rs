//! Section extraction for topic notes.
//!
//! A topic note is an optional front-matter block followed by a body that
//! second-level headings divide into named sections. Extraction never fails:
//! malformed structure degrades to fewer (or no) sections.

use crate::types::{ExtractedDocument, FrontMatter, Sections};

/// Line that opens and closes the front-matter block.
const FRONT_MATTER_DELIMITER: &str = "---";

/// Prefix of a heading line that opens a new section.
const SECTION_PREFIX: &str = "## ";

/// Prefix of the document title heading.
const TITLE_PREFIX: &str = "# ";

/// Horizontal rule line, dropped from section bodies.
const SEPARATOR_LINE: &str = "---";

/// Extract front matter and sections from a topic note.
pub fn extract(text: &str) -> ExtractedDocument {
    let (front_matter, body) = split_front_matter(text);
    let sections = split_sections(body);

    log::debug!(
        "Extracted {} front-matter keys and {} sections",
        front_matter.len(),
        sections.len()
    );

    ExtractedDocument {
        front_matter,
        sections,
    }
}

/// Split a leading front-matter block from the body.
///
/// The block is only recognised when the very first line is the delimiter
/// and a closing delimiter line follows. Otherwise the whole text is body.
/// Lines without a `:` separator are skipped. Surrounding quotes are
/// stripped from values.
pub fn split_front_matter(text: &str) -> (FrontMatter, &str) {
    let Some(end) = front_matter_end(text) else {
        return (FrontMatter::new(), text);
    };

    let mut front_matter = FrontMatter::new();
    for line in text[..end].lines().skip(1) {
        if line.trim_end() == FRONT_MATTER_DELIMITER {
            break;
        }
        if let Some((key, value)) = parse_front_matter_line(line) {
            front_matter.insert(key, value);
        }
    }

    (front_matter, &text[end..])
}

/// Byte offset just past the closing delimiter line of a leading
/// front-matter block, or `None` when the text has no such block.
pub fn front_matter_end(text: &str) -> Option<usize> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != FRONT_MATTER_DELIMITER {
        return None;
    }

    let mut offset = first.len();
    for line in lines {
        offset += line.len();
        if line.trim_end() == FRONT_MATTER_DELIMITER {
            return Some(offset);
        }
    }

    None
}

/// Parse a single `key: value` line.
fn parse_front_matter_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
    Some((key, value))
}

/// Split a body into sections with a single linear scan.
///
/// - `## Name` opens a section and flushes the previous one.
/// - `# Title` before any section is open is skipped.
/// - `---` separator lines are dropped.
/// - Everything else accumulates into the open section, if any.
pub fn split_sections(body: &str) -> Sections {
    let mut sections = Sections::new();
    let mut current: Option<&str> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in body.lines() {
        if let Some(name) = line.strip_prefix(SECTION_PREFIX) {
            if let Some(open) = current {
                sections.insert(open, buffer.join("\n").trim());
            }
            current = Some(name.trim());
            buffer.clear();
        } else if line.starts_with(TITLE_PREFIX) && current.is_none() {
            continue;
        } else if line.trim_end() == SEPARATOR_LINE {
            continue;
        } else {
            buffer.push(line);
        }
    }

    if let Some(open) = current {
        sections.insert(open, buffer.join("\n").trim());
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: &str = "---\nlayout: topic\ntitle: \"01. Sample\"\ntopic_num: 1\n---\n\n# Sample Topic\n\n## Learning Goal\n\nUnderstand the neuron.\n\n---\n\n## Key Concept\n\nA neuron sums inputs.\n\nThen it fires.\n";

    #[test]
    fn test_front_matter_parsed() {
        let doc = extract(SAMPLE);

        assert_eq!(doc.front_matter.get("layout"), Some("topic"));
        assert_eq!(doc.front_matter.get("title"), Some("01. Sample"));
        assert_eq!(doc.front_matter.get("topic_num"), Some("1"));
    }

    #[test]
    fn test_sections_in_order() {
        let doc = extract(SAMPLE);

        assert_eq!(doc.sections.names(), vec!["Learning Goal", "Key Concept"]);
        assert_eq!(doc.sections.get("Learning Goal"), Some("Understand the neuron."));
        assert_eq!(
            doc.sections.get("Key Concept"),
            Some("A neuron sums inputs.\n\nThen it fires.")
        );
    }

    #[test]
    fn test_separator_dropped() {
        let doc = extract(SAMPLE);
        assert!(!doc.sections.get("Learning Goal").unwrap().contains("---"));
    }

    #[test]
    fn test_no_front_matter() {
        let (fm, body) = split_front_matter("## Learning Goal\nText");
        assert!(fm.is_empty());
        assert_eq!(body, "## Learning Goal\nText");
    }

    #[test]
    fn test_unclosed_front_matter_is_body() {
        let text = "---\ntitle: Open\n## Learning Goal\nText";
        let (fm, body) = split_front_matter(text);
        assert!(fm.is_empty());
        assert_eq!(body, text);
    }

    #[test]
    fn test_malformed_front_matter_lines_skipped() {
        let (fm, body) = split_front_matter("---\ntitle: A\nnot a pair\n: empty key\n---\nBody");
        assert_eq!(fm.len(), 1);
        assert_eq!(fm.get("title"), Some("A"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_value_with_colon_keeps_remainder() {
        let (fm, _) = split_front_matter("---\nurl: \"https://example.org\"\n---\n");
        assert_eq!(fm.get("url"), Some("https://example.org"));
    }

    #[test]
    fn test_single_quotes_stripped() {
        let (fm, _) = split_front_matter("---\npart_name: 'Foundations'\n---\n");
        assert_eq!(fm.get("part_name"), Some("Foundations"));
    }

    #[test]
    fn test_front_matter_end() {
        assert_eq!(front_matter_end("---\na: b\n---\nrest"), Some(13));
        assert_eq!(front_matter_end("---\n---\n"), Some(8));
        assert_eq!(front_matter_end("text\n---\n"), None);
    }

    #[test]
    fn test_zero_headings_yield_no_sections() {
        let doc = extract("Just some text\nwith no headings.");
        assert!(doc.sections.is_empty());
    }

    #[test]
    fn test_title_heading_ignored_before_sections() {
        let sections = split_sections("# Title\n## Learning Goal\nGoal");
        assert_eq!(sections.names(), vec!["Learning Goal"]);
        assert_eq!(sections.get("Learning Goal"), Some("Goal"));
    }

    #[test]
    fn test_title_heading_kept_inside_section() {
        let sections = split_sections("## Notes\n# Not a title\nmore");
        assert_eq!(sections.get("Notes"), Some("# Not a title\nmore"));
    }

    #[test]
    fn test_subheadings_stay_in_section() {
        let sections = split_sections("## Practice Problems\n### Problem 1\nQ");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections.get("Practice Problems"), Some("### Problem 1\nQ"));
    }

    #[test]
    fn test_duplicate_section_last_write_wins() {
        let sections = split_sections("## A\nfirst\n## B\nb\n## A\nsecond");
        assert_eq!(sections.names(), vec!["A", "B"]);
        assert_eq!(sections.get("A"), Some("second"));
    }

    #[test]
    fn test_crlf_input() {
        let doc = extract("---\r\ntitle: \"CR\"\r\n---\r\n## Learning Goal\r\nGoal\r\n");
        assert_eq!(doc.front_matter.get("title"), Some("CR"));
        assert_eq!(doc.sections.get("Learning Goal"), Some("Goal"));
    }

    proptest! {
        #[test]
        fn test_extract_is_deterministic(text in "(---\n)?([a-z#: \"-]{0,12}\n){0,12}") {
            let first = extract(&text);
            let second = extract(&text);
            prop_assert_eq!(first, second);
        }
    }
}
