//! Fixed-template assembly of topic sections into deck blocks.
//!
//! Block order is fixed: title, objective, concept (possibly split),
//! figure, formula, explanation, practice problems, summary. Optional blocks
//! are omitted when their section is missing, never rendered empty.

use crate::transform::{extract_bullets, InlineTransformer};
use crate::types::{
    AssembledDocument, Block, BlockBody, BlockKind, ExtractedDocument, Problem, Sections,
};

pub const OBJECTIVE_SECTION: &str = "Learning Goal";
pub const CONCEPT_SECTION: &str = "Key Concept";
pub const FORMULA_SECTIONS: [&str; 2] = ["Key Formula", "Key Formulas"];
pub const EXPLANATION_SECTION: &str = "Intuitive Explanation";
pub const PROBLEM_SECTION: &str = "Practice Problems";
pub const SUMMARY_SECTION: &str = "Key Takeaways";

/// Line prefix that starts a new practice problem.
const PROBLEM_MARKER: &str = "### Problem";

/// Markers of the collapsible solution region.
const DETAILS_OPEN: &str = "<details>";
const DETAILS_CLOSE: &str = "</details>";
const SUMMARY_OPEN: &str = "<summary>";
const SUMMARY_CLOSE: &str = "</summary>";

const PARAGRAPH_BREAK: &str = "\n\n";

/// Assembles extracted sections into an ordered block sequence.
#[derive(Debug, Clone)]
pub struct Assembler {
    /// Character budget per concept chunk.
    chunk_budget: usize,

    /// Number of practice problems rendered; later ones are dropped.
    max_problems: usize,

    /// Solutions longer than this many characters are truncated.
    solution_limit: usize,

    transformer: InlineTransformer,
}

impl Default for Assembler {
    fn default() -> Self {
        Self {
            chunk_budget: 500,
            max_problems: 2,
            solution_limit: 800,
            transformer: InlineTransformer::new(),
        }
    }
}

impl Assembler {
    /// Create an assembler with the default limits (500 / 2 / 800).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the character budget for concept chunks.
    pub fn with_chunk_budget(mut self, budget: usize) -> Self {
        self.chunk_budget = budget.max(1);
        self
    }

    /// Set how many practice problems are rendered.
    pub fn with_max_problems(mut self, max: usize) -> Self {
        self.max_problems = max;
        self
    }

    /// Set the solution length above which truncation applies.
    pub fn with_solution_limit(mut self, limit: usize) -> Self {
        self.solution_limit = limit.max(1);
        self
    }

    /// Assemble an extracted document, taking the title from its
    /// `title` front-matter key or falling back to `fallback_title`.
    pub fn assemble_extracted(
        &self,
        document: &ExtractedDocument,
        fallback_title: &str,
        subtitle: &str,
        resource: Option<&str>,
    ) -> AssembledDocument {
        let title = document
            .front_matter
            .get("title")
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(fallback_title);

        self.assemble(title, subtitle, &document.sections, resource)
    }

    /// Assemble blocks in template order.
    pub fn assemble(
        &self,
        title: &str,
        subtitle: &str,
        sections: &Sections,
        resource: Option<&str>,
    ) -> AssembledDocument {
        let title = self.transformer.apply(title);
        let subtitle = self.transformer.apply(subtitle);

        let mut blocks = vec![Block::new(
            BlockKind::Title,
            "",
            BlockBody::TitlePage {
                title: title.clone(),
                subtitle: subtitle.clone(),
            },
        )];

        if let Some(text) = sections.get(OBJECTIVE_SECTION) {
            blocks.push(self.text_block(BlockKind::Objective, text));
        }

        if let Some(text) = sections.get(CONCEPT_SECTION) {
            blocks.extend(self.concept_blocks(text));
        }

        match resource {
            Some(path) => blocks.push(Block::new(
                BlockKind::Figure,
                BlockKind::Figure.frame_title(),
                BlockBody::Figure {
                    path: path.to_string(),
                },
            )),
            None => log::debug!("No resource supplied, omitting figure"),
        }

        if let Some(text) = sections.get_any(&FORMULA_SECTIONS) {
            blocks.push(self.text_block(BlockKind::Formula, text));
        }

        if let Some(text) = sections.get(EXPLANATION_SECTION) {
            blocks.push(self.text_block(BlockKind::Explanation, text));
        }

        if let Some(text) = sections.get(PROBLEM_SECTION) {
            blocks.extend(self.problem_blocks(text));
        }

        if let Some(text) = sections.get(SUMMARY_SECTION) {
            blocks.push(self.summary_block(text));
        }

        AssembledDocument {
            title,
            subtitle,
            blocks,
        }
    }

    fn text_block(&self, kind: BlockKind, text: &str) -> Block {
        Block::new(
            kind,
            kind.frame_title(),
            BlockBody::Text {
                text: self.transformer.apply(text),
            },
        )
    }

    fn concept_blocks(&self, text: &str) -> Vec<Block> {
        let chunks = split_paragraph_chunks(text, self.chunk_budget);
        let total = chunks.len();
        let base = BlockKind::Concept.frame_title();

        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let title = if total > 1 {
                    format!("{} ({}/{})", base, i + 1, total)
                } else {
                    base.to_string()
                };
                Block::new(
                    BlockKind::Concept,
                    title,
                    BlockBody::Text {
                        text: self.transformer.apply(chunk),
                    },
                )
            })
            .collect()
    }

    fn problem_blocks(&self, text: &str) -> Vec<Block> {
        let problems = parse_problems(text);
        if problems.len() > self.max_problems {
            log::debug!(
                "Keeping {} of {} practice problems",
                self.max_problems,
                problems.len()
            );
        }

        problems
            .into_iter()
            .take(self.max_problems)
            .enumerate()
            .map(|(i, problem)| {
                let number = i + 1;
                let heading = problem
                    .heading
                    .unwrap_or_else(|| format!("Problem {}", number));
                let solution = if problem.solution.trim().is_empty() {
                    None
                } else {
                    let kept = truncate_solution(&problem.solution, self.solution_limit);
                    Some(self.transformer.apply(&kept))
                };

                Block::new(
                    BlockKind::ProblemSet,
                    format!("{} {}", BlockKind::ProblemSet.frame_title(), number),
                    BlockBody::Problem {
                        heading: self.transformer.apply(&heading),
                        question: self.transformer.apply(&problem.question),
                        solution,
                    },
                )
            })
            .collect()
    }

    fn summary_block(&self, text: &str) -> Block {
        let items = extract_bullets(text);
        let body = if items.is_empty() {
            BlockBody::Text {
                text: self.transformer.apply(text),
            }
        } else {
            BlockBody::Items {
                items: self.transformer.apply_all(&items),
            }
        };

        Block::new(BlockKind::Summary, BlockKind::Summary.frame_title(), body)
    }
}

/// Greedily pack blank-line-separated paragraphs into chunks.
///
/// A paragraph is never split. A paragraph is added to the open chunk while
/// the characters charged to that chunk stay within `budget`. The paragraph
/// that overflows opens the next chunk and the running charge restarts at
/// zero, so it is not counted against the new chunk's budget.
pub fn split_paragraph_chunks(text: &str, budget: usize) -> Vec<String> {
    let paragraphs = text
        .split(PARAGRAPH_BREAK)
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut charged = 0;

    for paragraph in paragraphs {
        let length = paragraph.chars().count();
        if !current.is_empty() && charged + length > budget {
            chunks.push(current.join(PARAGRAPH_BREAK));
            current = vec![paragraph];
            charged = 0;
        } else {
            current.push(paragraph);
            charged += length;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join(PARAGRAPH_BREAK));
    }

    if chunks.is_empty() {
        chunks.push(text.to_string());
    }

    chunks
}

/// Split a practice-problems section into problems.
///
/// Each `### Problem` line starts a problem. Lines between `<details>` and
/// `</details>` go to the solution; the marker lines themselves (including
/// `<summary>` lines) are dropped. Text before the first marker is kept as
/// an untitled problem only when it is not blank.
pub fn parse_problems(text: &str) -> Vec<Problem> {
    let mut problems = Vec::new();
    let mut heading: Option<String> = None;
    let mut question: Vec<&str> = Vec::new();
    let mut solution: Vec<&str> = Vec::new();
    let mut in_solution = false;

    let mut flush = |heading: Option<String>, question: &[&str], solution: &[&str]| {
        let question = question.join("\n").trim().to_string();
        let solution = solution.join("\n").trim().to_string();
        if heading.is_some() || !question.is_empty() || !solution.is_empty() {
            problems.push(Problem {
                heading,
                question,
                solution,
            });
        }
    };

    for line in text.lines() {
        if line.starts_with(PROBLEM_MARKER) {
            flush(heading.take(), &question, &solution);
            heading = Some(line.trim_start_matches('#').trim().to_string());
            question.clear();
            solution.clear();
            in_solution = false;
        } else if is_collapsible_marker(line) {
            if line.contains(DETAILS_OPEN) {
                in_solution = true;
            }
            if line.contains(DETAILS_CLOSE) {
                in_solution = false;
            }
        } else if in_solution {
            solution.push(line);
        } else {
            question.push(line);
        }
    }
    flush(heading, &question, &solution);

    problems
}

fn is_collapsible_marker(line: &str) -> bool {
    [DETAILS_OPEN, DETAILS_CLOSE, SUMMARY_OPEN, SUMMARY_CLOSE]
        .iter()
        .any(|marker| line.contains(marker))
}

/// Bound a solution's length.
///
/// Solutions within `limit` characters are kept whole. Longer ones keep
/// their first two paragraphs, or the first `limit` characters when there
/// is only one paragraph.
pub fn truncate_solution(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let paragraphs: Vec<&str> = text.split(PARAGRAPH_BREAK).collect();
    if paragraphs.len() > 1 {
        log::debug!("Truncating solution to its first two paragraphs");
        paragraphs[..2].join(PARAGRAPH_BREAK)
    } else {
        log::debug!("Truncating solution to {} characters", limit);
        text.chars().take(limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    fn paragraph(c: char, len: usize) -> String {
        std::iter::repeat(c).take(len).collect()
    }

    #[test]
    fn test_chunking_three_paragraphs() {
        let text = [paragraph('a', 300), paragraph('b', 300), paragraph('c', 300)].join("\n\n");
        let chunks = split_paragraph_chunks(&text, 500);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], paragraph('a', 300));
        assert_eq!(
            chunks[1],
            format!("{}\n\n{}", paragraph('b', 300), paragraph('c', 300))
        );
    }

    #[test]
    fn test_chunking_fits_in_one() {
        let chunks = split_paragraph_chunks("One.\n\nTwo.\n\nThree.", 500);
        assert_eq!(chunks, vec!["One.\n\nTwo.\n\nThree."]);
    }

    #[test]
    fn test_chunking_oversized_paragraph_kept_whole() {
        let long = paragraph('x', 700);
        let chunks = split_paragraph_chunks(&long, 500);
        assert_eq!(chunks, vec![long]);
    }

    #[test]
    fn test_chunking_blank_text() {
        assert_eq!(split_paragraph_chunks("", 500), vec![""]);
    }

    #[test]
    fn test_parse_problems() {
        let text = "### Problem 1: Weighted Sum\nCompute $z$.\n<details>\n<summary>Solution</summary>\nz = 3\n</details>\n\n### Problem 2\nExplain.";
        let problems = parse_problems(text);

        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].heading.as_deref(), Some("Problem 1: Weighted Sum"));
        assert_eq!(problems[0].question, "Compute $z$.");
        assert_eq!(problems[0].solution, "z = 3");
        assert_eq!(problems[1].heading.as_deref(), Some("Problem 2"));
        assert_eq!(problems[1].question, "Explain.");
        assert!(problems[1].solution.is_empty());
    }

    #[test]
    fn test_parse_problems_text_after_details_is_question() {
        let text = "### Problem 1\nQ\n<details>\nS\n</details>\nFollow-up";
        let problems = parse_problems(text);
        assert_eq!(problems[0].question, "Q\nFollow-up");
        assert_eq!(problems[0].solution, "S");
    }

    #[test]
    fn test_parse_problems_preamble() {
        let problems = parse_problems("Try these.\n### Problem 1\nQ");
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].heading, None);
        assert_eq!(problems[0].question, "Try these.");

        let problems = parse_problems("\n### Problem 1\nQ");
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_truncate_short_solution_untouched() {
        assert_eq!(truncate_solution("short", 800), "short");
    }

    #[test]
    fn test_truncate_keeps_two_paragraphs() {
        let first = paragraph('a', 400);
        let second = paragraph('b', 448);
        let third = paragraph('c', 48);
        let text = format!("{}\n\n{}\n\n{}", first, second, third);
        assert_eq!(text.chars().count(), 900);

        let kept = truncate_solution(&text, 800);
        assert_eq!(kept, format!("{}\n\n{}", first, second));
        assert_eq!(kept.chars().count(), 850);
    }

    #[test]
    fn test_truncate_single_paragraph() {
        let text = paragraph('z', 900);
        assert_eq!(truncate_solution(&text, 800).chars().count(), 800);
    }

    #[test]
    fn test_end_to_end_minimal_document() {
        let doc = extract("---\ntitle: \"01. Sample\"\n---\n## Learning Goal\nKnow the basics.\n");
        let assembled = Assembler::new().assemble_extracted(
            &doc,
            "Topic 01",
            "Neural Networks - From Brain to Business",
            Some("01_sample/sample.pdf"),
        );

        assert_eq!(
            assembled.kinds(),
            vec![BlockKind::Title, BlockKind::Objective, BlockKind::Figure]
        );
        assert_eq!(assembled.title, "01. Sample");
        assert_eq!(
            assembled.blocks[2].body,
            BlockBody::Figure {
                path: "01_sample/sample.pdf".to_string()
            }
        );
    }

    #[test]
    fn test_fallback_title() {
        let doc = extract("## Learning Goal\nGoal");
        let assembled = Assembler::new().assemble_extracted(&doc, "Topic 07", "", None);
        assert_eq!(assembled.title, "Topic 07");
        assert_eq!(assembled.kinds(), vec![BlockKind::Title, BlockKind::Objective]);
    }

    #[test]
    fn test_problem_cap() {
        let mut sections = Sections::new();
        sections.insert(
            PROBLEM_SECTION,
            "### Problem 1\nA\n### Problem 2\nB\n### Problem 3\nC",
        );
        let assembled = Assembler::new().assemble("T", "S", &sections, None);

        assert_eq!(assembled.count(BlockKind::ProblemSet), 2);
        assert_eq!(assembled.blocks[1].title, "Practice Problem 1");
        assert_eq!(assembled.blocks[2].title, "Practice Problem 2");
    }

    #[test]
    fn test_full_template_order() {
        let mut sections = Sections::new();
        sections.insert(SUMMARY_SECTION, "- One\n- Two");
        sections.insert(PROBLEM_SECTION, "### Problem 1\nQ");
        sections.insert(EXPLANATION_SECTION, "Think of it as voting.");
        sections.insert("Key Formulas", "$$z = wx + b$$");
        sections.insert(CONCEPT_SECTION, "Concept.");
        sections.insert(OBJECTIVE_SECTION, "Goal.");

        let assembled = Assembler::new().assemble("T", "S", &sections, Some("a/b.pdf"));
        assert_eq!(
            assembled.kinds(),
            vec![
                BlockKind::Title,
                BlockKind::Objective,
                BlockKind::Concept,
                BlockKind::Figure,
                BlockKind::Formula,
                BlockKind::Explanation,
                BlockKind::ProblemSet,
                BlockKind::Summary,
            ]
        );
    }

    #[test]
    fn test_concept_split_titles() {
        let mut sections = Sections::new();
        let text = [paragraph('a', 300), paragraph('b', 300), paragraph('c', 300)].join("\n\n");
        sections.insert(CONCEPT_SECTION, text);

        let assembled = Assembler::new().assemble("T", "S", &sections, None);
        let titles: Vec<&str> = assembled.blocks[1..].iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Key Concept (1/2)", "Key Concept (2/2)"]);
    }

    #[test]
    fn test_concept_single_chunk_has_plain_title() {
        let mut sections = Sections::new();
        sections.insert(CONCEPT_SECTION, "Short.");
        let assembled = Assembler::new().assemble("T", "S", &sections, None);
        assert_eq!(assembled.blocks[1].title, "Key Concept");
    }

    #[test]
    fn test_summary_bullets_become_items() {
        let mut sections = Sections::new();
        sections.insert(SUMMARY_SECTION, "- Weights scale inputs\n- Bias shifts 50%");
        let assembled = Assembler::new().assemble("T", "S", &sections, None);

        assert_eq!(
            assembled.blocks[1].body,
            BlockBody::Items {
                items: vec!["Weights scale inputs".to_string(), r"Bias shifts 50\%".to_string()]
            }
        );
    }

    #[test]
    fn test_summary_plain_text() {
        let mut sections = Sections::new();
        sections.insert(SUMMARY_SECTION, "Everything is **connected**.");
        let assembled = Assembler::new().assemble("T", "S", &sections, None);

        assert_eq!(
            assembled.blocks[1].body,
            BlockBody::Text {
                text: r"Everything is \textbf{connected}.".to_string()
            }
        );
    }

    #[test]
    fn test_problem_without_solution() {
        let mut sections = Sections::new();
        sections.insert(PROBLEM_SECTION, "### Problem 1\nWhat is $w_1$?");
        let assembled = Assembler::new().assemble("T", "S", &sections, None);

        assert_eq!(
            assembled.blocks[1].body,
            BlockBody::Problem {
                heading: "Problem 1".to_string(),
                question: r"What is \(w_1\)?".to_string(),
                solution: None,
            }
        );
    }

    #[test]
    fn test_custom_limits() {
        let mut sections = Sections::new();
        sections.insert(
            PROBLEM_SECTION,
            "### Problem 1\nA\n### Problem 2\nB\n### Problem 3\nC",
        );
        let assembled = Assembler::new()
            .with_max_problems(3)
            .assemble("T", "S", &sections, None);
        assert_eq!(assembled.count(BlockKind::ProblemSet), 3);
    }
}
