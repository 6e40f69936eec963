//! Consistency checks over generated Beamer source.
//!
//! The audit reads a deck back and reports which template frames it holds.
//! Hard issues mean the deck is incomplete; warnings flag thin content.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\title\{(.*?)\}").unwrap());

static GRAPHICS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\includegraphics(\[[^\]]*\])?\{[^}]+\}").unwrap());

static TAKEAWAYS_FRAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\\begin\{frame\}\{Key Takeaways\}(.*?)\\end\{frame\}").unwrap()
});

/// Takeaway lists shorter than this draw a warning.
const MIN_TAKEAWAY_ITEMS: usize = 3;

/// A single audit observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    MissingLearningGoal,
    MissingTakeaways,
    SolutionMismatch { problems: usize, solutions: usize },
    NoPracticeProblems,
    NoVisualization,
    FewTakeaways { items: usize },
}

impl Finding {
    /// Whether this finding makes the deck fail the audit.
    pub fn is_issue(&self) -> bool {
        matches!(
            self,
            Self::MissingLearningGoal | Self::MissingTakeaways | Self::SolutionMismatch { .. }
        )
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLearningGoal => write!(f, "Missing Learning Goal"),
            Self::MissingTakeaways => write!(f, "Missing Key Takeaways"),
            Self::SolutionMismatch {
                problems,
                solutions,
            } => write!(f, "{} problems but {} solutions", problems, solutions),
            Self::NoPracticeProblems => write!(f, "No practice problems"),
            Self::NoVisualization => write!(f, "No visualization"),
            Self::FewTakeaways { items } => write!(f, "Only {} takeaway items", items),
        }
    }
}

/// What a generated deck contains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeckAudit {
    pub title: Option<String>,
    pub total_frames: usize,
    pub has_learning_goal: bool,
    pub concept_frames: usize,
    pub has_visualization: bool,
    pub has_formula: bool,
    pub has_explanation: bool,
    pub problem_frames: usize,
    pub solution_blocks: usize,
    pub has_takeaways: bool,
    pub takeaway_items: usize,
    pub findings: Vec<Finding>,
}

impl DeckAudit {
    /// True when no hard issue was found.
    pub fn passed(&self) -> bool {
        !self.findings.iter().any(Finding::is_issue)
    }

    pub fn issues(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_issue())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.is_issue())
    }
}

/// Audit a generated deck.
pub fn audit(tex: &str) -> DeckAudit {
    let frame = |title: &str| format!("\\begin{{frame}}{{{}", title);

    let mut report = DeckAudit {
        title: TITLE_REGEX.captures(tex).map(|c| c[1].to_string()),
        total_frames: tex.matches("\\begin{frame}").count(),
        has_learning_goal: tex.contains(&format!("{}}}", frame("Learning Goal"))),
        concept_frames: tex.matches(&frame("Key Concept")).count(),
        has_visualization: GRAPHICS_REGEX.is_match(tex),
        has_formula: tex.contains(&format!("{}}}", frame("Key Formula"))),
        has_explanation: tex.contains(&format!("{}}}", frame("Intuitive Explanation"))),
        problem_frames: tex.matches(&frame("Practice Problem")).count(),
        solution_blocks: tex.matches("\\begin{block}{Solution}").count(),
        has_takeaways: false,
        takeaway_items: 0,
        findings: Vec::new(),
    };

    if let Some(caps) = TAKEAWAYS_FRAME_REGEX.captures(tex) {
        report.has_takeaways = true;
        report.takeaway_items = caps[1].matches("\\item").count();
    }

    if !report.has_learning_goal {
        report.findings.push(Finding::MissingLearningGoal);
    }
    if !report.has_takeaways {
        report.findings.push(Finding::MissingTakeaways);
    }
    if report.problem_frames != report.solution_blocks {
        report.findings.push(Finding::SolutionMismatch {
            problems: report.problem_frames,
            solutions: report.solution_blocks,
        });
    }
    if report.problem_frames == 0 {
        report.findings.push(Finding::NoPracticeProblems);
    }
    if !report.has_visualization {
        report.findings.push(Finding::NoVisualization);
    }
    if report.has_takeaways && report.takeaway_items < MIN_TAKEAWAY_ITEMS {
        report.findings.push(Finding::FewTakeaways {
            items: report.takeaway_items,
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::Assembler;
    use crate::extract::extract;
    use crate::latex::BeamerRenderer;

    fn build(markdown: &str, resource: Option<&str>) -> String {
        let doc = extract(markdown);
        let assembled = Assembler::new().assemble_extracted(&doc, "Topic", "Sub", resource);
        BeamerRenderer::new().render(&assembled)
    }

    const COMPLETE: &str = "---\ntitle: \"14. Gradient Descent\"\n---\n\
        ## Learning Goal\nDescend.\n\
        ## Key Concept\nFollow the slope.\n\
        ## Key Formula\n$$w \\leftarrow w - \\eta \\nabla L$$\n\
        ## Intuitive Explanation\nWalk downhill.\n\
        ## Practice Problems\n### Problem 1\nStep?\n\
        <details>\n<summary>Solution</summary>\nSmall.\n</details>\n\
        ## Key Takeaways\n- Slope\n- Step size\n- Convergence\n";

    #[test]
    fn test_complete_deck_passes() {
        let report = audit(&build(COMPLETE, Some("14_gradient_descent/gradient_descent.pdf")));

        assert_eq!(report.title.as_deref(), Some("14. Gradient Descent"));
        assert!(report.has_learning_goal);
        assert_eq!(report.concept_frames, 1);
        assert!(report.has_visualization);
        assert!(report.has_formula);
        assert!(report.has_explanation);
        assert_eq!(report.problem_frames, 1);
        assert_eq!(report.solution_blocks, 1);
        assert_eq!(report.takeaway_items, 3);
        assert_eq!(report.total_frames, 8);
        assert!(report.findings.is_empty());
        assert!(report.passed());
    }

    #[test]
    fn test_missing_sections_reported() {
        let report = audit(&build("## Key Concept\nOnly a concept.", None));

        assert!(!report.passed());
        assert!(report.issues().any(|f| *f == Finding::MissingLearningGoal));
        assert!(report.issues().any(|f| *f == Finding::MissingTakeaways));
        assert!(report.warnings().any(|f| *f == Finding::NoPracticeProblems));
        assert!(report.warnings().any(|f| *f == Finding::NoVisualization));
    }

    #[test]
    fn test_solution_mismatch() {
        let md = "## Learning Goal\nG\n\
            ## Practice Problems\n### Problem 1\nNo solution here.\n\
            ## Key Takeaways\n- a\n- b\n- c";
        let report = audit(&build(md, Some("x.pdf")));

        assert_eq!(
            report.issues().cloned().collect::<Vec<_>>(),
            vec![Finding::SolutionMismatch {
                problems: 1,
                solutions: 0
            }]
        );
    }

    #[test]
    fn test_few_takeaways_is_warning() {
        let md = "## Learning Goal\nG\n## Key Takeaways\n- only one";
        let report = audit(&build(md, Some("x.pdf")));

        assert!(report.passed());
        assert!(report.warnings().any(|f| *f == Finding::FewTakeaways { items: 1 }));
    }

    #[test]
    fn test_finding_display() {
        let finding = Finding::SolutionMismatch {
            problems: 2,
            solutions: 1,
        };
        assert_eq!(finding.to_string(), "2 problems but 1 solutions");
    }
}
