//! Beamer source output for assembled topic decks.
//!
//! Each block becomes one frame. The preamble carries the course palette and
//! a `\bottomnote` command used when bottom notes are enabled.

use crate::types::{AssembledDocument, Block, BlockBody, BlockKind};

/// Document preamble shared by every topic deck.
pub const PREAMBLE: &str = r"\documentclass[8pt,aspectratio=169]{beamer}
\usetheme{Madrid}
\usepackage{graphicx}
\usepackage{booktabs}
\usepackage{adjustbox}
\usepackage{multicol}
\usepackage{amsmath}
\usepackage{amssymb}

% Color definitions
\definecolor{mlblue}{RGB}{0,102,204}
\definecolor{mlpurple}{RGB}{51,51,178}
\definecolor{mllavender}{RGB}{173,173,224}
\definecolor{mllavender2}{RGB}{193,193,232}
\definecolor{mllavender3}{RGB}{204,204,235}
\definecolor{mllavender4}{RGB}{214,214,239}
\definecolor{mlorange}{RGB}{255, 127, 14}
\definecolor{mlgreen}{RGB}{44, 160, 44}
\definecolor{mlred}{RGB}{214, 39, 40}
\definecolor{mlgray}{RGB}{127, 127, 127}

\setbeamercolor{palette primary}{bg=mllavender3,fg=mlpurple}
\setbeamercolor{palette secondary}{bg=mllavender2,fg=mlpurple}
\setbeamercolor{palette tertiary}{bg=mllavender,fg=white}
\setbeamercolor{palette quaternary}{bg=mlpurple,fg=white}
\setbeamercolor{structure}{fg=mlpurple}
\setbeamercolor{title}{fg=mlpurple}
\setbeamercolor{frametitle}{fg=mlpurple,bg=mllavender3}
\setbeamercolor{block title}{bg=mllavender2,fg=mlpurple}
\setbeamercolor{block body}{bg=mllavender4,fg=black}

\setbeamertemplate{navigation symbols}{}
\setbeamertemplate{itemize items}[circle]
\setbeamersize{text margin left=5mm,text margin right=5mm}

\newcommand{\bottomnote}[1]{%
\vfill
\vspace{-2mm}
\textcolor{mllavender2}{\rule{\textwidth}{0.4pt}}
\vspace{1mm}
\footnotesize
\textbf{#1}
}
";

/// Graphic options for the figure frame.
const FIGURE_OPTIONS: &str = r"width=0.9\textwidth,height=0.75\textheight,keepaspectratio";

/// Footer sentence for a frame of the given kind.
pub fn bottom_note(kind: BlockKind) -> Option<&'static str> {
    match kind {
        BlockKind::Title => None,
        BlockKind::Objective => {
            Some("This slide establishes the learning objective for this topic")
        }
        BlockKind::Concept => {
            Some("Understanding this concept is crucial for neural network fundamentals")
        }
        BlockKind::Figure => Some("Visual representations help solidify abstract concepts"),
        BlockKind::Formula => Some("Mathematical formalization provides precision"),
        BlockKind::Explanation => Some("Intuitive explanations bridge theory and practice"),
        BlockKind::ProblemSet => Some("Practice problems reinforce understanding"),
        BlockKind::Summary => Some("These key points summarize the essential learnings"),
    }
}

/// Renders assembled documents as Beamer source.
#[derive(Debug, Clone, Default)]
pub struct BeamerRenderer {
    /// Whether to end each content frame with a `\bottomnote`.
    bottom_notes: bool,
}

impl BeamerRenderer {
    /// Create a renderer without bottom notes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable per-frame bottom notes.
    pub fn with_bottom_notes(mut self, enabled: bool) -> Self {
        self.bottom_notes = enabled;
        self
    }

    /// Render a complete `.tex` document.
    pub fn render(&self, document: &AssembledDocument) -> String {
        let mut output = String::with_capacity(PREAMBLE.len() + 4096);
        output.push_str(PREAMBLE);
        output.push('\n');

        output.push_str(&format!("\\title{{{}}}\n", document.title));
        if !document.subtitle.is_empty() {
            output.push_str(&format!("\\subtitle{{{}}}\n", document.subtitle));
        }
        output.push_str("\\date{}\n\n");
        output.push_str("\\begin{document}\n\n");

        for block in &document.blocks {
            output.push_str(&self.render_block(block));
        }

        output.push_str("\\end{document}\n");
        output
    }

    /// Render one block as a frame, followed by a blank line.
    pub fn render_block(&self, block: &Block) -> String {
        if let BlockBody::TitlePage { .. } = block.body {
            return "\\begin{frame}[plain]\n\\titlepage\n\\end{frame}\n\n".to_string();
        }

        let mut frame = format!("\\begin{{frame}}{{{}}}\n", block.title);

        match &block.body {
            BlockBody::TitlePage { .. } => {}
            BlockBody::Text { text } => {
                frame.push_str(text);
                frame.push('\n');
            }
            BlockBody::Items { items } => {
                frame.push_str(&render_itemize(items));
            }
            BlockBody::Figure { path } => {
                frame.push_str("\\begin{center}\n");
                frame.push_str(&format!("\\includegraphics[{}]{{{}}}\n", FIGURE_OPTIONS, path));
                frame.push_str("\\end{center}\n");
            }
            BlockBody::Problem {
                heading,
                question,
                solution,
            } => {
                frame.push_str(&format!("\\textbf{{{}}}\n\n", heading));
                frame.push_str(question);
                frame.push_str("\n\\vspace{1em}\n");
                if let Some(solution) = solution {
                    frame.push_str("\\begin{block}{Solution}\n\\small\n");
                    frame.push_str(solution);
                    frame.push_str("\n\\end{block}\n");
                }
            }
        }

        if self.bottom_notes {
            if let Some(note) = bottom_note(block.kind) {
                frame.push_str(&format!("\n\\bottomnote{{{}}}\n", note));
            }
        }

        frame.push_str("\\end{frame}\n\n");
        frame
    }
}

/// Render items as an `itemize` environment. Empty input renders nothing.
pub fn render_itemize(items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut output = String::from("\\begin{itemize}\n");
    for item in items {
        output.push_str(&format!("  \\item {}\n", item));
    }
    output.push_str("\\end{itemize}\n");
    output
}
