//! Domain types for extracted topic documents and assembled decks.

use serde::{Deserialize, Serialize};

/// Key-value metadata from a document's leading front-matter block.
///
/// Keys keep the position of their first appearance; a repeated key
/// overwrites the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    entries: Vec<(String, String)>,
}

impl FrontMatter {
    /// Create an empty front-matter mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any earlier value for the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A named span of a document body, delimited by second-level headings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text without the marker.
    pub name: String,

    /// Trimmed body text.
    pub body: String,
}

/// Sections of one document in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    sections: Vec<Section>,
}

impl Sections {
    /// Create an empty section mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a section. A duplicate name keeps its original position but
    /// takes the new body.
    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<String>) {
        let name = name.into();
        let body = body.into();
        match self.sections.iter_mut().find(|s| s.name == name) {
            Some(section) => section.body = body,
            None => self.sections.push(Section { name, body }),
        }
    }

    /// Body of the named section, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.body.as_str())
    }

    /// Body of the first of `names` that is present.
    pub fn get_any(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.get(name))
    }

    /// Section names in first-appearance order.
    pub fn names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Result of running the section extractor over one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub front_matter: FrontMatter,
    pub sections: Sections,
}

/// The kind of a rendered block, in template order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Title,
    Objective,
    Concept,
    Figure,
    Formula,
    Explanation,
    ProblemSet,
    Summary,
}

impl BlockKind {
    /// Frame title used when the block is rendered.
    pub fn frame_title(&self) -> &'static str {
        match self {
            Self::Title => "",
            Self::Objective => "Learning Goal",
            Self::Concept => "Key Concept",
            Self::Figure => "Visualization",
            Self::Formula => "Key Formula",
            Self::Explanation => "Intuitive Explanation",
            Self::ProblemSet => "Practice Problem",
            Self::Summary => "Key Takeaways",
        }
    }
}

/// One practice problem parsed out of a problem-set section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Heading text after the marker, e.g. "Problem 1: Weighted Sum".
    pub heading: Option<String>,

    /// Question text (trimmed).
    pub question: String,

    /// Text from the collapsible solution region (trimmed).
    pub solution: String,
}

/// Rendered content of a block. Text fields already hold converted markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockBody {
    /// Title page built from the document title and subtitle.
    TitlePage { title: String, subtitle: String },

    /// Converted free text.
    Text { text: String },

    /// Converted bullet items.
    Items { items: Vec<String> },

    /// Reference to an external visual resource.
    Figure { path: String },

    /// A single practice problem.
    Problem {
        heading: String,
        question: String,
        solution: Option<String>,
    },
}

/// One rendered unit of the assembled output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,

    /// Frame title, including any `(i/N)` suffix or problem number.
    pub title: String,

    pub body: BlockBody,
}

impl Block {
    pub fn new(kind: BlockKind, title: impl Into<String>, body: BlockBody) -> Self {
        Self {
            kind,
            title: title.into(),
            body,
        }
    }
}

/// An ordered sequence of blocks ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledDocument {
    /// Converted document title.
    pub title: String,

    /// Converted subtitle.
    pub subtitle: String,

    /// Blocks in template order.
    pub blocks: Vec<Block>,
}

impl AssembledDocument {
    /// Block kinds in output order.
    pub fn kinds(&self) -> Vec<BlockKind> {
        self.blocks.iter().map(|b| b.kind).collect()
    }

    /// Number of blocks of the given kind.
    pub fn count(&self, kind: BlockKind) -> usize {
        self.blocks.iter().filter(|b| b.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
