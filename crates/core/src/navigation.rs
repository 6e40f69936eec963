//! Site navigation front matter and unit renumbering.
//!
//! Topic pages carry a front-matter block with their number, part, and the
//! slugs of the neighbouring pages. Renumbering moves unit folders and
//! rewrites `NN_suffix/` path references to match.

use crate::error::{Error, Result};
use crate::extract::front_matter_end;
use crate::manifest::Unit;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static BACK_TO_HOME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Back to Home\]\([^)]+\)\n*").unwrap());

static NEXT_TOPIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\*\*Next Topic:\*\*.*$").unwrap());

static BLANK_RUN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// `NN_suffix/` references to unit folders.
static FOLDER_REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{2})_([A-Za-z0-9_]+)/").unwrap());

/// Prefix for the intermediate folder names of a two-phase rename.
const TEMP_PREFIX: &str = "temp_";

/// Page slug for a unit, e.g. `02-single-neuron-computation`.
pub fn page_slug(unit: &Unit) -> String {
    format!(
        "{:02}-{}",
        unit.number,
        unit.name.to_lowercase().replace(' ', "-")
    )
}

/// Render the navigation front matter for `units[index]`.
///
/// `units` must be ordered by number; neighbours are taken by position.
pub fn navigation_front_matter(units: &[Unit], index: usize) -> Option<String> {
    let unit = units.get(index)?;
    let prev = index.checked_sub(1).and_then(|i| units.get(i));
    let next = units.get(index + 1);

    let mut block = String::from("---\nlayout: topic\n");
    block.push_str(&format!("title: \"{}\"\n", unit.display_title()));
    block.push_str(&format!("topic_num: {}\n", unit.number));
    block.push_str(&format!("part: {}\n", unit.part));
    block.push_str(&format!("part_name: \"{}\"\n", unit.part_name));
    if let Some(prev) = prev {
        block.push_str(&format!("prev_topic: \"{}\"\n", page_slug(prev)));
    }
    if let Some(next) = next {
        block.push_str(&format!("next_topic: \"{}\"\n", page_slug(next)));
    }
    block.push_str("---\n");

    Some(block)
}

/// Replace the leading front-matter block of `content` with `block`, or
/// prepend `block` when there is none.
pub fn replace_front_matter(content: &str, block: &str) -> String {
    let body = match front_matter_end(content) {
        Some(end) => &content[end..],
        None => content,
    };

    let body = body.trim();
    if body.is_empty() {
        block.to_string()
    } else {
        format!("{}\n{}\n", block, body)
    }
}

/// Remove hand-written navigation that the front matter now provides:
/// `[Back to Home](...)` links and a trailing `**Next Topic:**` section.
pub fn strip_legacy_navigation(content: &str) -> String {
    let content = BACK_TO_HOME_REGEX.replace_all(content, "");
    let content = NEXT_TOPIC_REGEX.replace_all(&content, "");
    BLANK_RUN_REGEX.replace_all(&content, "\n\n").into_owned()
}

/// One folder number change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renumbering {
    pub old: u32,
    pub new: u32,
    pub suffix: String,
}

/// A single folder rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderMove {
    pub from: String,
    pub to: String,
}

/// A validated set of folder renumberings.
#[derive(Debug, Clone, Default)]
pub struct RenumberPlan {
    entries: Vec<Renumbering>,
}

impl RenumberPlan {
    /// Build a plan, rejecting duplicate sources or targets.
    pub fn new(entries: Vec<Renumbering>) -> Result<Self> {
        let mut sources = HashSet::new();
        let mut targets = HashSet::new();

        for entry in &entries {
            if !sources.insert((entry.old, entry.suffix.as_str())) {
                return Err(Error::InvalidRenumberPlan(format!(
                    "{:02}_{} is renumbered twice",
                    entry.old, entry.suffix
                )));
            }
            if !targets.insert(entry.new) {
                return Err(Error::InvalidRenumberPlan(format!(
                    "more than one unit is renumbered to {:02}",
                    entry.new
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Plan from the units' `previous_number` fields.
    pub fn from_units(units: &[Unit]) -> Result<Self> {
        let entries = units
            .iter()
            .filter_map(|unit| {
                unit.previous_number.map(|old| Renumbering {
                    old,
                    new: unit.number,
                    suffix: unit.slug.clone(),
                })
            })
            .collect();
        Self::new(entries)
    }

    pub fn entries(&self) -> &[Renumbering] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Folder renames in execution order: every changed folder first moves
    /// to a temporary name, then every temporary folder moves to its target.
    pub fn folder_moves(&self) -> Vec<FolderMove> {
        let changed: Vec<&Renumbering> = self.entries.iter().filter(|e| e.old != e.new).collect();

        let to_temp = changed.iter().map(|e| FolderMove {
            from: format!("{:02}_{}", e.old, e.suffix),
            to: format!("{}{:02}_{}", TEMP_PREFIX, e.old, e.suffix),
        });
        let to_final = changed.iter().map(|e| FolderMove {
            from: format!("{}{:02}_{}", TEMP_PREFIX, e.old, e.suffix),
            to: format!("{:02}_{}", e.new, e.suffix),
        });

        to_temp.chain(to_final).collect()
    }

    /// Rewrite `NN_suffix/` references in one pass. Each reference is
    /// rewritten at most once, so swapped numbers never chain.
    pub fn rewrite_references(&self, content: &str) -> String {
        let lookup: HashMap<(u32, &str), u32> = self
            .entries
            .iter()
            .map(|e| ((e.old, e.suffix.as_str()), e.new))
            .collect();

        FOLDER_REF_REGEX
            .replace_all(content, |caps: &Captures| {
                let renumbered = caps[1]
                    .parse::<u32>()
                    .ok()
                    .and_then(|old| lookup.get(&(old, &caps[2])));
                match renumbered {
                    Some(new) => format!("{:02}_{}/", new, &caps[2]),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}
