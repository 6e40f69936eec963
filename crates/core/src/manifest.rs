//! Batch manifest describing the topic units of a course.
//!
//! ```json
//! {
//!   "subtitle": "Neural Networks - From Brain to Business",
//!   "units": [
//!     {
//!       "number": 1,
//!       "slug": "biological_neuron",
//!       "name": "Biological Neuron",
//!       "part": 1,
//!       "part_name": "Foundations",
//!       "source": "docs/topics/01-biological-neuron.md",
//!       "resource": "01_biological_neuron/biological_vs_artificial.pdf"
//!     }
//!   ]
//! }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One content unit (topic) of the course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// 1-based unit number.
    pub number: u32,

    /// Folder suffix, e.g. `biological_neuron` for `01_biological_neuron`.
    pub slug: String,

    /// Display name.
    pub name: String,

    #[serde(default)]
    pub part: u32,

    #[serde(default)]
    pub part_name: String,

    /// Markdown source, relative to the manifest's root.
    pub source: PathBuf,

    /// Visual resource referenced by the figure frame.
    #[serde(default)]
    pub resource: Option<String>,

    /// Number this unit had before the last renumbering, if any.
    #[serde(default)]
    pub previous_number: Option<u32>,
}

impl Unit {
    /// Zero-padded unit number, e.g. `07`.
    pub fn code(&self) -> String {
        format!("{:02}", self.number)
    }

    /// Resource folder name, e.g. `07_sigmoid_saturation`.
    pub fn folder(&self) -> String {
        format!("{:02}_{}", self.number, self.slug)
    }

    /// Title used when the source has no `title` front-matter key.
    pub fn fallback_title(&self) -> String {
        format!("Topic {:02}", self.number)
    }

    /// Display title with number prefix, e.g. `07. Sigmoid Saturation`.
    pub fn display_title(&self) -> String {
        format!("{:02}. {}", self.number, self.name)
    }

    /// Generated deck file stem, e.g. `topic_07_extended`.
    pub fn output_stem(&self) -> String {
        format!("topic_{:02}_extended", self.number)
    }
}

fn default_subtitle() -> String {
    "Neural Networks - From Brain to Business".to_string()
}

/// The full set of units processed by one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_subtitle")]
    pub subtitle: String,

    pub units: Vec<Unit>,
}

impl Manifest {
    /// Parse and validate a manifest from JSON. Units are sorted by number.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut manifest: Manifest = serde_json::from_str(json)?;
        manifest.validate()?;
        manifest.units.sort_by_key(|u| u.number);
        Ok(manifest)
    }

    /// Load a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for unit in &self.units {
            if unit.number == 0 {
                return Err(Error::InvalidManifest(format!(
                    "unit '{}' has number 0; numbers start at 1",
                    unit.name
                )));
            }
            if !seen.insert(unit.number) {
                return Err(Error::InvalidManifest(format!(
                    "unit number {} appears more than once",
                    unit.number
                )));
            }
        }
        Ok(())
    }

    /// Look up a unit by number.
    pub fn unit(&self, number: u32) -> Option<&Unit> {
        self.units.iter().find(|u| u.number == number)
    }

    /// Units whose number lies in `first..=last`, in order.
    pub fn units_in_range(&self, first: u32, last: u32) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(move |u| u.number >= first && u.number <= last)
    }
}
