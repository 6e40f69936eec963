//! Section extraction, inline LaTeX conversion, and Beamer deck assembly
//! for topic notes.

pub mod assemble;
pub mod audit;
pub mod error;
pub mod extract;
pub mod latex;
pub mod manifest;
pub mod navigation;
pub mod transform;
pub mod types;

pub use assemble::Assembler;
pub use audit::{audit, DeckAudit, Finding};
pub use error::{Error, Result};
pub use extract::extract;
pub use latex::BeamerRenderer;
pub use manifest::{Manifest, Unit};
pub use navigation::{RenumberPlan, Renumbering};
pub use transform::InlineTransformer;
pub use types::{
    AssembledDocument, Block, BlockBody, BlockKind, ExtractedDocument, FrontMatter, Problem,
    Section, Sections,
};
