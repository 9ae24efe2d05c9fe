//! Content tree engine for structured prompt documents.
//!
//! A [`PromptDocument`] holds a role, a prologue, document-level critical
//! steps and a tree of [`ContentNode`]s addressed by canonical stages or
//! ad-hoc names. Rendering orders the top-level sections (honouring fixed
//! stage indices) and lays out every body with the configured bullet
//! progression.

pub mod address;
pub mod assign;
pub mod definition;
pub mod document;
pub mod node;
pub mod ordering;
pub mod render;
pub mod stages;

pub use address::{SectionHandle, Segment, StagePath};
pub use assign::{Assignment, ItemValue, PromptText, Section, SectionTitle};
pub use definition::{PromptDefinition, SectionEntry};
pub use document::PromptDocument;
pub use node::{BulletDirective, ContentNode, CriticalStep, Item, title_from_key};
pub use ordering::{ConflictReason, OrderingConflict, SectionOrder, order_sections};
pub use render::render_document;
pub use stages::{StageDescriptor, StageId, StageSet, StageSetBuilder};
