//! Stage descriptor set.
//!
//! A read-only tree of canonical stage identities, produced by an external
//! generator and handed to [`PromptDocument`](crate::PromptDocument) fully
//! materialized. The set is plain data: it is either built in code through
//! [`StageSetBuilder`] or loaded from the generator's TOML output.
//!
//! ```toml
//! [[stages]]
//! key = "output"
//! name = "Output"          # optional, defaults to the humanized key
//! fixed_order = 6          # optional, top-level stages only
//!
//! [[stages.children]]
//! key = "output_template_rules"
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use structprompt_shared::{Result, StructPromptError};

use crate::node::title_from_key;

/// Identity source for built sets; `0` is left to sets with no stages.
static NEXT_SET_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a descriptor. Only valid for the [`StageSet`] that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId {
    set: u64,
    index: usize,
}

/// One canonical stage.
#[derive(Debug, Clone)]
pub struct StageDescriptor {
    /// Stable lowercase identifier, unique among siblings.
    pub key: String,
    /// Default section title.
    pub display_name: String,
    /// Enclosing stage, `None` for top-level stages.
    pub parent: Option<StageId>,
    /// Immediate children in declaration order.
    pub children: Vec<StageId>,
    /// Pinned position among top-level sections. Only set on top-level stages.
    pub fixed_order: Option<usize>,
}

/// The full descriptor tree, rooted at a synthetic root whose children are
/// the top-level stages.
#[derive(Debug, Clone, Default)]
pub struct StageSet {
    id: u64,
    stages: Vec<StageDescriptor>,
    top_level: Vec<StageId>,
}

impl StageSet {
    /// A set with no stages; every section is then ad-hoc.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start building a set in code.
    pub fn builder() -> StageSetBuilder {
        StageSetBuilder::default()
    }

    /// Parse the generator's TOML output.
    #[instrument(skip_all)]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: StageFile = toml::from_str(content)
            .map_err(|e| StructPromptError::parse(format!("invalid stage file: {e}")))?;

        let mut builder = Self::builder();
        for entry in &file.stages {
            add_entry(&mut builder, None, entry)?;
        }
        let set = builder.build()?;
        debug!(stages = set.len(), "stage set loaded");
        Ok(set)
    }

    /// Load a stage file from disk.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StructPromptError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Number of stages, excluding the synthetic root.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the set holds no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Whether `id` was issued by this set.
    pub fn contains(&self, id: StageId) -> bool {
        id.set == self.id && id.index < self.stages.len()
    }

    pub fn get(&self, id: StageId) -> Option<&StageDescriptor> {
        if id.set == self.id {
            self.stages.get(id.index)
        } else {
            None
        }
    }

    /// Top-level stages in declaration order.
    pub fn top_level(&self) -> &[StageId] {
        &self.top_level
    }

    /// Immediate children of `id`.
    pub fn children(&self, id: StageId) -> &[StageId] {
        self.get(id).map(|d| d.children.as_slice()).unwrap_or(&[])
    }

    /// Find a stage by dotted key path, e.g. `output.output_template_rules`.
    pub fn lookup(&self, dotted: &str) -> Option<StageId> {
        let mut candidates = self.top_level.as_slice();
        let mut found = None;

        for key in dotted.split('.') {
            let id = candidates
                .iter()
                .copied()
                .find(|id| self.stages[id.index].key == key)?;
            candidates = &self.stages[id.index].children;
            found = Some(id);
        }

        found
    }

    /// Like [`lookup`](Self::lookup), failing with an addressing error.
    pub fn require(&self, dotted: &str) -> Result<StageId> {
        self.lookup(dotted)
            .ok_or_else(|| StructPromptError::addressing(dotted, "no such stage"))
    }

    /// Ancestors of `id` from its top-level stage down to `id` itself.
    pub fn lineage(&self, id: StageId) -> Vec<StageId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(step) = current.filter(|s| self.contains(*s)) {
            chain.push(step);
            current = self.stages[step.index].parent;
        }
        chain.reverse();
        chain
    }

    /// Dotted key path of `id`.
    pub fn dotted_key(&self, id: StageId) -> String {
        self.lineage(id)
            .into_iter()
            .map(|s| self.stages[s.index].key.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Pinned top-level index of `id`, if it is a fixed top-level stage.
    pub fn fixed_order(&self, id: StageId) -> Option<usize> {
        self.get(id)
            .filter(|d| d.parent.is_none())
            .and_then(|d| d.fixed_order)
    }

    /// Depth-first walk yielding `(depth, id)`, top-level stages at depth 0.
    pub fn walk(&self) -> Vec<(usize, StageId)> {
        let mut out = Vec::with_capacity(self.stages.len());
        let mut stack: Vec<(usize, StageId)> =
            self.top_level.iter().rev().map(|id| (0, *id)).collect();

        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            for child in self.children(id).iter().rev() {
                stack.push((depth + 1, *child));
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Incremental constructor for a [`StageSet`]. Ids are valid for the built set.
#[derive(Debug)]
pub struct StageSetBuilder {
    set: StageSet,
}

impl Default for StageSetBuilder {
    fn default() -> Self {
        Self {
            set: StageSet {
                id: NEXT_SET_ID.fetch_add(1, Ordering::Relaxed),
                ..StageSet::default()
            },
        }
    }
}

impl StageSetBuilder {
    /// Add a top-level stage placed by insertion order.
    pub fn stage(&mut self, key: impl Into<String>, name: impl Into<String>) -> StageId {
        self.push(None, key.into(), name.into(), None)
    }

    /// Add a top-level stage pinned to `index` among top-level sections.
    pub fn fixed_stage(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        index: usize,
    ) -> StageId {
        self.push(None, key.into(), name.into(), Some(index))
    }

    /// Add a stage nested under `parent`.
    pub fn child(
        &mut self,
        parent: StageId,
        key: impl Into<String>,
        name: impl Into<String>,
    ) -> StageId {
        self.push(Some(parent), key.into(), name.into(), None)
    }

    fn push(
        &mut self,
        parent: Option<StageId>,
        key: String,
        display_name: String,
        fixed_order: Option<usize>,
    ) -> StageId {
        let id = StageId {
            set: self.set.id,
            index: self.set.stages.len(),
        };
        self.set.stages.push(StageDescriptor {
            key,
            display_name,
            parent,
            children: Vec::new(),
            fixed_order,
        });
        match parent {
            Some(p) if self.set.contains(p) => self.set.stages[p.index].children.push(id),
            Some(_) => {}
            None => self.set.top_level.push(id),
        }
        id
    }

    /// Validate and finish the set.
    pub fn build(self) -> Result<StageSet> {
        let set = self.set;

        for (index, stage) in set.stages.iter().enumerate() {
            if stage.parent.is_some_and(|p| !set.contains(p)) {
                return Err(StructPromptError::validation(format!(
                    "stage `{}` refers to an unknown parent",
                    stage.key
                )));
            }
            if stage.key.trim().is_empty() {
                return Err(StructPromptError::validation(format!(
                    "stage #{index} has an empty key"
                )));
            }
            if stage.key.contains('.') || stage.key.chars().any(char::is_whitespace) {
                return Err(StructPromptError::validation(format!(
                    "stage key `{}` must not contain dots or whitespace",
                    stage.key
                )));
            }
            if stage.parent.is_some() && stage.fixed_order.is_some() {
                return Err(StructPromptError::validation(format!(
                    "stage `{}` is nested; only top-level stages can have a fixed order",
                    set.dotted_key(StageId { set: set.id, index })
                )));
            }
        }

        check_unique_keys(&set, &set.top_level, "top level")?;
        for stage in &set.stages {
            check_unique_keys(&set, &stage.children, &stage.key)?;
        }

        Ok(set)
    }
}

fn check_unique_keys(set: &StageSet, siblings: &[StageId], scope: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for id in siblings {
        let key = &set.stages[id.index].key;
        if !seen.insert(key.as_str()) {
            return Err(StructPromptError::validation(format!(
                "duplicate stage key `{key}` under {scope}"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct StageFile {
    #[serde(default)]
    stages: Vec<StageEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StageEntry {
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fixed_order: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<StageEntry>,
}

fn add_entry(
    builder: &mut StageSetBuilder,
    parent: Option<StageId>,
    entry: &StageEntry,
) -> Result<()> {
    let name = entry
        .name
        .clone()
        .unwrap_or_else(|| title_from_key(&entry.key));

    let id = match (parent, entry.fixed_order) {
        (None, Some(index)) => builder.fixed_stage(&entry.key, name, index),
        (None, None) => builder.stage(&entry.key, name),
        (Some(_), Some(_)) => {
            return Err(StructPromptError::validation(format!(
                "stage `{}` is nested; only top-level stages can have a fixed order",
                entry.key
            )));
        }
        (Some(p), None) => builder.child(p, &entry.key, name),
    };

    for child in &entry.children {
        add_entry(builder, Some(id), child)?;
    }
    Ok(())
}
