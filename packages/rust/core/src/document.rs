//! The prompt document: header fields plus the top-level content tree.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::instrument;

use structprompt_shared::{IndentationPreferences, Result};

use crate::address::{Scope, SectionHandle, StagePath, find_in, resolve_in};
use crate::assign::Assignment;
use crate::node::{ContentNode, CriticalStep};
use crate::ordering::{SectionOrder, order_sections};
use crate::render::render_document;
use crate::stages::StageSet;

/// A prompt under construction.
///
/// Top-level sections are kept in creation order; ordering against fixed
/// stage indices happens at render time.
#[derive(Debug, Clone)]
pub struct PromptDocument {
    stages: Arc<StageSet>,
    role: Option<String>,
    prologue: Option<String>,
    critical_steps: Vec<CriticalStep>,
    top_level: IndexMap<String, ContentNode>,
    prefs: IndentationPreferences,
}

impl PromptDocument {
    /// Empty document over `stages` with default indentation preferences.
    pub fn new(stages: Arc<StageSet>) -> Self {
        Self {
            stages,
            role: None,
            prologue: None,
            critical_steps: Vec::new(),
            top_level: IndexMap::new(),
            prefs: IndentationPreferences::default(),
        }
    }

    /// Document with no stage set; every section is ad-hoc.
    pub fn ad_hoc() -> Self {
        Self::new(Arc::new(StageSet::empty()))
    }

    pub fn with_prefs(mut self, prefs: IndentationPreferences) -> Self {
        self.prefs = prefs;
        self
    }

    pub fn stages(&self) -> &StageSet {
        &self.stages
    }

    pub fn set_role(&mut self, role: impl Into<String>) -> &mut Self {
        self.role = Some(role.into());
        self
    }

    pub fn set_prologue(&mut self, prologue: impl Into<String>) -> &mut Self {
        self.prologue = Some(prologue.into());
        self
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn prologue(&self) -> Option<&str> {
        self.prologue.as_deref()
    }

    pub fn prefs(&self) -> &IndentationPreferences {
        &self.prefs
    }

    pub fn prefs_mut(&mut self) -> &mut IndentationPreferences {
        &mut self.prefs
    }

    /// Append a document-level critical step, rendered before all sections.
    pub fn add_critical_step(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> &mut Self {
        self.critical_steps.push(CriticalStep::new(title, body));
        self
    }

    pub fn critical_steps(&self) -> &[CriticalStep] {
        &self.critical_steps
    }

    /// Resolve `path` from the document root, creating any missing sections.
    pub fn section(&mut self, path: impl Into<StagePath>) -> Result<SectionHandle<'_>> {
        let path = path.into();
        let node = resolve_in(&self.stages, &mut self.top_level, Scope::Root, &path)?;
        Ok(SectionHandle::new(&self.stages, node))
    }

    /// Resolve `path` and assign `value` to the node found there.
    ///
    /// The value is validated before the path is resolved, so a rejected value
    /// does not leave freshly created empty sections behind.
    #[instrument(skip_all)]
    pub fn assign(
        &mut self,
        path: impl Into<StagePath>,
        value: impl Into<Assignment>,
    ) -> Result<()> {
        let prepared = value.into().prepare(&self.stages)?;
        let path = path.into();
        let node = resolve_in(&self.stages, &mut self.top_level, Scope::Root, &path)?;
        prepared.apply(node);
        Ok(())
    }

    /// Look up an existing node without creating anything.
    pub fn get(&self, path: impl Into<StagePath>) -> Option<&ContentNode> {
        find_in(&self.stages, &self.top_level, Scope::Root, &path.into())
    }

    /// Top-level sections in creation order, including empty ones.
    pub fn top_level(&self) -> impl Iterator<Item = &ContentNode> {
        self.top_level.values()
    }

    /// Top-level sections with content, in render order.
    pub fn ordered_sections(&self) -> SectionOrder<'_> {
        order_sections(&self.stages, self.top_level.values())
    }

    pub fn render(&self) -> String {
        render_document(self)
    }
}
