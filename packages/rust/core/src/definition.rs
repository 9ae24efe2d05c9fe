//! Declarative prompt definitions.
//!
//! A TOML file describing the header and a list of section assignments,
//! applied in file order against a stage set:
//!
//! ```toml
//! role = "Senior SRE"
//! prologue = "K8s Resolver Prompt"
//!
//! [[critical_steps]]
//! title = "VERIFY"
//! body = "Always verify assumptions"
//!
//! [[sections]]
//! stage = "output.output_template_rules"
//! path = ["Extras"]
//! value = ["Always use Markdown."]
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use structprompt_shared::{IndentationPreferences, Result, StructPromptError};

use crate::address::StagePath;
use crate::assign::Assignment;
use crate::document::PromptDocument;
use crate::node::CriticalStep;
use crate::stages::StageSet;

/// Parsed prompt definition file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptDefinition {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub prologue: Option<String>,
    #[serde(default)]
    pub critical_steps: Vec<CriticalStep>,
    #[serde(default)]
    pub sections: Vec<SectionEntry>,
}

/// One `[[sections]]` entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionEntry {
    /// Dotted stage key, e.g. `output.output_template_rules`.
    #[serde(default)]
    pub stage: Option<String>,
    /// Ad-hoc segments resolved after `stage` (or from the root).
    #[serde(default)]
    pub path: Vec<String>,
    /// Text, item list, or section table.
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub critical_steps: Vec<CriticalStep>,
}

impl PromptDefinition {
    #[instrument(skip_all)]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let def: Self = toml::from_str(content)
            .map_err(|e| StructPromptError::parse(format!("invalid prompt file: {e}")))?;
        debug!(sections = def.sections.len(), "prompt definition parsed");
        Ok(def)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StructPromptError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Apply the definition to a fresh document over `stages`.
    #[instrument(skip_all, fields(sections = self.sections.len()))]
    pub fn build(
        self,
        stages: Arc<StageSet>,
        prefs: IndentationPreferences,
    ) -> Result<PromptDocument> {
        let mut doc = PromptDocument::new(stages).with_prefs(prefs);

        if let Some(role) = self.role {
            doc.set_role(role);
        }
        if let Some(prologue) = self.prologue {
            doc.set_prologue(prologue);
        }
        for step in self.critical_steps {
            doc.add_critical_step(step.title, step.body);
        }

        for (index, entry) in self.sections.into_iter().enumerate() {
            let mut path = StagePath::new();
            if let Some(stage) = entry.stage.as_deref() {
                path = path.then(doc.stages().require(stage)?);
            }
            for segment in entry.path {
                path = path.then(segment);
            }
            if path.is_empty() {
                return Err(StructPromptError::validation(format!(
                    "sections[{index}] needs a `stage` or a non-empty `path`"
                )));
            }

            let value = entry.value.map(Assignment::try_from).transpose()?;

            let mut handle = doc.section(path)?;
            if let Some(value) = value {
                handle.assign(value)?;
            }
            for step in entry.critical_steps {
                handle.add_critical_step(step.title, step.body);
            }
            debug!(
                index,
                key = handle.node().key(),
                items = handle.node().items().len(),
                "section applied"
            );
        }

        Ok(doc)
    }
}
