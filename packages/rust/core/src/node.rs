//! The content tree: sections, their items, and critical-step blocks.

use std::str::FromStr;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use structprompt_shared::{BulletStyle, Result, StructPromptError};

use crate::stages::{StageDescriptor, StageId};

/// How a section's items pick their bullet glyphs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BulletDirective {
    /// Nothing specified; behaves like [`Progression`](Self::Progression).
    #[default]
    Unset,
    /// No glyphs at all. Items are still indented.
    Suppressed,
    /// Every item uses this style regardless of item count.
    Forced(BulletStyle),
    /// Depth glyph from the progression, dropped when there is a single item.
    Progression,
}

impl FromStr for BulletDirective {
    type Err = StructPromptError;

    /// `none`/`suppressed` → no glyphs, `auto`/`progression` → depth glyphs,
    /// anything else is a forced [`BulletStyle`].
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "suppressed" | "off" => Ok(Self::Suppressed),
            "auto" | "progression" | "default" => Ok(Self::Progression),
            _ => s.parse().map(Self::Forced),
        }
    }
}

/// A framed mandatory instruction block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalStep {
    pub title: String,
    pub body: String,
}

impl CriticalStep {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// One entry of a section's item list.
#[derive(Debug, Clone)]
pub enum Item {
    Text(String),
    /// Inline sub-section. Not reachable through path addressing.
    Section(ContentNode),
}

/// One section of the prompt tree.
///
/// `items` and `children` are independent: `children` holds the canonical
/// node for each addressed sub-path, while `items` holds content assigned to
/// this node, including inline sections.
#[derive(Debug, Clone)]
pub struct ContentNode {
    pub(crate) key: String,
    pub(crate) stage: Option<StageId>,
    pub(crate) title: String,
    pub(crate) subtitle: Option<String>,
    pub(crate) bullet: BulletDirective,
    pub(crate) items: Vec<Item>,
    pub(crate) critical_steps: Vec<CriticalStep>,
    pub(crate) children: IndexMap<String, ContentNode>,
}

impl ContentNode {
    /// A node backed by a canonical stage, titled with its display name.
    pub(crate) fn from_stage(id: StageId, descriptor: &StageDescriptor) -> Self {
        Self {
            stage: Some(id),
            ..Self::blank(descriptor.key.clone(), descriptor.display_name.clone())
        }
    }

    /// An ad-hoc node keyed by a free-form name.
    pub(crate) fn ad_hoc(key: &str) -> Self {
        Self::blank(key.to_string(), title_from_key(key))
    }

    /// An inline section that only lives in its parent's items.
    pub(crate) fn inline(title: String) -> Self {
        Self::blank(title.clone(), title)
    }

    fn blank(key: String, title: String) -> Self {
        Self {
            key,
            stage: None,
            title,
            subtitle: None,
            bullet: BulletDirective::Unset,
            items: Vec::new(),
            critical_steps: Vec::new(),
            children: IndexMap::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stage this node was created for, `None` for ad-hoc sections.
    pub fn stage(&self) -> Option<StageId> {
        self.stage
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn bullet(&self) -> &BulletDirective {
        &self.bullet
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn critical_steps(&self) -> &[CriticalStep] {
        &self.critical_steps
    }

    /// Addressed sub-sections in creation order.
    pub fn children(&self) -> impl Iterator<Item = &ContentNode> {
        self.children.values()
    }

    pub fn child(&self, key: &str) -> Option<&ContentNode> {
        self.children.get(key)
    }

    /// Plain-text items, in order. Inline sections are skipped.
    pub fn texts(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Text(text) => Some(text.as_str()),
                Item::Section(_) => None,
            })
            .collect()
    }

    /// Append a critical step. Steps are never replaced.
    pub fn add_critical_step(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.critical_steps.push(CriticalStep::new(title, body));
    }

    /// Whether rendering this node would produce anything below its heading.
    pub fn has_content(&self) -> bool {
        !self.items.is_empty()
            || !self.critical_steps.is_empty()
            || self.children.values().any(ContentNode::has_content)
    }

    /// Heading text: title, plus ` — subtitle` when present.
    pub fn heading(&self) -> String {
        match self.subtitle.as_deref().filter(|s| !s.is_empty()) {
            Some(subtitle) => format!("{} — {subtitle}", self.title),
            None => self.title.clone(),
        }
    }
}

/// Derive a display title from an identifier-like key.
///
/// Keys containing whitespace are already titles and are returned as-is.
/// Otherwise camel case and `_`/`-` separators are split into words and each
/// word is capitalized: `CustomStage` → `Custom Stage`,
/// `output_template_rules` → `Output Template Rules`.
pub fn title_from_key(key: &str) -> String {
    static CAMEL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(\p{Ll}|\p{Nd})(\p{Lu})|(\p{Lu})(\p{Lu}\p{Ll})").expect("valid regex")
    });

    if key.chars().any(char::is_whitespace) {
        return key.to_string();
    }

    CAMEL_RE
        .replace_all(key, "$1$3 $2$4")
        .split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    format!("{upper}{}", chars.as_str())
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
