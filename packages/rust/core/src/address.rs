//! Path addressing: resolve a chain of stage references and free-form names
//! into a node of the content tree, creating missing nodes on the way.
//!
//! A [`Segment::Stage`] expands to the stage's lineage, so resolving a deep
//! stage from the document root creates every ancestor. Resolving `A.B`
//! directly and resolving `B` relative to `A` land on the same node.

use indexmap::IndexMap;
use tracing::debug;

use structprompt_shared::{Result, StructPromptError};

use crate::assign::Assignment;
use crate::node::ContentNode;
use crate::stages::{StageId, StageSet};

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A canonical stage from the document's [`StageSet`].
    Stage(StageId),
    /// An ad-hoc section keyed by a free-form name.
    Named(String),
}

impl From<StageId> for Segment {
    fn from(id: StageId) -> Self {
        Self::Stage(id)
    }
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for Segment {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// An ordered chain of segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagePath {
    segments: Vec<Segment>,
}

impl StagePath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment.
    pub fn then(mut self, segment: impl Into<Segment>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Dotted form for messages, e.g. `output.output_template_rules.Extras`.
    pub fn describe(&self, stages: &StageSet) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Stage(id) if stages.contains(*id) => stages.dotted_key(*id),
                Segment::Stage(id) => format!("<unknown stage {id:?}>"),
                Segment::Named(name) => name.clone(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl From<Segment> for StagePath {
    fn from(segment: Segment) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

impl From<StageId> for StagePath {
    fn from(id: StageId) -> Self {
        Segment::from(id).into()
    }
}

impl From<&str> for StagePath {
    fn from(name: &str) -> Self {
        Segment::from(name).into()
    }
}

impl From<String> for StagePath {
    fn from(name: String) -> Self {
        Segment::from(name).into()
    }
}

impl From<Vec<Segment>> for StagePath {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Where resolution starts.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Scope {
    Root,
    Stage(StageId),
    AdHoc,
}

impl Scope {
    pub(crate) fn of(node: &ContentNode) -> Self {
        node.stage.map_or(Self::AdHoc, Self::Stage)
    }
}

/// A single lookup-or-create step over one node map.
#[derive(Debug, Clone, Copy)]
enum Step<'p> {
    Stage(StageId),
    Named(&'p str),
}

/// Expand `path` into concrete steps relative to `scope`.
fn plan<'p>(stages: &StageSet, scope: Scope, path: &'p StagePath) -> Result<Vec<Step<'p>>> {
    let describe = || path.describe(stages);

    if path.is_empty() {
        return Err(StructPromptError::addressing("", "empty path"));
    }

    let mut scope = scope;
    let mut steps = Vec::new();

    for segment in path.segments() {
        match segment {
            Segment::Named(name) => {
                if name.trim().is_empty() {
                    return Err(StructPromptError::addressing(
                        describe(),
                        "section names must not be empty",
                    ));
                }
                steps.push(Step::Named(name));
                scope = Scope::AdHoc;
            }
            Segment::Stage(id) => {
                if !stages.contains(*id) {
                    return Err(StructPromptError::addressing(
                        describe(),
                        "stage does not belong to this document's stage set",
                    ));
                }
                let lineage = stages.lineage(*id);
                let below = match scope {
                    Scope::Root => &lineage[..],
                    Scope::Stage(parent) => match lineage.iter().position(|s| *s == parent) {
                        Some(pos) if pos + 1 < lineage.len() => &lineage[pos + 1..],
                        _ => {
                            return Err(StructPromptError::addressing(
                                describe(),
                                format!(
                                    "stage `{}` is not nested under `{}`",
                                    stages.dotted_key(*id),
                                    stages.dotted_key(parent)
                                ),
                            ));
                        }
                    },
                    Scope::AdHoc => {
                        return Err(StructPromptError::addressing(
                            describe(),
                            format!(
                                "stage `{}` cannot be placed under an ad-hoc section",
                                stages.dotted_key(*id)
                            ),
                        ));
                    }
                };
                steps.extend(below.iter().map(|s| Step::Stage(*s)));
                scope = Scope::Stage(*id);
            }
        }
    }

    Ok(steps)
}

/// Resolve `path` inside `map`, creating missing nodes.
pub(crate) fn resolve_in<'a>(
    stages: &StageSet,
    map: &'a mut IndexMap<String, ContentNode>,
    scope: Scope,
    path: &StagePath,
) -> Result<&'a mut ContentNode> {
    let steps = plan(stages, scope, path)?;
    descend(stages, map, &steps, path)
}

fn descend<'a>(
    stages: &StageSet,
    map: &'a mut IndexMap<String, ContentNode>,
    steps: &[Step<'_>],
    path: &StagePath,
) -> Result<&'a mut ContentNode> {
    let Some((first, rest)) = steps.split_first() else {
        return Err(StructPromptError::addressing(path.describe(stages), "empty path"));
    };

    let node = get_or_create(stages, map, *first, path)?;
    if rest.is_empty() {
        Ok(node)
    } else {
        descend(stages, &mut node.children, rest, path)
    }
}

fn get_or_create<'a>(
    stages: &StageSet,
    map: &'a mut IndexMap<String, ContentNode>,
    step: Step<'_>,
    path: &StagePath,
) -> Result<&'a mut ContentNode> {
    let (key, wanted) = match step {
        Step::Stage(id) => match stages.get(id) {
            Some(descriptor) => (descriptor.key.as_str(), Some(id)),
            None => {
                return Err(StructPromptError::addressing(
                    path.describe(stages),
                    "unknown stage",
                ));
            }
        },
        Step::Named(name) => (name, None),
    };

    if map.get(key).is_some_and(|existing| existing.stage != wanted) {
        let message = match wanted {
            Some(_) => format!("key `{key}` is already used by an ad-hoc section"),
            None => format!("key `{key}` is already used by a canonical stage"),
        };
        return Err(StructPromptError::addressing(path.describe(stages), message));
    }

    let node = map.entry(key.to_string()).or_insert_with(|| {
        let node = match step {
            Step::Stage(id) => stages
                .get(id)
                .map(|d| ContentNode::from_stage(id, d))
                .unwrap_or_else(|| ContentNode::ad_hoc(key)),
            Step::Named(name) => ContentNode::ad_hoc(name),
        };
        debug!(key = %node.key, title = %node.title, "created section");
        node
    });
    Ok(node)
}

/// Resolve `path` inside `map` without creating anything.
pub(crate) fn find_in<'a>(
    stages: &StageSet,
    map: &'a IndexMap<String, ContentNode>,
    scope: Scope,
    path: &StagePath,
) -> Option<&'a ContentNode> {
    let steps = plan(stages, scope, path).ok()?;
    let mut current = map;
    let mut found = None;

    for step in steps {
        let (key, wanted) = match step {
            Step::Stage(id) => (stages.get(id)?.key.as_str(), Some(id)),
            Step::Named(name) => (name, None),
        };
        let node = current.get(key).filter(|n| n.stage == wanted)?;
        current = &node.children;
        found = Some(node);
    }

    found
}

// ---------------------------------------------------------------------------
// SectionHandle
// ---------------------------------------------------------------------------

/// Cursor on a resolved node. Holds the stage set so relative addressing and
/// stage-titled section values keep working below the document root.
#[derive(Debug)]
pub struct SectionHandle<'a> {
    stages: &'a StageSet,
    node: &'a mut ContentNode,
}

impl<'a> SectionHandle<'a> {
    pub(crate) fn new(stages: &'a StageSet, node: &'a mut ContentNode) -> Self {
        Self { stages, node }
    }

    /// Resolve `path` relative to this node, creating missing nodes.
    pub fn section(self, path: impl Into<StagePath>) -> Result<SectionHandle<'a>> {
        let path = path.into();
        let SectionHandle { stages, node } = self;
        let scope = Scope::of(node);
        let child = resolve_in(stages, &mut node.children, scope, &path)?;
        Ok(SectionHandle::new(stages, child))
    }

    /// Assign content to this node (append or replace, by value shape).
    pub fn assign(&mut self, value: impl Into<Assignment>) -> Result<()> {
        value.into().prepare(self.stages)?.apply(self.node);
        Ok(())
    }

    /// Append a critical step to this node.
    pub fn add_critical_step(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> &mut Self {
        self.node.add_critical_step(title, body);
        self
    }

    pub fn node(&self) -> &ContentNode {
        self.node
    }
}
