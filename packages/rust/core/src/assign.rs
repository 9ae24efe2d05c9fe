//! Assignment engine: what happens when content is assigned to a node.
//!
//! The accepted value shapes are the arms of [`Assignment`]:
//! - text and item sequences **append** to the node's items;
//! - a [`Section`] value **replaces** title, subtitle, bullet directive and
//!   items, leaving addressed children and critical steps alone;
//! - `(title, items)` / `(title, items, subtitle)` tuples are section values.
//!
//! Values are validated and converted before the target node is touched, so a
//! rejected assignment leaves the tree unchanged.

use serde_json::{Map, Value};
use tracing::debug;

use structprompt_shared::{BulletStyle, Result, StructPromptError};

use crate::node::{BulletDirective, ContentNode, CriticalStep, Item};
use crate::stages::{StageId, StageSet};

/// An explicit text item. Equivalent to assigning the bare string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptText(pub String);

impl PromptText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl From<&str> for PromptText {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl From<String> for PromptText {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Title carried by a section value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SectionTitle {
    /// Keep the target's current title. Not allowed for inline sections.
    #[default]
    Keep,
    Literal(String),
    /// Use a stage's display name.
    Stage(StageId),
}

/// A section value: a self-contained block of title, directive and items.
#[derive(Debug, Clone, Default)]
pub struct Section {
    pub title: SectionTitle,
    pub subtitle: Option<String>,
    pub bullet: BulletDirective,
    pub items: Vec<ItemValue>,
    pub critical_steps: Vec<CriticalStep>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: SectionTitle::Literal(title.into()),
            ..Self::default()
        }
    }

    /// A section that keeps the title of the node it is assigned to.
    pub fn untitled() -> Self {
        Self::default()
    }

    /// A section titled with the display name of `stage`.
    pub fn for_stage(stage: StageId) -> Self {
        Self {
            title: SectionTitle::Stage(stage),
            ..Self::default()
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn bullet(mut self, bullet: BulletDirective) -> Self {
        self.bullet = bullet;
        self
    }

    /// Suppress glyphs for this section's items.
    pub fn no_bullets(self) -> Self {
        self.bullet(BulletDirective::Suppressed)
    }

    /// Force one glyph style for every item.
    pub fn bullet_style(self, style: BulletStyle) -> Self {
        self.bullet(BulletDirective::Forced(style))
    }

    pub fn item(mut self, item: impl Into<ItemValue>) -> Self {
        self.items.push(item.into());
        self
    }

    pub fn items<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemValue>,
    {
        self.items.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn critical_step(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.critical_steps.push(CriticalStep::new(title, body));
        self
    }
}

/// One element of an assigned sequence.
#[derive(Debug, Clone)]
pub enum ItemValue {
    Text(String),
    Section(Section),
}

impl From<&str> for ItemValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ItemValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<PromptText> for ItemValue {
    fn from(text: PromptText) -> Self {
        Self::Text(text.0)
    }
}

impl From<Section> for ItemValue {
    fn from(section: Section) -> Self {
        Self::Section(section)
    }
}

/// A value assigned to an addressed node.
#[derive(Debug, Clone)]
pub enum Assignment {
    /// Append one text item.
    Text(String),
    /// Append each element in order.
    Items(Vec<ItemValue>),
    /// Replace the node's own content.
    Section(Section),
}

impl From<&str> for Assignment {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Assignment {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<PromptText> for Assignment {
    fn from(text: PromptText) -> Self {
        Self::Text(text.0)
    }
}

impl From<Section> for Assignment {
    fn from(section: Section) -> Self {
        Self::Section(section)
    }
}

impl<T: Into<ItemValue>> From<Vec<T>> for Assignment {
    fn from(items: Vec<T>) -> Self {
        Self::Items(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ItemValue>, const N: usize> From<[T; N]> for Assignment {
    fn from(items: [T; N]) -> Self {
        Self::Items(items.into_iter().map(Into::into).collect())
    }
}

impl<A, I> From<(A, Vec<I>)> for Assignment
where
    A: Into<String>,
    I: Into<ItemValue>,
{
    fn from((title, items): (A, Vec<I>)) -> Self {
        Self::Section(Section::new(title).items(items))
    }
}

impl<A, I, S> From<(A, Vec<I>, S)> for Assignment
where
    A: Into<String>,
    I: Into<ItemValue>,
    S: Into<String>,
{
    fn from((title, items, subtitle): (A, Vec<I>, S)) -> Self {
        Self::Section(Section::new(title).items(items).subtitle(subtitle))
    }
}

// ---------------------------------------------------------------------------
// Dynamic values (prompt definition files)
// ---------------------------------------------------------------------------

const SECTION_KEYS: [&str; 5] = ["title", "subtitle", "bullet", "items", "critical_steps"];

impl TryFrom<Value> for Assignment {
    type Error = StructPromptError;

    /// Strings append, arrays append (or form a `[title, items, subtitle?]`
    /// shorthand), tables are section values. Anything else is rejected.
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(Self::Text(text)),
            Value::Array(values) if is_shorthand(&values) => {
                Ok(Self::Section(section_from_shorthand(values)?))
            }
            Value::Array(values) => Ok(Self::Items(
                values
                    .into_iter()
                    .map(item_from_value)
                    .collect::<Result<Vec<_>>>()?,
            )),
            Value::Object(map) => Ok(Self::Section(section_from_object(map)?)),
            other => Err(StructPromptError::invalid_assignment(format!(
                "unsupported value `{other}`: expected text, a list of items, or a section table"
            ))),
        }
    }
}

fn is_shorthand(values: &[Value]) -> bool {
    matches!(
        values,
        [Value::String(_), Value::Array(_)] | [Value::String(_), Value::Array(_), Value::String(_)]
    )
}

fn section_from_shorthand(values: Vec<Value>) -> Result<Section> {
    let mut parts = values.into_iter();
    let (Some(Value::String(title)), Some(Value::Array(items))) = (parts.next(), parts.next())
    else {
        return Err(StructPromptError::invalid_assignment(
            "shorthand sections are [title, items] or [title, items, subtitle]",
        ));
    };

    let mut section = Section::new(title);
    for item in items {
        section.items.push(item_from_value(item)?);
    }
    if let Some(Value::String(subtitle)) = parts.next() {
        section.subtitle = Some(subtitle);
    }
    Ok(section)
}

fn item_from_value(value: Value) -> Result<ItemValue> {
    match value {
        Value::String(text) => Ok(ItemValue::Text(text)),
        Value::Object(map) => Ok(ItemValue::Section(section_from_object(map)?)),
        Value::Array(values) if is_shorthand(&values) => {
            Ok(ItemValue::Section(section_from_shorthand(values)?))
        }
        Value::Array(values) => Err(StructPromptError::invalid_assignment(format!(
            "a nested list of {} element(s) is neither an item nor a [title, items, subtitle?] section",
            values.len()
        ))),
        other => Err(StructPromptError::invalid_assignment(format!(
            "unsupported item `{other}`: expected text or a section"
        ))),
    }
}

fn section_from_object(map: Map<String, Value>) -> Result<Section> {
    if let Some(unknown) = map.keys().find(|k| !SECTION_KEYS.contains(&k.as_str())) {
        return Err(StructPromptError::invalid_assignment(format!(
            "unknown section field `{unknown}` (expected one of {})",
            SECTION_KEYS.join(", ")
        )));
    }
    if !["title", "subtitle", "bullet", "items"]
        .iter()
        .any(|k| map.contains_key(*k))
    {
        return Err(StructPromptError::invalid_assignment(
            "a section table needs at least one of title, subtitle, bullet, items",
        ));
    }

    let mut section = Section::default();

    for (field, value) in map {
        match (field.as_str(), value) {
            ("title", Value::String(title)) => section.title = SectionTitle::Literal(title),
            ("subtitle", Value::String(subtitle)) => section.subtitle = Some(subtitle),
            ("subtitle", Value::Null) => section.subtitle = None,
            ("bullet", Value::Null) => section.bullet = BulletDirective::Suppressed,
            ("bullet", Value::String(style)) => {
                section.bullet = style
                    .parse()
                    .map_err(|e| StructPromptError::invalid_assignment(format!("bullet: {e}")))?;
            }
            ("items", Value::String(text)) => section.items = vec![ItemValue::Text(text)],
            ("items", Value::Array(items)) => {
                section.items = items
                    .into_iter()
                    .map(item_from_value)
                    .collect::<Result<Vec<_>>>()?;
            }
            ("critical_steps", steps @ Value::Array(_)) => {
                section.critical_steps = serde_json::from_value(steps).map_err(|e| {
                    StructPromptError::invalid_assignment(format!("critical_steps: {e}"))
                })?;
            }
            (field, other) => {
                return Err(StructPromptError::invalid_assignment(format!(
                    "section field `{field}` cannot be `{other}`"
                )));
            }
        }
    }

    Ok(section)
}

// ---------------------------------------------------------------------------
// Applying
// ---------------------------------------------------------------------------

/// An assignment checked against the stage set and converted to tree items.
#[derive(Debug)]
pub(crate) enum Prepared {
    Append(Vec<Item>),
    Replace {
        title: Option<String>,
        subtitle: Option<String>,
        bullet: BulletDirective,
        items: Vec<Item>,
        critical_steps: Vec<CriticalStep>,
    },
}

impl Assignment {
    pub(crate) fn prepare(self, stages: &StageSet) -> Result<Prepared> {
        match self {
            Self::Text(text) => Ok(Prepared::Append(vec![Item::Text(text)])),
            Self::Items(values) => Ok(Prepared::Append(
                values
                    .into_iter()
                    .map(|v| to_item(v, stages))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Self::Section(section) => {
                check_bullet(&section.bullet)?;
                Ok(Prepared::Replace {
                    title: resolve_title(&section.title, stages)?,
                    subtitle: section.subtitle,
                    bullet: section.bullet,
                    items: section
                        .items
                        .into_iter()
                        .map(|v| to_item(v, stages))
                        .collect::<Result<Vec<_>>>()?,
                    critical_steps: section.critical_steps,
                })
            }
        }
    }
}

impl Prepared {
    pub(crate) fn apply(self, node: &mut ContentNode) {
        match self {
            Self::Append(items) => {
                let appended = items.len();
                node.items.extend(items);
                debug!(key = %node.key, appended, total = node.items.len(), "appended items");
            }
            Self::Replace {
                title,
                subtitle,
                bullet,
                items,
                critical_steps,
            } => {
                if let Some(title) = title {
                    node.title = title;
                }
                node.subtitle = subtitle;
                node.bullet = bullet;
                node.items = items;
                node.critical_steps.extend(critical_steps);
                debug!(key = %node.key, items = node.items.len(), "replaced section content");
            }
        }
    }
}

fn resolve_title(title: &SectionTitle, stages: &StageSet) -> Result<Option<String>> {
    match title {
        SectionTitle::Keep => Ok(None),
        SectionTitle::Literal(text) if text.trim().is_empty() => Err(
            StructPromptError::invalid_assignment("section titles must not be empty"),
        ),
        SectionTitle::Literal(text) => Ok(Some(text.clone())),
        SectionTitle::Stage(id) => stages
            .get(*id)
            .map(|d| Some(d.display_name.clone()))
            .ok_or_else(|| {
                StructPromptError::invalid_assignment(
                    "section titled by a stage that is not in this document's stage set",
                )
            }),
    }
}

fn check_bullet(bullet: &BulletDirective) -> Result<()> {
    match bullet {
        BulletDirective::Forced(BulletStyle::Symbol(symbol)) if symbol.trim().is_empty() => Err(
            StructPromptError::invalid_assignment("forced bullet symbol must not be empty"),
        ),
        _ => Ok(()),
    }
}

fn to_item(value: ItemValue, stages: &StageSet) -> Result<Item> {
    match value {
        ItemValue::Text(text) => Ok(Item::Text(text)),
        ItemValue::Section(section) => {
            let title = resolve_title(&section.title, stages)?.ok_or_else(|| {
                StructPromptError::invalid_assignment("nested sections need a title")
            })?;
            check_bullet(&section.bullet)?;

            let mut node = ContentNode::inline(title);
            node.subtitle = section.subtitle;
            node.bullet = section.bullet;
            node.critical_steps = section.critical_steps;
            node.items = section
                .items
                .into_iter()
                .map(|v| to_item(v, stages))
                .collect::<Result<Vec<_>>>()?;
            Ok(Item::Section(node))
        }
    }
}
