//! Text renderer.
//!
//! Walks a finished [`PromptDocument`] and produces the prompt text:
//!
//! ```text
//! **<role>**
//!
//! <prologue>
//!
//! !!! MANDATORY STEP [<title>] !!!
//! <body>
//! !!! END MANDATORY STEP !!!
//!
//! 1. <title> — <subtitle>
//!   <critical steps, items, children at depth 1>
//! ```
//!
//! Bullet choice for a node's entries at depth `d`:
//! - `Suppressed`: no glyph, continuation lines align under the text;
//! - `Forced(style)`: `style` on every entry;
//! - `Unset`/`Progression`: the depth style on every entry when there are two
//!   or more, otherwise no glyph but continuation lines still hang as if the
//!   glyph were there.

use tracing::instrument;

use structprompt_shared::IndentationPreferences;

use crate::document::PromptDocument;
use crate::node::{BulletDirective, ContentNode, CriticalStep, Item};

/// Render `doc` to a single string with no trailing newline.
#[instrument(skip_all, fields(sections = doc.top_level().count()))]
pub fn render_document(doc: &PromptDocument) -> String {
    let prefs = doc.prefs();
    let mut out = Renderer::new(prefs);

    if let Some(role) = doc.role().map(str::trim).filter(|r| !r.is_empty()) {
        out.push(format!("**{role}**"));
        out.blank();
    }
    if let Some(prologue) = doc.prologue().filter(|p| !p.trim().is_empty()) {
        out.block("", None, 0, prologue);
        out.blank();
    }
    for step in doc.critical_steps() {
        out.critical_step("", step);
        out.blank();
    }

    let order = doc.ordered_sections();
    let style = prefs.style_for_depth(0);
    for (i, node) in order.sections.iter().enumerate() {
        if i > 0 && prefs.blank_line_between_top {
            out.blank();
        }
        let glyph = style.glyph(i + 1);
        let hang = width(&glyph) + 1;
        out.block("", Some(&glyph), hang, &node.heading());
        out.body(node, 1);
    }

    out.finish()
}

/// An entry of a node's rendered list.
enum Entry<'n> {
    Text(&'n str),
    Section(&'n ContentNode),
}

struct Renderer<'p> {
    prefs: &'p IndentationPreferences,
    lines: Vec<String>,
}

impl<'p> Renderer<'p> {
    fn new(prefs: &'p IndentationPreferences) -> Self {
        Self {
            prefs,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, line: String) {
        self.lines.push(line.trim_end().to_string());
    }

    /// At most one blank line in a row, never a leading one.
    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| !l.is_empty()) {
            self.lines.push(String::new());
        }
    }

    /// Emit `text` with an optional glyph. Lines after the first are indented
    /// by `hang` past `indent`.
    fn block(&mut self, indent: &str, glyph: Option<&str>, hang: usize, text: &str) {
        let lead = glyph.map(|g| format!("{g} ")).unwrap_or_default();
        let continuation = format!("{indent}{}", " ".repeat(hang));

        let mut lines = text.lines();
        let first = lines.next().unwrap_or_default();
        self.push(format!("{indent}{lead}{first}"));

        for line in lines {
            if line.trim().is_empty() {
                self.lines.push(String::new());
            } else {
                self.push(format!("{continuation}{line}"));
            }
        }
    }

    fn critical_step(&mut self, indent: &str, step: &CriticalStep) {
        self.push(format!("{indent}!!! MANDATORY STEP [{}] !!!", step.title));
        for line in step.body.lines() {
            if line.trim().is_empty() {
                self.lines.push(String::new());
            } else {
                self.push(format!("{indent}{line}"));
            }
        }
        self.push(format!("{indent}!!! END MANDATORY STEP !!!"));
    }

    /// Critical steps, items, then addressed children of `node`, at `depth`.
    fn body(&mut self, node: &ContentNode, depth: usize) {
        let indent = self.prefs.indent(depth);

        for step in node.critical_steps() {
            self.critical_step(&indent, step);
        }

        let entries: Vec<Entry<'_>> = node
            .items()
            .iter()
            .map(|item| match item {
                Item::Text(text) => Entry::Text(text),
                Item::Section(section) => Entry::Section(section),
            })
            .chain(
                node.children()
                    .filter(|c| c.has_content())
                    .map(Entry::Section),
            )
            .collect();

        let count = entries.len();
        let depth_style = self.prefs.style_for_depth(depth);

        for (i, entry) in entries.into_iter().enumerate() {
            let (glyph, hang) = match node.bullet() {
                BulletDirective::Suppressed => (None, 0),
                BulletDirective::Forced(style) => {
                    let glyph = style.glyph(i + 1);
                    let hang = width(&glyph) + 1;
                    (Some(glyph), hang)
                }
                BulletDirective::Unset | BulletDirective::Progression => {
                    let glyph = depth_style.glyph(i + 1);
                    let hang = width(&glyph) + 1;
                    if count == 1 {
                        (None, hang)
                    } else {
                        (Some(glyph), hang)
                    }
                }
            };

            match entry {
                Entry::Text(text) => self.block(&indent, glyph.as_deref(), hang, text),
                Entry::Section(section) => {
                    self.block(&indent, glyph.as_deref(), hang, &section.heading());
                    self.body(section, depth + 1);
                }
            }
        }
    }

    fn finish(mut self) -> String {
        while self.lines.last().is_some_and(String::is_empty) {
            self.lines.pop();
        }
        self.lines.join("\n")
    }
}

fn width(glyph: &str) -> usize {
    glyph.chars().count()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use structprompt_shared::BulletStyle;

    use super::*;
    use crate::assign::Section;
    use crate::stages::StageSet;

    fn doc() -> PromptDocument {
        PromptDocument::new(Arc::new(StageSet::empty()))
    }

    #[test]
    fn empty_document_renders_nothing() {
        assert_eq!(doc().render(), "");
    }

    #[test]
    fn header_order_role_prologue_steps() {
        let mut d = doc();
        d.set_role("Senior Engineer")
            .set_prologue("Test Prologue")
            .add_critical_step("VERIFY", "Always verify assumptions");
        d.assign("Objective", ["Complete the task"]).unwrap();

        assert_eq!(
            d.render(),
            "**Senior Engineer**\n\
             \n\
             Test Prologue\n\
             \n\
             !!! MANDATORY STEP [VERIFY] !!!\n\
             Always verify assumptions\n\
             !!! END MANDATORY STEP !!!\n\
             \n\
             1. Objective\n  Complete the task"
        );
    }

    #[test]
    fn single_item_has_no_glyph_two_items_both_get_one() {
        let mut d = doc();
        d.assign("Planning", ["Initial step"]).unwrap();
        assert_eq!(d.render(), "1. Planning\n  Initial step");

        d.assign("Planning", ["Second step"]).unwrap();
        assert_eq!(d.render(), "1. Planning\n  - Initial step\n  - Second step");
    }

    #[test]
    fn single_item_continuation_hangs_past_the_missing_glyph() {
        let mut d = doc();
        d.assign("Output", "first line\nsecond line\n\nafter blank")
            .unwrap();
        assert_eq!(
            d.render(),
            "1. Output\n  first line\n    second line\n\n    after blank"
        );
    }

    #[test]
    fn multi_line_items_align_under_text() {
        let mut d = doc();
        d.assign("Output", ["one\ncontinued", "two"]).unwrap();
        assert_eq!(
            d.render(),
            "1. Output\n  - one\n    continued\n  - two"
        );
    }

    #[test]
    fn suppressed_bullets_keep_indentation() {
        let mut d = doc();
        d.assign(
            "Tool Reference",
            Section::untitled()
                .no_bullets()
                .subtitle("RULE: [name|purpose]")
                .items(["[tracing|rca]", "[metrics|scale]\nsecond line"]),
        )
        .unwrap();
        assert_eq!(
            d.render(),
            "1. Tool Reference — RULE: [name|purpose]\n  [tracing|rca]\n  [metrics|scale]\n  second line"
        );
    }

    #[test]
    fn forced_style_applies_even_to_one_item() {
        let mut d = doc();
        d.assign(
            "Steps",
            Section::untitled().bullet_style(BulletStyle::LowerAlpha).item("only"),
        )
        .unwrap();
        d.assign("More", Section::untitled().bullet_style(BulletStyle::Decimal).items(["x", "y\nz"]))
            .unwrap();
        assert_eq!(
            d.render(),
            "1. Steps\n  a. only\n\n2. More\n  1. x\n  2. y\n     z"
        );
    }

    #[test]
    fn nested_sections_follow_the_progression() {
        let mut d = doc();
        d.assign(
            "Planning",
            vec![
                Section::new("Single Item Section").item("Only one item"),
                Section::new("Multi Item Section").items(["Item A", "Item B"]),
            ],
        )
        .unwrap();
        assert_eq!(
            d.render(),
            "1. Planning\n\
             \x20\x20- Single Item Section\n\
             \x20\x20\x20\x20Only one item\n\
             \x20\x20- Multi Item Section\n\
             \x20\x20\x20\x20* Item A\n\
             \x20\x20\x20\x20* Item B"
        );
    }

    #[test]
    fn custom_preferences() {
        let prefs = IndentationPreferences {
            spaces_per_level: 4,
            progression: vec![BulletStyle::LowerAlpha, BulletStyle::Dash, BulletStyle::Star],
            ..Default::default()
        };
        let mut d = doc().with_prefs(prefs);
        d.assign(
            "Output",
            vec![
                crate::ItemValue::from("Main output rule"),
                Section::new("Template").items(["Section 1", "Section 2"]).into(),
            ],
        )
        .unwrap();
        d.assign("Notes", ["n"]).unwrap();

        assert_eq!(
            d.render(),
            "a. Output\n    - Main output rule\n    - Template\n        * Section 1\n        * Section 2\n\nb. Notes\n    n"
        );
    }

    #[test]
    fn deep_progression_reuses_last_style() {
        let mut d = doc();
        d.assign(
            "Top",
            vec![
                Section::new("L1").items([
                    crate::ItemValue::from(Section::new("L2").items(["a", "b"])),
                    "c".into(),
                ]),
                Section::new("Other").item("d"),
            ],
        )
        .unwrap();
        assert_eq!(
            d.render(),
            "1. Top\n  - L1\n    * L2\n      * a\n      * b\n    * c\n  - Other\n    d"
        );
    }

    #[test]
    fn blank_line_between_top_is_optional() {
        let mut d = doc();
        d.prefs_mut().blank_line_between_top = false;
        d.assign("A", "a").unwrap();
        d.assign("B", "b").unwrap();
        assert_eq!(d.render(), "1. A\n  a\n2. B\n  b");
    }

    #[test]
    fn section_critical_steps_precede_items() {
        let mut d = doc();
        d.section("Scoping")
            .unwrap()
            .add_critical_step("SCOPE SUPREMACY", "Investigate ONLY those.");
        d.assign("Scoping", "Record incident summary.").unwrap();
        assert_eq!(
            d.render(),
            "1. Scoping\n\
             \x20\x20!!! MANDATORY STEP [SCOPE SUPREMACY] !!!\n\
             \x20\x20Investigate ONLY those.\n\
             \x20\x20!!! END MANDATORY STEP !!!\n\
             \x20\x20Record incident summary."
        );
    }

    #[test]
    fn empty_sections_are_skipped_at_every_depth() {
        let mut d = doc();
        d.section("Ghost").unwrap();
        d.section(crate::StagePath::from("Real").then("Empty child")).unwrap();
        d.assign("Real", "content").unwrap();
        assert_eq!(d.render(), "1. Real\n  content");
    }

    #[test]
    fn explicit_section_titles_render_as_written() {
        let mut d = doc();
        d.assign("X", Section::new("Follow-up").item("a")).unwrap();
        d.assign("Y", ("iOS", vec!["b"])).unwrap();
        assert_eq!(d.render(), "1. Follow-up\n  a\n\n2. iOS\n  b");
    }

    #[test]
    fn rendering_is_repeatable() {
        let mut d = doc();
        d.assign("A", ["x", "y"]).unwrap();
        assert_eq!(d.render(), d.render());
    }
}
