use std::path::PathBuf;
use std::sync::Arc;

use structprompt_core::{
    Assignment, ConflictReason, PromptDefinition, PromptDocument, Section, Segment, StageId,
    StagePath, StageSet,
};
use structprompt_shared::{BulletStyle, IndentationPreferences, StructPromptError};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../../fixtures")
        .join(name)
}

fn fixture_stages() -> Arc<StageSet> {
    Arc::new(StageSet::load_from(&fixture("stages.toml")).expect("load stages fixture"))
}

fn stage(stages: &StageSet, dotted: &str) -> StageId {
    stages.require(dotted).expect("stage exists in fixture")
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn objective_and_planning_with_default_preferences() {
    let mut doc = PromptDocument::ad_hoc();
    doc.assign("Objective", ["Goal A"]).unwrap();
    doc.assign("Planning", ["Step 1", "Step 2"]).unwrap();

    assert_eq!(
        doc.render(),
        "1. Objective\n  Goal A\n\n2. Planning\n  - Step 1\n  - Step 2"
    );
}

#[test]
fn fixture_prompt_renders_expected_text() {
    let def = PromptDefinition::load_from(&fixture("prompt.toml")).unwrap();
    let doc = def
        .build(fixture_stages(), IndentationPreferences::default())
        .unwrap();

    let expected = "\
**Senior SRE**

K8s Resolver Prompt

!!! MANDATORY STEP [VERIFY] !!!
Always verify assumptions against live data.
!!! END MANDATORY STEP !!!

1. Planning
  - Plan step A
  - Plan step B

2. Scoping
  !!! MANDATORY STEP [SCOPE SUPREMACY] !!!
  Investigate ONLY the services named in the objective.
  !!! END MANDATORY STEP !!!
  Record incident summary and objective.

3. Output
  Output Template Rules
    * Always use Markdown.
    * Cite evidence for every claim.

4. Tool Reference — RULE: [tool|purpose|inputs|order]
  [tracing|service-level RCA|objective,scope|MUST_RUN_FIRST]
  [metrics|scale & correlation|objective,scope|RUN_AFTER_TRACING]";

    assert_eq!(doc.render(), expected);
}

// ============================================================================
// Assignment semantics
// ============================================================================

#[test]
fn lists_append_and_sections_replace() {
    let stages = fixture_stages();
    let adaptive = stage(&stages, "adaptive_execution");
    let rule = stage(&stages, "adaptive_execution.adaptive_execution_rule");
    let mut doc = PromptDocument::new(stages);

    doc.assign(
        adaptive,
        vec![
            Section::for_stage(rule)
                .subtitle("Follow your planned steps in order, but you MAY:")
                .items(["Insert new tool calls.", "Skip planned tool calls."]),
        ],
    )
    .unwrap();
    doc.assign(adaptive, ["Do not repeat steps already done."])
        .unwrap();

    let rendered = doc.render();
    assert!(rendered.starts_with("1. Adaptive Execution\n"));
    assert!(rendered.contains(
        "  - Adaptive Execution Rule — Follow your planned steps in order, but you MAY:"
    ));
    assert!(rendered.contains("  - Do not repeat steps already done."));

    doc.assign(
        adaptive,
        Section::for_stage(adaptive).items(["Only this remains."]),
    )
    .unwrap();
    assert_eq!(
        doc.render(),
        "1. Adaptive Execution\n  Only this remains."
    );
}

#[test]
fn replacing_a_section_keeps_addressed_children() {
    let stages = fixture_stages();
    let output = stage(&stages, "output");
    let rules = stage(&stages, "output.output_template_rules");
    let mut doc = PromptDocument::new(stages);

    doc.assign(rules, "Always use Markdown.").unwrap();
    doc.assign(
        output,
        Section::new("Output (Strict)").item("Respond with one report."),
    )
    .unwrap();

    assert_eq!(
        doc.render(),
        "1. Output (Strict)\n  - Respond with one report.\n  - Output Template Rules\n    Always use Markdown."
    );
}

#[test]
fn tuple_shorthand_builds_a_section() {
    let mut doc = PromptDocument::ad_hoc();
    doc.assign(
        "Quality Gates",
        ("Quality Gates (Thoroughness & Clarity)", vec!["Gate A", "Gate B"]),
    )
    .unwrap();
    assert_eq!(
        doc.render(),
        "1. Quality Gates (Thoroughness & Clarity)\n  - Gate A\n  - Gate B"
    );
}

#[test]
fn invalid_json_values_leave_the_tree_untouched() {
    let mut doc = PromptDocument::ad_hoc();
    let value = serde_json::json!(42);
    let err = Assignment::try_from(value).unwrap_err();
    assert!(matches!(err, StructPromptError::InvalidAssignment { .. }));
    assert_eq!(doc.render(), "");

    let err = doc
        .assign("Output", Section::untitled().item(Section::untitled()))
        .unwrap_err();
    assert!(matches!(err, StructPromptError::InvalidAssignment { .. }));
    assert!(doc.get("Output").is_none());
}

// ============================================================================
// Addressing
// ============================================================================

#[test]
fn leaf_stage_and_explicit_path_are_equivalent() {
    let stages = fixture_stages();
    let output = stage(&stages, "output");
    let rules = stage(&stages, "output.output_template_rules");
    let mut doc = PromptDocument::new(stages);

    doc.assign(rules, ["one"]).unwrap();
    doc.assign(vec![Segment::from(output), Segment::from(rules)], ["two"])
        .unwrap();
    doc.section(output)
        .unwrap()
        .section(rules)
        .unwrap()
        .assign(["three"])
        .unwrap();

    assert_eq!(doc.get(rules).unwrap().texts(), vec!["one", "two", "three"]);
    assert_eq!(doc.top_level().count(), 1);
}

#[test]
fn three_level_stage_resolves_to_one_node_every_way() {
    let stages = fixture_stages();
    let output = stage(&stages, "output");
    let rules = stage(&stages, "output.output_template_rules");
    let formatting = stage(&stages, "output.output_template_rules.formatting");
    let mut doc = PromptDocument::new(stages);

    doc.assign(formatting, "direct").unwrap();
    doc.section(output)
        .unwrap()
        .section(rules)
        .unwrap()
        .section(formatting)
        .unwrap()
        .assign("step by step")
        .unwrap();
    doc.section(output)
        .unwrap()
        .section(formatting)
        .unwrap()
        .assign("skipping a level")
        .unwrap();
    doc.assign(
        vec![
            Segment::from(output),
            Segment::from(rules),
            Segment::from(formatting),
        ],
        "full path",
    )
    .unwrap();

    let node = doc.get(formatting).unwrap();
    assert_eq!(
        node.texts(),
        vec!["direct", "step by step", "skipping a level", "full path"]
    );
    assert!(std::ptr::eq(
        node,
        doc.get(vec![Segment::from(output), Segment::from(formatting)])
            .unwrap()
    ));

    assert_eq!(doc.top_level().count(), 1);
    let parent = doc.get(rules).unwrap();
    assert_eq!(parent.children().count(), 1);
    assert!(parent.texts().is_empty());
}

#[test]
fn stage_from_another_set_is_rejected() {
    let mut a = StageSet::builder();
    let output = a.stage("output", "Output");
    let rules = a.child(output, "rules", "Rules");
    a.build().unwrap();

    let mut b = StageSet::builder();
    b.stage("planning", "Planning");
    b.stage("scoping", "Scoping");
    let mut doc = PromptDocument::new(Arc::new(b.build().unwrap()));

    let err = doc.assign(rules, "foreign content").unwrap_err();
    assert!(matches!(err, StructPromptError::Addressing { .. }));
    assert_eq!(doc.render(), "");
}

#[test]
fn ad_hoc_keys_cannot_shadow_canonical_stages() {
    let stages = fixture_stages();
    let planning = stage(&stages, "planning");
    let mut doc = PromptDocument::new(stages);
    doc.assign(planning, "Plan").unwrap();

    let err = doc.assign("planning", "shadow").unwrap_err();
    assert!(matches!(err, StructPromptError::Addressing { .. }));
}

#[test]
fn stage_outside_parent_is_rejected() {
    let stages = fixture_stages();
    let planning = stage(&stages, "planning");
    let rules = stage(&stages, "output.output_template_rules");
    let mut doc = PromptDocument::new(stages);

    let err = doc
        .section(planning)
        .unwrap()
        .section(rules)
        .unwrap_err();
    assert!(err.to_string().contains("not nested under"));
}

#[test]
fn ad_hoc_children_get_humanized_titles() {
    let stages = fixture_stages();
    let output = stage(&stages, "output");
    let mut doc = PromptDocument::new(stages);
    let path = StagePath::from(output).then("CustomStage");
    doc.assign(path.clone(), "Custom content").unwrap();

    let node = doc.get(path).unwrap();
    assert_eq!(node.key(), "CustomStage");
    assert_eq!(node.title(), "Custom Stage");
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn fixed_order_holds_regardless_of_assignment_time() {
    let stages = fixture_stages();
    let ids = ["planning", "quality_gates", "tool_reference", "scoping"].map(|k| stage(&stages, k));
    let mut doc = PromptDocument::new(stages);

    doc.assign(ids[0], ["Plan step A"]).unwrap();
    doc.assign(ids[1], ["Gate A"]).unwrap();
    doc.assign(ids[2], ["[tracing|...]", "[metrics|...]", "[infra|...]"])
        .unwrap();
    doc.assign(ids[3], ["Define scope"]).unwrap();

    let headings: Vec<_> = doc
        .render()
        .lines()
        .filter(|l| !l.starts_with(' ') && !l.is_empty())
        .map(str::to_string)
        .collect();
    assert_eq!(
        headings,
        vec!["1. Planning", "2. Quality Gates", "3. Scoping", "4. Tool Reference"]
    );
    assert!(doc.ordered_sections().conflicts.is_empty());
}

#[test]
fn fixed_index_past_the_end_is_clamped_and_reported() {
    let stages = fixture_stages();
    let tools = stage(&stages, "tool_reference");
    let planning = stage(&stages, "planning");
    let mut doc = PromptDocument::new(stages);

    doc.assign(tools, "[tracing|...]").unwrap();
    doc.assign(planning, "Plan").unwrap();

    let order = doc.ordered_sections();
    let keys: Vec<_> = order.sections.iter().map(|n| n.key()).collect();
    assert_eq!(keys, vec!["planning", "tool_reference"]);
    assert_eq!(order.conflicts.len(), 1);
    assert_eq!(order.conflicts[0].reason, ConflictReason::OutOfRange);
    assert_eq!(order.conflicts[0].placed, 1);
}

#[test]
fn empty_sections_do_not_take_a_number() {
    let stages = fixture_stages();
    let objective = stage(&stages, "objective");
    let mut doc = PromptDocument::new(stages);
    doc.section(objective).unwrap();
    doc.assign("Notes", "Only this.").unwrap();

    assert_eq!(doc.render(), "1. Notes\n  Only this.");
}

// ============================================================================
// Preferences
// ============================================================================

#[test]
fn custom_progression_and_spacing() {
    let prefs = IndentationPreferences {
        spaces_per_level: 4,
        progression: vec![BulletStyle::UpperRoman, BulletStyle::Plus],
        blank_line_between_top: false,
        ..Default::default()
    };
    let mut doc = PromptDocument::ad_hoc().with_prefs(prefs);
    doc.assign("First", ["a", "b"]).unwrap();
    doc.assign("Second", "c").unwrap();

    assert_eq!(
        doc.render(),
        "I. First\n    + a\n    + b\nII. Second\n    c"
    );
}

#[test]
fn prologue_only_document() {
    let mut doc = PromptDocument::ad_hoc();
    doc.set_prologue("Test Prologue");
    assert_eq!(doc.render(), "Test Prologue");
}
