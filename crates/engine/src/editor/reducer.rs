//! Pure reducer applying [`EditOperation`]s to an [`EditorState`].
//!
//! Every operation works on a clone of the incoming revision. A rejected operation
//! drops the clone, so the caller's revision is never partially modified.

use arazzo_types::{Step, Workflow};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::{
    config::EngineConfig,
    editor::{
        operation::{EditOperation, StepPatch},
        selection::Selection,
        state::{EditOutcome, EditorState},
        workflows,
    },
    error::{DanglingReference, EditError, IdentifierKind},
    expressions::{rewrite_step_expressions, rewrite_text},
    workflow::{
        actions::{collapse, goto_action, inline_actions, local_target, remove_goto_targeting, remove_targeting, retarget, splice_insert},
        integrity::step_expression_references,
        steps::StepCollection,
    },
};

type Warnings = Vec<DanglingReference>;

/// Applies `operation` with the default engine configuration.
pub fn apply(state: &EditorState, operation: EditOperation) -> Result<EditOutcome, EditError> {
    apply_with(&EngineConfig::default(), state, operation)
}

/// Applies `operation` to a copy of `state` and returns the next revision.
pub fn apply_with(config: &EngineConfig, state: &EditorState, operation: EditOperation) -> Result<EditOutcome, EditError> {
    let operation_name = operation.name();
    debug!(
        operation = operation_name,
        workflow = state.active_workflow_id().unwrap_or("<none>"),
        "applying edit operation"
    );

    let mut next = state.clone();
    let warnings = reduce(config, &mut next, operation).inspect_err(|error| {
        warn!(operation = operation_name, error = %error, "edit operation rejected");
    })?;

    for warning in &warnings {
        warn!(operation = operation_name, warning = %warning, "edit left a dangling reference");
    }

    let changed = next != *state;
    Ok(EditOutcome {
        state: next,
        warnings,
        changed,
    })
}

fn reduce(config: &EngineConfig, state: &mut EditorState, operation: EditOperation) -> Result<Warnings, EditError> {
    match operation {
        EditOperation::LoadDocument(document) => workflows::load_document(state, document),
        EditOperation::AddStep(step) => add_step(config, state, step),
        EditOperation::DeleteStep { step_id } => delete_step(state, &step_id),
        EditOperation::RenameStep { old_id, new_id } => rename_step(state, &old_id, &new_id),
        EditOperation::UpdateStep { step_id, patch } => update_step(state, &step_id, patch),
        EditOperation::AddConnection { source_id, target_id } => add_connection(state, &source_id, &target_id),
        EditOperation::DeleteConnection { source_id, target_id } => delete_connection(state, &source_id, &target_id),
        EditOperation::InsertStepOnEdge {
            step,
            source_id,
            target_id,
        } => insert_step_on_edge(config, state, step, &source_id, &target_id),
        EditOperation::ReorderStep { from, to } => {
            StepCollection::new(state.active_workflow_mut()?).reorder(from, to);
            Ok(Warnings::new())
        }
        EditOperation::ReorderInput { from, to } => reorder_input(state, from, to),
        EditOperation::ReorderOutput { step_id, from, to } => reorder_output(state, step_id.as_deref(), from, to),
        EditOperation::AddWorkflow(workflow) => workflows::add_workflow(config, state, workflow),
        EditOperation::DeleteWorkflow { workflow_id } => workflows::delete_workflow(state, &workflow_id),
        EditOperation::RenameWorkflow { old_id, new_id } => workflows::rename_workflow(state, &old_id, &new_id),
        EditOperation::UpdateWorkflow { workflow_id, patch } => workflows::update_workflow(state, &workflow_id, patch),
        EditOperation::SetActiveWorkflow { workflow_id } => workflows::set_active_workflow(state, &workflow_id),
        EditOperation::ReorderWorkflow { from, to } => workflows::reorder_workflow(state, from, to),
        EditOperation::SetInput { name, schema, required } => workflows::set_input(state, &name, schema, required),
        EditOperation::RemoveInput { name } => workflows::remove_input(state, &name),
        EditOperation::SetOutput { name, expression } => workflows::set_output(state, &name, expression),
        EditOperation::RemoveOutput { name } => workflows::remove_output(state, &name),
        EditOperation::AddSource(source) => workflows::add_source(state, source),
        EditOperation::RemoveSource { name } => workflows::remove_source(state, &name),
        EditOperation::Select(selection) => select(state, selection),
    }
}

fn add_step(config: &EngineConfig, state: &mut EditorState, mut step: Step) -> Result<Warnings, EditError> {
    let workflow = state.active_workflow_mut()?;
    if step.step_id.is_empty() {
        step.step_id = StepCollection::new(workflow).generate_id(&config.generated_step_prefix);
    }
    collapse(&mut step.on_success);
    collapse(&mut step.on_failure);
    ensure_branch_targets(workflow, &step)?;

    let step_id = step.step_id.clone();
    StepCollection::new(workflow).insert(step)?;
    state.selection = Selection::Step(step_id);
    Ok(Warnings::new())
}

fn delete_step(state: &mut EditorState, step_id: &str) -> Result<Warnings, EditError> {
    let workflow = state.active_workflow_mut()?;
    let Some(removed) = StepCollection::new(workflow).remove(step_id) else {
        return Ok(Warnings::new());
    };

    let origin = workflow.workflow_id.clone();
    let mut removed_actions = 0;
    for step in &mut workflow.steps {
        removed_actions += remove_targeting(&mut step.on_success, &origin, step_id);
        removed_actions += remove_targeting(&mut step.on_failure, &origin, step_id);
    }
    removed_actions += remove_targeting(&mut workflow.success_actions, &origin, step_id);
    removed_actions += remove_targeting(&mut workflow.failure_actions, &origin, step_id);

    debug!(
        step_id,
        index = removed.index,
        removed_actions,
        referencing_steps = ?removed.referencing_steps,
        "deleted step"
    );

    let warnings = step_expression_references(workflow, step_id);
    state.selection.on_step_removed(step_id);
    Ok(warnings)
}

fn rename_step(state: &mut EditorState, old_id: &str, new_id: &str) -> Result<Warnings, EditError> {
    let workflow = state.active_workflow_mut()?;
    if old_id == new_id {
        if !workflow.contains_step(old_id) {
            return Err(EditError::not_found(IdentifierKind::Step, old_id));
        }
        return Ok(Warnings::new());
    }

    let affected = StepCollection::new(workflow).rename(old_id, new_id)?;
    let origin = workflow.workflow_id.clone();
    for step in &mut workflow.steps {
        retarget(&mut step.on_success, &origin, old_id, new_id);
        retarget(&mut step.on_failure, &origin, old_id, new_id);
        rewrite_step_expressions(step, old_id, new_id);
    }
    retarget(&mut workflow.success_actions, &origin, old_id, new_id);
    retarget(&mut workflow.failure_actions, &origin, old_id, new_id);
    for expression in workflow.outputs.values_mut() {
        rewrite_text(expression, old_id, new_id);
    }

    debug!(old_id, new_id, affected_steps = ?affected, "renamed step");
    state.selection.on_step_renamed(old_id, new_id);
    Ok(Warnings::new())
}

fn update_step(state: &mut EditorState, step_id: &str, patch: StepPatch) -> Result<Warnings, EditError> {
    let workflow = state.active_workflow_mut()?;
    let Some(index) = workflow.steps.iter().position(|step| step.step_id == step_id) else {
        debug!(step_id, "update targets an absent step; ignoring");
        return Ok(Warnings::new());
    };

    let mut updated = workflow.steps[index].clone();
    patch.apply_to(&mut updated);
    collapse(&mut updated.on_success);
    collapse(&mut updated.on_failure);
    ensure_branch_targets(workflow, &updated)?;

    workflow.steps[index] = updated;
    Ok(Warnings::new())
}

fn add_connection(state: &mut EditorState, source_id: &str, target_id: &str) -> Result<Warnings, EditError> {
    let workflow = state.active_workflow_mut()?;
    if !workflow.contains_step(target_id) {
        return Ok(Warnings::new());
    }
    if let Some(source) = step_mut(workflow, source_id) {
        source.on_success.get_or_insert_with(Vec::new).push(goto_action(target_id));
    }
    Ok(Warnings::new())
}

fn delete_connection(state: &mut EditorState, source_id: &str, target_id: &str) -> Result<Warnings, EditError> {
    let workflow = state.active_workflow_mut()?;
    let origin = workflow.workflow_id.clone();
    if let Some(source) = step_mut(workflow, source_id) {
        remove_goto_targeting(&mut source.on_success, &origin, target_id);
    }
    Ok(Warnings::new())
}

fn insert_step_on_edge(
    config: &EngineConfig,
    state: &mut EditorState,
    mut step: Step,
    source_id: &str,
    target_id: &str,
) -> Result<Warnings, EditError> {
    let workflow = state.active_workflow_mut()?;
    for endpoint in [source_id, target_id] {
        if !workflow.contains_step(endpoint) {
            return Err(EditError::not_found(IdentifierKind::Step, endpoint));
        }
    }

    if step.step_id.is_empty() {
        step.step_id = StepCollection::new(workflow).generate_id(&config.generated_step_prefix);
    }
    step.on_success = Some(vec![goto_action(target_id)]);
    collapse(&mut step.on_failure);
    ensure_branch_targets(workflow, &step)?;

    let step_id = step.step_id.clone();
    StepCollection::new(workflow).insert(step)?;

    let origin = workflow.workflow_id.clone();
    let rerouted = step_mut(workflow, source_id).map_or(0, |source| splice_insert(&mut source.on_success, &origin, target_id, &step_id));
    debug!(source_id, target_id, step_id, rerouted, "inserted step on edge");

    state.selection = Selection::Step(step_id);
    Ok(Warnings::new())
}

fn reorder_input(state: &mut EditorState, from: usize, to: usize) -> Result<Warnings, EditError> {
    let workflow = state.active_workflow_mut()?;
    if let Some(inputs) = workflow.inputs.as_mut() {
        move_entry(&mut inputs.properties, from, to);
    }
    Ok(Warnings::new())
}

fn reorder_output(state: &mut EditorState, step_id: Option<&str>, from: usize, to: usize) -> Result<Warnings, EditError> {
    let workflow = state.active_workflow_mut()?;
    let outputs = match step_id {
        Some(step_id) => {
            let step = step_mut(workflow, step_id).ok_or_else(|| EditError::not_found(IdentifierKind::Step, step_id))?;
            &mut step.outputs
        }
        None => &mut workflow.outputs,
    };
    move_entry(outputs, from, to);
    Ok(Warnings::new())
}

fn select(state: &mut EditorState, selection: Selection) -> Result<Warnings, EditError> {
    if let Some(step_id) = selection.step_id() {
        let workflow = state.active_workflow().ok_or(EditError::NoActiveWorkflow)?;
        if !workflow.contains_step(step_id) {
            return Err(EditError::not_found(IdentifierKind::Step, step_id));
        }
    }
    state.selection = selection;
    Ok(Warnings::new())
}

/// Rejects a step whose local `goto`/`retry` actions name a step the workflow lacks.
///
/// A step may target itself even before it is inserted.
fn ensure_branch_targets(workflow: &Workflow, step: &Step) -> Result<(), EditError> {
    let origin = workflow.workflow_id.as_str();
    for action in inline_actions(&step.on_success).chain(inline_actions(&step.on_failure)) {
        if let Some(target) = local_target(action, origin)
            && target != step.step_id
            && !workflow.contains_step(target)
        {
            return Err(EditError::not_found(IdentifierKind::Step, target));
        }
    }
    Ok(())
}

fn step_mut<'a>(workflow: &'a mut Workflow, step_id: &str) -> Option<&'a mut Step> {
    workflow.steps.iter_mut().find(|step| step.step_id == step_id)
}

/// Moves one entry of an ordered map. Out-of-range indices are a no-op.
pub(crate) fn move_entry<V>(map: &mut IndexMap<String, V>, from: usize, to: usize) {
    if from < map.len() && to < map.len() && from != to {
        map.move_index(from, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arazzo_types::{ArazzoDocument, BranchAction, Parameter, Reusable};
    use indexmap::indexmap;
    use serde_json::json;

    fn state() -> EditorState {
        let mut a = Step::new("a");
        a.on_success = Some(vec![goto_action("b")]);
        a.outputs = indexmap! { "result".to_string() => "$response.body".to_string() };
        let mut b = Step::new("b");
        b.parameters = vec![Reusable::Inline(Parameter {
            name: "value".into(),
            location: None,
            value: json!("$steps.a.outputs.result"),
        })];

        let mut workflow = Workflow::new("main");
        workflow.steps = vec![a, b];
        EditorState::new(ArazzoDocument {
            workflows: vec![workflow],
            ..ArazzoDocument::default()
        })
    }

    fn step_ids(state: &EditorState) -> Vec<String> {
        state
            .active_workflow()
            .expect("active workflow")
            .steps
            .iter()
            .map(|step| step.step_id.clone())
            .collect()
    }

    #[test]
    fn add_step_selects_the_new_step() {
        let outcome = apply(&state(), EditOperation::AddStep(Step::new("c"))).expect("add step");
        assert!(outcome.changed);
        assert_eq!(step_ids(&outcome.state), vec!["a", "b", "c"]);
        assert_eq!(outcome.state.selection, Selection::step("c"));
    }

    #[test]
    fn add_step_generates_missing_identifier() {
        let config = EngineConfig {
            generated_step_prefix: "node".into(),
            ..EngineConfig::default()
        };
        let outcome = apply_with(&config, &state(), EditOperation::AddStep(Step::default())).expect("add step");
        assert_eq!(outcome.state.selection, Selection::step("node-1"));
    }

    #[test]
    fn add_step_rejects_dangling_goto() {
        let mut step = Step::new("c");
        step.on_failure = Some(vec![goto_action("missing")]);
        let error = apply(&state(), EditOperation::AddStep(step)).expect_err("dangling goto");
        assert_eq!(error, EditError::not_found(IdentifierKind::Step, "missing"));
    }

    #[test]
    fn delete_step_reports_dangling_expressions() {
        let mut initial = state();
        initial.selection = Selection::step("a");

        let outcome = apply(&initial, EditOperation::DeleteStep { step_id: "a".into() }).expect("delete step");

        assert_eq!(step_ids(&outcome.state), vec!["b"]);
        assert_eq!(outcome.state.selection, Selection::Nothing);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].step_id.as_deref(), Some("b"));
        assert_eq!(outcome.warnings[0].source_path, "parameters.value");
    }

    #[test]
    fn delete_step_collapses_emptied_branches() {
        let outcome = apply(&state(), EditOperation::DeleteStep { step_id: "b".into() }).expect("delete step");
        let workflow = outcome.state.active_workflow().expect("active workflow");
        assert_eq!(workflow.steps[0].on_success, None);
    }

    #[test]
    fn rename_to_same_id_requires_existing_step() {
        let initial = state();
        let outcome = apply(
            &initial,
            EditOperation::RenameStep {
                old_id: "a".into(),
                new_id: "a".into(),
            },
        )
        .expect("no-op rename");
        assert!(!outcome.changed);

        let error = apply(
            &initial,
            EditOperation::RenameStep {
                old_id: "zzz".into(),
                new_id: "zzz".into(),
            },
        )
        .expect_err("missing step");
        assert!(error.is_not_found());
    }

    #[test]
    fn rename_redirects_selection() {
        let mut initial = state();
        initial.selection = Selection::step("a");
        let outcome = apply(
            &initial,
            EditOperation::RenameStep {
                old_id: "a".into(),
                new_id: "x".into(),
            },
        )
        .expect("rename");
        assert_eq!(outcome.state.selection, Selection::step("x"));
    }

    #[test]
    fn update_step_of_absent_step_is_a_no_op() {
        let outcome = apply(
            &state(),
            EditOperation::UpdateStep {
                step_id: "missing".into(),
                patch: StepPatch {
                    description: Some(Some("ignored".into())),
                    ..StepPatch::default()
                },
            },
        )
        .expect("no-op update");
        assert!(!outcome.changed);
    }

    #[test]
    fn update_step_collapses_empty_branch_lists() {
        let outcome = apply(
            &state(),
            EditOperation::UpdateStep {
                step_id: "a".into(),
                patch: StepPatch {
                    on_success: Some(Some(Vec::new())),
                    ..StepPatch::default()
                },
            },
        )
        .expect("update");
        assert_eq!(outcome.state.active_workflow().expect("workflow").steps[0].on_success, None);
    }

    #[test]
    fn connections_with_missing_endpoints_are_ignored() {
        let initial = state();
        for (source_id, target_id) in [("a", "missing"), ("missing", "b")] {
            let outcome = apply(
                &initial,
                EditOperation::AddConnection {
                    source_id: source_id.into(),
                    target_id: target_id.into(),
                },
            )
            .expect("no-op connect");
            assert!(!outcome.changed);
        }
    }

    #[test]
    fn add_connection_appends_goto() {
        let outcome = apply(
            &state(),
            EditOperation::AddConnection {
                source_id: "b".into(),
                target_id: "a".into(),
            },
        )
        .expect("connect");
        let source = &outcome.state.active_workflow().expect("workflow").steps[1];
        assert_eq!(source.on_success, Some(vec![goto_action("a")]));
    }

    #[test]
    fn delete_connection_keeps_retries() {
        let mut initial = state();
        let retry = Reusable::Inline(BranchAction::Retry {
            name: "retry-b".into(),
            step_id: Some("b".into()),
            workflow_id: None,
            retry_after: None,
            retry_limit: Some(1),
            criteria: Vec::new(),
        });
        initial.document.workflows[0].steps[0]
            .on_success
            .get_or_insert_with(Vec::new)
            .push(retry.clone());

        let outcome = apply(
            &initial,
            EditOperation::DeleteConnection {
                source_id: "a".into(),
                target_id: "b".into(),
            },
        )
        .expect("disconnect");
        assert_eq!(outcome.state.active_workflow().expect("workflow").steps[0].on_success, Some(vec![retry]));
    }

    #[test]
    fn insert_on_edge_requires_both_endpoints() {
        let error = apply(
            &state(),
            EditOperation::InsertStepOnEdge {
                step: Step::new("c"),
                source_id: "a".into(),
                target_id: "missing".into(),
            },
        )
        .expect_err("missing target");
        assert_eq!(error, EditError::not_found(IdentifierKind::Step, "missing"));
    }

    #[test]
    fn reorder_output_moves_step_outputs() {
        let mut initial = state();
        initial.document.workflows[0].steps[0].outputs.insert("status".into(), "$statusCode".into());

        let outcome = apply(
            &initial,
            EditOperation::ReorderOutput {
                step_id: Some("a".into()),
                from: 1,
                to: 0,
            },
        )
        .expect("reorder outputs");
        let keys: Vec<&String> = outcome.state.active_workflow().expect("workflow").steps[0].outputs.keys().collect();
        assert_eq!(keys, vec!["status", "result"]);
    }

    #[test]
    fn out_of_range_reorders_are_no_ops() {
        let initial = state();
        for operation in [
            EditOperation::ReorderStep { from: 0, to: 5 },
            EditOperation::ReorderInput { from: 0, to: 1 },
            EditOperation::ReorderOutput {
                step_id: None,
                from: 3,
                to: 0,
            },
        ] {
            assert!(!apply(&initial, operation).expect("no-op reorder").changed);
        }
    }

    #[test]
    fn select_rejects_unknown_steps() {
        let error = apply(&state(), EditOperation::Select(Selection::step("nope"))).expect_err("unknown step");
        assert!(error.is_not_found());

        let outcome = apply(&state(), EditOperation::Select(Selection::step("b"))).expect("select");
        assert_eq!(outcome.state.selection.step_id(), Some("b"));
    }

    #[test]
    fn step_operations_need_an_active_workflow() {
        let error = apply(&EditorState::default(), EditOperation::AddStep(Step::new("a"))).expect_err("no workflow");
        assert_eq!(error, EditError::NoActiveWorkflow);
    }
}
