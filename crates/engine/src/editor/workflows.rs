//! Document-level operations: bulk load, workflow lifecycle, inputs, outputs, and sources.

use arazzo_types::{ArazzoDocument, InputSchema, Reusable, SourceDescription, Workflow};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::{
    config::EngineConfig,
    editor::{operation::WorkflowPatch, state::EditorState},
    error::{DanglingReference, EditError, IdentifierKind, ensure_identifier},
    workflow::{
        actions::collapse,
        document::{self, ensure_unique_workflow_id, generate_workflow_id, index_after_move, workflow_references},
        integrity::{check_document, check_workflow, dangling_branch_targets, dangling_expressions, input_expression_references},
    },
};

type Warnings = Vec<DanglingReference>;

/// Replaces the document wholesale.
///
/// Duplicate identifiers are rejected; dangling references are accepted and reported
/// so the text editor can highlight them.
pub(super) fn load_document(state: &mut EditorState, document: ArazzoDocument) -> Result<Warnings, EditError> {
    let report = check_document(&document);
    if let Some(workflow_id) = report.duplicate_workflow_ids.first() {
        return Err(EditError::duplicate(IdentifierKind::Workflow, workflow_id.clone()));
    }
    if let Some(step_id) = report.workflows.iter().find_map(|(_, workflow)| workflow.duplicate_step_ids.first()) {
        return Err(EditError::duplicate(IdentifierKind::Step, step_id.clone()));
    }

    info!(workflows = document.workflows.len(), sources = document.source_descriptions.len(), "loaded document");
    let warnings = report.dangling().cloned().collect();
    *state = EditorState::new(document);
    Ok(warnings)
}

pub(super) fn add_workflow(config: &EngineConfig, state: &mut EditorState, mut workflow: Workflow) -> Result<Warnings, EditError> {
    if workflow.workflow_id.is_empty() {
        workflow.workflow_id = generate_workflow_id(&state.document, &config.generated_workflow_prefix);
    }
    ensure_unique_workflow_id(&state.document, &workflow.workflow_id)?;

    let report = check_workflow(&workflow);
    if let Some(step_id) = report.duplicate_step_ids.first() {
        return Err(EditError::duplicate(IdentifierKind::Step, step_id.clone()));
    }

    state.document.workflows.push(workflow);
    state.activate(Some(state.document.workflows.len() - 1));
    Ok(report.dangling)
}

/// Removes a workflow and reports references to it held by the remaining workflows.
pub(super) fn delete_workflow(state: &mut EditorState, workflow_id: &str) -> Result<Warnings, EditError> {
    let Some(index) = state.document.workflow_index(workflow_id) else {
        return Err(EditError::not_found(IdentifierKind::Workflow, workflow_id));
    };

    let warnings = workflow_references(&state.document, workflow_id);
    state.document.workflows.remove(index);

    match state.active_workflow {
        Some(active) if active == index => {
            let remaining = state.document.workflows.len();
            state.active_workflow = (remaining > 0).then(|| index.min(remaining - 1));
            state.selection.reset();
        }
        Some(active) if active > index => state.active_workflow = Some(active - 1),
        _ => {}
    }
    Ok(warnings)
}

/// Renames a workflow.
///
/// References held by other workflows are reported, not rewritten. Jumps inside the
/// renamed workflow that name it explicitly follow the new identifier.
pub(super) fn rename_workflow(state: &mut EditorState, old_id: &str, new_id: &str) -> Result<Warnings, EditError> {
    let Some(index) = state.document.workflow_index(old_id) else {
        return Err(EditError::not_found(IdentifierKind::Workflow, old_id));
    };
    if old_id == new_id {
        return Ok(Warnings::new());
    }
    ensure_unique_workflow_id(&state.document, new_id)?;

    let warnings = workflow_references(&state.document, old_id);
    let workflow = &mut state.document.workflows[index];
    workflow.workflow_id = new_id.to_string();
    let rewritten = retarget_self_references(workflow, old_id, new_id);

    debug!(old_id, new_id, rewritten, external_references = warnings.len(), "renamed workflow");
    Ok(warnings)
}

/// Merges workflow fields. Absent workflows are a no-op.
pub(super) fn update_workflow(state: &mut EditorState, workflow_id: &str, patch: WorkflowPatch) -> Result<Warnings, EditError> {
    let Some(index) = state.document.workflow_index(workflow_id) else {
        debug!(workflow_id, "update targets an absent workflow; ignoring");
        return Ok(Warnings::new());
    };

    let mut updated = state.document.workflows[index].clone();
    patch.apply_to(&mut updated);
    collapse(&mut updated.success_actions);
    collapse(&mut updated.failure_actions);

    if let Some(dangling) = dangling_branch_targets(&updated)
        .into_iter()
        .find(|reference| reference.step_id.is_none())
    {
        return Err(EditError::not_found(IdentifierKind::Step, dangling.missing_id));
    }

    state.document.workflows[index] = updated;
    Ok(Warnings::new())
}

pub(super) fn set_active_workflow(state: &mut EditorState, workflow_id: &str) -> Result<Warnings, EditError> {
    let index = state
        .document
        .workflow_index(workflow_id)
        .ok_or_else(|| EditError::not_found(IdentifierKind::Workflow, workflow_id))?;
    state.activate(Some(index));
    Ok(Warnings::new())
}

/// Moves a workflow; the active index keeps pointing at the same workflow.
pub(super) fn reorder_workflow(state: &mut EditorState, from: usize, to: usize) -> Result<Warnings, EditError> {
    let workflows = &mut state.document.workflows;
    if from >= workflows.len() || to >= workflows.len() || from == to {
        return Ok(Warnings::new());
    }
    let workflow = workflows.remove(from);
    workflows.insert(to, workflow);
    state.active_workflow = state.active_workflow.map(|active| index_after_move(active, from, to));
    Ok(Warnings::new())
}

pub(super) fn set_input(state: &mut EditorState, name: &str, schema: JsonValue, required: bool) -> Result<Warnings, EditError> {
    ensure_identifier(IdentifierKind::Input, name)?;
    let workflow = state.active_workflow_mut()?;
    let inputs = workflow.inputs.get_or_insert_with(InputSchema::object);
    inputs.properties.insert(name.to_string(), schema);

    let listed = inputs.required.iter().any(|entry| entry == name);
    if required && !listed {
        inputs.required.push(name.to_string());
    } else if !required && listed {
        inputs.required.retain(|entry| entry != name);
    }
    Ok(Warnings::new())
}

/// Removes an input declaration and reports the expressions still reading it.
pub(super) fn remove_input(state: &mut EditorState, name: &str) -> Result<Warnings, EditError> {
    let workflow = state.active_workflow_mut()?;
    let Some(inputs) = workflow.inputs.as_mut() else {
        return Ok(Warnings::new());
    };
    if inputs.properties.shift_remove(name).is_none() {
        return Ok(Warnings::new());
    }
    inputs.required.retain(|entry| entry != name);
    Ok(input_expression_references(workflow, name))
}

/// Declares a workflow output; unresolved references in the expression come back as warnings.
pub(super) fn set_output(state: &mut EditorState, name: &str, expression: String) -> Result<Warnings, EditError> {
    ensure_identifier(IdentifierKind::Output, name)?;
    let workflow = state.active_workflow_mut()?;
    workflow.outputs.insert(name.to_string(), expression);

    let source_path = format!("outputs.{name}");
    Ok(dangling_expressions(workflow)
        .into_iter()
        .filter(|reference| reference.step_id.is_none() && reference.source_path == source_path)
        .collect())
}

pub(super) fn remove_output(state: &mut EditorState, name: &str) -> Result<Warnings, EditError> {
    state.active_workflow_mut()?.outputs.shift_remove(name);
    Ok(Warnings::new())
}

pub(super) fn add_source(state: &mut EditorState, source: SourceDescription) -> Result<Warnings, EditError> {
    document::add_source(&mut state.document, source)?;
    Ok(Warnings::new())
}

pub(super) fn remove_source(state: &mut EditorState, name: &str) -> Result<Warnings, EditError> {
    if document::remove_source(&mut state.document, name).is_some() {
        debug!(source = name, "removed source description");
    }
    Ok(Warnings::new())
}

fn retarget_self_references(workflow: &mut Workflow, old_id: &str, new_id: &str) -> usize {
    let mut rewritten = 0;
    for step in &mut workflow.steps {
        if step.workflow_id.as_deref() == Some(old_id) {
            step.workflow_id = Some(new_id.to_string());
            rewritten += 1;
        }
    }

    let step_branches = workflow
        .steps
        .iter_mut()
        .flat_map(|step| [&mut step.on_success, &mut step.on_failure]);
    let branches = step_branches.chain([&mut workflow.success_actions, &mut workflow.failure_actions]);
    for action in branches.flat_map(|actions| actions.iter_mut().flatten()).filter_map(Reusable::as_inline_mut) {
        if action.workflow_id() == Some(old_id) {
            action.set_workflow_id(new_id);
            rewritten += 1;
        }
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use arazzo_types::{BranchAction, SourceKind, Step};
    use indexmap::indexmap;
    use serde_json::json;

    use crate::{
        editor::{operation::EditOperation, reducer::apply, selection::Selection},
        error::ReferenceKind,
        workflow::actions::goto_action,
    };

    fn state() -> EditorState {
        let mut invoke = Step::new("invoke");
        invoke.workflow_id = Some("child".into());
        let mut parent = Workflow::new("parent");
        parent.steps = vec![invoke];

        let mut looping = Step::new("poll");
        looping.on_failure = Some(vec![Reusable::Inline(BranchAction::Goto {
            name: "goto-poll".into(),
            step_id: Some("poll".into()),
            workflow_id: Some("child".into()),
            criteria: Vec::new(),
        })]);
        let mut child = Workflow::new("child");
        child.steps = vec![looping];

        EditorState::new(ArazzoDocument {
            workflows: vec![parent, child, Workflow::new("third")],
            ..ArazzoDocument::default()
        })
    }

    #[test]
    fn load_document_rejects_duplicate_steps() {
        let mut workflow = Workflow::new("main");
        workflow.steps = vec![Step::new("a"), Step::new("a")];
        let document = ArazzoDocument {
            workflows: vec![workflow],
            ..ArazzoDocument::default()
        };

        let error = apply(&state(), EditOperation::LoadDocument(document)).expect_err("duplicate step");
        assert_eq!(error, EditError::duplicate(IdentifierKind::Step, "a"));
    }

    #[test]
    fn load_document_resets_focus_and_reports_dangling_targets() {
        let mut initial = state();
        initial.active_workflow = Some(1);
        initial.selection = Selection::step("poll");

        let mut step = Step::new("a");
        step.on_success = Some(vec![goto_action("gone")]);
        let mut workflow = Workflow::new("main");
        workflow.steps = vec![step];
        let document = ArazzoDocument {
            workflows: vec![workflow],
            ..ArazzoDocument::default()
        };

        let outcome = apply(&initial, EditOperation::LoadDocument(document)).expect("load");
        assert_eq!(outcome.state.active_workflow, Some(0));
        assert_eq!(outcome.state.selection, Selection::Nothing);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, ReferenceKind::BranchTarget);
    }

    #[test]
    fn add_workflow_activates_it() {
        let outcome = apply(&state(), EditOperation::AddWorkflow(Workflow::default())).expect("add workflow");
        assert_eq!(outcome.state.active_workflow_id(), Some("workflow-1"));

        let error = apply(&state(), EditOperation::AddWorkflow(Workflow::new("child"))).expect_err("duplicate");
        assert!(error.is_duplicate_id());
    }

    #[test]
    fn delete_workflow_reports_callers_and_shifts_active_index() {
        let mut initial = state();
        initial.active_workflow = Some(2);

        let outcome = apply(
            &initial,
            EditOperation::DeleteWorkflow {
                workflow_id: "child".into(),
            },
        )
        .expect("delete workflow");
        assert_eq!(outcome.state.active_workflow_id(), Some("third"));
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].workflow_id, "parent");
        assert_eq!(outcome.warnings[0].kind, ReferenceKind::WorkflowReference);
    }

    #[test]
    fn deleting_the_active_workflow_resets_selection() {
        let mut initial = state();
        initial.selection = Selection::step("invoke");

        let outcome = apply(
            &initial,
            EditOperation::DeleteWorkflow {
                workflow_id: "parent".into(),
            },
        )
        .expect("delete workflow");
        assert_eq!(outcome.state.active_workflow_id(), Some("child"));
        assert_eq!(outcome.state.selection, Selection::Nothing);
    }

    #[test]
    fn rename_workflow_leaves_callers_and_updates_self_jumps() {
        let outcome = apply(
            &state(),
            EditOperation::RenameWorkflow {
                old_id: "child".into(),
                new_id: "poller".into(),
            },
        )
        .expect("rename workflow");

        let document = &outcome.state.document;
        assert_eq!(document.workflows[0].steps[0].workflow_id.as_deref(), Some("child"));
        let poll = &document.workflows[1].steps[0];
        let action = poll.on_failure.as_ref().expect("failure branch")[0].as_inline().expect("inline");
        assert_eq!(action.workflow_id(), Some("poller"));
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn rename_workflow_rejects_collisions() {
        let error = apply(
            &state(),
            EditOperation::RenameWorkflow {
                old_id: "child".into(),
                new_id: "third".into(),
            },
        )
        .expect_err("collision");
        assert_eq!(error, EditError::duplicate(IdentifierKind::Workflow, "third"));
    }

    #[test]
    fn update_workflow_rejects_dangling_workflow_actions() {
        let error = apply(
            &state(),
            EditOperation::UpdateWorkflow {
                workflow_id: "parent".into(),
                patch: WorkflowPatch {
                    failure_actions: Some(Some(vec![goto_action("missing")])),
                    ..WorkflowPatch::default()
                },
            },
        )
        .expect_err("dangling goto");
        assert!(error.is_not_found());
    }

    #[test]
    fn set_active_workflow_resets_selection() {
        let mut initial = state();
        initial.selection = Selection::step("invoke");
        let outcome = apply(
            &initial,
            EditOperation::SetActiveWorkflow {
                workflow_id: "child".into(),
            },
        )
        .expect("activate");
        assert_eq!(outcome.state.active_workflow, Some(1));
        assert_eq!(outcome.state.selection, Selection::Nothing);
    }

    #[test]
    fn reorder_workflow_keeps_active_workflow() {
        let mut initial = state();
        initial.selection = Selection::step("invoke");
        let outcome = apply(&initial, EditOperation::ReorderWorkflow { from: 0, to: 2 }).expect("reorder");
        assert_eq!(outcome.state.active_workflow, Some(2));
        assert_eq!(outcome.state.active_workflow_id(), Some("parent"));
        assert_eq!(outcome.state.selection, Selection::step("invoke"));
    }

    #[test]
    fn inputs_track_required_membership() {
        let outcome = apply(
            &state(),
            EditOperation::SetInput {
                name: "status".into(),
                schema: json!({ "type": "string" }),
                required: true,
            },
        )
        .expect("set input");
        let inputs = outcome.state.active_workflow().and_then(|workflow| workflow.inputs.clone()).expect("inputs");
        assert_eq!(inputs.required, vec!["status".to_string()]);

        let outcome = apply(
            &outcome.state,
            EditOperation::SetInput {
                name: "status".into(),
                schema: json!({ "type": "string" }),
                required: false,
            },
        )
        .expect("relax input");
        let inputs = outcome.state.active_workflow().and_then(|workflow| workflow.inputs.clone()).expect("inputs");
        assert!(inputs.required.is_empty());
    }

    #[test]
    fn remove_input_reports_readers() {
        let mut initial = state();
        let workflow = &mut initial.document.workflows[0];
        let mut inputs = InputSchema::object();
        inputs.properties.insert("user".into(), json!({ "type": "string" }));
        inputs.required = vec!["user".into()];
        workflow.inputs = Some(inputs);
        workflow.outputs = indexmap! { "echo".to_string() => "$inputs.user".to_string() };

        let outcome = apply(&initial, EditOperation::RemoveInput { name: "user".into() }).expect("remove input");
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, ReferenceKind::InputExpression);
        let inputs = outcome.state.active_workflow().and_then(|workflow| workflow.inputs.clone()).expect("inputs");
        assert!(inputs.properties.is_empty());
        assert!(inputs.required.is_empty());
    }

    #[test]
    fn set_output_warns_on_unknown_steps() {
        let outcome = apply(
            &state(),
            EditOperation::SetOutput {
                name: "result".into(),
                expression: "$steps.ghost.outputs.id".into(),
            },
        )
        .expect("set output");
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].missing_id, "ghost");

        let outcome = apply(&outcome.state, EditOperation::RemoveOutput { name: "result".into() }).expect("remove output");
        assert!(outcome.state.active_workflow().expect("workflow").outputs.is_empty());
    }

    #[test]
    fn sources_are_unique_by_name() {
        let source = SourceDescription {
            name: "petstore".into(),
            url: "./petstore.yaml".into(),
            kind: Some(SourceKind::Openapi),
        };
        let outcome = apply(&state(), EditOperation::AddSource(source.clone())).expect("add source");
        let error = apply(&outcome.state, EditOperation::AddSource(source)).expect_err("duplicate source");
        assert_eq!(error, EditError::duplicate(IdentifierKind::Source, "petstore"));

        let outcome = apply(&outcome.state, EditOperation::RemoveSource { name: "petstore".into() }).expect("remove");
        assert!(outcome.state.document.source_descriptions.is_empty());
        assert!(!apply(&outcome.state, EditOperation::RemoveSource { name: "petstore".into() }).expect("again").changed);
    }
}
