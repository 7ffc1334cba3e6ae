//! Workflow and source registry of a document.
//!
//! Workflows are addressed by identifier for lookups and by index for the editor's
//! notion of the active workflow. This module owns identifier bookkeeping at the
//! document level and the scan for cross-workflow references.

use arazzo_types::{ArazzoDocument, SourceDescription};

use crate::{
    error::{DanglingReference, EditError, IdentifierKind, ReferenceKind, ensure_identifier},
    workflow::actions::{ActionList, inline_actions},
};

/// Rejects `workflow_id` when it is invalid or already used by another workflow.
pub fn ensure_unique_workflow_id(document: &ArazzoDocument, workflow_id: &str) -> Result<(), EditError> {
    ensure_identifier(IdentifierKind::Workflow, workflow_id)?;
    if document.workflow(workflow_id).is_some() {
        return Err(EditError::duplicate(IdentifierKind::Workflow, workflow_id));
    }
    Ok(())
}

/// Returns the first unused `<prefix>-<n>` workflow identifier, counting from 1.
pub fn generate_workflow_id(document: &ArazzoDocument, prefix: &str) -> String {
    (1..)
        .map(|counter| format!("{prefix}-{counter}"))
        .find(|candidate| document.workflow(candidate).is_none())
        .unwrap_or_else(|| prefix.to_string())
}

/// Registers a source description under a unique name.
pub fn add_source(document: &mut ArazzoDocument, source: SourceDescription) -> Result<(), EditError> {
    ensure_identifier(IdentifierKind::Source, &source.name)?;
    if document.source(&source.name).is_some() {
        return Err(EditError::duplicate(IdentifierKind::Source, source.name));
    }
    document.source_descriptions.push(source);
    Ok(())
}

/// Removes a source description. Absent names are a no-op.
pub fn remove_source(document: &mut ArazzoDocument, name: &str) -> Option<SourceDescription> {
    let index = document.source_descriptions.iter().position(|source| source.name == name)?;
    Some(document.source_descriptions.remove(index))
}

/// Lists every place in other workflows that names `workflow_id`.
///
/// Covers sub-workflow steps, cross-workflow `goto`/`retry` actions, and `dependsOn`
/// entries. These references are reported, never rewritten.
pub fn workflow_references(document: &ArazzoDocument, workflow_id: &str) -> Vec<DanglingReference> {
    let mut references = Vec::new();

    for workflow in document.workflows.iter().filter(|workflow| workflow.workflow_id != workflow_id) {
        let mut push = |step_id: Option<&str>, source_path: String, text: &str| {
            references.push(DanglingReference {
                kind: ReferenceKind::WorkflowReference,
                missing_id: workflow_id.to_string(),
                workflow_id: workflow.workflow_id.clone(),
                step_id: step_id.map(str::to_string),
                source_path,
                text: text.to_string(),
            });
        };

        if workflow.depends_on.iter().any(|dependency| dependency == workflow_id) {
            push(None, "dependsOn".to_string(), workflow_id);
        }

        for step in &workflow.steps {
            if step.workflow_id.as_deref() == Some(workflow_id) {
                push(Some(step.step_id.as_str()), "workflowId".to_string(), workflow_id);
            }
            for (branch, actions) in [("onSuccess", &step.on_success), ("onFailure", &step.on_failure)] {
                for action in actions_naming(actions, workflow_id) {
                    push(Some(step.step_id.as_str()), format!("{branch}.{}", action), action);
                }
            }
        }

        for (branch, actions) in [("successActions", &workflow.success_actions), ("failureActions", &workflow.failure_actions)] {
            for action in actions_naming(actions, workflow_id) {
                push(None, format!("{branch}.{}", action), action);
            }
        }
    }

    references
}

/// Index an element ends up at after the element at `from` moves to `to`.
pub fn index_after_move(index: usize, from: usize, to: usize) -> usize {
    if index == from {
        to
    } else if from < index && index <= to {
        index - 1
    } else if to <= index && index < from {
        index + 1
    } else {
        index
    }
}

fn actions_naming<'a>(actions: &'a Option<ActionList>, workflow_id: &'a str) -> impl Iterator<Item = &'a str> {
    inline_actions(actions)
        .filter(move |action| action.workflow_id() == Some(workflow_id))
        .map(|action| action.name())
}
