//! Closed catalog of edit operations.

use arazzo_types::{ArazzoDocument, Criterion, Parameter, RequestBody, Reusable, SourceDescription, Step, Workflow};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::{editor::selection::Selection, workflow::actions::ActionList};

/// One edit issued by a canvas, inspector, or text editor.
///
/// Step-level operations target the active workflow. Every operation either applies
/// completely or is rejected with the previous revision left untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOperation {
    /// Replaces the whole document (text editor round-trip).
    LoadDocument(ArazzoDocument),

    /// Appends a step. An empty `stepId` is replaced by a generated identifier.
    AddStep(Step),
    /// Removes a step and every local branch action targeting it.
    DeleteStep { step_id: String },
    /// Renames a step and rewrites every reference to it inside the workflow.
    RenameStep { old_id: String, new_id: String },
    /// Shallow-merges fields into a step.
    UpdateStep { step_id: String, patch: StepPatch },
    /// Appends `goto-<target>` to the source's success branch.
    AddConnection { source_id: String, target_id: String },
    /// Drops the `goto` actions from the source's success branch that jump to the target.
    DeleteConnection { source_id: String, target_id: String },
    /// Routes the existing `source → target` edge through a new step.
    InsertStepOnEdge { step: Step, source_id: String, target_id: String },
    ReorderStep { from: usize, to: usize },
    ReorderInput { from: usize, to: usize },
    /// Reorders the outputs of a step, or of the workflow when `step_id` is `None`.
    ReorderOutput { step_id: Option<String>, from: usize, to: usize },

    /// Appends a workflow and makes it active. An empty id is replaced by a generated one.
    AddWorkflow(Workflow),
    DeleteWorkflow { workflow_id: String },
    RenameWorkflow { old_id: String, new_id: String },
    UpdateWorkflow { workflow_id: String, patch: WorkflowPatch },
    SetActiveWorkflow { workflow_id: String },
    ReorderWorkflow { from: usize, to: usize },

    /// Declares or replaces a workflow input and its membership in `required`.
    SetInput { name: String, schema: JsonValue, required: bool },
    RemoveInput { name: String },
    /// Declares or replaces a workflow output expression.
    SetOutput { name: String, expression: String },
    RemoveOutput { name: String },

    AddSource(SourceDescription),
    RemoveSource { name: String },

    Select(Selection),
}

impl EditOperation {
    /// Stable operation name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadDocument(_) => "load_document",
            Self::AddStep(_) => "add_step",
            Self::DeleteStep { .. } => "delete_step",
            Self::RenameStep { .. } => "rename_step",
            Self::UpdateStep { .. } => "update_step",
            Self::AddConnection { .. } => "add_connection",
            Self::DeleteConnection { .. } => "delete_connection",
            Self::InsertStepOnEdge { .. } => "insert_step_on_edge",
            Self::ReorderStep { .. } => "reorder_step",
            Self::ReorderInput { .. } => "reorder_input",
            Self::ReorderOutput { .. } => "reorder_output",
            Self::AddWorkflow(_) => "add_workflow",
            Self::DeleteWorkflow { .. } => "delete_workflow",
            Self::RenameWorkflow { .. } => "rename_workflow",
            Self::UpdateWorkflow { .. } => "update_workflow",
            Self::SetActiveWorkflow { .. } => "set_active_workflow",
            Self::ReorderWorkflow { .. } => "reorder_workflow",
            Self::SetInput { .. } => "set_input",
            Self::RemoveInput { .. } => "remove_input",
            Self::SetOutput { .. } => "set_output",
            Self::RemoveOutput { .. } => "remove_output",
            Self::AddSource(_) => "add_source",
            Self::RemoveSource { .. } => "remove_source",
            Self::Select(_) => "select",
        }
    }
}

/// Partial step update. `None` leaves a field alone; `Some(None)` clears an optional field.
///
/// The identifier is deliberately absent: renames go through [`EditOperation::RenameStep`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepPatch {
    pub description: Option<Option<String>>,
    pub operation_id: Option<Option<String>>,
    pub operation_path: Option<Option<String>>,
    pub workflow_id: Option<Option<String>>,
    pub parameters: Option<Vec<Reusable<Parameter>>>,
    pub request_body: Option<Option<RequestBody>>,
    pub success_criteria: Option<Vec<Criterion>>,
    pub on_success: Option<Option<ActionList>>,
    pub on_failure: Option<Option<ActionList>>,
    pub outputs: Option<IndexMap<String, String>>,
}

impl StepPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges the populated fields into `step`.
    pub fn apply_to(self, step: &mut Step) {
        let Self {
            description,
            operation_id,
            operation_path,
            workflow_id,
            parameters,
            request_body,
            success_criteria,
            on_success,
            on_failure,
            outputs,
        } = self;

        if let Some(description) = description {
            step.description = description;
        }
        if let Some(operation_id) = operation_id {
            step.operation_id = operation_id;
        }
        if let Some(operation_path) = operation_path {
            step.operation_path = operation_path;
        }
        if let Some(workflow_id) = workflow_id {
            step.workflow_id = workflow_id;
        }
        if let Some(parameters) = parameters {
            step.parameters = parameters;
        }
        if let Some(request_body) = request_body {
            step.request_body = request_body;
        }
        if let Some(success_criteria) = success_criteria {
            step.success_criteria = success_criteria;
        }
        if let Some(on_success) = on_success {
            step.on_success = on_success;
        }
        if let Some(on_failure) = on_failure {
            step.on_failure = on_failure;
        }
        if let Some(outputs) = outputs {
            step.outputs = outputs;
        }
    }
}

/// Partial workflow update. Inputs, outputs, and steps have dedicated operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowPatch {
    pub summary: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub depends_on: Option<Vec<String>>,
    pub success_actions: Option<Option<ActionList>>,
    pub failure_actions: Option<Option<ActionList>>,
    pub parameters: Option<Vec<Reusable<Parameter>>>,
}

impl WorkflowPatch {
    /// Merges the populated fields into `workflow`.
    pub fn apply_to(self, workflow: &mut Workflow) {
        if let Some(summary) = self.summary {
            workflow.summary = summary;
        }
        if let Some(description) = self.description {
            workflow.description = description;
        }
        if let Some(depends_on) = self.depends_on {
            workflow.depends_on = depends_on;
        }
        if let Some(success_actions) = self.success_actions {
            workflow.success_actions = success_actions;
        }
        if let Some(failure_actions) = self.failure_actions {
            workflow.failure_actions = failure_actions;
        }
        if let Some(parameters) = self.parameters {
            workflow.parameters = parameters;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    #[test]
    fn step_patch_distinguishes_untouched_from_cleared() {
        let mut step = Step::new("find_pet");
        step.description = Some("Find a pet".into());
        step.operation_id = Some("findPetsByStatus".into());

        StepPatch {
            description: Some(None),
            outputs: Some(indexmap! { "petId".to_string() => "$response.body#/0/id".to_string() }),
            ..StepPatch::default()
        }
        .apply_to(&mut step);

        assert_eq!(step.description, None);
        assert_eq!(step.operation_id.as_deref(), Some("findPetsByStatus"));
        assert_eq!(step.outputs["petId"], "$response.body#/0/id");
    }

    #[test]
    fn workflow_patch_updates_summary_only() {
        let mut workflow = Workflow::new("adopt_pet");
        workflow.depends_on = vec!["setup".into()];

        WorkflowPatch {
            summary: Some(Some("Adopt a pet".into())),
            ..WorkflowPatch::default()
        }
        .apply_to(&mut workflow);

        assert_eq!(workflow.summary.as_deref(), Some("Adopt a pet"));
        assert_eq!(workflow.depends_on, vec!["setup".to_string()]);
    }

    #[test]
    fn operation_names_are_snake_case() {
        let operation = EditOperation::InsertStepOnEdge {
            step: Step::new("c"),
            source_id: "a".into(),
            target_id: "b".into(),
        };
        assert_eq!(operation.name(), "insert_step_on_edge");
        assert!(StepPatch::default().is_empty());
    }
}
