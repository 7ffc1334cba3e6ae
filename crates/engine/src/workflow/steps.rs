//! Identifier-keyed, insertion-ordered view over a workflow's steps.

use arazzo_types::{Step, Workflow};

use crate::{
    error::{EditError, IdentifierKind, ensure_identifier},
    expressions::step_references_step,
    workflow::actions::{inline_actions, targets_step},
};

/// Step removed from a collection, with the siblings that still mention it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedStep {
    pub step: Step,
    /// Position the step occupied before removal.
    pub index: usize,
    /// Remaining steps whose actions or expressions referenced the removed step.
    pub referencing_steps: Vec<String>,
}

/// Mutable collection of the steps of one workflow.
///
/// Enforces pairwise-distinct identifiers. Order is insertion order and survives
/// renames and updates; only [`StepCollection::reorder`] moves steps.
#[derive(Debug)]
pub struct StepCollection<'a> {
    workflow: &'a mut Workflow,
}

impl<'a> StepCollection<'a> {
    pub fn new(workflow: &'a mut Workflow) -> Self {
        Self { workflow }
    }

    pub fn len(&self) -> usize {
        self.workflow.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflow.steps.is_empty()
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.position(step_id).is_some()
    }

    pub fn position(&self, step_id: &str) -> Option<usize> {
        self.workflow.steps.iter().position(|step| step.step_id == step_id)
    }

    pub fn get(&self, step_id: &str) -> Option<&Step> {
        self.workflow.step(step_id)
    }

    pub fn get_mut(&mut self, step_id: &str) -> Option<&mut Step> {
        self.workflow.steps.iter_mut().find(|step| step.step_id == step_id)
    }

    /// Step identifiers in order.
    pub fn ids(&self) -> Vec<&str> {
        self.workflow.steps.iter().map(|step| step.step_id.as_str()).collect()
    }

    /// Appends a step, rejecting invalid or colliding identifiers.
    pub fn insert(&mut self, step: Step) -> Result<(), EditError> {
        ensure_identifier(IdentifierKind::Step, &step.step_id)?;
        if self.contains(&step.step_id) {
            return Err(EditError::duplicate(IdentifierKind::Step, step.step_id));
        }
        self.workflow.steps.push(step);
        Ok(())
    }

    /// Removes a step. Absent identifiers are a no-op and return `None`.
    pub fn remove(&mut self, step_id: &str) -> Option<RemovedStep> {
        let index = self.position(step_id)?;
        let step = self.workflow.steps.remove(index);
        let referencing_steps = self.referencing_steps(step_id);
        Some(RemovedStep {
            step,
            index,
            referencing_steps,
        })
    }

    /// Swaps a step identifier.
    ///
    /// Returns the identifiers (post-rename) of every step whose actions or expressions
    /// referenced `old_id`, including the renamed step itself when it referenced itself.
    /// Rewriting those references is left to the caller.
    pub fn rename(&mut self, old_id: &str, new_id: &str) -> Result<Vec<String>, EditError> {
        let Some(index) = self.position(old_id) else {
            return Err(EditError::not_found(IdentifierKind::Step, old_id));
        };
        ensure_identifier(IdentifierKind::Step, new_id)?;
        if new_id != old_id && self.contains(new_id) {
            return Err(EditError::duplicate(IdentifierKind::Step, new_id));
        }

        let referencing_steps = self.referencing_steps(old_id);
        self.workflow.steps[index].step_id = new_id.to_string();
        Ok(referencing_steps
            .into_iter()
            .map(|step_id| if step_id == old_id { new_id.to_string() } else { step_id })
            .collect())
    }

    /// Moves the step at `from` to `to`, shifting the others. Out-of-range indices are a no-op.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let steps = &mut self.workflow.steps;
        if from >= steps.len() || to >= steps.len() || from == to {
            return false;
        }
        let step = steps.remove(from);
        steps.insert(to, step);
        true
    }

    /// Identifiers of the steps whose local actions or expressions mention `step_id`.
    pub fn referencing_steps(&self, step_id: &str) -> Vec<String> {
        let origin = self.workflow.workflow_id.as_str();
        self.workflow
            .steps
            .iter()
            .filter(|step| {
                inline_actions(&step.on_success)
                    .chain(inline_actions(&step.on_failure))
                    .any(|action| targets_step(action, origin, step_id))
                    || step_references_step(step, step_id)
            })
            .map(|step| step.step_id.clone())
            .collect()
    }

    /// Returns the first unused `<prefix>-<n>` identifier, counting from 1.
    pub fn generate_id(&self, prefix: &str) -> String {
        (1..)
            .map(|counter| format!("{prefix}-{counter}"))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| prefix.to_string())
    }
}
