//! Referential-integrity checks over workflows and documents.
//!
//! The mutation engine keeps these invariants by construction; the checks exist for
//! documents that arrive from outside (the text editor's bulk load) and for tests.

use std::collections::HashSet;

use arazzo_types::{ArazzoDocument, Workflow};

use crate::{
    error::{DanglingReference, ReferenceKind},
    expressions::{ExpressionSite, find_input_references, find_step_references, references_input, references_step, step_expression_sites},
    workflow::actions::{ActionList, inline_actions, local_target},
};

/// Findings for a single workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Step identifiers that occur more than once, in order of first repetition.
    pub duplicate_step_ids: Vec<String>,
    /// Branch targets and expressions that do not resolve.
    pub dangling: Vec<DanglingReference>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_step_ids.is_empty() && self.dangling.is_empty()
    }
}

/// Findings for a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentReport {
    pub duplicate_workflow_ids: Vec<String>,
    /// Per-workflow findings keyed by workflow identifier, in document order.
    pub workflows: Vec<(String, IntegrityReport)>,
}

impl DocumentReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_workflow_ids.is_empty() && self.workflows.iter().all(|(_, report)| report.is_clean())
    }

    /// All dangling references across workflows.
    pub fn dangling(&self) -> impl Iterator<Item = &DanglingReference> {
        self.workflows.iter().flat_map(|(_, report)| report.dangling.iter())
    }
}

/// Checks identifier uniqueness, branch targets, and expression references of one workflow.
pub fn check_workflow(workflow: &Workflow) -> IntegrityReport {
    let mut seen = HashSet::new();
    let mut duplicate_step_ids = Vec::new();
    for step in &workflow.steps {
        if !seen.insert(step.step_id.as_str()) && !duplicate_step_ids.contains(&step.step_id) {
            duplicate_step_ids.push(step.step_id.clone());
        }
    }

    let mut dangling = dangling_branch_targets(workflow);
    dangling.extend(dangling_expressions(workflow));

    IntegrityReport {
        duplicate_step_ids,
        dangling,
    }
}

/// Checks every workflow of a document plus workflow identifier uniqueness.
pub fn check_document(document: &ArazzoDocument) -> DocumentReport {
    let mut seen = HashSet::new();
    let mut duplicate_workflow_ids = Vec::new();
    for workflow in &document.workflows {
        if !seen.insert(workflow.workflow_id.as_str()) && !duplicate_workflow_ids.contains(&workflow.workflow_id) {
            duplicate_workflow_ids.push(workflow.workflow_id.clone());
        }
    }

    DocumentReport {
        duplicate_workflow_ids,
        workflows: document
            .workflows
            .iter()
            .map(|workflow| (workflow.workflow_id.clone(), check_workflow(workflow)))
            .collect(),
    }
}

/// Local `goto`/`retry` actions whose target step does not exist.
pub fn dangling_branch_targets(workflow: &Workflow) -> Vec<DanglingReference> {
    let origin = workflow.workflow_id.as_str();
    let mut dangling = Vec::new();

    let mut check_branch = |holder: Option<&str>, branch: &str, actions: &Option<ActionList>| {
        for action in inline_actions(actions) {
            if let Some(target) = local_target(action, origin)
                && !workflow.contains_step(target)
            {
                dangling.push(DanglingReference {
                    kind: ReferenceKind::BranchTarget,
                    missing_id: target.to_string(),
                    workflow_id: origin.to_string(),
                    step_id: holder.map(str::to_string),
                    source_path: format!("{branch}.{}", action.name()),
                    text: action.name().to_string(),
                });
            }
        }
    };

    for step in &workflow.steps {
        check_branch(Some(step.step_id.as_str()), "onSuccess", &step.on_success);
        check_branch(Some(step.step_id.as_str()), "onFailure", &step.on_failure);
    }
    check_branch(None, "successActions", &workflow.success_actions);
    check_branch(None, "failureActions", &workflow.failure_actions);

    dangling
}

/// Expressions naming a step or input that the workflow does not declare.
pub fn dangling_expressions(workflow: &Workflow) -> Vec<DanglingReference> {
    let declared_inputs: HashSet<&str> = workflow
        .inputs
        .iter()
        .flat_map(|schema| schema.properties.keys().map(String::as_str))
        .collect();

    let mut dangling = Vec::new();
    for (holder, site) in workflow_expression_sites(workflow) {
        for step_id in find_step_references(&site.expression) {
            if !workflow.contains_step(&step_id) {
                dangling.push(expression_warning(workflow, ReferenceKind::StepExpression, &step_id, holder, &site));
            }
        }
        for input_name in find_input_references(&site.expression) {
            if !declared_inputs.contains(input_name.as_str()) {
                dangling.push(expression_warning(workflow, ReferenceKind::InputExpression, &input_name, holder, &site));
            }
        }
    }
    dangling
}

/// Every expression in the workflow that mentions `$steps.<step_id>`.
pub fn step_expression_references(workflow: &Workflow, step_id: &str) -> Vec<DanglingReference> {
    workflow_expression_sites(workflow)
        .into_iter()
        .filter(|(_, site)| references_step(&site.expression, step_id))
        .map(|(holder, site)| expression_warning(workflow, ReferenceKind::StepExpression, step_id, holder, &site))
        .collect()
}

/// Every expression in the workflow that mentions `$inputs.<input_name>`.
pub fn input_expression_references(workflow: &Workflow, input_name: &str) -> Vec<DanglingReference> {
    workflow_expression_sites(workflow)
        .into_iter()
        .filter(|(_, site)| references_input(&site.expression, input_name))
        .map(|(holder, site)| expression_warning(workflow, ReferenceKind::InputExpression, input_name, holder, &site))
        .collect()
}

/// Expression sites of every step followed by the workflow outputs.
fn workflow_expression_sites(workflow: &Workflow) -> Vec<(Option<&str>, ExpressionSite)> {
    let mut sites: Vec<(Option<&str>, ExpressionSite)> = workflow
        .steps
        .iter()
        .flat_map(|step| {
            step_expression_sites(step)
                .into_iter()
                .map(move |site| (Some(step.step_id.as_str()), site))
        })
        .collect();

    sites.extend(workflow.outputs.iter().map(|(name, expression)| {
        (
            None,
            ExpressionSite {
                source_path: format!("outputs.{name}"),
                expression: expression.clone(),
            },
        )
    }));
    sites
}

fn expression_warning(
    workflow: &Workflow,
    kind: ReferenceKind,
    missing_id: &str,
    holder: Option<&str>,
    site: &ExpressionSite,
) -> DanglingReference {
    DanglingReference {
        kind,
        missing_id: missing_id.to_string(),
        workflow_id: workflow.workflow_id.clone(),
        step_id: holder.map(str::to_string),
        source_path: site.source_path.clone(),
        text: site.expression.clone(),
    }
}
