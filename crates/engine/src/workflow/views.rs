//! Read-only projections consumed by rendering and inspector surfaces.

use arazzo_types::{ActionKind, Workflow};

use crate::{
    expressions::{CONTEXT_TOKENS, INPUT_REFERENCE_PREFIX, STEP_REFERENCE_PREFIX},
    workflow::actions::{ActionList, inline_actions, local_target},
};

/// Which branch of a step an edge leaves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Success,
    Failure,
}

/// Edge between two steps of the same workflow, derived from a branch action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub source: String,
    pub target: String,
    pub branch: Branch,
    pub kind: ActionKind,
    /// Name of the action backing the edge.
    pub name: String,
}

/// Lists the local edges of a workflow in step order, success branch first.
///
/// Cross-workflow jumps and registry references are not edges of this graph.
pub fn connections(workflow: &Workflow) -> Vec<Connection> {
    let origin = workflow.workflow_id.as_str();
    let mut edges = Vec::new();

    let mut collect = |source: &str, branch: Branch, actions: &Option<ActionList>| {
        for action in inline_actions(actions) {
            if let Some(target) = local_target(action, origin) {
                edges.push(Connection {
                    source: source.to_string(),
                    target: target.to_string(),
                    branch,
                    kind: action.kind(),
                    name: action.name().to_string(),
                });
            }
        }
    };

    for step in &workflow.steps {
        collect(&step.step_id, Branch::Success, &step.on_success);
        collect(&step.step_id, Branch::Failure, &step.on_failure);
    }
    edges
}

/// Where an autocomplete candidate comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    Input,
    StepOutput { step_id: String },
    Context,
}

/// Expression offered to the inspector's autocomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionCandidate {
    pub expression: String,
    pub source: CandidateSource,
}

/// Builds the expression candidates available while editing `for_step`.
///
/// Candidates are the workflow inputs, the declared outputs of every other step, and
/// the fixed context tokens, in that order. Passing `None` offers every step's outputs.
pub fn expression_candidates(workflow: &Workflow, for_step: Option<&str>) -> Vec<ExpressionCandidate> {
    let inputs = workflow
        .inputs
        .iter()
        .flat_map(|schema| schema.properties.keys())
        .map(|name| ExpressionCandidate {
            expression: format!("{INPUT_REFERENCE_PREFIX}{name}"),
            source: CandidateSource::Input,
        });

    let outputs = workflow
        .steps
        .iter()
        .filter(|step| for_step != Some(step.step_id.as_str()))
        .flat_map(|step| {
            step.outputs.keys().map(move |name| ExpressionCandidate {
                expression: format!("{STEP_REFERENCE_PREFIX}{}.outputs.{name}", step.step_id),
                source: CandidateSource::StepOutput {
                    step_id: step.step_id.clone(),
                },
            })
        });

    let context = CONTEXT_TOKENS.iter().map(|token| ExpressionCandidate {
        expression: (*token).to_string(),
        source: CandidateSource::Context,
    });

    inputs.chain(outputs).chain(context).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arazzo_types::{BranchAction, InputSchema, Reusable, Step};
    use indexmap::indexmap;
    use serde_json::json;

    use crate::workflow::actions::goto_action;

    fn workflow() -> Workflow {
        let mut first = Step::new("a");
        first.on_success = Some(vec![goto_action("b")]);
        first.on_failure = Some(vec![Reusable::Inline(BranchAction::Goto {
            name: "goto-other".into(),
            step_id: None,
            workflow_id: Some("other".into()),
            criteria: Vec::new(),
        })]);
        first.outputs = indexmap! { "id".to_string() => "$response.body#/id".to_string() };
        let mut second = Step::new("b");
        second.on_failure = Some(vec![Reusable::Inline(BranchAction::Retry {
            name: "retry-b".into(),
            step_id: Some("b".into()),
            workflow_id: None,
            retry_after: None,
            retry_limit: Some(2),
            criteria: Vec::new(),
        })]);
        second.outputs = indexmap! { "status".to_string() => "$statusCode".to_string() };

        let mut inputs = InputSchema::object();
        inputs.properties.insert("user".into(), json!({ "type": "string" }));

        let mut workflow = Workflow::new("main");
        workflow.inputs = Some(inputs);
        workflow.steps = vec![first, second];
        workflow
    }

    #[test]
    fn connections_skip_cross_workflow_jumps() {
        let edges = connections(&workflow());
        assert_eq!(
            edges,
            vec![
                Connection {
                    source: "a".into(),
                    target: "b".into(),
                    branch: Branch::Success,
                    kind: ActionKind::Goto,
                    name: "goto-b".into(),
                },
                Connection {
                    source: "b".into(),
                    target: "b".into(),
                    branch: Branch::Failure,
                    kind: ActionKind::Retry,
                    name: "retry-b".into(),
                },
            ]
        );
    }

    #[test]
    fn candidates_exclude_the_edited_step() {
        let expressions: Vec<String> = expression_candidates(&workflow(), Some("b"))
            .into_iter()
            .map(|candidate| candidate.expression)
            .collect();

        assert_eq!(expressions[0], "$inputs.user");
        assert_eq!(expressions[1], "$steps.a.outputs.id");
        assert!(!expressions.iter().any(|expression| expression.starts_with("$steps.b.")));
        assert_eq!(expressions.len(), 2 + CONTEXT_TOKENS.len());
    }

    #[test]
    fn candidates_without_focus_cover_all_steps() {
        let candidates = expression_candidates(&workflow(), None);
        assert!(candidates.contains(&ExpressionCandidate {
            expression: "$steps.b.outputs.status".into(),
            source: CandidateSource::StepOutput { step_id: "b".into() },
        }));
    }
}
