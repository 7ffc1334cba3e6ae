//! Strongly typed workflow schema definitions shared across the engine and its hosts.
//!
//! The models mirror the Arazzo authoring format: camelCase keys on the wire,
//! optional fields omitted when absent, and author order preserved (via `IndexMap`)
//! for inputs and outputs so editors render them in a predictable sequence.

pub mod validation;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One ordered orchestration of steps with declared inputs and outputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Identifier, unique within the document (for example, `adopt_pet`).
    pub workflow_id: String,
    /// Optional short summary surfaced in pickers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Optional long-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON-schema style input declaration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<InputSchema>,
    /// Workflows that must complete before this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Ordered steps.
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Workflow-wide success actions applied to every step without its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_actions: Option<Vec<Reusable<BranchAction>>>,
    /// Workflow-wide failure actions applied to every step without its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_actions: Option<Vec<Reusable<BranchAction>>>,
    /// Workflow outputs keyed by name, preserving author order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, String>,
    /// Parameters applied to every step of the workflow.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Reusable<Parameter>>,
}

impl Workflow {
    /// Creates an empty workflow with the given identifier.
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            ..Self::default()
        }
    }

    /// Looks up a step by identifier.
    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.step_id == step_id)
    }

    /// Returns true when a step with the identifier exists.
    pub fn contains_step(&self, step_id: &str) -> bool {
        self.step(step_id).is_some()
    }
}

/// Input declaration for a workflow, written as a JSON schema object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InputSchema {
    /// Schema type; `object` for every authored workflow.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Named input properties in author order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, JsonValue>,
    /// Names of required inputs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Remaining schema keywords carried through untouched.
    #[serde(flatten)]
    pub extra: IndexMap<String, JsonValue>,
}

impl InputSchema {
    /// Returns an empty `object` schema.
    pub fn object() -> Self {
        Self {
            schema_type: Some("object".to_string()),
            ..Self::default()
        }
    }
}

/// A single unit of work within a workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Identifier, unique within the owning workflow.
    pub step_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operation identifier inside one of the source descriptions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// JSON pointer to an operation inside a source description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_path: Option<String>,
    /// Sub-workflow invoked by this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Reusable<Parameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub success_criteria: Vec<Criterion>,
    /// Success branch. `None` means "no actions" and is distinct from an empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<Vec<Reusable<BranchAction>>>,
    /// Failure branch with the same absent/empty distinction as `on_success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<Vec<Reusable<BranchAction>>>,
    /// Step outputs keyed by name, preserving author order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, String>,
}

impl Step {
    /// Creates a step with only an identifier.
    pub fn new(step_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            ..Self::default()
        }
    }
}

/// Named parameter bound to an operation input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// Location tag; omitted for sub-workflow parameters.
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ParameterLocation>,
    /// Literal value or expression string.
    pub value: JsonValue,
}

/// Location of a parameter within the request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

/// Request payload sent with the step's operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replacements: Vec<PayloadReplacement>,
}

/// Targeted value substitution applied to a request payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadReplacement {
    pub target: String,
    pub value: JsonValue,
}

/// Condition evaluated against a step's response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Criterion {
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Criterion dialect (`simple`, `regex`, `jsonpath`, or an object with a version).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub criterion_type: Option<JsonValue>,
}

impl Criterion {
    /// Builds a simple criterion from a condition string.
    pub fn simple(condition: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            context: None,
            criterion_type: None,
        }
    }
}

/// Outcome handler attached to a step's success or failure branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum BranchAction {
    /// Stop the workflow.
    End {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        criteria: Vec<Criterion>,
    },
    /// Continue at another step or workflow.
    Goto {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workflow_id: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        criteria: Vec<Criterion>,
    },
    /// Retry, optionally continuing at another step or workflow afterwards.
    Retry {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workflow_id: Option<String>,
        /// Delay in seconds before retrying.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retry_after: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retry_limit: Option<u32>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        criteria: Vec<Criterion>,
    },
}

impl BranchAction {
    /// Builds a `goto` action targeting a step in the same workflow.
    pub fn goto_step(name: impl Into<String>, step_id: impl Into<String>) -> Self {
        Self::Goto {
            name: name.into(),
            step_id: Some(step_id.into()),
            workflow_id: None,
            criteria: Vec::new(),
        }
    }

    /// Builds an `end` action.
    pub fn end(name: impl Into<String>) -> Self {
        Self::End {
            name: name.into(),
            criteria: Vec::new(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::End { .. } => ActionKind::End,
            Self::Goto { .. } => ActionKind::Goto,
            Self::Retry { .. } => ActionKind::Retry,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::End { name, .. } | Self::Goto { name, .. } | Self::Retry { name, .. } => name,
        }
    }

    pub fn name_mut(&mut self) -> &mut String {
        match self {
            Self::End { name, .. } | Self::Goto { name, .. } | Self::Retry { name, .. } => name,
        }
    }

    /// Target step identifier; always `None` for `end`.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            Self::End { .. } => None,
            Self::Goto { step_id, .. } | Self::Retry { step_id, .. } => step_id.as_deref(),
        }
    }

    /// Target workflow identifier; always `None` for `end`.
    pub fn workflow_id(&self) -> Option<&str> {
        match self {
            Self::End { .. } => None,
            Self::Goto { workflow_id, .. } | Self::Retry { workflow_id, .. } => workflow_id.as_deref(),
        }
    }

    /// Replaces the target step. Has no effect on `end` actions.
    pub fn set_step_id(&mut self, target: impl Into<String>) {
        match self {
            Self::End { .. } => {}
            Self::Goto { step_id, .. } | Self::Retry { step_id, .. } => *step_id = Some(target.into()),
        }
    }

    /// Replaces the target workflow. Has no effect on `end` actions.
    pub fn set_workflow_id(&mut self, target: impl Into<String>) {
        match self {
            Self::End { .. } => {}
            Self::Goto { workflow_id, .. } | Self::Retry { workflow_id, .. } => *workflow_id = Some(target.into()),
        }
    }
}

/// Discriminant of a [`BranchAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    End,
    Goto,
    Retry,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::End => "end",
            Self::Goto => "goto",
            Self::Retry => "retry",
        })
    }
}

/// Value that is either written inline or points into the shared `components` registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Reusable<T> {
    /// Pointer into `components` (for example, `$components.successActions.notify`).
    Reference(ReusableReference),
    /// Value authored in place.
    Inline(T),
}

impl<T> Reusable<T> {
    pub fn as_inline(&self) -> Option<&T> {
        match self {
            Self::Inline(value) => Some(value),
            Self::Reference(_) => None,
        }
    }

    pub fn as_inline_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Inline(value) => Some(value),
            Self::Reference(_) => None,
        }
    }
}

impl<T> From<T> for Reusable<T> {
    fn from(value: T) -> Self {
        Self::Inline(value)
    }
}

/// Reference half of [`Reusable`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReusableReference {
    pub reference: String,
    /// Override value, only meaningful for parameter references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
}
