//! Error and warning types surfaced by the mutation engine.
//!
//! Structural failures are [`EditError`]s and always reject the operation before the
//! document changes. References left dangling by a removal are not failures; they are
//! returned alongside the new document as [`DanglingReference`] warnings so the host
//! can offer to redirect them.

use std::fmt;

use thiserror::Error;

/// Identifier namespaces the engine enforces uniqueness or existence in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Step,
    Workflow,
    Source,
    Input,
    Output,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Step => "step",
            Self::Workflow => "workflow",
            Self::Source => "source",
            Self::Input => "input",
            Self::Output => "output",
        })
    }
}

/// Rejection raised by an edit operation. The previous revision is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The operation would create two entries sharing an identifier in one scope.
    #[error("{kind} identifier '{id}' already exists")]
    DuplicateId { kind: IdentifierKind, id: String },

    /// The operation targets an identifier absent from the document.
    #[error("{kind} '{id}' was not found")]
    NotFound { kind: IdentifierKind, id: String },

    /// The identifier cannot be embedded in expressions.
    #[error("invalid {kind} identifier '{id}': {reason}")]
    InvalidIdentifier { kind: IdentifierKind, id: String, reason: String },

    /// The operation needs an active workflow but the document has none.
    #[error("no workflow is active")]
    NoActiveWorkflow,
}

impl EditError {
    pub fn duplicate(kind: IdentifierKind, id: impl Into<String>) -> Self {
        Self::DuplicateId { kind, id: id.into() }
    }

    pub fn not_found(kind: IdentifierKind, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    /// Returns true for identifier collisions.
    pub fn is_duplicate_id(&self) -> bool {
        matches!(self, Self::DuplicateId { .. })
    }

    /// Returns true for missing targets.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Validates an identifier, mapping failures onto [`EditError::InvalidIdentifier`].
pub(crate) fn ensure_identifier(kind: IdentifierKind, candidate: &str) -> Result<(), EditError> {
    arazzo_types::validate_identifier(candidate).map_err(|reason| EditError::InvalidIdentifier {
        kind,
        id: candidate.to_string(),
        reason,
    })
}

/// What a dangling reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// `$steps.<id>` inside an expression string.
    StepExpression,
    /// `$inputs.<name>` inside an expression string.
    InputExpression,
    /// A `goto`/`retry` action naming a missing step.
    BranchTarget,
    /// A step, action, or dependency naming another workflow by identifier.
    WorkflowReference,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StepExpression => "step expression",
            Self::InputExpression => "input expression",
            Self::BranchTarget => "branch target",
            Self::WorkflowReference => "workflow reference",
        })
    }
}

/// Warning describing a reference that no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub kind: ReferenceKind,
    /// Identifier that no longer exists.
    pub missing_id: String,
    /// Workflow holding the reference.
    pub workflow_id: String,
    /// Step holding the reference; `None` for workflow-level fields.
    pub step_id: Option<String>,
    /// Field path of the reference within its holder (for example, `parameters.petId`).
    pub source_path: String,
    /// Raw expression text or action name.
    pub text: String,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.step_id {
            Some(step_id) => write!(f, "workflow '{}' step '{}'", self.workflow_id, step_id)?,
            None => write!(f, "workflow '{}'", self.workflow_id)?,
        }
        write!(
            f,
            " {} has a dangling {} to '{}': {}",
            self.source_path, self.kind, self.missing_id, self.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_message_names_kind_and_id() {
        let error = EditError::duplicate(IdentifierKind::Step, "find_pet");
        assert_eq!(error.to_string(), "step identifier 'find_pet' already exists");
        assert!(error.is_duplicate_id());
        assert!(!error.is_not_found());
    }

    #[test]
    fn invalid_identifier_carries_reason() {
        let error = ensure_identifier(IdentifierKind::Workflow, "bad id").expect_err("space is rejected");
        assert!(matches!(error, EditError::InvalidIdentifier { kind: IdentifierKind::Workflow, .. }));
        assert!(error.to_string().contains("letters, numbers"));
    }

    #[test]
    fn dangling_reference_display_includes_location() {
        let warning = DanglingReference {
            kind: ReferenceKind::StepExpression,
            missing_id: "find_pet".into(),
            workflow_id: "adopt_pet".into(),
            step_id: Some("place_order".into()),
            source_path: "parameters.petId".into(),
            text: "$steps.find_pet.outputs.petId".into(),
        };
        assert_eq!(
            warning.to_string(),
            "workflow 'adopt_pet' step 'place_order' parameters.petId has a dangling step expression to 'find_pet': $steps.find_pet.outputs.petId"
        );
    }
}
