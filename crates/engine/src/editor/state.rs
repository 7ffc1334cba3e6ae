//! Editing state carried between revisions.

use arazzo_types::{ArazzoDocument, Workflow};

use crate::{
    editor::selection::Selection,
    error::{DanglingReference, EditError},
};

/// One revision of the editing session: the document, the active workflow, and focus.
///
/// The active workflow is tracked by index because workflows may be reordered.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub document: ArazzoDocument,
    pub active_workflow: Option<usize>,
    pub selection: Selection,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(ArazzoDocument::default())
    }
}

impl EditorState {
    /// Opens a document with its first workflow active and nothing selected.
    pub fn new(document: ArazzoDocument) -> Self {
        let active_workflow = (!document.workflows.is_empty()).then_some(0);
        Self {
            document,
            active_workflow,
            selection: Selection::Nothing,
        }
    }

    pub fn active_workflow(&self) -> Option<&Workflow> {
        self.active_workflow.and_then(|index| self.document.workflows.get(index))
    }

    pub fn active_workflow_id(&self) -> Option<&str> {
        self.active_workflow().map(|workflow| workflow.workflow_id.as_str())
    }

    /// Mutable access to the active workflow, failing when none is active.
    pub fn active_workflow_mut(&mut self) -> Result<&mut Workflow, EditError> {
        self.active_workflow
            .and_then(|index| self.document.workflows.get_mut(index))
            .ok_or(EditError::NoActiveWorkflow)
    }

    /// Switches the active workflow, resetting focus when the index changes.
    pub(crate) fn activate(&mut self, index: Option<usize>) {
        if self.active_workflow != index {
            self.active_workflow = index;
            self.selection.reset();
        }
    }
}

/// Result of applying one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    /// The next revision.
    pub state: EditorState,
    /// References the operation left dangling or found dangling.
    pub warnings: Vec<DanglingReference>,
    /// False when the operation was an accepted no-op.
    pub changed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_has_no_active_workflow() {
        let mut state = EditorState::default();
        assert!(state.active_workflow().is_none());
        assert_eq!(state.active_workflow_mut().map(|_| ()), Err(EditError::NoActiveWorkflow));
    }

    #[test]
    fn activating_another_workflow_resets_selection() {
        let mut state = EditorState::new(ArazzoDocument {
            workflows: vec![Workflow::new("a"), Workflow::new("b")],
            ..ArazzoDocument::default()
        });
        state.selection = Selection::step("first");

        state.activate(Some(0));
        assert_eq!(state.selection, Selection::step("first"));

        state.activate(Some(1));
        assert_eq!(state.active_workflow_id(), Some("b"));
        assert_eq!(state.selection, Selection::Nothing);
    }
}
