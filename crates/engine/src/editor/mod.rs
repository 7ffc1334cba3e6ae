//! Editing model: state, operations, the pure reducer, and the serialized session.

pub mod operation;
pub mod reducer;
pub mod selection;
pub mod session;
pub mod state;
mod workflows;

pub use operation::{EditOperation, StepPatch, WorkflowPatch};
pub use reducer::{apply, apply_with};
pub use selection::{DocumentRegion, Selection};
pub use session::{Revision, SessionError, SessionHandle};
pub use state::{EditOutcome, EditorState};
