//! Shared type definitions for Arazzo Studio.
//!
//! The document model lives in [`workflow`]; the engine, the CLI host, and any
//! rendering surface consume these types directly.

pub mod document;
pub mod workflow;

pub use document::{ArazzoDocument, Info, SourceDescription, SourceKind};
pub use workflow::validation::{is_identifier_char, validate_identifier};
pub use workflow::{
    ActionKind, BranchAction, Criterion, InputSchema, Parameter, ParameterLocation, PayloadReplacement, RequestBody, Reusable,
    ReusableReference, Step, Workflow,
};
