//! Workflow-level building blocks used by the reducer.
//!
//! Each submodule works on plain document types and knows nothing about editor state.

pub mod actions;
pub mod document;
pub mod integrity;
pub mod steps;
pub mod views;
