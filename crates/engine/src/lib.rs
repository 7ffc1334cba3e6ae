//! # Arazzo Engine
//!
//! The editing model behind Arazzo Studio. It keeps a workflow document consistent
//! while canvases, inspectors, and text editors change it: step identifiers stay
//! unique, `goto`/`retry` targets keep resolving, and `$steps.<id>` expressions
//! follow renames.
//!
//! ## Usage
//!
//! ```rust
//! use arazzo_engine::{EditOperation, EditorState, apply, parse_document_str};
//! use arazzo_types::Step;
//!
//! let document = parse_document_str(r#"
//! arazzo: 1.0.1
//! info: { title: Demo, version: 1.0.0 }
//! workflows:
//!   - workflowId: demo
//!     steps:
//!       - stepId: first
//! "#)?;
//!
//! let state = EditorState::new(document);
//! let outcome = apply(&state, EditOperation::AddStep(Step::new("second")))?;
//! assert_eq!(outcome.state.active_workflow().map(|workflow| workflow.steps.len()), Some(2));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`expressions`**: prefix-bounded scanning and rewriting of `$steps.*`/`$inputs.*`
//! - **`workflow`**: branch actions, the step collection, the workflow/source registry,
//!   integrity checks, and read-only views
//! - **`editor`**: editor state, the operation catalog, the pure reducer, and the
//!   serialized session queue
//! - **`error`**: rejections and dangling-reference warnings

use std::{fmt, fs, path::Path, str::FromStr};

use anyhow::{Context, Result};
use arazzo_types::ArazzoDocument;
use serde::{Deserialize, Serialize};

pub mod config;
pub mod editor;
pub mod error;
pub mod expressions;
pub mod workflow;

pub use config::EngineConfig;
pub use editor::{
    DocumentRegion, EditOperation, EditOutcome, EditorState, Revision, Selection, SessionError, SessionHandle, StepPatch, WorkflowPatch,
    apply, apply_with,
};
pub use error::{DanglingReference, EditError, IdentifierKind, ReferenceKind};
pub use workflow::integrity::{DocumentReport, IntegrityReport, check_document, check_workflow};
pub use workflow::views::{Branch, CandidateSource, Connection, ExpressionCandidate, connections, expression_candidates};

/// Text formats a document can be read from or written to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Guesses the format from a file extension, defaulting to YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some(extension) if extension.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        })
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(format!("unsupported document format '{other}' (expected yaml or json)")),
        }
    }
}

/// Parses a document from YAML or JSON text.
pub fn parse_document_str(content: &str) -> Result<ArazzoDocument> {
    serde_yaml::from_str(content).context("document is not a valid Arazzo YAML/JSON document")
}

/// Loads a document from the filesystem.
///
/// YAML is a superset of the JSON documents Arazzo tools emit, so one parser covers both.
pub fn parse_document_file(file_path: impl AsRef<Path>) -> Result<ArazzoDocument> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path).with_context(|| format!("failed to read document: {}", file_path.display()))?;
    parse_document_str(&content).with_context(|| format!("failed to parse document: {}", file_path.display()))
}

/// Serializes a document in the requested format.
pub fn render_document(document: &ArazzoDocument, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Yaml => serde_yaml::to_string(document).context("failed to render document as YAML"),
        DocumentFormat::Json => serde_json::to_string_pretty(document).context("failed to render document as JSON"),
    }
}
