//! Top-level Arazzo document: metadata, source registry, and workflows.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::workflow::Workflow;

/// Version written into documents created from scratch.
pub const DEFAULT_ARAZZO_VERSION: &str = "1.0.1";

/// The top-level editable unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArazzoDocument {
    /// Format version (for example, `1.0.1`).
    pub arazzo: String,
    pub info: Info,
    /// Named external operation catalogs referenced by steps.
    #[serde(default)]
    pub source_descriptions: Vec<SourceDescription>,
    /// Ordered workflows; the editor tracks the active one by index.
    #[serde(default)]
    pub workflows: Vec<Workflow>,
    /// Shared registry of reusable parameters and actions, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<JsonValue>,
}

impl Default for ArazzoDocument {
    fn default() -> Self {
        Self {
            arazzo: DEFAULT_ARAZZO_VERSION.to_string(),
            info: Info::default(),
            source_descriptions: Vec::new(),
            workflows: Vec::new(),
            components: None,
        }
    }
}

impl ArazzoDocument {
    /// Looks up a workflow by identifier.
    pub fn workflow(&self, workflow_id: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|workflow| workflow.workflow_id == workflow_id)
    }

    /// Returns the position of a workflow by identifier.
    pub fn workflow_index(&self, workflow_id: &str) -> Option<usize> {
        self.workflows.iter().position(|workflow| workflow.workflow_id == workflow_id)
    }

    /// Looks up a source description by name.
    pub fn source(&self, name: &str) -> Option<&SourceDescription> {
        self.source_descriptions.iter().find(|source| source.name == name)
    }
}

/// Document metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Info {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "Untitled workflow".to_string(),
            summary: None,
            description: None,
            version: "1.0.0".to_string(),
        }
    }
}

/// Named external catalog (an API description or another Arazzo document).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDescription {
    pub name: String,
    pub url: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SourceKind>,
}

/// Kind of catalog a [`SourceDescription`] points to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Openapi,
    Arazzo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_fixture_document_parses() {
        let yaml_text = include_str!("../fixtures/adopt_pet.arazzo.yaml");
        let document: ArazzoDocument = serde_yaml::from_str(yaml_text).expect("parse fixture document");

        assert_eq!(document.arazzo, "1.0.1");
        assert_eq!(document.source_descriptions.len(), 1);
        assert_eq!(document.source("petstore").map(|source| source.kind), Some(Some(SourceKind::Openapi)));
        let workflow = document.workflow("adopt_pet").expect("adopt_pet workflow");
        assert_eq!(workflow.steps.len(), 3);
        assert!(workflow.contains_step("find_pet"));
        assert_eq!(document.workflow_index("adopt_pet"), Some(0));
    }

    #[test]
    fn default_document_serializes_minimal_shape() {
        let json = serde_json::to_value(ArazzoDocument::default()).expect("serialize document");

        assert_eq!(
            json,
            serde_json::json!({
                "arazzo": "1.0.1",
                "info": { "title": "Untitled workflow", "version": "1.0.0" },
                "sourceDescriptions": [],
                "workflows": []
            })
        );
    }
}
