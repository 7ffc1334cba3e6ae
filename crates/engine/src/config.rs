//! Tunables for the mutation engine.

use serde::{Deserialize, Serialize};

/// Prefix used when the engine has to invent a step identifier.
pub const DEFAULT_STEP_PREFIX: &str = "step";

/// Prefix used when the engine has to invent a workflow identifier.
pub const DEFAULT_WORKFLOW_PREFIX: &str = "workflow";

/// Engine settings. Hosts usually embed this in their own configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Steps added with an empty identifier are named `<prefix>-<n>`.
    pub generated_step_prefix: String,
    /// Workflows added with an empty identifier are named `<prefix>-<n>`.
    pub generated_workflow_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generated_step_prefix: DEFAULT_STEP_PREFIX.to_string(),
            generated_workflow_prefix: DEFAULT_WORKFLOW_PREFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "generated_step_prefix": "node" }"#).expect("parse config");
        assert_eq!(config.generated_step_prefix, "node");
        assert_eq!(config.generated_workflow_prefix, DEFAULT_WORKFLOW_PREFIX);
    }
}
