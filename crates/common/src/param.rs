//! Declared-parameter metadata

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata for one declared parameter on an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Whether a value must be present at binding time
    pub required: bool,

    /// Default value applied when no caller or shared value is given
    #[serde(default)]
    pub default: Option<Value>,

    /// Human-readable description, used by the smart resolver catalogue
    #[serde(default)]
    pub description: String,
}

impl ParamSpec {
    /// A required parameter with no default
    pub fn required() -> Self {
        Self {
            required: true,
            default: None,
            description: String::new(),
        }
    }

    /// An optional parameter with no default
    pub fn optional() -> Self {
        Self {
            required: false,
            default: None,
            description: String::new(),
        }
    }

    /// Set the default value
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Default for ParamSpec {
    fn default() -> Self {
        Self::optional()
    }
}
