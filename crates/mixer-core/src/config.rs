//! Identity attached to every mixer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Naming information for a mixer instance.
///
/// The core only reads [`display_name`](Self::display_name), to label
/// diagnostic scopes and log lines. It never influences accept or process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixerConfig {
    /// Name shown in diagnostics.
    pub name: String,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MixerConfig {
    /// Creates a config with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the name used to label diagnostics.
    pub fn display_name(&self) -> &str {
        &self.name
    }
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self::new("unnamed")
    }
}

impl From<&str> for MixerConfig {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for MixerConfig {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for MixerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_without_description() {
        let config: MixerConfig = serde_json::from_str(r#"{ "name": "billing" }"#).unwrap();
        assert_eq!(config.display_name(), "billing");
        assert!(config.description.is_none());
    }

    #[test]
    fn test_default_is_unnamed() {
        assert_eq!(MixerConfig::default().to_string(), "unnamed");
    }
}
