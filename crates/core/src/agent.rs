//! Agent prompt configuration.

use serde::{Deserialize, Serialize};

/// The prompt fragments that give an agent its voice.
///
/// One entry of the agent directory, keyed by agent name
/// (typically a domain such as `nike.com`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Brand guidelines: tone, palette, typography.
    pub brand: String,

    /// What the generated website is meant to achieve.
    pub site: String,
}

impl AgentConfig {
    pub fn new(brand: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            site: site.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_directory_entry() {
        let json = r#"{"brand": "Bold, athletic", "site": "Sell running shoes"}"#;
        let agent: AgentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(agent.brand, "Bold, athletic");
        assert_eq!(agent.site, "Sell running shoes");
    }

    #[test]
    fn missing_field_is_rejected() {
        let json = r#"{"brand": "Bold"}"#;
        assert!(serde_json::from_str::<AgentConfig>(json).is_err());
    }
}
