//! Prompt types for docchat.

use serde::{Deserialize, Serialize};

/// A prompt definition loaded from YAML.
///
/// ```yaml
/// id: legal.strict
/// title: Strict legal answers
/// requiredSlots: [context, question, history]
/// template: |
///   Answer from the excerpts only.
///   {{context}}
///   ...
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// Optional free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Template string with Handlebars syntax
    pub template: String,

    /// Slots the template must reference; defaults to `context` and `question`
    #[serde(default = "default_required_slots")]
    pub required_slots: Vec<String>,
}

fn default_required_slots() -> Vec<String> {
    vec!["context".to_string(), "question".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: test.prompt
title: Test Prompt
requiredSlots: [context, question, history]
template: "{{history}} {{context}} {{question}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "test.prompt");
        assert_eq!(def.required_slots, vec!["context", "question", "history"]);
        assert!(def.description.is_none());
    }

    #[test]
    fn test_required_slots_default() {
        let yaml = "id: a\ntitle: A\ntemplate: \"{{context}} {{question}}\"\n";
        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.required_slots, vec!["context", "question"]);
    }
}
