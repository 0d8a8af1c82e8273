//! Typed prompt templates with named slots.
//!
//! A [`PromptTemplate`] is validated once at construction: the Handlebars
//! source must compile and every required slot must be referenced. Rendering
//! afterwards can only fail inside Handlebars itself.

use crate::types::PromptDefinition;
use docchat_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde::Serialize;
use std::collections::HashSet;

/// Fixed sentence the model must answer with when the context is insufficient.
pub const REFUSAL_SENTENCE: &str =
    "I do not have enough information to answer this based on the provided documents.";

/// Slot names a template may reference.
pub const KNOWN_SLOTS: [&str; 3] = ["context", "question", "history"];

/// Instruction used for grounded answers.
///
/// History is only rendered when the conversation has prior turns.
pub const DEFAULT_ANSWER_TEMPLATE: &str = r#"You are a helpful assistant. Use the following pieces of context to answer the question at the end.
If the answer is not in the context, say "I do not have enough information to answer this based on the provided documents." and do not try to make up an answer.

{{#if history}}Conversation so far:
{{history}}

{{/if}}Context:
{{context}}

Question: {{question}}
Helpful Answer:"#;

/// Rewrites a follow-up question into a standalone one.
pub const CONDENSE_TEMPLATE: &str = r#"Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.

Chat History:
{{history}}
Follow Up Input: {{question}}
Standalone question:"#;

const TEMPLATE_NAME: &str = "prompt";

/// Values bound to the named slots at render time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptSlots<'a> {
    pub context: &'a str,
    pub question: &'a str,
    pub history: &'a str,
}

/// A compiled template with validated slots.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    id: String,
    source: String,
    required_slots: Vec<String>,
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    /// Compile `template` and check that each of `required_slots` is a known
    /// slot referenced by the template.
    pub fn new(
        id: impl Into<String>,
        template: impl Into<String>,
        required_slots: &[&str],
    ) -> AppResult<Self> {
        let id = id.into();
        let source = template.into();

        if source.trim().is_empty() {
            return Err(AppError::Prompt(format!("Template '{}' is empty", id)));
        }

        let referenced = referenced_names(&source);
        for slot in required_slots {
            if !KNOWN_SLOTS.contains(slot) {
                return Err(AppError::Prompt(format!(
                    "Template '{}' requires unknown slot '{}' (known: {})",
                    id,
                    slot,
                    KNOWN_SLOTS.join(", ")
                )));
            }
            if !referenced.contains(*slot) {
                return Err(AppError::Prompt(format!(
                    "Template '{}' does not reference required slot '{}'",
                    id, slot
                )));
            }
        }

        let mut registry = Handlebars::new();
        // Plain text, never HTML
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(TEMPLATE_NAME, &source)
            .map_err(|e| AppError::Prompt(format!("Failed to compile template '{}': {}", id, e)))?;

        Ok(Self {
            id,
            source,
            required_slots: required_slots.iter().map(|s| s.to_string()).collect(),
            registry,
        })
    }

    /// The built-in grounded-answer template.
    pub fn answer_default() -> AppResult<Self> {
        Self::new(
            "docchat.answer",
            DEFAULT_ANSWER_TEMPLATE,
            &["context", "question", "history"],
        )
    }

    /// The built-in question-condensing template.
    pub fn condense_default() -> AppResult<Self> {
        Self::new("docchat.condense", CONDENSE_TEMPLATE, &["history", "question"])
    }

    /// Build a template from a loaded YAML definition.
    pub fn from_definition(definition: &PromptDefinition) -> AppResult<Self> {
        let slots: Vec<&str> = definition
            .required_slots
            .iter()
            .map(String::as_str)
            .collect();
        Self::new(definition.id.clone(), definition.template.clone(), &slots)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn required_slots(&self) -> &[String] {
        &self.required_slots
    }

    /// Whether the template mentions `slot` anywhere.
    pub fn references(&self, slot: &str) -> bool {
        referenced_names(&self.source).contains(slot)
    }

    /// Render the template. Slot values are inserted verbatim.
    pub fn render(&self, slots: &PromptSlots<'_>) -> AppResult<String> {
        self.registry
            .render(TEMPLATE_NAME, slots)
            .map_err(|e| AppError::Prompt(format!("Failed to render template '{}': {}", self.id, e)))
    }
}

/// Collect identifiers appearing inside `{{ ... }}` expressions.
fn referenced_names(template: &str) -> HashSet<String> {
    let mut names = HashSet::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };

        for token in after[..end].split_whitespace() {
            let name = token.trim_matches(|c: char| "{}#/~&^()>!".contains(c));
            if !name.is_empty() {
                names.insert(name.to_string());
            }
        }
        rest = &after[end + 2..];
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_carries_refusal_sentence() {
        let template = PromptTemplate::answer_default().unwrap();
        assert!(template.source().contains(REFUSAL_SENTENCE));
        assert_eq!(template.required_slots().len(), 3);
    }

    #[test]
    fn test_render_without_history() {
        let template = PromptTemplate::answer_default().unwrap();
        let rendered = template
            .render(&PromptSlots {
                context: "The sky is blue.",
                question: "What color is the sky?",
                history: "",
            })
            .unwrap();

        assert!(rendered.contains("Context:\nThe sky is blue."));
        assert!(rendered.contains("Question: What color is the sky?"));
        assert!(!rendered.contains("Conversation so far"));
    }

    #[test]
    fn test_render_history_once() {
        let template = PromptTemplate::answer_default().unwrap();
        let history = "Human: Who wrote it?\nAssistant: Ada.";
        let rendered = template
            .render(&PromptSlots {
                context: "ctx",
                question: "When?",
                history,
            })
            .unwrap();

        assert_eq!(rendered.matches(history).count(), 1);
    }

    #[test]
    fn test_values_are_not_escaped_or_interpreted() {
        let template = PromptTemplate::new("t", "{{context}}|{{question}}", &["context", "question"])
            .unwrap();
        let rendered = template
            .render(&PromptSlots {
                context: "a < b & {{question}}",
                question: "q",
                history: "",
            })
            .unwrap();

        assert_eq!(rendered, "a < b & {{question}}|q");
    }

    #[test]
    fn test_missing_required_slot_is_rejected() {
        let err = PromptTemplate::new("t", "Only {{context}}", &["context", "question"]).unwrap_err();
        assert!(err.to_string().contains("question"));
    }

    #[test]
    fn test_unknown_slot_is_rejected() {
        let err = PromptTemplate::new("t", "{{mood}}", &["mood"]).unwrap_err();
        assert!(err.to_string().contains("unknown slot"));
    }

    #[test]
    fn test_invalid_handlebars_is_rejected() {
        let result = PromptTemplate::new("t", "{{#if context}}{{context}} {{question}}", &["context"]);
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_triple_stash_counts_as_reference() {
        let template =
            PromptTemplate::new("t", "{{{context}}} {{ question }}", &["context", "question"]).unwrap();
        assert!(template.references("context"));
        assert!(!template.references("history"));
    }

    #[test]
    fn test_condense_template() {
        let template = PromptTemplate::condense_default().unwrap();
        let rendered = template
            .render(&PromptSlots {
                question: "And the second one?",
                history: "Human: Who wrote chapter one?\nAssistant: Ada.",
                ..Default::default()
            })
            .unwrap();

        assert!(rendered.contains("Follow Up Input: And the second one?"));
        assert!(rendered.ends_with("Standalone question:"));
    }
}
