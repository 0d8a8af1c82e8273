//! Prompt templates for docchat.
//!
//! This crate provides typed prompt management with:
//! - Named-slot templates validated at construction
//! - Handlebars rendering without HTML escaping
//! - YAML-based prompt definitions for custom instructions

pub mod loader;
pub mod template;
pub mod types;

// Re-export main types
pub use loader::{load_template, parse_template};
pub use template::{
    PromptSlots, PromptTemplate, CONDENSE_TEMPLATE, DEFAULT_ANSWER_TEMPLATE, KNOWN_SLOTS,
    REFUSAL_SENTENCE,
};
pub use types::PromptDefinition;
