//! Concrete embedding providers.

pub mod hash;
pub mod ollama;

pub use hash::HashProvider;
pub use ollama::OllamaProvider;
