//! LLM Provider implementations for Robert.
//!
//! All providers implement the `robert_core::Provider` trait. The only
//! backend today is OpenRouter, spoken to over the OpenAI-compatible
//! chat completions API.

pub mod openrouter;

pub use openrouter::OpenRouterProvider;

/// Provider names accepted in the `provider` config field.
pub const SUPPORTED_PROVIDERS: &[&str] = &["openrouter"];
