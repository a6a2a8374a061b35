//! Ollama-backed text generation for the interview engine.
//!
//! Wraps the Ollama `/api/generate` endpoint behind the engine's
//! `NarrativeGenerator` seam. The engine supplies deterministic
//! fallbacks for every generation call, so this client reports
//! failures instead of retrying.

mod client;

pub use client::{clean_response, OllamaClient};

#[cfg(test)]
mod tests;
