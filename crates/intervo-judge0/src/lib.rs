// Judge0 sandbox client for Intervo
//
// Provides Judge0Client which implements the SandboxRunner trait
// from intervo-core.

mod client;
pub mod types;

pub use client::{language_id, Judge0Client};

#[cfg(test)]
mod tests;
