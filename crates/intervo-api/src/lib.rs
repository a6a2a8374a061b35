//! HTTP transport for the interview orchestration engine.

pub mod interviews;
