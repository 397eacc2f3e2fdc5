//! llm-panel - ask several LLMs the same question and let one of them judge
//!
//! A query is classified first. Simple queries go to a single fast-path
//! provider; everything else is fanned out to every panel member
//! concurrently, and a judge provider evaluates the answers that came back
//! and writes the final one.

pub mod config;
pub mod error;
pub mod llm;
pub mod progress;
pub mod report;
pub mod router;
pub mod session;
