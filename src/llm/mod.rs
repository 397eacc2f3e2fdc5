//! LLM providers, fan-out and judge synthesis

pub(crate) mod client;
mod fanout;
mod judge;
mod panel;
mod provider;

pub use client::*;
pub use fanout::*;
pub use judge::*;
pub use panel::*;
pub use provider::*;
