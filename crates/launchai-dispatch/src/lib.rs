//! LaunchAI dispatch — turns a chat request into one AI response.
//!
//! This crate contains:
//! - **prompt**: system prompt + business context rendering, turn assembly
//! - **pricing**: per-provider token price table and cost estimates
//! - **dispatcher**: ordered provider fallback with backoff and timeouts

pub mod dispatcher;
pub mod pricing;
pub mod prompt;

pub use dispatcher::{DispatchPolicy, Dispatcher};
pub use pricing::PriceTable;
pub use prompt::{assemble_turns, build_system_prompt, render_context};
