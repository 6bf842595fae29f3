//! LaunchAI core — shared types, configuration, and persistence helpers.
//!
//! - [`types`] — conversation turns, business context, dispatch results
//! - [`config`] — typed config schema, JSON loader, env overrides
//! - [`conversation`] — best-effort JSONL conversation + usage store
//! - [`insights`] — static marketing insights lookup table
//! - [`utils`] — data paths and string helpers

pub mod config;
pub mod conversation;
pub mod insights;
pub mod types;
pub mod utils;

pub use types::{
    AttemptOutcome, AttemptRecord, BusinessContext, Completion, DispatchRequest, DispatchResult,
    Role, Turn, Usage,
};
