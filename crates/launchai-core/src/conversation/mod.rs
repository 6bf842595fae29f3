//! Conversation store — in-memory cache + JSONL file persistence.
//!
//! Records the user/assistant turns of successful exchanges and one usage
//! record per completion. Persistence is best-effort: write failures are
//! logged, never surfaced to the chat caller.
//!
//! # Disk format (JSONL)
//!
//! Each conversation is a `.jsonl` file under `~/.launchai/conversations/`.
//! - Line 1: `{"_type":"metadata","id":"...","created_at":"...","updated_at":"..."}`
//! - Turns: `{"_type":"turn","role":"user","content":"...","timestamp":"..."}`
//! - Usage: `{"_type":"usage","provider":"anthropic","model":"...","input_tokens":1,...}`

pub mod store;

pub use store::{Conversation, ConversationStore, ConversationSummary, StoredTurn, UsageRecord};
