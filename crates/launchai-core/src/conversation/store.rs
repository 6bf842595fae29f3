//! Conversation persistence and caching.
//!
//! File format: JSONL in `~/.launchai/conversations/{safe_id}.jsonl`, one
//! tagged record per line (see the module docs).

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{DispatchResult, Role, Turn};
use crate::utils;

// ─────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────

/// A persisted conversation turn.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoredTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Token usage and cost of one completion, with provenance.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UsageRecord {
    pub provider: String,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
}

/// One line of a conversation file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_type", rename_all = "lowercase")]
enum Record {
    Metadata {
        id: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
    Turn(StoredTurn),
    Usage(UsageRecord),
}

/// A conversation with its turns and usage history.
#[derive(Clone, Debug)]
pub struct Conversation {
    pub id: String,
    pub turns: Vec<StoredTurn>,
    pub usage: Vec<UsageRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    fn new(id: &str) -> Self {
        let now = Utc::now();
        Conversation {
            id: id.to_string(),
            turns: Vec::new(),
            usage: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sum of all recorded cost estimates.
    pub fn total_cost(&self) -> f64 {
        self.usage.iter().map(|u| u.cost).sum()
    }
}

// ─────────────────────────────────────────────
// ConversationStore
// ─────────────────────────────────────────────

/// Stores conversations with in-memory caching and JSONL persistence.
///
/// Writers hold the cache write lock for the whole read-modify-write,
/// including the file write, so exchanges on one id never interleave.
/// Only recorded conversations enter the cache; lookups of unknown ids
/// read through to disk and leave the cache untouched.
pub struct ConversationStore {
    /// Directory where `.jsonl` conversation files are stored.
    dir: PathBuf,
    cache: RwLock<HashMap<String, Conversation>>,
    cache_capacity: usize,
}

/// Default number of conversations kept in memory.
const DEFAULT_CACHE_CAPACITY: usize = 256;

impl ConversationStore {
    /// Create a new store.
    ///
    /// `dir` defaults to `~/.launchai/conversations/` if `None`.
    /// The directory is created if it doesn't exist.
    pub fn new(dir: Option<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.unwrap_or_else(utils::get_conversations_path);
        std::fs::create_dir_all(&dir)?;

        Ok(ConversationStore {
            dir,
            cache: RwLock::new(HashMap::new()),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        })
    }

    /// Limit how many conversations stay cached (minimum 1).
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    /// Generate a fresh conversation id.
    pub fn new_conversation_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Look up a conversation in the cache or on disk.
    ///
    /// Returns `None` for ids that were never recorded. Misses are not cached.
    pub fn get(&self, id: &str) -> Option<Conversation> {
        {
            let cache = self.cache.read().unwrap();
            if let Some(conv) = cache.get(id) {
                return Some(conv.clone());
            }
        }
        self.load_from_disk(id)
    }

    /// Record a successful exchange: the user turn, the assistant turn, and
    /// a usage row. Failed dispatches are not recorded.
    pub fn record_exchange(&self, id: &str, user_text: &str, result: &DispatchResult) {
        let DispatchResult::Success {
            text,
            provider,
            model,
            usage,
        } = result
        else {
            debug!(conversation = id, "skipping persistence of failed dispatch");
            return;
        };

        let mut cache = self.cache.write().unwrap();

        let mut conv = cache
            .remove(id)
            .or_else(|| self.load_from_disk(id))
            .unwrap_or_else(|| Conversation::new(id));

        let now = Utc::now();
        conv.turns.push(StoredTurn {
            role: Role::User,
            content: user_text.to_string(),
            timestamp: now,
        });
        conv.turns.push(StoredTurn {
            role: Role::Assistant,
            content: text.clone(),
            timestamp: now,
        });
        conv.usage.push(UsageRecord {
            provider: provider.clone(),
            model: model.clone(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cost: usage.cost_estimate,
            timestamp: now,
        });
        conv.updated_at = now;

        if let Err(e) = self.save_to_disk(&conv) {
            warn!(conversation = id, error = %e, "failed to persist conversation");
        }

        if cache.len() >= self.cache_capacity {
            evict_oldest(&mut cache);
        }
        cache.insert(id.to_string(), conv);
    }

    /// The last `max_turns` turns, ready to be replayed as history.
    ///
    /// Unknown ids yield an empty history.
    pub fn history(&self, id: &str, max_turns: usize) -> Vec<Turn> {
        let Some(conv) = self.get(id) else {
            return Vec::new();
        };
        let skip = conv.turns.len().saturating_sub(max_turns);
        conv.turns
            .into_iter()
            .skip(skip)
            .map(|t| Turn {
                role: t.role,
                content: t.content,
            })
            .collect()
    }

    /// All usage records for a conversation, oldest first.
    pub fn usage(&self, id: &str) -> Vec<UsageRecord> {
        self.get(id).map(|c| c.usage).unwrap_or_default()
    }

    /// Delete a conversation entirely (from cache and disk).
    ///
    /// Returns `true` if the conversation file existed on disk.
    pub fn delete(&self, id: &str) -> bool {
        let mut cache = self.cache.write().unwrap();
        cache.remove(id);

        let path = self.conversation_path(id);
        if !path.exists() {
            return false;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Deleted conversation file: {}", path.display());
                true
            }
            Err(e) => {
                warn!("Failed to delete conversation file: {}", e);
                false
            }
        }
    }

    /// List all conversations on disk, newest first.
    pub fn list(&self) -> Vec<ConversationSummary> {
        let mut summaries = Vec::new();

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read conversations directory: {}", e);
                return summaries;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "jsonl") {
                continue;
            }

            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            let first = std::io::BufReader::new(file).lines().next();
            if let Some(Ok(line)) = first {
                if let Ok(Record::Metadata {
                    id,
                    created_at,
                    updated_at,
                }) = serde_json::from_str::<Record>(&line)
                {
                    summaries.push(ConversationSummary {
                        id,
                        created_at,
                        updated_at,
                        path: path.clone(),
                    });
                }
            }
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries
    }

    /// Get the JSONL file path for a conversation id.
    fn conversation_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", utils::safe_filename(id)))
    }

    fn load_from_disk(&self, id: &str) -> Option<Conversation> {
        let path = self.conversation_path(id);
        if !path.exists() {
            return None;
        }

        let file = match std::fs::File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Failed to open conversation file {}: {}", path.display(), e);
                return None;
            }
        };

        let mut conv = Conversation::new(id);
        for line in std::io::BufReader::new(file).lines().map_while(Result::ok) {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Record>(&line) {
                Ok(Record::Metadata {
                    created_at,
                    updated_at,
                    ..
                }) => {
                    conv.created_at = created_at;
                    conv.updated_at = updated_at;
                }
                Ok(Record::Turn(turn)) => conv.turns.push(turn),
                Ok(Record::Usage(usage)) => conv.usage.push(usage),
                Err(e) => warn!("Skipping bad line in {}: {}", path.display(), e),
            }
        }

        debug!(
            "Loaded conversation '{}' with {} turns from disk",
            id,
            conv.turns.len()
        );
        Some(conv)
    }

    /// Save a conversation to its JSONL file.
    ///
    /// Writes a sibling `.tmp` file and renames it over the target, so
    /// readers never observe a half-written conversation.
    fn save_to_disk(&self, conv: &Conversation) -> std::io::Result<()> {
        let path = self.conversation_path(&conv.id);
        let tmp_path = path.with_extension("jsonl.tmp");
        let mut file = std::io::BufWriter::new(std::fs::File::create(&tmp_path)?);

        let meta = Record::Metadata {
            id: conv.id.clone(),
            created_at: conv.created_at,
            updated_at: conv.updated_at,
        };
        writeln!(file, "{}", serde_json::to_string(&meta)?)?;

        for turn in &conv.turns {
            writeln!(file, "{}", serde_json::to_string(&Record::Turn(turn.clone()))?)?;
        }
        for usage in &conv.usage {
            writeln!(file, "{}", serde_json::to_string(&Record::Usage(usage.clone()))?)?;
        }
        file.flush()?;
        drop(file);
        std::fs::rename(&tmp_path, &path)?;

        debug!(
            "Saved conversation '{}' ({} turns) to {}",
            conv.id,
            conv.turns.len(),
            path.display()
        );
        Ok(())
    }
}

/// Drop the least recently updated conversation from the cache.
fn evict_oldest(cache: &mut HashMap<String, Conversation>) {
    let oldest = cache
        .values()
        .min_by_key(|c| c.updated_at)
        .map(|c| c.id.clone());
    if let Some(id) = oldest {
        cache.remove(&id);
    }
}

/// Summary of a conversation for listing purposes.
#[derive(Clone, Debug)]
pub struct ConversationSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Path to the JSONL file.
    pub path: PathBuf,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Usage;
    use tempfile::tempdir;

    fn make_store() -> (ConversationStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = ConversationStore::new(Some(dir.path().to_path_buf())).unwrap();
        (store, dir)
    }

    fn success(text: &str, provider: &str, cost: f64) -> DispatchResult {
        DispatchResult::Success {
            text: text.to_string(),
            provider: provider.to_string(),
            model: format!("{provider}-model"),
            usage: Usage {
                input_tokens: 120,
                output_tokens: 340,
                cost_estimate: cost,
            },
        }
    }

    #[test]
    fn test_get_unknown_conversation() {
        let (store, _dir) = make_store();
        assert!(store.get("abc").is_none());
        assert!(store.history("abc", 20).is_empty());
        assert!(store.usage("abc").is_empty());
    }

    #[test]
    fn test_record_exchange_adds_turns_and_usage() {
        let (store, _dir) = make_store();
        store.record_exchange("c1", "How do I get leads?", &success("Run a webinar.", "anthropic", 0.01));

        let conv = store.get("c1").unwrap();
        assert_eq!(conv.id, "c1");
        assert_eq!(conv.turns.len(), 2);
        assert_eq!(conv.turns[0].role, Role::User);
        assert_eq!(conv.turns[0].content, "How do I get leads?");
        assert_eq!(conv.turns[1].role, Role::Assistant);
        assert_eq!(conv.turns[1].content, "Run a webinar.");
        assert_eq!(conv.usage.len(), 1);
        assert_eq!(conv.usage[0].provider, "anthropic");
        assert_eq!(conv.usage[0].input_tokens, 120);
    }

    #[test]
    fn test_failed_dispatch_not_recorded() {
        let (store, _dir) = make_store();
        let failed = DispatchResult::Failure {
            error_summary: "openai: 500".into(),
            attempts: vec![],
        };
        store.record_exchange("c1", "hello", &failed);
        assert!(store.get("c1").is_none());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_history_returns_last_turns_in_order() {
        let (store, _dir) = make_store();
        for i in 0..3 {
            store.record_exchange("c1", &format!("q{i}"), &success(&format!("a{i}"), "openai", 0.0));
        }

        let history = store.history("c1", 3);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0], Turn::assistant("a1"));
        assert_eq!(history[1], Turn::user("q2"));
        assert_eq!(history[2], Turn::assistant("a2"));
    }

    #[test]
    fn test_history_less_than_max() {
        let (store, _dir) = make_store();
        store.record_exchange("c1", "q", &success("a", "openai", 0.0));
        assert_eq!(store.history("c1", 50).len(), 2);
    }

    #[test]
    fn test_total_cost() {
        let (store, _dir) = make_store();
        store.record_exchange("c1", "q1", &success("a1", "anthropic", 0.25));
        store.record_exchange("c1", "q2", &success("a2", "openai", 0.5));

        let conv = store.get("c1").unwrap();
        assert_eq!(conv.total_cost(), 0.75);
        assert_eq!(store.usage("c1").len(), 2);
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempdir().unwrap();

        {
            let store = ConversationStore::new(Some(dir.path().to_path_buf())).unwrap();
            store.record_exchange("conv-42", "Hi", &success("Hello!", "anthropic", 0.002));
        }

        // New store (empty cache) should load from disk
        {
            let store = ConversationStore::new(Some(dir.path().to_path_buf())).unwrap();
            let conv = store.get("conv-42").unwrap();
            assert_eq!(conv.turns.len(), 2);
            assert_eq!(conv.usage.len(), 1);
            assert_eq!(conv.usage[0].model, "anthropic-model");
        }
    }

    #[test]
    fn test_file_format() {
        let (store, dir) = make_store();
        store.record_exchange("fmt", "test message", &success("reply", "openai", 0.0));

        let content = std::fs::read_to_string(dir.path().join("fmt.jsonl")).unwrap();
        let lines: Vec<&str> = content.trim().lines().collect();
        assert_eq!(lines.len(), 4); // metadata + 2 turns + usage

        let meta: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(meta["_type"], "metadata");
        assert_eq!(meta["id"], "fmt");

        let turn: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(turn["_type"], "turn");
        assert_eq!(turn["role"], "user");
        assert_eq!(turn["content"], "test message");

        let usage: serde_json::Value = serde_json::from_str(lines[3]).unwrap();
        assert_eq!(usage["_type"], "usage");
        assert_eq!(usage["provider"], "openai");
    }

    #[test]
    fn test_id_is_sanitized_for_filename() {
        let (store, dir) = make_store();
        store.record_exchange("../escape", "q", &success("a", "openai", 0.0));
        assert!(dir.path().join(".._escape.jsonl").exists());
        assert_eq!(store.list()[0].id, "../escape");
    }

    #[test]
    fn test_list_and_delete() {
        let (store, _dir) = make_store();
        store.record_exchange("a", "q", &success("r", "openai", 0.0));
        store.record_exchange("b", "q", &success("r", "openai", 0.0));

        let ids: Vec<String> = store.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"a".to_string()));

        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert_eq!(store.list().len(), 1);
        assert!(store.get("a").is_none());
    }

    #[test]
    fn test_new_conversation_ids_are_unique() {
        let a = ConversationStore::new_conversation_id();
        let b = ConversationStore::new_conversation_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_concurrent_exchanges_on_one_id_are_all_persisted() {
        let (store, dir) = make_store();

        std::thread::scope(|scope| {
            for i in 0..16 {
                let store = &store;
                scope.spawn(move || {
                    store.record_exchange("shared", &format!("q{i}"), &success(&format!("a{i}"), "openai", 0.001));
                });
            }
        });

        assert_eq!(store.get("shared").unwrap().turns.len(), 32);

        let reopened = ConversationStore::new(Some(dir.path().to_path_buf())).unwrap();
        let conv = reopened.get("shared").unwrap();
        assert_eq!(conv.turns.len(), 32);
        assert_eq!(conv.usage.len(), 16);

        // Every user turn is directly followed by its own answer.
        for pair in conv.turns.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].content, pair[0].content.replacen('q', "a", 1));
        }

        let content = std::fs::read_to_string(dir.path().join("shared.jsonl")).unwrap();
        assert_eq!(content.lines().count(), 1 + 32 + 16);
        assert!(content
            .lines()
            .all(|line| serde_json::from_str::<Record>(line).is_ok()));
        assert!(!dir.path().join("shared.jsonl.tmp").exists());
    }

    #[test]
    fn test_lookups_of_unknown_ids_are_not_cached() {
        let (store, _dir) = make_store();
        for i in 0..1000 {
            assert!(store.history(&format!("nope-{i}"), 20).is_empty());
            assert!(store.usage(&format!("nope-{i}")).is_empty());
        }
        assert!(store.cache.read().unwrap().is_empty());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_cache_is_bounded_and_evicted_entries_reload() {
        let dir = tempdir().unwrap();
        let store = ConversationStore::new(Some(dir.path().to_path_buf()))
            .unwrap()
            .with_cache_capacity(2);

        for id in ["a", "b", "c", "d"] {
            store.record_exchange(id, "q", &success("r", "openai", 0.0));
        }

        assert_eq!(store.cache.read().unwrap().len(), 2);
        assert_eq!(store.history("a", 20).len(), 2);
        assert_eq!(store.cache.read().unwrap().len(), 2);

        store.record_exchange("a", "q2", &success("r2", "openai", 0.0));
        assert_eq!(store.get("a").unwrap().turns.len(), 4);
    }
}
