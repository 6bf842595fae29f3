//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent input history.
//! Conversation turns are kept in memory and, when storage is enabled,
//! recorded to the conversation store so `--conversation ID` can resume them.

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use launchai_core::conversation::ConversationStore;
use launchai_core::types::{BusinessContext, DispatchRequest, DispatchResult, Turn};
use launchai_dispatch::Dispatcher;

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Run the interactive REPL loop.
pub async fn run(
    dispatcher: Dispatcher,
    context: Option<BusinessContext>,
    store: Option<ConversationStore>,
    conversation: Option<String>,
    max_history_turns: usize,
) -> Result<()> {
    helpers::print_banner();

    let conversation_id = conversation.unwrap_or_else(ConversationStore::new_conversation_id);
    let mut history: Vec<Turn> = match &store {
        Some(store) => store.history(&conversation_id, max_history_turns),
        None => Vec::new(),
    };
    if store.is_some() {
        println!(
            "{}",
            format!(
                "Conversation {conversation_id} ({} earlier turns)",
                history.len()
            )
            .dimmed()
        );
        println!();
    }

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }
        if is_exit_command(trimmed) {
            println!("\nGoodbye! 👋");
            break;
        }

        let _ = editor.add_history_entry(&input);

        let mut request = DispatchRequest::new(trimmed).with_history(history.clone());
        if let Some(ctx) = &context {
            request = request.with_context(ctx.clone());
        }

        debug!(conversation = %conversation_id, turns = history.len(), "processing input");
        helpers::print_thinking();
        let result = dispatcher.generate(&request).await;
        helpers::clear_thinking();

        if let Some(store) = &store {
            store.record_exchange(&conversation_id, trimmed, &result);
        }

        match result {
            DispatchResult::Success {
                text,
                provider,
                model,
                usage,
            } => {
                helpers::print_response(&text);
                helpers::print_usage(&provider, &model, &usage);
                push_exchange(&mut history, trimmed, &text, max_history_turns);
            }
            DispatchResult::Failure { error_summary, .. } => {
                eprintln!("\n❌ {error_summary}\n");
            }
        }
    }

    save_history(&mut editor);
    Ok(())
}

/// Append a user/assistant pair, keeping at most `max_turns` turns.
fn push_exchange(history: &mut Vec<Turn>, user: &str, assistant: &str, max_turns: usize) {
    history.push(Turn::user(user));
    history.push(Turn::assistant(assistant));
    let excess = history.len().saturating_sub(max_turns);
    history.drain(..excess);
}

fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

fn history_path() -> std::path::PathBuf {
    launchai_core::utils::get_data_path()
        .join("history")
        .join("cli_history")
}

fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
