//! `launchai conversations` — inspect stored conversations.
//!
//! - `launchai conversations list` — newest first, with cost so far
//! - `launchai conversations show <ID>` — turns and usage rows
//! - `launchai conversations delete <ID>` — remove from disk

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;

use launchai_core::config::load_config;
use launchai_core::conversation::ConversationStore;
use launchai_core::types::Role;
use launchai_core::utils::truncate_string;

use crate::open_store;

#[derive(Subcommand)]
pub enum ConversationsCommands {
    /// List stored conversations
    List,

    /// Print one conversation with its usage
    Show {
        /// Conversation id
        id: String,
    },

    /// Delete a conversation
    Delete {
        /// Conversation id
        id: String,
    },
}

pub fn dispatch(cmd: ConversationsCommands) -> Result<()> {
    let config = load_config(None);
    let Some(store) = open_store(&config) else {
        bail!("conversation storage is disabled (storage.enabled = false)");
    };

    match cmd {
        ConversationsCommands::List => list(&store),
        ConversationsCommands::Show { id } => show(&store, &id),
        ConversationsCommands::Delete { id } => delete(&store, &id),
    }
}

fn list(store: &ConversationStore) -> Result<()> {
    let summaries = store.list();
    if summaries.is_empty() {
        println!("{}", "No stored conversations.".dimmed());
        return Ok(());
    }

    println!();
    for summary in summaries {
        let Some(conv) = store.get(&summary.id) else {
            continue;
        };
        println!(
            "  {}  {}  {:>3} turns  ${:.4}",
            summary.id.bold(),
            summary.updated_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            conv.turns.len(),
            conv.total_cost()
        );
    }
    println!();
    Ok(())
}

fn show(store: &ConversationStore, id: &str) -> Result<()> {
    let Some(conv) = store.get(id).filter(|c| !c.turns.is_empty()) else {
        bail!("no conversation with id {id}");
    };

    println!();
    for turn in &conv.turns {
        let who = match turn.role {
            Role::User => "You".green().bold(),
            Role::Assistant => "LaunchAI".cyan().bold(),
            Role::System => "System".dimmed(),
        };
        println!("{who}: {}", truncate_string(&turn.content, 400));
        println!();
    }

    println!("{}", "Usage:".bold());
    for row in &conv.usage {
        println!(
            "  {} · {} · {} in / {} out · ${:.4}",
            row.provider, row.model, row.input_tokens, row.output_tokens, row.cost
        );
    }
    println!("  {} ${:.4}", "Total:".bold(), conv.total_cost());
    println!();
    Ok(())
}

fn delete(store: &ConversationStore, id: &str) -> Result<()> {
    if store.delete(id) {
        println!("  {} deleted {id}", "✓".green());
        Ok(())
    } else {
        bail!("no conversation with id {id}");
    }
}
