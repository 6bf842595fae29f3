//! `launchai onboard` — initialize configuration and data directories.
//!
//! - Creates `~/.launchai/config.json` with defaults
//! - Creates the conversations and REPL history directories
//! - Writes an example business profile for `--profile`

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use launchai_core::config::{get_config_path, save_config, Config};
use launchai_core::utils::{get_conversations_path, get_data_path};

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🚀 LaunchAI — Setup".cyan().bold());
    println!();

    let data_dir = get_data_path();
    let config_path = get_config_path();

    if config_path.exists() {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    } else {
        save_config(&Config::default(), Some(&config_path))?;
        println!(
            "  {} created config at {}",
            "✓".green(),
            config_path.display()
        );
    }

    let conversations = get_conversations_path();
    std::fs::create_dir_all(&conversations)?;
    println!("  {} conversations at {}", "✓".green(), conversations.display());

    std::fs::create_dir_all(data_dir.join("history"))?;

    create_template(&data_dir.join("profile.example.json"), PROFILE_TEMPLATE)?;

    println!();
    println!(
        "  Add an API key under {} or export {} / {}.",
        "providers.anthropic.apiKey".bold(),
        "ANTHROPIC_API_KEY".bold(),
        "OPENAI_API_KEY".bold()
    );
    println!(
        "{}",
        "  Setup complete! Run `launchai chat` to start.".green()
    );
    println!();

    Ok(())
}

/// Create a template file if it doesn't exist.
fn create_template(path: &Path, content: &str) -> Result<()> {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    if path.exists() {
        println!("  {} {} already exists", "✓".green(), name);
    } else {
        std::fs::write(path, content)?;
        println!("  {} created {}", "✓".green(), name);
    }
    Ok(())
}

const PROFILE_TEMPLATE: &str = r#"{
  "businessType": "SaaS/Software",
  "targetAudience": "Business decision-makers (B2B)",
  "goals": "Generate qualified leads",
  "budget": "$1,000 - $5,000/month",
  "industry": "Technology",
  "currentChallenges": "Low brand awareness",
  "timeline": "Launch in 3 months"
}
"#;
