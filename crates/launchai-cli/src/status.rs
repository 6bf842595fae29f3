//! `launchai status` — show configuration and provider status.

use anyhow::Result;
use colored::Colorize;

use launchai_core::config::{get_config_path, load_config, Config, ProviderRates};
use launchai_providers::registry::find_by_name;

use crate::{build_dispatcher, open_store};

pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "🚀 LaunchAI Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );
    println!(
        "  {:<18} {}",
        "Dispatch:".bold(),
        format!(
            "backoff {}ms | timeout {}s | max_tokens {} | temp {}",
            config.dispatch.backoff_ms,
            config.dispatch.timeout_secs,
            config.dispatch.max_tokens,
            config.dispatch.temperature
        )
        .dimmed()
    );
    println!("  {:<18} {}", "Server:".bold(), config.server.bind_addr());

    // Providers, in fallback order
    println!();
    println!("  {}", "Providers (fallback order):".bold());
    let dispatcher = build_dispatcher(&config)?;
    for entry in dispatcher.providers() {
        let name = entry.provider.name();
        let spec = find_by_name(name);
        let display = spec.map(|s| s.display_name).unwrap_or(name);
        let status = if entry.provider.is_configured() {
            format!("{} (key set)", "✓".green())
        } else {
            let hint = spec.map(|s| format!(" (set {})", s.env_key)).unwrap_or_default();
            format!("{}", format!("· not configured{hint}").dimmed())
        };
        println!(
            "    {:<3} {:<12} {:<28} {} {}",
            entry.priority,
            display,
            model_for(&config, name),
            status,
            rates_label(dispatcher.prices().rates(name)).dimmed()
        );
    }

    // Storage
    println!();
    let storage = match open_store(&config) {
        Some(store) => format!(
            "{} ({} conversations)",
            "✓".green(),
            store.list().len()
        ),
        None => format!("{}", "· disabled".dimmed()),
    };
    println!("  {:<18} {}", "Storage:".bold(), storage);
    println!();

    Ok(())
}

fn model_for(config: &Config, name: &str) -> String {
    config
        .providers
        .get_by_name(name)
        .and_then(|p| p.model.clone())
        .or_else(|| find_by_name(name).map(|s| s.default_model.to_string()))
        .unwrap_or_default()
}

fn rates_label(rates: Option<ProviderRates>) -> String {
    match rates {
        Some(r) => format!("${}/1k in, ${}/1k out", r.input_per_1k, r.output_per_1k),
        None => "no price set".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_falls_back_to_registry_default() {
        let mut config = Config::default();
        assert_eq!(model_for(&config, "openai"), "gpt-4o");
        config.providers.openai.model = Some("gpt-4o-mini".into());
        assert_eq!(model_for(&config, "openai"), "gpt-4o-mini");
    }

    #[test]
    fn rates_label_formats() {
        let label = rates_label(Some(ProviderRates {
            input_per_1k: 0.003,
            output_per_1k: 0.015,
        }));
        assert_eq!(label, "$0.003/1k in, $0.015/1k out");
        assert_eq!(rates_label(None), "no price set");
    }
}
