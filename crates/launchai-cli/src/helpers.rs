//! Shared CLI output helpers.

use colored::Colorize;

use launchai_core::types::Usage;

/// Print an AI response to stdout.
pub fn print_response(response: &str) {
    println!();
    println!("{}", "🚀 LaunchAI".cyan().bold());
    if response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

/// One dimmed line: who answered and what it cost.
pub fn print_usage(provider: &str, model: &str, usage: &Usage) {
    println!("{}", usage_line(provider, model, usage).dimmed());
    println!();
}

fn usage_line(provider: &str, model: &str, usage: &Usage) -> String {
    format!(
        "{provider} · {model} · {} in / {} out · ${:.4}",
        usage.input_tokens, usage.output_tokens, usage.cost_estimate
    )
}

/// Print the banner shown at REPL start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "🚀 LaunchAI".cyan().bold(), version.dimmed());
    println!("{}", "Type a message, or \"exit\" to quit.".dimmed());
    println!();
}

/// Print a "thinking" placeholder while a request is in flight.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_line_format() {
        let usage = Usage {
            input_tokens: 1000,
            output_tokens: 1000,
            cost_estimate: 0.018,
        };
        assert_eq!(
            usage_line("anthropic", "claude", &usage),
            "anthropic · claude · 1000 in / 1000 out · $0.0180"
        );
    }
}
