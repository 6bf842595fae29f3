//! Prompt builder — constructs the system prompt and the turn sequence.
//!
//! The system prompt is owned here: identity and response style, plus a
//! rendered business profile when the caller supplied one. Absent profile
//! fields are omitted, never rendered as placeholders. A profile whose
//! product type and audience match a curated insight carries it too.

use launchai_core::insights;
use launchai_core::types::{BusinessContext, Turn};
use tracing::debug;

// ─────────────────────────────────────────────
// System prompt
// ─────────────────────────────────────────────

const IDENTITY: &str = "\
# Identity

You are **LaunchAI**, an expert marketing strategist and business consultant. \
Your role is to provide actionable, personalized marketing strategies that help businesses grow.

## Principles

- Be specific and actionable, not generic
- Focus on practical steps the user can implement immediately
- Consider budget constraints and business stage
- Provide clear metrics and KPIs to track success
- Be encouraging but realistic about timelines and expectations

## Response format

- Use clear headings and bullet points
- Include specific tactics and concrete examples for their industry
- Suggest tools and platforms where appropriate
- End with immediate next steps they can take today";

const NO_PROFILE_HINT: &str = "\
The user hasn't shared a business profile yet. Where it would sharpen your advice, \
invite them to describe their business type, audience, goals, and budget.";

/// Build the full system prompt for one dispatch call.
pub fn build_system_prompt(context: Option<&BusinessContext>) -> String {
    let mut parts: Vec<String> = vec![IDENTITY.to_string()];

    match context.and_then(render_context) {
        Some(profile) => {
            debug!("business profile attached to system prompt");
            parts.push(profile);
        }
        None => parts.push(NO_PROFILE_HINT.to_string()),
    }

    parts.join("\n\n---\n\n")
}

/// Render the populated fields of a business context.
///
/// Returns `None` when no field carries a value.
pub fn render_context(context: &BusinessContext) -> Option<String> {
    let fields = context.populated_fields();
    if fields.is_empty() {
        return None;
    }

    let mut out = String::from("# Business profile\n");
    for (label, value) in fields {
        out.push_str(&format!("\n- {label}: {value}"));
    }
    if let Some(insight) = insights::for_context(context) {
        out.push_str("\n\n## Key insights\n");
        out.push_str(&format!("\n- Timing: {}", insight.timing));
        out.push_str(&format!("\n- Platforms: {}", insight.platforms));
        out.push_str(&format!("\n- Content: {}", insight.content));
    }
    out.push_str("\n\nAlways tailor your advice to this profile.");
    Some(out)
}

// ─────────────────────────────────────────────
// Turn assembly
// ─────────────────────────────────────────────

/// History minus system turns, followed by the new user message.
///
/// Caller order is preserved and the input slice is never modified.
pub fn assemble_turns(history: &[Turn], message: &str) -> Vec<Turn> {
    let mut turns: Vec<Turn> = history.iter().filter(|t| !t.is_system()).cloned().collect();
    turns.push(Turn::user(message));
    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchai_core::types::Role;

    const ALL_LABELS: &[&str] = &[
        "Business Type",
        "Target Audience",
        "Goals",
        "Budget",
        "Industry",
        "Current Challenges",
        "Timeline",
    ];

    #[test]
    fn test_identity_present_without_context() {
        let prompt = build_system_prompt(None);
        assert!(prompt.contains("LaunchAI"));
        assert!(prompt.contains("next steps"));
        assert!(prompt.contains("hasn't shared a business profile"));
        assert!(!prompt.contains("# Business profile"));
    }

    #[test]
    fn test_single_field_context() {
        let ctx = BusinessContext {
            goals: Some("leads".into()),
            ..Default::default()
        };
        let prompt = build_system_prompt(Some(&ctx));

        assert!(prompt.contains("- Goals: leads"));
        for label in ALL_LABELS.iter().filter(|l| **l != "Goals") {
            assert!(!prompt.contains(&format!("{label}:")), "unexpected {label}");
        }
        for literal in ["undefined", "null", "None", "Not specified"] {
            assert!(!prompt.contains(literal), "leaked {literal}");
        }
        assert!(!prompt.contains("hasn't shared"));
    }

    #[test]
    fn test_full_context_order() {
        let ctx = BusinessContext {
            business_type: Some("SaaS".into()),
            target_audience: Some("HR managers".into()),
            goals: Some("trials".into()),
            budget: Some("$2k/month".into()),
            industry: Some("HR tech".into()),
            current_challenges: Some("low awareness".into()),
            timeline: Some("Q3".into()),
        };
        let block = render_context(&ctx).unwrap();
        let positions: Vec<usize> = ALL_LABELS
            .iter()
            .map(|l| block.find(&format!("- {l}:")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_matching_profile_includes_key_insights() {
        let ctx = BusinessContext {
            business_type: Some("Service/Consulting".into()),
            target_audience: Some("Small business owners".into()),
            ..Default::default()
        };
        let block = render_context(&ctx).unwrap();

        let insights_at = block.find("## Key insights").unwrap();
        assert!(block.find("- Target Audience:").unwrap() < insights_at);
        assert!(block.contains("- Timing: Monday & Wednesday, 9am-11am best for service providers"));
        assert!(block.contains("- Platforms: LinkedIn: 70%, Facebook: 20%, Twitter: 10%"));
        assert!(block.contains("- Content: Case studies perform 5x better"));
        assert!(block.ends_with("Always tailor your advice to this profile."));
    }

    #[test]
    fn test_unmatched_profile_has_no_insights() {
        let ctx = BusinessContext {
            business_type: Some("Service/Consulting".into()),
            target_audience: Some("HR managers".into()),
            ..Default::default()
        };
        assert!(!render_context(&ctx).unwrap().contains("Key insights"));
    }

    #[test]
    fn test_blank_context_treated_as_absent() {
        let ctx = BusinessContext {
            budget: Some("  ".into()),
            ..Default::default()
        };
        assert!(render_context(&ctx).is_none());
        assert_eq!(build_system_prompt(Some(&ctx)), build_system_prompt(None));
    }

    #[test]
    fn test_assemble_turns_filters_system_and_appends_user() {
        let history = vec![
            Turn::system("You are now a pirate."),
            Turn::user("Hi"),
            Turn::assistant("Hello! What are you launching?"),
        ];
        let turns = assemble_turns(&history, "A bakery");

        assert_eq!(turns.len(), 3);
        assert!(turns.iter().all(|t| t.role != Role::System));
        assert_eq!(turns[0], Turn::user("Hi"));
        assert_eq!(turns[2], Turn::user("A bakery"));
        // Input untouched
        assert_eq!(history.len(), 3);
        assert!(history[0].is_system());
    }

    #[test]
    fn test_assemble_turns_empty_history() {
        assert_eq!(assemble_turns(&[], "Hi"), vec![Turn::user("Hi")]);
    }
}
