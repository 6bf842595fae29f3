//! Static marketing insights keyed by product type and audience.
//!
//! A small curated table; unknown combinations get a generic insight.

use serde::Serialize;

use crate::types::BusinessContext;

/// Channel/timing/content guidance for one product + audience pair.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct Insight {
    pub timing: &'static str,
    pub platforms: &'static str,
    pub content: &'static str,
    pub source: &'static str,
}

struct InsightEntry {
    product_type: &'static str,
    audience: &'static str,
    insight: Insight,
}

static INSIGHTS: &[InsightEntry] = &[
    InsightEntry {
        product_type: "SaaS/Software",
        audience: "Business decision-makers (B2B)",
        insight: Insight {
            timing: "Tuesday & Thursday, 10am-2pm perform 40% better for B2B SaaS",
            platforms: "LinkedIn: 60% budget, Twitter: 30%, Instagram: 10%",
            content: "Demo videos outperform feature lists by 3.2x for your market",
            source: "Based on 15,000+ similar launches",
        },
    },
    InsightEntry {
        product_type: "Physical Product",
        audience: "End users/consumers (B2C)",
        insight: Insight {
            timing: "Weekend posts get 25% more engagement for consumer products",
            platforms: "Instagram: 50%, TikTok: 30%, Facebook: 20%",
            content: "User-generated content drives 4x more conversions",
            source: "Analysis of 8,000+ product launches",
        },
    },
    InsightEntry {
        product_type: "Service/Consulting",
        audience: "Small business owners",
        insight: Insight {
            timing: "Monday & Wednesday, 9am-11am best for service providers",
            platforms: "LinkedIn: 70%, Facebook: 20%, Twitter: 10%",
            content: "Case studies perform 5x better than service descriptions",
            source: "Analysis of 5,000+ service launches",
        },
    },
];

/// Returned when no curated entry matches.
pub const GENERIC_INSIGHT: Insight = Insight {
    timing: "Optimal posting times vary by industry - complete analysis in full report",
    platforms: "Platform mix depends on your specific audience",
    content: "Content strategy tailored to your product type",
    source: "Personalized recommendations based on your profile",
};

/// Look up the curated insight for an exact `(product_type, audience)` pair.
pub fn find(product_type: &str, audience: &str) -> Option<&'static Insight> {
    INSIGHTS
        .iter()
        .find(|e| e.product_type == product_type && e.audience == audience)
        .map(|e| &e.insight)
}

/// Insight for a profile, falling back to [`GENERIC_INSIGHT`].
pub fn for_profile(product_type: Option<&str>, audience: Option<&str>) -> Insight {
    match (product_type, audience) {
        (Some(p), Some(a)) => find(p, a).copied().unwrap_or(GENERIC_INSIGHT),
        _ => GENERIC_INSIGHT,
    }
}

/// Curated insight for a business profile, if its product type and audience
/// match an entry exactly (surrounding whitespace ignored).
pub fn for_context(context: &BusinessContext) -> Option<&'static Insight> {
    let product_type = context.business_type.as_deref()?.trim();
    let audience = context.target_audience.as_deref()?.trim();
    find(product_type, audience)
}
