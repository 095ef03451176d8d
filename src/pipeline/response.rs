//! Helpers for turning model replies into typed values.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::pipeline::types::Category;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("number pattern is valid"));

/// An amount or range followed by a currency unit, e.g. `50万`, `40〜50万円`, `450000円`.
static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<low>[0-9]+(?:\.[0-9]+)?)(?:\s*(?:万円?|円)?\s*[〜~～\-－]\s*(?P<high>[0-9]+(?:\.[0-9]+)?))?\s*(?P<unit>万|円)",
    )
    .expect("amount pattern is valid")
});

/// A bare number or range making up the whole text, e.g. `50` or `40-50`.
static BARE_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(?:\.[0-9]+)?(?:\s*[〜~～\-－]\s*[0-9]+(?:\.[0-9]+)?)?$")
        .expect("bare amount pattern is valid")
});

/// Yen amounts from this value up are taken as a reward even without a unit.
const YEN_THRESHOLD: f64 = 10_000.0;

/// Smallest and largest accepted reward, in units of 10,000 yen.
const REWARD_RANGE: std::ops::RangeInclusive<u16> = 10..=999;

/// Extract a JSON object from LLM output (handles markdown wrapping).
pub fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    // Already a JSON object
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    // Wrapped in markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    // Try to find object bounds
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}

/// Render a JSON scalar as trimmed text; `null` and missing become empty.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Parse a reward reported by the model.
///
/// Accepts a number or text such as `"50"`, `"50万円"`, `"450,000円"` or a
/// range like `"40〜50万円"`. Amounts of 10,000 or more are taken as yen and
/// converted to units of 10,000. For a range the candidate's lower bound or
/// the posting's upper bound is used. Values outside 10..=999 are rejected.
pub fn parse_reward(value: &Value, category: Category) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_f64().and_then(normalize_reward),
        Value::String(s) => reward_from_text(s, category),
        _ => None,
    }
}

/// Pick the reward from free text following the category's range rule.
///
/// Only amounts carrying a unit (`万`, `円`) or of at least 10,000 count, so
/// hours, years and ages elsewhere in the text are ignored. A bare number or
/// range counts only when it is the whole text.
pub fn reward_from_text(text: &str, category: Category) -> Option<u16> {
    let normalized: String = text
        .chars()
        .filter(|c| *c != ',' && *c != '，')
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            '．' => '.',
            _ => c,
        })
        .collect();
    let normalized = normalized.trim();

    let mut amounts: Vec<f64> = Vec::new();
    if BARE_AMOUNT.is_match(normalized) {
        amounts.extend(
            NUMBER
                .find_iter(normalized)
                .filter_map(|m| m.as_str().parse::<f64>().ok()),
        );
    } else {
        for caps in AMOUNT.captures_iter(normalized) {
            let yen = caps.name("unit").is_some_and(|u| u.as_str() == "円");
            for bound in ["low", "high"] {
                let Some(amount) = caps.name(bound).and_then(|m| m.as_str().parse::<f64>().ok())
                else {
                    continue;
                };
                // `500円` is not a monthly reward.
                if yen && amount < YEN_THRESHOLD {
                    continue;
                }
                amounts.push(amount);
            }
        }
        amounts.extend(
            NUMBER
                .find_iter(normalized)
                .filter_map(|m| m.as_str().parse::<f64>().ok())
                .filter(|amount| *amount >= YEN_THRESHOLD),
        );
    }

    let rewards = amounts.into_iter().filter_map(normalize_reward);
    match category {
        Category::CandidateProfile => rewards.min(),
        Category::JobPosting => rewards.max(),
    }
}

fn normalize_reward(amount: f64) -> Option<u16> {
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    let in_units = if amount >= 10_000.0 {
        amount / 10_000.0
    } else {
        amount
    };
    let rounded = in_units.round();
    if rounded > f64::from(u16::MAX) {
        return None;
    }
    let reward = rounded as u16;
    REWARD_RANGE.contains(&reward).then_some(reward)
}
