//! Display Formatting
//!
//! Currency and score presentation shared by the CLI and the command layer.

use serde::{Deserialize, Serialize};

/// Placeholder shown for an absent value.
pub const MISSING: &str = "—";

/// Format a dollar amount with en-US digit grouping, e.g. `$62,150`.
///
/// At most three fraction digits are kept and trailing zeros are dropped.
/// Absent or non-finite values render as `—`.
pub fn format_currency(value: Option<f64>) -> String {
    match format_grouped(value) {
        Some(number) => format!("${}", number),
        None => MISSING.to_string(),
    }
}

/// Format a plain number with en-US digit grouping, e.g. `1,850`.
pub fn format_number(value: Option<f64>) -> String {
    format_grouped(value).unwrap_or_else(|| MISSING.to_string())
}

fn format_grouped(value: Option<f64>) -> Option<String> {
    let value = value.filter(|v| v.is_finite())?;

    let scaled = (value.abs() * 1000.0).round();
    let whole = (scaled / 1000.0).trunc();
    let frac = (scaled - whole * 1000.0) as u64;

    let digits = (whole as u64).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if frac > 0 {
        let fraction = format!("{:03}", frac);
        grouped.push('.');
        grouped.push_str(fraction.trim_end_matches('0'));
    }

    if value < 0.0 && scaled > 0.0 {
        grouped.insert(0, '-');
    }
    Some(grouped)
}

/// Qualitative band of a 0-100 deal score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealScoreBand {
    Strong,
    Good,
    Fair,
    Poor,
}

impl DealScoreBand {
    pub fn label(self) -> &'static str {
        match self {
            DealScoreBand::Strong => "Strong",
            DealScoreBand::Good => "Good",
            DealScoreBand::Fair => "Fair",
            DealScoreBand::Poor => "Poor",
        }
    }
}

pub fn deal_score_band(score: f64) -> DealScoreBand {
    if score >= 80.0 {
        DealScoreBand::Strong
    } else if score >= 60.0 {
        DealScoreBand::Good
    } else if score >= 40.0 {
        DealScoreBand::Fair
    } else {
        DealScoreBand::Poor
    }
}

/// Display label for a server recommendation code. Unknown codes are
/// returned unchanged.
pub fn recommendation_label(code: &str) -> &str {
    match code {
        "strong-deal" => "Strong Deal ✅",
        "good-negotiate" => "Good Deal - Negotiate 💰",
        "weak-lowball" => "Weak Deal - Lowball ⚠️",
        "pass" => "Pass ❌",
        other => other,
    }
}
