//! Repair Estimate and MAO Inputs
//!
//! The user's repair estimate is derived from a handful of form inputs and
//! then fed, one way, into the inputs of the Max Allowable Offer calculation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Multiplier applied when the contingency buffer is enabled.
pub const REPAIR_BUFFER_FACTOR: f64 = 1.10;

/// Repair estimate form inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepairInputs {
    pub rehab_per_sqft: f64,
    pub needs_roof: bool,
    pub roof_cost: f64,
    #[serde(rename = "needsAC")]
    pub needs_ac: bool,
    pub ac_cost: f64,
    pub other_repair: f64,
    pub add_buffer: bool,
}

impl Default for RepairInputs {
    fn default() -> Self {
        Self {
            rehab_per_sqft: 25.0,
            needs_roof: false,
            roof_cost: 19_000.0,
            needs_ac: false,
            ac_cost: 7_500.0,
            other_repair: 0.0,
            add_buffer: false,
        }
    }
}

/// Missing, non-finite and negative inputs all count as zero.
fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Total repair estimate in whole dollars:
/// `round((rate * sqft + roof + ac + other) * buffer)`.
pub fn compute_total_repair(inputs: &RepairInputs, subject_sqft: Option<f64>) -> u64 {
    let sqft = sanitize(subject_sqft.unwrap_or(0.0));
    let base = sanitize(inputs.rehab_per_sqft) * sqft;
    let roof = if inputs.needs_roof {
        sanitize(inputs.roof_cost)
    } else {
        0.0
    };
    let ac = if inputs.needs_ac {
        sanitize(inputs.ac_cost)
    } else {
        0.0
    };

    let mut total = base + roof + ac + sanitize(inputs.other_repair);
    if inputs.add_buffer {
        total *= REPAIR_BUFFER_FACTOR;
    }
    total.round() as u64
}

/// Rule used to turn ARV into a Max Allowable Offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaoRule {
    #[serde(rename = "65%")]
    SixtyFivePercent,
    #[default]
    #[serde(rename = "70%")]
    SeventyPercent,
    #[serde(rename = "75%")]
    SeventyFivePercent,
    #[serde(rename = "custom")]
    Custom,
    #[serde(rename = "sop")]
    Sop,
}

impl MaoRule {
    pub const ALL: [MaoRule; 5] = [
        MaoRule::SixtyFivePercent,
        MaoRule::SeventyPercent,
        MaoRule::SeventyFivePercent,
        MaoRule::Custom,
        MaoRule::Sop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MaoRule::SixtyFivePercent => "65%",
            MaoRule::SeventyPercent => "70%",
            MaoRule::SeventyFivePercent => "75%",
            MaoRule::Custom => "custom",
            MaoRule::Sop => "sop",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|rule| rule.as_str() == s)
    }
}

impl fmt::Display for MaoRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs sent to the server for the MAO calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaoInputs {
    pub estimated_repairs: f64,
    pub holding_cost: f64,
    pub closing_cost: f64,
    pub wholesale_fee: f64,
    pub mao_rule: MaoRule,
}

impl MaoInputs {
    /// Overwrite the repair estimate with a freshly computed total.
    pub fn apply_repair_total(&mut self, total: u64) {
        self.estimated_repairs = total as f64;
    }

    /// Merge a partial update; unset fields are left alone.
    pub fn merge(&mut self, update: &MaoInputsUpdate) {
        if let Some(v) = update.estimated_repairs {
            self.estimated_repairs = sanitize(v);
        }
        if let Some(v) = update.holding_cost {
            self.holding_cost = sanitize(v);
        }
        if let Some(v) = update.closing_cost {
            self.closing_cost = sanitize(v);
        }
        if let Some(v) = update.wholesale_fee {
            self.wholesale_fee = sanitize(v);
        }
        if let Some(rule) = update.mao_rule {
            self.mao_rule = rule;
        }
    }
}

/// Partial update of [`MaoInputs`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaoInputsUpdate {
    pub estimated_repairs: Option<f64>,
    pub holding_cost: Option<f64>,
    pub closing_cost: Option<f64>,
    pub wholesale_fee: Option<f64>,
    pub mao_rule: Option<MaoRule>,
}
