//! Analysis Stream Event Types
//!
//! Event types emitted by the `analyze-selected-stream` endpoint. Each frame
//! on the wire carries one JSON object discriminated by its `type` field:
//!
//! ```text
//! data:{"type":"step","step":"comp","address":"12 Oak St","index":2,"total":4}
//!
//! data:{"type":"complete","data":{"analysis":{"arv":315000},"mao":{"mao":190500}}}
//! ```

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Identifier of one stage of a server-side analysis run.
///
/// The declaration order is the canonical progress order; step status in
/// the UI is derived purely from positions in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    SubjectPrep,
    SubjectImages,
    SubjectDone,
    Comp,
    Repairs,
    RepairsDone,
    Arv,
    ArvDone,
    Mao,
    MaoDone,
    DealScore,
    Complete,
}

impl StepId {
    /// Every step in canonical order.
    pub const ALL: [StepId; 12] = [
        StepId::SubjectPrep,
        StepId::SubjectImages,
        StepId::SubjectDone,
        StepId::Comp,
        StepId::Repairs,
        StepId::RepairsDone,
        StepId::Arv,
        StepId::ArvDone,
        StepId::Mao,
        StepId::MaoDone,
        StepId::DealScore,
        StepId::Complete,
    ];

    /// Zero-based position in the canonical order.
    pub fn position(self) -> usize {
        self as usize
    }

    /// Wire name of the step.
    pub fn as_str(self) -> &'static str {
        match self {
            StepId::SubjectPrep => "subject_prep",
            StepId::SubjectImages => "subject_images",
            StepId::SubjectDone => "subject_done",
            StepId::Comp => "comp",
            StepId::Repairs => "repairs",
            StepId::RepairsDone => "repairs_done",
            StepId::Arv => "arv",
            StepId::ArvDone => "arv_done",
            StepId::Mao => "mao",
            StepId::MaoDone => "mao_done",
            StepId::DealScore => "deal_score",
            StepId::Complete => "complete",
        }
    }

    /// Human-readable label shown in the progress list.
    pub fn label(self) -> &'static str {
        match self {
            StepId::SubjectPrep => "Preparing subject property",
            StepId::SubjectImages => "Analyzing subject property images (AI)",
            StepId::SubjectDone => "Subject property ready",
            StepId::Comp => "Analyzing comparables",
            StepId::Repairs => "Calculating repair estimates",
            StepId::RepairsDone => "Repair estimates calculated",
            StepId::Arv => "Calculating After Repair Value (ARV)",
            StepId::ArvDone => "ARV calculated",
            StepId::Mao => "Calculating Max Allowable Offer (MAO)",
            StepId::MaoDone => "MAO calculated",
            StepId::DealScore => "Calculating deal score & recommendation",
            StepId::Complete => "Analysis complete",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepId::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| CoreError::parse(format!("unknown step id: {}", s)))
    }
}

/// Progress notification for one analysis step.
///
/// All fields but `step` are optional and vary by step: comparable steps
/// carry `address`/`index`/`total`, the `*_done` steps carry the computed
/// value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepEvent {
    pub step: StepId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mao: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_repairs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StepEvent {
    /// Bare step event with no optional fields set.
    pub fn new(step: StepId) -> Self {
        Self {
            step,
            address: None,
            index: None,
            total: None,
            arv: None,
            mao: None,
            estimated_repairs: None,
            message: None,
        }
    }

    /// Comparable-analysis event for comp `index` of `total`.
    pub fn comp(address: impl Into<String>, index: u32, total: u32) -> Self {
        Self {
            address: Some(address.into()),
            index: Some(index),
            total: Some(total),
            ..Self::new(StepId::Comp)
        }
    }
}

/// One decoded frame of the analysis stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A step started or finished.
    Step(StepEvent),

    /// Terminal event carrying the final analysis.
    Complete {
        #[serde(default)]
        data: AnalysisResult,
    },

    /// Any other event type; tolerated and ignored.
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Whether this event ends the stream.
    pub fn is_complete(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. })
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| as_number(&v)))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| v.as_str().map(str::to_string)))
}

/// Numbers sometimes arrive as numeric strings.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Typed view over an object section; a non-object yields `None`.
fn view<T: DeserializeOwned>(value: Option<&Value>) -> Option<T> {
    value
        .filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Line items behind the AI repair estimate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairBreakdown {
    #[serde(default, deserialize_with = "lenient_number")]
    pub base_rehab: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub roof_cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub hvac_cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub buffer_percent: Option<f64>,
}

/// Deal score and its weighted components, each out of 100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealScore {
    #[serde(default, deserialize_with = "lenient_number")]
    pub overall: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub spread_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub repair_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub market_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub area_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub comp_strength_score: Option<f64>,
}

/// How the final MAO was reached from the ARV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaoBreakdown {
    #[serde(default, deserialize_with = "lenient_number")]
    pub arv: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rule_percent: Option<f64>,
    #[serde(rename = "baseMAO", default, deserialize_with = "lenient_number")]
    pub base_mao: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub estimated_repairs: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub holding_cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub closing_cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub wholesale_fee: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_fees: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Machine code such as `strong-deal`
    #[serde(default, deserialize_with = "lenient_string")]
    pub recommendation: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recommendation_reason: Option<String>,
}

/// Condition scores from the photo review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionScores {
    /// Out of 5
    pub interior: Option<f64>,
    /// Out of 5
    pub exterior: Option<f64>,
    /// Out of 10
    pub overall_condition: Option<f64>,
    /// Out of 100
    pub renovation: Option<f64>,
    /// Out of 100
    pub damage_risk: Option<f64>,
}

impl ConditionScores {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Final analysis payload returned by the server.
///
/// Kept as the raw JSON document so a field the client does not expect can
/// never make the terminal event unreadable. The server sends
///
/// ```text
/// { property, analysis: { _id, arv, estimatedRepairs, repairExtent, ... },
///   comps, dealScore: { overall, ... }, mao: { mao, breakdown },
///   recommendation: { recommendation, recommendationReason }, ... }
/// ```
///
/// and the accessors below read that shape. Valuation fields also fall back
/// to the top level for flat documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult(Value);

impl Default for AnalysisResult {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl From<Value> for AnalysisResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl AnalysisResult {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    fn section(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Field of the `analysis` summary, or of the document itself
    fn analysis_field(&self, key: &str) -> Option<&Value> {
        self.section("analysis")
            .and_then(|a| a.get(key))
            .filter(|v| !v.is_null())
            .or_else(|| self.section(key))
    }

    fn analysis_number(&self, key: &str) -> Option<f64> {
        self.analysis_field(key).and_then(as_number)
    }

    fn analysis_text(&self, key: &str) -> Option<&str> {
        self.analysis_field(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Server id of the analysis; needed to recalculate MAO
    pub fn id(&self) -> Option<&str> {
        self.analysis_text("_id")
    }

    /// Subject property as the server echoed it
    pub fn property(&self) -> Option<&Value> {
        self.section("property").filter(|v| v.is_object())
    }

    pub fn arv(&self) -> Option<f64> {
        self.analysis_number("arv")
    }

    /// Final MAO: `mao.mao`, else the summary's own `mao`
    pub fn mao(&self) -> Option<f64> {
        let final_mao = match self.section("mao") {
            Some(Value::Object(mao)) => mao.get("mao").and_then(as_number),
            _ => None,
        };
        final_mao
            .or_else(|| {
                self.section("analysis")
                    .and_then(|a| a.get("mao"))
                    .and_then(as_number)
            })
            .or_else(|| self.section("mao").and_then(as_number))
    }

    pub fn mao_breakdown(&self) -> Option<MaoBreakdown> {
        view(self.section("mao").and_then(|m| m.get("breakdown")))
    }

    pub fn estimated_repairs(&self) -> Option<f64> {
        self.analysis_number("estimatedRepairs")
    }

    pub fn user_estimated_repairs(&self) -> Option<f64> {
        self.analysis_number("userEstimatedRepairs")
    }

    pub fn ai_estimated_repairs(&self) -> Option<f64> {
        self.analysis_number("aiEstimatedRepairs")
    }

    pub fn ai_repair_cost_per_sqft(&self) -> Option<f64> {
        self.analysis_number("aiRepairCostPerSqft")
    }

    pub fn ai_repair_breakdown(&self) -> Option<RepairBreakdown> {
        view(self.analysis_field("aiRepairBreakdown"))
    }

    pub fn suggested_offer(&self) -> Option<f64> {
        self.analysis_number("suggestedOffer")
    }

    pub fn condition_category(&self) -> Option<&str> {
        self.analysis_text("conditionCategory")
    }

    /// Accepts the `{overall, ...}` object or a bare number
    pub fn deal_score(&self) -> Option<DealScore> {
        let section = self.section("dealScore")?;
        match as_number(section) {
            Some(overall) => Some(DealScore {
                overall: Some(overall),
                ..DealScore::default()
            }),
            None => view(Some(section)),
        }
    }

    /// Accepts the `{recommendation, recommendationReason}` object or a bare code
    pub fn recommendation(&self) -> Option<Recommendation> {
        let section = self.section("recommendation")?;
        match section.as_str() {
            Some(code) => Some(Recommendation {
                recommendation: Some(code.to_string()),
                recommendation_reason: None,
            }),
            None => view(Some(section)),
        }
    }

    pub fn condition_scores(&self) -> ConditionScores {
        ConditionScores {
            interior: self.analysis_number("interiorScore"),
            exterior: self.analysis_number("exteriorScore"),
            overall_condition: self.analysis_number("overallConditionScore"),
            renovation: self.analysis_number("renovationScore"),
            damage_risk: self.analysis_number("damageRiskScore"),
        }
    }

    /// Repair extent as displayed on the results screen, falling back to the
    /// condition category when the server sent no explicit text.
    pub fn repair_extent_label(&self) -> String {
        if let Some(extent) = self.analysis_text("repairExtent") {
            return extent.to_string();
        }
        match self.condition_category() {
            Some("light-repairs") => "Light repairs".to_string(),
            Some("heavy-repairs") => "Heavy repairs".to_string(),
            _ => "Medium repairs".to_string(),
        }
    }

    /// Fold a MAO recalculation into this result. The server answers with
    /// fresh `analysis` and `mao` sections; everything else is kept.
    pub fn apply_recalculation(&mut self, update: &AnalysisResult) {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }
        if let Value::Object(target) = &mut self.0 {
            for key in ["analysis", "mao"] {
                if let Some(section) = update.section(key) {
                    target.insert(key.to_string(), section.clone());
                }
            }
        }
    }
}
