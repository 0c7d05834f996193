//! Backend response types.
//!
//! These match the JSON the NutriTrack backend returns. Every endpoint wraps
//! its payload in `{ "success": bool, "data"?: ... }`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Common `{ success, data?, id? }` wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    /// Present on save endpoints.
    pub id: Option<String>,
}

/// Classification + nutrition estimate for one image.
///
/// Fields the client does not interpret (entry id, recipes, base64 image,
/// timestamp) are kept in `extra` and sent back verbatim on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub category: String,
    pub probability: f64,
    /// Nutrient name → value as returned (numbers, or strings like `"35g"`).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nutrition: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    /// Reject results the rest of the client cannot render.
    pub fn validate(&self) -> Result<(), String> {
        if !self.probability.is_finite() || !(0.0..=1.0).contains(&self.probability) {
            return Err(format!(
                "probability {} is outside [0, 1]",
                self.probability
            ));
        }
        Ok(())
    }

    /// Backend-assigned entry id, when the analysis carries one.
    pub fn entry_id(&self) -> Option<&str> {
        self.extra.get("id").and_then(Value::as_str)
    }
}

/// Returned by the save endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub id: Option<String>,
}

/// Today's totals against the default goals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: String,
    pub total_calories: f64,
    pub total_carbs: f64,
    pub total_protein: f64,
    pub total_fat: f64,
    pub total_fiber: f64,
    pub entries_count: u32,
    pub goal_calories: f64,
    pub goal_carbs: f64,
    pub goal_protein: f64,
    pub goal_fat: f64,
}

impl DailySummary {
    /// Calories left for the day. Negative once the goal is exceeded.
    pub fn calories_remaining(&self) -> f64 {
        self.goal_calories - self.total_calories
    }
}

/// A saved diary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub probability: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nutrition: Map<String, Value>,
    pub timestamp: String,
    /// Base64 JPEG, when the entry was saved with its image.
    #[serde(default)]
    pub image_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    pub id: String,
    pub weight: f64,
    pub timestamp: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
