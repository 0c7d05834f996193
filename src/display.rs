//! Text formatting for analysis results.
//!
//! Values are shown as the backend returned them; the only numeric
//! formatting is the confidence percentage.

use crate::api::AnalysisResult;
use serde_json::Value;
use std::fmt;

/// `0.8734` → `"87.3%"`. Halves round up: `0.1225` → `"12.3%"`.
pub fn format_confidence(probability: f64) -> String {
    let percent = probability * 100.0;
    format!("{:.1}%", (percent * 10.0).round() / 10.0)
}

/// `"calories"` → `"Calories"`. Only the first character changes.
pub fn nutrient_label(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Strings verbatim, numbers in their shortest form, null as nothing.
pub fn format_nutrient_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Null | Value::Bool(_) => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NutritionLine {
    pub label: String,
    pub value: String,
}

impl fmt::Display for NutritionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// Everything the results panel shows, already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub category: String,
    pub confidence: String,
    /// In the order the backend returned them.
    pub nutrition: Vec<NutritionLine>,
}

impl From<&AnalysisResult> for ResultView {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            category: result.category.clone(),
            confidence: format_confidence(result.probability),
            nutrition: result
                .nutrition
                .iter()
                .map(|(key, value)| NutritionLine {
                    label: nutrient_label(key),
                    value: format_nutrient_value(value),
                })
                .collect(),
        }
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Category: {}", self.category)?;
        write!(f, "Confidence: {}", self.confidence)?;
        for line in &self.nutrition {
            write!(f, "\n{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(nutrition: Value, probability: f64) -> AnalysisResult {
        serde_json::from_value(json!({
            "category": "Food",
            "probability": probability,
            "nutrition": nutrition,
        }))
        .unwrap()
    }

    #[test]
    fn renders_confidence_and_capitalized_nutrients() {
        let r = result(json!({"calories": 250, "protein": 12, "carbs": 30}), 0.8734);
        let view = ResultView::from(&r);
        assert_eq!(view.confidence, "87.3%");
        let lines: Vec<String> = view.nutrition.iter().map(ToString::to_string).collect();
        assert_eq!(lines, ["Calories: 250", "Protein: 12", "Carbs: 30"]);
    }

    #[test]
    fn string_values_are_shown_as_returned() {
        let r = result(json!({"carbs": "35g", "fat": 8.5}), 0.85);
        let view = ResultView::from(&r);
        assert_eq!(view.nutrition[0].to_string(), "Carbs: 35g");
        assert_eq!(view.nutrition[1].to_string(), "Fat: 8.5");
        assert_eq!(view.confidence, "85.0%");
    }

    #[test]
    fn confidence_edges() {
        assert_eq!(format_confidence(0.0), "0.0%");
        assert_eq!(format_confidence(1.0), "100.0%");
    }

    #[test]
    fn confidence_halves_round_up() {
        assert_eq!(format_confidence(0.1225), "12.3%");
        assert_eq!(format_confidence(0.0125), "1.3%");
        assert_eq!(format_confidence(0.0025), "0.3%");
        assert_eq!(format_confidence(0.8734), "87.3%");
        assert_eq!(format_confidence(0.9999), "100.0%");
    }

    #[test]
    fn label_edge_cases() {
        assert_eq!(nutrient_label(""), "");
        assert_eq!(nutrient_label("fiber"), "Fiber");
        assert_eq!(nutrient_label("Sugar"), "Sugar");
        assert_eq!(nutrient_label("saturated_fat"), "Saturated_fat");
    }

    #[test]
    fn full_view_text() {
        let r = result(json!({"calories": 250}), 0.5);
        assert_eq!(
            ResultView::from(&r).to_string(),
            "Category: Food\nConfidence: 50.0%\nCalories: 250"
        );
    }
}
