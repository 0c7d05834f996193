//! HTTP client for the NutriTrack backend.
//!
//! One `reqwest::Client` per app, built from `AppConfig`. Every call logs its
//! round-trip time under the `[API]` tag and maps failures into `ApiError`;
//! nothing here retries.

use super::types::{
    AnalysisResult, ApiEnvelope, DailySummary, FoodEntry, SaveReceipt, WeightRecord,
};
use super::{ApiError, NutritionBackend};
use crate::config::AppConfig;
use crate::source::CapturedImage;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Multipart field the backend reads the image from.
pub const IMAGE_FIELD: &str = "file";

/// Longest backend error body quoted back to the user.
const MAX_DETAIL_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    user_id: String,
    history_days: u32,
    weight_days: u32,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
            history_days: config.history_days,
            weight_days: config.weight_days,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /api/analyze-food` with the image as multipart field `file`.
    pub async fn analyze_food_image(
        &self,
        image: &CapturedImage,
    ) -> Result<AnalysisResult, ApiError> {
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(upload_file_name(image.mime_type()))
            .mime_str(image.mime_type())?;
        let form = Form::new().part(IMAGE_FIELD, part);

        log::info!(
            "[API] analyze-food: uploading {} bytes ({})",
            image.len(),
            image.mime_type()
        );
        let start = std::time::Instant::now();
        let response = self
            .http
            .post(self.endpoint("/api/analyze-food"))
            .multipart(form)
            .send()
            .await?;
        let envelope: ApiEnvelope<AnalysisResult> = read_envelope(response).await?;
        log::info!("[API] analyze-food: {}ms", start.elapsed().as_millis());

        if !envelope.success {
            return Err(ApiError::Rejected("Failed to analyze food image".to_string()));
        }
        let result = envelope
            .data
            .ok_or_else(|| ApiError::Malformed("analysis response has no data".to_string()))?;
        result.validate().map_err(ApiError::Malformed)?;
        Ok(result)
    }

    /// `POST /api/save-food-entry`: the result's fields plus `user_id`.
    pub async fn save_analysis(&self, result: &AnalysisResult) -> Result<SaveReceipt, ApiError> {
        let mut body = match serde_json::to_value(result) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(ApiError::InvalidRequest(
                    "analysis result did not serialize to an object".to_string(),
                ))
            }
            Err(e) => return Err(ApiError::InvalidRequest(e.to_string())),
        };
        body.insert("user_id".to_string(), Value::String(self.user_id.clone()));

        let start = std::time::Instant::now();
        let response = self
            .http
            .post(self.endpoint("/api/save-food-entry"))
            .json(&body)
            .send()
            .await?;
        let envelope: ApiEnvelope<Value> = read_envelope(response).await?;
        log::info!("[API] save-food-entry: {}ms", start.elapsed().as_millis());

        if !envelope.success {
            return Err(ApiError::Rejected("Failed to save food entry".to_string()));
        }
        Ok(SaveReceipt { id: envelope.id })
    }

    /// `GET /api/daily-summary`. `date` is `YYYY-MM-DD`; the backend defaults
    /// to today.
    pub async fn daily_summary(&self, date: Option<&str>) -> Result<DailySummary, ApiError> {
        let mut query = vec![("user_id", self.user_id.clone())];
        if let Some(date) = date {
            query.push(("date", date.to_string()));
        }
        self.get_data("/api/daily-summary", &query).await
    }

    /// `GET /api/food-entries`: newest first. `None` uses the configured
    /// `history_days`.
    pub async fn food_entries(&self, days: Option<u32>) -> Result<Vec<FoodEntry>, ApiError> {
        let days = days.unwrap_or(self.history_days);
        let query = [("user_id", self.user_id.clone()), ("days", days.to_string())];
        self.get_data("/api/food-entries", &query).await
    }

    /// `GET /api/weight-history`: oldest first. `None` uses the configured
    /// `weight_days`.
    pub async fn weight_history(&self, days: Option<u32>) -> Result<Vec<WeightRecord>, ApiError> {
        let days = days.unwrap_or(self.weight_days);
        let query = [("user_id", self.user_id.clone()), ("days", days.to_string())];
        self.get_data("/api/weight-history", &query).await
    }

    /// `POST /api/save-weight` with `{weight, user_id}`.
    pub async fn save_weight(&self, weight_kg: f64) -> Result<SaveReceipt, ApiError> {
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(ApiError::InvalidRequest(format!(
                "weight must be a positive number, got {}",
                weight_kg
            )));
        }
        let response = self
            .http
            .post(self.endpoint("/api/save-weight"))
            .json(&serde_json::json!({
                "weight": weight_kg,
                "user_id": self.user_id,
            }))
            .send()
            .await?;
        let envelope: ApiEnvelope<Value> = read_envelope(response).await?;
        if !envelope.success {
            return Err(ApiError::Rejected("Failed to save weight".to_string()));
        }
        Ok(SaveReceipt { id: envelope.id })
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let start = std::time::Instant::now();
        let response = self
            .http
            .get(self.endpoint(path))
            .query(query)
            .send()
            .await?;
        let envelope: ApiEnvelope<T> = read_envelope(response).await?;
        log::info!("[API] GET {}: {}ms", path, start.elapsed().as_millis());

        if !envelope.success {
            return Err(ApiError::Rejected(format!("{} reported failure", path)));
        }
        envelope
            .data
            .ok_or_else(|| ApiError::Malformed(format!("{} response has no data", path)))
    }
}

impl NutritionBackend for BackendClient {
    async fn analyze_food(&self, image: &CapturedImage) -> Result<AnalysisResult, ApiError> {
        self.analyze_food_image(image).await
    }

    async fn save_food_entry(&self, result: &AnalysisResult) -> Result<SaveReceipt, ApiError> {
        self.save_analysis(result).await
    }
}

/// Read the body, surface `{detail}` from error statuses, parse the envelope.
async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<ApiEnvelope<T>, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| body.chars().take(MAX_DETAIL_CHARS).collect());
        log::error!("[API] Backend returned {}: {}", status, detail);
        return Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        log::warn!("[API] Unparseable response: {}", e);
        ApiError::Malformed(e.to_string())
    })
}

/// File name sent with the multipart part, e.g. `food-image.jpg`.
fn upload_file_name(mime_type: &str) -> String {
    let ext = match mime_type {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        _ => "jpg",
    };
    format!("food-image.{}", ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_follows_mime() {
        assert_eq!(upload_file_name("image/jpeg"), "food-image.jpg");
        assert_eq!(upload_file_name("image/png"), "food-image.png");
        assert_eq!(upload_file_name("image/heic"), "food-image.jpg");
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let config = AppConfig {
            backend_url: "http://localhost:8001/".to_string(),
            ..AppConfig::default()
        };
        let client = BackendClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8001");
        assert_eq!(
            client.endpoint("/api/analyze-food"),
            "http://localhost:8001/api/analyze-food"
        );
    }

    #[tokio::test]
    async fn save_weight_rejects_nonsense_without_network() {
        let config = AppConfig {
            backend_url: "http://127.0.0.1:9".to_string(),
            ..AppConfig::default()
        };
        let client = BackendClient::new(&config).unwrap();
        assert!(matches!(
            client.save_weight(f64::NAN).await,
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(matches!(
            client.save_weight(-3.0).await,
            Err(ApiError::InvalidRequest(_))
        ));
    }
}
