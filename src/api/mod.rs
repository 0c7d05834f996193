//! Backend API domain: the NutriTrack HTTP service, consumed not defined.
//!
//! - **client**: `BackendClient` over reqwest (analyze, save, read-side views)
//! - **types**: response envelopes and records
//!
//! The workflow only depends on the `NutritionBackend` trait, so it can run
//! against an in-memory backend in tests.

pub mod client;
pub mod types;

pub use client::BackendClient;
pub use types::{AnalysisResult, DailySummary, FoodEntry, SaveReceipt, WeightRecord};

use crate::source::CapturedImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },
    /// The backend answered `{"success": false}`.
    #[error("{0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// The two calls the capture workflow makes.
#[allow(async_fn_in_trait)]
pub trait NutritionBackend {
    /// Classify one image. Exactly one request per call.
    async fn analyze_food(&self, image: &CapturedImage) -> Result<AnalysisResult, ApiError>;

    /// Persist an accepted result for the configured user.
    async fn save_food_entry(&self, result: &AnalysisResult) -> Result<SaveReceipt, ApiError>;
}
