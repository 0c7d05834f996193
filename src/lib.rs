//! NutriTrack client core: snap a meal, get a nutrition estimate, log it.
//!
//! This crate is the scan workflow behind the NutriTrack app. Display
//! surfaces (dashboard, history, weight charts) live in the host and only
//! consume the backend client and the `Committed` notifications.
//!
//! Domains:
//!   - capture/              : camera device ownership (RAII handle)
//!   - source.rs             : camera frames and picked files → CapturedImage
//!   - api/                  : NutriTrack backend HTTP client + types
//!   - workflow/             : state machine + controller (analyze, commit)
//!   - display.rs            : result formatting
//!   - config.rs / app.rs    : configuration and bootstrap

pub mod api;
pub mod app;
pub mod capture;
pub mod config;
pub mod display;
pub mod error;
pub mod source;
pub mod workflow;

pub use api::{AnalysisResult, BackendClient, NutritionBackend};
pub use app::{bootstrap, App};
pub use capture::{CameraDevice, CaptureManager, DeviceHandle, MediaStream, StillCamera};
pub use config::AppConfig;
pub use error::WorkflowError;
pub use source::{CapturedImage, Frame, ImageOrigin};
pub use workflow::{Phase, Workflow, WorkflowEvent, WorkflowState};
