//! Application bootstrap.
//!
//! Wires configuration, logging, and the backend client together. No
//! workflow logic lives here: hosts call `bootstrap()` once and then build
//! one `Workflow` per scan screen with `App::workflow`.

use crate::api::{ApiError, BackendClient};
use crate::capture::{CameraDevice, CaptureManager};
use crate::config::{AppConfig, ConfigError};
use crate::workflow::Workflow;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] ApiError),
}

pub struct App {
    config: AppConfig,
    backend: BackendClient,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self, StartupError> {
        let backend = BackendClient::new(&config)?;
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    /// A fresh workflow around `camera`, with the configured camera timeout.
    ///
    /// The workflow holds no user. Saves are attributed to the configured
    /// `user_id` by the `BackendClient` handed to `Workflow::commit`.
    pub fn workflow<C: CameraDevice>(&self, camera: C) -> Workflow<C> {
        let manager = CaptureManager::new(camera)
            .with_open_timeout(Duration::from_secs(self.config.camera_timeout_secs));
        Workflow::new(manager)
    }
}

/// Load env files, start logging, read config, build the client.
pub fn bootstrap() -> Result<App, StartupError> {
    load_env_files(Path::new(env!("CARGO_MANIFEST_DIR")));

    // A host may already have installed a logger.
    let _ = env_logger::try_init();

    let config = AppConfig::load()?;
    let app = App::new(config)?;
    log::info!("[STARTUP] NutriTrack client ready");
    Ok(app)
}

/// Load `.env.local`, else `.env`, from the working directory or `fallback_dir`.
///
/// Runs before the logger exists, so results go to stderr.
fn load_env_files(fallback_dir: &Path) {
    let cwd = std::env::current_dir().ok();
    let dirs = cwd.iter().map(|d| d.as_path()).chain(std::iter::once(fallback_dir));

    for dir in dirs {
        for env_file in [".env.local", ".env"] {
            let path = dir.join(env_file);
            if path.exists() {
                match dotenvy::from_path(&path) {
                    Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                    Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
                }
                return;
            }
        }
    }
}
