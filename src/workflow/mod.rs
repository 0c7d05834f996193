//! Capture → analyze → commit workflow: the controller around the state machine.
//!
//! `Workflow` owns the camera manager, the current `WorkflowState`, and the
//! notifier. Each operation does its I/O, then feeds the outcome through the
//! pure `transition` function in `state.rs`:
//!
//!   - open_camera / capture / cancel_camera  : camera path
//!   - upload                                 : file path
//!   - analyze (or begin/complete_analysis)   : remote classification
//!   - commit (or begin/complete_commit)      : save to diary
//!   - retake / abandon_analysis / teardown   : resets
//!
//! The split begin/complete pairs exist for hosts that must stay responsive
//! while a request is in flight. A completion carries the request id it was
//! started with, and anything that is not the current request is dropped.

pub mod events;
pub mod state;

pub use events::{Notifier, WorkflowEvent};
pub use state::{transition, Event, Outcome, Phase, RequestId, Transition, WorkflowState};

use crate::api::{AnalysisResult, ApiError, NutritionBackend, SaveReceipt};
use crate::capture::{CameraDevice, CaptureManager};
use crate::display::ResultView;
use crate::error::WorkflowError;
use crate::source::CapturedImage;
use tokio::sync::broadcast;

/// What an analysis request needs, handed out by `begin_analysis`.
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub request: RequestId,
    pub image: CapturedImage,
}

/// What a save request needs, handed out by `begin_commit`.
#[derive(Debug, Clone)]
pub struct CommitTicket {
    pub result: AnalysisResult,
}

pub struct Workflow<C: CameraDevice> {
    state: WorkflowState,
    camera: CaptureManager<C>,
    next_request: u64,
    notifier: Notifier,
}

impl<C: CameraDevice> Workflow<C> {
    pub fn new(camera: CaptureManager<C>) -> Self {
        Self {
            state: WorkflowState::Idle,
            camera,
            next_request: 1,
            notifier: Notifier::new(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn camera(&self) -> &CaptureManager<C> {
        &self.camera
    }

    /// Formatted results, while results are shown.
    pub fn result_view(&self) -> Option<ResultView> {
        self.state.result().map(ResultView::from)
    }

    /// Receive `Committed` notifications (dashboard / history refresh).
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.notifier.subscribe()
    }

    pub fn refresh_generation(&self) -> u64 {
        self.notifier.refresh_generation()
    }

    /// Feed one event through the state machine and store the new state.
    fn apply(&mut self, event: Event) -> Outcome {
        let from = self.state.phase();
        let current = std::mem::replace(&mut self.state, WorkflowState::Idle);
        let Transition { state, outcome } = transition(current, event);
        self.state = state;

        match outcome {
            Outcome::Applied => {
                log::info!("[WORKFLOW] {:?} → {:?}", from, self.state.phase());
            }
            Outcome::Stale => {
                log::debug!("[WORKFLOW] Dropped stale response while {:?}", from);
            }
            Outcome::Rejected { from, action } => {
                log::warn!("[WORKFLOW] Rejected '{}' while {:?}", action, from);
            }
        }
        outcome
    }

    /// `apply`, with rejection turned into `InvalidTransition`.
    fn apply_checked(&mut self, event: Event) -> Result<(), WorkflowError> {
        match self.apply(event) {
            Outcome::Rejected { from, action } => {
                Err(WorkflowError::InvalidTransition { from, action })
            }
            Outcome::Applied | Outcome::Stale => Ok(()),
        }
    }

    fn invalid(&self, action: &'static str) -> WorkflowError {
        WorkflowError::InvalidTransition {
            from: self.state.phase(),
            action,
        }
    }

    // ── camera ──────────────────────────────────────────────────────

    /// Ask for the camera. On denial the workflow shows `DeviceUnavailable`
    /// and the user can upload a file instead.
    pub async fn open_camera(&mut self) -> Result<(), WorkflowError> {
        if !self.state.accepts_new_image() {
            return Err(self.invalid("open the camera"));
        }

        match self.camera.open().await {
            Ok(()) => {
                if let Err(e) = self.apply_checked(Event::CameraOpened) {
                    self.camera.release();
                    return Err(e);
                }
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.apply(Event::CameraFailed(message.clone()));
                Err(WorkflowError::DeviceUnavailable(message))
            }
        }
    }

    /// Take the picture. The camera is stopped before this returns, on
    /// success and on failure.
    pub fn capture(&mut self) -> Result<(), WorkflowError> {
        if self.state.phase() != Phase::CameraActive {
            return Err(self.invalid("capture"));
        }

        match self.camera.capture() {
            Ok(image) => self.apply_checked(Event::ImageAcquired(image)),
            Err(e) => {
                let message = e.to_string();
                log::error!("[CAMERA] Capture failed: {}", message);
                self.apply(Event::CameraFailed(message.clone()));
                Err(WorkflowError::DeviceUnavailable(message))
            }
        }
    }

    /// Close the camera view without taking a picture.
    pub fn cancel_camera(&mut self) -> Result<(), WorkflowError> {
        self.camera.release();
        self.apply_checked(Event::CameraClosed)
    }

    // ── file upload ─────────────────────────────────────────────────

    /// Use a picked file instead of the camera.
    pub fn upload(&mut self, bytes: Vec<u8>, mime_type: Option<&str>) -> Result<(), WorkflowError> {
        if !self.state.accepts_new_image() {
            return Err(self.invalid("upload a photo"));
        }

        match CapturedImage::from_file(bytes, mime_type) {
            Ok(image) => self.apply_checked(Event::ImageAcquired(image)),
            Err(e) => {
                let message = e.to_string();
                log::warn!("[SOURCE] Upload rejected: {}", message);
                self.apply(Event::ImageRejected(message.clone()));
                Err(WorkflowError::UnreadableFile(message))
            }
        }
    }

    // ── analysis ────────────────────────────────────────────────────

    /// Enter `Analyzing` and hand out what the request needs.
    pub fn begin_analysis(&mut self) -> Result<AnalysisTicket, WorkflowError> {
        let request = RequestId(self.next_request);
        self.apply_checked(Event::AnalysisStarted(request))?;
        self.next_request += 1;

        let image = self
            .state
            .image()
            .cloned()
            .ok_or_else(|| self.invalid("analyze"))?;
        log::info!("[ANALYZE] Request {} started ({} bytes)", request, image.len());
        Ok(AnalysisTicket { request, image })
    }

    /// Deliver the response for `request`. Returns `Outcome::Stale` when the
    /// request was abandoned or superseded; state is untouched in that case.
    pub fn complete_analysis(
        &mut self,
        request: RequestId,
        response: Result<AnalysisResult, ApiError>,
    ) -> Outcome {
        let event = match response {
            Ok(result) => {
                log::info!(
                    "[ANALYZE] Request {}: {} ({:.3})",
                    request,
                    result.category,
                    result.probability
                );
                Event::AnalysisSucceeded { request, result }
            }
            Err(e) => {
                log::warn!("[ANALYZE] Request {} failed: {}", request, e);
                Event::AnalysisFailed {
                    request,
                    message: e.to_string(),
                }
            }
        };
        self.apply(event)
    }

    /// Stop waiting for the in-flight analysis. Its response will be ignored.
    pub fn abandon_analysis(&mut self) -> Result<(), WorkflowError> {
        self.apply_checked(Event::AnalysisAbandoned)
    }

    /// Run one analysis round trip against `backend`.
    pub async fn analyze<B: NutritionBackend>(&mut self, backend: &B) -> Result<(), WorkflowError> {
        let ticket = self.begin_analysis()?;
        let start = std::time::Instant::now();
        let response = backend.analyze_food(&ticket.image).await;
        log::info!("[ANALYZE] Round trip: {}ms", start.elapsed().as_millis());

        let failure = response.as_ref().err().map(ToString::to_string);
        self.complete_analysis(ticket.request, response);
        match failure {
            Some(message) => Err(WorkflowError::AnalysisFailed(message)),
            None => Ok(()),
        }
    }

    // ── commit ──────────────────────────────────────────────────────

    /// Mark a save as in flight and hand out the result to send.
    pub fn begin_commit(&mut self) -> Result<CommitTicket, WorkflowError> {
        self.apply_checked(Event::CommitStarted)?;
        let result = self
            .state
            .result()
            .cloned()
            .ok_or_else(|| self.invalid("save"))?;
        Ok(CommitTicket { result })
    }

    /// Deliver the save response. On success the workflow resets and one
    /// `Committed` notification goes out; on failure the result stays.
    pub fn complete_commit(
        &mut self,
        ticket: &CommitTicket,
        response: Result<SaveReceipt, ApiError>,
    ) -> Result<SaveReceipt, WorkflowError> {
        match response {
            Ok(receipt) => {
                self.apply_checked(Event::CommitSucceeded)?;
                let entry_id = receipt
                    .id
                    .clone()
                    .or_else(|| ticket.result.entry_id().map(str::to_string));
                log::info!(
                    "[COMMIT] Saved '{}' (id: {})",
                    ticket.result.category,
                    entry_id.as_deref().unwrap_or("-")
                );
                self.notifier.committed(entry_id);
                Ok(receipt)
            }
            Err(e) => {
                let message = e.to_string();
                log::warn!("[COMMIT] Save failed: {}", message);
                self.apply_checked(Event::CommitFailed(message.clone()))?;
                Err(WorkflowError::CommitFailed(message))
            }
        }
    }

    /// Save the shown result. Outside `ResultsReady` this returns
    /// `InvalidTransition` without touching the network.
    pub async fn commit<B: NutritionBackend>(
        &mut self,
        backend: &B,
    ) -> Result<SaveReceipt, WorkflowError> {
        let ticket = self.begin_commit()?;
        let response = backend.save_food_entry(&ticket.result).await;
        self.complete_commit(&ticket, response)
    }

    // ── resets ──────────────────────────────────────────────────────

    /// Discard image, result, and error; back to `Idle`.
    pub fn retake(&mut self) -> Result<(), WorkflowError> {
        self.apply_checked(Event::Retake)
    }

    /// The hosting view is going away: stop the camera and stop waiting on
    /// any analysis. Results and errors are left for the next view.
    pub fn teardown(&mut self) {
        self.camera.release();
        match self.state.phase() {
            Phase::CameraActive => {
                self.apply(Event::CameraClosed);
            }
            Phase::Analyzing => {
                self.apply(Event::AnalysisAbandoned);
            }
            _ => {}
        }
    }
}

impl<C: CameraDevice> std::fmt::Debug for Workflow<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("phase", &self.state.phase())
            .field("camera", &self.camera)
            .field("next_request", &self.next_request)
            .finish()
    }
}
