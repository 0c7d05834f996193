//! Workflow states, events, and the pure transition function.
//!
//! `transition(state, event)` never performs I/O. The controller in
//! `workflow/mod.rs` does the I/O and feeds the outcomes back in as events,
//! which keeps every rule below testable without a camera or a backend.
//!
//! ```text
//! Idle ──open──▶ CameraActive ──capture──▶ Captured
//! Idle ──upload────────────────────────────▶ Captured
//! Captured ──analyze──▶ Analyzing ──ok──▶ ResultsReady ──commit ok──▶ Idle
//!                           └──fail──▶ Error ──retake──▶ Idle
//! ```

use crate::api::AnalysisResult;
use crate::error::WorkflowError;
use crate::source::{CapturedImage, ImageOrigin};
use std::fmt;

/// Identifies one analysis request. A response is only applied while its id
/// is the one the workflow is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State tag without payload, for logs, errors, and UI switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    CameraActive,
    Captured,
    Analyzing,
    ResultsReady,
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::CameraActive => "camera is active",
            Phase::Captured => "image is captured",
            Phase::Analyzing => "analyzing",
            Phase::ResultsReady => "results are shown",
            Phase::Error => "showing an error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    CameraActive,
    Captured {
        image: CapturedImage,
    },
    Analyzing {
        image: CapturedImage,
        request: RequestId,
    },
    ResultsReady {
        image: CapturedImage,
        result: AnalysisResult,
        /// A save request is in flight.
        committing: bool,
        /// Last failed save, cleared when a new save starts.
        commit_error: Option<WorkflowError>,
    },
    Error {
        error: WorkflowError,
        /// Kept after a failed analysis so it can be re-run without a retake.
        image: Option<CapturedImage>,
    },
}

impl WorkflowState {
    pub fn phase(&self) -> Phase {
        match self {
            WorkflowState::Idle => Phase::Idle,
            WorkflowState::CameraActive => Phase::CameraActive,
            WorkflowState::Captured { .. } => Phase::Captured,
            WorkflowState::Analyzing { .. } => Phase::Analyzing,
            WorkflowState::ResultsReady { .. } => Phase::ResultsReady,
            WorkflowState::Error { .. } => Phase::Error,
        }
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        match self {
            WorkflowState::Captured { image }
            | WorkflowState::Analyzing { image, .. }
            | WorkflowState::ResultsReady { image, .. } => Some(image),
            WorkflowState::Error { image, .. } => image.as_ref(),
            WorkflowState::Idle | WorkflowState::CameraActive => None,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            WorkflowState::ResultsReady { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Error to show the user, if any.
    pub fn error(&self) -> Option<&WorkflowError> {
        match self {
            WorkflowState::Error { error, .. } => Some(error),
            WorkflowState::ResultsReady { commit_error, .. } => commit_error.as_ref(),
            _ => None,
        }
    }

    /// Loading indicator.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            WorkflowState::Analyzing { .. } | WorkflowState::ResultsReady { committing: true, .. }
        )
    }

    /// No image held: the user may open the camera or pick a file.
    pub(crate) fn accepts_new_image(&self) -> bool {
        matches!(
            self,
            WorkflowState::Idle | WorkflowState::Error { image: None, .. }
        )
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    CameraOpened,
    /// Permission denied, no device, or a failed frame read.
    CameraFailed(String),
    /// The camera view was closed without capturing.
    CameraClosed,
    ImageAcquired(CapturedImage),
    ImageRejected(String),
    AnalysisStarted(RequestId),
    AnalysisSucceeded {
        request: RequestId,
        result: AnalysisResult,
    },
    AnalysisFailed {
        request: RequestId,
        message: String,
    },
    /// Give up on the in-flight analysis; its response will be dropped.
    AnalysisAbandoned,
    CommitStarted,
    CommitSucceeded,
    CommitFailed(String),
    Retake,
}

impl Event {
    /// Verb used in `InvalidTransition` messages.
    pub fn action(&self) -> &'static str {
        match self {
            Event::CameraOpened => "open the camera",
            Event::CameraFailed(_) => "report a camera failure",
            Event::CameraClosed => "close the camera",
            Event::ImageAcquired(_) => "accept an image",
            Event::ImageRejected(_) => "reject an image",
            Event::AnalysisStarted(_) => "analyze",
            Event::AnalysisSucceeded { .. } | Event::AnalysisFailed { .. } => {
                "finish analysis"
            }
            Event::AnalysisAbandoned => "abandon analysis",
            Event::CommitStarted => "save",
            Event::CommitSucceeded | Event::CommitFailed(_) => "finish saving",
            Event::Retake => "retake",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A response for a request that is no longer current. State unchanged.
    Stale,
    /// The event is not allowed in this state. State unchanged.
    Rejected { from: Phase, action: &'static str },
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub state: WorkflowState,
    pub outcome: Outcome,
}

impl Transition {
    fn applied(state: WorkflowState) -> Self {
        Self {
            state,
            outcome: Outcome::Applied,
        }
    }

    fn stale(state: WorkflowState) -> Self {
        Self {
            state,
            outcome: Outcome::Stale,
        }
    }

    fn rejected(state: WorkflowState, action: &'static str) -> Self {
        let from = state.phase();
        Self {
            state,
            outcome: Outcome::Rejected { from, action },
        }
    }
}

/// Apply one event. Pure: the same inputs always give the same output.
pub fn transition(state: WorkflowState, event: Event) -> Transition {
    use WorkflowState as S;

    let action = event.action();
    match (state, event) {
        // ── camera ──
        (s, Event::CameraOpened) if s.accepts_new_image() => Transition::applied(S::CameraActive),
        (s, Event::CameraFailed(msg)) if s.accepts_new_image() || matches!(s, S::CameraActive) => {
            Transition::applied(S::Error {
                error: WorkflowError::DeviceUnavailable(msg),
                image: None,
            })
        }
        (S::CameraActive, Event::CameraClosed) => Transition::applied(S::Idle),

        // ── image acquisition ──
        (S::CameraActive, Event::ImageAcquired(image)) if image.origin() == ImageOrigin::Camera => {
            Transition::applied(S::Captured { image })
        }
        (s, Event::ImageAcquired(image))
            if s.accepts_new_image() && image.origin() == ImageOrigin::Upload =>
        {
            Transition::applied(S::Captured { image })
        }
        (s, Event::ImageRejected(msg)) if s.accepts_new_image() => Transition::applied(S::Error {
            error: WorkflowError::UnreadableFile(msg),
            image: None,
        }),

        // ── analysis ──
        (S::Captured { image }, Event::AnalysisStarted(request))
        | (
            S::Error {
                image: Some(image),
                ..
            },
            Event::AnalysisStarted(request),
        ) => Transition::applied(S::Analyzing { image, request }),

        (S::Analyzing { image, request }, Event::AnalysisSucceeded { request: r, result })
            if r == request =>
        {
            Transition::applied(S::ResultsReady {
                image,
                result,
                committing: false,
                commit_error: None,
            })
        }
        (S::Analyzing { image, request }, Event::AnalysisFailed { request: r, message })
            if r == request =>
        {
            Transition::applied(S::Error {
                error: WorkflowError::AnalysisFailed(message),
                image: Some(image),
            })
        }
        // Responses that do not match the pending request are dropped, in any state.
        (s, Event::AnalysisSucceeded { .. }) | (s, Event::AnalysisFailed { .. }) => {
            Transition::stale(s)
        }
        (S::Analyzing { .. }, Event::AnalysisAbandoned) => Transition::applied(S::Idle),

        // ── commit ──
        (
            S::ResultsReady {
                image,
                result,
                committing: false,
                ..
            },
            Event::CommitStarted,
        ) => Transition::applied(S::ResultsReady {
            image,
            result,
            committing: true,
            commit_error: None,
        }),
        (
            S::ResultsReady {
                committing: true, ..
            },
            Event::CommitSucceeded,
        ) => Transition::applied(S::Idle),
        (
            S::ResultsReady {
                image,
                result,
                committing: true,
                ..
            },
            Event::CommitFailed(msg),
        ) => Transition::applied(S::ResultsReady {
            image,
            result,
            committing: false,
            commit_error: Some(WorkflowError::CommitFailed(msg)),
        }),

        // ── retake ──
        (S::Captured { .. }, Event::Retake)
        | (
            S::ResultsReady {
                committing: false, ..
            },
            Event::Retake,
        )
        | (S::Error { .. }, Event::Retake) => Transition::applied(S::Idle),

        (s, _) => Transition::rejected(s, action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests::{png_bytes, solid_frame};
    use serde_json::json;

    fn camera_image() -> CapturedImage {
        CapturedImage::from_capture(&solid_frame(4, 4)).unwrap()
    }

    fn upload_image() -> CapturedImage {
        CapturedImage::from_file(png_bytes(4, 4), Some("image/png")).unwrap()
    }

    fn result() -> AnalysisResult {
        serde_json::from_value(json!({
            "category": "salad",
            "probability": 0.8734,
            "nutrition": {"calories": 250, "protein": 12, "carbs": 30}
        }))
        .unwrap()
    }

    fn ready() -> WorkflowState {
        WorkflowState::ResultsReady {
            image: camera_image(),
            result: result(),
            committing: false,
            commit_error: None,
        }
    }

    fn step(state: WorkflowState, event: Event) -> WorkflowState {
        let t = transition(state, event);
        assert_eq!(t.outcome, Outcome::Applied, "expected transition to apply");
        t.state
    }

    #[test]
    fn happy_path_camera_to_commit() {
        let s = step(WorkflowState::Idle, Event::CameraOpened);
        assert_eq!(s.phase(), Phase::CameraActive);
        let s = step(s, Event::ImageAcquired(camera_image()));
        assert_eq!(s.phase(), Phase::Captured);
        let s = step(s, Event::AnalysisStarted(RequestId(1)));
        assert!(s.is_busy());
        let s = step(
            s,
            Event::AnalysisSucceeded {
                request: RequestId(1),
                result: result(),
            },
        );
        assert_eq!(s.phase(), Phase::ResultsReady);
        let s = step(s, Event::CommitStarted);
        assert!(s.is_busy());
        let s = step(s, Event::CommitSucceeded);
        assert_eq!(s, WorkflowState::Idle);
    }

    #[test]
    fn upload_path_skips_camera() {
        let s = step(WorkflowState::Idle, Event::ImageAcquired(upload_image()));
        assert_eq!(s.phase(), Phase::Captured);
    }

    #[test]
    fn camera_image_needs_active_camera() {
        let t = transition(WorkflowState::Idle, Event::ImageAcquired(camera_image()));
        assert!(matches!(t.outcome, Outcome::Rejected { from: Phase::Idle, .. }));
        let t = transition(WorkflowState::CameraActive, Event::ImageAcquired(upload_image()));
        assert!(matches!(t.outcome, Outcome::Rejected { .. }));
    }

    #[test]
    fn retake_always_lands_in_idle_without_payload() {
        let error = WorkflowState::Error {
            error: WorkflowError::AnalysisFailed("boom".to_string()),
            image: Some(camera_image()),
        };
        for s in [WorkflowState::Captured { image: camera_image() }, ready(), error] {
            let next = step(s, Event::Retake);
            assert_eq!(next, WorkflowState::Idle);
            assert!(next.image().is_none());
            assert!(next.result().is_none());
            assert!(next.error().is_none());
        }
    }

    #[test]
    fn retake_rejected_while_analyzing_or_committing() {
        let analyzing = WorkflowState::Analyzing {
            image: camera_image(),
            request: RequestId(3),
        };
        let t = transition(analyzing, Event::Retake);
        assert_eq!(
            t.outcome,
            Outcome::Rejected {
                from: Phase::Analyzing,
                action: "retake"
            }
        );

        let committing = step(ready(), Event::CommitStarted);
        let t = transition(committing, Event::Retake);
        assert!(matches!(t.outcome, Outcome::Rejected { .. }));
    }

    #[test]
    fn second_analysis_is_rejected() {
        let s = WorkflowState::Analyzing {
            image: camera_image(),
            request: RequestId(1),
        };
        let t = transition(s, Event::AnalysisStarted(RequestId(2)));
        assert!(matches!(t.outcome, Outcome::Rejected { from: Phase::Analyzing, .. }));
        assert!(matches!(
            t.state,
            WorkflowState::Analyzing {
                request: RequestId(1),
                ..
            }
        ));
    }

    #[test]
    fn mismatched_response_is_stale() {
        let s = WorkflowState::Analyzing {
            image: camera_image(),
            request: RequestId(2),
        };
        let t = transition(
            s.clone(),
            Event::AnalysisSucceeded {
                request: RequestId(1),
                result: result(),
            },
        );
        assert_eq!(t.outcome, Outcome::Stale);
        assert_eq!(t.state, s);

        let t = transition(
            WorkflowState::Idle,
            Event::AnalysisFailed {
                request: RequestId(2),
                message: "late".to_string(),
            },
        );
        assert_eq!(t.outcome, Outcome::Stale);
        assert_eq!(t.state, WorkflowState::Idle);
    }

    #[test]
    fn failed_analysis_keeps_image_for_retry() {
        let image = camera_image();
        let s = WorkflowState::Analyzing {
            image: image.clone(),
            request: RequestId(1),
        };
        let s = step(
            s,
            Event::AnalysisFailed {
                request: RequestId(1),
                message: "Failed to analyze food image".to_string(),
            },
        );
        assert_eq!(s.phase(), Phase::Error);
        assert_eq!(s.image(), Some(&image));

        let s = step(s, Event::AnalysisStarted(RequestId(2)));
        assert_eq!(s.phase(), Phase::Analyzing);
    }

    #[test]
    fn abandon_returns_to_idle() {
        let s = WorkflowState::Analyzing {
            image: camera_image(),
            request: RequestId(1),
        };
        assert_eq!(step(s, Event::AnalysisAbandoned), WorkflowState::Idle);
    }

    #[test]
    fn failed_commit_keeps_result() {
        let s = step(ready(), Event::CommitStarted);
        let s = step(s, Event::CommitFailed("Failed to save food entry".to_string()));
        assert_eq!(s.phase(), Phase::ResultsReady);
        assert!(!s.is_busy());
        assert_eq!(s.result(), Some(&result()));
        assert!(matches!(s.error(), Some(WorkflowError::CommitFailed(_))));

        // retry clears the surfaced error
        let s = step(s, Event::CommitStarted);
        assert!(s.error().is_none());
    }

    #[test]
    fn commit_only_from_results_ready() {
        for s in [
            WorkflowState::Idle,
            WorkflowState::CameraActive,
            WorkflowState::Captured { image: camera_image() },
        ] {
            let t = transition(s, Event::CommitStarted);
            assert!(matches!(t.outcome, Outcome::Rejected { .. }));
        }
        let committing = step(ready(), Event::CommitStarted);
        let t = transition(committing, Event::CommitStarted);
        assert!(matches!(t.outcome, Outcome::Rejected { .. }));
    }

    #[test]
    fn device_failure_allows_upload_fallback() {
        let s = step(
            WorkflowState::CameraActive,
            Event::CameraFailed("NotAllowedError".to_string()),
        );
        assert!(matches!(s.error(), Some(WorkflowError::DeviceUnavailable(_))));
        assert!(s.image().is_none());
        let s = step(s, Event::ImageAcquired(upload_image()));
        assert_eq!(s.phase(), Phase::Captured);
    }

    #[test]
    fn unreadable_upload_then_reopen_camera() {
        let s = step(WorkflowState::Idle, Event::ImageRejected("corrupt".to_string()));
        assert!(matches!(s.error(), Some(WorkflowError::UnreadableFile(_))));
        let s = step(s, Event::CameraOpened);
        assert_eq!(s.phase(), Phase::CameraActive);
    }
}
