//! Conversion controller: owns the state of the current/last run.
//!
//! ```text
//!  Idle ──start──▶ Running{progress} ──ok──▶ Succeeded(outcome)
//!   ▲                   │                          │
//!   │                   └────────err──▶ Failed(msg)│
//!   └──────────── next start (from any non-running state) ◀┘
//! ```
//!
//! One controller serves one operator session. A second `start` while a run
//! is in flight is rejected with [`Pdf2SlidesError::ConversionInProgress`].
//! The last result is kept until the next start.

use crate::convert::{Converter, Upload};
use crate::error::Pdf2SlidesError;
use crate::output::ConversionOutput;
use crate::pipeline::archive::ImageArchive;
use crate::progress::{fraction, ConversionProgressCallback};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

/// What a successful run leaves behind for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub file_name: String,
    pub presentation_url: String,
    pub slide_count: usize,
    pub archive: Option<ImageArchive>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConversionState {
    Idle,
    Running { file_name: String, progress: f32 },
    Succeeded(ConversionOutcome),
    Failed { file_name: String, message: String },
}

impl ConversionState {
    pub fn is_running(&self) -> bool {
        matches!(self, ConversionState::Running { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            ConversionState::Idle => "idle",
            ConversionState::Running { .. } => "running",
            ConversionState::Succeeded(_) => "succeeded",
            ConversionState::Failed { .. } => "failed",
        }
    }
}

/// Serializable view of [`ConversionState`] for the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub state: &'static str,
    pub progress: f32,
    pub file_name: Option<String>,
    pub presentation_url: Option<String>,
    pub archive_name: Option<String>,
    pub error: Option<String>,
}

impl From<&ConversionState> for StatusSnapshot {
    fn from(state: &ConversionState) -> Self {
        let mut snapshot = StatusSnapshot {
            state: state.label(),
            progress: 0.0,
            file_name: None,
            presentation_url: None,
            archive_name: None,
            error: None,
        };
        match state {
            ConversionState::Idle => {}
            ConversionState::Running {
                file_name,
                progress,
            } => {
                snapshot.file_name = Some(file_name.clone());
                snapshot.progress = *progress;
            }
            ConversionState::Succeeded(outcome) => {
                snapshot.progress = 1.0;
                snapshot.file_name = Some(outcome.file_name.clone());
                snapshot.presentation_url = Some(outcome.presentation_url.clone());
                snapshot.archive_name = outcome.archive.as_ref().map(|a| a.file_name.clone());
            }
            ConversionState::Failed { file_name, message } => {
                snapshot.file_name = Some(file_name.clone());
                snapshot.error = Some(message.clone());
            }
        }
        snapshot
    }
}

type SharedState = Arc<Mutex<ConversionState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, ConversionState> {
    // A panic elsewhere must not wedge the UI; the state is always whole.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drives a [`Converter`] and records the result.
#[derive(Clone)]
pub struct ConversionController {
    converter: Arc<dyn Converter>,
    state: SharedState,
}

impl ConversionController {
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        Self {
            converter,
            state: Arc::new(Mutex::new(ConversionState::Idle)),
        }
    }

    /// Run one conversion to completion.
    ///
    /// The conversion runs on its own task: dropping the returned future
    /// (a client hanging up, say) neither cancels it nor leaves the state
    /// stuck in `Running`. Returns the conversion error too, but it has
    /// already been recorded as `Failed` by the time the caller sees it.
    pub async fn run(&self, upload: Upload) -> Result<(), Pdf2SlidesError> {
        let file_name = upload.file_name.clone();
        self.start(&file_name)?;

        let converter = Arc::clone(&self.converter);
        let state = Arc::clone(&self.state);
        let name = file_name.clone();
        let task = tokio::spawn(async move {
            let progress = Arc::new(ControllerProgress {
                state: Arc::clone(&state),
            });
            let result = converter.convert(upload, progress).await;
            record(&state, name, result)
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                // The task only ends early by panicking; leave the UI usable.
                let err = Pdf2SlidesError::Internal(format!("conversion task aborted: {e}"));
                let mut state = lock(&self.state);
                if state.is_running() {
                    *state = ConversionState::Failed {
                        file_name,
                        message: err.to_string(),
                    };
                }
                Err(err)
            }
        }
    }

    fn start(&self, file_name: &str) -> Result<(), Pdf2SlidesError> {
        let mut state = lock(&self.state);
        if state.is_running() {
            return Err(Pdf2SlidesError::ConversionInProgress);
        }
        *state = ConversionState::Running {
            file_name: file_name.to_string(),
            progress: 0.0,
        };
        Ok(())
    }

    pub fn state(&self) -> ConversionState {
        lock(&self.state).clone()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::from(&*lock(&self.state))
    }

    /// The archive from the last successful run, if one was requested.
    pub fn archive(&self) -> Option<ImageArchive> {
        match &*lock(&self.state) {
            ConversionState::Succeeded(outcome) => outcome.archive.clone(),
            _ => None,
        }
    }
}

fn record(
    state: &SharedState,
    file_name: String,
    result: Result<ConversionOutput, Pdf2SlidesError>,
) -> Result<(), Pdf2SlidesError> {
    let mut state = lock(state);
    match result {
        Ok(output) => {
            info!("Conversion of {} finished: {}", file_name, output.presentation_url);
            *state = ConversionState::Succeeded(ConversionOutcome {
                file_name,
                presentation_url: output.presentation_url,
                slide_count: output.slides.len(),
                archive: output.archive,
            });
            Ok(())
        }
        Err(e) => {
            warn!("Conversion of {} failed: {}", file_name, e);
            *state = ConversionState::Failed {
                file_name,
                message: e.to_string(),
            };
            Err(e)
        }
    }
}

/// Feeds pipeline progress into the controller's `Running` state.
struct ControllerProgress {
    state: SharedState,
}

impl ControllerProgress {
    fn advance(&self, value: f32) {
        if let ConversionState::Running { progress, .. } = &mut *lock(&self.state) {
            if value > *progress {
                *progress = value;
            }
        }
    }
}

impl ConversionProgressCallback for ControllerProgress {
    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        self.advance(fraction(page_num, total_pages));
    }

    fn on_conversion_complete(&self, _total_pages: usize) {
        self.advance(1.0);
    }
}
