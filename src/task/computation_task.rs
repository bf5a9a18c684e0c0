//! Asynchronous bridge around the similarity pipeline.
//!
//! The caller fires `submit` with a catalog snapshot and gets the annotated
//! result later through the registered handler. At most one computation is
//! logically live per task: a second `submit` supersedes the first, whose
//! result is dropped when it eventually arrives. Staleness is detected by
//! comparing against a monotonically increasing run id, cancellation goes
//! through a `CancellationToken`.

use crate::catalog::Track;
use crate::engine::{run_pipeline, AnnotatedTrack, EngineError, EngineSettings};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type ResultHandler = Box<dyn Fn(Result<Vec<AnnotatedTrack>, EngineError>) + Send + Sync>;

/// Lifecycle of the most recent submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Running,
    Completed,
}

struct Shared {
    run_counter: AtomicU64,
    state: Mutex<TaskState>,
    handler: Mutex<Option<ResultHandler>>,
}

pub struct ComputationTask {
    settings: EngineSettings,
    shared: Arc<Shared>,
    current_token: Mutex<Option<CancellationToken>>,
}

impl ComputationTask {
    pub fn new(settings: EngineSettings) -> Self {
        ComputationTask {
            settings,
            shared: Arc::new(Shared {
                run_counter: AtomicU64::new(0),
                state: Mutex::new(TaskState::Idle),
                handler: Mutex::new(None),
            }),
            current_token: Mutex::new(None),
        }
    }

    /// Register the single delivery callback. The handler receives either the
    /// complete annotated catalog or a typed validation error; never partial
    /// output. Replaces any previously registered handler.
    pub fn on_result<F>(&self, handler: F)
    where
        F: Fn(Result<Vec<AnnotatedTrack>, EngineError>) + Send + Sync + 'static,
    {
        *self.shared.handler.lock().unwrap() = Some(Box::new(handler));
    }

    /// Submit a catalog snapshot for computation. Fire-and-forget: returns
    /// immediately, the result arrives through the `on_result` handler.
    ///
    /// A run still in flight is superseded: its token is cancelled and its
    /// result, if it arrives late, is discarded. Must be called within a
    /// tokio runtime; the pipeline itself runs on the blocking pool so it
    /// never stalls the async executor.
    pub fn submit(&self, tracks: Vec<Track>) {
        let token = CancellationToken::new();
        {
            let mut current = self.current_token.lock().unwrap();
            if let Some(previous) = current.replace(token.clone()) {
                previous.cancel();
            }
        }

        let run_id = self.shared.run_counter.fetch_add(1, Ordering::SeqCst) + 1;
        *self.shared.state.lock().unwrap() = TaskState::Running;

        info!("Starting similarity run {} over {} tracks", run_id, tracks.len());

        let shared = Arc::clone(&self.shared);
        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || {
            let outcome = run_pipeline(&tracks, &settings);

            let still_current = shared.run_counter.load(Ordering::SeqCst) == run_id;
            if !still_current || token.is_cancelled() {
                // Superseded or cancelled: drop the result on the floor.
                debug!("Similarity run {} aborted, discarding result", run_id);
                return;
            }

            *shared.state.lock().unwrap() = TaskState::Completed;
            match &outcome {
                Ok(annotated) => {
                    info!("Similarity run {} completed with {} tracks", run_id, annotated.len())
                }
                Err(e) => warn!("Similarity run {} rejected: {}", run_id, e),
            }

            let handler = shared.handler.lock().unwrap();
            if let Some(handler) = handler.as_ref() {
                handler(outcome);
            } else {
                warn!("Similarity run {} finished with no handler registered", run_id);
            }
        });
    }

    /// Cancel any in-flight computation without delivering a result.
    pub fn cancel(&self) {
        if let Some(token) = self.current_token.lock().unwrap().take() {
            token.cancel();
        }
        // Bump the run id so an already-finished but undelivered run is stale.
        self.shared.run_counter.fetch_add(1, Ordering::SeqCst);
        *self.shared.state.lock().unwrap() = TaskState::Idle;
    }

    pub fn state(&self) -> TaskState {
        *self.shared.state.lock().unwrap()
    }
}

impl Drop for ComputationTask {
    fn drop(&mut self) {
        if let Some(token) = self.current_token.lock().unwrap().take() {
            token.cancel();
        }
    }
}
