use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{BookingSubmission, CompletedBooking};
use crate::services::booking_flow::{FlowController, SubmitError};
use crate::services::submission::BookingSink;

struct FlowEntry {
    controller: FlowController,
    // Dropping the sender (or sending `true`) cancels an in-flight submission.
    cancel: watch::Sender<bool>,
    last_touched: Instant,
}

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Live booking sessions. Drafts exist only here and are dropped on
/// completion, abandonment, or after sitting idle for `idle_timeout`.
pub struct FlowRegistry {
    flows: Mutex<HashMap<Uuid, FlowEntry>>,
    idle_timeout: Duration,
}

impl Default for FlowRegistry {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            flows: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, FlowEntry>>, AppError> {
        self.flows
            .lock()
            .map_err(|_| AppError::Internal("flow registry lock poisoned".to_string()))
    }

    pub fn start(&self, controller: FlowController) -> Result<Uuid, AppError> {
        self.evict_idle()?;
        let id = Uuid::new_v4();
        let (cancel, _) = watch::channel(false);
        self.lock()?.insert(
            id,
            FlowEntry {
                controller,
                cancel,
                last_touched: Instant::now(),
            },
        );
        Ok(id)
    }

    /// Drops flows untouched for longer than the idle timeout. A flow with a
    /// submission in flight is kept until the sink answers.
    pub fn evict_idle(&self) -> Result<usize, AppError> {
        let mut flows = self.lock()?;
        let before = flows.len();
        flows.retain(|id, entry| {
            let idle = entry.last_touched.elapsed() > self.idle_timeout
                && !entry.controller.is_submitting();
            if idle {
                tracing::info!(flow_id = %id, step = entry.controller.step().as_str(), "evicting idle booking flow");
            }
            !idle
        });
        Ok(before - flows.len())
    }

    /// Runs `f` against the flow while holding the registry lock. `f` must not
    /// block.
    pub fn with_flow<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut FlowController) -> T,
    ) -> Result<T, AppError> {
        let mut flows = self.lock()?;
        let entry = flows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("booking flow {id}")))?;
        entry.last_touched = Instant::now();
        Ok(f(&mut entry.controller))
    }

    pub fn abandon(&self, id: Uuid) -> Result<(), AppError> {
        let entry = self
            .lock()?
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("booking flow {id}")))?;
        let _ = entry.cancel.send(true);
        tracing::info!(flow_id = %id, step = entry.controller.step().as_str(), "booking flow abandoned");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|flows| flows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Final submit: hands the assembled record to `sink`.
///
/// The registry lock is released while the sink runs. On success the flow is
/// discarded; on failure it stays on the confirmation step with the error
/// recorded so the caller can retry. Abandoning the flow mid-call drops the
/// sink future.
pub async fn submit(
    registry: &FlowRegistry,
    sink: &dyn BookingSink,
    id: Uuid,
    notes: String,
) -> Result<CompletedBooking, AppError> {
    let (submission, mut cancelled) = {
        let mut flows = registry.lock()?;
        let entry = flows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("booking flow {id}")))?;
        let (date, record) = entry.controller.begin_submission(notes).map_err(|e| match e {
            SubmitError::InProgress => AppError::SubmissionInProgress,
            SubmitError::WrongStep(_) => AppError::BadRequest(e.to_string()),
        })?;
        let submission = BookingSubmission {
            booking_id: id,
            date,
            record,
        };
        (submission, entry.cancel.subscribe())
    };

    tracing::info!(flow_id = %id, date = %submission.date, time = %submission.record.time, "submitting booking");

    let outcome = tokio::select! {
        result = sink.complete(&submission) => Some(result),
        _ = cancelled.wait_for(|c| *c) => None,
    };

    match outcome {
        Some(Ok(())) => {
            registry.lock()?.remove(&id);
            tracing::info!(flow_id = %id, "booking completed");
            Ok(submission.record)
        }
        Some(Err(e)) => {
            let message = format!("{e:#}");
            tracing::error!(flow_id = %id, error = %message, "booking submission failed");
            // The flow may have been abandoned while the sink was running.
            let _ = registry.with_flow(id, |flow| flow.fail_submission(message.clone()));
            Err(AppError::Submission(message))
        }
        None => Err(AppError::NotFound(format!("booking flow {id} was abandoned"))),
    }
}
