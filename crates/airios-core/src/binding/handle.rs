use std::sync::Arc;

use airios_api::Connection;
use tokio::sync::{OwnedSemaphorePermit, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::session::BindingSession;
use super::{BindRequest, BindingError, BindingLimits, BindingState, BoundNode};

/// A running binding session.
///
/// The session runs on its own task. Dropping the handle cancels it;
/// the task still performs its cleanup `unbind` before exiting, so a
/// host that abandons the flow never leaves the poll loop running or the
/// bus slot allocated.
pub struct BindingHandle {
    task: JoinHandle<Result<BoundNode, BindingError>>,
    progress: watch::Receiver<BindingState>,
    cancel: CancellationToken,
    guard: DropGuard,
}

impl BindingHandle {
    /// Start a session on `connection`.
    ///
    /// Use [`Coordinator::bind`](crate::Coordinator::bind) instead when a
    /// coordinator owns the connection; it also prevents two sessions
    /// from racing for the same address.
    pub fn spawn(
        connection: Arc<Connection>,
        request: BindRequest,
        limits: BindingLimits,
    ) -> Self {
        Self::spawn_with(connection, request, limits, &CancellationToken::new(), None)
    }

    pub(crate) fn spawn_with(
        connection: Arc<Connection>,
        request: BindRequest,
        limits: BindingLimits,
        parent: &CancellationToken,
        permit: Option<OwnedSemaphorePermit>,
    ) -> Self {
        let cancel = parent.child_token();
        let (progress_tx, progress) = watch::channel(BindingState::Idle);
        let session = BindingSession::new(request, limits, progress_tx);

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            // Held until the session, cleanup included, is over.
            let _permit = permit;
            session.run(&connection, &task_cancel).await
        });

        Self {
            task,
            progress,
            guard: cancel.clone().drop_guard(),
            cancel,
        }
    }

    /// Whether the session has finished (successfully or not).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Current state, for progress display.
    pub fn state(&self) -> BindingState {
        *self.progress.borrow()
    }

    /// Subscribe to state changes.
    pub fn progress(&self) -> watch::Receiver<BindingState> {
        self.progress.clone()
    }

    /// Request cancellation. The session stops at its next poll and
    /// releases the allocated address.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the session's terminal result.
    pub async fn wait(self) -> Result<BoundNode, BindingError> {
        let Self { task, guard, .. } = self;
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(BindingError::Aborted {
                reason: e.to_string(),
            }),
        };
        // Session is over; nothing left to cancel.
        let _ = guard.disarm();
        result
    }

    /// Cancel and wait for cleanup to finish.
    pub async fn cancel_and_wait(self) -> Result<BoundNode, BindingError> {
        self.cancel();
        self.wait().await
    }
}

impl std::fmt::Debug for BindingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingHandle")
            .field("state", &self.state())
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}
