// Model side worker process
// Decision: One blocking task owns the registry; requests are queued, never run concurrently
// Decision: Out-of-band cancel goes through a shared set so busy runs see it between steps
// Decision: A panicking request is logged and the loop keeps serving the other runs

use std::panic::{self, AssertUnwindSafe};

use modelrun_core::engine::{ModelRegistry, Notification};
use modelrun_core::request::{CancelAction, Request, StopProcess};
use modelrun_core::workflow::ActionError;
use modelrun_core::CompositeName;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::WorkerConfig;
use crate::handler::{ChannelResponseHandler, SharedCancelHandler};

/// Errors from the worker handle
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The worker no longer accepts requests
    #[error("model process is not running")]
    Closed,

    /// The worker task panicked or was cancelled
    #[error("model process task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Model side loop executing requests one at a time
pub struct ModelProcess {
    config: WorkerConfig,
    registry: ModelRegistry,
    requests: mpsc::UnboundedReceiver<Request>,
    response_handler: ChannelResponseHandler,
    cancel_handler: SharedCancelHandler,
}

impl ModelProcess {
    /// Start the loop on a blocking task
    ///
    /// Returns the handle used to post requests and the stream of
    /// notifications for the display side.
    pub fn spawn(
        config: WorkerConfig,
        registry: ModelRegistry,
    ) -> (ModelProcessHandle, mpsc::UnboundedReceiver<Notification>) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (notification_tx, notification_rx) = mpsc::unbounded_channel();
        let cancel_handler = SharedCancelHandler::new();

        let process = Self {
            response_handler: ChannelResponseHandler::new(notification_tx, config.object_steps),
            config,
            registry,
            requests: request_rx,
            cancel_handler: cancel_handler.clone(),
        };
        let task = tokio::task::spawn_blocking(move || process.run());

        let handle = ModelProcessHandle {
            requests: request_tx,
            cancel_handler,
            task,
        };
        (handle, notification_rx)
    }

    fn run(mut self) {
        info!(
            worker_id = %self.config.worker_id,
            object_steps = self.config.object_steps,
            "Model process started"
        );

        loop {
            self.response_handler.notify(Notification::Busy(false));

            let Some(request) = self.requests.blocking_recv() else {
                info!("Request channel closed");
                break;
            };

            self.response_handler.notify(Notification::Busy(true));
            let stop = request.is_stop();
            let kind = request.kind();
            debug!(kind, "Executing request");
            let executed = panic::catch_unwind(AssertUnwindSafe(|| {
                request.execute(&mut self.registry, &self.response_handler, &self.cancel_handler)
            }));
            if let Err(payload) = executed {
                let detail = ActionError::panicked(&*payload).detail.unwrap_or_default();
                error!(kind, %detail, "Request panicked");
            }

            if stop {
                self.response_handler.notify(Notification::Busy(false));
                break;
            }
        }

        self.registry.reset();
        info!(worker_id = %self.config.worker_id, "Model process stopped");
    }
}

/// Display side handle to a running [`ModelProcess`]
#[derive(Debug)]
pub struct ModelProcessHandle {
    requests: mpsc::UnboundedSender<Request>,
    cancel_handler: SharedCancelHandler,
    task: JoinHandle<()>,
}

impl ModelProcessHandle {
    /// Queue a request
    pub fn post(&self, request: impl Into<Request>) -> Result<(), WorkerError> {
        self.requests
            .send(request.into())
            .map_err(|_| WorkerError::Closed)
    }

    /// Cancel a run
    ///
    /// The request is recorded out of band, so a run iterating through
    /// non-blocking steps sees it at its next step boundary, and is also
    /// queued for a run suspended on a blocking step.
    pub fn cancel(&self, run_name: CompositeName) -> Result<(), WorkerError> {
        self.cancel_handler.request_cancel(run_name.clone());
        self.post(CancelAction::new(run_name))
    }

    /// Out-of-band cancel requests not yet consumed by the loop
    pub fn pending_cancels(&self) -> usize {
        self.cancel_handler.pending()
    }

    /// Whether the loop has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop after the queued requests and wait for it
    pub async fn stop(self) -> Result<(), WorkerError> {
        // the loop may already be gone
        let _ = self.post(StopProcess::default());
        self.task.await?;
        Ok(())
    }
}
