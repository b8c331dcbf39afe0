//! # Runner
//!
//! Starts clustering runs on a dedicated worker thread and hands their
//! events back over a channel.
//!
//! At most one run is active per runner. Starting a new run cancels the
//! previous one and blocks until its worker has exited, so two runs never
//! write to the same event stream at once.
//!
//! ## Example
//! ```rust,ignore
//! let (mut runner, events) = ClusterRunner::new();
//! runner.start("/data/images", 5, true, HashAlgorithmKind::Average)?;
//!
//! for event in events.iter() {
//!     match event {
//!         Event::Cluster(ClusterEvent::ClusterFound(cluster)) => show(cluster),
//!         Event::Cluster(ClusterEvent::Finished(_)) => break,
//!         _ => {}
//!     }
//! }
//! ```

use crate::core::cancel::CancellationToken;
use crate::core::hasher::HashAlgorithmKind;
use crate::core::pipeline::{Pipeline, PipelineBuilder};
use crate::error::{ClusterError, Result};
use crate::events::{ClusterEvent, Event, EventChannel, EventReceiver, EventSender};
use std::path::Path;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owner of the clustering worker thread
pub struct ClusterRunner {
    events: EventSender,
    worker: Option<Worker>,
}

impl ClusterRunner {
    /// Create a runner and the receiver for its events
    pub fn new() -> (Self, EventReceiver) {
        let (sender, receiver) = EventChannel::new();
        (Self::with_sender(sender), receiver)
    }

    /// Create a runner that sends events into an existing channel
    pub fn with_sender(events: EventSender) -> Self {
        Self {
            events,
            worker: None,
        }
    }

    /// Start clustering `folder`.
    ///
    /// Invalid parameters are rejected here, before any thread exists.
    pub fn start(
        &mut self,
        folder: impl AsRef<Path>,
        threshold: u32,
        skip_single: bool,
        algorithm: HashAlgorithmKind,
    ) -> Result<()> {
        self.start_with(
            Pipeline::builder()
                .folder(folder.as_ref())
                .threshold(threshold)
                .skip_single(skip_single)
                .algorithm(algorithm),
        )
    }

    /// Start a run from a fully configured builder
    pub fn start_with(&mut self, builder: PipelineBuilder) -> Result<()> {
        let pipeline = builder.build()?;

        self.stop();

        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();
        let events = self.events.clone();

        let handle = thread::Builder::new()
            .name("cluster-worker".to_string())
            .spawn(move || {
                if let Err(e) = pipeline.run_with_events(&events, &worker_cancel) {
                    error!(error = %e, "Clustering run failed");
                    events.send(Event::Cluster(ClusterEvent::Failed {
                        message: e.to_string(),
                    }));
                }
            })
            .map_err(ClusterError::Worker)?;

        self.worker = Some(Worker { cancel, handle });
        Ok(())
    }

    /// Ask the active run to stop. Returns immediately.
    pub fn cancel(&self) {
        if let Some(worker) = &self.worker {
            debug!("Cancellation requested");
            worker.cancel.cancel();
        }
    }

    /// Whether a worker is still executing
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Block until the active run ends on its own
    pub fn wait(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.handle.join().is_err() {
                error!("Clustering worker panicked");
            }
        }
    }

    /// Cancel the active run and block until its worker has exited
    pub fn stop(&mut self) {
        self.cancel();
        self.wait();
    }
}

impl Drop for ClusterRunner {
    fn drop(&mut self) {
        self.stop();
    }
}
