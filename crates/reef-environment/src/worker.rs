//! Background level builds with cancel-and-restart.
//!
//! A single named thread owns the [`Environment`]. Submitting a request
//! cancels whatever is running, and the thread skips straight to the newest
//! queued request, so only one build ever touches the level at a time.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use reef_placement::BeingHost;
use reef_terrain::{CancellationToken, ProgressUpdate};
use tracing::{debug, info, warn};

use crate::{BuildReport, BuildSettings, Environment, EnvironmentError};

/// Progress events are only sent when the fraction moved at least this much.
const PROGRESS_EVENT_STEP: f64 = 0.01;

/// Work the build thread can be asked to do.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildRequest {
    /// Apply settings, rebuild the terrain if needed, then place beings.
    Terrain(BuildSettings),
    /// Apply settings and place beings, building the terrain only if it is
    /// not ready.
    FixedBeings(BuildSettings),
    ClearFixedBeings,
    /// Re-adopt instances the host already has attached to the parent.
    ReloadChildren,
}

/// Reported back from the build thread. Every submitted request ends with
/// exactly one `Finished`, `Cancelled` or `Failed`.
#[derive(Debug)]
pub enum BuildEvent {
    Progress {
        id: u64,
        fraction: f64,
        message: String,
    },
    Finished {
        id: u64,
        report: BuildReport,
    },
    Cancelled {
        id: u64,
    },
    Failed {
        id: u64,
        error: EnvironmentError,
    },
}

impl BuildEvent {
    /// Id of the request this event belongs to.
    pub fn id(&self) -> u64 {
        match self {
            Self::Progress { id, .. }
            | Self::Finished { id, .. }
            | Self::Cancelled { id }
            | Self::Failed { id, .. } => *id,
        }
    }

    /// True for the last event of a request.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

struct Job {
    id: u64,
    request: BuildRequest,
    cancel: CancellationToken,
}

/// Runs an [`Environment`] on a background thread.
pub struct BuildWorker<H: BeingHost + Send + 'static> {
    job_sender: Option<Sender<Job>>,
    event_receiver: Receiver<BuildEvent>,
    handle: Option<JoinHandle<Environment<H>>>,
    current: Option<CancellationToken>,
    next_id: u64,
}

impl<H: BeingHost + Send + 'static> BuildWorker<H> {
    /// Move `environment` onto a new build thread.
    pub fn spawn(environment: Environment<H>) -> Self {
        let (job_sender, job_receiver) = unbounded::<Job>();
        let (event_sender, event_receiver) = unbounded::<BuildEvent>();

        let handle = std::thread::Builder::new()
            .name("reef-build-worker".into())
            .spawn(move || run_worker(environment, job_receiver, event_sender))
            .expect("Failed to spawn reef build worker thread");

        Self {
            job_sender: Some(job_sender),
            event_receiver,
            handle: Some(handle),
            current: None,
            next_id: 1,
        }
    }

    /// Queue `request`, cancelling the one submitted before it. Returns the
    /// id its events will carry.
    pub fn submit(&mut self, request: BuildRequest) -> Result<u64, EnvironmentError> {
        self.cancel();
        let sender = self
            .job_sender
            .as_ref()
            .ok_or(EnvironmentError::WorkerStopped)?;

        let id = self.next_id;
        let cancel = CancellationToken::new();
        sender
            .send(Job {
                id,
                request,
                cancel: cancel.clone(),
            })
            .map_err(|_| EnvironmentError::WorkerStopped)?;

        self.next_id += 1;
        self.current = Some(cancel);
        debug!("Submitted build request {id}");
        Ok(id)
    }

    /// Cancel the most recently submitted request, if it is still running.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.current.take() {
            cancel.cancel();
        }
    }

    /// Drain all events without blocking.
    pub fn drain_events(&self) -> Vec<BuildEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Wait up to `timeout` for the next event. `Ok(None)` on timeout.
    pub fn recv_event(&self, timeout: Duration) -> Result<Option<BuildEvent>, EnvironmentError> {
        match self.event_receiver.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EnvironmentError::WorkerStopped),
        }
    }

    /// Let queued requests finish, stop the thread and hand the environment
    /// back.
    pub fn shutdown(mut self) -> Result<Environment<H>, EnvironmentError> {
        self.job_sender = None;
        let handle = self.handle.take().ok_or(EnvironmentError::WorkerStopped)?;
        handle.join().map_err(|_| EnvironmentError::WorkerStopped)
    }
}

impl<H: BeingHost + Send + 'static> Drop for BuildWorker<H> {
    fn drop(&mut self) {
        self.cancel();
        self.job_sender = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_worker<H: BeingHost>(
    mut environment: Environment<H>,
    jobs: Receiver<Job>,
    events: Sender<BuildEvent>,
) -> Environment<H> {
    while let Ok(mut job) = jobs.recv() {
        // Only the newest request matters.
        while let Ok(newer) = jobs.try_recv() {
            let _ = events.send(BuildEvent::Cancelled { id: job.id });
            job = newer;
        }
        if job.cancel.is_cancelled() {
            let _ = events.send(BuildEvent::Cancelled { id: job.id });
            continue;
        }
        let event = run_job(&mut environment, job, &events);
        let _ = events.send(event);
    }
    debug!("Build worker stopping");
    environment
}

fn run_job<H: BeingHost>(
    environment: &mut Environment<H>,
    job: Job,
    events: &Sender<BuildEvent>,
) -> BuildEvent {
    let Job {
        id,
        request,
        cancel,
    } = job;

    let mut last_fraction: Option<f64> = None;
    let mut sink = |update: ProgressUpdate<'_>| {
        let fraction = update.fraction();
        let due = match last_fraction {
            None => true,
            Some(last) => {
                fraction - last >= PROGRESS_EVENT_STEP || (fraction >= 1.0 && last < 1.0)
            }
        };
        if due {
            last_fraction = Some(fraction);
            let _ = events.send(BuildEvent::Progress {
                id,
                fraction,
                message: update.message.to_string(),
            });
        }
    };

    let result = match request {
        BuildRequest::Terrain(settings) => {
            environment.apply_settings(settings);
            environment.regenerate_terrain(cancel, &mut sink)
        }
        BuildRequest::FixedBeings(settings) => {
            environment.apply_settings(settings);
            environment.regenerate_fixed_beings(cancel, &mut sink)
        }
        BuildRequest::ClearFixedBeings => Ok(environment.clear_fixed_beings()),
        BuildRequest::ReloadChildren => {
            environment.reload_children();
            Ok(environment.report())
        }
    };

    match result {
        Ok(report) => {
            info!("Build {id} finished: {} fixed beings", report.placed);
            BuildEvent::Finished { id, report }
        }
        Err(e) if e.is_cancelled() => {
            info!("Build {id} cancelled");
            BuildEvent::Cancelled { id }
        }
        Err(error) => {
            warn!("Build {id} failed: {error}");
            BuildEvent::Failed { id, error }
        }
    }
}
