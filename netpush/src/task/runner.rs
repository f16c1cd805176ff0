//! Dispatching sessions off the request path.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use log::{error, info, warn};
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use super::request::TaskRequest;
use super::tracker::{Task, TaskTracker};
use crate::device::DeviceDescriptor;
use crate::driver::{Driver, DriverBuilder, GenericDriver, SessionConfig};
use crate::error::Result;
use crate::platform::DialectRegistry;
use crate::session::{ConfigurationSession, ErrorKind, SessionFailure, SessionObserver, TaskPayload};

/// Builds the driver a session runs on.
pub trait Connector: Send + Sync + 'static {
    type Driver: Driver + 'static;

    /// Create an unconnected driver for `device`.
    fn connect(&self, device: &DeviceDescriptor, config: &SessionConfig) -> Result<Self::Driver>;
}

/// SSH connections through [`GenericDriver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

impl Connector for SshConnector {
    type Driver = GenericDriver;

    fn connect(&self, device: &DeviceDescriptor, config: &SessionConfig) -> Result<GenericDriver> {
        DriverBuilder::from_device(device, config).build()
    }
}

/// Marks the task running once its channel is up.
struct RunningObserver {
    tracker: Arc<TaskTracker>,
    id: Uuid,
}

impl SessionObserver for RunningObserver {
    fn on_connected(&self) {
        if let Err(e) = self.tracker.mark_running(self.id) {
            warn!("task {}: {}", self.id, e);
        }
    }
}

/// Runs task requests as background sessions.
///
/// Each accepted request gets a pending task and its own tokio task. At most
/// one session per `host:port` runs at a time; sessions against different
/// devices run in parallel. A worker always leaves its task terminal, even
/// when the session panics, so pollers of the tracker never see a task
/// stuck in `pending` or `running`.
pub struct TaskRunner<C: Connector = SshConnector> {
    tracker: Arc<TaskTracker>,
    connector: Arc<C>,
    config: SessionConfig,
    hosts: DashMap<String, Arc<Mutex<()>>>,
    finished: Arc<Notify>,
    in_flight: Arc<AtomicUsize>,
}

impl TaskRunner<SshConnector> {
    /// Runner over SSH.
    pub fn ssh(config: SessionConfig) -> Self {
        Self::new(SshConnector, config)
    }
}

impl<C: Connector> TaskRunner<C> {
    pub fn new(connector: C, config: SessionConfig) -> Self {
        Self {
            tracker: Arc::new(TaskTracker::new()),
            connector: Arc::new(connector),
            config,
            hosts: DashMap::new(),
            finished: Arc::new(Notify::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Share an existing tracker.
    pub fn with_tracker(mut self, tracker: Arc<TaskTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn tracker(&self) -> &Arc<TaskTracker> {
        &self.tracker
    }

    /// Number of submitted tasks whose worker has not finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Validate `request`, record a pending task and start its session.
    ///
    /// Invalid requests are rejected here, before any task exists or the
    /// device is contacted. Returns the pending snapshot without waiting.
    /// Must be called within a tokio runtime.
    pub fn submit(&self, device: DeviceDescriptor, request: TaskRequest) -> Result<Task> {
        let dialect = DialectRegistry::lookup(device.dialect);
        let batch = request.to_batch(dialect)?;
        let driver = self.connector.connect(&device, &self.config)?;

        let task = self.tracker.create(&device.name, &request.label());
        let id = task.id;
        info!("task {}: {} on {} ({})", id, task.label, device.name, dialect.kind);

        let host = self
            .hosts
            .entry(device.address())
            .or_default()
            .value()
            .clone();
        let tracker = self.tracker.clone();
        let finished = self.finished.clone();
        let in_flight = self.in_flight.clone();
        let deadline = self.config.session_deadline;
        in_flight.fetch_add(1, Ordering::SeqCst);

        let observer = RunningObserver {
            tracker: tracker.clone(),
            id,
        };
        let session = tokio::spawn(async move {
            let _turn = host.lock().await;
            let mut session = ConfigurationSession::new(&device, driver).with_deadline(deadline);
            session.run(&batch, &observer).await
        });

        tokio::spawn(async move {
            let payload = match session.await {
                Ok(payload) => payload,
                Err(e) => {
                    error!("task {}: session worker terminated: {}", id, e);
                    TaskPayload::rejected(SessionFailure::new(
                        ErrorKind::Connection,
                        format!("session worker terminated: {}", e),
                        None,
                    ))
                }
            };

            in_flight.fetch_sub(1, Ordering::SeqCst);
            if let Err(e) = tracker.mark_terminal(id, payload) {
                warn!("task {}: {}", id, e);
            }
            finished.notify_waiters();
        });

        Ok(task)
    }

    /// Wait for a task to reach its terminal state and return it.
    pub async fn wait(&self, id: Uuid) -> Result<Task> {
        loop {
            // Registered before the check so a completion in between is seen
            let finished = self.finished.notified();
            tokio::pin!(finished);
            finished.as_mut().enable();

            let task = self.tracker.get(id)?;
            if task.status.is_terminal() {
                return Ok(task);
            }
            finished.await;
        }
    }
}
