//! Task records and their lifecycle.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TaskError};
use crate::session::{Status, TaskPayload};

/// One requested workload against one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: Uuid,
    /// Inventory name of the device.
    pub device: String,
    /// Short description of the workload.
    pub label: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Typed result, set with the terminal status.
    pub payload: Option<TaskPayload>,
    /// `payload` serialized as JSON.
    pub payload_json: Option<String>,
}

impl Task {
    fn new(device: &str, label: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            device: device.to_string(),
            label: label.to_string(),
            status: Status::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            payload: None,
            payload_json: None,
        }
    }

    /// Whether the session got an answer from the device.
    fn reached_device(&self) -> bool {
        match (&self.status, &self.payload) {
            (Status::Completed, _) => true,
            (_, Some(payload)) => !payload.results.is_empty(),
            _ => false,
        }
    }

    /// Error message of a failed task.
    pub fn error_message(&self) -> Option<String> {
        self.payload
            .as_ref()
            .and_then(|p| p.error.as_ref())
            .map(ToString::to_string)
    }
}

/// What a poller sees of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusView {
    pub id: Uuid,
    pub status: Status,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<TaskPayload>,
    pub error_message: Option<String>,
}

impl From<&Task> for TaskStatusView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            status: task.status,
            started_at: task.started_at,
            completed_at: task.completed_at,
            result: task.payload.clone(),
            error_message: task.error_message(),
        }
    }
}

/// Concurrent store of task records.
///
/// Records move `Pending -> Running -> Completed | Failed` and are
/// immutable once terminal. Reads return snapshots and never block on
/// updates to other tasks.
#[derive(Debug, Default)]
pub struct TaskTracker {
    tasks: DashMap<Uuid, Task>,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new pending task.
    pub fn create(&self, device: &str, label: &str) -> Task {
        let task = Task::new(device, label);
        debug!("task {} created for {} ({})", task.id, device, label);
        self.tasks.insert(task.id, task.clone());
        task
    }

    /// Move a pending task to running.
    pub fn mark_running(&self, id: Uuid) -> Result<Task> {
        let mut task = self.tasks.get_mut(&id).ok_or(TaskError::NotFound { id })?;
        if task.status != Status::Pending {
            return Err(TaskError::InvalidTransition {
                id,
                from: task.status.to_string(),
                to: Status::Running.to_string(),
            }
            .into());
        }

        task.status = Status::Running;
        task.started_at = Some(Utc::now());
        debug!("task {} running", id);
        Ok(task.clone())
    }

    /// Record the terminal status and result of a task.
    ///
    /// A task becomes terminal exactly once; later writes are rejected and
    /// leave the stored record untouched.
    pub fn mark_terminal(&self, id: Uuid, payload: TaskPayload) -> Result<Task> {
        let mut task = self.tasks.get_mut(&id).ok_or(TaskError::NotFound { id })?;
        if task.status.is_terminal() {
            warn!(
                "task {} already {}, ignoring {} result",
                id, task.status, payload.status
            );
            return Err(TaskError::AlreadyTerminal {
                id,
                status: task.status.to_string(),
            }
            .into());
        }
        if !payload.status.is_terminal() {
            return Err(TaskError::InvalidTransition {
                id,
                from: task.status.to_string(),
                to: payload.status.to_string(),
            }
            .into());
        }

        let payload_json = match serde_json::to_string(&payload) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("task {}: result not serializable: {}", id, e);
                None
            }
        };

        task.status = payload.status;
        task.completed_at = Some(Utc::now());
        task.payload = Some(payload);
        task.payload_json = payload_json;
        debug!("task {} {}", id, task.status);
        Ok(task.clone())
    }

    /// Snapshot of a task.
    pub fn get(&self, id: Uuid) -> Result<Task> {
        self.tasks
            .get(&id)
            .map(|task| task.clone())
            .ok_or_else(|| TaskError::NotFound { id }.into())
    }

    /// Polling view of a task.
    pub fn status(&self, id: Uuid) -> Result<TaskStatusView> {
        self.tasks
            .get(&id)
            .map(|task| TaskStatusView::from(&*task))
            .ok_or_else(|| TaskError::NotFound { id }.into())
    }

    /// Snapshots of every task, newest first.
    pub fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.iter().map(|entry| entry.value().clone()).collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    /// When `device` last answered: the newest finished task that got past
    /// connecting.
    pub fn last_contact(&self, device: &str) -> Option<DateTime<Utc>> {
        self.tasks
            .iter()
            .filter(|entry| entry.device == device && entry.reached_device())
            .filter_map(|entry| entry.completed_at)
            .max()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::Error;
    use crate::session::{ErrorKind, ResultLog, SessionFailure, aggregate};

    fn completed() -> TaskPayload {
        aggregate(Status::Completed, ResultLog::new(), None)
    }

    fn failed() -> TaskPayload {
        aggregate(
            Status::Failed,
            ResultLog::new(),
            Some(SessionFailure::new(ErrorKind::Connection, "Operation timed out after 30s", None)),
        )
    }

    #[test]
    fn test_lifecycle() {
        let tracker = TaskTracker::new();
        let task = tracker.create("sw1", "create_vlan 10");
        assert_eq!(task.status, Status::Pending);
        assert!(task.started_at.is_none());

        let running = tracker.mark_running(task.id).unwrap();
        assert_eq!(running.status, Status::Running);
        assert!(running.started_at.is_some());

        let done = tracker.mark_terminal(task.id, completed()).unwrap();
        assert_eq!(done.status, Status::Completed);
        assert!(done.completed_at.is_some());
        assert!(done.payload_json.as_deref().unwrap().contains("\"completed\""));
    }

    #[test]
    fn test_second_terminal_write_rejected() {
        let tracker = TaskTracker::new();
        let id = tracker.create("sw1", "show version").id;
        tracker.mark_running(id).unwrap();
        tracker.mark_terminal(id, failed()).unwrap();

        let result = tracker.mark_terminal(id, completed());
        assert!(matches!(
            result,
            Err(Error::Task(TaskError::AlreadyTerminal { ref status, .. })) if status == "failed"
        ));

        let task = tracker.get(id).unwrap();
        assert_eq!(task.status, Status::Failed);
        assert_eq!(task.payload, Some(failed()));
    }

    #[test]
    fn test_running_only_from_pending() {
        let tracker = TaskTracker::new();
        let id = tracker.create("sw1", "show version").id;
        assert_ok!(tracker.mark_running(id));
        assert!(matches!(
            tracker.mark_running(id),
            Err(Error::Task(TaskError::InvalidTransition { .. }))
        ));
    }

    #[test]
    fn test_terminal_straight_from_pending() {
        let tracker = TaskTracker::new();
        let id = tracker.create("sw1", "create_vlan 10").id;
        let task = tracker.mark_terminal(id, failed()).unwrap();
        assert_eq!(task.status, Status::Failed);
        assert!(task.started_at.is_none());
    }

    #[test]
    fn test_non_terminal_payload_rejected() {
        let tracker = TaskTracker::new();
        let id = tracker.create("sw1", "create_vlan 10").id;
        let payload = aggregate(Status::Running, ResultLog::new(), None);
        assert_err!(tracker.mark_terminal(id, payload));
        assert_eq!(tracker.get(id).unwrap().status, Status::Pending);
    }

    #[test]
    fn test_unknown_task() {
        let tracker = TaskTracker::new();
        assert!(matches!(
            tracker.get(Uuid::new_v4()),
            Err(Error::Task(TaskError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_terminal_reads_are_stable() {
        let tracker = TaskTracker::new();
        let id = tracker.create("sw1", "show version").id;
        tracker.mark_terminal(id, completed()).unwrap();

        let first = tracker.status(id).unwrap();
        let second = tracker.status(id).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_status_view() {
        let tracker = TaskTracker::new();
        let id = tracker.create("sw1", "create_vlan 10").id;
        tracker.mark_running(id).unwrap();
        tracker.mark_terminal(id, failed()).unwrap();

        let view = tracker.status(id).unwrap();
        assert_eq!(view.status, Status::Failed);
        assert!(view.started_at.is_some() && view.completed_at.is_some());
        assert_eq!(
            view.error_message.as_deref(),
            Some("connection error: Operation timed out after 30s")
        );

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["result"]["error"]["kind"], "connection");
    }

    #[test]
    fn test_list_newest_first() {
        let tracker = TaskTracker::new();
        let first = tracker.create("sw1", "a").id;
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = tracker.create("sw2", "b").id;

        let ids: Vec<Uuid> = tracker.list().iter().map(|t| t.id).collect();
        assert_eq!(ids, [second, first]);
    }

    #[test]
    fn test_last_contact() {
        let tracker = TaskTracker::new();
        assert!(tracker.last_contact("sw1").is_none());

        let unreachable = tracker.create("sw1", "test_connectivity").id;
        tracker.mark_terminal(unreachable, failed()).unwrap();
        assert!(tracker.last_contact("sw1").is_none());

        let reached = tracker.create("sw1", "test_connectivity").id;
        let done = tracker.mark_terminal(reached, completed()).unwrap();
        tracker.create("sw2", "test_connectivity");

        assert_eq!(tracker.last_contact("sw1"), done.completed_at);
        assert!(tracker.last_contact("sw2").is_none());
    }

    #[test]
    fn test_concurrent_updates() {
        let tracker = Arc::new(TaskTracker::new());
        let ids: Vec<Uuid> = (0..32).map(|i| tracker.create(&format!("sw{}", i), "x").id).collect();

        let handles: Vec<_> = ids
            .iter()
            .map(|&id| {
                let tracker = tracker.clone();
                std::thread::spawn(move || {
                    tracker.mark_running(id).unwrap();
                    tracker.mark_terminal(id, completed()).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.len(), 32);
        assert!(tracker.list().iter().all(|t| t.status == Status::Completed));
    }
}
