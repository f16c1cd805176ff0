//! Result aggregation.

use serde::{Deserialize, Serialize};

use super::{CommandResult, SessionFailure, Status};

/// Append-only, ordered log of step outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultLog {
    results: Vec<CommandResult>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result after every earlier one.
    pub fn push(&mut self, result: CommandResult) {
        self.results.push(result);
    }

    pub fn as_slice(&self) -> &[CommandResult] {
        &self.results
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// First failed result, in execution order.
    pub fn first_failure(&self) -> Option<&CommandResult> {
        self.results.iter().find(|r| !r.success)
    }

    pub fn into_vec(self) -> Vec<CommandResult> {
        self.results
    }
}

/// Overall classification of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every step succeeded.
    Success,
    /// Completed, but some inspection commands failed.
    PartialSuccess,
    /// The session failed.
    Failure,
}

/// Result payload stored on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub status: Status,
    pub outcome: Outcome,
    /// Every step outcome, in execution order.
    pub results: Vec<CommandResult>,
    /// The authoritative error, present iff `status` is failed.
    pub error: Option<SessionFailure>,
}

impl TaskPayload {
    /// Payload for a request rejected before any step ran.
    pub fn rejected(failure: SessionFailure) -> Self {
        aggregate(Status::Failed, ResultLog::new(), Some(failure))
    }

    /// Number of failed steps.
    pub fn failed_steps(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

/// Package a session's log into its task payload.
///
/// `failure` is the error that terminated the session; when a failed
/// session has none, the first failed step stands in. Results are kept
/// verbatim and in order.
pub fn aggregate(status: Status, log: ResultLog, failure: Option<SessionFailure>) -> TaskPayload {
    let error = match status {
        Status::Failed => failure
            .or_else(|| log.first_failure().and_then(CommandResult::failure))
            .or_else(|| {
                Some(SessionFailure::new(
                    super::ErrorKind::Connection,
                    "session failed without a recorded cause",
                    None,
                ))
            }),
        _ => None,
    };

    let outcome = match status {
        Status::Failed => Outcome::Failure,
        _ if log.first_failure().is_some() => Outcome::PartialSuccess,
        _ => Outcome::Success,
    };

    TaskPayload {
        status,
        outcome,
        results: log.into_vec(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::{ErrorKind, StepKind};

    fn ok(command: &str) -> CommandResult {
        CommandResult::succeeded(StepKind::Command, command, "", "", Duration::ZERO)
    }

    fn bad(command: &str, kind: ErrorKind) -> CommandResult {
        CommandResult::failed(StepKind::Command, command, "", "", Duration::ZERO, kind, "rejected")
    }

    #[test]
    fn test_completed_success() {
        let mut log = ResultLog::new();
        log.push(ok("vlan 10"));
        log.push(ok("name users"));

        let payload = aggregate(Status::Completed, log, None);
        assert_eq!(payload.outcome, Outcome::Success);
        assert!(payload.error.is_none());
        assert_eq!(payload.results.len(), 2);
        assert_eq!(payload.results[1].command, "name users");
    }

    #[test]
    fn test_partial_success() {
        let mut log = ResultLog::new();
        log.push(ok("show version"));
        log.push(bad("show bogus", ErrorKind::Command));

        let payload = aggregate(Status::Completed, log, None);
        assert_eq!(payload.outcome, Outcome::PartialSuccess);
        assert_eq!(payload.status, Status::Completed);
        assert!(payload.error.is_none());
        assert_eq!(payload.failed_steps(), 1);
    }

    #[test]
    fn test_explicit_failure_wins() {
        let mut log = ResultLog::new();
        log.push(bad("interface bogus0", ErrorKind::Command));
        log.push(bad("return", ErrorKind::ModeTransition));

        let failure = SessionFailure::new(ErrorKind::Command, "Error:", Some("interface bogus0"));
        let payload = aggregate(Status::Failed, log, Some(failure.clone()));
        assert_eq!(payload.outcome, Outcome::Failure);
        assert_eq!(payload.error, Some(failure));
        assert_eq!(payload.results.len(), 2);
    }

    #[test]
    fn test_first_failure_fallback() {
        let mut log = ResultLog::new();
        log.push(ok("vlan 10"));
        log.push(bad("interface bogus0", ErrorKind::Command));
        log.push(bad("end", ErrorKind::ModeTransition));

        let payload = aggregate(Status::Failed, log, None);
        let error = payload.error.unwrap();
        assert_eq!(error.kind, ErrorKind::Command);
        assert_eq!(error.command.as_deref(), Some("interface bogus0"));
    }

    #[test]
    fn test_rejected_payload() {
        let payload = TaskPayload::rejected(SessionFailure::new(
            ErrorKind::InvalidRequest,
            "VLAN ID must be between 1 and 4094, got 5000",
            None,
        ));
        assert_eq!(payload.status, Status::Failed);
        assert!(payload.results.is_empty());
        assert_eq!(payload.error.unwrap().kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_payload_json_is_stable() {
        let mut log = ResultLog::new();
        log.push(ok("vlan 10"));
        let payload = aggregate(Status::Completed, log, None);

        let first = serde_json::to_string(&payload).unwrap();
        let back: TaskPayload = serde_json::from_str(&first).unwrap();
        assert_eq!(back, payload);
        assert_eq!(serde_json::to_string(&back).unwrap(), first);
    }
}
