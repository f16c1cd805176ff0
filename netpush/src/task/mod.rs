//! Task tracking and dispatch.
//!
//! A task is the externally visible record of one session: created pending
//! when a [`TaskRequest`] is accepted, running once the device answers, and
//! terminal exactly once with the session's [`TaskPayload`](crate::session::TaskPayload).

mod request;
mod runner;
mod tracker;

pub use request::TaskRequest;
pub use runner::{Connector, SshConnector, TaskRunner};
pub use tracker::{Task, TaskStatusView, TaskTracker};
