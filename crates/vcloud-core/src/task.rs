//! Asynchronous task handles and the completion state machine.
//!
//! `queued`/`preRunning`/`running` are non-terminal; `success`, `error`, `canceled`
//! and `aborted` are terminal. Waiting re-fetches the task at its href under a
//! [`PollPolicy`] until a terminal status is seen or the budget runs out.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::PollPolicy;
use crate::connector::Connector;
use crate::entity::Entity;
use crate::envelope::ApiResponse;
use crate::error::{ApiErrorRecord, Error, Result};
use crate::link::{Link, Linked, Resource};
use crate::types::TASK_MEDIA_TYPE;
use crate::urn::TaskUrn;

/// A task bound to the connector that fetched it.
pub type Task<'c> = Entity<'c, TaskRecord>;

/// Server-reported task status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    /// Accepted, not yet started
    #[default]
    Queued,
    /// Waiting on a precondition such as an approval
    PreRunning,
    /// In progress
    Running,
    /// Finished successfully
    Success,
    /// Finished with an error
    Error,
    /// Cancelled by a user
    Canceled,
    /// Aborted by the system
    Aborted,
    /// A status this client does not know; treated as still in progress
    Unknown,
}

impl TaskStatus {
    /// Wire representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::PreRunning => "preRunning",
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
            Self::Canceled => "canceled",
            Self::Aborted => "aborted",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true once the task can no longer change state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Error | Self::Canceled | Self::Aborted
        )
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "queued" => Self::Queued,
            "preRunning" => Self::PreRunning,
            "running" => Self::Running,
            "success" => Self::Success,
            "error" => Self::Error,
            "canceled" | "cancelled" => Self::Canceled,
            "aborted" => Self::Aborted,
            _ => Self::Unknown,
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a task that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The operation completed.
    Succeeded,
    /// The operation was cancelled or aborted before completing.
    Aborted,
}

/// Task representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Task")]
pub struct TaskRecord {
    /// Entity id
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskUrn>,
    /// Task name
    #[serde(rename = "@name", default)]
    pub name: String,
    /// Task href
    #[serde(rename = "@href", default)]
    pub href: String,
    /// Operation identifier, e.g. `vdcCreateVapp`
    #[serde(rename = "@operationName", default)]
    pub operation_name: String,
    /// Human-readable operation description
    #[serde(rename = "@operation", default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Current status
    #[serde(rename = "@status", default)]
    pub status: TaskStatus,
    /// When the task started
    #[serde(rename = "@startTime", default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,
    /// When the task ended
    #[serde(rename = "@endTime", default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<FixedOffset>>,
    /// When the task record expires on the server
    #[serde(rename = "@expiryTime", default, skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<DateTime<FixedOffset>>,
    /// Whether cancellation has been requested
    #[serde(rename = "@cancelRequested", default)]
    pub cancel_requested: bool,
    /// Links (cancel, owner navigation, ...)
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
    /// Resource the task operates on
    #[serde(rename = "Owner", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Link>,
    /// Failure details, present only when the status is `error`
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorRecord>,
    /// User that started the task
    #[serde(rename = "User", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Link>,
    /// Organization the task belongs to
    #[serde(rename = "Organization", default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<Link>,
    /// Completion percentage, when reported
    #[serde(rename = "Progress", default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl TaskRecord {
    /// The result of a terminal task, or `None` while it is still running.
    #[must_use]
    pub fn outcome(&self) -> Option<Result<TaskOutcome>> {
        match self.status {
            TaskStatus::Success => Some(Ok(TaskOutcome::Succeeded)),
            TaskStatus::Canceled | TaskStatus::Aborted => Some(Ok(TaskOutcome::Aborted)),
            TaskStatus::Error => Some(Err(self.failure())),
            _ => None,
        }
    }

    /// The embedded error as an [`Error::TaskFailed`].
    #[must_use]
    pub fn failure(&self) -> Error {
        match &self.error {
            Some(record) => record.clone().into_task_error(),
            None => Error::TaskFailed {
                major_code: String::new(),
                minor_code: String::new(),
                message: format!("task {} failed without error details", self.href),
            },
        }
    }
}

impl Linked for TaskRecord {
    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Resource for TaskRecord {
    const MEDIA_TYPE: &'static str = TASK_MEDIA_TYPE;
    const ELEMENTS: &'static [&'static str] = &["Task"];

    fn href(&self) -> &str {
        &self.href
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// Something that can fetch the current state of a task.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Fetch the task at `href`.
    ///
    /// # Errors
    ///
    /// Returns an error if the task cannot be fetched or decoded.
    async fn fetch_task(&self, href: &str) -> Result<TaskRecord>;
}

#[async_trait]
impl TaskSource for Connector {
    async fn fetch_task(&self, href: &str) -> Result<TaskRecord> {
        self.get(href).await?.decode_resource::<TaskRecord>()
    }
}

/// Re-fetch `record` from `source` until it reaches a terminal status.
///
/// A record that is already terminal is resolved without fetching. Between fetches
/// the poller sleeps for the policy interval, waking early if `cancel` fires.
///
/// # Errors
///
/// Returns [`Error::TaskFailed`] when the task ends in `error`, [`Error::Timeout`] when
/// the policy budget is exhausted, [`Error::Cancelled`] when `cancel` fires, and any
/// fetch error unchanged.
pub async fn poll_until_terminal<S>(
    source: &S,
    record: &mut TaskRecord,
    policy: &PollPolicy,
    cancel: Option<&CancellationToken>,
) -> Result<TaskOutcome>
where
    S: TaskSource + ?Sized,
{
    let started = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        if let Some(outcome) = record.outcome() {
            debug!(href = %record.href, status = %record.status, attempts, "Task finished");
            return outcome;
        }

        if policy.attempts_exhausted(attempts) {
            return Err(Error::Timeout(format!(
                "task {} still {} after {attempts} polls",
                record.href, record.status
            )));
        }

        let remaining = match policy.timeout {
            Some(limit) => {
                let elapsed = started.elapsed();
                if elapsed >= limit {
                    return Err(Error::Timeout(format!(
                        "task {} still {} after {elapsed:?}",
                        record.href, record.status
                    )));
                }
                Some(limit - elapsed)
            }
            None => None,
        };

        if attempts > 0 {
            let delay = remaining.map_or(policy.interval, |left| policy.interval.min(left));
            pause(delay, cancel).await?;
        }
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Cancelled(format!("stopped waiting for {}", record.href)));
        }

        let href = record.href.clone();
        let mut next = source.fetch_task(&href).await?;
        if next.href.is_empty() {
            next.href = href;
        }
        *record = next;
        attempts += 1;
        debug!(href = %record.href, status = %record.status, attempts, "Polled task");
    }
}

async fn pause(delay: Duration, cancel: Option<&CancellationToken>) -> Result<()> {
    match cancel {
        Some(token) => tokio::select! {
            () = token.cancelled() => Err(Error::Cancelled("task wait cancelled".to_string())),
            () = sleep(delay) => Ok(()),
        },
        None => {
            sleep(delay).await;
            Ok(())
        }
    }
}

impl<'c> Entity<'c, TaskRecord> {
    /// The task carried by a mutating reply, or `None` when the reply holds no task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the reply announces a task that cannot be decoded.
    pub fn from_response(
        connector: &'c Connector,
        response: &ApiResponse,
    ) -> Result<Option<Self>> {
        if response.is_empty() || !response.is_task() {
            return Ok(None);
        }
        let record = response.decode_resource::<TaskRecord>()?;
        Ok(Some(Self::from_record(connector, record)))
    }

    /// Wait for the task to finish using the connector's polling policy.
    ///
    /// # Errors
    ///
    /// See [`poll_until_terminal`].
    pub async fn wait(&mut self) -> Result<TaskOutcome> {
        let policy = *self.connector().poll_policy();
        self.wait_with(&policy, None).await
    }

    /// Wait for the task to finish with an explicit policy and optional cancellation.
    ///
    /// # Errors
    ///
    /// See [`poll_until_terminal`].
    pub async fn wait_with(
        &mut self,
        policy: &PollPolicy,
        cancel: Option<&CancellationToken>,
    ) -> Result<TaskOutcome> {
        let connector = self.connector();
        poll_until_terminal(connector, &mut **self, policy, cancel).await
    }

    /// Returns true once the task can no longer change state.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}
