//! vApps.

use serde::{Deserialize, Serialize};
use std::fmt;
use vcloud_core::types::VAPP_MEDIA_TYPE;
use vcloud_core::urn::VAppUrn;
use vcloud_core::{Entity, Link, Linked, Resource, Task};

use crate::models::TasksInProgress;

/// A vApp bound to its connector.
pub type VApp<'c> = Entity<'c, VAppRecord>;

/// Lifecycle state of a vApp, decoded from its numeric status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VAppStatus {
    /// Creation failed
    FailedCreation,
    /// Not yet resolved
    Unresolved,
    /// Resolved, not deployed
    Resolved,
    /// Deployed
    Deployed,
    /// Suspended
    Suspended,
    /// Powered on
    PoweredOn,
    /// Waiting for user input
    WaitingForInput,
    /// Unknown state
    Unknown,
    /// Unrecognized state
    Unrecognized,
    /// Powered off
    PoweredOff,
    /// Inconsistent state
    InconsistentState,
    /// Children in different states
    Mixed,
    /// A code this client does not know
    Other(i32),
}

impl From<i32> for VAppStatus {
    fn from(code: i32) -> Self {
        match code {
            -1 => Self::FailedCreation,
            0 => Self::Unresolved,
            1 => Self::Resolved,
            2 => Self::Deployed,
            3 => Self::Suspended,
            4 => Self::PoweredOn,
            5 => Self::WaitingForInput,
            6 => Self::Unknown,
            7 => Self::Unrecognized,
            8 => Self::PoweredOff,
            9 => Self::InconsistentState,
            10 => Self::Mixed,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for VAppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailedCreation => f.write_str("FAILED_CREATION"),
            Self::Unresolved => f.write_str("UNRESOLVED"),
            Self::Resolved => f.write_str("RESOLVED"),
            Self::Deployed => f.write_str("DEPLOYED"),
            Self::Suspended => f.write_str("SUSPENDED"),
            Self::PoweredOn => f.write_str("POWERED_ON"),
            Self::WaitingForInput => f.write_str("WAITING_FOR_INPUT"),
            Self::Unknown => f.write_str("UNKNOWN"),
            Self::Unrecognized => f.write_str("UNRECOGNIZED"),
            Self::PoweredOff => f.write_str("POWERED_OFF"),
            Self::InconsistentState => f.write_str("INCONSISTENT_STATE"),
            Self::Mixed => f.write_str("MIXED"),
            Self::Other(code) => write!(f, "STATUS_{code}"),
        }
    }
}

/// vApp representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "VApp")]
pub struct VAppRecord {
    /// Entity id
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<VAppUrn>,
    /// Name
    #[serde(rename = "@name", default)]
    pub name: String,
    /// Href
    #[serde(rename = "@href", default)]
    pub href: String,
    /// Numeric status code
    #[serde(rename = "@status", default)]
    pub status: i32,
    /// Whether the vApp is deployed
    #[serde(rename = "@deployed", default)]
    pub deployed: bool,
    /// Links
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
    /// Description
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tasks running against the vApp
    #[serde(rename = "Tasks", default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<TasksInProgress>,
}

impl VAppRecord {
    /// Decoded lifecycle state.
    #[must_use]
    pub fn state(&self) -> VAppStatus {
        VAppStatus::from(self.status)
    }
}

impl Linked for VAppRecord {
    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Resource for VAppRecord {
    const MEDIA_TYPE: &'static str = VAPP_MEDIA_TYPE;
    const ELEMENTS: &'static [&'static str] = &["VApp"];

    fn href(&self) -> &str {
        &self.href
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// Access to the tasks embedded in a vApp.
pub trait VAppNavigation<'c> {
    /// Handles for the tasks still running against the vApp.
    fn tasks(&self) -> Vec<Task<'c>>;
}

impl<'c> VAppNavigation<'c> for VApp<'c> {
    fn tasks(&self) -> Vec<Task<'c>> {
        self.record()
            .tasks
            .iter()
            .flat_map(|tasks| tasks.tasks.iter().cloned())
            .map(|record| Task::from_record(self.connector(), record))
            .collect()
    }
}
