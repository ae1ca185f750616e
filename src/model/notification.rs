use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    LeaveSubmitted,
    LeaveApproved,
    LeaveRejected,
    TaskAssigned,
}

/// Table of the entity a notification or audit entry points at.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TargetTable {
    LeaveRequests,
    AutomationRules,
    Tasks,
}

/// A notification to write. Id, read flag and creation time are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub recipient_id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub target_table: TargetTable,
    pub target_id: u64,
}
