use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::model::notification::TargetTable;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    CreateLeaveRequest,
    EditLeaveRequest,
    ApproveLeaveRequest,
    RejectLeaveRequest,
    CancelLeaveRequest,
    ToggleAutomationRule,
    RunAutomationRule,
}

/// One row of `audit_logs`, written in the same transaction as the change it records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub user_id: u64,
    pub action: AuditAction,
    pub target_table: TargetTable,
    pub target_id: u64,
}

impl AuditEntry {
    pub fn new(user_id: u64, action: AuditAction, target_table: TargetTable, target_id: u64) -> Self {
        Self {
            user_id,
            action,
            target_table,
            target_id,
        }
    }
}
