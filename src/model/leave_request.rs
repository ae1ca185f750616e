use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }

    /// Statuses that reserve their date range against new requests.
    pub fn holds_dates(self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }
}

/// Pay type asked for by the employee.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestedPayType {
    Paid,
    Unpaid,
    Auto,
}

/// Pay type actually assigned after eligibility and balance rules.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PayType {
    Paid,
    Unpaid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "requested_by": 7,
    "start_date": "2026-01-05",
    "end_date": "2026-01-09",
    "reason": "Family trip",
    "requested_pay_type": "auto",
    "pay_type": "paid",
    "leave_days": 5,
    "credits_deducted": 5.0,
    "status": "pending",
    "approved_by": null,
    "rejection_comment": null,
    "attachment_ref": null,
    "created_at": "2026-01-01T00:00:00Z",
    "updated_at": "2026-01-01T00:00:00Z"
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    /// User account that submitted the request; receives decision notifications.
    pub requested_by: u64,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    /// Inclusive.
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub reason: String,
    pub requested_pay_type: RequestedPayType,
    pub pay_type: PayType,
    pub leave_days: i64,
    pub credits_deducted: f64,
    pub status: LeaveStatus,
    /// Set on approval and on rejection.
    pub approved_by: Option<u64>,
    pub rejection_comment: Option<String>,
    /// Opaque reference to an uploaded file.
    pub attachment_ref: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn is_owned_by(&self, employee_id: u64) -> bool {
        self.employee_id == employee_id
    }
}
