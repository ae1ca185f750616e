use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::automation_rule::TaskPriority;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeneratedTask {
    pub id: u64,
    /// `None` for tasks created by hand.
    pub rule_id: Option<u64>,
    pub client_id: Option<u64>,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: u64,
    pub priority: TaskPriority,
    #[schema(value_type = String, format = "date")]
    pub due_date: NaiveDate,
    pub status: TaskStatus,
    pub is_automated: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}
