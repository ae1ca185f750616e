use std::collections::BTreeSet;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScheduleType {
    Daily,
    Weekdays,
    Custom,
}

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Mon,
            Weekday::Tue => DayOfWeek::Tue,
            Weekday::Wed => DayOfWeek::Wed,
            Weekday::Thu => DayOfWeek::Thu,
            Weekday::Fri => DayOfWeek::Fri,
            Weekday::Sat => DayOfWeek::Sat,
            Weekday::Sun => DayOfWeek::Sun,
        }
    }
}

impl DayOfWeek {
    /// Parses the stored `mon,wed` form. Duplicates collapse, unknown names fail.
    pub fn parse_set(value: &str) -> Result<BTreeSet<DayOfWeek>, strum::ParseError> {
        value
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| p.to_lowercase().parse())
            .collect()
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 3,
    "client_id": 12,
    "title_template": "Post weekly update ({date})",
    "description_template": "Publish the {weekday} content batch",
    "assigned_to": 7,
    "priority": "medium",
    "schedule_type": "custom",
    "days_of_week": ["mon", "wed"],
    "start_date": "2026-01-01",
    "end_date": null,
    "is_active": true
}))]
pub struct AutomationRule {
    pub id: u64,
    pub client_id: u64,
    pub title_template: String,
    pub description_template: Option<String>,
    /// User id that receives generated tasks.
    pub assigned_to: u64,
    pub priority: TaskPriority,
    pub schedule_type: ScheduleType,
    /// Only consulted for `custom` schedules.
    #[schema(value_type = Vec<DayOfWeek>)]
    pub days_of_week: BTreeSet<DayOfWeek>,
    #[schema(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl AutomationRule {
    /// A rule whose end date is before `today` is frozen.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| end < today)
    }
}
