use chrono::{Datelike, Months, NaiveDate, Weekday};

use crate::error::ServiceError;
use crate::model::automation_rule::{AutomationRule, DayOfWeek, ScheduleType};

pub fn parse_iso_date(value: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ServiceError::InvalidRange(format!("'{}' is not a YYYY-MM-DD date", value)))
}

/// Number of calendar days in `[start, end]`, both ends counted.
pub fn days_between_inclusive(start: NaiveDate, end: NaiveDate) -> Result<i64, ServiceError> {
    if end < start {
        return Err(ServiceError::InvalidRange(format!(
            "end date {} is before start date {}",
            end, start
        )));
    }
    Ok((end - start).num_days() + 1)
}

/// Parses both bounds and counts the days between them.
pub fn parse_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate, i64), ServiceError> {
    let start = parse_iso_date(start)?;
    let end = parse_iso_date(end)?;
    let days = days_between_inclusive(start, end)?;
    Ok((start, end, days))
}

/// Calendar month addition. The day is clamped to the last day of the target
/// month, so Jan 31 + 1 month is Feb 28 (or 29).
pub fn add_months(date: NaiveDate, months: i32) -> Result<NaiveDate, ServiceError> {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.ok_or_else(|| {
        ServiceError::InvalidRange(format!("{} shifted by {} months is out of range", date, months))
    })
}

/// Inclusive range intersection: `a_start <= b_end && a_end >= b_start`.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Whether a rule's cadence and active window cover `date`. Ignores `is_active`.
pub fn matches_schedule(date: NaiveDate, rule: &AutomationRule) -> bool {
    if rule.start_date.is_some_and(|start| date < start) {
        return false;
    }
    if rule.end_date.is_some_and(|end| date > end) {
        return false;
    }

    match rule.schedule_type {
        ScheduleType::Daily => true,
        ScheduleType::Weekdays => !matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
        ScheduleType::Custom => rule.days_of_week.contains(&DayOfWeek::from(date.weekday())),
    }
}
