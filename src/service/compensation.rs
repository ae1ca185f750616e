use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ServiceError;
use crate::model::employee::Employee;
use crate::model::leave_request::{PayType, RequestedPayType};
use crate::utils::calendar::{add_months, days_between_inclusive};

/// Months of service before paid leave is available.
pub const PAID_LEAVE_SERVICE_MONTHS: i32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Compensation {
    pub leave_days: i64,
    pub pay_type: PayType,
    pub credits_deducted: f64,
    /// Only ever set for an explicit `paid` request; the caller must reject it.
    pub insufficient_credits: bool,
    pub eligible: bool,
}

impl Compensation {
    fn unpaid(leave_days: i64, eligible: bool) -> Self {
        Self {
            leave_days,
            pay_type: PayType::Unpaid,
            credits_deducted: 0.0,
            insufficient_credits: false,
            eligible,
        }
    }

    fn paid(leave_days: i64, insufficient_credits: bool) -> Self {
        Self {
            leave_days,
            pay_type: PayType::Paid,
            credits_deducted: leave_days as f64,
            insufficient_credits,
            eligible: true,
        }
    }
}

/// First day paid leave may start: the hire anniversary, not hire + 365 days.
pub fn paid_leave_eligible_from(hire_date: NaiveDate) -> Result<NaiveDate, ServiceError> {
    add_months(hire_date, PAID_LEAVE_SERVICE_MONTHS)
}

/// Decides paid/unpaid and the credit deduction for a leave range.
///
/// `auto` silently falls back to unpaid when the balance is short, while an
/// explicit `paid` request keeps the paid deduction and raises
/// `insufficient_credits` so submission can refuse it.
pub fn resolve_compensation(
    employee: &Employee,
    start_date: NaiveDate,
    end_date: NaiveDate,
    requested: RequestedPayType,
) -> Result<Compensation, ServiceError> {
    let leave_days = days_between_inclusive(start_date, end_date)?;
    if leave_days <= 0 {
        return Err(ServiceError::InvalidRange(format!(
            "{} to {} covers no days",
            start_date, end_date
        )));
    }

    let eligible = start_date >= paid_leave_eligible_from(employee.hire_date)?;
    if !eligible {
        return Ok(Compensation::unpaid(leave_days, false));
    }

    let covered = employee.leave_credits >= leave_days as f64;
    let result = match requested {
        RequestedPayType::Unpaid => Compensation::unpaid(leave_days, true),
        RequestedPayType::Paid => Compensation::paid(leave_days, !covered),
        RequestedPayType::Auto if covered => Compensation::paid(leave_days, false),
        RequestedPayType::Auto => Compensation::unpaid(leave_days, true),
    };

    tracing::debug!(
        employee_id = employee.id,
        leave_days,
        requested = %requested,
        resolved = %result.pay_type,
        balance = employee.leave_credits,
        "Resolved leave compensation"
    );

    Ok(result)
}
