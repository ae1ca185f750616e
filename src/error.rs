use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use derive_more::Display;
use serde_json::json;

/// Errors surfaced by the leave workflow and the automation engine.
///
/// Every variant carries the entity id and the rule that was broken so callers
/// can render a useful message. Storage details are logged, never returned.
#[derive(Debug, Display)]
pub enum ServiceError {
    #[display(fmt = "invalid date range: {}", _0)]
    InvalidRange(String),

    #[display(
        fmt = "leave dates for employee {} overlap leave request {}",
        employee_id,
        conflicting_id
    )]
    OverlapConflict { employee_id: u64, conflicting_id: u64 },

    #[display(
        fmt = "employee {} needs {} leave credits but has {}",
        employee_id,
        required,
        available
    )]
    InsufficientCredits {
        employee_id: u64,
        required: f64,
        available: f64,
    },

    #[display(fmt = "{} {} not found", entity, id)]
    NotFound { entity: &'static str, id: u64 },

    #[display(fmt = "cannot {} {} {} while it is {}", action, entity, id, status)]
    InvalidTransition {
        entity: &'static str,
        id: u64,
        status: String,
        action: &'static str,
    },

    #[display(fmt = "automation rule {} expired on {}", rule_id, end_date)]
    RuleExpired { rule_id: u64, end_date: NaiveDate },

    #[display(fmt = "employee {} is currently on leave", employee_id)]
    EmployeeOnLeave { employee_id: u64 },

    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "storage error")]
    Storage(String),
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        ServiceError::NotFound { entity, id }
    }

    /// Stable machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidRange(_) => "invalid_range",
            ServiceError::OverlapConflict { .. } => "overlap_conflict",
            ServiceError::InsufficientCredits { .. } => "insufficient_credits",
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::InvalidTransition { .. } => "invalid_transition",
            ServiceError::RuleExpired { .. } => "rule_expired",
            ServiceError::EmployeeOnLeave { .. } => "employee_on_leave",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::Validation(_) => "validation",
            ServiceError::Storage(_) => "internal",
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Storage(e.to_string())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidRange(_) | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::OverlapConflict { .. }
            | ServiceError::InsufficientCredits { .. }
            | ServiceError::InvalidTransition { .. }
            | ServiceError::RuleExpired { .. }
            | ServiceError::EmployeeOnLeave { .. } => StatusCode::CONFLICT,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ServiceError::Storage(detail) => {
                tracing::error!(error = %detail, "Storage failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": message
        }))
    }
}
