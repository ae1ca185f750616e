use crate::auth::auth::AuthUser;
use crate::state::AppState;
use crate::utils::calendar::parse_iso_date;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AsOfQuery {
    /// Date to evaluate the schedule for (YYYY-MM-DD), defaults to today
    #[param(example = "2026-10-14")]
    pub as_of: Option<String>,
}

impl AsOfQuery {
    fn resolve(&self, today: NaiveDate) -> actix_web::Result<NaiveDate> {
        match &self.as_of {
            Some(raw) => Ok(parse_iso_date(raw)?),
            None => Ok(today),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RunResponse {
    /// `None` when the rule is inactive, expired or not scheduled for the date
    pub task: Option<crate::model::task::GeneratedTask>,
}

#[derive(Serialize, ToSchema)]
pub struct RunDueResponse {
    #[schema(example = "2026-10-14", format = "date", value_type = String)]
    pub as_of: NaiveDate,
    pub generated: Vec<crate::model::task::GeneratedTask>,
}

/* =========================
Scheduled run of one rule
========================= */
#[utoipa::path(
    post,
    path = "/api/automation/{rule_id}/run",
    params(
        ("rule_id" = u64, Path, description = "Automation rule ID"),
        AsOfQuery
    ),
    responses(
        (status = 200, description = "Task generated, or null when the rule did not fire", body = RunResponse),
        (status = 400, description = "Invalid as_of date"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Automation rule not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Automation"
)]
pub async fn run_rule(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    query: web::Query<AsOfQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let as_of = query.resolve(state.automation.today())?;
    let task = state
        .automation
        .run(path.into_inner(), as_of, Some(auth.user_id))
        .await?;
    Ok(HttpResponse::Ok().json(RunResponse { task }))
}

/* =========================
Manual run, ignores cadence
========================= */
#[utoipa::path(
    post,
    path = "/api/automation/{rule_id}/run-now",
    params(
        ("rule_id" = u64, Path, description = "Automation rule ID")
    ),
    responses(
        (status = 201, description = "Task generated for today", body = crate::model::task::GeneratedTask),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Automation rule not found"),
        (status = 409, description = "Rule expired")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Automation"
)]
pub async fn run_rule_now(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let task = state
        .automation
        .run_now(path.into_inner(), auth.user_id)
        .await?;
    Ok(HttpResponse::Created().json(task))
}

#[utoipa::path(
    put,
    path = "/api/automation/{rule_id}/toggle",
    params(
        ("rule_id" = u64, Path, description = "Automation rule ID")
    ),
    responses(
        (status = 200, description = "Rule with its new active flag", body = crate::model::automation_rule::AutomationRule),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Automation rule not found"),
        (status = 409, description = "Rule expired, state is frozen")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Automation"
)]
pub async fn toggle_rule(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let rule = state
        .automation
        .toggle(path.into_inner(), auth.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(rule))
}

/// Daily trigger: evaluates every active rule for the date
#[utoipa::path(
    post,
    path = "/api/automation/run-due",
    params(AsOfQuery),
    responses(
        (status = 200, description = "Tasks generated by this pass", body = RunDueResponse),
        (status = 400, description = "Invalid as_of date"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Automation"
)]
pub async fn run_due_rules(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<AsOfQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_system()?;

    let as_of = query.resolve(state.automation.today())?;
    let generated = state.automation.run_due(as_of).await?;
    Ok(HttpResponse::Ok().json(RunDueResponse { as_of, generated }))
}
