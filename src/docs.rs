use crate::api::automation::{RunDueResponse, RunResponse};
use crate::api::leave_request::{CreateLeave, RejectLeave};
use crate::model::automation_rule::{AutomationRule, DayOfWeek, ScheduleType, TaskPriority};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, PayType, RequestedPayType};
use crate::model::task::{GeneratedTask, TaskStatus};
use crate::service::compensation::Compensation;
use crate::service::leave::LeaveEdit;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

/// Registers the `bearer_auth` scheme referenced by every protected path.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave & Automation API",
        version = "1.0.0",
        description = r#"
## Leave workflow and recurring task automation

### 🔹 Leave
- Submit, edit, cancel and list leave requests
- Paid/unpaid resolution from service anniversary and leave credit balance
- HR/Admin approval and rejection, with credit deduction on approval

### 🔹 Automation
- Recurring task rules on daily, weekday or custom cadences
- Manual run, run-now and toggle per rule
- Daily `run-due` trigger for the external scheduler

### 🔐 Security
All endpoints require a **JWT Bearer** token. Approvals and rule management are limited to
**Admin** and **HR**; `run-due` is limited to **Admin** and the **System** account.

### 📦 Errors
Failures return `{"error": <code>, "message": <text>}` with codes such as
`overlap_conflict`, `insufficient_credits`, `invalid_transition` and `rule_expired`.
"#,
    ),
    paths(
        crate::api::leave_request::list_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::update_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::preview_compensation,

        crate::api::automation::run_rule,
        crate::api::automation::run_rule_now,
        crate::api::automation::toggle_rule,
        crate::api::automation::run_due_rules
    ),
    components(
        schemas(
            CreateLeave,
            LeaveEdit,
            RejectLeave,
            LeaveRequest,
            LeaveStatus,
            PayType,
            RequestedPayType,
            Compensation,
            AutomationRule,
            ScheduleType,
            DayOfWeek,
            TaskPriority,
            GeneratedTask,
            TaskStatus,
            RunResponse,
            RunDueResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request workflow APIs"),
        (name = "Automation", description = "Recurring task automation APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/leave"));
        assert!(doc.paths.paths.contains_key("/api/leave/{leave_id}/approve"));
        assert!(doc.paths.paths.contains_key("/api/automation/run-due"));
        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
    }
}
