use crate::auth::auth::AuthUser;
use crate::error::ServiceError;
use crate::model::leave_request::{LeaveStatus, RequestedPayType};
use crate::service::leave::{LeaveEdit, NewLeave, Requester};
use crate::state::AppState;
use crate::utils::calendar::parse_range;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

fn default_pay_type() -> RequestedPayType {
    RequestedPayType::Auto
}

fn requester(auth: &AuthUser) -> actix_web::Result<Requester> {
    Ok(Requester {
        user_id: auth.user_id,
        employee_id: auth.employee_profile()?,
    })
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family trip")]
    pub reason: String,
    /// `paid`, `unpaid` or `auto` (default)
    #[serde(default = "default_pay_type")]
    #[schema(example = "auto")]
    pub pay_type: RequestedPayType,
    #[schema(example = "uploads/medical-note.pdf")]
    pub attachment_ref: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    #[schema(example = "Project deadline that week")]
    pub comment: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompensationQuery {
    /// First day of leave (YYYY-MM-DD)
    pub start_date: String,
    /// Last day of leave, inclusive (YYYY-MM-DD)
    pub end_date: String,
    /// `paid`, `unpaid` or `auto` (default)
    #[param(value_type = Option<String>)]
    pub pay_type: Option<RequestedPayType>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListLeaveQuery {
    /// `pending`, `approved`, `rejected` or `cancelled`
    #[param(value_type = Option<String>)]
    pub status: Option<LeaveStatus>,
}

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    params(ListLeaveQuery),
    responses(
        (status = 200, description = "Own requests for employees, every request for HR/Admin", body = [crate::model::leave_request::LeaveRequest]),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn list_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<ListLeaveQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = if auth.is_hr_or_admin() {
        None
    } else {
        Some(auth.employee_profile()?)
    };

    let requests = state.leave.list(employee_id, query.status).await?;
    Ok(HttpResponse::Ok().json(requests))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = crate::model::leave_request::LeaveRequest),
        (status = 400, description = "Invalid date range or empty reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 409, description = "Overlapping leave, insufficient credits or employee already on leave")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let requester = requester(&auth)?;
    let payload = payload.into_inner();

    let request = state
        .leave
        .submit(
            requester,
            NewLeave {
                start_date: payload.start_date,
                end_date: payload.end_date,
                reason: payload.reason,
                pay_type: payload.pay_type,
                attachment_ref: payload.attachment_ref,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(request))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = crate::model::leave_request::LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = state.leave.get(path.into_inner()).await?;

    let is_owner = auth.employee_id == Some(request.employee_id);
    if !is_owner && !auth.is_hr_or_admin() {
        return Err(ServiceError::Forbidden("not your leave request".into()).into());
    }

    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Edit pending leave (owner)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to edit")
    ),
    request_body = crate::service::leave::LeaveEdit,
    responses(
        (status = 200, description = "Leave request updated", body = crate::model::leave_request::LeaveRequest),
        (status = 400, description = "Invalid date range"),
        (status = 403, description = "Not the requesting employee"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request is no longer pending or dates overlap")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<LeaveEdit>,
) -> actix_web::Result<impl Responder> {
    let requester = requester(&auth)?;
    let request = state
        .leave
        .edit(path.into_inner(), requester, payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved, credits deducted for paid leave", body = crate::model::leave_request::LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let request = state.leave.approve(path.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected", body = crate::model::leave_request::LeaveRequest),
        (status = 400, description = "Missing comment"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<RejectLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let request = state
        .leave
        .reject(path.into_inner(), auth.user_id, &payload.comment)
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Cancel pending leave (owner)
========================= */
#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave request cancelled", body = Object, example = json!({
            "message": "Leave request cancelled"
        })),
        (status = 403, description = "Not the requesting employee"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let requester = requester(&auth)?;
    state.leave.cancel(path.into_inner(), requester).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request cancelled"
    })))
}

/// Dry run of the pay type resolver for the caller's own balance
#[utoipa::path(
    get,
    path = "/api/leave/compensation",
    params(CompensationQuery),
    responses(
        (status = 200, description = "Resolved compensation", body = crate::service::compensation::Compensation),
        (status = 400, description = "Invalid date range"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn preview_compensation(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<CompensationQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_profile()?;
    let (start, end, _) = parse_range(&query.start_date, &query.end_date)?;

    let compensation = state
        .leave
        .preview(
            employee_id,
            start,
            end,
            query.pay_type.unwrap_or_else(default_pay_type),
        )
        .await?;
    Ok(HttpResponse::Ok().json(compensation))
}

#[cfg(test)]
mod tests {
    use crate::model::role::Role;
    use crate::routes::leave_routes;
    use crate::testing::{ADMIN_USER, Harness, TEST_SECRET, bearer, d, employee, sign_token, test_config};
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use serde_json::{Value, json};

    macro_rules! app {
        ($h:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(test_config()))
                    .app_data(web::Data::new($h.state()))
                    .service(web::scope("/api").configure(leave_routes)),
            )
            .await
        };
    }

    fn employee_token(employee_id: u64) -> String {
        sign_token(employee_id + 10, Role::Employee.id(), Some(employee_id), TEST_SECRET)
    }

    fn admin_token() -> String {
        sign_token(ADMIN_USER, Role::Admin.id(), None, TEST_SECRET)
    }

    async fn harness() -> Harness {
        let h = Harness::new(d(2026, 10, 18)).await;
        h.store.put_employee(employee(1, d(2020, 1, 1), 5.0)).await;
        h.store.put_employee(employee(2, d(2020, 1, 1), 5.0)).await;
        h
    }

    #[actix_web::test]
    async fn submit_then_approve_round_trip() {
        let h = harness().await;
        let app = app!(h);

        let req = test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(bearer(&employee_token(1)))
            .set_json(json!({
                "start_date": "2026-11-02",
                "end_date": "2026-11-04",
                "reason": "Family trip"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["status"], "pending");
        assert_eq!(created["pay_type"], "paid");
        let id = created["id"].as_u64().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/leave/{}/approve", id))
            .insert_header(bearer(&admin_token()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(h.store.employee(1).await.leave_credits, 2.0);
    }

    #[actix_web::test]
    async fn employees_cannot_approve() {
        let h = harness().await;
        let app = app!(h);

        let req = test::TestRequest::put()
            .uri("/api/leave/1/approve")
            .insert_header(bearer(&employee_token(1)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let h = harness().await;
        let app = app!(h);

        let req = test::TestRequest::get().uri("/api/leave/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn domain_errors_map_to_status_and_code() {
        let h = harness().await;
        let app = app!(h);

        let req = test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(bearer(&employee_token(1)))
            .set_json(json!({
                "start_date": "2026-11-02",
                "end_date": "2026-11-09",
                "reason": "Long trip",
                "pay_type": "paid"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "insufficient_credits");

        let req = test::TestRequest::get()
            .uri("/api/leave/999")
            .insert_header(bearer(&admin_token()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn unknown_pay_type_is_rejected_at_the_boundary() {
        let h = harness().await;
        let app = app!(h);

        let req = test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(bearer(&employee_token(1)))
            .set_json(json!({
                "start_date": "2026-11-02",
                "end_date": "2026-11-03",
                "reason": "Trip",
                "pay_type": "half_paid"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(h.store.snapshot().await.requests.is_empty());
    }

    #[actix_web::test]
    async fn other_employees_cannot_view_or_cancel() {
        let h = harness().await;
        let app = app!(h);

        let req = test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(bearer(&employee_token(1)))
            .set_json(json!({
                "start_date": "2026-11-02",
                "end_date": "2026-11-03",
                "reason": "Dentist"
            }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/api/leave/{}", created["id"].as_u64().unwrap());

        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(&employee_token(2)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&employee_token(2)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&employee_token(1)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn listing_is_scoped_by_role() {
        let h = harness().await;
        let app = app!(h);

        for (employee_id, start, end) in [(1, "2026-11-02", "2026-11-03"), (2, "2026-11-09", "2026-11-10")] {
            let req = test::TestRequest::post()
                .uri("/api/leave")
                .insert_header(bearer(&employee_token(employee_id)))
                .set_json(json!({ "start_date": start, "end_date": end, "reason": "Trip" }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri("/api/leave")
            .insert_header(bearer(&employee_token(1)))
            .to_request();
        let own: Value = test::call_and_read_body_json(&app, req).await;
        let own = own.as_array().unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0]["employee_id"], 1);

        let req = test::TestRequest::get()
            .uri("/api/leave?status=pending")
            .insert_header(bearer(&admin_token()))
            .to_request();
        let all: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(all.as_array().map(Vec::len), Some(2));

        let req = test::TestRequest::get()
            .uri("/api/leave?status=approved")
            .insert_header(bearer(&admin_token()))
            .to_request();
        let approved: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(approved.as_array().map(Vec::len), Some(0));

        let req = test::TestRequest::get()
            .uri("/api/leave?status=archived")
            .insert_header(bearer(&admin_token()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn compensation_preview_uses_callers_balance() {
        let h = harness().await;
        let app = app!(h);

        let req = test::TestRequest::get()
            .uri("/api/leave/compensation?start_date=2026-11-02&end_date=2026-11-07")
            .insert_header(bearer(&employee_token(1)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["leave_days"], 6);
        assert_eq!(body["pay_type"], "unpaid");

        let req = test::TestRequest::get()
            .uri("/api/leave/compensation?start_date=2026-11-07&end_date=2026-11-02")
            .insert_header(bearer(&employee_token(1)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
