use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::error::ServiceError;
use crate::model::audit_log::{AuditAction, AuditEntry};
use crate::model::employee::{Employee, EmployeeStatus};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, PayType, RequestedPayType};
use crate::model::notification::{NotificationKind, TargetTable};
use crate::model::role::Role;
use crate::service::compensation::{Compensation, resolve_compensation};
use crate::service::notifier::{NotificationEvent, Notifier, Recipients};
use crate::store::{LeaveStore, LeaveTx};
use crate::utils::calendar::{days_between_inclusive, ranges_overlap};
use crate::utils::clock::Clock;

/// The employee-side caller of a leave operation.
#[derive(Debug, Clone, Copy)]
pub struct Requester {
    pub user_id: u64,
    pub employee_id: u64,
}

#[derive(Debug, Clone)]
pub struct NewLeave {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub pay_type: RequestedPayType,
    pub attachment_ref: Option<String>,
}

/// Fields an employee may change while the request is still pending.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LeaveEdit {
    #[schema(example = "2026-01-06", value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-08", value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub pay_type: Option<RequestedPayType>,
    pub attachment_ref: Option<String>,
}

/// On leave iff `today` falls inside any approved range. Recomputed from
/// scratch after every decision.
pub fn derive_employee_status(
    approved: &[(NaiveDate, NaiveDate)],
    today: NaiveDate,
) -> EmployeeStatus {
    if approved
        .iter()
        .any(|(start, end)| ranges_overlap(*start, *end, today, today))
    {
        EmployeeStatus::OnLeave
    } else {
        EmployeeStatus::Active
    }
}

fn validate_reason(reason: &str) -> Result<(), ServiceError> {
    if reason.trim().is_empty() {
        return Err(ServiceError::Validation("reason must not be empty".into()));
    }
    Ok(())
}

fn ensure_pending(request: &LeaveRequest, action: &'static str) -> Result<(), ServiceError> {
    if request.status.is_terminal() {
        return Err(ServiceError::InvalidTransition {
            entity: "leave request",
            id: request.id,
            status: request.status.to_string(),
            action,
        });
    }
    Ok(())
}

/// Runs the resolver and refuses explicit paid requests the balance cannot cover.
fn assess(
    employee: &Employee,
    start: NaiveDate,
    end: NaiveDate,
    requested: RequestedPayType,
) -> Result<Compensation, ServiceError> {
    let compensation = resolve_compensation(employee, start, end, requested)?;
    if compensation.insufficient_credits && requested == RequestedPayType::Paid {
        return Err(ServiceError::InsufficientCredits {
            employee_id: employee.id,
            required: compensation.credits_deducted,
            available: employee.leave_credits,
        });
    }
    Ok(compensation)
}

async fn ensure_no_overlap(
    tx: &mut dyn LeaveTx,
    employee_id: u64,
    start: NaiveDate,
    end: NaiveDate,
    exclude: Option<u64>,
) -> Result<(), ServiceError> {
    if let Some(conflicting_id) = tx.find_overlapping(employee_id, start, end, exclude).await? {
        return Err(ServiceError::OverlapConflict {
            employee_id,
            conflicting_id,
        });
    }
    Ok(())
}

pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    approver_roles: Vec<Role>,
}

impl LeaveService {
    pub fn new(
        store: Arc<dyn LeaveStore>,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
        approver_roles: Vec<Role>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            approver_roles,
        }
    }

    pub async fn get(&self, request_id: u64) -> Result<LeaveRequest, ServiceError> {
        self.store
            .find_request(request_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("leave request", request_id))
    }

    /// Requests newest first, narrowed to one employee when `employee_id` is set.
    pub async fn list(
        &self,
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> Result<Vec<LeaveRequest>, ServiceError> {
        self.store.list_requests(employee_id, status).await
    }

    /// Resolver dry run against the current balance. Writes nothing.
    pub async fn preview(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        pay_type: RequestedPayType,
    ) -> Result<Compensation, ServiceError> {
        let employee = self
            .store
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("employee", employee_id))?;
        resolve_compensation(&employee, start, end, pay_type)
    }

    pub async fn submit(
        &self,
        requester: Requester,
        input: NewLeave,
    ) -> Result<LeaveRequest, ServiceError> {
        validate_reason(&input.reason)?;
        days_between_inclusive(input.start_date, input.end_date)?;

        let mut tx = self.store.begin().await?;

        let employee = tx
            .lock_employee(requester.employee_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("employee", requester.employee_id))?;
        // The stored flag only moves on decisions, so judge from the calendar.
        let status = derive_employee_status(
            &tx.approved_ranges(employee.id).await?,
            self.clock.today(),
        );
        if status == EmployeeStatus::OnLeave {
            return Err(ServiceError::EmployeeOnLeave {
                employee_id: employee.id,
            });
        }
        if employee.status != status {
            tx.set_employee_status(employee.id, status).await?;
        }

        ensure_no_overlap(
            tx.as_mut(),
            employee.id,
            input.start_date,
            input.end_date,
            None,
        )
        .await?;
        let compensation = assess(&employee, input.start_date, input.end_date, input.pay_type)?;

        let now = self.clock.now();
        let mut request = LeaveRequest {
            id: 0,
            employee_id: employee.id,
            requested_by: requester.user_id,
            start_date: input.start_date,
            end_date: input.end_date,
            reason: input.reason.trim().to_string(),
            requested_pay_type: input.pay_type,
            pay_type: compensation.pay_type,
            leave_days: compensation.leave_days,
            credits_deducted: compensation.credits_deducted,
            status: LeaveStatus::Pending,
            approved_by: None,
            rejection_comment: None,
            attachment_ref: input.attachment_ref,
            created_at: now,
            updated_at: now,
        };
        request.id = tx.insert_request(&request).await?;
        tx.record_audit(&AuditEntry::new(
            requester.user_id,
            AuditAction::CreateLeaveRequest,
            TargetTable::LeaveRequests,
            request.id,
        ))
        .await?;
        tx.commit().await?;

        info!(
            leave_id = request.id,
            employee_id = employee.id,
            pay_type = %request.pay_type,
            leave_days = request.leave_days,
            "Leave request submitted"
        );

        self.notifier
            .notify(
                Recipients::Roles(self.approver_roles.clone()),
                NotificationEvent {
                    kind: NotificationKind::LeaveSubmitted,
                    title: "New leave request".into(),
                    message: format!(
                        "{} requested {} day(s) of {} leave from {} to {}",
                        employee.full_name(),
                        request.leave_days,
                        request.pay_type,
                        request.start_date,
                        request.end_date
                    ),
                    target_table: TargetTable::LeaveRequests,
                    target_id: request.id,
                    actor_id: Some(requester.user_id),
                },
            )
            .await;

        Ok(request)
    }

    pub async fn edit(
        &self,
        request_id: u64,
        requester: Requester,
        changes: LeaveEdit,
    ) -> Result<LeaveRequest, ServiceError> {
        let existing = self.get(request_id).await?;
        if !existing.is_owned_by(requester.employee_id) {
            return Err(ServiceError::Forbidden(
                "only the requesting employee can edit a leave request".into(),
            ));
        }
        if let Some(reason) = &changes.reason {
            validate_reason(reason)?;
        }

        let mut tx = self.store.begin().await?;

        let employee = tx
            .lock_employee(existing.employee_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("employee", existing.employee_id))?;
        let mut request = tx
            .lock_request(request_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("leave request", request_id))?;
        ensure_pending(&request, "edit")?;

        let start = changes.start_date.unwrap_or(request.start_date);
        let end = changes.end_date.unwrap_or(request.end_date);
        let requested = changes.pay_type.unwrap_or(request.requested_pay_type);
        days_between_inclusive(start, end)?;

        ensure_no_overlap(tx.as_mut(), employee.id, start, end, Some(request.id)).await?;
        let compensation = assess(&employee, start, end, requested)?;

        request.start_date = start;
        request.end_date = end;
        request.requested_pay_type = requested;
        request.pay_type = compensation.pay_type;
        request.leave_days = compensation.leave_days;
        request.credits_deducted = compensation.credits_deducted;
        if let Some(reason) = changes.reason {
            request.reason = reason.trim().to_string();
        }
        if changes.attachment_ref.is_some() {
            request.attachment_ref = changes.attachment_ref;
        }
        request.updated_at = self.clock.now();

        tx.update_request(&request).await?;
        tx.record_audit(&AuditEntry::new(
            requester.user_id,
            AuditAction::EditLeaveRequest,
            TargetTable::LeaveRequests,
            request.id,
        ))
        .await?;
        tx.commit().await?;

        info!(leave_id = request.id, employee_id = employee.id, "Leave request edited");
        Ok(request)
    }

    /// Approves a pending request and applies its credit deduction.
    ///
    /// The balance is re-read under the employee lock; if it no longer covers a
    /// paid request the request is approved as unpaid instead of failing.
    pub async fn approve(
        &self,
        request_id: u64,
        approver_id: u64,
    ) -> Result<LeaveRequest, ServiceError> {
        let existing = self.get(request_id).await?;

        let mut tx = self.store.begin().await?;

        let employee = tx
            .lock_employee(existing.employee_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("employee", existing.employee_id))?;
        let mut request = tx
            .lock_request(request_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("leave request", request_id))?;
        ensure_pending(&request, "approve")?;

        if request.pay_type == PayType::Paid && employee.leave_credits < request.credits_deducted {
            info!(
                leave_id = request.id,
                employee_id = employee.id,
                required = request.credits_deducted,
                available = employee.leave_credits,
                "Balance no longer covers paid leave, approving as unpaid"
            );
            request.pay_type = PayType::Unpaid;
            request.credits_deducted = 0.0;
        }

        request.status = LeaveStatus::Approved;
        request.approved_by = Some(approver_id);
        request.updated_at = self.clock.now();
        tx.update_request(&request).await?;

        if request.pay_type == PayType::Paid && request.credits_deducted > 0.0 {
            let remaining = (employee.leave_credits - request.credits_deducted).max(0.0);
            tx.set_leave_credits(employee.id, remaining).await?;
        }

        let status = self.refresh_employee_status(tx.as_mut(), employee.id).await?;
        tx.record_audit(&AuditEntry::new(
            approver_id,
            AuditAction::ApproveLeaveRequest,
            TargetTable::LeaveRequests,
            request.id,
        ))
        .await?;
        tx.commit().await?;

        info!(
            leave_id = request.id,
            employee_id = employee.id,
            approver_id,
            pay_type = %request.pay_type,
            credits_deducted = request.credits_deducted,
            employee_status = %status,
            "Leave request approved"
        );

        self.notifier
            .notify(
                Recipients::User(request.requested_by),
                NotificationEvent {
                    kind: NotificationKind::LeaveApproved,
                    title: "Leave approved".into(),
                    message: format!(
                        "Your {} leave from {} to {} was approved",
                        request.pay_type, request.start_date, request.end_date
                    ),
                    target_table: TargetTable::LeaveRequests,
                    target_id: request.id,
                    actor_id: Some(approver_id),
                },
            )
            .await;

        Ok(request)
    }

    pub async fn reject(
        &self,
        request_id: u64,
        approver_id: u64,
        comment: &str,
    ) -> Result<LeaveRequest, ServiceError> {
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ServiceError::Validation(
                "a comment is required to reject a leave request".into(),
            ));
        }

        let existing = self.get(request_id).await?;

        let mut tx = self.store.begin().await?;

        let employee = tx
            .lock_employee(existing.employee_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("employee", existing.employee_id))?;
        let mut request = tx
            .lock_request(request_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("leave request", request_id))?;
        ensure_pending(&request, "reject")?;

        request.status = LeaveStatus::Rejected;
        request.approved_by = Some(approver_id);
        request.rejection_comment = Some(comment.to_string());
        request.updated_at = self.clock.now();
        tx.update_request(&request).await?;

        self.refresh_employee_status(tx.as_mut(), employee.id).await?;
        tx.record_audit(&AuditEntry::new(
            approver_id,
            AuditAction::RejectLeaveRequest,
            TargetTable::LeaveRequests,
            request.id,
        ))
        .await?;
        tx.commit().await?;

        info!(leave_id = request.id, employee_id = employee.id, approver_id, "Leave request rejected");

        self.notifier
            .notify(
                Recipients::User(request.requested_by),
                NotificationEvent {
                    kind: NotificationKind::LeaveRejected,
                    title: "Leave rejected".into(),
                    message: format!(
                        "Your leave from {} to {} was rejected: {}",
                        request.start_date, request.end_date, comment
                    ),
                    target_table: TargetTable::LeaveRequests,
                    target_id: request.id,
                    actor_id: Some(approver_id),
                },
            )
            .await;

        Ok(request)
    }

    /// Voids a pending request. No ledger effect.
    pub async fn cancel(&self, request_id: u64, requester: Requester) -> Result<(), ServiceError> {
        let existing = self.get(request_id).await?;
        if !existing.is_owned_by(requester.employee_id) {
            return Err(ServiceError::Forbidden(
                "only the requesting employee can cancel a leave request".into(),
            ));
        }

        let mut tx = self.store.begin().await?;

        tx.lock_employee(existing.employee_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("employee", existing.employee_id))?;
        let mut request = tx
            .lock_request(request_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("leave request", request_id))?;
        ensure_pending(&request, "cancel")?;

        request.status = LeaveStatus::Cancelled;
        request.updated_at = self.clock.now();
        tx.update_request(&request).await?;
        tx.record_audit(&AuditEntry::new(
            requester.user_id,
            AuditAction::CancelLeaveRequest,
            TargetTable::LeaveRequests,
            request.id,
        ))
        .await?;
        tx.commit().await?;

        info!(leave_id = request.id, employee_id = request.employee_id, "Leave request cancelled");
        Ok(())
    }

    async fn refresh_employee_status(
        &self,
        tx: &mut dyn LeaveTx,
        employee_id: u64,
    ) -> Result<EmployeeStatus, ServiceError> {
        let approved = tx.approved_ranges(employee_id).await?;
        let status = derive_employee_status(&approved, self.clock.today());
        tx.set_employee_status(employee_id, status).await?;
        Ok(status)
    }
}
