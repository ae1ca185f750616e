//! Persistence seams for the leave workflow and the automation engine.
//!
//! The leave path needs a real transaction: employee rows are locked first
//! (`SELECT ... FOR UPDATE`), then request rows, and nothing is visible to other
//! callers until [`LeaveTx::commit`]. Dropping a transaction rolls it back.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::ServiceError;
use crate::model::audit_log::AuditEntry;
use crate::model::automation_rule::AutomationRule;
use crate::model::employee::{Employee, EmployeeStatus};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::notification::Notification;
use crate::model::role::Role;
use crate::model::task::GeneratedTask;

#[cfg(test)]
pub mod memory;
pub mod mysql;
pub mod role_cache;

pub type StoreResult<T> = Result<T, ServiceError>;

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn LeaveTx>>;

    /// Unlocked read, used to find the employee to lock before a transition.
    async fn find_request(&self, id: u64) -> StoreResult<Option<LeaveRequest>>;

    async fn find_employee(&self, id: u64) -> StoreResult<Option<Employee>>;

    /// Newest first. `None` filters match everything.
    async fn list_requests(
        &self,
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> StoreResult<Vec<LeaveRequest>>;
}

#[async_trait]
pub trait LeaveTx: Send {
    async fn lock_employee(&mut self, id: u64) -> StoreResult<Option<Employee>>;

    async fn lock_request(&mut self, id: u64) -> StoreResult<Option<LeaveRequest>>;

    /// First pending or approved request of the employee whose range
    /// intersects `[start, end]`, ignoring `exclude`.
    async fn find_overlapping(
        &mut self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<u64>,
    ) -> StoreResult<Option<u64>>;

    /// Returns the new request id.
    async fn insert_request(&mut self, request: &LeaveRequest) -> StoreResult<u64>;

    async fn update_request(&mut self, request: &LeaveRequest) -> StoreResult<()>;

    async fn set_leave_credits(&mut self, employee_id: u64, credits: f64) -> StoreResult<()>;

    async fn approved_ranges(&mut self, employee_id: u64)
    -> StoreResult<Vec<(NaiveDate, NaiveDate)>>;

    async fn set_employee_status(
        &mut self,
        employee_id: u64,
        status: EmployeeStatus,
    ) -> StoreResult<()>;

    async fn record_audit(&mut self, entry: &AuditEntry) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

#[async_trait]
pub trait AutomationStore: Send + Sync {
    async fn find_rule(&self, id: u64) -> StoreResult<Option<AutomationRule>>;

    async fn active_rules(&self) -> StoreResult<Vec<AutomationRule>>;

    /// Flips `is_active` under a row lock and returns the updated rule.
    async fn flip_rule_active(&self, id: u64, actor_id: u64) -> StoreResult<Option<AutomationRule>>;

    /// Inserts the task (and its audit row when an actor is known) atomically.
    async fn insert_task(&self, task: &GeneratedTask, actor_id: Option<u64>) -> StoreResult<u64>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<u64>;
}

/// Identity collaborator: who currently holds a role.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn holders(&self, role: Role) -> StoreResult<Vec<u64>>;
}
