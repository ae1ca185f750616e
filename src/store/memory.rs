//! In-process store for tests. Transactions take one global lock and work on a
//! staged copy that replaces the shared state only on commit.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::ServiceError;
use crate::model::audit_log::{AuditAction, AuditEntry};
use crate::model::automation_rule::AutomationRule;
use crate::model::employee::{Employee, EmployeeStatus};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::notification::{Notification, TargetTable};
use crate::model::role::Role;
use crate::model::task::GeneratedTask;
use crate::store::{
    AutomationStore, LeaveStore, LeaveTx, NotificationStore, RoleDirectory, StoreResult,
};
use crate::utils::calendar::ranges_overlap;

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub employees: BTreeMap<u64, Employee>,
    pub requests: BTreeMap<u64, LeaveRequest>,
    pub rules: BTreeMap<u64, AutomationRule>,
    pub tasks: Vec<GeneratedTask>,
    pub notifications: Vec<Notification>,
    pub audit: Vec<AuditEntry>,
    pub role_holders: HashMap<Role, Vec<u64>>,
    next_id: u64,
}

impl MemoryState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_notifications: AtomicBool,
    fail_audit: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_employee(&self, employee: Employee) {
        self.state
            .lock()
            .await
            .employees
            .insert(employee.id, employee);
    }

    pub async fn put_rule(&self, rule: AutomationRule) {
        self.state.lock().await.rules.insert(rule.id, rule);
    }

    pub async fn set_role_holders(&self, role: Role, ids: Vec<u64>) {
        self.state.lock().await.role_holders.insert(role, ids);
    }

    /// Makes every notification write fail, to exercise best-effort dispatch.
    pub fn fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    /// Makes audit writes inside leave transactions fail, forcing a rollback.
    pub fn fail_audit(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    pub async fn employee(&self, id: u64) -> Employee {
        self.state.lock().await.employees[&id].clone()
    }
}

pub struct MemoryLeaveTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    fail_audit: bool,
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn LeaveTx>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryLeaveTx {
            guard,
            staged,
            fail_audit: self.fail_audit.load(Ordering::SeqCst),
        }))
    }

    async fn find_request(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        Ok(self.state.lock().await.requests.get(&id).cloned())
    }

    async fn find_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.state.lock().await.employees.get(&id).cloned())
    }

    async fn list_requests(
        &self,
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> StoreResult<Vec<LeaveRequest>> {
        Ok(self
            .state
            .lock()
            .await
            .requests
            .values()
            .rev()
            .filter(|r| employee_id.is_none_or(|id| r.employee_id == id))
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LeaveTx for MemoryLeaveTx {
    async fn lock_employee(&mut self, id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.staged.employees.get(&id).cloned())
    }

    async fn lock_request(&mut self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        Ok(self.staged.requests.get(&id).cloned())
    }

    async fn find_overlapping(
        &mut self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<u64>,
    ) -> StoreResult<Option<u64>> {
        Ok(self
            .staged
            .requests
            .values()
            .filter(|r| r.employee_id == employee_id && r.status.holds_dates())
            .filter(|r| Some(r.id) != exclude)
            .find(|r| ranges_overlap(r.start_date, r.end_date, start, end))
            .map(|r| r.id))
    }

    async fn insert_request(&mut self, request: &LeaveRequest) -> StoreResult<u64> {
        let id = self.staged.allocate_id();
        let mut stored = request.clone();
        stored.id = id;
        self.staged.requests.insert(id, stored);
        Ok(id)
    }

    async fn update_request(&mut self, request: &LeaveRequest) -> StoreResult<()> {
        self.staged.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn set_leave_credits(&mut self, employee_id: u64, credits: f64) -> StoreResult<()> {
        if let Some(e) = self.staged.employees.get_mut(&employee_id) {
            e.leave_credits = credits;
        }
        Ok(())
    }

    async fn approved_ranges(
        &mut self,
        employee_id: u64,
    ) -> StoreResult<Vec<(NaiveDate, NaiveDate)>> {
        Ok(self
            .staged
            .requests
            .values()
            .filter(|r| r.employee_id == employee_id)
            .filter(|r| r.status == LeaveStatus::Approved)
            .map(|r| (r.start_date, r.end_date))
            .collect())
    }

    async fn set_employee_status(
        &mut self,
        employee_id: u64,
        status: EmployeeStatus,
    ) -> StoreResult<()> {
        if let Some(e) = self.staged.employees.get_mut(&employee_id) {
            e.status = status;
        }
        Ok(())
    }

    async fn record_audit(&mut self, entry: &AuditEntry) -> StoreResult<()> {
        if self.fail_audit {
            return Err(ServiceError::Storage("audit_logs insert failed".into()));
        }
        self.staged.audit.push(entry.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryLeaveTx {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl AutomationStore for MemoryStore {
    async fn find_rule(&self, id: u64) -> StoreResult<Option<AutomationRule>> {
        Ok(self.state.lock().await.rules.get(&id).cloned())
    }

    async fn active_rules(&self) -> StoreResult<Vec<AutomationRule>> {
        Ok(self
            .state
            .lock()
            .await
            .rules
            .values()
            .filter(|r| r.is_active)
            .cloned()
            .collect())
    }

    async fn flip_rule_active(&self, id: u64, actor_id: u64) -> StoreResult<Option<AutomationRule>> {
        let mut state = self.state.lock().await;
        let Some(rule) = state.rules.get_mut(&id) else {
            return Ok(None);
        };
        rule.is_active = !rule.is_active;
        let updated = rule.clone();
        state.audit.push(AuditEntry::new(
            actor_id,
            AuditAction::ToggleAutomationRule,
            TargetTable::AutomationRules,
            id,
        ));
        Ok(Some(updated))
    }

    async fn insert_task(&self, task: &GeneratedTask, actor_id: Option<u64>) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let id = state.allocate_id();
        let mut stored = task.clone();
        stored.id = id;
        state.tasks.push(stored);
        if let (Some(actor_id), Some(rule_id)) = (actor_id, task.rule_id) {
            state.audit.push(AuditEntry::new(
                actor_id,
                AuditAction::RunAutomationRule,
                TargetTable::AutomationRules,
                rule_id,
            ));
        }
        Ok(id)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<u64> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(ServiceError::Storage("notifications table is read-only".into()));
        }
        let mut state = self.state.lock().await;
        state.notifications.push(notification.clone());
        Ok(state.notifications.len() as u64)
    }
}

#[async_trait]
impl RoleDirectory for MemoryStore {
    async fn holders(&self, role: Role) -> StoreResult<Vec<u64>> {
        Ok(self
            .state
            .lock()
            .await
            .role_holders
            .get(&role)
            .cloned()
            .unwrap_or_default())
    }
}
