//! Shared fixtures for service and handler tests.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use jsonwebtoken::{EncodingKey, Header, encode};

use crate::auth::jwt::Claims;
use crate::config::Config;

use crate::model::automation_rule::{AutomationRule, DayOfWeek, ScheduleType, TaskPriority};
use crate::model::employee::{Employee, EmployeeStatus};
use crate::model::role::Role;
use crate::service::automation::AutomationService;
use crate::service::leave::LeaveService;
use crate::service::notifier::Notifier;
use crate::state::AppState;
use crate::store::memory::MemoryStore;
use crate::utils::clock::FixedClock;

pub const ADMIN_USER: u64 = 100;
pub const HR_USER: u64 = 101;
pub const TEST_SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    Config {
        database_url: "mysql://unused".into(),
        jwt_secret: TEST_SECRET.into(),
        server_addr: "127.0.0.1:0".into(),
        api_prefix: "/api".into(),
        rate_protected_per_min: 1000,
        db_max_connections: 1,
        role_cache_ttl_secs: 60,
        log_dir: "logs".into(),
        log_level: "debug".into(),
        leave_approver_roles: vec![Role::Admin, Role::Hr],
    }
}

/// Signs an HS256 token valid for an hour.
pub fn sign_token(user_id: u64, role_id: u8, employee_id: Option<u64>, secret: &str) -> String {
    let claims = Claims {
        user_id,
        sub: format!("user{}", user_id),
        role: role_id,
        exp: chrono::Utc::now().timestamp() as usize + 3600,
        employee_id,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn employee(id: u64, hire_date: NaiveDate, leave_credits: f64) -> Employee {
    Employee {
        id,
        employee_code: format!("EMP-{:03}", id),
        first_name: "Ana".into(),
        last_name: format!("Reyes{}", id),
        hire_date,
        leave_credits,
        status: EmployeeStatus::Active,
    }
}

pub fn rule(id: u64, schedule_type: ScheduleType, days: &[DayOfWeek]) -> AutomationRule {
    AutomationRule {
        id,
        client_id: 12,
        title_template: "Weekly report {date}".into(),
        description_template: Some("Prepare the {weekday} batch".into()),
        assigned_to: 7,
        priority: TaskPriority::Medium,
        schedule_type,
        days_of_week: days.iter().copied().collect::<BTreeSet<_>>(),
        start_date: None,
        end_date: None,
        is_active: true,
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub leave: Arc<LeaveService>,
    pub automation: Arc<AutomationService>,
}

impl Harness {
    /// Memory store with one admin and one HR user, clock pinned to `today`.
    pub async fn new(today: NaiveDate) -> Self {
        let store = Arc::new(MemoryStore::new());
        store.set_role_holders(Role::Admin, vec![ADMIN_USER]).await;
        store.set_role_holders(Role::Hr, vec![HR_USER]).await;

        let clock = Arc::new(FixedClock::new(today));
        let notifier = Notifier::new(store.clone(), store.clone());
        let leave = LeaveService::new(
            store.clone(),
            notifier.clone(),
            clock.clone(),
            vec![Role::Admin, Role::Hr],
        );
        let automation = AutomationService::new(store.clone(), notifier, clock.clone());

        Self {
            store,
            clock,
            leave: Arc::new(leave),
            automation: Arc::new(automation),
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            leave: Arc::clone(&self.leave),
            automation: Arc::clone(&self.automation),
        }
    }
}
