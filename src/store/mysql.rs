use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlConnection, MySqlPool, Row, Transaction};

use crate::model::audit_log::{AuditAction, AuditEntry};
use crate::model::automation_rule::{AutomationRule, DayOfWeek};
use crate::model::employee::{Employee, EmployeeStatus};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::notification::{Notification, TargetTable};
use crate::model::role::Role;
use crate::model::task::GeneratedTask;
use crate::store::{
    AutomationStore, LeaveStore, LeaveTx, NotificationStore, RoleDirectory, StoreResult,
};

const EMPLOYEE_COLUMNS: &str =
    "id, employee_code, first_name, last_name, hire_date, leave_credits, status";

const LEAVE_COLUMNS: &str = "id, employee_id, requested_by, start_date, end_date, reason, \
     requested_pay_type, pay_type, leave_days, credits_deducted, status, approved_by, \
     rejection_comment, attachment_ref, created_at, updated_at";

const RULE_COLUMNS: &str = "id, client_id, title_template, description_template, assigned_to, \
     priority, schedule_type, days_of_week, start_date, end_date, is_active";

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Reads a string column into one of the closed enums; unknown values are decode errors.
fn enum_column<T>(row: &MySqlRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = strum::ParseError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn employee_from_row(row: &MySqlRow) -> Result<Employee, sqlx::Error> {
    Ok(Employee {
        id: row.try_get("id")?,
        employee_code: row.try_get("employee_code")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        hire_date: row.try_get("hire_date")?,
        leave_credits: row.try_get("leave_credits")?,
        status: enum_column(row, "status")?,
    })
}

fn leave_from_row(row: &MySqlRow) -> Result<LeaveRequest, sqlx::Error> {
    Ok(LeaveRequest {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        requested_by: row.try_get("requested_by")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        reason: row.try_get("reason")?,
        requested_pay_type: enum_column(row, "requested_pay_type")?,
        pay_type: enum_column(row, "pay_type")?,
        leave_days: row.try_get("leave_days")?,
        credits_deducted: row.try_get("credits_deducted")?,
        status: enum_column(row, "status")?,
        approved_by: row.try_get("approved_by")?,
        rejection_comment: row.try_get("rejection_comment")?,
        attachment_ref: row.try_get("attachment_ref")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn rule_from_row(row: &MySqlRow) -> Result<AutomationRule, sqlx::Error> {
    let days: Option<String> = row.try_get("days_of_week")?;
    let days_of_week = DayOfWeek::parse_set(days.as_deref().unwrap_or_default()).map_err(|e| {
        sqlx::Error::ColumnDecode {
            index: "days_of_week".to_string(),
            source: Box::new(e),
        }
    })?;

    Ok(AutomationRule {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        title_template: row.try_get("title_template")?,
        description_template: row.try_get("description_template")?,
        assigned_to: row.try_get("assigned_to")?,
        priority: enum_column(row, "priority")?,
        schedule_type: enum_column(row, "schedule_type")?,
        days_of_week,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        is_active: row.try_get("is_active")?,
    })
}

async fn write_audit(conn: &mut MySqlConnection, entry: &AuditEntry) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (user_id, action, target_table, target_id)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.action.as_ref())
    .bind(entry.target_table.as_ref())
    .bind(entry.target_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub struct MySqlLeaveTx {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn begin(&self) -> StoreResult<Box<dyn LeaveTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlLeaveTx { tx }))
    }

    async fn find_request(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {} FROM leave_requests WHERE id = ?", LEAVE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(leave_from_row).transpose()?)
    }

    async fn find_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(employee_from_row).transpose()?)
    }

    async fn list_requests(
        &self,
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> StoreResult<Vec<LeaveRequest>> {
        let mut sql = format!("SELECT {} FROM leave_requests WHERE 1 = 1", LEAVE_COLUMNS);
        if employee_id.is_some() {
            sql.push_str(" AND employee_id = ?");
        }
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut query = sqlx::query(&sql);
        if let Some(id) = employee_id {
            query = query.bind(id);
        }
        if let Some(status) = status {
            query = query.bind(status.to_string());
        }

        let rows = query.fetch_all(&self.pool).await?;
        let requests = rows
            .iter()
            .map(leave_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(requests)
    }
}

#[async_trait]
impl LeaveTx for MySqlLeaveTx {
    async fn lock_employee(&mut self, id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!(
            "SELECT {} FROM employees WHERE id = ? FOR UPDATE",
            EMPLOYEE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.as_ref().map(employee_from_row).transpose()?)
    }

    async fn lock_request(&mut self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let sql = format!(
            "SELECT {} FROM leave_requests WHERE id = ? FOR UPDATE",
            LEAVE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.as_ref().map(leave_from_row).transpose()?)
    }

    async fn find_overlapping(
        &mut self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<u64>,
    ) -> StoreResult<Option<u64>> {
        let mut sql = String::from(
            r#"
            SELECT id FROM leave_requests
            WHERE employee_id = ?
              AND status IN ('pending', 'approved')
              AND start_date <= ?
              AND end_date >= ?
            "#,
        );
        if exclude.is_some() {
            sql.push_str(" AND id <> ?");
        }
        sql.push_str(" ORDER BY id LIMIT 1");

        let mut query = sqlx::query_scalar::<_, u64>(&sql)
            .bind(employee_id)
            .bind(end)
            .bind(start);
        if let Some(id) = exclude {
            query = query.bind(id);
        }

        Ok(query.fetch_optional(&mut *self.tx).await?)
    }

    async fn insert_request(&mut self, r: &LeaveRequest) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, requested_by, start_date, end_date, reason, requested_pay_type,
                 pay_type, leave_days, credits_deducted, status, attachment_ref,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(r.employee_id)
        .bind(r.requested_by)
        .bind(r.start_date)
        .bind(r.end_date)
        .bind(&r.reason)
        .bind(r.requested_pay_type.as_ref())
        .bind(r.pay_type.as_ref())
        .bind(r.leave_days)
        .bind(r.credits_deducted)
        .bind(r.status.as_ref())
        .bind(&r.attachment_ref)
        .bind(r.created_at)
        .bind(r.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn update_request(&mut self, r: &LeaveRequest) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE leave_requests
            SET start_date = ?, end_date = ?, reason = ?, requested_pay_type = ?,
                pay_type = ?, leave_days = ?, credits_deducted = ?, status = ?,
                approved_by = ?, rejection_comment = ?, attachment_ref = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(r.start_date)
        .bind(r.end_date)
        .bind(&r.reason)
        .bind(r.requested_pay_type.as_ref())
        .bind(r.pay_type.as_ref())
        .bind(r.leave_days)
        .bind(r.credits_deducted)
        .bind(r.status.as_ref())
        .bind(r.approved_by)
        .bind(&r.rejection_comment)
        .bind(&r.attachment_ref)
        .bind(r.updated_at)
        .bind(r.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn set_leave_credits(&mut self, employee_id: u64, credits: f64) -> StoreResult<()> {
        sqlx::query("UPDATE employees SET leave_credits = ? WHERE id = ?")
            .bind(credits)
            .bind(employee_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn approved_ranges(
        &mut self,
        employee_id: u64,
    ) -> StoreResult<Vec<(NaiveDate, NaiveDate)>> {
        let rows = sqlx::query_as::<_, (NaiveDate, NaiveDate)>(
            r#"
            SELECT start_date, end_date FROM leave_requests
            WHERE employee_id = ? AND status = 'approved'
            "#,
        )
        .bind(employee_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn set_employee_status(
        &mut self,
        employee_id: u64,
        status: EmployeeStatus,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE employees SET status = ? WHERE id = ?")
            .bind(status.as_ref())
            .bind(employee_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn record_audit(&mut self, entry: &AuditEntry) -> StoreResult<()> {
        write_audit(&mut self.tx, entry).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl AutomationStore for MySqlStore {
    async fn find_rule(&self, id: u64) -> StoreResult<Option<AutomationRule>> {
        let sql = format!("SELECT {} FROM automation_rules WHERE id = ?", RULE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(rule_from_row).transpose()?)
    }

    async fn active_rules(&self) -> StoreResult<Vec<AutomationRule>> {
        let sql = format!(
            "SELECT {} FROM automation_rules WHERE is_active = TRUE ORDER BY id",
            RULE_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let rules = rows
            .iter()
            .map(rule_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    async fn flip_rule_active(&self, id: u64, actor_id: u64) -> StoreResult<Option<AutomationRule>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM automation_rules WHERE id = ? FOR UPDATE",
            RULE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(mut rule) = row.as_ref().map(rule_from_row).transpose()? else {
            return Ok(None);
        };

        rule.is_active = !rule.is_active;
        sqlx::query("UPDATE automation_rules SET is_active = ? WHERE id = ?")
            .bind(rule.is_active)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        write_audit(
            &mut tx,
            &AuditEntry::new(
                actor_id,
                AuditAction::ToggleAutomationRule,
                TargetTable::AutomationRules,
                id,
            ),
        )
        .await?;

        tx.commit().await?;
        Ok(Some(rule))
    }

    async fn insert_task(&self, task: &GeneratedTask, actor_id: Option<u64>) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO tasks
                (rule_id, client_id, title, description, assigned_to, priority, due_date,
                 status, is_automated, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.rule_id)
        .bind(task.client_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.assigned_to)
        .bind(task.priority.as_ref())
        .bind(task.due_date)
        .bind(task.status.as_ref())
        .bind(task.is_automated)
        .bind(task.created_at)
        .execute(&mut *tx)
        .await?;
        let task_id = result.last_insert_id();

        if let (Some(actor_id), Some(rule_id)) = (actor_id, task.rule_id) {
            write_audit(
                &mut tx,
                &AuditEntry::new(
                    actor_id,
                    AuditAction::RunAutomationRule,
                    TargetTable::AutomationRules,
                    rule_id,
                ),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(task_id)
    }
}

#[async_trait]
impl NotificationStore for MySqlStore {
    async fn insert_notification(&self, n: &Notification) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, type, title, message, target_table, target_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(n.recipient_id)
        .bind(n.kind.as_ref())
        .bind(&n.title)
        .bind(&n.message)
        .bind(n.target_table.as_ref())
        .bind(n.target_id)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id())
    }
}

#[async_trait]
impl RoleDirectory for MySqlStore {
    async fn holders(&self, role: Role) -> StoreResult<Vec<u64>> {
        let ids = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM users WHERE role_id = ? AND is_active = TRUE ORDER BY id",
        )
        .bind(role.id())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
