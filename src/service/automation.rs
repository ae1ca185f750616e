use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::model::automation_rule::{AutomationRule, DayOfWeek};
use crate::model::notification::{NotificationKind, TargetTable};
use crate::model::task::{GeneratedTask, TaskStatus};
use crate::service::notifier::{NotificationEvent, Notifier, Recipients};
use crate::store::AutomationStore;
use crate::utils::calendar::matches_schedule;
use crate::utils::clock::Clock;

/// Fills `{date}` and `{weekday}` placeholders for a task due on `date`.
pub fn render_template(template: &str, date: NaiveDate) -> String {
    template
        .replace("{date}", &date.format("%Y-%m-%d").to_string())
        .replace("{weekday}", DayOfWeek::from(date.weekday()).as_ref())
}

pub struct AutomationService {
    store: Arc<dyn AutomationStore>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

impl AutomationService {
    pub fn new(store: Arc<dyn AutomationStore>, notifier: Notifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// Default evaluation date for callers that do not pass one.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    async fn load(&self, rule_id: u64) -> Result<AutomationRule, ServiceError> {
        self.store
            .find_rule(rule_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("automation rule", rule_id))
    }

    /// Scheduled invocation. Inactive, expired or off-cadence rules produce nothing.
    pub async fn run(
        &self,
        rule_id: u64,
        as_of: NaiveDate,
        actor_id: Option<u64>,
    ) -> Result<Option<GeneratedTask>, ServiceError> {
        let rule = self.load(rule_id).await?;
        self.run_rule(&rule, as_of, actor_id).await
    }

    /// Forces one task due today, ignoring cadence and the active flag.
    pub async fn run_now(&self, rule_id: u64, actor_id: u64) -> Result<GeneratedTask, ServiceError> {
        let rule = self.load(rule_id).await?;
        let today = self.clock.today();
        ensure_not_expired(&rule, today)?;
        self.generate(&rule, today, Some(actor_id)).await
    }

    pub async fn toggle(&self, rule_id: u64, actor_id: u64) -> Result<AutomationRule, ServiceError> {
        let rule = self.load(rule_id).await?;
        ensure_not_expired(&rule, self.clock.today())?;

        let updated = self
            .store
            .flip_rule_active(rule_id, actor_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("automation rule", rule_id))?;

        info!(rule_id, is_active = updated.is_active, actor_id, "Automation rule toggled");
        Ok(updated)
    }

    /// Runs every active rule for `as_of`. A failing rule is logged and skipped.
    pub async fn run_due(&self, as_of: NaiveDate) -> Result<Vec<GeneratedTask>, ServiceError> {
        let rules = self.store.active_rules().await?;
        let mut generated = Vec::new();

        for rule in &rules {
            match self.run_rule(rule, as_of, None).await {
                Ok(Some(task)) => generated.push(task),
                Ok(None) => {}
                Err(e) => warn!(rule_id = rule.id, error = %e, "Automation rule run failed"),
            }
        }

        info!(
            %as_of,
            rules = rules.len(),
            generated = generated.len(),
            "Due automation rules processed"
        );
        Ok(generated)
    }

    async fn run_rule(
        &self,
        rule: &AutomationRule,
        as_of: NaiveDate,
        actor_id: Option<u64>,
    ) -> Result<Option<GeneratedTask>, ServiceError> {
        if !rule.is_active {
            debug!(rule_id = rule.id, "Skipping inactive rule");
            return Ok(None);
        }
        if rule.is_expired(self.clock.today()) {
            debug!(rule_id = rule.id, "Skipping expired rule");
            return Ok(None);
        }
        if !matches_schedule(as_of, rule) {
            debug!(rule_id = rule.id, %as_of, "Rule not scheduled for date");
            return Ok(None);
        }
        self.generate(rule, as_of, actor_id).await.map(Some)
    }

    async fn generate(
        &self,
        rule: &AutomationRule,
        due_date: NaiveDate,
        actor_id: Option<u64>,
    ) -> Result<GeneratedTask, ServiceError> {
        let mut task = GeneratedTask {
            id: 0,
            rule_id: Some(rule.id),
            client_id: Some(rule.client_id),
            title: render_template(&rule.title_template, due_date),
            description: rule
                .description_template
                .as_deref()
                .map(|t| render_template(t, due_date)),
            assigned_to: rule.assigned_to,
            priority: rule.priority,
            due_date,
            status: TaskStatus::Pending,
            is_automated: true,
            created_at: self.clock.now(),
        };
        task.id = self.store.insert_task(&task, actor_id).await?;

        info!(
            rule_id = rule.id,
            task_id = task.id,
            assigned_to = task.assigned_to,
            %due_date,
            "Automated task generated"
        );

        self.notifier
            .notify(
                Recipients::User(task.assigned_to),
                NotificationEvent {
                    kind: NotificationKind::TaskAssigned,
                    title: "New task assigned".into(),
                    message: format!("{} (due {})", task.title, task.due_date),
                    target_table: TargetTable::Tasks,
                    target_id: task.id,
                    actor_id,
                },
            )
            .await;

        Ok(task)
    }
}

fn ensure_not_expired(rule: &AutomationRule, today: NaiveDate) -> Result<(), ServiceError> {
    match rule.end_date {
        Some(end_date) if end_date < today => Err(ServiceError::RuleExpired {
            rule_id: rule.id,
            end_date,
        }),
        _ => Ok(()),
    }
}
