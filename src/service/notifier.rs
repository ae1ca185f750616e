use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::model::notification::{Notification, NotificationKind, TargetTable};
use crate::model::role::Role;
use crate::store::{NotificationStore, RoleDirectory};

#[derive(Debug, Clone)]
pub enum Recipients {
    User(u64),
    Roles(Vec<Role>),
}

#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub target_table: TargetTable,
    pub target_id: u64,
    /// User who caused the event; never notified about their own action.
    pub actor_id: Option<u64>,
}

/// Best-effort fan-out. Runs after the originating transaction committed, so
/// nothing here can fail the caller.
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn NotificationStore>,
    directory: Arc<dyn RoleDirectory>,
}

impl Notifier {
    pub fn new(store: Arc<dyn NotificationStore>, directory: Arc<dyn RoleDirectory>) -> Self {
        Self { store, directory }
    }

    /// Returns how many notifications were written.
    pub async fn notify(&self, recipients: Recipients, event: NotificationEvent) -> usize {
        let ids = match self.resolve(&recipients).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, kind = %event.kind, ?recipients, "Could not resolve notification recipients");
                return 0;
            }
        };

        let mut written = 0;
        for recipient_id in ids {
            if Some(recipient_id) == event.actor_id {
                continue;
            }
            let notification = Notification {
                recipient_id,
                kind: event.kind,
                title: event.title.clone(),
                message: event.message.clone(),
                target_table: event.target_table,
                target_id: event.target_id,
            };
            match self.store.insert_notification(&notification).await {
                Ok(_) => written += 1,
                Err(e) => warn!(
                    error = %e,
                    recipient_id,
                    kind = %event.kind,
                    target_id = event.target_id,
                    "Failed to write notification"
                ),
            }
        }

        debug!(kind = %event.kind, written, "Notifications dispatched");
        written
    }

    async fn resolve(&self, recipients: &Recipients) -> Result<Vec<u64>, ServiceError> {
        let mut ids = match recipients {
            Recipients::User(id) => vec![*id],
            Recipients::Roles(roles) => {
                let mut ids = Vec::new();
                for role in roles {
                    ids.extend(self.directory.holders(*role).await?);
                }
                ids
            }
        };
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}
