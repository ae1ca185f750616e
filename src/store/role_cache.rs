use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::error::ServiceError;
use crate::model::role::Role;
use crate::store::{RoleDirectory, StoreResult};

/// Role holder lookups cached for a short TTL, so every leave submission does
/// not query the users table for the approver list.
pub struct CachedRoleDirectory {
    inner: Arc<dyn RoleDirectory>,
    cache: Cache<Role, Arc<Vec<u64>>>,
}

impl CachedRoleDirectory {
    pub fn new(inner: Arc<dyn RoleDirectory>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(64) // one entry per role
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl RoleDirectory for CachedRoleDirectory {
    async fn holders(&self, role: Role) -> StoreResult<Vec<u64>> {
        let inner = Arc::clone(&self.inner);
        let ids = self
            .cache
            .try_get_with(role, async move { inner.holders(role).await.map(Arc::new) })
            .await
            .map_err(|e: Arc<ServiceError>| ServiceError::Storage(e.to_string()))?;
        Ok(ids.as_ref().clone())
    }
}
