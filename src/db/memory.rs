use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::error::{AppError, AppResult};
use crate::models::{ContentKind, Snapshot, User};

use super::{LikeToggle, Repository, UserUpdate};

/// Repository holding everything in process memory
///
/// Used by tests and by callers that load data themselves.
#[derive(Default)]
pub struct InMemoryRepository {
    current: RwLock<Arc<Snapshot>>,
    write_lock: Mutex<()>,
}

impl InMemoryRepository {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait::async_trait]
impl Repository for InMemoryRepository {
    async fn snapshot(&self) -> AppResult<Arc<Snapshot>> {
        Ok(self.current.read().await.clone())
    }

    async fn apply_user_register(&self, user: User) -> AppResult<User> {
        let _guard = self.write_lock.lock().await;
        let current = self.current.read().await.clone();
        if let Some(existing) = current.user(&user.user_id) {
            return Ok(existing.clone());
        }

        let mut next = current.next();
        next.register_user(user.clone());
        *self.current.write().await = Arc::new(next);
        Ok(user)
    }

    async fn apply_user_update(&self, user_id: &str, update: UserUpdate) -> AppResult<User> {
        let _guard = self.write_lock.lock().await;
        let mut next = self.current.read().await.next();
        let user = next
            .update_user(user_id, update)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;

        *self.current.write().await = Arc::new(next);
        Ok(user)
    }

    async fn apply_like_toggle(
        &self,
        user_id: &str,
        item_id: &str,
        kind: ContentKind,
    ) -> AppResult<LikeToggle> {
        let _guard = self.write_lock.lock().await;
        let mut next = self.current.read().await.next();
        let liked = next.toggle_like(user_id, item_id, kind);

        let snapshot = Arc::new(next);
        *self.current.write().await = snapshot.clone();
        Ok(LikeToggle { liked, snapshot })
    }
}
