//! Storage abstraction for catalogs, the user roster and the like log
//!
//! The recommendation core only ever sees [`Snapshot`]s handed out by a
//! repository. Every write publishes a new snapshot and returns it, so callers
//! never read stale state after their own mutation.

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Catalog, ContentKind, LikeEvent, Snapshot, User},
};

pub mod flat_file;
pub mod memory;

pub use flat_file::CsvRepository;
pub use memory::InMemoryRepository;

/// Edit applied to a stored user record
pub type UserUpdate = Box<dyn FnOnce(&mut User) + Send>;

/// Outcome of flipping a like
#[derive(Debug, Clone)]
pub struct LikeToggle {
    /// Like state after the toggle
    pub liked: bool,
    pub snapshot: Arc<Snapshot>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Repository: Send + Sync {
    /// Current snapshot of the whole dataset
    async fn snapshot(&self) -> AppResult<Arc<Snapshot>>;

    /// Registers `user` unless the id is already on the roster
    ///
    /// Returns the stored record, which is the existing one when the id was
    /// taken. The check and the insert happen under the write lock.
    async fn apply_user_register(&self, user: User) -> AppResult<User>;

    /// Edits the stored record for `user_id` under the write lock
    ///
    /// Fails with [`AppError::NotFound`](crate::error::AppError::NotFound) for
    /// an unknown id.
    async fn apply_user_update(&self, user_id: &str, update: UserUpdate) -> AppResult<User>;

    /// Flips the like state for `(user_id, item_id, kind)`
    async fn apply_like_toggle(
        &self,
        user_id: &str,
        item_id: &str,
        kind: ContentKind,
    ) -> AppResult<LikeToggle>;

    async fn get_catalog(&self, kind: ContentKind) -> AppResult<Catalog> {
        Ok(self.snapshot().await?.catalog(kind).clone())
    }

    async fn get_users(&self) -> AppResult<Vec<User>> {
        Ok(self.snapshot().await?.users.clone())
    }

    async fn get_like_events(&self) -> AppResult<Vec<LikeEvent>> {
        Ok(self.snapshot().await?.likes.clone())
    }
}
