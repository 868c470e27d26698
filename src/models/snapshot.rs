use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use super::{Catalog, ContentKind, LikeEvent, User};

/// Item ids a user actively likes for one kind
pub type LikeSet = BTreeSet<String>;

/// Immutable view of the whole dataset
///
/// Readers hold an `Arc<Snapshot>`; writes never mutate a published snapshot.
/// Instead the repository builds the next one with [`Snapshot::next`] and
/// swaps it in.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub films: Catalog,
    pub music: Catalog,
    pub books: Catalog,
    /// Roster in storage order
    pub users: Vec<User>,
    pub likes: Vec<LikeEvent>,
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            films: Catalog::empty(ContentKind::Film),
            music: Catalog::empty(ContentKind::Music),
            books: Catalog::empty(ContentKind::Book),
            users: Vec::new(),
            likes: Vec::new(),
            version: 0,
            loaded_at: Utc::now(),
        }
    }
}

impl Snapshot {
    pub fn new(catalogs: Vec<Catalog>, users: Vec<User>, likes: Vec<LikeEvent>) -> Self {
        let mut snapshot = Self {
            users,
            likes,
            ..Self::default()
        };
        for catalog in catalogs {
            let kind = catalog.kind;
            *snapshot.catalog_mut(kind) = catalog;
        }
        snapshot
    }

    pub fn catalog(&self, kind: ContentKind) -> &Catalog {
        match kind {
            ContentKind::Film => &self.films,
            ContentKind::Music => &self.music,
            ContentKind::Book => &self.books,
        }
    }

    fn catalog_mut(&mut self, kind: ContentKind) -> &mut Catalog {
        match kind {
            ContentKind::Film => &mut self.films,
            ContentKind::Music => &mut self.music,
            ContentKind::Book => &mut self.books,
        }
    }

    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.user_id == user_id)
    }

    /// Item ids with an active like for `(user_id, kind)`
    pub fn like_set(&self, user_id: &str, kind: ContentKind) -> LikeSet {
        self.likes
            .iter()
            .filter(|event| event.kind == kind && event.user_id == user_id && event.is_active())
            .map(|event| event.item_id.clone())
            .collect()
    }

    pub fn is_liked(&self, user_id: &str, item_id: &str, kind: ContentKind) -> bool {
        self.likes
            .iter()
            .any(|event| event.matches(user_id, item_id, kind) && event.is_active())
    }

    /// Unique user ids in roster order
    pub fn roster(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.users
            .iter()
            .map(|user| user.user_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Copy of this snapshot stamped as the next version
    pub fn next(&self) -> Self {
        Self {
            version: self.version + 1,
            loaded_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Appends the user unless the id is already on the roster
    ///
    /// Returns whether the roster changed.
    pub fn register_user(&mut self, user: User) -> bool {
        if self.user(&user.user_id).is_some() {
            return false;
        }
        self.users.push(user);
        true
    }

    /// Applies `update` to the stored record for `user_id`
    pub fn update_user(
        &mut self,
        user_id: &str,
        update: impl FnOnce(&mut User),
    ) -> Option<&User> {
        let user = self.users.iter_mut().find(|u| u.user_id == user_id)?;
        update(user);
        Some(&*user)
    }

    /// Flips the like state for the triple and returns the new state
    ///
    /// An active like removes every record for the triple; otherwise a new
    /// active record is appended.
    pub fn toggle_like(&mut self, user_id: &str, item_id: &str, kind: ContentKind) -> bool {
        if self.is_liked(user_id, item_id, kind) {
            self.likes
                .retain(|event| !event.matches(user_id, item_id, kind));
            false
        } else {
            self.likes.push(LikeEvent::like(user_id, item_id, kind));
            true
        }
    }
}
