use serde::{Deserialize, Serialize};

use super::ContentKind;

/// Value of an active like record
pub const LIKE: i32 = 1;

/// One row of the like log
///
/// Only `value == 1` counts as a like; there is no explicit dislike.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LikeEvent {
    pub user_id: String,
    pub item_id: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub value: i32,
}

impl LikeEvent {
    /// Creates an active like
    pub fn like(user_id: impl Into<String>, item_id: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            kind,
            value: LIKE,
        }
    }

    pub fn is_active(&self) -> bool {
        self.value == LIKE
    }

    /// Whether this record belongs to the given (user, item, kind) triple
    pub fn matches(&self, user_id: &str, item_id: &str, kind: ContentKind) -> bool {
        self.kind == kind && self.user_id == user_id && self.item_id == item_id
    }
}
