use serde::{Deserialize, Serialize};

use super::{ContentKind, GenreSet};

/// A film, album or book in one of the catalogs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// Identifier, unique within its catalog
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub genres: GenreSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Set for music
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Set for books
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Item {
    /// Creates an item with no optional attributes
    pub fn new(id: impl Into<String>, title: impl Into<String>, genres: &str) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            genres: GenreSet::parse(genres),
            year: None,
            artist: None,
            author: None,
        }
    }
}

/// Ordered, read-only list of items for one content kind
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Catalog {
    pub kind: ContentKind,
    pub items: Vec<Item>,
    /// Whether the source data carries a genre attribute at all
    pub has_genres: bool,
}

impl Catalog {
    pub fn new(kind: ContentKind, items: Vec<Item>) -> Self {
        Self {
            kind,
            items,
            has_genres: true,
        }
    }

    /// Catalog whose source has no genre attribute
    pub fn without_genres(kind: ContentKind, items: Vec<Item>) -> Self {
        Self {
            kind,
            items,
            has_genres: false,
        }
    }

    pub fn empty(kind: ContentKind) -> Self {
        Self::without_genres(kind, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.get(item_id).is_some()
    }

    /// Sorted union of every genre tag used in the catalog
    pub fn genre_vocabulary(&self) -> Vec<String> {
        let all: GenreSet = self
            .items
            .iter()
            .flat_map(|item| item.genres.iter().cloned())
            .collect();
        all.iter().cloned().collect()
    }
}
