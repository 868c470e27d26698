use serde::{Deserialize, Serialize};

use super::{ContentKind, GenreSet};

/// A registered user and their declared taste
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Normalized email address
    pub user_id: String,
    pub name: String,
    pub grade: String,
    #[serde(default)]
    pub favorite_genres_films: GenreSet,
    #[serde(default)]
    pub favorite_genres_music: GenreSet,
    #[serde(default)]
    pub favorite_genres_books: GenreSet,
}

/// Normalizes a sign-in email into a user id
pub fn normalize_user_id(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a user with no favorite genres
    ///
    /// A blank name falls back to the local part of the email.
    pub fn new(user_id: impl Into<String>, name: &str, grade: &str) -> Self {
        let user_id = user_id.into();
        let name = match name.trim() {
            "" => user_id.split('@').next().unwrap_or_default().to_string(),
            name => name.to_string(),
        };

        Self {
            user_id,
            name,
            grade: grade.trim().to_string(),
            favorite_genres_films: GenreSet::default(),
            favorite_genres_music: GenreSet::default(),
            favorite_genres_books: GenreSet::default(),
        }
    }

    /// Favorite genres for one kind
    pub fn favorites(&self, kind: ContentKind) -> &GenreSet {
        match kind {
            ContentKind::Film => &self.favorite_genres_films,
            ContentKind::Music => &self.favorite_genres_music,
            ContentKind::Book => &self.favorite_genres_books,
        }
    }

    /// Replaces the favorite genres for one kind
    pub fn set_favorites(&mut self, kind: ContentKind, genres: GenreSet) {
        match kind {
            ContentKind::Film => self.favorite_genres_films = genres,
            ContentKind::Music => self.favorite_genres_music = genres,
            ContentKind::Book => self.favorite_genres_books = genres,
        }
    }
}
