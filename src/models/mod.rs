use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub mod genres;
pub mod item;
pub mod like;
pub mod snapshot;
pub mod user;

pub use genres::GenreSet;
pub use item::{Catalog, Item};
pub use like::LikeEvent;
pub use snapshot::Snapshot;
pub use user::User;

/// Content category partitioning catalogs, likes and favorite genres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Film,
    Music,
    Book,
}

impl ContentKind {
    /// All kinds in display order
    pub const ALL: [ContentKind; 3] = [ContentKind::Film, ContentKind::Music, ContentKind::Book];

    /// Tag stored in the `type` column of the like log
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Film => "film",
            ContentKind::Music => "music",
            ContentKind::Book => "book",
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "film" | "films" => Ok(ContentKind::Film),
            "music" => Ok(ContentKind::Music),
            "book" | "books" => Ok(ContentKind::Book),
            other => Err(format!("unknown content kind '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_display() {
        assert_eq!(format!("{}", ContentKind::Film), "film");
        assert_eq!(format!("{}", ContentKind::Music), "music");
        assert_eq!(format!("{}", ContentKind::Book), "book");
    }

    #[test]
    fn test_content_kind_from_str_accepts_plural_paths() {
        assert_eq!("films".parse::<ContentKind>(), Ok(ContentKind::Film));
        assert_eq!("Books".parse::<ContentKind>(), Ok(ContentKind::Book));
        assert_eq!(" music ".parse::<ContentKind>(), Ok(ContentKind::Music));
        assert!("podcast".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_content_kind_serde() {
        let json = serde_json::to_string(&ContentKind::Music).unwrap();
        assert_eq!(json, r#""music""#);

        let deserialized: ContentKind = serde_json::from_str(r#""book""#).unwrap();
        assert_eq!(deserialized, ContentKind::Book);
    }
}
