use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::error::{AppError, AppResult};
use crate::models::{Catalog, ContentKind, GenreSet, Item, LikeEvent, Snapshot, User};

use super::{LikeToggle, Repository, UserUpdate};

pub const USERS_FILE: &str = "users.csv";
pub const LIKES_FILE: &str = "ratings.csv";

const USER_HEADERS: [&str; 6] = [
    "user_id",
    "name",
    "grade",
    "favorite_genres_films",
    "favorite_genres_music",
    "favorite_genres_books",
];
const LIKE_HEADERS: [&str; 4] = ["user_id", "item_id", "type", "value"];

/// Catalog file name for a content kind
pub fn catalog_file(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Film => "items_films.csv",
        ContentKind::Music => "items_music.csv",
        ContentKind::Book => "items_books.csv",
    }
}

/// Catalog row; the optional columns differ per catalog
#[derive(Debug, Deserialize)]
struct ItemRecord {
    id: String,
    title: String,
    #[serde(default)]
    genres: Option<String>,
    #[serde(default, deserialize_with = "lenient_year")]
    year: Option<i32>,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    author: Option<String>,
}

/// Reads `2016`, `2016.0` or a blank cell; anything else counts as unknown
fn lenient_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(str::trim).and_then(parse_year))
}

fn parse_year(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|year| year.is_finite() && year.fract() == 0.0)
            .map(|year| year as i32)
    })
}

impl From<ItemRecord> for Item {
    fn from(record: ItemRecord) -> Self {
        Item {
            id: record.id,
            title: record.title,
            genres: GenreSet::parse(record.genres.as_deref().unwrap_or_default()),
            year: record.year,
            artist: record.artist,
            author: record.author,
        }
    }
}

/// Roster row with genre sets in their comma-separated form
#[derive(Debug, Serialize, Deserialize)]
struct UserRecord {
    user_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    grade: String,
    #[serde(default)]
    favorite_genres_films: String,
    #[serde(default)]
    favorite_genres_music: String,
    #[serde(default)]
    favorite_genres_books: String,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            user_id: record.user_id,
            name: record.name,
            grade: record.grade,
            favorite_genres_films: GenreSet::parse(&record.favorite_genres_films),
            favorite_genres_music: GenreSet::parse(&record.favorite_genres_music),
            favorite_genres_books: GenreSet::parse(&record.favorite_genres_books),
        }
    }
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        UserRecord {
            user_id: user.user_id.clone(),
            name: user.name.clone(),
            grade: user.grade.clone(),
            favorite_genres_films: user.favorite_genres_films.to_string(),
            favorite_genres_music: user.favorite_genres_music.to_string(),
            favorite_genres_books: user.favorite_genres_books.to_string(),
        }
    }
}

/// Repository backed by flat CSV files in one directory
///
/// Files are read once into a snapshot. Writes rewrite the whole roster or
/// like log through a temporary file and a rename, so readers of the
/// directory never observe a partial file.
pub struct CsvRepository {
    data_dir: PathBuf,
    current: RwLock<Arc<Snapshot>>,
    write_lock: Mutex<()>,
}

impl CsvRepository {
    /// Loads every file under `data_dir`
    pub async fn open(data_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let data_dir = data_dir.into();
        let snapshot = load_blocking(data_dir.clone()).await?;

        tracing::info!(
            data_dir = %data_dir.display(),
            films = snapshot.films.len(),
            music = snapshot.music.len(),
            books = snapshot.books.len(),
            users = snapshot.users.len(),
            likes = snapshot.likes.len(),
            "Dataset loaded"
        );

        Ok(Self {
            data_dir,
            current: RwLock::new(Arc::new(snapshot)),
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Re-reads the directory and publishes the result as the next version
    pub async fn reload(&self) -> AppResult<Arc<Snapshot>> {
        let _guard = self.write_lock.lock().await;
        let mut fresh = load_blocking(self.data_dir.clone()).await?;
        fresh.version = self.current.read().await.version + 1;

        let fresh = Arc::new(fresh);
        *self.current.write().await = fresh.clone();
        tracing::info!(version = fresh.version, "Dataset reloaded");
        Ok(fresh)
    }

    /// Persists the roster of `next`, then publishes it
    async fn save_roster(&self, next: Snapshot) -> AppResult<Arc<Snapshot>> {
        let records: Vec<UserRecord> = next.users.iter().map(UserRecord::from).collect();
        let path = self.data_dir.join(USERS_FILE);
        run_blocking(move || write_atomically(&path, &USER_HEADERS, &records)).await?;

        Ok(self.publish(next).await)
    }

    async fn publish(&self, next: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(next);
        *self.current.write().await = next.clone();
        next
    }
}

#[async_trait::async_trait]
impl Repository for CsvRepository {
    async fn snapshot(&self) -> AppResult<Arc<Snapshot>> {
        Ok(self.current.read().await.clone())
    }

    async fn apply_user_register(&self, user: User) -> AppResult<User> {
        let _guard = self.write_lock.lock().await;
        let current = self.current.read().await.clone();
        if let Some(existing) = current.user(&user.user_id) {
            return Ok(existing.clone());
        }

        tracing::debug!(user_id = %user.user_id, "Registering user");
        let mut next = current.next();
        next.register_user(user.clone());
        self.save_roster(next).await?;
        Ok(user)
    }

    async fn apply_user_update(&self, user_id: &str, update: UserUpdate) -> AppResult<User> {
        let _guard = self.write_lock.lock().await;
        let mut next = self.current.read().await.next();
        let user = next
            .update_user(user_id, update)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;

        tracing::debug!(user_id = %user.user_id, "Saving user");
        self.save_roster(next).await?;
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

        let records = next.likes.clone();
        let path = self.data_dir.join(LIKES_FILE);
        run_blocking(move || write_atomically(&path, &LIKE_HEADERS, &records)).await?;

        let snapshot = self.publish(next).await;
        Ok(LikeToggle { liked, snapshot })
    }
}

async fn run_blocking<T, F>(task: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
}

async fn load_blocking(data_dir: PathBuf) -> AppResult<Snapshot> {
    run_blocking(move || load_snapshot(&data_dir)).await
}

/// Reads all five files; missing files load as empty
pub fn load_snapshot(data_dir: &Path) -> AppResult<Snapshot> {
    let catalogs = ContentKind::ALL
        .iter()
        .map(|kind| read_catalog(&data_dir.join(catalog_file(*kind)), *kind))
        .collect::<AppResult<Vec<_>>>()?;

    let users = read_rows::<UserRecord>(&data_dir.join(USERS_FILE))?
        .into_iter()
        .map(User::from)
        .collect();
    let likes = read_rows::<LikeEvent>(&data_dir.join(LIKES_FILE))?;

    Ok(Snapshot::new(catalogs, users, likes))
}

fn read_catalog(path: &Path, kind: ContentKind) -> AppResult<Catalog> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), kind = %kind, "Catalog file missing");
        return Ok(Catalog::empty(kind));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let has_genres = reader.headers()?.iter().any(|h| h.trim() == "genres");
    let items = reader
        .deserialize::<ItemRecord>()
        .map(|row| row.map(Item::from))
        .collect::<Result<Vec<_>, _>>()?;

    if has_genres {
        Ok(Catalog::new(kind, items))
    } else {
        Ok(Catalog::without_genres(kind, items))
    }
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> AppResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize::<T>().collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Replaces `path` with a freshly written file
///
/// The rows go to a sibling `.csv.tmp` that is synced to disk before it is
/// renamed over `path`. On failure the temporary file is removed.
fn write_atomically<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> AppResult<()> {
    let tmp = path.with_extension("csv.tmp");
    let result = write_synced(&tmp, headers, rows).and_then(|()| {
        std::fs::rename(&tmp, path)?;
        Ok(())
    });

    if let Err(e) = &result {
        tracing::error!(path = %path.display(), error = %e, "Failed to write data file");
        if let Err(e) = std::fs::remove_file(&tmp) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %tmp.display(), error = %e, "Failed to remove temporary file");
            }
        }
    }
    result
}

fn write_synced<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> AppResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }

    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}
