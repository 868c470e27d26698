use std::collections::BTreeMap;

use crate::{
    db::{LikeToggle, Repository, UserUpdate},
    error::{AppError, AppResult},
    models::{user::normalize_user_id, ContentKind, GenreSet, User},
};

/// Signs a user in, registering them on first visit
///
/// Existing users are returned unchanged; the name and grade only seed a new
/// record.
pub async fn sign_in(
    repo: &dyn Repository,
    email: &str,
    name: &str,
    grade: &str,
) -> AppResult<User> {
    let user_id = normalize_user_id(email);
    if user_id.is_empty() {
        return Err(AppError::InvalidInput("email must not be empty".to_string()));
    }

    // Returning users skip the write lock entirely
    let snapshot = repo.snapshot().await?;
    if let Some(existing) = snapshot.user(&user_id) {
        return Ok(existing.clone());
    }

    // A concurrent first sign-in may win the race; the repository then hands
    // back its record untouched
    let user = repo.apply_user_register(User::new(user_id, name, grade)).await?;
    tracing::info!(user_id = %user.user_id, "Registered user");
    Ok(user)
}

/// Looks a user up by id
pub async fn get_user(repo: &dyn Repository, user_id: &str) -> AppResult<User> {
    repo.snapshot()
        .await?
        .user(&normalize_user_id(user_id))
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))
}

/// Replaces favorite genres for every kind present in `favorites`
///
/// Kinds left out keep their current selection.
pub async fn save_favorites(
    repo: &dyn Repository,
    user_id: &str,
    favorites: BTreeMap<ContentKind, GenreSet>,
) -> AppResult<User> {
    let user_id = normalize_user_id(user_id);
    let update: UserUpdate = Box::new(move |user: &mut User| {
        for (kind, genres) in favorites {
            user.set_favorites(kind, genres);
        }
    });

    let user = repo.apply_user_update(&user_id, update).await?;
    tracing::info!(user_id = %user.user_id, "Favorite genres saved");
    Ok(user)
}

/// Likes an item, or removes the like if it is already active
pub async fn toggle_like(
    repo: &dyn Repository,
    user_id: &str,
    item_id: &str,
    kind: ContentKind,
) -> AppResult<LikeToggle> {
    let user = get_user(repo, user_id).await?;

    let catalog = repo.get_catalog(kind).await?;
    if !catalog.contains(item_id) {
        return Err(AppError::NotFound(format!("{} item {}", kind, item_id)));
    }

    let toggle = repo.apply_like_toggle(&user.user_id, item_id, kind).await?;
    tracing::info!(
        user_id = %user.user_id,
        item_id = %item_id,
        kind = %kind,
        liked = toggle.liked,
        "Like toggled"
    );
    Ok(toggle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryRepository, MockRepository};
    use crate::models::{Catalog, Item, Snapshot};
    use std::sync::Arc;

    fn repository() -> InMemoryRepository {
        InMemoryRepository::new(Snapshot::new(
            vec![Catalog::new(
                ContentKind::Book,
                vec![Item::new("b1", "Dune", "sci-fi")],
            )],
            vec![User::new("ada@school.org", "Ada", "9A")],
            Vec::new(),
        ))
    }

    /// Yields to the scheduler before each call so concurrent requests interleave
    struct YieldingRepository(InMemoryRepository);

    #[async_trait::async_trait]
    impl Repository for YieldingRepository {
        async fn snapshot(&self) -> AppResult<Arc<Snapshot>> {
            tokio::task::yield_now().await;
            self.0.snapshot().await
        }

        async fn apply_user_register(&self, user: User) -> AppResult<User> {
            tokio::task::yield_now().await;
            self.0.apply_user_register(user).await
        }

        async fn apply_user_update(&self, user_id: &str, update: UserUpdate) -> AppResult<User> {
            tokio::task::yield_now().await;
            self.0.apply_user_update(user_id, update).await
        }

        async fn apply_like_toggle(
            &self,
            user_id: &str,
            item_id: &str,
            kind: ContentKind,
        ) -> AppResult<LikeToggle> {
            tokio::task::yield_now().await;
            self.0.apply_like_toggle(user_id, item_id, kind).await
        }
    }

    #[tokio::test]
    async fn test_sign_in_registers_new_user_once() {
        let repo = repository();

        let user = sign_in(&repo, "  Bea@School.org ", "", "10B").await.unwrap();
        assert_eq!(user.user_id, "bea@school.org");
        assert_eq!(user.name, "bea");

        let again = sign_in(&repo, "bea@school.org", "Other Name", "11C").await.unwrap();
        assert_eq!(again, user);
        assert_eq!(repo.get_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sign_in_rejects_blank_email() {
        let repo = repository();
        let result = sign_in(&repo, "   ", "x", "y").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_sign_in_existing_user_does_not_write() {
        let mut mock = MockRepository::new();
        mock.expect_snapshot().times(1).returning(|| {
            Ok(Arc::new(Snapshot::new(
                Vec::new(),
                vec![User::new("ada@school.org", "Ada", "9A")],
                Vec::new(),
            )))
        });
        mock.expect_apply_user_register().never();

        let user = tokio_test::block_on(sign_in(&mock, "ADA@school.org", "", "")).unwrap();
        assert_eq!(user.name, "Ada");
    }

    #[tokio::test]
    async fn test_save_favorites_replaces_only_given_kinds() {
        let repo = repository();
        let mut favorites = BTreeMap::new();
        favorites.insert(ContentKind::Film, GenreSet::parse("drama"));
        save_favorites(&repo, "ada@school.org", favorites).await.unwrap();

        let mut favorites = BTreeMap::new();
        favorites.insert(ContentKind::Book, GenreSet::parse("fantasy, sci-fi"));
        let user = save_favorites(&repo, "ada@school.org", favorites).await.unwrap();

        assert_eq!(user.favorites(ContentKind::Film), &GenreSet::parse("drama"));
        assert_eq!(user.favorites(ContentKind::Book).len(), 2);
        assert_eq!(get_user(&repo, "ada@school.org").await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_concurrent_favorite_saves_keep_both_kinds() {
        let repo = YieldingRepository(repository());
        let films = BTreeMap::from([(ContentKind::Film, GenreSet::parse("drama"))]);
        let books = BTreeMap::from([(ContentKind::Book, GenreSet::parse("fantasy"))]);

        let (first, second) = tokio::join!(
            save_favorites(&repo, "ada@school.org", films),
            save_favorites(&repo, "ada@school.org", books),
        );
        first.unwrap();
        second.unwrap();

        let user = get_user(&repo, "ada@school.org").await.unwrap();
        assert_eq!(user.favorites(ContentKind::Film), &GenreSet::parse("drama"));
        assert_eq!(user.favorites(ContentKind::Book), &GenreSet::parse("fantasy"));
    }

    #[tokio::test]
    async fn test_concurrent_first_sign_ins_return_one_record() {
        let repo = YieldingRepository(repository());

        let (first, second) = tokio::join!(
            sign_in(&repo, "dee@school.org", "Dee", "11C"),
            sign_in(&repo, "DEE@school.org", "Someone Else", "12D"),
        );
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(repo.0.get_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_save_favorites_unknown_user() {
        let repo = repository();
        let result = save_favorites(&repo, "nobody@school.org", BTreeMap::new()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_like_twice_restores_state() {
        let repo = repository();

        let first = toggle_like(&repo, "ada@school.org", "b1", ContentKind::Book).await.unwrap();
        assert!(first.liked);
        let second = toggle_like(&repo, "ada@school.org", "b1", ContentKind::Book).await.unwrap();
        assert!(!second.liked);
        assert!(second
            .snapshot
            .like_set("ada@school.org", ContentKind::Book)
            .is_empty());
    }

    #[tokio::test]
    async fn test_toggle_like_unknown_item() {
        let repo = repository();
        let result = toggle_like(&repo, "ada@school.org", "b9", ContentKind::Book).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let result = toggle_like(&repo, "ada@school.org", "b1", ContentKind::Film).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
