use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::models::{user::normalize_user_id, ContentKind, GenreSet, Item, User};
use crate::services::{profile, Recommendations};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub grade: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct FavoritesRequest {
    pub film: Option<Vec<String>>,
    pub music: Option<Vec<String>>,
    pub book: Option<Vec<String>>,
}

impl FavoritesRequest {
    fn into_selection(self) -> BTreeMap<ContentKind, GenreSet> {
        [
            (ContentKind::Film, self.film),
            (ContentKind::Music, self.music),
            (ContentKind::Book, self.book),
        ]
        .into_iter()
        .filter_map(|(kind, genres)| genres.map(|g| (kind, g.into_iter().collect())))
        .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ToggleLikeRequest {
    pub item_id: String,
    pub kind: ContentKind,
}

#[derive(Debug, Serialize)]
pub struct ToggleLikeResponse {
    pub item_id: String,
    pub kind: ContentKind,
    pub liked: bool,
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogItemResponse {
    #[serde(flatten)]
    pub item: Item,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub k: Option<usize>,
    pub n: Option<usize>,
}

fn parse_kind(raw: &str) -> AppResult<ContentKind> {
    raw.parse().map_err(AppError::InvalidInput)
}

fn positive(name: &str, value: Option<usize>, default: usize) -> AppResult<usize> {
    match value {
        Some(0) => Err(AppError::InvalidInput(format!("{} must be at least 1", name))),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Sign in, registering the user on first visit
pub async fn sign_in(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<SignInRequest>,
) -> AppResult<Json<User>> {
    tracing::info!(request_id = %request_id, "Processing sign-in");
    let user =
        profile::sign_in(state.repo.as_ref(), &request.email, &request.name, &request.grade)
            .await?;
    Ok(Json(user))
}

/// Get a user profile
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<User>> {
    let user = profile::get_user(state.repo.as_ref(), &user_id).await?;
    Ok(Json(user))
}

/// Replace favorite genres for the kinds present in the body
pub async fn update_favorites(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<FavoritesRequest>,
) -> AppResult<Json<User>> {
    let user =
        profile::save_favorites(state.repo.as_ref(), &user_id, request.into_selection()).await?;
    Ok(Json(user))
}

/// List a catalog, flagging the user's likes when `user_id` is given
pub async fn list_catalog(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<Vec<CatalogItemResponse>>> {
    let kind = parse_kind(&kind)?;
    let snapshot = state.repo.snapshot().await?;

    // Like flags are only attached when a user is given
    let user_id = query.user_id.as_deref().map(normalize_user_id);

    let items = snapshot
        .catalog(kind)
        .items
        .iter()
        .map(|item| CatalogItemResponse {
            item: item.clone(),
            liked: user_id
                .as_deref()
                .map(|uid| snapshot.is_liked(uid, &item.id, kind)),
        })
        .collect();
    Ok(Json(items))
}

/// Sorted genre tags offered by the profile editor
pub async fn catalog_genres(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    let kind = parse_kind(&kind)?;
    let catalog = state.repo.get_catalog(kind).await?;
    Ok(Json(catalog.genre_vocabulary()))
}

/// Like an item, or remove an existing like
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
    Json(request): Json<ToggleLikeRequest>,
) -> AppResult<Json<ToggleLikeResponse>> {
    tracing::debug!(request_id = %request_id, item_id = %request.item_id, "Toggling like");
    let toggle =
        profile::toggle_like(state.repo.as_ref(), &user_id, &request.item_id, request.kind)
            .await?;

    Ok(Json(ToggleLikeResponse {
        item_id: request.item_id,
        kind: request.kind,
        liked: toggle.liked,
    }))
}

/// Recommendations for every content kind
pub async fn recommend_all(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Recommendations>>> {
    let snapshot = state.repo.snapshot().await?;
    let user_id = normalize_user_id(&user_id);

    // One result per kind: film, music, book
    Ok(Json(state.recommender.recommend_all(&snapshot, &user_id)))
}

/// Recommendations for one content kind, with optional K and N overrides
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((user_id, kind)): Path<(String, String)>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<Recommendations>> {
    let kind = parse_kind(&kind)?;

    // Query overrides fall back to the configured K and N
    let settings = state.recommender.settings();
    let neighbor_count = positive("k", query.k, settings.neighbor_count)?;
    let limit = positive("n", query.n, settings.limit)?;

    let snapshot = state.repo.snapshot().await?;
    let user_id = normalize_user_id(&user_id);
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        kind = %kind,
        neighbor_count,
        limit,
        "Processing recommendation request"
    );

    // Rank against the snapshot taken above; later writes do not affect it
    let recommendations = state.recommender.recommend_with(
        &snapshot,
        &user_id,
        kind,
        neighbor_count,
        limit,
        &mut rand::thread_rng(),
    );
    Ok(Json(recommendations))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorites_request_keeps_only_present_kinds() {
        let request: FavoritesRequest =
            serde_json::from_value(json!({ "film": ["drama", " sci-fi "], "book": [] })).unwrap();
        let selection = request.into_selection();

        assert_eq!(selection.len(), 2);
        assert_eq!(selection[&ContentKind::Film], GenreSet::parse("drama,sci-fi"));
        assert!(selection[&ContentKind::Book].is_empty());
        assert!(!selection.contains_key(&ContentKind::Music));
    }

    #[test]
    fn test_positive_rejects_zero() {
        assert_eq!(positive("n", None, 10).unwrap(), 10);
        assert_eq!(positive("n", Some(3), 10).unwrap(), 3);
        assert!(matches!(positive("n", Some(0), 10), Err(AppError::InvalidInput(_))));
    }
}
