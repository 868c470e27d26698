use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{snapshot::LikeSet, ContentKind, Item, Snapshot};

use super::fallback::{random_sample, rank_by_genre_overlap};
use super::neighbors::{top_neighbors, DEFAULT_NEIGHBOR_COUNT};

/// Default number of recommended items
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;

/// An item together with the score that selected it
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: Item,
    pub score: f64,
}

/// Which step of the fallback chain produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Collaborative,
    GenreOverlap,
    RandomSample,
}

/// Order of collaborative results handed back to the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrder {
    /// Winning items in catalog order
    #[default]
    Catalog,
    /// Winning items by descending score
    Score,
}

/// Ranked items for one user and kind
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendations {
    pub kind: ContentKind,
    /// `None` when no strategy produced anything
    pub strategy: Option<StrategyKind>,
    pub items: Vec<ScoredItem>,
}

/// Inputs shared by every strategy in the chain
#[derive(Debug, Clone, Copy)]
pub struct RecommendationRequest<'a> {
    pub snapshot: &'a Snapshot,
    pub user_id: &'a str,
    pub kind: ContentKind,
    /// Neighbor count (K)
    pub neighbor_count: usize,
    /// Result limit (N)
    pub limit: usize,
}

/// One step of the fallback chain
///
/// Returns `None` to defer to the next strategy.
pub trait RecommendationStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn rank(
        &self,
        request: &RecommendationRequest<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<Vec<ScoredItem>>;
}

/// User-based collaborative filtering over binary like-sets
///
/// Each neighbor adds its similarity to every unseen item it likes.
#[derive(Debug, Clone, Default)]
pub struct CollaborativeStrategy {
    pub order: ResultOrder,
}

impl CollaborativeStrategy {
    pub fn new(order: ResultOrder) -> Self {
        Self { order }
    }

    /// Accumulated neighbor scores, best first, truncated to the limit
    pub fn score_items(request: &RecommendationRequest<'_>) -> Vec<(String, f64)> {
        let snapshot = request.snapshot;
        let neighbors = top_neighbors(
            snapshot,
            request.user_id,
            request.kind,
            request.neighbor_count,
        );
        let seen = snapshot.like_set(request.user_id, request.kind);

        accumulate_scores(
            neighbors.iter().map(|neighbor| {
                (
                    neighbor.similarity,
                    snapshot.like_set(&neighbor.user_id, request.kind),
                )
            }),
            &seen,
            request.limit,
        )
    }
}

/// Adds each neighbor's similarity to every unseen item it likes
///
/// Returns the best `limit` items. Equal scores keep the order in which items
/// were first encountered.
pub fn accumulate_scores<I>(neighbors: I, seen: &LikeSet, limit: usize) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = (f64, LikeSet)>,
{
    let mut scores: Vec<(String, f64)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (similarity, likes) in neighbors {
        for item_id in likes {
            if seen.contains(&item_id) {
                continue;
            }
            match positions.get(&item_id) {
                Some(&index) => scores[index].1 += similarity,
                None => {
                    positions.insert(item_id.clone(), scores.len());
                    scores.push((item_id, similarity));
                }
            }
        }
    }

    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    scores.truncate(limit);
    scores
}

impl RecommendationStrategy for CollaborativeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Collaborative
    }

    fn rank(
        &self,
        request: &RecommendationRequest<'_>,
        _rng: &mut dyn RngCore,
    ) -> Option<Vec<ScoredItem>> {
        let ranked = Self::score_items(request);
        if ranked.is_empty() {
            return None;
        }

        let catalog = request.snapshot.catalog(request.kind);
        let items: Vec<ScoredItem> = match self.order {
            ResultOrder::Catalog => {
                let winners: HashMap<&str, f64> =
                    ranked.iter().map(|(id, score)| (id.as_str(), *score)).collect();
                catalog
                    .items
                    .iter()
                    .filter_map(|item| {
                        winners.get(item.id.as_str()).map(|score| ScoredItem {
                            item: item.clone(),
                            score: *score,
                        })
                    })
                    .collect()
            }
            ResultOrder::Score => ranked
                .iter()
                .filter_map(|(id, score)| {
                    catalog.get(id).map(|item| ScoredItem {
                        item: item.clone(),
                        score: *score,
                    })
                })
                .collect(),
        };

        if items.is_empty() {
            tracing::warn!(
                user_id = %request.user_id,
                kind = %request.kind,
                "Neighbor likes reference no catalog items"
            );
            return None;
        }

        Some(items)
    }
}

/// Ranks unseen items by overlap with the user's favorite genres
///
/// Defers when the user is unknown or the catalog has no genre data.
#[derive(Debug, Clone, Default)]
pub struct GenreOverlapStrategy;

impl RecommendationStrategy for GenreOverlapStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GenreOverlap
    }

    fn rank(
        &self,
        request: &RecommendationRequest<'_>,
        _rng: &mut dyn RngCore,
    ) -> Option<Vec<ScoredItem>> {
        let user = request.snapshot.user(request.user_id)?;
        let catalog = request.snapshot.catalog(request.kind);
        if !catalog.has_genres || catalog.is_empty() {
            return None;
        }

        let seen = request.snapshot.like_set(request.user_id, request.kind);
        let ranked = rank_by_genre_overlap(
            catalog,
            user.favorites(request.kind),
            &seen,
            request.limit,
        );
        if ranked.is_empty() {
            None
        } else {
            Some(ranked)
        }
    }
}

/// Uniform random sample of unseen items; never defers
#[derive(Debug, Clone, Default)]
pub struct RandomSampleStrategy;

impl RecommendationStrategy for RandomSampleStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RandomSample
    }

    fn rank(
        &self,
        request: &RecommendationRequest<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<Vec<ScoredItem>> {
        let seen = request.snapshot.like_set(request.user_id, request.kind);
        Some(random_sample(
            request.snapshot.catalog(request.kind),
            &seen,
            request.limit,
            rng,
        ))
    }
}

/// Tunables for [`Recommender`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommenderSettings {
    pub neighbor_count: usize,
    pub limit: usize,
    pub order: ResultOrder,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            neighbor_count: DEFAULT_NEIGHBOR_COUNT,
            limit: DEFAULT_RECOMMENDATION_LIMIT,
            order: ResultOrder::default(),
        }
    }
}

/// Evaluates a prioritized list of strategies until one produces a result
pub struct Recommender {
    strategies: Vec<Box<dyn RecommendationStrategy>>,
    settings: RecommenderSettings,
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(RecommenderSettings::default())
    }
}

impl Recommender {
    /// Collaborative, then genre overlap, then random sampling
    pub fn new(settings: RecommenderSettings) -> Self {
        let strategies: Vec<Box<dyn RecommendationStrategy>> = vec![
            Box::new(CollaborativeStrategy::new(settings.order)),
            Box::new(GenreOverlapStrategy),
            Box::new(RandomSampleStrategy),
        ];
        Self::with_strategies(settings, strategies)
    }

    pub fn with_strategies(
        settings: RecommenderSettings,
        strategies: Vec<Box<dyn RecommendationStrategy>>,
    ) -> Self {
        Self {
            strategies,
            settings,
        }
    }

    pub fn settings(&self) -> RecommenderSettings {
        self.settings
    }

    /// Recommends with the configured K and N
    pub fn recommend(
        &self,
        snapshot: &Snapshot,
        user_id: &str,
        kind: ContentKind,
    ) -> Recommendations {
        self.recommend_with(
            snapshot,
            user_id,
            kind,
            self.settings.neighbor_count,
            self.settings.limit,
            &mut rand::thread_rng(),
        )
    }

    /// Recommends with explicit K, N and randomness source
    pub fn recommend_with(
        &self,
        snapshot: &Snapshot,
        user_id: &str,
        kind: ContentKind,
        neighbor_count: usize,
        limit: usize,
        rng: &mut dyn RngCore,
    ) -> Recommendations {
        let request = RecommendationRequest {
            snapshot,
            user_id,
            kind,
            neighbor_count,
            limit,
        };

        for strategy in &self.strategies {
            if let Some(items) = strategy.rank(&request, rng) {
                tracing::info!(
                    user_id = %user_id,
                    kind = %kind,
                    strategy = ?strategy.kind(),
                    item_count = items.len(),
                    snapshot_version = snapshot.version,
                    "Recommendations computed"
                );
                return Recommendations {
                    kind,
                    strategy: Some(strategy.kind()),
                    items,
                };
            }
            tracing::debug!(strategy = ?strategy.kind(), "Strategy deferred");
        }

        Recommendations {
            kind,
            strategy: None,
            items: Vec::new(),
        }
    }

    /// Recommendations for every content kind
    pub fn recommend_all(&self, snapshot: &Snapshot, user_id: &str) -> Vec<Recommendations> {
        ContentKind::ALL
            .iter()
            .map(|kind| self.recommend(snapshot, user_id, *kind))
            .collect()
    }
}
