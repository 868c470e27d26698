use std::sync::Arc;

use crate::db::{InMemoryRepository, Repository};
use crate::models::Snapshot;
use crate::services::{Recommender, RecommenderSettings};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub recommender: Arc<Recommender>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, settings: RecommenderSettings) -> Self {
        Self {
            repo,
            recommender: Arc::new(Recommender::new(settings)),
        }
    }

    /// State over an in-memory dataset with default settings
    pub fn in_memory(snapshot: Snapshot) -> Self {
        Self::new(
            Arc::new(InMemoryRepository::new(snapshot)),
            RecommenderSettings::default(),
        )
    }
}
