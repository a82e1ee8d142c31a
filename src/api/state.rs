use std::sync::Arc;

use crate::db::RecommendationRepository;
use crate::services::{RandomSource, RecommendationService, ThreadRandom};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommendations: RecommendationService,
}

impl AppState {
    pub fn new(recommendations: RecommendationService) -> Self {
        Self { recommendations }
    }

    /// Builds state around a repository using the thread-local random source
    pub fn with_repository(repository: Arc<dyn RecommendationRepository>) -> Self {
        Self::with_random(repository, Arc::new(ThreadRandom))
    }

    pub fn with_random(
        repository: Arc<dyn RecommendationRepository>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self::new(RecommendationService::new(repository, random))
    }
}
