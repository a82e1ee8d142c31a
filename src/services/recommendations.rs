use std::sync::Arc;

use crate::{
    db::RecommendationRepository,
    error::{AppError, AppResult},
    models::{CreateRecommendation, Recommendation, ScoreChange, ScoreComparison, ScoreFilter},
    services::random::{pick_index, RandomSource},
};

/// Recommendations whose score falls below this after a downvote are deleted
pub const REMOVAL_SCORE_THRESHOLD: i32 = -5;

/// Score separating the "popular" band from the rest in random selection
pub const POPULAR_SCORE_BOUNDARY: i32 = 10;

/// Chance that random selection looks in the popular band first
pub const POPULAR_BAND_PROBABILITY: f64 = 0.7;

/// Business rules for song recommendations
///
/// Wraps a [`RecommendationRepository`] and applies name uniqueness, vote
/// bookkeeping with automatic removal, and weighted random selection.
#[derive(Clone)]
pub struct RecommendationService {
    repository: Arc<dyn RecommendationRepository>,
    random: Arc<dyn RandomSource>,
}

impl RecommendationService {
    pub fn new(repository: Arc<dyn RecommendationRepository>, random: Arc<dyn RandomSource>) -> Self {
        Self { repository, random }
    }

    /// Stores a new recommendation unless one with the same name exists
    pub async fn insert(&self, data: CreateRecommendation) -> AppResult<()> {
        if self.repository.find_by_name(&data.name).await?.is_some() {
            tracing::info!(name = %data.name, "Rejected duplicate recommendation");
            return Err(AppError::Conflict(format!(
                "Recommendation '{}' already exists",
                data.name
            )));
        }

        tracing::info!(name = %data.name, "Creating recommendation");
        self.repository.create(data).await
    }

    pub async fn upvote(&self, id: i32) -> AppResult<()> {
        self.get_by_id(id).await?;
        self.repository.update_score(id, ScoreChange::Increment).await?;
        Ok(())
    }

    /// Lowers the score by one, deleting the recommendation once it drops
    /// below [`REMOVAL_SCORE_THRESHOLD`]
    pub async fn downvote(&self, id: i32) -> AppResult<()> {
        self.get_by_id(id).await?;

        let updated = self.repository.update_score(id, ScoreChange::Decrement).await?;

        if updated.score < REMOVAL_SCORE_THRESHOLD {
            tracing::info!(id, score = updated.score, "Removing recommendation after downvote");
            self.repository.remove(id).await?;
        }

        Ok(())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Recommendation> {
        self.repository
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recommendation {} not found", id)))
    }

    pub async fn get(&self) -> AppResult<Vec<Recommendation>> {
        self.repository.find_all(None).await
    }

    /// Highest-scored recommendations, ordered by the repository
    pub async fn get_top(&self, amount: i64) -> AppResult<Vec<Recommendation>> {
        self.repository.get_amount_by_score(amount).await
    }

    /// Picks one recommendation at random, favouring those scored above
    /// [`POPULAR_SCORE_BOUNDARY`]
    ///
    /// With probability [`POPULAR_BAND_PROBABILITY`] the popular band is
    /// searched first, otherwise the rest. An empty band falls back to the
    /// other one, and the pick within the band is uniform.
    pub async fn get_random(&self) -> AppResult<Recommendation> {
        let preferred = preferred_filter(self.random.next_f64());

        let mut candidates = self.repository.find_all(Some(preferred)).await?;
        if candidates.is_empty() {
            tracing::debug!(?preferred, "Preferred score band empty, trying the other one");
            candidates = self.repository.find_all(Some(preferred.complement())).await?;
        }

        if candidates.is_empty() {
            return Err(AppError::NotFound("No recommendations available".to_string()));
        }

        let index = pick_index(self.random.next_f64(), candidates.len());
        Ok(candidates.swap_remove(index))
    }
}

fn preferred_filter(draw: f64) -> ScoreFilter {
    let comparison = if draw < POPULAR_BAND_PROBABILITY {
        ScoreComparison::Gt
    } else {
        ScoreComparison::Lte
    };

    ScoreFilter::new(POPULAR_SCORE_BOUNDARY, comparison)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::recommendations::MockRecommendationRepository;
    use mockall::{predicate::eq, Sequence};

    struct FixedRandom(f64);

    impl RandomSource for FixedRandom {
        fn next_f64(&self) -> f64 {
            self.0
        }
    }

    fn recommendation(id: i32, name: &str, score: i32) -> Recommendation {
        Recommendation {
            id,
            name: name.to_string(),
            youtube_link: "https://www.youtube.com/watch?v=d8zXQA5Za9M".to_string(),
            score,
        }
    }

    fn service_with(repository: MockRecommendationRepository, draw: f64) -> RecommendationService {
        RecommendationService::new(Arc::new(repository), Arc::new(FixedRandom(draw)))
    }

    fn service(repository: MockRecommendationRepository) -> RecommendationService {
        service_with(repository, 0.5)
    }

    fn lte_filter() -> Option<ScoreFilter> {
        Some(ScoreFilter::new(10, ScoreComparison::Lte))
    }

    fn gt_filter() -> Option<ScoreFilter> {
        Some(ScoreFilter::new(10, ScoreComparison::Gt))
    }

    // insert

    #[tokio::test]
    async fn test_insert_creates_new_recommendation() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_by_name()
            .withf(|name| name == "testSong")
            .times(1)
            .returning(|_| Ok(None));
        repo.expect_create()
            .with(eq(CreateRecommendation::new(
                "testSong",
                "https://youtu.be/d8zXQA5Za9M",
            )))
            .times(1)
            .returning(|_| Ok(()));

        let result = service(repo)
            .insert(CreateRecommendation::new("testSong", "https://youtu.be/d8zXQA5Za9M"))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_insert_duplicate_name_is_conflict() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_by_name()
            .times(1)
            .returning(|_| Ok(Some(recommendation(1, "testSong", 0))));
        repo.expect_create().never();

        let err = service(repo)
            .insert(CreateRecommendation::new("testSong", "https://youtu.be/d8zXQA5Za9M"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "conflict");
    }

    #[tokio::test]
    async fn test_insert_propagates_store_conflict() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_by_name().returning(|_| Ok(None));
        repo.expect_create()
            .times(1)
            .returning(|_| Err(AppError::Conflict("already exists".to_string())));

        let err = service(repo)
            .insert(CreateRecommendation::new("racer", "https://youtu.be/x"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "conflict");
    }

    // upvote

    #[tokio::test]
    async fn test_upvote_existing_recommendation() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find()
            .with(eq(1))
            .times(1)
            .returning(|id| Ok(Some(recommendation(id, "testSong", 0))));
        repo.expect_update_score()
            .with(eq(1), eq(ScoreChange::Increment))
            .times(1)
            .returning(|id, _| Ok(recommendation(id, "testSong", 1)));

        assert!(service(repo).upvote(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_upvote_missing_recommendation_is_not_found() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find().times(1).returning(|_| Ok(None));
        repo.expect_update_score().never();

        let err = service(repo).upvote(1).await.unwrap_err();

        assert_eq!(err.kind(), "not_found");
    }

    // downvote

    #[tokio::test]
    async fn test_downvote_existing_recommendation_keeps_it() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find()
            .times(1)
            .returning(|id| Ok(Some(recommendation(id, "testSong", 0))));
        repo.expect_update_score()
            .with(eq(1), eq(ScoreChange::Decrement))
            .times(1)
            .returning(|id, _| Ok(recommendation(id, "testSong", -1)));
        repo.expect_remove().never();

        assert!(service(repo).downvote(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_downvote_missing_recommendation_is_not_found() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find().times(1).returning(|_| Ok(None));
        repo.expect_update_score().never();
        repo.expect_remove().never();

        let err = service(repo).downvote(1).await.unwrap_err();

        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_downvote_below_threshold_removes_recommendation() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find()
            .times(1)
            .returning(|id| Ok(Some(recommendation(id, "testSong", -5))));
        repo.expect_update_score()
            .times(1)
            .returning(|id, _| Ok(recommendation(id, "testSong", -6)));
        repo.expect_remove().with(eq(1)).times(1).returning(|_| Ok(()));

        assert!(service(repo).downvote(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_downvote_to_threshold_keeps_recommendation() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find()
            .returning(|id| Ok(Some(recommendation(id, "testSong", -4))));
        repo.expect_update_score()
            .times(1)
            .returning(|id, _| Ok(recommendation(id, "testSong", -5)));
        repo.expect_remove().never();

        assert!(service(repo).downvote(1).await.is_ok());
    }

    // retrieval

    #[tokio::test]
    async fn test_get_by_id_returns_record() {
        let expected = recommendation(1, "testSong", 0);
        let stored = expected.clone();

        let mut repo = MockRecommendationRepository::new();
        repo.expect_find()
            .with(eq(1))
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let result = service(repo).get_by_id(1).await.unwrap();

        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_not_found() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find().times(1).returning(|_| Ok(None));

        let err = service(repo).get_by_id(1).await.unwrap_err();

        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_get_returns_unfiltered_listing() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_all()
            .with(eq(None))
            .times(1)
            .returning(|_| Ok(vec![recommendation(2, "b", 3), recommendation(1, "a", 20)]));

        let result = service(repo).get().await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, 2);
    }

    #[tokio::test]
    async fn test_get_top_returns_repository_order() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_get_amount_by_score()
            .with(eq(10))
            .times(1)
            .returning(|amount| {
                Ok((0..amount as i32)
                    .map(|i| recommendation(i, &format!("song{i}"), 100 - i))
                    .collect())
            });

        let result = service(repo).get_top(10).await.unwrap();

        assert_eq!(result.len(), 10);
        assert_eq!(result[0].score, 100);
        assert_eq!(result[9].score, 91);
    }

    // get_random

    #[tokio::test]
    async fn test_get_random_high_draw_queries_lower_band() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_all()
            .with(eq(lte_filter()))
            .times(1)
            .returning(|_| Ok(vec![recommendation(1, "testSong", 5)]));

        let result = service_with(repo, 0.8).get_random().await.unwrap();

        assert_eq!(result, recommendation(1, "testSong", 5));
    }

    #[tokio::test]
    async fn test_get_random_low_draw_queries_popular_band() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_all()
            .with(eq(gt_filter()))
            .times(1)
            .returning(|_| Ok(vec![recommendation(2, "testSong2", 11)]));

        let result = service_with(repo, 0.4).get_random().await.unwrap();

        assert_eq!(result, recommendation(2, "testSong2", 11));
    }

    #[tokio::test]
    async fn test_get_random_boundary_draw_prefers_lower_band() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_all()
            .with(eq(lte_filter()))
            .times(1)
            .returning(|_| Ok(vec![recommendation(1, "testSong", 0)]));

        assert!(service_with(repo, 0.7).get_random().await.is_ok());
    }

    #[tokio::test]
    async fn test_get_random_falls_back_to_popular_band() {
        let mut repo = MockRecommendationRepository::new();
        let mut seq = Sequence::new();
        repo.expect_find_all()
            .with(eq(lte_filter()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![]));
        repo.expect_find_all()
            .with(eq(gt_filter()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![recommendation(1, "testSong", 15)]));

        let result = service_with(repo, 0.8).get_random().await.unwrap();

        assert_eq!(result.score, 15);
    }

    #[tokio::test]
    async fn test_get_random_falls_back_to_lower_band() {
        let mut repo = MockRecommendationRepository::new();
        let mut seq = Sequence::new();
        repo.expect_find_all()
            .with(eq(gt_filter()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![]));
        repo.expect_find_all()
            .with(eq(lte_filter()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![recommendation(1, "testSong", 1)]));

        let result = service_with(repo, 0.4).get_random().await.unwrap();

        assert_eq!(result.score, 1);
    }

    #[tokio::test]
    async fn test_get_random_with_no_recommendations_is_not_found() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_all().times(2).returning(|_| Ok(vec![]));

        let err = service_with(repo, 0.8).get_random().await.unwrap_err();

        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_get_random_picks_within_pool_using_draw() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_all().times(1).returning(|_| {
            Ok(vec![
                recommendation(1, "first", 2),
                recommendation(2, "second", 3),
            ])
        });

        // 0.8 selects the lower band, then index floor(0.8 * 2) = 1
        let result = service_with(repo, 0.8).get_random().await.unwrap();

        assert_eq!(result.name, "second");
    }

    #[tokio::test]
    async fn test_repository_failure_propagates() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find()
            .returning(|_| Err(AppError::Database(sqlx::Error::PoolTimedOut)));
        repo.expect_update_score().never();

        let err = service(repo).upvote(7).await.unwrap_err();

        assert_eq!(err.kind(), "database");
    }
}
