use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::{CreateRecommendation, Recommendation, ScoreChange, ScoreFilter},
};

const COLUMNS: &str = "id, name, youtube_link, score";

/// Persistence operations over the `recommendations` table
///
/// The service only ever talks to this trait, so tests can swap in a mock
/// or an in-memory store.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationRepository: Send + Sync {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Recommendation>>;

    async fn find(&self, id: i32) -> AppResult<Option<Recommendation>>;

    /// Lists recommendations newest first, optionally restricted to one side
    /// of a score threshold
    async fn find_all(&self, filter: Option<ScoreFilter>) -> AppResult<Vec<Recommendation>>;

    /// Inserts a new recommendation with a score of zero
    ///
    /// A name already present in the table yields [`AppError::Conflict`].
    async fn create(&self, data: CreateRecommendation) -> AppResult<()>;

    /// Applies one vote and returns the row as it is after the update
    async fn update_score(&self, id: i32, change: ScoreChange) -> AppResult<Recommendation>;

    async fn remove(&self, id: i32) -> AppResult<()>;

    /// Highest-scored recommendations, at most `amount` of them
    async fn get_amount_by_score(&self, amount: i64) -> AppResult<Vec<Recommendation>>;
}

/// A unique-name violation on insert becomes [`AppError::Conflict`]
fn insert_error(error: sqlx::Error, name: &str) -> AppError {
    let error = AppError::from(error);
    if error.is_unique_violation() {
        AppError::Conflict(format!("Recommendation '{}' already exists", name))
    } else {
        error
    }
}

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgRecommendationRepository {
    pool: PgPool,
}

impl PgRecommendationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecommendationRepository for PgRecommendationRepository {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Recommendation>> {
        let recommendation = sqlx::query_as::<_, Recommendation>(&format!(
            "SELECT {COLUMNS} FROM recommendations WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recommendation)
    }

    async fn find(&self, id: i32) -> AppResult<Option<Recommendation>> {
        let recommendation = sqlx::query_as::<_, Recommendation>(&format!(
            "SELECT {COLUMNS} FROM recommendations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recommendation)
    }

    async fn find_all(&self, filter: Option<ScoreFilter>) -> AppResult<Vec<Recommendation>> {
        let recommendations = match filter {
            Some(filter) => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM recommendations WHERE score {} $1 ORDER BY id DESC",
                    filter.score_filter.sql_operator()
                );
                sqlx::query_as::<_, Recommendation>(&sql)
                    .bind(filter.score)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, Recommendation>(&format!(
                    "SELECT {COLUMNS} FROM recommendations ORDER BY id DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(recommendations)
    }

    async fn create(&self, data: CreateRecommendation) -> AppResult<()> {
        sqlx::query("INSERT INTO recommendations (name, youtube_link) VALUES ($1, $2)")
            .bind(&data.name)
            .bind(&data.youtube_link)
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(e, &data.name))?;

        Ok(())
    }

    async fn update_score(&self, id: i32, change: ScoreChange) -> AppResult<Recommendation> {
        let updated = sqlx::query_as::<_, Recommendation>(&format!(
            "UPDATE recommendations SET score = score + $1 WHERE id = $2 RETURNING {COLUMNS}"
        ))
        .bind(change.delta())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Recommendation {} not found", id)))
    }

    async fn remove(&self, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM recommendations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_amount_by_score(&self, amount: i64) -> AppResult<Vec<Recommendation>> {
        let recommendations = sqlx::query_as::<_, Recommendation>(&format!(
            "SELECT {COLUMNS} FROM recommendations ORDER BY score DESC LIMIT $1"
        ))
        .bind(amount)
        .fetch_all(&self.pool)
        .await?;

        Ok(recommendations)
    }
}
