pub mod postgres;
pub mod recommendations;

pub use postgres::{create_pool, run_migrations};
pub use recommendations::{PgRecommendationRepository, RecommendationRepository};
