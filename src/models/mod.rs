pub mod recommendation;

pub use recommendation::{
    CreateRecommendation, Recommendation, ScoreChange, ScoreComparison, ScoreFilter,
};
