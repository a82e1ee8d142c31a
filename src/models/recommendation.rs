use serde::{Deserialize, Serialize};

/// A song recommendation with its vote tally
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Identifier assigned by the store
    pub id: i32,
    /// Song name, unique across recommendations
    pub name: String,
    /// Link to the song on YouTube
    pub youtube_link: String,
    /// Net votes (upvotes minus downvotes)
    pub score: i32,
}

/// Data needed to create a recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateRecommendation {
    pub name: String,
    pub youtube_link: String,
}

const YOUTUBE_HOSTS: [&str; 3] = ["www.youtube.com/", "youtube.com/", "youtu.be/"];

impl CreateRecommendation {
    pub fn new(name: impl Into<String>, youtube_link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            youtube_link: youtube_link.into(),
        }
    }

    /// Checks the request shape before it reaches the service
    ///
    /// The name must be non-blank and the link must point at YouTube
    /// (`youtube.com` or `youtu.be`) with a non-empty path.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }

        if !is_youtube_link(&self.youtube_link) {
            return Err(format!(
                "youtubeLink must be a YouTube URL, got '{}'",
                self.youtube_link
            ));
        }

        Ok(())
    }
}

fn is_youtube_link(link: &str) -> bool {
    let without_scheme = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .unwrap_or(link);

    YOUTUBE_HOSTS.iter().any(|host| {
        without_scheme
            .strip_prefix(host)
            .is_some_and(|path| !path.is_empty())
    })
}

/// Comparison applied to a score in a filtered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreComparison {
    /// score <= threshold
    Lte,
    /// score > threshold
    Gt,
}

impl ScoreComparison {
    /// The comparison selecting exactly the rows this one rejects
    pub fn complement(self) -> Self {
        match self {
            ScoreComparison::Lte => ScoreComparison::Gt,
            ScoreComparison::Gt => ScoreComparison::Lte,
        }
    }

    pub fn sql_operator(self) -> &'static str {
        match self {
            ScoreComparison::Lte => "<=",
            ScoreComparison::Gt => ">",
        }
    }

    pub fn matches(self, score: i32, threshold: i32) -> bool {
        match self {
            ScoreComparison::Lte => score <= threshold,
            ScoreComparison::Gt => score > threshold,
        }
    }
}

/// Restricts a listing to one side of a score threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreFilter {
    pub score: i32,
    pub score_filter: ScoreComparison,
}

impl ScoreFilter {
    pub fn new(score: i32, score_filter: ScoreComparison) -> Self {
        Self {
            score,
            score_filter,
        }
    }

    /// Same threshold, opposite side
    pub fn complement(self) -> Self {
        Self::new(self.score, self.score_filter.complement())
    }

    pub fn matches(&self, recommendation: &Recommendation) -> bool {
        self.score_filter.matches(recommendation.score, self.score)
    }
}

/// Direction of a single vote applied to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreChange {
    Increment,
    Decrement,
}

impl ScoreChange {
    pub fn delta(self) -> i32 {
        match self {
            ScoreChange::Increment => 1,
            ScoreChange::Decrement => -1,
        }
    }
}
