//! Shared fixtures for the content-rater integration tests.
//!
//! Every scenario runs once per storage adapter so both honour the same
//! contract.

use std::sync::Arc;

use cr_core::{
    AppError, Content, ContentDraft, ContentRepo, Genre, NewRating, RatingRepo, Result, Services,
};
use cr_db_sqlite::SqliteRepo;
use cr_store_memory::{MemoryContentRepo, MemoryRatingRepo};
use uuid::Uuid;

/// A wired service set plus direct handles on its stores.
pub struct Backend {
    pub name: &'static str,
    pub services: Services,
    pub contents: Arc<dyn ContentRepo>,
    pub ratings: Arc<dyn RatingRepo>,
}

impl Backend {
    fn new(name: &'static str, contents: Arc<dyn ContentRepo>, ratings: Arc<dyn RatingRepo>) -> Self {
        Self {
            name,
            services: Services::new(contents.clone(), ratings.clone()),
            contents,
            ratings,
        }
    }

    pub fn memory() -> Self {
        Self::new(
            "memory",
            Arc::new(MemoryContentRepo::new()),
            Arc::new(MemoryRatingRepo::new()),
        )
    }

    pub async fn sqlite() -> Result<Self> {
        let repo = Arc::new(SqliteRepo::new("sqlite::memory:", 1).await?);
        Ok(Self::new("sqlite", repo.clone(), repo))
    }

    pub async fn all() -> Result<Vec<Self>> {
        Ok(vec![Self::memory(), Self::sqlite().await?])
    }

    pub async fn add_content(&self, title: &str) -> Result<Content> {
        self.services.catalog.create(draft(title)).await
    }

    /// Stored summary as `(average_rating, total_ratings)`.
    pub async fn summary(&self, content_id: Uuid) -> Result<(f64, u64)> {
        let content = self
            .contents
            .get(content_id)
            .await?
            .ok_or(AppError::ContentNotFound(content_id))?;
        Ok((content.average_rating, content.total_ratings))
    }
}

pub fn draft(title: &str) -> ContentDraft {
    ContentDraft {
        title: title.to_string(),
        year: 2014,
        duration: 169,
        genre: Genre::SciFi,
        actors: vec!["Matthew McConaughey".into(), "Anne Hathaway".into()],
        description: "Explorers travel through a wormhole in search of a new home.".into(),
    }
}

pub fn new_rating(user_id: &str, content_id: Uuid, rating: i64) -> NewRating {
    NewRating {
        user_id: user_id.to_string(),
        content_id,
        rating,
        comment: None,
    }
}
