//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    CatalogStats, Content, ContentDraft, NewRating, Rating, RatingDistribution, RatingPatch,
    RatingScope, RatingSummary, RatingTotals,
};
use crate::query::{ContentQuery, PageRequest, Paginated};

/// Persistence contract for the Content collection.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ContentRepo: Send + Sync {
    /// Stores a new content with a fresh id and an empty rating summary.
    async fn create(&self, draft: ContentDraft) -> Result<Content>;
    async fn exists(&self, id: Uuid) -> Result<bool>;
    async fn get(&self, id: Uuid) -> Result<Option<Content>>;

    /// Replaces the editable fields. Must never touch the rating summary.
    async fn update_details(&self, id: Uuid, draft: ContentDraft) -> Result<Option<Content>>;
    async fn delete(&self, id: Uuid) -> Result<Option<Content>>;
    async fn list(&self, query: ContentQuery) -> Result<Paginated<Content>>;

    /// Overwrites `average_rating` and `total_ratings` only.
    /// Returns `false` when no content has this id.
    async fn write_summary(&self, id: Uuid, summary: RatingSummary) -> Result<bool>;
    async fn stats(&self) -> Result<CatalogStats>;
}

/// Persistence contract for the Rating collection.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RatingRepo: Send + Sync {
    async fn find_by_user_and_content(
        &self,
        user_id: &str,
        content_id: Uuid,
    ) -> Result<Option<Rating>>;

    /// Assigns id and creation timestamp. Implementations must enforce the
    /// (user_id, content_id) uniqueness at the storage layer and report a
    /// conflict as `AppError::DuplicateRating`.
    async fn insert(&self, rating: NewRating) -> Result<Rating>;
    async fn get(&self, id: Uuid) -> Result<Option<Rating>>;

    /// Applies only the fields present in `patch`.
    async fn update(&self, id: Uuid, patch: RatingPatch) -> Result<Option<Rating>>;
    async fn delete(&self, id: Uuid) -> Result<Option<Rating>>;

    /// Every rating for the content, in no particular order.
    async fn find_all_by_content(&self, content_id: Uuid) -> Result<Vec<Rating>>;

    /// Newest first.
    async fn list(&self, scope: RatingScope, page: PageRequest) -> Result<Paginated<Rating>>;
    async fn distribution(&self, scope: RatingScope) -> Result<RatingDistribution>;
    async fn totals(&self, scope: RatingScope) -> Result<RatingTotals>;
}
