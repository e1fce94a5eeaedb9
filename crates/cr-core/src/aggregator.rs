//! # Rating Aggregator
//!
//! Recomputes a content's `average_rating` / `total_ratings` from the full
//! set of its ratings and writes them back. No incremental bookkeeping: every
//! call re-reads the source rows, so a recompute can never drift.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::RatingSummary;
use crate::traits::{ContentRepo, RatingRepo};

const LOCK_STRIPES: usize = 64;

pub struct RatingAggregator {
    contents: Arc<dyn ContentRepo>,
    ratings: Arc<dyn RatingRepo>,
    /// Serializes read-then-write for the same content within this process.
    stripes: [Mutex<()>; LOCK_STRIPES],
}

impl RatingAggregator {
    pub fn new(contents: Arc<dyn ContentRepo>, ratings: Arc<dyn RatingRepo>) -> Self {
        Self {
            contents,
            ratings,
            stripes: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    fn stripe(&self, content_id: Uuid) -> &Mutex<()> {
        &self.stripes[(content_id.as_u128() % LOCK_STRIPES as u128) as usize]
    }

    /// Reads every rating of `content_id`, stores the derived summary and
    /// returns it. Fails with `ContentNotFound` if the content is gone.
    pub async fn recompute(&self, content_id: Uuid) -> Result<RatingSummary> {
        let _guard = self.stripe(content_id).lock().await;

        let rows = self.ratings.find_all_by_content(content_id).await?;
        let summary = RatingSummary::from_values(rows.iter().map(|r| r.rating));

        if !self.contents.write_summary(content_id, summary).await? {
            return Err(AppError::ContentNotFound(content_id));
        }

        debug!(
            %content_id,
            average_rating = summary.average_rating,
            total_ratings = summary.total_ratings,
            "rating summary recomputed"
        );
        Ok(summary)
    }
}
