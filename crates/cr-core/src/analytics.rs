//! # Analytics
//!
//! Dashboard views built on the stored rating summaries and the raw Rating
//! collection. Nothing here writes.

use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::models::{Content, Rating, RatingDistribution, RatingScope};
use crate::query::{
    ContentFilter, ContentQuery, ContentSort, ContentSortKey, PageRequest,
};
use crate::traits::{ContentRepo, RatingRepo};

/// Minimum rating count for a content to appear in "top rated".
pub const TOP_RATED_MIN_REVIEWS: u64 = 10;
pub const DASHBOARD_LIST_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_contents: u64,
    pub total_ratings: u64,
    /// Mean over every rating, two decimals
    pub average_rating: f64,
    pub contents_with_reviews: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub overview: Overview,
    pub top_rated_contents: Vec<Content>,
    pub most_popular: Vec<Content>,
    pub recent_ratings: Vec<Rating>,
    pub rating_distribution: RatingDistribution,
}

pub struct AnalyticsService {
    contents: Arc<dyn ContentRepo>,
    ratings: Arc<dyn RatingRepo>,
}

impl AnalyticsService {
    pub fn new(contents: Arc<dyn ContentRepo>, ratings: Arc<dyn RatingRepo>) -> Self {
        Self { contents, ratings }
    }

    pub async fn overview(&self) -> Result<Overview> {
        let (stats, totals) = tokio::try_join!(
            self.contents.stats(),
            self.ratings.totals(RatingScope::All)
        )?;
        Ok(Overview {
            total_contents: stats.total_contents,
            total_ratings: totals.count,
            average_rating: totals.mean_2dp(),
            contents_with_reviews: stats.contents_with_ratings,
        })
    }

    pub async fn distribution(&self) -> Result<RatingDistribution> {
        self.ratings.distribution(RatingScope::All).await
    }

    async fn top_by(&self, key: ContentSortKey, min_reviews: u64) -> Result<Vec<Content>> {
        let page = self
            .contents
            .list(ContentQuery {
                filter: ContentFilter::MinSummary {
                    min_rating: 0.0,
                    min_reviews,
                },
                sort: ContentSort::desc(key),
                page: PageRequest {
                    page: 1,
                    limit: DASHBOARD_LIST_SIZE,
                },
            })
            .await?;
        Ok(page.items)
    }

    async fn recent_ratings(&self) -> Result<Vec<Rating>> {
        let page = self
            .ratings
            .list(
                RatingScope::All,
                PageRequest {
                    page: 1,
                    limit: DASHBOARD_LIST_SIZE,
                },
            )
            .await?;
        Ok(page.items)
    }

    pub async fn dashboard(&self) -> Result<Dashboard> {
        let (overview, top_rated_contents, most_popular, recent_ratings, rating_distribution) =
            tokio::try_join!(
                self.overview(),
                self.top_by(ContentSortKey::AverageRating, TOP_RATED_MIN_REVIEWS),
                self.top_by(ContentSortKey::TotalRatings, 1),
                self.recent_ratings(),
                self.distribution(),
            )?;
        Ok(Dashboard {
            overview,
            top_rated_contents,
            most_popular,
            recent_ratings,
            rating_distribution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogStats, RatingTotals};
    use crate::traits::{MockContentRepo, MockRatingRepo};

    #[tokio::test]
    async fn overview_combines_both_collections() {
        let mut contents = MockContentRepo::new();
        contents.expect_stats().returning(|| {
            Ok(CatalogStats {
                total_contents: 3,
                contents_with_ratings: 2,
            })
        });
        let mut ratings = MockRatingRepo::new();
        ratings
            .expect_totals()
            .returning(|_| Ok(RatingTotals { count: 3, sum: 11 }));

        let overview = AnalyticsService::new(Arc::new(contents), Arc::new(ratings))
            .overview()
            .await
            .unwrap();
        assert_eq!(
            overview,
            Overview {
                total_contents: 3,
                total_ratings: 3,
                average_rating: 3.67,
                contents_with_reviews: 2,
            }
        );
    }
}
