//! content-rater/crates/cr-core/src/lib.rs
//!
//! The central domain logic and interface definitions for content-rater:
//! models, storage ports, and the rating aggregation services.

pub mod aggregator;
pub mod analytics;
pub mod catalog;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod query;
pub mod rating_queries;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use aggregator::RatingAggregator;
pub use analytics::AnalyticsService;
pub use catalog::CatalogService;
pub use error::*;
pub use lifecycle::RatingLifecycle;
pub use models::*;
pub use query::*;
pub use rating_queries::RatingQueries;
pub use traits::*;

use std::sync::Arc;

/// One instance of every service, wired to the same pair of stores.
#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<CatalogService>,
    pub lifecycle: Arc<RatingLifecycle>,
    pub ratings: Arc<RatingQueries>,
    pub analytics: Arc<AnalyticsService>,
}

impl Services {
    pub fn new(contents: Arc<dyn ContentRepo>, ratings: Arc<dyn RatingRepo>) -> Self {
        let aggregator = Arc::new(RatingAggregator::new(contents.clone(), ratings.clone()));
        Self {
            catalog: Arc::new(CatalogService::new(contents.clone(), ratings.clone())),
            lifecycle: Arc::new(RatingLifecycle::new(
                contents.clone(),
                ratings.clone(),
                aggregator,
            )),
            ratings: Arc::new(RatingQueries::new(contents.clone(), ratings.clone())),
            analytics: Arc::new(AnalyticsService::new(contents, ratings)),
        }
    }
}
