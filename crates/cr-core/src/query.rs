//! # Query Types
//!
//! Pagination and listing parameters shared by the ports and the API layer.

use serde::{Deserialize, Serialize};

use crate::models::Genre;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A 1-based page request. Build from user input through
/// [`PageLimits::request`] to get clamped values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Page-size policy, normally taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

impl PageLimits {
    /// Missing or zero values fall back to defaults; `limit` is capped at `max_limit`.
    pub fn request(&self, page: Option<u32>, limit: Option<u32>) -> PageRequest {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(self.default_limit)
            .min(self.max_limit.max(1));
        PageRequest { page, limit }
    }
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(req: PageRequest, total: u64) -> Self {
        Self {
            page: req.page,
            limit: req.limit,
            total,
            pages: total.div_ceil(u64::from(req.limit)),
        }
    }
}

/// One page of results plus its pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, req: PageRequest, total: u64) -> Self {
        Self {
            items,
            pagination: Pagination::new(req, total),
        }
    }

    /// Slices an already filtered and sorted collection.
    pub fn from_sorted(all: Vec<T>, req: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(req.offset() as usize)
            .take(req.limit as usize)
            .collect();
        Self::new(items, req, total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentSortKey {
    #[default]
    CreatedAt,
    Title,
    Year,
    AverageRating,
    TotalRatings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentSort {
    pub key: ContentSortKey,
    pub order: SortOrder,
}

impl ContentSort {
    pub fn desc(key: ContentSortKey) -> Self {
        Self {
            key,
            order: SortOrder::Desc,
        }
    }
}

/// Which contents a listing returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContentFilter {
    All,
    Genre(Genre),
    /// Contents whose stored summary meets both thresholds.
    MinSummary { min_rating: f64, min_reviews: u64 },
}

/// A full listing request handed to [`crate::traits::ContentRepo::list`].
///
/// `sort` is the primary key; adapters break ties by `total_ratings` desc
/// for rating sorts and by `id` otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentQuery {
    pub filter: ContentFilter,
    pub sort: ContentSort,
    pub page: PageRequest,
}
