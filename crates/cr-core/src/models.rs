//! # Domain Models
//!
//! These structs represent the core entities of content-rater.
//! We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowest accepted star value.
pub const MIN_RATING: i64 = 1;
/// Highest accepted star value.
pub const MAX_RATING: i64 = 5;

/// The fixed set of catalog genres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Comedy,
    Drama,
    Thriller,
    #[serde(rename = "Sci-Fi")]
    SciFi,
    Horror,
    Romance,
    Animation,
    Documentary,
    Fantasy,
}

impl Genre {
    pub const ALL: [Genre; 10] = [
        Genre::Action,
        Genre::Comedy,
        Genre::Drama,
        Genre::Thriller,
        Genre::SciFi,
        Genre::Horror,
        Genre::Romance,
        Genre::Animation,
        Genre::Documentary,
        Genre::Fantasy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Comedy => "Comedy",
            Genre::Drama => "Drama",
            Genre::Thriller => "Thriller",
            Genre::SciFi => "Sci-Fi",
            Genre::Horror => "Horror",
            Genre::Romance => "Romance",
            Genre::Animation => "Animation",
            Genre::Documentary => "Documentary",
            Genre::Fantasy => "Fantasy",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = String;

    /// Case-insensitive; accepts the display form ("Sci-Fi") and "scifi".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Genre::ALL
            .into_iter()
            .find(|g| {
                g.as_str().eq_ignore_ascii_case(wanted)
                    || g.as_str().replace('-', "").eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| format!("unknown genre '{wanted}'"))
    }
}

/// The denormalized rating projection stored on a [`Content`].
///
/// Only [`crate::aggregator::RatingAggregator`] writes it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_ratings: u64,
}

impl RatingSummary {
    pub const EMPTY: RatingSummary = RatingSummary {
        average_rating: 0.0,
        total_ratings: 0,
    };

    /// Builds a summary from a star sum and a row count.
    ///
    /// The mean is rounded half-up to one decimal with integer arithmetic,
    /// so `4.25` becomes `4.3` regardless of float representation.
    pub fn from_totals(totals: RatingTotals) -> Self {
        if totals.count == 0 {
            return Self::EMPTY;
        }
        let n = totals.count as i64;
        let tenths = (totals.sum * 20 + n) / (2 * n);
        Self {
            average_rating: tenths as f64 / 10.0,
            total_ratings: totals.count,
        }
    }

    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        Self::from_totals(values.into_iter().collect())
    }
}

/// Raw count and star sum over some set of ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RatingTotals {
    pub count: u64,
    pub sum: i64,
}

impl FromIterator<i64> for RatingTotals {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |acc, v| Self {
            count: acc.count + 1,
            sum: acc.sum + v,
        })
    }
}

impl RatingTotals {
    /// Mean rounded to two decimals, used by the analytics overview.
    pub fn mean_2dp(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as i64;
        let hundredths = (self.sum * 200 + n) / (2 * n);
        hundredths as f64 / 100.0
    }
}

/// A catalog item (film, series episode, documentary...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: Uuid,
    pub title: String,
    pub year: i32,
    /// Running time in minutes
    pub duration: u32,
    pub genre: Genre,
    pub actors: Vec<String>,
    pub description: String,
    pub average_rating: f64,
    pub total_ratings: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Content {
    pub fn summary(&self) -> RatingSummary {
        RatingSummary {
            average_rating: self.average_rating,
            total_ratings: self.total_ratings,
        }
    }
}

/// The editable, user-supplied part of a [`Content`].
///
/// Used for both creation and full replacement; it has no way to carry
/// rating summary fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDraft {
    pub title: String,
    pub year: i32,
    pub duration: u32,
    pub genre: Genre,
    pub actors: Vec<String>,
    pub description: String,
}

/// A single user's evaluation of a single content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: Uuid,
    pub user_id: String,
    pub content_id: Uuid,
    pub rating: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRating {
    pub user_id: String,
    pub content_id: Uuid,
    pub rating: i64,
    pub comment: Option<String>,
}

/// Partial update of a rating. Identity fields are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingPatch {
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl RatingPatch {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.comment.is_none()
    }

    /// Applies the provided fields onto `rating`, leaving identity untouched.
    /// An empty comment clears it.
    pub fn apply_to(&self, rating: &mut Rating) {
        if let Some(value) = self.rating {
            rating.rating = value;
        }
        if let Some(comment) = &self.comment {
            rating.comment = if comment.is_empty() {
                None
            } else {
                Some(comment.clone())
            };
        }
    }
}

/// Counts per star value, zero-filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RatingDistribution {
    counts: [u64; 5],
}

impl RatingDistribution {
    pub fn record(&mut self, star: i64, count: u64) {
        if (MIN_RATING..=MAX_RATING).contains(&star) {
            self.counts[(star - MIN_RATING) as usize] += count;
        }
    }

    pub fn count(&self, star: i64) -> u64 {
        if (MIN_RATING..=MAX_RATING).contains(&star) {
            self.counts[(star - MIN_RATING) as usize]
        } else {
            0
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl FromIterator<i64> for RatingDistribution {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut dist = Self::default();
        for star in iter {
            dist.record(star, 1);
        }
        dist
    }
}

/// Serialized as `{"1": n, "2": n, ..., "5": n}`.
impl Serialize for RatingDistribution {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(5))?;
        for star in MIN_RATING..=MAX_RATING {
            map.serialize_entry(&star.to_string(), &self.count(star))?;
        }
        map.end()
    }
}

/// Which subset of the Rating collection a read query targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingScope {
    All,
    Content(Uuid),
    User(String),
}

/// Catalog-wide counters used by analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_contents: u64,
    pub contents_with_ratings: u64,
}

/// A content record together with its most recent ratings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetail {
    #[serde(flatten)]
    pub content: Content,
    pub recent_reviews: Vec<Rating>,
}
