//! # cr-store-memory
//!
//! `DashMap`-backed implementation of `ContentRepo` and `RatingRepo`.
//! Nothing survives a restart; used for tests, demos and the `db-memory` build.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use cr_core::error::{AppError, Result};
use cr_core::models::{
    CatalogStats, Content, ContentDraft, NewRating, Rating, RatingDistribution, RatingPatch,
    RatingScope, RatingSummary, RatingTotals,
};
use cr_core::query::{
    ContentFilter, ContentQuery, ContentSort, ContentSortKey, PageRequest, Paginated, SortOrder,
};
use cr_core::traits::{ContentRepo, RatingRepo};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryContentRepo {
    contents: DashMap<Uuid, Content>,
}

impl MemoryContentRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filter(content: &Content, filter: &ContentFilter) -> bool {
    match filter {
        ContentFilter::All => true,
        ContentFilter::Genre(genre) => content.genre == *genre,
        ContentFilter::MinSummary {
            min_rating,
            min_reviews,
        } => content.average_rating >= *min_rating && content.total_ratings >= *min_reviews,
    }
}

/// Mirrors the ORDER BY clauses of the SQLite adapter.
fn compare(a: &Content, b: &Content, sort: ContentSort) -> Ordering {
    let primary = match sort.key {
        ContentSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        ContentSortKey::Title => a.title.cmp(&b.title),
        ContentSortKey::Year => a.year.cmp(&b.year),
        ContentSortKey::AverageRating => a.average_rating.total_cmp(&b.average_rating),
        ContentSortKey::TotalRatings => a.total_ratings.cmp(&b.total_ratings),
    };
    let primary = match sort.order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    let secondary = match sort.key {
        ContentSortKey::AverageRating => b.total_ratings.cmp(&a.total_ratings),
        ContentSortKey::TotalRatings => b.average_rating.total_cmp(&a.average_rating),
        _ => Ordering::Equal,
    };
    primary.then(secondary).then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl ContentRepo for MemoryContentRepo {
    async fn create(&self, draft: ContentDraft) -> Result<Content> {
        let now = Utc::now();
        let content = Content {
            id: Uuid::now_v7(),
            title: draft.title,
            year: draft.year,
            duration: draft.duration,
            genre: draft.genre,
            actors: draft.actors,
            description: draft.description,
            average_rating: 0.0,
            total_ratings: 0,
            created_at: now,
            updated_at: now,
        };
        self.contents.insert(content.id, content.clone());
        Ok(content)
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.contents.contains_key(&id))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Content>> {
        Ok(self.contents.get(&id).map(|c| c.value().clone()))
    }

    async fn update_details(&self, id: Uuid, draft: ContentDraft) -> Result<Option<Content>> {
        Ok(self.contents.get_mut(&id).map(|mut c| {
            c.title = draft.title;
            c.year = draft.year;
            c.duration = draft.duration;
            c.genre = draft.genre;
            c.actors = draft.actors;
            c.description = draft.description;
            c.updated_at = Utc::now();
            c.value().clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Content>> {
        Ok(self.contents.remove(&id).map(|(_, c)| c))
    }

    async fn list(&self, query: ContentQuery) -> Result<Paginated<Content>> {
        let mut all: Vec<Content> = self
            .contents
            .iter()
            .filter(|c| matches_filter(c.value(), &query.filter))
            .map(|c| c.value().clone())
            .collect();
        all.sort_by(|a, b| compare(a, b, query.sort));
        Ok(Paginated::from_sorted(all, query.page))
    }

    async fn write_summary(&self, id: Uuid, summary: RatingSummary) -> Result<bool> {
        match self.contents.get_mut(&id) {
            Some(mut c) => {
                c.average_rating = summary.average_rating;
                c.total_ratings = summary.total_ratings;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn stats(&self) -> Result<CatalogStats> {
        let mut stats = CatalogStats::default();
        for c in self.contents.iter() {
            stats.total_contents += 1;
            if c.total_ratings > 0 {
                stats.contents_with_ratings += 1;
            }
        }
        Ok(stats)
    }
}

/// Ratings keyed by id plus a (user_id, content_id) index that acts as the
/// unique constraint: an insert only proceeds while holding the vacant index
/// entry, so two concurrent inserts for one pair cannot both win.
#[derive(Default)]
pub struct MemoryRatingRepo {
    ratings: DashMap<Uuid, Rating>,
    by_pair: DashMap<(String, Uuid), Uuid>,
}

impl MemoryRatingRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn scoped(&self, scope: &RatingScope) -> Vec<Rating> {
        self.ratings
            .iter()
            .filter(|r| match scope {
                RatingScope::All => true,
                RatingScope::Content(id) => r.content_id == *id,
                RatingScope::User(user_id) => r.user_id == *user_id,
            })
            .map(|r| r.value().clone())
            .collect()
    }
}

#[async_trait]
impl RatingRepo for MemoryRatingRepo {
    async fn find_by_user_and_content(
        &self,
        user_id: &str,
        content_id: Uuid,
    ) -> Result<Option<Rating>> {
        let Some(id) = self
            .by_pair
            .get(&(user_id.to_string(), content_id))
            .map(|e| *e.value())
        else {
            return Ok(None);
        };
        Ok(self.ratings.get(&id).map(|r| r.value().clone()))
    }

    async fn insert(&self, rating: NewRating) -> Result<Rating> {
        match self.by_pair.entry((rating.user_id.clone(), rating.content_id)) {
            Entry::Occupied(_) => Err(AppError::DuplicateRating {
                user_id: rating.user_id,
                content_id: rating.content_id,
            }),
            Entry::Vacant(slot) => {
                let stored = Rating {
                    id: Uuid::now_v7(),
                    user_id: rating.user_id,
                    content_id: rating.content_id,
                    rating: rating.rating,
                    comment: rating.comment,
                    created_at: Utc::now(),
                };
                self.ratings.insert(stored.id, stored.clone());
                slot.insert(stored.id);
                Ok(stored)
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Rating>> {
        Ok(self.ratings.get(&id).map(|r| r.value().clone()))
    }

    async fn update(&self, id: Uuid, patch: RatingPatch) -> Result<Option<Rating>> {
        Ok(self.ratings.get_mut(&id).map(|mut r| {
            patch.apply_to(r.value_mut());
            r.value().clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Rating>> {
        let Some((_, removed)) = self.ratings.remove(&id) else {
            return Ok(None);
        };
        self.by_pair
            .remove_if(&(removed.user_id.clone(), removed.content_id), |_, v| *v == id);
        Ok(Some(removed))
    }

    async fn find_all_by_content(&self, content_id: Uuid) -> Result<Vec<Rating>> {
        Ok(self.scoped(&RatingScope::Content(content_id)))
    }

    async fn list(&self, scope: RatingScope, page: PageRequest) -> Result<Paginated<Rating>> {
        let mut all = self.scoped(&scope);
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(Paginated::from_sorted(all, page))
    }

    async fn distribution(&self, scope: RatingScope) -> Result<RatingDistribution> {
        Ok(self.scoped(&scope).iter().map(|r| r.rating).collect())
    }

    async fn totals(&self, scope: RatingScope) -> Result<RatingTotals> {
        Ok(self.scoped(&scope).iter().map(|r| r.rating).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cr_core::models::Genre;
    use std::sync::Arc;

    fn new_rating(user: &str, content_id: Uuid, value: i64) -> NewRating {
        NewRating {
            user_id: user.into(),
            content_id,
            rating: value,
            comment: None,
        }
    }

    fn draft(title: &str, genre: Genre) -> ContentDraft {
        ContentDraft {
            title: title.into(),
            year: 2001,
            duration: 90,
            genre,
            actors: vec!["Someone".into()],
            description: "Long enough description.".into(),
        }
    }

    #[tokio::test]
    async fn second_insert_for_pair_is_duplicate() {
        let repo = MemoryRatingRepo::new();
        let content_id = Uuid::now_v7();
        repo.insert(new_rating("u1", content_id, 4)).await.unwrap();

        let err = repo
            .insert(new_rating("u1", content_id, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateRating { .. }));
        assert_eq!(repo.find_all_by_content(content_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_frees_the_pair() {
        let repo = MemoryRatingRepo::new();
        let content_id = Uuid::now_v7();
        let first = repo.insert(new_rating("u1", content_id, 4)).await.unwrap();

        assert!(repo.delete(first.id).await.unwrap().is_some());
        assert!(repo.delete(first.id).await.unwrap().is_none());
        assert!(repo
            .find_by_user_and_content("u1", content_id)
            .await
            .unwrap()
            .is_none());
        repo.insert(new_rating("u1", content_id, 5)).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_inserts_for_one_pair_admit_exactly_one() {
        let repo = Arc::new(MemoryRatingRepo::new());
        let content_id = Uuid::now_v7();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.insert(new_rating("u1", content_id, 1 + i % 5)).await })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn summary_write_and_filtering() {
        let repo = MemoryContentRepo::new();
        let a = repo.create(draft("A", Genre::Drama)).await.unwrap();
        let b = repo.create(draft("B", Genre::Drama)).await.unwrap();
        repo.create(draft("C", Genre::Horror)).await.unwrap();

        assert!(repo
            .write_summary(a.id, RatingSummary { average_rating: 4.8, total_ratings: 120 })
            .await
            .unwrap());
        assert!(repo
            .write_summary(b.id, RatingSummary { average_rating: 4.8, total_ratings: 300 })
            .await
            .unwrap());
        assert!(!repo
            .write_summary(Uuid::now_v7(), RatingSummary::EMPTY)
            .await
            .unwrap());

        let top = repo
            .list(ContentQuery {
                filter: ContentFilter::MinSummary { min_rating: 4.5, min_reviews: 100 },
                sort: ContentSort::desc(ContentSortKey::AverageRating),
                page: PageRequest::default(),
            })
            .await
            .unwrap();
        let titles: Vec<_> = top.items.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);

        let drama = repo
            .list(ContentQuery {
                filter: ContentFilter::Genre(Genre::Drama),
                sort: ContentSort::default(),
                page: PageRequest::default(),
            })
            .await
            .unwrap();
        assert_eq!(drama.pagination.total, 2);

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_contents, 3);
        assert_eq!(stats.contents_with_ratings, 2);
    }

    #[tokio::test]
    async fn update_details_leaves_summary_alone() {
        let repo = MemoryContentRepo::new();
        let c = repo.create(draft("Old", Genre::Comedy)).await.unwrap();
        repo.write_summary(c.id, RatingSummary { average_rating: 3.0, total_ratings: 1 })
            .await
            .unwrap();

        let updated = repo
            .update_details(c.id, draft("New", Genre::Comedy))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.total_ratings, 1);
        assert_eq!(updated.created_at, c.created_at);
    }
}
