//! # cr-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `cr-core` domain models. The `(user_id, content_id)` unique index
//! created by the embedded migration is the authoritative duplicate guard.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cr_core::error::{AppError, Result};
use cr_core::models::{
    CatalogStats, Content, ContentDraft, Genre, NewRating, Rating, RatingDistribution,
    RatingPatch, RatingScope, RatingSummary, RatingTotals,
};
use cr_core::query::{
    ContentFilter, ContentQuery, ContentSort, ContentSortKey, PageRequest, Paginated, SortOrder,
};
use cr_core::traits::{ContentRepo, RatingRepo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::info;
use uuid::Uuid;

const CONTENT_COLUMNS: &str = "id, title, year, duration, genre, actors, description, \
     average_rating, total_ratings, created_at, updated_at";
const RATING_COLUMNS: &str = "id, user_id, content_id, rating, comment, created_at";

/// One pool serving both `ContentRepo` and `RatingRepo`.
pub struct SqliteRepo {
    pool: SqlitePool,
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Result<Uuid> {
    Uuid::from_slice(blob).map_err(AppError::internal)
}

fn db_err(err: sqlx::Error) -> AppError {
    AppError::internal(err)
}

impl SqliteRepo {
    /// Opens (creating if missing) the database at `url` and runs migrations.
    ///
    /// An in-memory database lives only as long as its connection, so it gets
    /// a single connection that is never recycled.
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true);

        let in_memory = url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            pool_options.max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await.map_err(db_err)?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(AppError::internal)?;

        info!(in_memory, "sqlite store ready");
        Ok(Self { pool })
    }
}

fn row_to_content(row: &SqliteRow) -> Result<Content> {
    let genre: String = row.try_get("genre").map_err(db_err)?;
    let actors: String = row.try_get("actors").map_err(db_err)?;
    let duration: i64 = row.try_get("duration").map_err(db_err)?;
    let total_ratings: i64 = row.try_get("total_ratings").map_err(db_err)?;

    Ok(Content {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id").map_err(db_err)?.as_slice())?,
        title: row.try_get("title").map_err(db_err)?,
        year: row.try_get("year").map_err(db_err)?,
        duration: u32::try_from(duration).map_err(AppError::internal)?,
        genre: Genre::from_str(&genre).map_err(AppError::Internal)?,
        actors: serde_json::from_str(&actors).map_err(AppError::internal)?,
        description: row.try_get("description").map_err(db_err)?,
        average_rating: row.try_get("average_rating").map_err(db_err)?,
        total_ratings: u64::try_from(total_ratings).map_err(AppError::internal)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn row_to_rating(row: &SqliteRow) -> Result<Rating> {
    Ok(Rating {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id").map_err(db_err)?.as_slice())?,
        user_id: row.try_get("user_id").map_err(db_err)?,
        content_id: blob_to_uuid(
            row.try_get::<Vec<u8>, _>("content_id")
                .map_err(db_err)?
                .as_slice(),
        )?,
        rating: row.try_get("rating").map_err(db_err)?,
        comment: row.try_get("comment").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn push_content_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: ContentFilter) {
    match filter {
        ContentFilter::All => {}
        ContentFilter::Genre(genre) => {
            qb.push(" WHERE genre = ").push_bind(genre.as_str());
        }
        ContentFilter::MinSummary {
            min_rating,
            min_reviews,
        } => {
            qb.push(" WHERE average_rating >= ")
                .push_bind(min_rating)
                .push(" AND total_ratings >= ")
                .push_bind(i64::try_from(min_reviews).unwrap_or(i64::MAX));
        }
    }
}

/// Column names come from a closed enum, never from user input.
fn order_by(sort: ContentSort) -> String {
    let dir = match sort.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    match sort.key {
        ContentSortKey::CreatedAt => format!("created_at {dir}, id ASC"),
        ContentSortKey::Title => format!("title {dir}, id ASC"),
        ContentSortKey::Year => format!("year {dir}, id ASC"),
        ContentSortKey::AverageRating => {
            format!("average_rating {dir}, total_ratings DESC, id ASC")
        }
        ContentSortKey::TotalRatings => {
            format!("total_ratings {dir}, average_rating DESC, id ASC")
        }
    }
}

fn push_rating_scope(qb: &mut QueryBuilder<'_, Sqlite>, scope: RatingScope) {
    match scope {
        RatingScope::All => {}
        RatingScope::Content(id) => {
            qb.push(" WHERE content_id = ").push_bind(uuid_to_blob(id));
        }
        RatingScope::User(user_id) => {
            qb.push(" WHERE user_id = ").push_bind(user_id);
        }
    }
}

#[async_trait]
impl ContentRepo for SqliteRepo {
    async fn create(&self, draft: ContentDraft) -> Result<Content> {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let actors = serde_json::to_string(&draft.actors).map_err(AppError::internal)?;

        let row = sqlx::query(&format!(
            "INSERT INTO contents (id, title, year, duration, genre, actors, description, \
             average_rating, total_ratings, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?) RETURNING {CONTENT_COLUMNS}"
        ))
        .bind(uuid_to_blob(id))
        .bind(&draft.title)
        .bind(draft.year)
        .bind(i64::from(draft.duration))
        .bind(draft.genre.as_str())
        .bind(actors)
        .bind(&draft.description)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        row_to_content(&row)
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let found = sqlx::query("SELECT 1 FROM contents WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Content>> {
        sqlx::query(&format!("SELECT {CONTENT_COLUMNS} FROM contents WHERE id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .as_ref()
            .map(row_to_content)
            .transpose()
    }

    /// Touches only the editable columns; the summary columns are not listed.
    async fn update_details(&self, id: Uuid, draft: ContentDraft) -> Result<Option<Content>> {
        let actors = serde_json::to_string(&draft.actors).map_err(AppError::internal)?;
        sqlx::query(&format!(
            "UPDATE contents SET title = ?, year = ?, duration = ?, genre = ?, actors = ?, \
             description = ?, updated_at = ? WHERE id = ? RETURNING {CONTENT_COLUMNS}"
        ))
        .bind(&draft.title)
        .bind(draft.year)
        .bind(i64::from(draft.duration))
        .bind(draft.genre.as_str())
        .bind(actors)
        .bind(&draft.description)
        .bind(Utc::now())
        .bind(uuid_to_blob(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .as_ref()
        .map(row_to_content)
        .transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Content>> {
        sqlx::query(&format!(
            "DELETE FROM contents WHERE id = ? RETURNING {CONTENT_COLUMNS}"
        ))
        .bind(uuid_to_blob(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .as_ref()
        .map(row_to_content)
        .transpose()
    }

    async fn list(&self, query: ContentQuery) -> Result<Paginated<Content>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM contents");
        push_content_filter(&mut count, query.filter);
        let total: i64 = count
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?
            .try_get(0)
            .map_err(db_err)?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {CONTENT_COLUMNS} FROM contents"));
        push_content_filter(&mut select, query.filter);
        select
            .push(" ORDER BY ")
            .push(order_by(query.sort))
            .push(" LIMIT ")
            .push_bind(i64::from(query.page.limit))
            .push(" OFFSET ")
            .push_bind(query.page.offset() as i64);

        let items = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(row_to_content)
            .collect::<Result<Vec<_>>>()?;

        Ok(Paginated::new(items, query.page, total as u64))
    }

    async fn write_summary(&self, id: Uuid, summary: RatingSummary) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE contents SET average_rating = ?, total_ratings = ? WHERE id = ?",
        )
        .bind(summary.average_rating)
        .bind(i64::try_from(summary.total_ratings).map_err(AppError::internal)?)
        .bind(uuid_to_blob(id))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(done.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<CatalogStats> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total, \
             COALESCE(SUM(CASE WHEN total_ratings > 0 THEN 1 ELSE 0 END), 0) AS rated \
             FROM contents",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(CatalogStats {
            total_contents: row.try_get::<i64, _>("total").map_err(db_err)? as u64,
            contents_with_ratings: row.try_get::<i64, _>("rated").map_err(db_err)? as u64,
        })
    }
}

#[async_trait]
impl RatingRepo for SqliteRepo {
    async fn find_by_user_and_content(
        &self,
        user_id: &str,
        content_id: Uuid,
    ) -> Result<Option<Rating>> {
        sqlx::query(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE user_id = ? AND content_id = ?"
        ))
        .bind(user_id)
        .bind(uuid_to_blob(content_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .as_ref()
        .map(row_to_rating)
        .transpose()
    }

    /// A unique-index violation means a concurrent create for the same pair
    /// committed first.
    async fn insert(&self, rating: NewRating) -> Result<Rating> {
        let result = sqlx::query(&format!(
            "INSERT INTO ratings (id, user_id, content_id, rating, comment, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {RATING_COLUMNS}"
        ))
        .bind(uuid_to_blob(Uuid::now_v7()))
        .bind(&rating.user_id)
        .bind(uuid_to_blob(rating.content_id))
        .bind(rating.rating)
        .bind(&rating.comment)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => row_to_rating(&row),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::DuplicateRating {
                    user_id: rating.user_id,
                    content_id: rating.content_id,
                })
            }
            Err(err) => Err(db_err(err)),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Rating>> {
        sqlx::query(&format!("SELECT {RATING_COLUMNS} FROM ratings WHERE id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .as_ref()
            .map(row_to_rating)
            .transpose()
    }

    /// Single statement so the returned row is exactly what was written.
    async fn update(&self, id: Uuid, patch: RatingPatch) -> Result<Option<Rating>> {
        let has_comment = patch.comment.is_some();
        let comment = patch.comment.filter(|c| !c.is_empty());

        sqlx::query(&format!(
            "UPDATE ratings SET rating = COALESCE(?, rating), \
             comment = CASE WHEN ? THEN ? ELSE comment END \
             WHERE id = ? RETURNING {RATING_COLUMNS}"
        ))
        .bind(patch.rating)
        .bind(has_comment)
        .bind(comment)
        .bind(uuid_to_blob(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .as_ref()
        .map(row_to_rating)
        .transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Rating>> {
        sqlx::query(&format!(
            "DELETE FROM ratings WHERE id = ? RETURNING {RATING_COLUMNS}"
        ))
        .bind(uuid_to_blob(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .as_ref()
        .map(row_to_rating)
        .transpose()
    }

    async fn find_all_by_content(&self, content_id: Uuid) -> Result<Vec<Rating>> {
        sqlx::query(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE content_id = ?"
        ))
        .bind(uuid_to_blob(content_id))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(row_to_rating)
        .collect()
    }

    async fn list(&self, scope: RatingScope, page: PageRequest) -> Result<Paginated<Rating>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ratings");
        push_rating_scope(&mut count, scope.clone());
        let total: i64 = count
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?
            .try_get(0)
            .map_err(db_err)?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {RATING_COLUMNS} FROM ratings"));
        push_rating_scope(&mut select, scope);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let items = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(row_to_rating)
            .collect::<Result<Vec<_>>>()?;

        Ok(Paginated::new(items, page, total as u64))
    }

    async fn distribution(&self, scope: RatingScope) -> Result<RatingDistribution> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT rating, COUNT(*) AS n FROM ratings");
        push_rating_scope(&mut qb, scope);
        qb.push(" GROUP BY rating");

        let mut dist = RatingDistribution::default();
        for row in qb.build().fetch_all(&self.pool).await.map_err(db_err)? {
            let star: i64 = row.try_get("rating").map_err(db_err)?;
            let n: i64 = row.try_get("n").map_err(db_err)?;
            dist.record(star, n as u64);
        }
        Ok(dist)
    }

    async fn totals(&self, scope: RatingScope) -> Result<RatingTotals> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) AS n, COALESCE(SUM(rating), 0) AS s FROM ratings",
        );
        push_rating_scope(&mut qb, scope);

        let row = qb.build().fetch_one(&self.pool).await.map_err(db_err)?;
        Ok(RatingTotals {
            count: row.try_get::<i64, _>("n").map_err(db_err)? as u64,
            sum: row.try_get("s").map_err(db_err)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:", 1)
            .await
            .expect("in-memory sqlite")
    }

    fn draft() -> ContentDraft {
        ContentDraft {
            title: "Spirited Away".into(),
            year: 2001,
            duration: 125,
            genre: Genre::Animation,
            actors: vec!["Rumi Hiiragi".into(), "Miyu Irino".into()],
            description: "A girl wanders into a world of spirits.".into(),
        }
    }

    fn new_rating(user: &str, content_id: Uuid, value: i64) -> NewRating {
        NewRating {
            user_id: user.into(),
            content_id,
            rating: value,
            comment: Some("great".into()),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_content() {
        let repo = repo().await;
        let created = repo.create(draft()).await.unwrap();
        assert_eq!(created.total_ratings, 0);
        assert_eq!(created.average_rating, 0.0);

        let fetched = ContentRepo::get(&repo, created.id).await.unwrap().unwrap();
        assert_eq!(fetched.actors, created.actors);
        assert_eq!(fetched.genre, Genre::Animation);
        assert!(repo.exists(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unique_index_maps_to_duplicate() {
        let repo = repo().await;
        let content_id = Uuid::now_v7();
        repo.insert(new_rating("u1", content_id, 4)).await.unwrap();

        let err = repo
            .insert(new_rating("u1", content_id, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateRating { ref user_id, .. } if user_id == "u1"));
    }

    #[tokio::test]
    async fn test_update_applies_only_provided_fields() {
        let repo = repo().await;
        let content_id = Uuid::now_v7();
        let original = repo.insert(new_rating("u1", content_id, 4)).await.unwrap();

        let updated = RatingRepo::update(
            &repo,
            original.id,
            RatingPatch {
                rating: Some(2),
                comment: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.rating, 2);
        assert_eq!(updated.comment.as_deref(), Some("great"));
        assert_eq!(updated.user_id, original.user_id);
        assert_eq!(updated.content_id, original.content_id);
        assert_eq!(updated.created_at, original.created_at);

        let cleared = RatingRepo::update(
            &repo,
            original.id,
            RatingPatch {
                rating: None,
                comment: Some(String::new()),
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(cleared.comment, None);
        assert_eq!(cleared.rating, 2);
    }

    #[tokio::test]
    async fn test_summary_write_touches_only_summary() {
        let repo = repo().await;
        let created = repo.create(draft()).await.unwrap();
        let summary = RatingSummary {
            average_rating: 4.5,
            total_ratings: 2,
        };
        assert!(repo.write_summary(created.id, summary).await.unwrap());
        assert!(!repo.write_summary(Uuid::now_v7(), summary).await.unwrap());

        let fetched = ContentRepo::get(&repo, created.id).await.unwrap().unwrap();
        assert_eq!(fetched.summary(), summary);
        assert_eq!(fetched.title, created.title);
        assert_eq!(fetched.updated_at, created.updated_at);
    }

    #[tokio::test]
    async fn test_distribution_and_totals() {
        let repo = repo().await;
        let content_id = Uuid::now_v7();
        for (user, value) in [("a", 5), ("b", 5), ("c", 3)] {
            repo.insert(new_rating(user, content_id, value)).await.unwrap();
        }
        repo.insert(new_rating("a", Uuid::now_v7(), 1)).await.unwrap();

        let dist = repo
            .distribution(RatingScope::Content(content_id))
            .await
            .unwrap();
        assert_eq!(dist.count(5), 2);
        assert_eq!(dist.count(3), 1);
        assert_eq!(dist.count(1), 0);

        let totals = repo.totals(RatingScope::User("a".into())).await.unwrap();
        assert_eq!(totals, RatingTotals { count: 2, sum: 6 });

        let page = RatingRepo::list(
            &repo,
            RatingScope::All,
            PageRequest { page: 1, limit: 3 },
        )
        .await
        .unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.pagination.total, 4);
        assert_eq!(page.pagination.pages, 2);
    }
}
