//! Input normalisation and shape checks applied before anything reaches a store.

use chrono::{Datelike, Utc};

use crate::error::{AppError, Result};
use crate::models::{ContentDraft, NewRating, RatingPatch, MAX_RATING, MIN_RATING};

pub const MAX_TITLE_LEN: usize = 200;
pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_COMMENT_LEN: usize = 1000;
pub const MIN_YEAR: i32 = 1900;

/// Latest accepted release year: two years past the current one.
pub fn max_year() -> i32 {
    Utc::now().year() + 2
}

pub fn check_rating_value(value: i64) -> Result<i64> {
    if (MIN_RATING..=MAX_RATING).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::InvalidRatingValue(value))
    }
}

/// Trims the comment; blank comments become `None`.
fn normalize_comment(comment: Option<String>) -> Result<Option<String>> {
    match comment.map(|c| c.trim().to_string()) {
        Some(c) if c.chars().count() > MAX_COMMENT_LEN => Err(AppError::validation(format!(
            "comment must be at most {MAX_COMMENT_LEN} characters"
        ))),
        Some(c) if c.is_empty() => Ok(None),
        other => Ok(other),
    }
}

pub fn normalize_new_rating(rating: NewRating) -> Result<NewRating> {
    let user_id = rating.user_id.trim().to_string();
    if user_id.is_empty() {
        return Err(AppError::validation("userId is required"));
    }
    Ok(NewRating {
        user_id,
        content_id: rating.content_id,
        rating: check_rating_value(rating.rating)?,
        comment: normalize_comment(rating.comment)?,
    })
}

/// A present-but-blank comment is kept as `Some("")` so the store clears it.
pub fn normalize_patch(patch: RatingPatch) -> Result<RatingPatch> {
    if patch.is_empty() {
        return Err(AppError::validation(
            "at least one of rating or comment is required",
        ));
    }
    let rating = patch.rating.map(check_rating_value).transpose()?;
    let comment = match patch.comment {
        Some(c) => Some(normalize_comment(Some(c))?.unwrap_or_default()),
        None => None,
    };
    Ok(RatingPatch { rating, comment })
}

pub fn normalize_content(draft: ContentDraft) -> Result<ContentDraft> {
    let title = draft.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::validation("title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }

    let max_year = max_year();
    if draft.year < MIN_YEAR || draft.year > max_year {
        return Err(AppError::validation(format!(
            "year must be between {MIN_YEAR} and {max_year}"
        )));
    }

    if draft.duration == 0 {
        return Err(AppError::validation("duration must be at least 1 minute"));
    }

    let mut actors: Vec<String> = Vec::with_capacity(draft.actors.len());
    for actor in draft.actors {
        let actor = actor.trim().to_string();
        if actor.is_empty() {
            return Err(AppError::validation("actor names must not be empty"));
        }
        if !actors.contains(&actor) {
            actors.push(actor);
        }
    }
    if actors.is_empty() {
        return Err(AppError::validation("at least one actor is required"));
    }

    let description = draft.description.trim().to_string();
    let len = description.chars().count();
    if !(MIN_DESCRIPTION_LEN..=MAX_DESCRIPTION_LEN).contains(&len) {
        return Err(AppError::validation(format!(
            "description must be between {MIN_DESCRIPTION_LEN} and {MAX_DESCRIPTION_LEN} characters"
        )));
    }

    Ok(ContentDraft {
        title,
        year: draft.year,
        duration: draft.duration,
        genre: draft.genre,
        actors,
        description,
    })
}
