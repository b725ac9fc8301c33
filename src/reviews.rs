use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use crate::{
    entities::{film, review},
    error::{AppError, AppResult, is_unique_violation},
    models::{CONTENT_MAX_LENGTH, MAX_RATING, MIN_RATING, NewReview, ReviewView},
};

fn check_rating(rating: Option<i64>) -> AppResult<i32> {
    let rating = rating.ok_or_else(|| AppError::validation("Rating required."))?;
    if !(i64::from(MIN_RATING)..=i64::from(MAX_RATING)).contains(&rating) {
        return Err(AppError::validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}."
        )));
    }
    Ok(rating as i32)
}

pub async fn add_review<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    req: NewReview,
) -> AppResult<review::Model> {
    let film_id = req.film_id.ok_or_else(|| AppError::validation("Film ID required."))?;
    let rating = check_rating(req.rating)?;
    let content = req.content.filter(|c| !c.trim().is_empty());
    if content.as_ref().is_some_and(|c| c.chars().count() > CONTENT_MAX_LENGTH) {
        return Err(AppError::validation(format!(
            "Review cannot exceed {CONTENT_MAX_LENGTH} characters."
        )));
    }

    if film::Entity::find_by_id(film_id).one(db).await?.is_none() {
        return Err(AppError::not_found("Film not found."));
    }

    let created = review::ActiveModel {
        rating: Set(Some(rating)),
        content: Set(content),
        user_id: Set(Some(user_id)),
        film_id: Set(Some(film_id)),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::conflict("User can only post one review about each film.")
        } else {
            err.into()
        }
    })?;

    info!(id = created.id, user_id, film_id, rating, "added review");
    Ok(created)
}

pub async fn delete_review<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    review_id: Option<i32>,
) -> AppResult<()> {
    let review_id = review_id.ok_or_else(|| AppError::validation("Review ID required."))?;
    let review = review::Entity::find_by_id(review_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Review not found."))?;
    if review.user_id != Some(user_id) {
        return Err(AppError::forbidden("You can only delete your own reviews."));
    }
    review.delete(db).await?;
    info!(id = review_id, user_id, "deleted review");
    Ok(())
}

pub async fn reviews_by_user<C: ConnectionTrait>(db: &C, user_id: i32) -> AppResult<Vec<ReviewView>> {
    let rows = review::Entity::find()
        .filter(review::Column::UserId.eq(user_id))
        .order_by_asc(review::Column::Id)
        .find_also_related(film::Entity)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|(review, film)| view(review, film.map(|f| f.name))).collect())
}

pub async fn reviews_for_film<C: ConnectionTrait>(db: &C, film_id: i32) -> AppResult<Vec<ReviewView>> {
    let film = film::Entity::find_by_id(film_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Film not found."))?;
    let reviews = review::Entity::find()
        .filter(review::Column::FilmId.eq(film.id))
        .order_by_asc(review::Column::Id)
        .all(db)
        .await?;
    Ok(reviews.into_iter().map(|r| view(r, Some(film.name.clone()))).collect())
}

fn view(review: review::Model, film: Option<String>) -> ReviewView {
    ReviewView {
        id: review.id,
        user_id: review.user_id,
        film_id: review.film_id,
        film,
        content: review.content,
        rating: review.rating,
    }
}
