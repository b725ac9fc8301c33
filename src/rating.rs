use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QuerySelect,
    RelationTrait, Select,
    sea_query::{Expr, Func, SimpleExpr},
};

use crate::{
    db::ID_BATCH,
    entities::{film, review},
    error::AppResult,
};

/// `AVG(COALESCE(review.rating, 0))`. Evaluated over a LEFT JOIN from film,
/// an unrated review counts as zero and a film without reviews averages to 0.
pub fn avg_rating_expr() -> SimpleExpr {
    let rating: SimpleExpr = Expr::col((review::Entity, review::Column::Rating)).into();
    let zero: SimpleExpr = Expr::val(0).into();
    Func::avg(Func::coalesce([rating, zero])).into()
}

/// Film ids grouped with their reviews, ready for an aggregate column or a
/// `HAVING` clause on [`avg_rating_expr`].
pub fn films_with_reviews() -> Select<film::Entity> {
    film::Entity::find()
        .select_only()
        .column(film::Column::Id)
        .join(JoinType::LeftJoin, film::Relation::Review.def())
        .group_by(film::Column::Id)
}

#[derive(Debug, FromQueryResult)]
struct FilmAverage {
    id: i32,
    avg_rating: Option<f64>,
}

pub async fn average_ratings<C: ConnectionTrait>(
    db: &C,
    film_ids: &[i32],
) -> AppResult<HashMap<i32, f64>> {
    let mut averages = HashMap::with_capacity(film_ids.len());
    for batch in film_ids.chunks(ID_BATCH) {
        let rows = films_with_reviews()
            .column_as(avg_rating_expr(), "avg_rating")
            .filter(film::Column::Id.is_in(batch.iter().copied()))
            .into_model::<FilmAverage>()
            .all(db)
            .await?;
        averages.extend(rows.into_iter().map(|row| (row.id, row.avg_rating.unwrap_or(0.0))));
    }
    Ok(averages)
}

pub async fn average_rating<C: ConnectionTrait>(db: &C, film_id: i32) -> AppResult<f64> {
    let averages = average_ratings(db, &[film_id]).await?;
    Ok(averages.get(&film_id).copied().unwrap_or(0.0))
}
