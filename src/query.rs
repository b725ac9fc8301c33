//! Film search composition.
//!
//! A search is three groups of films intersected with each other:
//!
//! * the text group, the *union* of every requested substring match (film
//!   name, director name, cast member name, genre, description);
//! * the release group, films released within the requested date bounds;
//! * the rating group, films whose average rating is within the requested
//!   bounds.
//!
//! A group with nothing requested does not restrict the result. Each group
//! compiles to a condition on `film` so the whole search runs as one query.

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    QueryTrait,
    sea_query::{Expr, Func, IntoColumnRef, LikeExpr, Query, SimpleExpr},
};
use tracing::debug;

use crate::{
    entities::{actor, director, film, film_cast},
    error::AppResult,
    filter::FilmFilter,
    rating,
};

pub async fn find_films<C: ConnectionTrait>(
    db: &C,
    filter: &FilmFilter,
) -> AppResult<Vec<film::Model>> {
    let films = film::Entity::find()
        .filter(search_condition(filter))
        .order_by_asc(film::Column::Id)
        .all(db)
        .await?;

    debug!(?filter, matched = films.len(), "film search");
    Ok(films)
}

pub fn search_condition(filter: &FilmFilter) -> Condition {
    Condition::all()
        .add_option(text_group(filter))
        .add_option(release_group(filter))
        .add_option(rating_group(filter))
}

fn text_group(filter: &FilmFilter) -> Option<Condition> {
    if !filter.has_text_filter() {
        return None;
    }

    let mut any = Condition::any();

    if let Some(name) = &filter.film_name {
        any = any.add(icontains((film::Entity, film::Column::Name), name));
    }

    if let Some(name) = &filter.director_name {
        let directors = Query::select()
            .column((director::Entity, director::Column::Id))
            .from(director::Entity)
            .and_where(icontains((director::Entity, director::Column::Name), name))
            .to_owned();
        any = any.add(Expr::col((film::Entity, film::Column::DirectorId)).in_subquery(directors));
    }

    if let Some(name) = &filter.actor_name {
        let cast_films = Query::select()
            .column((film_cast::Entity, film_cast::Column::FilmId))
            .from(film_cast::Entity)
            .inner_join(
                actor::Entity,
                Expr::col((actor::Entity, actor::Column::Id))
                    .equals((film_cast::Entity, film_cast::Column::ActorId)),
            )
            .and_where(icontains((actor::Entity, actor::Column::Name), name))
            .to_owned();
        any = any.add(Expr::col((film::Entity, film::Column::Id)).in_subquery(cast_films));
    }

    if let Some(genre) = filter.genre {
        any = any.add(icontains((film::Entity, film::Column::Genre), genre.as_str()));
    }

    if let Some(text) = &filter.description {
        any = any.add(icontains((film::Entity, film::Column::Description), text));
    }

    Some(any)
}

fn release_group(filter: &FilmFilter) -> Option<Condition> {
    if filter.min_release.is_none() && filter.max_release.is_none() {
        return None;
    }

    let mut all = Condition::all();
    if let Some(min) = filter.min_release {
        all = all.add(film::Column::Release.gte(min.to_string()));
    }
    if let Some(max) = filter.max_release {
        all = all.add(film::Column::Release.lte(max.to_string()));
    }
    Some(all)
}

fn rating_group(filter: &FilmFilter) -> Option<SimpleExpr> {
    if filter.min_rating.is_none() && filter.max_rating.is_none() {
        return None;
    }

    let mut rated = rating::films_with_reviews();
    if let Some(min) = filter.min_rating {
        rated = rated.having(Expr::expr(rating::avg_rating_expr()).gte(min));
    }
    if let Some(max) = filter.max_rating {
        rated = rated.having(Expr::expr(rating::avg_rating_expr()).lte(max));
    }

    Some(Expr::col((film::Entity, film::Column::Id)).in_subquery(rated.into_query()))
}

/// Case-insensitive substring match with LIKE wildcards in `needle` escaped.
fn icontains<C: IntoColumnRef>(column: C, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

const LIKE_ESCAPE: char = '!';

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}
