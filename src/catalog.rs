use std::{collections::HashMap, sync::LazyLock};

use jiff::civil::Date;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info};

use crate::{
    dates,
    db::ID_BATCH,
    entities::{actor, director, film, film_cast},
    error::{AppError, AppResult, is_unique_violation},
    models::{CONTENT_MAX_LENGTH, FilmView, Genre, NAME_MAX_LENGTH, NewFilm, NewPerson},
    rating,
};

static TWO_WORDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+\s+\w+").unwrap());

#[derive(Clone, Copy, Debug)]
enum Person {
    Director,
    Actor,
}

impl Person {
    fn label(self) -> &'static str {
        match self {
            Person::Director => "Director",
            Person::Actor => "Actor",
        }
    }
}

fn person_name(kind: Person, name: Option<&str>) -> AppResult<String> {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).ok_or_else(|| {
        AppError::validation(format!("{} name required.", kind.label()))
    })?;
    if name.chars().count() > NAME_MAX_LENGTH {
        return Err(AppError::validation(format!(
            "{} name cannot exceed {NAME_MAX_LENGTH} characters.",
            kind.label()
        )));
    }
    if !TWO_WORDS.is_match(name) {
        return Err(AppError::validation(format!(
            "{} name must be at least 2 words long.",
            kind.label()
        )));
    }
    Ok(name.to_string())
}

fn nationality(raw: Option<String>) -> AppResult<Option<String>> {
    let Some(raw) = raw.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if raw.chars().count() > NAME_MAX_LENGTH {
        return Err(AppError::validation(format!(
            "Nationality cannot exceed {NAME_MAX_LENGTH} characters."
        )));
    }
    Ok(Some(raw))
}

pub async fn add_director<C: ConnectionTrait>(db: &C, req: NewPerson) -> AppResult<director::Model> {
    let name = person_name(Person::Director, req.name.as_deref())?;
    get_or_create_director(db, &name, nationality(req.nationality)?).await
}

pub async fn add_actor<C: ConnectionTrait>(db: &C, req: NewPerson) -> AppResult<actor::Model> {
    let name = person_name(Person::Actor, req.name.as_deref())?;
    get_or_create_actor(db, &name, nationality(req.nationality)?).await
}

async fn find_director<C: ConnectionTrait>(db: &C, name: &str) -> AppResult<Option<director::Model>> {
    Ok(director::Entity::find().filter(director::Column::Name.eq(name)).one(db).await?)
}

async fn find_actor<C: ConnectionTrait>(db: &C, name: &str) -> AppResult<Option<actor::Model>> {
    Ok(actor::Entity::find().filter(actor::Column::Name.eq(name)).one(db).await?)
}

/// Lookup, then insert. Losing an insert race to the unique name index means
/// the row now exists, so it is looked up again.
async fn get_or_create_director<C: ConnectionTrait>(
    db: &C,
    name: &str,
    nationality: Option<String>,
) -> AppResult<director::Model> {
    if let Some(existing) = find_director(db, name).await? {
        return Ok(existing);
    }

    let inserted = director::ActiveModel {
        name: Set(name.to_string()),
        nationality: Set(nationality),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(created) => {
            debug!(id = created.id, name = %created.name, "created director");
            Ok(created)
        },
        Err(err) if is_unique_violation(&err) => {
            find_director(db, name).await?.ok_or_else(|| AppError::from(err))
        },
        Err(err) => Err(err.into()),
    }
}

async fn get_or_create_actor<C: ConnectionTrait>(
    db: &C,
    name: &str,
    nationality: Option<String>,
) -> AppResult<actor::Model> {
    if let Some(existing) = find_actor(db, name).await? {
        return Ok(existing);
    }

    let inserted = actor::ActiveModel {
        name: Set(name.to_string()),
        nationality: Set(nationality),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(created) => {
            debug!(id = created.id, name = %created.name, "created actor");
            Ok(created)
        },
        Err(err) if is_unique_violation(&err) => {
            find_actor(db, name).await?.ok_or_else(|| AppError::from(err))
        },
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_director<C: ConnectionTrait>(db: &C, id: Option<i32>) -> AppResult<()> {
    let id = id.ok_or_else(|| AppError::validation("Director ID must be provided."))?;
    let director = director::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Director not found."))?;
    director.delete(db).await?;
    info!(id, "deleted director");
    Ok(())
}

pub async fn delete_actor<C: ConnectionTrait>(db: &C, id: Option<i32>) -> AppResult<()> {
    let id = id.ok_or_else(|| AppError::validation("Actor ID must be provided."))?;
    let actor = actor::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Actor not found."))?;
    actor.delete(db).await?;
    info!(id, "deleted actor");
    Ok(())
}

/// A film request that passed validation.
#[derive(Debug)]
struct FilmDraft {
    name: String,
    release: Date,
    genre: Genre,
    description: String,
    duration: f64,
    image_url: Option<String>,
    director: String,
    cast: Vec<String>,
}

impl FilmDraft {
    fn validate(req: NewFilm) -> AppResult<Self> {
        let director = person_name(
            Person::Director,
            Some(req.director.as_deref().ok_or_else(|| {
                AppError::validation("director field must be provided.")
            })?),
        )?;

        let mut cast: Vec<String> = Vec::new();
        for name in req.cast.ok_or_else(|| AppError::validation("cast field must be provided."))? {
            let name = person_name(Person::Actor, Some(&name))?;
            if !cast.contains(&name) {
                cast.push(name);
            }
        }

        let name = req
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::validation("Film name required."))?;
        if name.chars().count() > NAME_MAX_LENGTH {
            return Err(AppError::validation(format!(
                "Film name cannot exceed {NAME_MAX_LENGTH} characters."
            )));
        }

        let release = req
            .release
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::validation("Release date required."))?;
        let release = dates::parse_flexible(&release)
            .map_err(|err| AppError::validation(format!("release: {err}")))?;

        let genre = req
            .genre
            .filter(|g| !g.is_empty())
            .ok_or_else(|| AppError::validation("Genre required."))?;
        let genre: Genre = genre.parse().map_err(|_| AppError::validation("Invalid genre."))?;

        let description = req
            .description
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| AppError::validation("Description required."))?;
        if description.chars().count() > CONTENT_MAX_LENGTH {
            return Err(AppError::validation(format!(
                "Description cannot exceed {CONTENT_MAX_LENGTH} characters."
            )));
        }

        let duration = req.duration.ok_or_else(|| AppError::validation("Duration required."))?;
        if !duration.is_finite() || duration < 0.0 {
            return Err(AppError::validation("Duration must be a positive number."));
        }

        let image_url = match req.image_url.filter(|u| !u.is_empty()) {
            Some(url) if !url.starts_with("https://") => {
                return Err(AppError::validation("Invalid image URL format."));
            },
            other => other,
        };

        Ok(Self { name, release, genre, description, duration, image_url, director, cast })
    }
}

/// Creates the film, or replaces the fields and cast of the film with the
/// same name. Director and actors are created on demand. Returns the film and
/// whether it was newly created.
pub async fn upsert_film(db: &DatabaseConnection, req: NewFilm) -> AppResult<(film::Model, bool)> {
    let draft = FilmDraft::validate(req)?;

    let txn = db.begin().await?;

    let director = get_or_create_director(&txn, &draft.director, None).await?;
    let mut actor_ids = Vec::with_capacity(draft.cast.len());
    for name in &draft.cast {
        actor_ids.push(get_or_create_actor(&txn, name, None).await?.id);
    }

    let existing = film::Entity::find().filter(film::Column::Name.eq(&draft.name)).one(&txn).await?;
    let created = existing.is_none();

    let mut active = match existing {
        Some(film) => film.into_active_model(),
        None => Default::default(),
    };
    active.name = Set(draft.name);
    active.release = Set(draft.release.to_string());
    active.genre = Set(draft.genre.as_str().to_string());
    active.description = Set(draft.description);
    active.duration = Set(draft.duration);
    active.image_url = Set(draft.image_url);
    active.director_id = Set(Some(director.id));

    let film = if created { active.insert(&txn).await? } else { active.update(&txn).await? };

    film_cast::Entity::delete_many()
        .filter(film_cast::Column::FilmId.eq(film.id))
        .exec(&txn)
        .await?;
    if !actor_ids.is_empty() {
        film_cast::Entity::insert_many(actor_ids.iter().map(|&actor_id| film_cast::ActiveModel {
            film_id: Set(film.id),
            actor_id: Set(actor_id),
        }))
        .exec_without_returning(&txn)
        .await?;
    }

    txn.commit().await?;

    info!(id = film.id, name = %film.name, created, cast = actor_ids.len(), "stored film");
    Ok((film, created))
}

pub async fn delete_film<C: ConnectionTrait>(db: &C, name: Option<&str>) -> AppResult<()> {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::validation("Film name must be provided."))?;
    let film = film::Entity::find()
        .filter(film::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Film not found."))?;
    let id = film.id;
    film.delete(db).await?;
    info!(id, name = %name, "deleted film");
    Ok(())
}

pub async fn film_detail<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<FilmView> {
    let film = film::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Film not found."))?;
    let mut views = film_views(db, vec![film]).await?;
    views.pop().ok_or_else(|| AppError::not_found("Film not found."))
}

/// Resolves director and cast names and attaches the average rating, keeping
/// the order of `films`.
pub async fn film_views<C: ConnectionTrait>(
    db: &C,
    films: Vec<film::Model>,
) -> AppResult<Vec<FilmView>> {
    if films.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = films.iter().map(|f| f.id).collect();
    let mut director_ids: Vec<i32> = films.iter().filter_map(|f| f.director_id).collect();
    director_ids.sort_unstable();
    director_ids.dedup();

    let mut directors: HashMap<i32, String> = HashMap::new();
    for batch in director_ids.chunks(ID_BATCH) {
        let rows = director::Entity::find()
            .filter(director::Column::Id.is_in(batch.iter().copied()))
            .all(db)
            .await?;
        directors.extend(rows.into_iter().map(|d| (d.id, d.name)));
    }

    let mut cast: HashMap<i32, Vec<String>> = HashMap::new();
    for batch in ids.chunks(ID_BATCH) {
        let links = film_cast::Entity::find()
            .filter(film_cast::Column::FilmId.is_in(batch.iter().copied()))
            .order_by_asc(film_cast::Column::ActorId)
            .find_also_related(actor::Entity)
            .all(db)
            .await?;
        for (link, actor) in links {
            if let Some(actor) = actor {
                cast.entry(link.film_id).or_default().push(actor.name);
            }
        }
    }

    let ratings = rating::average_ratings(db, &ids).await?;

    Ok(films
        .into_iter()
        .map(|f| FilmView {
            director: f.director_id.and_then(|id| directors.get(&id).cloned()),
            cast: cast.remove(&f.id).unwrap_or_default(),
            avg_rating: ratings.get(&f.id).copied().unwrap_or(0.0),
            id: f.id,
            name: f.name,
            release: f.release,
            genre: f.genre,
            description: f.description,
            duration: f.duration,
            image_url: f.image_url,
        })
        .collect())
}
