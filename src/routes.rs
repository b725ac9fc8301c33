use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{FromRequest, Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::{
    AppState, accounts,
    auth::{self, CurrentUser, MaybeUser},
    catalog,
    error::{AppError, AppResult},
    filter::FilmFilter,
    models::{
        EntityId, FilmName, FilmView, LoginRequest, NewFilm, NewPerson, NewReview,
        PasswordConfirmation, ProfileUpdateRequest, RegisterRequest, ReviewId, ReviewView,
        UserView,
    },
    query, reviews,
};

/// `axum::Json` whose rejections render like every other client error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> axum::response::IntoResponse for Json<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self.0).into_response()
    }
}

fn detail(msg: &str) -> Json<Value> {
    Json(json!({ "detail": msg }))
}

#[derive(Serialize)]
pub struct FilmList {
    films: Vec<FilmView>,
}

#[derive(Serialize)]
pub struct ReviewList {
    reviews: Vec<ReviewView>,
}

// users

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let user = accounts::register(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(accounts::user_view(&user))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    MaybeUser(current): MaybeUser,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<Value>)> {
    if current.is_some() {
        return Err(AppError::unauthorized("Already logged in."));
    }
    let key = accounts::login(&state.db, req).await?;
    let jar = jar.add(auth::session_cookie(key, state.config.secure_cookies));
    Ok((jar, detail("Logged in successfully.")))
}

pub async fn profile_info(current: CurrentUser) -> Json<UserView> {
    Json(accounts::user_view(&current.user))
}

pub async fn profile_update(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<ProfileUpdateRequest>,
) -> AppResult<Json<UserView>> {
    let user = accounts::update_profile(&state.db, current.user, req).await?;
    Ok(Json(accounts::user_view(&user)))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    accounts::logout(&state.db, &current.key).await?;
    Ok((jar.remove(auth::cleared_session_cookie()), detail("Logged out successfully.")))
}

pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    jar: CookieJar,
    Json(req): Json<PasswordConfirmation>,
) -> AppResult<(CookieJar, Json<Value>)> {
    accounts::delete_account(&state.db, current.user, &req.password).await?;
    Ok((jar.remove(auth::cleared_session_cookie()), detail("User deleted successfully.")))
}

pub async fn add_review(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<NewReview>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let review = reviews::add_review(&state.db, current.user.id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "detail": "Review added successfully.", "id": review.id })),
    ))
}

pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<ReviewId>,
) -> AppResult<(StatusCode, Json<Value>)> {
    reviews::delete_review(&state.db, current.user.id, req.review_id).await?;
    Ok((StatusCode::ACCEPTED, detail("Review deleted successfully.")))
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> AppResult<Json<ReviewList>> {
    let reviews = reviews::reviews_by_user(&state.db, current.user.id).await?;
    Ok(Json(ReviewList { reviews }))
}

// films

pub async fn search_films(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<FilmList>> {
    search(&state, &params).await
}

pub async fn search_films_json(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<Json<FilmList>> {
    search(&state, &filter_params(body)).await
}

async fn search(state: &AppState, params: &HashMap<String, String>) -> AppResult<Json<FilmList>> {
    let filter = FilmFilter::compile(params)?;
    let films = query::find_films(&state.db, &filter).await?;
    let films = catalog::film_views(&state.db, films).await?;
    Ok(Json(FilmList { films }))
}

/// Flattens a JSON filter object into the same string parameters a query
/// string carries. Nulls are dropped.
fn filter_params(body: Map<String, Value>) -> HashMap<String, String> {
    body.into_iter().filter_map(|(key, value)| Some((key, filter_value(value)?))).collect()
}

/// Single-element lists stand for their element; whole floats such as `5.0`
/// read as integers.
fn filter_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 => Some(format!("{f:.0}")),
            _ => Some(n.to_string()),
        },
        Value::Array(mut items) if items.len() == 1 => items.pop().and_then(filter_value),
        other => Some(other.to_string()),
    }
}

pub async fn film_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<FilmView>> {
    Ok(Json(catalog::film_detail(&state.db, id).await?))
}

pub async fn film_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<ReviewList>> {
    let reviews = reviews::reviews_for_film(&state.db, id).await?;
    Ok(Json(ReviewList { reviews }))
}

// site admin

pub async fn add_director(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewPerson>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let director = catalog::add_director(&state.db, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "detail": "Director added successfully", "id": director.id })),
    ))
}

pub async fn add_actor(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewPerson>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let actor = catalog::add_actor(&state.db, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "detail": "Actor added successfully", "id": actor.id })),
    ))
}

pub async fn add_film(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewFilm>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (film, created) = catalog::upsert_film(&state.db, req).await?;
    let msg = if created { "Film added successfully" } else { "Film updated successfully" };
    Ok((StatusCode::CREATED, Json(json!({ "detail": msg, "id": film.id }))))
}

pub async fn delete_director(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EntityId>,
) -> AppResult<Json<Value>> {
    catalog::delete_director(&state.db, req.id).await?;
    Ok(detail("Director deleted successfully"))
}

pub async fn delete_actor(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EntityId>,
) -> AppResult<Json<Value>> {
    catalog::delete_actor(&state.db, req.id).await?;
    Ok(detail("Actor deleted successfully"))
}

pub async fn delete_film(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilmName>,
) -> AppResult<Json<Value>> {
    catalog::delete_film(&state.db, req.name.as_deref()).await?;
    Ok(detail("Film deleted successfully"))
}
