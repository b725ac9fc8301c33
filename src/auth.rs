use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::{ConnectionTrait, EntityTrait};

use crate::{
    AppState,
    entities::{session, user},
    error::{AppError, AppResult},
};

pub const SESSION_COOKIE: &str = "session";

/// The user behind a valid `session` cookie.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub key: String,
    pub user: user::Model,
}

/// Like [`CurrentUser`], but a missing or stale cookie is not an error.
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<CurrentUser>);

async fn resolve<C: ConnectionTrait>(db: &C, parts: &Parts) -> AppResult<Option<CurrentUser>> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(key) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
        return Ok(None);
    };

    let found = session::Entity::find_by_id(key.clone())
        .find_also_related(user::Entity)
        .one(db)
        .await?;

    Ok(match found {
        Some((_, Some(user))) => Some(CurrentUser { key, user }),
        _ => None,
    })
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        resolve(&state.db, parts)
            .await?
            .ok_or_else(|| AppError::unauthorized("Authentication credentials were not provided."))
    }
}

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve(&state.db, parts).await?))
    }
}

pub fn session_cookie(key: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, key))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn cleared_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}
