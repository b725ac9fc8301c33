mod accounts;
mod auth;
mod catalog;
mod config;
mod dates;
mod db;
mod entities;
mod error;
mod filter;
mod models;
mod query;
mod rating;
mod reviews;
mod routes;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users/register/", post(routes::register))
        .route("/users/login/", post(routes::login))
        .route("/users/profile-info/", get(routes::profile_info))
        .route("/users/profile-update/", put(routes::profile_update))
        .route("/users/logout/", delete(routes::logout))
        .route("/users/delete/", delete(routes::delete_account))
        .route("/users/add-review/", post(routes::add_review))
        .route("/users/delete-review/", post(routes::delete_review))
        .route("/users/history/", get(routes::history))
        .route("/films/", get(routes::search_films).post(routes::search_films_json))
        .route("/films/{id}/", get(routes::film_detail))
        .route("/films/{id}/reviews/", get(routes::film_reviews))
        .route("/site-admin/add-director/", post(routes::add_director))
        .route("/site-admin/add-actor/", post(routes::add_actor))
        .route("/site-admin/add-film/", post(routes::add_film))
        .route("/site-admin/delete-director/", post(routes::delete_director))
        .route("/site-admin/delete-actor/", post(routes::delete_actor))
        .route("/site-admin/delete-film/", post(routes::delete_film))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any)),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,reelnotes=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);
    let db = db::connect_and_migrate(&config.database_url).await?;

    let state = Arc::new(AppState { config: config.clone(), db });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
