use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    AppState, app,
    config::Config,
    db,
    entities::{actor, director, film, film_cast, review, user},
};

pub async fn memory_db() -> DatabaseConnection {
    db::connect_and_migrate("sqlite::memory:").await.unwrap()
}

pub async fn insert_director(db: &DatabaseConnection, name: &str) -> i32 {
    director::ActiveModel { name: Set(name.to_string()), ..Default::default() }
        .insert(db)
        .await
        .unwrap()
        .id
}

pub async fn insert_film(
    db: &DatabaseConnection,
    name: &str,
    genre: &str,
    release: &str,
    director_id: Option<i32>,
) -> i32 {
    film::ActiveModel {
        name: Set(name.to_string()),
        genre: Set(genre.to_string()),
        release: Set(release.to_string()),
        description: Set(format!("{name}, a {genre} film.")),
        duration: Set(120.0),
        image_url: Set(None),
        director_id: Set(director_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

/// Adds `actor_name` to the film's cast, creating the actor if needed.
pub async fn cast(db: &DatabaseConnection, film_id: i32, actor_name: &str) {
    let actor_id =
        match actor::Entity::find().filter(actor::Column::Name.eq(actor_name)).one(db).await.unwrap() {
            Some(actor) => actor.id,
            None => {
                actor::ActiveModel { name: Set(actor_name.to_string()), ..Default::default() }
                    .insert(db)
                    .await
                    .unwrap()
                    .id
            },
        };

    film_cast::Entity::insert(film_cast::ActiveModel {
        film_id: Set(film_id),
        actor_id: Set(actor_id),
    })
    .exec_without_returning(db)
    .await
    .unwrap();
}

pub async fn insert_user(db: &DatabaseConnection, username: &str) -> i32 {
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        password: Set("not-a-hash".to_string()),
        professional: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn insert_review(db: &DatabaseConnection, user_id: i32, film_id: i32, rating: Option<i32>) {
    review::ActiveModel {
        rating: Set(rating),
        content: Set(None),
        user_id: Set(Some(user_id)),
        film_id: Set(Some(film_id)),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn test_app() -> (Router, DatabaseConnection) {
    let db = memory_db().await;
    let config = Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        database_url: "sqlite::memory:".to_string(),
        secure_cookies: false,
    };
    let state = Arc::new(AppState { config: Arc::new(config), db: db.clone() });
    (app(state), db)
}

/// Sends a JSON request, optionally carrying a session cookie.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        },
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `name=value` pair of the session cookie set by a response.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
