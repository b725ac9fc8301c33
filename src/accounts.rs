use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use jiff::Timestamp;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    ModelTrait, QueryFilter, Set,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    entities::{session, user},
    error::{AppError, AppResult, is_unique_violation},
    models::{LoginRequest, ProfileUpdateRequest, RegisterRequest, UserView},
};

const USERNAME_MIN_LENGTH: usize = 4;
const USERNAME_MAX_LENGTH: usize = 15;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

pub fn user_view(user: &user::Model) -> UserView {
    UserView {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        professional: user.professional,
    }
}

fn check_username(username: &str) -> AppResult<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&len) {
        return Err(AppError::validation(format!(
            "Username must be between {USERNAME_MIN_LENGTH} and {USERNAME_MAX_LENGTH} characters long."
        )));
    }
    Ok(())
}

fn check_email(email: &str) -> AppResult<()> {
    if !EMAIL.is_match(email) {
        return Err(AppError::validation("Invalid email address."));
    }
    Ok(())
}

fn check_password(password: &str) -> AppResult<()> {
    let upper = password.chars().any(char::is_uppercase);
    let lower = password.chars().any(char::is_lowercase);
    let digit = password.chars().any(|c| c.is_ascii_digit());
    if !(upper && lower && digit) {
        return Err(AppError::validation(
            "Password must contain at least one upper-case letter, one lower-case letter and one digit.",
        ));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// An unparseable stored hash never matches.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(err) => {
            warn!(error = %err, "stored password hash is unreadable");
            false
        },
    }
}

/// A concurrent registration can pass [`ensure_unique`] and still lose the
/// race on the unique index.
fn duplicate_account(err: DbErr) -> AppError {
    if is_unique_violation(&err) {
        AppError::validation("A user with that username or email already exists.")
    } else {
        err.into()
    }
}

/// Fails when another account already uses `username` or `email`.
async fn ensure_unique<C: ConnectionTrait>(
    db: &C,
    username: &str,
    email: &str,
    except: Option<i32>,
) -> AppResult<()> {
    let mut clash = user::Entity::find().filter(
        Condition::any().add(user::Column::Username.eq(username)).add(user::Column::Email.eq(email)),
    );
    if let Some(id) = except {
        clash = clash.filter(user::Column::Id.ne(id));
    }

    match clash.one(db).await? {
        Some(existing) if existing.username == username => {
            Err(AppError::validation("A user with that username already exists."))
        },
        Some(_) => Err(AppError::validation("A user with that email already exists.")),
        None => Ok(()),
    }
}

pub async fn register<C: ConnectionTrait>(db: &C, req: RegisterRequest) -> AppResult<user::Model> {
    let username = req.username.trim();
    let email = req.email.trim();
    check_username(username)?;
    check_email(email)?;
    check_password(&req.password)?;
    ensure_unique(db, username, email, None).await?;

    let created = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password: Set(hash_password(&req.password)?),
        professional: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(duplicate_account)?;

    info!(id = created.id, username = %created.username, "registered user");
    Ok(created)
}

/// Checks the credentials and opens a new session, returning its key.
pub async fn login<C: ConnectionTrait>(db: &C, req: LoginRequest) -> AppResult<String> {
    let found = user::Entity::find()
        .filter(user::Column::Username.eq(req.username.trim()))
        .one(db)
        .await?;
    let Some(user) = found.filter(|u| verify_password(&req.password, &u.password)) else {
        return Err(AppError::unauthorized("Invalid credentials."));
    };

    let key = Uuid::new_v4().simple().to_string();
    session::ActiveModel {
        key: Set(key.clone()),
        user_id: Set(user.id),
        created_at: Set(Timestamp::now().as_second()),
    }
    .insert(db)
    .await?;

    info!(user_id = user.id, "opened session");
    Ok(key)
}

pub async fn logout<C: ConnectionTrait>(db: &C, key: &str) -> AppResult<()> {
    let deleted = session::Entity::delete_by_id(key.to_string()).exec(db).await?;
    if deleted.rows_affected == 0 {
        return Err(AppError::unauthorized("Not logged in."));
    }
    Ok(())
}

pub async fn update_profile<C: ConnectionTrait>(
    db: &C,
    user: user::Model,
    req: ProfileUpdateRequest,
) -> AppResult<user::Model> {
    if !verify_password(&req.current_password, &user.password) {
        return Err(AppError::validation("Current password is incorrect."));
    }

    let keep_blank = |field: Option<String>| {
        field.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    };
    let username = keep_blank(req.username).unwrap_or_else(|| user.username.clone());
    let email = keep_blank(req.email).unwrap_or_else(|| user.email.clone());
    let new_password = req.new_password.filter(|p| !p.is_empty());

    check_username(&username)?;
    check_email(&email)?;
    if let Some(password) = &new_password {
        check_password(password)?;
    }
    ensure_unique(db, &username, &email, Some(user.id)).await?;

    let mut active = user.into_active_model();
    active.username = Set(username);
    active.email = Set(email);
    if let Some(password) = new_password {
        active.password = Set(hash_password(&password)?);
    }
    let updated = active.update(db).await.map_err(duplicate_account)?;

    info!(id = updated.id, "updated profile");
    Ok(updated)
}

/// Removes the account; its sessions go with it and its reviews stay behind
/// without an author.
pub async fn delete_account<C: ConnectionTrait>(
    db: &C,
    user: user::Model,
    password: &str,
) -> AppResult<()> {
    if !verify_password(password, &user.password) {
        return Err(AppError::unauthorized("Incorrect password."));
    }
    let id = user.id;
    user.delete(db).await?;
    info!(id, "deleted user");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entities::review, tests::support::{insert_film, insert_review, memory_db}};

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "Secret123".to_string(),
        }
    }

    #[test]
    fn hashes_verify_only_the_hashed_password() {
        let hash = hash_password("Secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Secret123", &hash));
        assert!(!verify_password("secret123", &hash));
        assert!(!verify_password("Secret123", "plain"));
    }

    #[test]
    fn registration_rules() {
        assert!(check_username("bob").is_err());
        assert!(check_username("bobby").is_ok());
        assert!(check_username("a_very_long_username").is_err());
        assert!(check_email("alice@example.com").is_ok());
        assert!(check_email("alice.example.com").is_err());
        assert!(check_password("Secret123").is_ok());
        assert!(check_password("secret123").is_err());
        assert!(check_password("SECRET123").is_err());
        assert!(check_password("SecretPass").is_err());
    }

    #[tokio::test]
    async fn duplicate_usernames_and_emails_are_rejected() {
        let db = memory_db().await;
        register(&db, alice()).await.unwrap();

        let again = register(&db, alice()).await;
        assert!(matches!(again, Err(AppError::Validation(msg)) if msg.contains("username")));

        let mut same_email = alice();
        same_email.username = "alicia".to_string();
        let again = register(&db, same_email).await;
        assert!(matches!(again, Err(AppError::Validation(msg)) if msg.contains("email")));
    }

    #[tokio::test]
    async fn racing_registrations_yield_one_account_and_one_client_error() {
        let db = memory_db().await;

        for round in 0..10 {
            let req = || RegisterRequest {
                username: format!("racer{round}"),
                email: format!("racer{round}@example.com"),
                password: "Secret123".to_string(),
            };
            let (first, second) = tokio::join!(register(&db, req()), register(&db, req()));

            let outcomes = [first, second];
            assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1, "round {round}");
            assert!(
                outcomes.iter().any(|r| matches!(r, Err(AppError::Validation(_)))),
                "round {round}: {outcomes:?}"
            );
        }
    }

    #[test]
    fn other_database_errors_stay_internal() {
        let err = DbErr::Custom("disk I/O error".to_string());
        assert!(matches!(duplicate_account(err), AppError::Internal(_)));
    }

    #[tokio::test]
    async fn each_login_opens_a_new_session() {
        let db = memory_db().await;
        register(&db, alice()).await.unwrap();
        let login_req = || LoginRequest { username: "alice".to_string(), password: "Secret123".to_string() };

        let first = login(&db, login_req()).await.unwrap();
        let second = login(&db, login_req()).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(session::Entity::find().all(&db).await.unwrap().len(), 2);

        logout(&db, &first).await.unwrap();
        assert!(matches!(logout(&db, &first).await, Err(AppError::Unauthorized(_))));

        let bad = LoginRequest { username: "alice".to_string(), password: "Wrong123".to_string() };
        assert!(matches!(login(&db, bad).await, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn blank_profile_fields_keep_current_values() {
        let db = memory_db().await;
        let user = register(&db, alice()).await.unwrap();

        let updated = update_profile(&db, user, ProfileUpdateRequest {
            current_password: "Secret123".to_string(),
            username: Some("  ".to_string()),
            email: Some("alice@films.example".to_string()),
            new_password: Some("Another456".to_string()),
        })
        .await
        .unwrap();

        assert_eq!(updated.username, "alice");
        assert_eq!(updated.email, "alice@films.example");
        assert!(verify_password("Another456", &updated.password));

        let wrong = update_profile(&db, updated, ProfileUpdateRequest {
            current_password: "Secret123".to_string(),
            username: None,
            email: None,
            new_password: None,
        })
        .await;
        assert!(matches!(wrong, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn deleting_an_account_keeps_its_reviews() {
        let db = memory_db().await;
        let user = register(&db, alice()).await.unwrap();
        let film = insert_film(&db, "Heat", "Crime", "1995-12-15", None).await;
        insert_review(&db, user.id, film, Some(8)).await;

        assert!(matches!(
            delete_account(&db, user.clone(), "Wrong123").await,
            Err(AppError::Unauthorized(_))
        ));
        delete_account(&db, user, "Secret123").await.unwrap();

        let reviews = review::Entity::find().all(&db).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].user_id, None);
    }
}
