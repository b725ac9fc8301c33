use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const NAME_MAX_LENGTH: usize = 64;
pub const CONTENT_MAX_LENGTH: usize = 500;
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 10;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Genre {
    Action,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Horror,
    Romance,
    SciFi,
    Thriller,
    Western,
}

impl Genre {
    pub const ALL: [Genre; 10] = [
        Genre::Action,
        Genre::Comedy,
        Genre::Crime,
        Genre::Documentary,
        Genre::Drama,
        Genre::Horror,
        Genre::Romance,
        Genre::SciFi,
        Genre::Thriller,
        Genre::Western,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Documentary => "Documentary",
            Genre::Drama => "Drama",
            Genre::Horror => "Horror",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Thriller => "Thriller",
            Genre::Western => "Western",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid genre {0:?}")]
pub struct UnknownGenre(pub String);

impl FromStr for Genre {
    type Err = UnknownGenre;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownGenre(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FilmView {
    pub id: i32,
    pub name: String,
    pub release: String,
    pub genre: String,
    pub description: String,
    pub duration: f64,
    pub image_url: Option<String>,
    pub director: Option<String>,
    pub cast: Vec<String>,
    pub avg_rating: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewView {
    pub id: i32,
    pub user_id: Option<i32>,
    pub film_id: Option<i32>,
    pub film: Option<String>,
    pub content: Option<String>,
    pub rating: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub professional: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub current_password: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordConfirmation {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct NewReview {
    pub film_id: Option<i32>,
    pub rating: Option<i64>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewId {
    pub review_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct NewPerson {
    pub name: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EntityId {
    pub id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct FilmName {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewFilm {
    pub name: Option<String>,
    pub release: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub duration: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub director: Option<String>,
    pub cast: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_names_round_trip() {
        for genre in Genre::ALL {
            assert_eq!(genre.as_str().parse::<Genre>().unwrap(), genre);
        }
        assert_eq!("Sci-Fi".parse::<Genre>().unwrap(), Genre::SciFi);
    }

    #[test]
    fn genre_matching_is_exact() {
        assert!("romance".parse::<Genre>().is_err());
        assert!("SciFi".parse::<Genre>().is_err());
        assert!("Musical".parse::<Genre>().is_err());
    }
}
