use std::collections::HashMap;

use jiff::civil::Date;

use crate::{
    dates::{self, DateParseError},
    models::{CONTENT_MAX_LENGTH, Genre, MAX_RATING, MIN_RATING, NAME_MAX_LENGTH},
};

pub const FILM_NAME: &str = "film_name";
pub const DIRECTOR_NAME: &str = "director_name";
pub const ACTOR_NAME: &str = "actor_name";
pub const GENRE: &str = "genre";
pub const DESCRIPTION: &str = "description";
pub const MIN_RELEASE: &str = "min_release";
pub const MAX_RELEASE: &str = "max_release";
pub const MIN_RATING_PARAM: &str = "min_rating";
pub const MAX_RATING_PARAM: &str = "max_rating";

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("{field}: {source}")]
    InvalidDate {
        field: &'static str,
        #[source]
        source: DateParseError,
    },
    #[error("{field}: score must be numeric")]
    NotNumeric { field: &'static str },
    #[error("{field}: score must be between 1 and 10, got {value}")]
    RatingOutOfRange { field: &'static str, value: i64 },
    #[error("genre: invalid genre {0:?}")]
    UnknownGenre(String),
    #[error("{field}: cannot exceed {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Validated film search constraints. Every field is independent and `None`
/// means the constraint was not requested.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FilmFilter {
    pub film_name: Option<String>,
    pub director_name: Option<String>,
    pub actor_name: Option<String>,
    pub genre: Option<Genre>,
    pub description: Option<String>,
    pub min_release: Option<Date>,
    pub max_release: Option<Date>,
    pub min_rating: Option<i32>,
    pub max_rating: Option<i32>,
}

impl FilmFilter {
    /// Builds a filter from raw request parameters. Missing keys and empty
    /// values are treated alike; unknown keys are ignored. The first invalid
    /// value aborts compilation.
    pub fn compile(params: &HashMap<String, String>) -> Result<Self, FilterError> {
        let get = |key: &str| params.get(key).map(String::as_str).filter(|v| !v.is_empty());

        Ok(Self {
            film_name: get(FILM_NAME).map(|v| bounded(FILM_NAME, v, NAME_MAX_LENGTH)).transpose()?,
            director_name: get(DIRECTOR_NAME)
                .map(|v| bounded(DIRECTOR_NAME, v, NAME_MAX_LENGTH))
                .transpose()?,
            actor_name: get(ACTOR_NAME)
                .map(|v| bounded(ACTOR_NAME, v, NAME_MAX_LENGTH))
                .transpose()?,
            genre: get(GENRE)
                .map(|v| v.parse::<Genre>().map_err(|_| FilterError::UnknownGenre(v.to_string())))
                .transpose()?,
            description: get(DESCRIPTION)
                .map(|v| bounded(DESCRIPTION, v, CONTENT_MAX_LENGTH))
                .transpose()?,
            min_release: get(MIN_RELEASE).map(|v| date(MIN_RELEASE, v)).transpose()?,
            max_release: get(MAX_RELEASE).map(|v| date(MAX_RELEASE, v)).transpose()?,
            min_rating: get(MIN_RATING_PARAM).map(|v| rating(MIN_RATING_PARAM, v)).transpose()?,
            max_rating: get(MAX_RATING_PARAM).map(|v| rating(MAX_RATING_PARAM, v)).transpose()?,
        })
    }

    pub fn has_text_filter(&self) -> bool {
        self.film_name.is_some()
            || self.director_name.is_some()
            || self.actor_name.is_some()
            || self.genre.is_some()
            || self.description.is_some()
    }
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<String, FilterError> {
    if value.chars().count() > max {
        return Err(FilterError::TooLong { field, max });
    }
    Ok(value.to_string())
}

fn date(field: &'static str, value: &str) -> Result<Date, FilterError> {
    dates::parse_flexible(value).map_err(|source| FilterError::InvalidDate { field, source })
}

fn rating(field: &'static str, value: &str) -> Result<i32, FilterError> {
    let value: i64 = value.trim().parse().map_err(|_| FilterError::NotNumeric { field })?;
    if !(i64::from(MIN_RATING)..=i64::from(MAX_RATING)).contains(&value) {
        return Err(FilterError::RatingOutOfRange { field, value });
    }
    Ok(value as i32)
}

#[cfg(test)]
mod tests {
    use jiff::civil::date as civil;

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn empty_params_compile_to_an_unrestricted_filter() {
        let filter = FilmFilter::compile(&HashMap::new()).unwrap();
        assert_eq!(filter, FilmFilter::default());
        assert!(!filter.has_text_filter());
    }

    #[test]
    fn blank_values_count_as_absent() {
        let filter =
            FilmFilter::compile(&params(&[("film_name", ""), ("min_rating", ""), ("genre", "")]))
                .unwrap();
        assert_eq!(filter, FilmFilter::default());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let filter = FilmFilter::compile(&params(&[("page", "2"), ("Film_Name", "x")])).unwrap();
        assert_eq!(filter, FilmFilter::default());
    }

    #[test]
    fn all_fields_are_typed() {
        let filter = FilmFilter::compile(&params(&[
            ("film_name", "Aveng"),
            ("director_name", "Nolan"),
            ("actor_name", "Hanks"),
            ("genre", "Sci-Fi"),
            ("description", "space"),
            ("min_release", "2010"),
            ("max_release", "31-12-2019"),
            ("min_rating", "3"),
            ("max_rating", " 8 "),
        ]))
        .unwrap();

        assert_eq!(filter.film_name.as_deref(), Some("Aveng"));
        assert_eq!(filter.director_name.as_deref(), Some("Nolan"));
        assert_eq!(filter.actor_name.as_deref(), Some("Hanks"));
        assert_eq!(filter.genre, Some(Genre::SciFi));
        assert_eq!(filter.description.as_deref(), Some("space"));
        assert_eq!(filter.min_release, Some(civil(2010, 1, 1)));
        assert_eq!(filter.max_release, Some(civil(2019, 12, 31)));
        assert_eq!(filter.min_rating, Some(3));
        assert_eq!(filter.max_rating, Some(8));
        assert!(filter.has_text_filter());
    }

    #[test]
    fn slash_dates_are_rejected() {
        let err = FilmFilter::compile(&params(&[("min_release", "2010/01/01")])).unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidDate {
                field: "min_release",
                source: DateParseError::UnknownFormat(_)
            }
        ));
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        assert!(FilmFilter::compile(&params(&[("min_rating", "1"), ("max_rating", "10")])).is_ok());
        assert_eq!(
            FilmFilter::compile(&params(&[("min_rating", "0")])).unwrap_err(),
            FilterError::RatingOutOfRange { field: "min_rating", value: 0 }
        );
        assert_eq!(
            FilmFilter::compile(&params(&[("max_rating", "11")])).unwrap_err(),
            FilterError::RatingOutOfRange { field: "max_rating", value: 11 }
        );
    }

    #[test]
    fn non_integer_ratings_are_rejected() {
        for raw in ["five", "7.5", "1e1"] {
            assert_eq!(
                FilmFilter::compile(&params(&[("max_rating", raw)])).unwrap_err(),
                FilterError::NotNumeric { field: "max_rating" }
            );
        }
    }

    #[test]
    fn genre_must_be_known() {
        assert_eq!(
            FilmFilter::compile(&params(&[("genre", "Musical")])).unwrap_err(),
            FilterError::UnknownGenre("Musical".to_string())
        );
    }

    #[test]
    fn overlong_text_is_rejected() {
        let long = "x".repeat(NAME_MAX_LENGTH + 1);
        assert_eq!(
            FilmFilter::compile(&params(&[("actor_name", &long)])).unwrap_err(),
            FilterError::TooLong { field: "actor_name", max: NAME_MAX_LENGTH }
        );
    }
}
