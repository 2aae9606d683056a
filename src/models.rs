use jiff::{
    Timestamp,
    civil::{Date, DateTime},
    tz::TimeZone,
};
use serde::{Deserialize, Serialize};

use crate::{
    entities::{genre, language, movie},
    error::{AppError, AppResult},
};

/// Trimmed, lowercased form used for case-insensitive uniqueness and matching.
pub fn lookup_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Accepts a plain date, a civil datetime, or an instant with an offset
/// (which is reduced to its UTC date).
pub fn parse_release_date(raw: &str) -> AppResult<Date> {
    let raw = raw.trim();
    let date = if let Ok(ts) = raw.parse::<Timestamp>() {
        ts.to_zoned(TimeZone::UTC).date()
    } else if let Ok(dt) = raw.parse::<DateTime>() {
        dt.date()
    } else {
        raw.parse::<Date>().map_err(|_| {
            AppError::validation(format!("release_date '{raw}' is not a valid date"))
        })?
    };

    // Stored as text; only four-digit years keep lexical and chronological order equal.
    if !(0..=9999).contains(&date.year()) {
        return Err(AppError::validation(format!("release_date '{raw}' is out of range")));
    }
    Ok(date)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MovieOrder {
    Title,
    ReleaseDate,
}

impl MovieOrder {
    /// Unknown keys yield `None`, which leaves the listing unordered.
    pub fn from_query(sort: Option<&str>) -> Option<Self> {
        match sort {
            Some("title") => Some(MovieOrder::Title),
            Some("release_date") => Some(MovieOrder::ReleaseDate),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GenreView {
    pub id: i32,
    pub name: String,
}

impl From<genre::Model> for GenreView {
    fn from(model: genre::Model) -> Self {
        Self { id: model.id, name: model.name }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LanguageView {
    pub id: i32,
    pub name: String,
}

impl From<language::Model> for LanguageView {
    fn from(model: language::Model) -> Self {
        Self { id: model.id, name: model.name }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieView {
    pub id: i32,
    pub title: String,
    pub genre_id: i32,
    pub language_id: i32,
    pub oscar_count: i32,
    pub release_date: Date,
    pub duration: i32,
    #[serde(rename = "genres")]
    pub genre: Option<GenreView>,
    #[serde(rename = "languages")]
    pub language: Option<LanguageView>,
}

impl MovieView {
    pub fn from_parts(
        movie: movie::Model,
        genre: Option<genre::Model>,
        language: Option<language::Model>,
    ) -> Result<Self, jiff::Error> {
        Ok(Self {
            id: movie.id,
            title: movie.title,
            genre_id: movie.genre_id,
            language_id: movie.language_id,
            oscar_count: movie.oscar_count,
            release_date: movie.release_date.parse()?,
            duration: movie.duration,
            genre: genre.map(GenreView::from),
            language: language.map(LanguageView::from),
        })
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieList {
    pub movies: Vec<MovieView>,
    pub total_movies: usize,
    pub average_duration: Option<f64>,
}

impl MovieList {
    pub fn new(movies: Vec<MovieView>) -> Self {
        let total_movies = movies.len();
        let total_duration: i64 = movies.iter().map(|m| i64::from(m.duration)).sum();
        let average_duration =
            (total_movies > 0).then(|| total_duration as f64 / total_movies as f64);
        Self { movies, total_movies, average_duration }
    }
}

#[derive(Clone, Debug)]
pub struct NewMovie {
    pub title: String,
    pub genre_id: i32,
    pub language_id: i32,
    pub oscar_count: i32,
    pub release_date: Date,
    pub duration: i32,
}

#[derive(Clone, Debug, Default)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub genre_id: Option<i32>,
    pub language_id: Option<i32>,
    pub oscar_count: Option<i32>,
    pub release_date: Option<Date>,
    pub duration: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMovieRequest {
    pub title: Option<String>,
    pub genre_id: Option<i32>,
    pub language_id: Option<i32>,
    pub oscar_count: Option<i32>,
    pub release_date: Option<String>,
    pub duration: Option<i32>,
}

impl CreateMovieRequest {
    pub fn validate(self) -> AppResult<NewMovie> {
        Ok(NewMovie {
            title: non_blank(self.title, "title")?,
            genre_id: required(self.genre_id, "genre_id")?,
            language_id: required(self.language_id, "language_id")?,
            oscar_count: non_negative(self.oscar_count.unwrap_or(0), "oscar_count")?,
            release_date: parse_release_date(&required(self.release_date, "release_date")?)?,
            duration: non_negative(required(self.duration, "duration")?, "duration")?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub genre_id: Option<i32>,
    pub language_id: Option<i32>,
    pub oscar_count: Option<i32>,
    pub release_date: Option<String>,
    pub duration: Option<i32>,
}

impl UpdateMovieRequest {
    pub fn validate(self) -> AppResult<MoviePatch> {
        Ok(MoviePatch {
            title: self.title.map(|t| non_blank(Some(t), "title")).transpose()?,
            genre_id: self.genre_id,
            language_id: self.language_id,
            oscar_count: self.oscar_count.map(|n| non_negative(n, "oscar_count")).transpose()?,
            release_date: self.release_date.as_deref().map(parse_release_date).transpose()?,
            duration: self.duration.map(|n| non_negative(n, "duration")).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct GenreFields {
    pub name: Option<String>,
}

/// Accepts both `{"genre": {"name": ..}}` and a flat `{"name": ..}`.
#[derive(Debug, Deserialize)]
pub struct CreateGenreRequest {
    pub genre: Option<GenreFields>,
    pub name: Option<String>,
}

impl CreateGenreRequest {
    pub fn validate(self) -> AppResult<String> {
        let name = self.genre.and_then(|g| g.name).or(self.name);
        non_blank(name, "genre name")
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateGenreRequest {
    pub name: Option<String>,
}

impl UpdateGenreRequest {
    pub fn validate(self) -> AppResult<String> {
        non_blank(self.name, "genre name")
    }
}

fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::validation(format!("{field} is required")))
}

fn non_blank(value: Option<String>, field: &str) -> AppResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::validation(format!("{field} is required"))),
    }
}

fn non_negative(value: i32, field: &str) -> AppResult<i32> {
    if value < 0 {
        return Err(AppError::validation(format!("{field} must not be negative")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn view(title: &str, duration: i32) -> MovieView {
        MovieView {
            id: 1,
            title: title.to_string(),
            genre_id: 1,
            language_id: 1,
            oscar_count: 0,
            release_date: date(2000, 1, 1),
            duration,
            genre: None,
            language: None,
        }
    }

    #[test]
    fn release_date_accepts_date_datetime_and_instant() {
        assert_eq!(parse_release_date("1998-04-03").unwrap(), date(1998, 4, 3));
        assert_eq!(parse_release_date("1998-04-03T21:30:00").unwrap(), date(1998, 4, 3));
        assert_eq!(parse_release_date("1998-04-03T23:30:00-03:00").unwrap(), date(1998, 4, 4));
        assert_eq!(parse_release_date(" 1998-04-03T00:00:00Z ").unwrap(), date(1998, 4, 3));
    }

    #[test]
    fn release_date_rejects_garbage() {
        let err = parse_release_date("next tuesday").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn release_date_rejects_negative_years() {
        let err = parse_release_date("-000044-03-15").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(parse_release_date("0001-01-01").unwrap(), date(1, 1, 1));
    }

    #[test]
    fn sort_key_falls_back_to_unordered() {
        assert_eq!(MovieOrder::from_query(Some("title")), Some(MovieOrder::Title));
        assert_eq!(MovieOrder::from_query(Some("release_date")), Some(MovieOrder::ReleaseDate));
        assert_eq!(MovieOrder::from_query(Some("Title")), None);
        assert_eq!(MovieOrder::from_query(Some("oscar_count")), None);
        assert_eq!(MovieOrder::from_query(None), None);
    }

    #[test]
    fn movie_list_aggregates_duration() {
        let list = MovieList::new(vec![view("A", 100), view("B", 150), view("C", 110)]);
        assert_eq!(list.total_movies, 3);
        assert_eq!(list.average_duration, Some(120.0));

        let empty = MovieList::new(Vec::new());
        assert_eq!(empty.total_movies, 0);
        assert_eq!(empty.average_duration, None);
    }

    #[test]
    fn movie_view_serializes_relations_under_plural_keys() {
        let mut movie = view("Central do Brasil", 113);
        movie.genre = Some(GenreView { id: 2, name: "Drama".to_string() });
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["release_date"], "2000-01-01");
        assert_eq!(json["genres"]["name"], "Drama");
        assert!(json["languages"].is_null());
    }

    #[test]
    fn create_movie_requires_fields_and_defaults_oscars() {
        let req = CreateMovieRequest {
            title: Some("  Parasite ".to_string()),
            genre_id: Some(1),
            language_id: Some(1),
            oscar_count: None,
            release_date: Some("2019-05-30".to_string()),
            duration: Some(132),
        };
        let movie = req.validate().unwrap();
        assert_eq!(movie.title, "Parasite");
        assert_eq!(movie.oscar_count, 0);

        let missing = CreateMovieRequest {
            title: Some("Parasite".to_string()),
            genre_id: None,
            language_id: Some(1),
            oscar_count: None,
            release_date: Some("2019-05-30".to_string()),
            duration: Some(132),
        };
        let err = missing.validate().unwrap_err();
        assert_eq!(err.to_string(), "genre_id is required");
    }

    #[test]
    fn update_movie_rejects_negative_counts_and_blank_title() {
        let req: UpdateMovieRequest = serde_json::from_str(r#"{"oscar_count": -1}"#).unwrap();
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));

        let req: UpdateMovieRequest = serde_json::from_str(r#"{"title": "   "}"#).unwrap();
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));

        let req: UpdateMovieRequest = serde_json::from_str(r#"{"oscar_count": 5}"#).unwrap();
        let patch = req.validate().unwrap();
        assert_eq!(patch.oscar_count, Some(5));
        assert!(patch.title.is_none());
    }

    #[test]
    fn update_movie_rejects_unknown_fields() {
        let parsed = serde_json::from_str::<UpdateMovieRequest>(r#"{"rating": 5}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn genre_name_accepts_nested_and_flat_bodies() {
        let nested: CreateGenreRequest =
            serde_json::from_str(r#"{"genre": {"name": "Drama"}}"#).unwrap();
        assert_eq!(nested.validate().unwrap(), "Drama");

        let flat: CreateGenreRequest = serde_json::from_str(r#"{"name": "drama"}"#).unwrap();
        assert_eq!(flat.validate().unwrap(), "drama");

        let empty: CreateGenreRequest = serde_json::from_str(r#"{"genre": {}}"#).unwrap();
        assert!(matches!(empty.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn lookup_key_normalizes_case_and_whitespace() {
        assert_eq!(lookup_key("  Ficção Científica "), "ficção científica");
    }
}
