use std::{collections::HashMap, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_extra::extract::WithRejection;
use tracing::info;

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{
        CreateGenreRequest, CreateMovieRequest, GenreView, MovieList, MovieOrder, MovieView,
        UpdateGenreRequest, UpdateMovieRequest,
    },
};

type Shared = State<Arc<AppState>>;
type JsonBody<T> = WithRejection<Json<T>, AppError>;
type IdParam = WithRejection<Path<i32>, AppError>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/sort", get(sort_movies))
        // One pattern serves both the genre filter (GET) and id-addressed writes.
        .route("/movies/{param}", get(movies_by_genre).put(update_movie).delete(delete_movie))
        .route("/genres", get(list_genres))
        .route("/genre", post(create_genre))
        .route("/genres/{id}", put(update_genre).delete(delete_genre))
        .with_state(state)
}

pub async fn list_movies(State(state): Shared) -> AppResult<Json<MovieList>> {
    let movies = state.catalog.list_movies(Some(MovieOrder::Title)).await?;
    Ok(Json(MovieList::new(movies)))
}

/// A raw map keeps repeated or odd `sort` values on the unordered path.
pub async fn sort_movies(
    State(state): Shared,
    WithRejection(Query(q), _): WithRejection<Query<HashMap<String, String>>, AppError>,
) -> AppResult<Json<Vec<MovieView>>> {
    let order = MovieOrder::from_query(q.get("sort").map(String::as_str));
    let movies = state.catalog.list_movies(order).await?;
    Ok(Json(movies))
}

pub async fn movies_by_genre(
    State(state): Shared,
    WithRejection(Path(genre_name), _): WithRejection<Path<String>, AppError>,
) -> AppResult<Json<Vec<MovieView>>> {
    let movies = state.catalog.movies_by_genre(&genre_name).await?;
    Ok(Json(movies))
}

pub async fn create_movie(
    State(state): Shared,
    WithRejection(Json(req), _): JsonBody<CreateMovieRequest>,
) -> AppResult<StatusCode> {
    let movie = state.catalog.create_movie(req.validate()?).await?;
    info!(id = movie.id, title = %movie.title, "movie created");
    Ok(StatusCode::CREATED)
}

pub async fn update_movie(
    State(state): Shared,
    WithRejection(Path(id), _): IdParam,
    WithRejection(Json(req), _): JsonBody<UpdateMovieRequest>,
) -> AppResult<StatusCode> {
    let movie = state.catalog.update_movie(id, req.validate()?).await?;
    info!(id = movie.id, title = %movie.title, "movie updated");
    Ok(StatusCode::OK)
}

pub async fn delete_movie(
    State(state): Shared,
    WithRejection(Path(id), _): IdParam,
) -> AppResult<StatusCode> {
    state.catalog.delete_movie(id).await?;
    info!(id, "movie deleted");
    Ok(StatusCode::OK)
}

pub async fn list_genres(State(state): Shared) -> AppResult<Json<Vec<GenreView>>> {
    let genres = state.catalog.list_genres().await?;
    Ok(Json(genres.into_iter().map(GenreView::from).collect()))
}

pub async fn create_genre(
    State(state): Shared,
    WithRejection(Json(req), _): JsonBody<CreateGenreRequest>,
) -> AppResult<(StatusCode, Json<GenreView>)> {
    let genre = state.catalog.create_genre(req.validate()?).await?;
    info!(id = genre.id, name = %genre.name, "genre created");
    Ok((StatusCode::CREATED, Json(genre.into())))
}

pub async fn update_genre(
    State(state): Shared,
    WithRejection(Path(id), _): IdParam,
    WithRejection(Json(req), _): JsonBody<UpdateGenreRequest>,
) -> AppResult<Json<GenreView>> {
    let name = req.validate()?;
    let genre = state.catalog.rename_genre(id, name).await?;
    info!(id = genre.id, name = %genre.name, "genre renamed");
    Ok(Json(genre.into()))
}

pub async fn delete_genre(
    State(state): Shared,
    WithRejection(Path(id), _): IdParam,
) -> AppResult<StatusCode> {
    state.catalog.delete_genre(id).await?;
    info!(id, "genre deleted");
    Ok(StatusCode::OK)
}
