use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    LoaderTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use crate::{
    entities::{genre, language, movie},
    error::{AppError, AppResult, Constraint, violated_constraint},
    models::{MovieOrder, MoviePatch, MovieView, NewMovie, lookup_key},
};

const MOVIE_NOT_FOUND: &str = "movie not found";
const GENRE_NOT_FOUND: &str = "genre not found";

#[derive(Clone)]
pub struct Catalog {
    db: DatabaseConnection,
}

impl Catalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_movies(&self, order: Option<MovieOrder>) -> AppResult<Vec<MovieView>> {
        let mut query = movie::Entity::find();
        if let Some(order) = order {
            query = query.order_by_asc(match order {
                MovieOrder::Title => movie::Column::Title,
                MovieOrder::ReleaseDate => movie::Column::ReleaseDate,
            });
        }

        let movies = query.all(&self.db).await?;
        debug!(count = movies.len(), order = ?order, "loaded movies");
        self.with_relations(movies).await
    }

    pub async fn movies_by_genre(&self, genre_name: &str) -> AppResult<Vec<MovieView>> {
        let movies = movie::Entity::find()
            .inner_join(genre::Entity)
            .filter(genre::Column::NameKey.eq(lookup_key(genre_name)))
            .order_by_asc(movie::Column::Title)
            .all(&self.db)
            .await?;
        debug!(genre = %genre_name, count = movies.len(), "loaded movies by genre");
        self.with_relations(movies).await
    }

    pub async fn create_movie(&self, new: NewMovie) -> AppResult<movie::Model> {
        let model = movie::ActiveModel {
            id: Default::default(),
            title_key: Set(lookup_key(&new.title)),
            title: Set(new.title),
            genre_id: Set(new.genre_id),
            language_id: Set(new.language_id),
            oscar_count: Set(new.oscar_count),
            release_date: Set(new.release_date.to_string()),
            duration: Set(new.duration),
        };

        model.insert(&self.db).await.map_err(movie_write_error)
    }

    pub async fn update_movie(&self, id: i32, patch: MoviePatch) -> AppResult<movie::Model> {
        let Some(existing) = movie::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::not_found(MOVIE_NOT_FOUND));
        };

        let mut active = existing.clone().into_active_model();
        if let Some(title) = patch.title {
            active.title_key = Set(lookup_key(&title));
            active.title = Set(title);
        }
        if let Some(genre_id) = patch.genre_id {
            active.genre_id = Set(genre_id);
        }
        if let Some(language_id) = patch.language_id {
            active.language_id = Set(language_id);
        }
        if let Some(oscar_count) = patch.oscar_count {
            active.oscar_count = Set(oscar_count);
        }
        if let Some(release_date) = patch.release_date {
            active.release_date = Set(release_date.to_string());
        }
        if let Some(duration) = patch.duration {
            active.duration = Set(duration);
        }

        if !active.is_changed() {
            return Ok(existing);
        }

        active.update(&self.db).await.map_err(|err| match err {
            DbErr::RecordNotUpdated => AppError::not_found(MOVIE_NOT_FOUND),
            err => movie_write_error(err),
        })
    }

    pub async fn delete_movie(&self, id: i32) -> AppResult<()> {
        let res = movie::Entity::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(AppError::not_found(MOVIE_NOT_FOUND));
        }
        Ok(())
    }

    pub async fn list_genres(&self) -> AppResult<Vec<genre::Model>> {
        let genres = genre::Entity::find().order_by_asc(genre::Column::Name).all(&self.db).await?;
        Ok(genres)
    }

    pub async fn create_genre(&self, name: String) -> AppResult<genre::Model> {
        let model = genre::ActiveModel {
            id: Default::default(),
            name_key: Set(lookup_key(&name)),
            name: Set(name),
        };

        model.insert(&self.db).await.map_err(genre_write_error)
    }

    pub async fn rename_genre(&self, id: i32, name: String) -> AppResult<genre::Model> {
        let Some(existing) = genre::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::not_found(GENRE_NOT_FOUND));
        };

        let mut active = existing.into_active_model();
        active.name_key = Set(lookup_key(&name));
        active.name = Set(name);

        active.update(&self.db).await.map_err(|err| match err {
            DbErr::RecordNotUpdated => AppError::not_found(GENRE_NOT_FOUND),
            err => genre_write_error(err),
        })
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        let res = genre::Entity::delete_by_id(id).exec(&self.db).await.map_err(|err| {
            match violated_constraint(&err) {
                Some(Constraint::ForeignKey) => {
                    AppError::conflict("genre is still referenced by movies")
                },
                _ => err.into(),
            }
        })?;
        if res.rows_affected == 0 {
            return Err(AppError::not_found(GENRE_NOT_FOUND));
        }
        Ok(())
    }

    async fn with_relations(&self, movies: Vec<movie::Model>) -> AppResult<Vec<MovieView>> {
        let genres = movies.load_one(genre::Entity, &self.db).await?;
        let languages = movies.load_one(language::Entity, &self.db).await?;

        movies
            .into_iter()
            .zip(genres)
            .zip(languages)
            .map(|((movie, genre), language)| {
                MovieView::from_parts(movie, genre, language).map_err(AppError::from)
            })
            .collect()
    }
}

fn movie_write_error(err: DbErr) -> AppError {
    match violated_constraint(&err) {
        Some(Constraint::Unique) => AppError::conflict("movie already exists"),
        Some(Constraint::ForeignKey) => {
            AppError::validation("genre_id or language_id does not reference an existing record")
        },
        None => err.into(),
    }
}

fn genre_write_error(err: DbErr) -> AppError {
    match violated_constraint(&err) {
        Some(Constraint::Unique) => AppError::conflict("genre name already exists"),
        _ => err.into(),
    }
}
