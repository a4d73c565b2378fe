use std::path::Path;

use anyhow::Context;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait, sea_query::OnConflict,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    entities::{movie, movie_genre, user},
    error::AppResult,
    lookup::{NamedTable, resolve_or_create},
};

pub const MOVIES_FILE: &str = "imdb.json";
pub const USERS_FILE: &str = "user_role.json";

#[derive(Debug, Deserialize)]
struct UserEntry {
    username: String,
    password: String,
    role: String,
}

#[derive(Debug, Deserialize)]
struct MovieEntry {
    name: String,
    director: String,
    #[serde(default)]
    genre: Vec<String>,
    imdb_score: f64,
    #[serde(rename = "99popularity")]
    popularity: f64,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub movies: usize,
    pub skipped: usize,
}

pub async fn seed_if_empty(db: &DatabaseConnection, dir: &Path) -> AppResult<Option<SeedReport>> {
    let movies = movie::Entity::find().count(db).await?;
    let users = user::Entity::find().count(db).await?;
    if movies > 0 || users > 0 {
        info!(movies, users, "database already populated, skipping seed");
        return Ok(None);
    }

    let user_entries: Vec<UserEntry> = read_json(&dir.join(USERS_FILE)).await?;
    let movie_entries: Vec<MovieEntry> = read_json(&dir.join(MOVIES_FILE)).await?;

    let txn = db.begin().await?;
    let mut report = SeedReport::default();

    for entry in &user_entries {
        let role_id = resolve_or_create(&txn, NamedTable::Role, &entry.role).await?;
        let model = user::ActiveModel {
            username: Set(entry.username.clone()),
            password: Set(entry.password.clone()),
            role_id: Set(role_id),
            ..Default::default()
        };
        user::Entity::insert(model).exec_without_returning(&txn).await?;
        report.users += 1;
    }

    for entry in &movie_entries {
        let director_id = resolve_or_create(&txn, NamedTable::Director, &entry.director).await?;

        let model = movie::ActiveModel {
            name: Set(entry.name.clone()),
            imdb_score: Set(entry.imdb_score),
            popularity: Set(entry.popularity),
            director_id: Set(director_id),
            ..Default::default()
        };
        let inserted = movie::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([movie::Column::Name, movie::Column::DirectorId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        if inserted == 0 {
            warn!(name = %entry.name, director = %entry.director, "duplicate movie in dump, skipped");
            report.skipped += 1;
            continue;
        }

        let movie_id = movie::Entity::find()
            .filter(movie::Column::Name.eq(entry.name.as_str()))
            .filter(movie::Column::DirectorId.eq(director_id))
            .one(&txn)
            .await?
            .map(|m| m.id)
            .with_context(|| format!("movie {:?} missing after insert", entry.name))?;

        let mut genre_ids = Vec::with_capacity(entry.genre.len());
        for name in &entry.genre {
            let genre_id = resolve_or_create(&txn, NamedTable::Genre, name).await?;
            if !genre_ids.contains(&genre_id) {
                genre_ids.push(genre_id);
            }
        }
        if !genre_ids.is_empty() {
            let links = genre_ids.into_iter().map(|genre_id| movie_genre::ActiveModel {
                movie_id: Set(movie_id),
                genre_id: Set(genre_id),
            });
            movie_genre::Entity::insert_many(links).exec_without_returning(&txn).await?;
        }
        report.movies += 1;
    }

    txn.commit().await?;
    info!(users = report.users, movies = report.movies, skipped = report.skipped, "seed complete");
    Ok(Some(report))
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let bytes =
        tokio::fs::read(path).await.with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}
