use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};
use tracing::{debug, info};

use crate::{
    catalog::Catalog,
    entities::{movie, movie_genre},
    error::{AppError, AppResult, movie_write_error},
    lookup::{NamedTable, find_id, resolve_or_create},
    models::MoviePayload,
};

impl Catalog {
    pub async fn create(&self, payload: &MoviePayload) -> AppResult<i32> {
        let txn = self.db().begin().await?;

        ensure_unique(&txn, &payload.name, &payload.director, None).await?;
        let director_id = resolve_or_create(&txn, NamedTable::Director, &payload.director).await?;

        let model = movie::ActiveModel {
            name: Set(payload.name.clone()),
            imdb_score: Set(payload.imdb_score),
            popularity: Set(payload.popularity),
            director_id: Set(director_id),
            ..Default::default()
        };
        movie::Entity::insert(model)
            .exec_without_returning(&txn)
            .await
            .map_err(|e| movie_write_error(e, &payload.name, &payload.director))?;

        let movie_id = movie::Entity::find()
            .select_only()
            .column(movie::Column::Id)
            .filter(movie::Column::Name.eq(payload.name.as_str()))
            .filter(movie::Column::DirectorId.eq(director_id))
            .into_tuple::<i32>()
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("movie {:?} missing after insert", payload.name))?;

        link_genres(&txn, movie_id, payload).await?;
        txn.commit().await?;

        info!(movie_id, name = %payload.name, director = %payload.director, "movie created");
        Ok(movie_id)
    }

    pub async fn update(&self, movie_id: i32, payload: &MoviePayload) -> AppResult<()> {
        let txn = self.db().begin().await?;

        let exists = movie::Entity::find_by_id(movie_id)
            .select_only()
            .column(movie::Column::Id)
            .into_tuple::<i32>()
            .one(&txn)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(movie_id));
        }

        ensure_unique(&txn, &payload.name, &payload.director, Some(movie_id)).await?;
        let director_id = resolve_or_create(&txn, NamedTable::Director, &payload.director).await?;

        let updated = movie::Entity::update_many()
            .col_expr(movie::Column::Name, Expr::value(payload.name.clone()))
            .col_expr(movie::Column::ImdbScore, Expr::value(payload.imdb_score))
            .col_expr(movie::Column::Popularity, Expr::value(payload.popularity))
            .col_expr(movie::Column::DirectorId, Expr::value(director_id))
            .filter(movie::Column::Id.eq(movie_id))
            .exec(&txn)
            .await
            .map_err(|e| movie_write_error(e, &payload.name, &payload.director))?;
        if updated.rows_affected == 0 {
            return Err(AppError::NotFound(movie_id));
        }

        let removed = movie_genre::Entity::delete_many()
            .filter(movie_genre::Column::MovieId.eq(movie_id))
            .exec(&txn)
            .await?;
        debug!(movie_id, removed = removed.rows_affected, "cleared genre links");

        link_genres(&txn, movie_id, payload).await?;
        txn.commit().await?;

        info!(movie_id, name = %payload.name, "movie updated");
        Ok(())
    }

    pub async fn delete(&self, movie_id: i32) -> AppResult<()> {
        let txn = self.db().begin().await?;

        movie_genre::Entity::delete_many()
            .filter(movie_genre::Column::MovieId.eq(movie_id))
            .exec(&txn)
            .await?;
        let deleted = movie::Entity::delete_by_id(movie_id).exec(&txn).await?;

        txn.commit().await?;

        info!(movie_id, existed = deleted.rows_affected > 0, "movie deleted");
        Ok(())
    }
}

async fn ensure_unique<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    director: &str,
    exclude: Option<i32>,
) -> AppResult<()> {
    // an unknown director cannot have directed anything yet
    let Some(director_id) = find_id(conn, NamedTable::Director, director).await? else {
        return Ok(());
    };

    let mut query = movie::Entity::find()
        .select_only()
        .column(movie::Column::Id)
        .filter(movie::Column::Name.eq(name))
        .filter(movie::Column::DirectorId.eq(director_id));
    if let Some(id) = exclude {
        query = query.filter(movie::Column::Id.ne(id));
    }

    match query.into_tuple::<i32>().one(conn).await? {
        Some(existing) => {
            debug!(existing, name, director, "duplicate movie rejected");
            Err(AppError::Conflict { name: name.to_string(), director: director.to_string() })
        },
        None => Ok(()),
    }
}

async fn link_genres<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
    payload: &MoviePayload,
) -> AppResult<()> {
    let mut links = Vec::new();
    for name in payload.distinct_genres() {
        let genre_id = resolve_or_create(conn, NamedTable::Genre, name).await?;
        links.push(movie_genre::ActiveModel { movie_id: Set(movie_id), genre_id: Set(genre_id) });
    }

    // insert_many rejects an empty batch
    if links.is_empty() {
        return Ok(());
    }
    movie_genre::Entity::insert_many(links).exec_without_returning(conn).await?;
    Ok(())
}
