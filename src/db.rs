use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, Statement,
};

use crate::error::AppResult;

const IN_CHUNK: usize = 500;

pub async fn connect_and_migrate(database_url: &str) -> AppResult<DatabaseConnection> {
    connect_with(ConnectOptions::new(database_url.to_string())).await
}

pub async fn connect_with(options: ConnectOptions) -> AppResult<DatabaseConnection> {
    let db = Database::connect(options).await?;

    for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL", "PRAGMA cache_size=-64000"]
    {
        db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string())).await?;
    }

    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Fetches every row of `E` whose `column` is in `ids`.
///
/// An empty id set returns an empty result without issuing a query; large sets
/// are split across several queries.
pub async fn find_by_ids<E, C>(conn: &C, column: E::Column, ids: &[i32]) -> AppResult<Vec<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(IN_CHUNK) {
        let batch = E::find().filter(column.is_in(chunk.iter().copied())).all(conn).await?;
        rows.extend(batch);
    }
    Ok(rows)
}

#[cfg(test)]
pub async fn connect_in_memory() -> DatabaseConnection {
    // a single pooled connection keeps every query on the same in-memory database
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    connect_with(options).await.expect("in-memory database")
}
