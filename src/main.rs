mod assembler;
mod catalog;
mod config;
mod db;
mod entities;
mod error;
mod guard;
mod loader;
mod lookup;
mod models;
mod mutation;
mod routes;
mod search;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::{
    catalog::Catalog,
    config::Config,
    guard::{AccessGuard, PlaintextGuard},
};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub guard: Arc<dyn AccessGuard>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,moviedex=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    if let Some(dir) = &config.seed_dir {
        loader::seed_if_empty(&db, dir).await?;
    }

    let state = Arc::new(AppState {
        catalog: Catalog::new(db.clone()),
        guard: Arc::new(PlaintextGuard::new(db)),
    });

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
