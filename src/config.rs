use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub seed_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "5000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://imdb.db?mode=rwc".to_string());

        let seed_dir =
            std::env::var("SEED_DIR").ok().filter(|s| !s.trim().is_empty()).map(PathBuf::from);

        Ok(Self { addr: format!("{host}:{port}").parse().context("HOST/PORT")?, database_url, seed_dir })
    }
}
