use sea_orm::{ActiveModelTrait, Set};

use crate::{
    catalog::Catalog,
    db,
    entities::user,
    guard::ADMIN_ROLE,
    lookup::{NamedTable, resolve_or_create},
    models::MoviePayload,
};

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-secret";
pub const VIEWER_USER: &str = "viewer";
pub const VIEWER_PASSWORD: &str = "viewer-secret";

pub async fn catalog() -> Catalog {
    let db = db::connect_in_memory().await;

    for (username, password, role) in
        [(ADMIN_USER, ADMIN_PASSWORD, ADMIN_ROLE), (VIEWER_USER, VIEWER_PASSWORD, "user")]
    {
        let role_id = resolve_or_create(&db, NamedTable::Role, role).await.unwrap();
        user::ActiveModel {
            username: Set(username.to_string()),
            password: Set(password.to_string()),
            role_id: Set(role_id),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
    }

    Catalog::new(db)
}

pub fn payload(name: &str, director: &str, genres: &[&str]) -> MoviePayload {
    MoviePayload {
        name: name.to_string(),
        director: director.to_string(),
        genre: genres.iter().map(|g| g.to_string()).collect(),
        imdb_score: 8.0,
        popularity: 80.0,
    }
}

pub async fn add_movie(
    catalog: &Catalog,
    name: &str,
    director: &str,
    genres: &[&str],
    imdb_score: f64,
    popularity: f64,
) -> i32 {
    let mut movie = payload(name, director, genres);
    movie.imdb_score = imdb_score;
    movie.popularity = popularity;
    catalog.create(&movie).await.unwrap()
}
