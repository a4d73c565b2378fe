use std::collections::HashMap;

use sea_orm::ConnectionTrait;

use crate::{
    db::find_by_ids,
    entities::{director, genre, movie, movie_genre},
    error::AppResult,
    models::MovieRecord,
};

pub async fn assemble<C: ConnectionTrait>(
    conn: &C,
    movies: Vec<movie::Model>,
) -> AppResult<Vec<MovieRecord>> {
    if movies.is_empty() {
        return Ok(Vec::new());
    }

    let mut director_ids: Vec<i32> = movies.iter().map(|m| m.director_id).collect();
    director_ids.sort_unstable();
    director_ids.dedup();
    let directors: HashMap<i32, String> =
        find_by_ids::<director::Entity, _>(conn, director::Column::Id, &director_ids)
            .await?
            .into_iter()
            .map(|d| (d.id, d.name))
            .collect();

    let movie_ids: Vec<i32> = movies.iter().map(|m| m.id).collect();
    let links =
        find_by_ids::<movie_genre::Entity, _>(conn, movie_genre::Column::MovieId, &movie_ids)
            .await?;

    let mut genre_ids: Vec<i32> = links.iter().map(|l| l.genre_id).collect();
    genre_ids.sort_unstable();
    genre_ids.dedup();
    let genres: HashMap<i32, String> =
        find_by_ids::<genre::Entity, _>(conn, genre::Column::Id, &genre_ids)
            .await?
            .into_iter()
            .map(|g| (g.id, g.name))
            .collect();

    let mut genres_by_movie: HashMap<i32, Vec<String>> = HashMap::new();
    for link in links {
        if let Some(name) = genres.get(&link.genre_id) {
            genres_by_movie.entry(link.movie_id).or_default().push(name.clone());
        }
    }

    let records = movies
        .into_iter()
        .map(|m| MovieRecord {
            director: directors.get(&m.director_id).cloned(),
            genre: genres_by_movie.remove(&m.id).unwrap_or_default(),
            id: m.id,
            name: m.name,
            imdb_score: m.imdb_score,
            popularity: m.popularity,
        })
        .collect();

    Ok(records)
}
