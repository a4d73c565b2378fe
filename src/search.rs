use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::debug;

use crate::{
    assembler::assemble,
    catalog::Catalog,
    db::find_by_ids,
    entities::{movie, movie_genre},
    error::{AppError, AppResult},
    lookup::{NamedTable, find_id},
    models::MovieRecord,
};

const RANGE_FORMAT_HINT: &str = "Provide the value in range format, something like 2-6.";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RangeField {
    ImdbScore,
    Popularity,
}

impl RangeField {
    fn column(self) -> movie::Column {
        match self {
            RangeField::ImdbScore => movie::Column::ImdbScore,
            RangeField::Popularity => movie::Column::Popularity,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SearchRequest {
    All,
    MovieId(i32),
    Name(String),
    Director(String),
    Genre(String),
    Range { field: RangeField, start: f64, end: f64 },
}

impl SearchRequest {
    pub fn from_params(key: &str, value: &str) -> AppResult<Option<Self>> {
        let request = match key {
            "movie_id" => {
                let id = value
                    .parse()
                    .map_err(|_| AppError::bad_input("movie_id must be an integer."))?;
                SearchRequest::MovieId(id)
            },
            "name" => SearchRequest::Name(value.to_string()),
            "director" => SearchRequest::Director(value.to_string()),
            "genre" => SearchRequest::Genre(value.to_string()),
            "imdb_score" | "popularity" => {
                let field =
                    if key == "imdb_score" { RangeField::ImdbScore } else { RangeField::Popularity };
                let (start, end) = parse_range(value)?;
                SearchRequest::Range { field, start, end }
            },
            _ => return Ok(None),
        };
        Ok(Some(request))
    }
}

pub fn parse_range(value: &str) -> AppResult<(f64, f64)> {
    let bad = || AppError::bad_input(RANGE_FORMAT_HINT);

    let (start, end) = value.split_once('-').ok_or_else(bad)?;
    if !is_plain_decimal(start) || !is_plain_decimal(end) {
        return Err(bad());
    }
    Ok((start.parse().map_err(|_| bad())?, end.parse().map_err(|_| bad())?))
}

fn is_plain_decimal(s: &str) -> bool {
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (s, None),
    };
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    digits(int) && frac.is_none_or(digits)
}

impl Catalog {
    pub async fn search(&self, request: &SearchRequest) -> AppResult<Vec<MovieRecord>> {
        search_with(self.db(), request).await
    }
}

pub(crate) async fn search_with<C: ConnectionTrait>(
    conn: &C,
    request: &SearchRequest,
) -> AppResult<Vec<MovieRecord>> {
    let base = movie::Entity::find().order_by_asc(movie::Column::Id);

    let movies = match request {
        SearchRequest::All => base.all(conn).await?,
        SearchRequest::MovieId(id) => base.filter(movie::Column::Id.eq(*id)).all(conn).await?,
        SearchRequest::Name(name) => base.filter(movie::Column::Name.eq(name.as_str())).all(conn).await?,
        SearchRequest::Director(name) => {
            let Some(director_id) = find_id(conn, NamedTable::Director, name).await? else {
                debug!(director = %name, "unknown director, empty result");
                return Ok(Vec::new());
            };
            base.filter(movie::Column::DirectorId.eq(director_id)).all(conn).await?
        },
        SearchRequest::Genre(name) => {
            let Some(genre_id) = find_id(conn, NamedTable::Genre, name).await? else {
                debug!(genre = %name, "unknown genre, empty result");
                return Ok(Vec::new());
            };
            let movie_ids: Vec<i32> = movie_genre::Entity::find()
                .select_only()
                .column(movie_genre::Column::MovieId)
                .filter(movie_genre::Column::GenreId.eq(genre_id))
                .into_tuple()
                .all(conn)
                .await?;
            let mut movies =
                find_by_ids::<movie::Entity, _>(conn, movie::Column::Id, &movie_ids).await?;
            movies.sort_by_key(|m| m.id);
            movies
        },
        SearchRequest::Range { field, start, end } => {
            base.filter(field.column().between(*start, *end)).all(conn).await?
        },
    };

    debug!(?request, matched = movies.len(), "search");
    assemble(conn, movies).await
}
