use std::{collections::HashMap, sync::Arc};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde_json::Value;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{Action, Credentials, MovieRecord, MoviePayload, MutationAck},
    search::SearchRequest,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/movies", get(list_movies))
        .route("/movies/", get(list_movies))
        .route("/movies/add", post(add_movie))
        .route("/movies/{movie_id}", get(get_movie).put(update_movie).delete(delete_movie))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

pub async fn index(Query(params): Query<HashMap<String, String>>) -> Response {
    if !params.is_empty() {
        let body = Html("<h1> Please remove query parameter(s) and try again. </h1>");
        return (StatusCode::BAD_REQUEST, body).into_response();
    }
    Html("<h1> Welcome to the movie catalog! </h1>").into_response()
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Vec<MovieRecord>>> {
    if params.is_empty() {
        return Ok(Json(state.catalog.search(&SearchRequest::All).await?));
    }

    let (Some(key), Some(value)) = (params.get("searchKey"), params.get("searchValue")) else {
        return Err(AppError::bad_input(
            "Please either provide none or all the valid and required query parameters.",
        ));
    };

    let records = match SearchRequest::from_params(key, value)? {
        Some(request) => state.catalog.search(&request).await?,
        None => Vec::new(),
    };
    Ok(Json(records))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i32>,
) -> AppResult<Json<Vec<MovieRecord>>> {
    Ok(Json(state.catalog.search(&SearchRequest::MovieId(movie_id)).await?))
}

pub async fn add_movie(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<MutationAck>> {
    let body = authorize(&state, &body, Action::Create).await?;
    let payload = MoviePayload::from_body(&body)?;
    let movie_id = state.catalog.create(&payload).await?;
    Ok(Json(MutationAck { movie_id, message: "Successfully added a new movie." }))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i32>,
    body: Bytes,
) -> AppResult<Json<MutationAck>> {
    let body = authorize(&state, &body, Action::Update).await?;
    let payload = MoviePayload::from_body(&body)?;
    state.catalog.update(movie_id, &payload).await?;
    Ok(Json(MutationAck { movie_id, message: "Successfully updated a movie." }))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i32>,
    body: Bytes,
) -> AppResult<StatusCode> {
    authorize(&state, &body, Action::Delete).await?;
    state.catalog.delete(movie_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn authorize(state: &AppState, body: &[u8], action: Action) -> AppResult<Value> {
    let body: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let credentials = Credentials::from_body(&body);
    state.guard.authorize(credentials.as_ref(), action).await?.into_result()?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        guard::{AccessGuard, PlaintextGuard},
        test_support,
    };

    async fn app() -> Router {
        let catalog = test_support::catalog().await;
        let guard: Arc<dyn AccessGuard> = Arc::new(PlaintextGuard::new(catalog.db().clone()));
        router(Arc::new(AppState { catalog, guard }))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn movie_body(username: &str, password: &str) -> Value {
        json!({
            "username": username,
            "password": password,
            "name": "Heat",
            "director": "Michael Mann",
            "genre": ["Action", "Drama"],
            "imdb_score": 8.3,
            "popularity": 83.0,
        })
    }

    fn admin_body() -> Value {
        movie_body(test_support::ADMIN_USER, test_support::ADMIN_PASSWORD)
    }

    #[tokio::test]
    async fn create_fetch_update_delete() {
        let app = app().await;

        let (status, ack) = send(&app, "POST", "/movies/add", Some(admin_body())).await;
        assert_eq!(status, StatusCode::OK);
        let id = ack["movie_id"].as_i64().unwrap();
        assert_eq!(ack["message"], "Successfully added a new movie.");

        let (status, found) = send(&app, "GET", &format!("/movies/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found[0]["name"], "Heat");
        assert_eq!(found[0]["director"], "Michael Mann");

        let mut changed = admin_body();
        changed["genre"] = json!(["Crime"]);
        let (status, ack) = send(&app, "PUT", &format!("/movies/{id}"), Some(changed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["message"], "Successfully updated a movie.");

        let (_, found) = send(&app, "GET", &format!("/movies/{id}"), None).await;
        assert_eq!(found[0]["genre"], json!(["Crime"]));

        let creds = json!({
            "username": test_support::ADMIN_USER,
            "password": test_support::ADMIN_PASSWORD,
        });
        let (status, _) = send(&app, "DELETE", &format!("/movies/{id}"), Some(creds.clone())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", &format!("/movies/{id}"), Some(creds)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, found) = send(&app, "GET", &format!("/movies/{id}"), None).await;
        assert_eq!(found, json!([]));
    }

    #[tokio::test]
    async fn duplicate_create_is_conflict() {
        let app = app().await;

        send(&app, "POST", "/movies/add", Some(admin_body())).await;
        let (status, err) = send(&app, "POST", "/movies/add", Some(admin_body())).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["error"], "conflict");
    }

    #[tokio::test]
    async fn auth_failures_are_distinguished() {
        let app = app().await;

        let viewer = movie_body(test_support::VIEWER_USER, test_support::VIEWER_PASSWORD);
        let (status, err) = send(&app, "POST", "/movies/add", Some(viewer)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(err["message"], "You are not authorized to add a new movie.");

        let stranger = movie_body("stranger", "nope");
        let (status, err) = send(&app, "POST", "/movies/add", Some(stranger)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err["error"], "unauthenticated");

        let (status, _) = send(&app, "DELETE", "/movies/1", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "PUT", "/movies/1", Some(json!({"username": "admin"}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn incomplete_payload_is_bad_input() {
        let app = app().await;
        let mut body = admin_body();
        body["imdb_score"] = json!(0);

        let (status, err) = send(&app, "POST", "/movies/add", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["message"], "Bad or Incomplete request payload");
    }

    #[tokio::test]
    async fn search_query_parameters() {
        let app = app().await;
        send(&app, "POST", "/movies/add", Some(admin_body())).await;

        let (status, all) = send(&app, "GET", "/movies", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all.as_array().unwrap().len(), 1);

        let (_, found) = send(&app, "GET", "/movies/?searchKey=imdb_score&searchValue=8-9", None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (_, found) = send(&app, "GET", "/movies?searchKey=genre&searchValue=Unknown", None).await;
        assert_eq!(found, json!([]));

        let (_, found) = send(&app, "GET", "/movies?searchKey=year&searchValue=1995", None).await;
        assert_eq!(found, json!([]));

        let (status, err) = send(&app, "GET", "/movies?searchKey=imdb_score&searchValue=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "bad_input");

        let (status, _) = send(&app, "GET", "/movies?searchKey=name", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn index_rejects_query_parameters() {
        let app = app().await;

        let (status, _) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", "/?x=1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
