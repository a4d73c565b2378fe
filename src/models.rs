use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};

const BAD_PAYLOAD: &str = "Bad or Incomplete request payload";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieRecord {
    pub id: i32,
    pub name: String,
    pub imdb_score: f64,
    pub popularity: f64,
    /// `None` when the director reference does not resolve.
    pub director: Option<String>,
    pub genre: Vec<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn describe(self) -> &'static str {
        match self {
            Action::Create => "add a new movie",
            Action::Update => "update an existing movie",
            Action::Delete => "delete an existing movie",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn from_body(body: &Value) -> Option<Self> {
        let username = body.get("username")?.as_str()?;
        let password = body.get("password")?.as_str()?;
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self { username: username.to_string(), password: password.to_string() })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MoviePayload {
    pub name: String,
    pub director: String,
    pub genre: Vec<String>,
    pub imdb_score: f64,
    pub popularity: f64,
}

impl MoviePayload {
    pub fn from_body(body: &Value) -> AppResult<Self> {
        let field = |key: &str| body.get(key).filter(|v| is_truthy(v)).ok_or_else(bad_payload);

        let name = field("name")?.as_str().ok_or_else(bad_payload)?.to_string();
        let director = field("director")?.as_str().ok_or_else(bad_payload)?.to_string();
        let genre = field("genre")?
            .as_array()
            .ok_or_else(bad_payload)?
            .iter()
            .map(|g| g.as_str().map(str::to_string).ok_or_else(bad_payload))
            .collect::<AppResult<Vec<_>>>()?;
        let imdb_score = field("imdb_score")?.as_f64().ok_or_else(bad_payload)?;
        let popularity = field("popularity")?.as_f64().ok_or_else(bad_payload)?;

        Ok(Self { name, director, genre, imdb_score, popularity })
    }

    pub fn distinct_genres(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.genre.len());
        for g in &self.genre {
            if !seen.contains(&g.as_str()) {
                seen.push(g.as_str());
            }
        }
        seen
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn bad_payload() -> AppError {
    AppError::bad_input(BAD_PAYLOAD)
}

#[derive(Clone, Debug, Serialize)]
pub struct MutationAck {
    pub movie_id: i32,
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn full_body() -> Value {
        json!({
            "name": "Heat",
            "director": "Michael Mann",
            "genre": ["Crime", "Drama"],
            "imdb_score": 8.3,
            "popularity": 83.0,
        })
    }

    #[test]
    fn payload_accepts_complete_body() {
        let payload = MoviePayload::from_body(&full_body()).unwrap();
        assert_eq!(payload.name, "Heat");
        assert_eq!(payload.genre, vec!["Crime", "Drama"]);
        assert_eq!(payload.imdb_score, 8.3);
    }

    #[test]
    fn payload_rejects_missing_and_falsy_fields() {
        for (key, value) in [
            ("name", json!("")),
            ("director", Value::Null),
            ("genre", json!([])),
            ("imdb_score", json!(0)),
            ("popularity", json!(0.0)),
        ] {
            let mut body = full_body();
            body[key] = value;
            let err = MoviePayload::from_body(&body).unwrap_err();
            assert!(matches!(err, AppError::BadInput(_)), "{key} should be rejected");
        }

        let mut body = full_body();
        body.as_object_mut().unwrap().remove("popularity");
        assert!(matches!(MoviePayload::from_body(&body), Err(AppError::BadInput(_))));
    }

    #[test]
    fn payload_rejects_wrong_types() {
        let mut body = full_body();
        body["imdb_score"] = json!("high");
        assert!(matches!(MoviePayload::from_body(&body), Err(AppError::BadInput(_))));

        let mut body = full_body();
        body["genre"] = json!(["Crime", 7]);
        assert!(matches!(MoviePayload::from_body(&body), Err(AppError::BadInput(_))));
    }

    #[test]
    fn distinct_genres_keeps_first_occurrence() {
        let mut payload = MoviePayload::from_body(&full_body()).unwrap();
        payload.genre = vec!["Drama".into(), "Crime".into(), "Drama".into()];
        assert_eq!(payload.distinct_genres(), vec!["Drama", "Crime"]);
    }

    #[test]
    fn credentials_need_both_fields() {
        let creds = Credentials::from_body(&json!({"username": "a", "password": "b"})).unwrap();
        assert_eq!(creds.username, "a");
        assert!(Credentials::from_body(&json!({"username": "a"})).is_none());
        assert!(Credentials::from_body(&json!({"username": "a", "password": ""})).is_none());
        assert!(Credentials::from_body(&json!({"username": 1, "password": "b"})).is_none());
        assert!(Credentials::from_body(&json!([])).is_none());
    }
}
