/// Success envelope shared by every endpoint
///
/// ```json
/// { "success": true, "message": "Task created successfully", "task": { ... } }
/// { "success": true, "count": 2, "tasks": [ ... ] }
/// { "success": true, "message": "Task deleted successfully" }
/// ```
///
/// Failures use [`crate::error::ErrorResponse`] instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{ser::SerializeMap, Serialize, Serializer};

/// A single named payload entry, serialized as `{ key: value }`
#[derive(Debug)]
pub struct Keyed<T> {
    key: &'static str,
    value: T,
}

impl<T: Serialize> Serialize for Keyed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, &self.value)?;
        map.end()
    }
}

/// Envelope holding one record
pub type Record<T> = Envelope<Keyed<T>>;

/// Envelope holding a counted list
pub type Collection<T> = Envelope<Keyed<Vec<T>>>;

#[derive(Debug, Serialize)]
struct Body<T> {
    success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,

    #[serde(flatten)]
    data: Option<T>,
}

/// Successful response: status plus envelope body
#[derive(Debug)]
pub struct Envelope<T = ()> {
    status: StatusCode,
    body: Body<T>,
}

impl Envelope<()> {
    /// Message-only response (deletes)
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: Body {
                success: true,
                message: Some(message.into()),
                count: None,
                data: None,
            },
        }
    }
}

impl<T> Envelope<Keyed<T>> {
    /// One record under `key`
    pub fn record(key: &'static str, value: T) -> Self {
        Self::data(Keyed { key, value })
    }
}

impl<T> Envelope<Keyed<Vec<T>>> {
    /// A list under `key`, with `count`
    pub fn collection(key: &'static str, items: Vec<T>) -> Self {
        let count = items.len();
        let mut envelope = Self::data(Keyed { key, value: items });
        envelope.body.count = Some(count);
        envelope
    }
}

impl<T> Envelope<T> {
    /// Arbitrary payload whose fields are merged into the envelope
    pub fn data(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            body: Body {
                success: true,
                message: None,
                count: None,
                data: Some(data),
            },
        }
    }

    /// Marks the response as `201 Created`
    pub fn created(mut self) -> Self {
        self.status = StatusCode::CREATED;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.body.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::json;

    async fn render<T: Serialize>(envelope: Envelope<T>) -> (StatusCode, serde_json::Value) {
        let response = envelope.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_message_only() {
        let (status, body) = render(Envelope::message("Task deleted successfully")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "message": "Task deleted successfully" }));
    }

    #[tokio::test]
    async fn test_created_record() {
        let envelope = Envelope::record("task", json!({ "id": 1, "title": "Design" }))
            .created()
            .with_message("Task created successfully");
        let (status, body) = render(envelope).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            body,
            json!({
                "success": true,
                "message": "Task created successfully",
                "task": { "id": 1, "title": "Design" }
            })
        );
    }

    #[tokio::test]
    async fn test_collection_counts() {
        let (status, body) = render(Envelope::collection("tasks", vec![1, 2, 3])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "count": 3, "tasks": [1, 2, 3] }));
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let (_, body) = render(Envelope::collection("projects", Vec::<i32>::new())).await;
        assert_eq!(body, json!({ "success": true, "count": 0, "projects": [] }));
    }

    #[tokio::test]
    async fn test_flattened_data() {
        #[derive(Serialize)]
        struct Session {
            user: i32,
            token: &'static str,
        }

        let (_, body) = render(Envelope::data(Session { user: 1, token: "t" })).await;
        assert_eq!(body, json!({ "success": true, "user": 1, "token": "t" }));
    }
}
