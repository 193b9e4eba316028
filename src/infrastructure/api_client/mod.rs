pub mod backend;
pub mod http;
pub mod normalize;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::domain::error::{AppError, Result};

pub use backend::QaBackend;
pub use http::HttpApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ApiMethod {
    Get,
    Put,
}

impl ApiMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiMethod::Get => "GET",
            ApiMethod::Put => "PUT",
        }
    }
}

/// One backend call, relative to the configured origin. Two equal requests hit the
/// backend identically, which is what a manual retry relies on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiRequest {
    pub method: ApiMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: ApiMethod::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn put(path: impl Into<String>, body: JsonValue) -> Self {
        Self {
            method: ApiMethod::Put,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn describe(&self) -> String {
        format!("{} {}", self.method.as_str(), self.path)
    }
}

/// Raw answer for any HTTP status. Callers decide what a non-2xx means for them.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    pub elapsed_ms: u64,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn ensure_success(self, request: &ApiRequest) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(AppError::Http {
            status: self.status,
            message: format!("{} failed: {}", request.describe(), error_detail(&self.body)),
        })
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| AppError::Decode(format!("Failed to parse response JSON: {}", e)))
    }
}

/// The backend answers errors as `{ "detail": "..." }`; fall back to a body preview.
fn error_detail(body: &str) -> String {
    if let Ok(JsonValue::Object(map)) = serde_json::from_str::<JsonValue>(body) {
        if let Some(detail) = map.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(200).collect()
}

#[async_trait]
pub trait ApiClient {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory client used by the use case tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone)]
    pub(crate) enum Scripted {
        Respond(u16, String),
        Fail(AppError),
        Delay(Duration, Box<Scripted>),
    }

    #[derive(Default)]
    pub(crate) struct RecordingClient {
        routes: Mutex<HashMap<(ApiMethod, String), Scripted>>,
        pub(crate) calls: Mutex<Vec<ApiRequest>>,
    }

    impl RecordingClient {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn on_get(self, path: &str, status: u16, body: JsonValue) -> Self {
            self.script(ApiMethod::Get, path, Scripted::Respond(status, body.to_string()))
        }

        pub(crate) fn on_put(self, path: &str, status: u16, body: JsonValue) -> Self {
            self.script(ApiMethod::Put, path, Scripted::Respond(status, body.to_string()))
        }

        pub(crate) fn script(self, method: ApiMethod, path: &str, scripted: Scripted) -> Self {
            self.routes
                .lock()
                .unwrap()
                .insert((method, path.to_string()), scripted);
            self
        }

        pub(crate) fn calls(&self) -> Vec<ApiRequest> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn calls_to(&self, path: &str) -> Vec<ApiRequest> {
            self.calls()
                .into_iter()
                .filter(|call| call.path == path)
                .collect()
        }
    }

    #[async_trait]
    impl ApiClient for RecordingClient {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
            self.calls.lock().unwrap().push(request.clone());
            let scripted = self
                .routes
                .lock()
                .unwrap()
                .get(&(request.method, request.path.clone()))
                .cloned();
            let mut scripted = match scripted {
                Some(scripted) => scripted,
                None => return Err(AppError::Network(format!("no route for {}", request.describe()))),
            };
            loop {
                match scripted {
                    Scripted::Respond(status, body) => {
                        return Ok(ApiResponse {
                            status,
                            body,
                            elapsed_ms: 1,
                        })
                    }
                    Scripted::Fail(err) => return Err(err),
                    Scripted::Delay(delay, next) => {
                        tokio::time::sleep(delay).await;
                        scripted = *next;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_success_becomes_http_failure_with_detail() {
        let request = ApiRequest::get("/api/test-cases/99");
        let response = ApiResponse {
            status: 404,
            body: json!({"detail": "Test case not found"}).to_string(),
            elapsed_ms: 3,
        };
        let err = response.ensure_success(&request).unwrap_err();
        assert_eq!(err.http_status(), Some(404));
        assert!(err.to_string().contains("Test case not found"));
    }

    #[test]
    fn invalid_body_is_decode_failure() {
        let response = ApiResponse {
            status: 200,
            body: "<html>oops</html>".to_string(),
            elapsed_ms: 3,
        };
        let err = response.json::<JsonValue>().unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn identical_requests_compare_equal() {
        let a = ApiRequest::get("/api/test-cases")
            .with_query(vec![("status".to_string(), "not_run".to_string())]);
        let b = ApiRequest::get("/api/test-cases")
            .with_query(vec![("status".to_string(), "not_run".to_string())]);
        assert_eq!(a, b);
        assert_eq!(a.describe(), "GET /api/test-cases");
    }
}
