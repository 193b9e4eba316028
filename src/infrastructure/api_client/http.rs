use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{ApiClient, ApiMethod, ApiRequest, ApiResponse};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::AppConfig;

/// `ApiClient` over reqwest. Every request is bound by the configured timeout and
/// nothing is retried here.
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.base_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn transport_error(request: &ApiRequest, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::TimedOut(request.describe())
    } else {
        AppError::Network(format!("{} could not complete: {}", request.describe(), err))
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request.path);
        let mut builder = match request.method {
            ApiMethod::Get => self.client.get(&url),
            ApiMethod::Put => self.client.put(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            let err = transport_error(request, e);
            warn!(request = %request.describe(), error = %err, "Backend request failed");
            err
        })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(request, e))?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        debug!(
            request = %request.describe(),
            status,
            elapsed_ms,
            "Backend request completed"
        );
        Ok(ApiResponse {
            status,
            body,
            elapsed_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::stub_backend::{spawn_stub, StubResponse, StubRoute};
    use serde_json::json;

    #[actix_web::test]
    async fn maps_slow_backend_to_timeout() {
        let stub = spawn_stub(vec![StubRoute::get(
            "/api/defects",
            StubResponse::json(200, json!([])).with_delay(500),
        )])
        .await
        .unwrap();
        let client = HttpApiClient::new(&stub.url, Duration::from_millis(100)).unwrap();

        let err = client
            .send(&ApiRequest::get("/api/defects"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "timeout");
        assert!(err.to_string().contains("timed out"));
        stub.stop().await;
    }

    #[actix_web::test]
    async fn returns_non_success_responses_untouched() {
        let stub = spawn_stub(vec![StubRoute::get(
            "/api/test-runs",
            StubResponse::json(503, json!({"detail": "maintenance"})),
        )])
        .await
        .unwrap();
        let client = HttpApiClient::new(&stub.url, Duration::from_secs(2)).unwrap();

        let request = ApiRequest::get("/api/test-runs");
        let response = client.send(&request).await.unwrap();
        assert_eq!(response.status, 503);
        let err = response.ensure_success(&request).unwrap_err();
        assert_eq!(err.http_status(), Some(503));
        stub.stop().await;
    }

    #[actix_web::test]
    async fn connection_refused_is_network_failure() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client =
            HttpApiClient::new(&format!("http://127.0.0.1:{}", port), Duration::from_secs(2))
                .unwrap();
        let err = client
            .send(&ApiRequest::get("/api/health"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "network");
    }

    #[test]
    fn joins_paths_onto_base_url() {
        let client = HttpApiClient::new("http://localhost:3001/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001");
        assert_eq!(
            client.url_for("/api/schema"),
            "http://localhost:3001/api/schema"
        );
        assert_eq!(client.url_for("api/health"), "http://localhost:3001/api/health");
    }
}
