//! Project API client.
//!
//! [`ProjectApi`] is the seam the aggregation store is generic over;
//! [`HttpProjectApi`] is the reqwest-backed implementation that talks to the
//! hosted backend.

use crate::activity::{ActivityLogEntry, HistoryResponse};
use crate::config::ApiConfig;
use crate::credentials::Credentials;
use crate::error::{Result, SdlcaiError};
use crate::project::{NewProject, Project};
use crate::types::{ProjectId, ToolId};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

// ---------------------------------------------------------------------------
// ProjectApi
// ---------------------------------------------------------------------------

pub trait ProjectApi: Send + Sync {
    /// `GET /projects/`
    fn list_projects(&self) -> impl Future<Output = Result<Vec<Project>>> + Send;

    /// `POST /projects/`
    fn create_project(&self, new: &NewProject) -> impl Future<Output = Result<Project>> + Send;

    /// `DELETE /projects/{id}`. The response body is ignored.
    fn delete_project(&self, id: &ProjectId) -> impl Future<Output = Result<()>> + Send;

    /// `GET /projects/{id}/history`, normalized into log entries owned by
    /// `project`.
    fn project_history(
        &self,
        project: &Project,
    ) -> impl Future<Output = Result<Vec<ActivityLogEntry>>> + Send;
}

// ---------------------------------------------------------------------------
// HttpProjectApi
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProjectListResponse {
    #[serde(default)]
    projects: Vec<Project>,
}

const HTML_ERROR: &str = "server error (backend returned HTML)";

#[derive(Debug, Clone)]
pub struct HttpProjectApi {
    base: Url,
    client: reqwest::Client,
    credentials: Credentials,
}

impl HttpProjectApi {
    pub fn new(config: &ApiConfig, credentials: Credentials) -> Result<Self> {
        let base = Url::parse(config.base_url.trim()).map_err(|e| {
            SdlcaiError::Validation(format!("invalid api.base_url '{}': {e}", config.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(SdlcaiError::Validation(format!(
                "invalid api.base_url '{}': not a base URL",
                config.base_url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| SdlcaiError::Transport {
                endpoint: "client setup".into(),
                source,
            })?;
        Ok(Self {
            base,
            client,
            credentials,
        })
    }

    /// Invoke one of the nine tool endpoints and return its JSON result.
    pub async fn run_tool(&self, tool: ToolId, payload: &Value) -> Result<Value> {
        let endpoint = format!("POST {}", tool.endpoint());
        let req = self
            .request(Method::POST, &[tool.as_str(), ""])
            .json(payload);
        let body = self.send(req, &endpoint).await?;
        decode(&endpoint, &body)
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, self.url(segments))
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &self.credentials.token {
            req = req.bearer_auth(token);
        }
        if let Some(key) = &self.credentials.api_key {
            req = req.header("x-api-key", key);
        }
        req
    }

    /// Send and return the body of a 2xx response; anything else is an error.
    async fn send(&self, req: RequestBuilder, endpoint: &str) -> Result<String> {
        debug!(endpoint, "sending request");
        let resp = req.send().await.map_err(|source| SdlcaiError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = resp.text().await.map_err(|source| SdlcaiError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;
        debug!(endpoint, status = status.as_u16(), bytes = body.len(), "response");

        if !status.is_success() {
            return Err(SdlcaiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message: error_message(&content_type, &body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
            });
        }
        Ok(body)
    }
}

impl ProjectApi for HttpProjectApi {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let endpoint = "GET /projects/";
        let body = self
            .send(self.request(Method::GET, &["projects", ""]), endpoint)
            .await?;
        let list: ProjectListResponse = decode(endpoint, &body)?;
        Ok(list.projects)
    }

    async fn create_project(&self, new: &NewProject) -> Result<Project> {
        let endpoint = "POST /projects/";
        let req = self.request(Method::POST, &["projects", ""]).json(new);
        let body = self.send(req, endpoint).await?;
        decode(endpoint, &body)
    }

    async fn delete_project(&self, id: &ProjectId) -> Result<()> {
        let id = id.to_string();
        let endpoint = format!("DELETE /projects/{id}");
        self.send(self.request(Method::DELETE, &["projects", &id]), &endpoint)
            .await?;
        Ok(())
    }

    async fn project_history(&self, project: &Project) -> Result<Vec<ActivityLogEntry>> {
        let id = project.id.to_string();
        let endpoint = format!("GET /projects/{id}/history");
        let body = self
            .send(
                self.request(Method::GET, &["projects", &id, "history"]),
                &endpoint,
            )
            .await?;
        let history: HistoryResponse = decode(&endpoint, &body)?;
        Ok(history.into_entries(project))
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| SdlcaiError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Pull a human-readable message out of an error response body.
fn error_message(content_type: &str, body: &str) -> Option<String> {
    let trimmed = body.trim();
    if content_type.contains("text/html") || trimmed.starts_with('<') {
        return Some(HTML_ERROR.to_string());
    }
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
        for key in ["detail", "error", "message"] {
            match json.get(key) {
                Some(Value::String(s)) => return Some(s.clone()),
                Some(Value::Null) | None => {}
                Some(other) => return Some(other.to_string()),
            }
        }
    }
    Some(trimmed.chars().take(200).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
