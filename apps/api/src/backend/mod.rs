//! Resume backend client — the single point of entry for all calls to the
//! external resume service (persist, export, AI content, status updates).
//!
//! ARCHITECTURAL RULE: no other module may talk to the backend directly.
//! Handlers and the save flow depend on the `ResumeBackend` trait, so tests
//! run against an in-memory double instead of the network.
//!
//! Failure policy: one attempt, no retry, no backoff. Callers surface a
//! transient error and stay interactive. A flat request timeout is set at
//! construction so a dead backend cannot hang a handler.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Backend returned an empty body")]
    EmptyBody,
}

/// Document formats the export endpoints produce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    fn endpoint_suffix(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "export-pdf-temp",
            ExportFormat::Docx => "export-docx-temp",
        }
    }
}

/// One AI improvement suggestion, passed through opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub field: String,
    pub suggestion: String,
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub template_id: String,
    pub prompt: String,
    /// Current flat state, sent for context.
    pub resume_data: Map<String, Value>,
}

/// Everything the engine needs from the external resume service.
#[async_trait]
pub trait ResumeBackend: Send + Sync {
    /// Persists the whole flat form state. Opaque acknowledgment.
    async fn persist(
        &self,
        template_id: &str,
        resume_data: &Map<String, Value>,
    ) -> Result<(), BackendError>;

    /// Renders the flat form state into a downloadable document.
    async fn export(
        &self,
        format: ExportFormat,
        template_id: &str,
        resume_data: &Map<String, Value>,
    ) -> Result<Bytes, BackendError>;

    /// Asks the AI service for generated content; returns partial flat
    /// resume data to merge into the form.
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<Map<String, Value>, BackendError>;

    /// Asks the AI service for improvement suggestions on the current state.
    async fn suggest_improvements(
        &self,
        template_id: &str,
        resume_data: &Map<String, Value>,
    ) -> Result<Vec<Suggestion>, BackendError>;

    /// Updates the backend-side status record for a resume.
    async fn update_status(
        &self,
        resume_id: &str,
        status: &str,
        notes: Option<&str>,
    ) -> Result<(), BackendError>;
}

/// HTTP implementation against `{endpoint}/ai-resume/...`.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    endpoint: String,
    api_token: String,
}

impl HttpBackend {
    pub fn new(endpoint: String, api_token: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with static config");
        HttpBackend {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/ai-resume/{path}", self.endpoint)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<reqwest::Response, BackendError> {
        let url = self.url(path);
        debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await?;
        error_for_status(response).await
    }
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(BackendError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ResumeBackend for HttpBackend {
    async fn persist(
        &self,
        template_id: &str,
        resume_data: &Map<String, Value>,
    ) -> Result<(), BackendError> {
        let body = json!({ "template_id": template_id, "resume_data": resume_data });
        self.post_json("save-temp", &body).await?;
        Ok(())
    }

    async fn export(
        &self,
        format: ExportFormat,
        template_id: &str,
        resume_data: &Map<String, Value>,
    ) -> Result<Bytes, BackendError> {
        let body = json!({ "template_id": template_id, "resume_data": resume_data });
        let response = self.post_json(format.endpoint_suffix(), &body).await?;
        let blob = response.bytes().await?;
        if blob.is_empty() {
            return Err(BackendError::EmptyBody);
        }
        Ok(blob)
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<Map<String, Value>, BackendError> {
        let body = serde_json::to_value(request)?;
        let response = self.post_json("generate-content", &body).await?;
        let value: Value = response.json().await?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(BackendError::EmptyBody),
        }
    }

    async fn suggest_improvements(
        &self,
        template_id: &str,
        resume_data: &Map<String, Value>,
    ) -> Result<Vec<Suggestion>, BackendError> {
        let body = json!({ "template_id": template_id, "resume_data": resume_data });
        let response = self.post_json("suggest-improvements", &body).await?;
        let suggestions: Vec<Suggestion> = response.json().await?;
        Ok(suggestions)
    }

    async fn update_status(
        &self,
        resume_id: &str,
        status: &str,
        notes: Option<&str>,
    ) -> Result<(), BackendError> {
        let url = self.url(&format!("update-status/{resume_id}"));
        debug!("PATCH {url}");
        let body = json!({ "status": status, "notes": notes });
        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;
        error_for_status(response).await?;
        Ok(())
    }
}

/// In-memory backend double for tests: records calls, returns canned data,
/// optionally fails every call.
#[cfg(test)]
#[derive(Default)]
pub struct MockBackend {
    pub fail: bool,
    pub persist_calls: std::sync::Mutex<Vec<(String, Map<String, Value>)>>,
    pub generated: Map<String, Value>,
    pub suggestions: Vec<Suggestion>,
}

#[cfg(test)]
impl MockBackend {
    pub fn failing() -> Self {
        MockBackend {
            fail: true,
            ..Default::default()
        }
    }

    pub fn persist_count(&self) -> usize {
        self.persist_calls.lock().unwrap().len()
    }

    fn maybe_fail(&self) -> Result<(), BackendError> {
        if self.fail {
            Err(BackendError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[async_trait]
impl ResumeBackend for MockBackend {
    async fn persist(
        &self,
        template_id: &str,
        resume_data: &Map<String, Value>,
    ) -> Result<(), BackendError> {
        self.maybe_fail()?;
        self.persist_calls
            .lock()
            .unwrap()
            .push((template_id.to_string(), resume_data.clone()));
        Ok(())
    }

    async fn export(
        &self,
        _format: ExportFormat,
        _template_id: &str,
        _resume_data: &Map<String, Value>,
    ) -> Result<Bytes, BackendError> {
        self.maybe_fail()?;
        Ok(Bytes::from_static(b"%PDF-1.4 mock"))
    }

    async fn generate_content(
        &self,
        _request: &GenerateContentRequest,
    ) -> Result<Map<String, Value>, BackendError> {
        self.maybe_fail()?;
        Ok(self.generated.clone())
    }

    async fn suggest_improvements(
        &self,
        _template_id: &str,
        _resume_data: &Map<String, Value>,
    ) -> Result<Vec<Suggestion>, BackendError> {
        self.maybe_fail()?;
        Ok(self.suggestions.clone())
    }

    async fn update_status(
        &self,
        _resume_id: &str,
        _status: &str,
        _notes: Option<&str>,
    ) -> Result<(), BackendError> {
        self.maybe_fail()
    }
}
