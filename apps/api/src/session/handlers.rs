//! Axum route handlers for the session lifecycle: create, snapshot,
//! template switch, the save flow, export, and the AI proxies.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::backend::{ExportFormat, GenerateContentRequest, Suggestion};
use crate::errors::AppError;
use crate::form::store::FormState;
use crate::schema::{templates, TemplateId};
use crate::session::{BeginSave, FormSession, SaveSummary, SessionStatus, SessionView};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub template_id: TemplateId,
    /// Optional seed data in the flat key scheme (`firstName`, `company_0`, ...).
    pub initial_data: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct SwitchTemplateRequest {
    pub template_id: TemplateId,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveResponse {
    /// Validation passed; nothing persisted yet. Confirm to proceed.
    NeedsConfirmation { summary: SaveSummary },
    Saved { session: SessionView },
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub format: ExportFormat,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// Field ids overwritten by the generated content.
    pub touched_fields: Vec<String>,
    pub session: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let schema = templates::builtin(request.template_id);
    let mut session = FormSession::new(schema);
    if let Some(initial) = &request.initial_data {
        session.state = FormState::from_flat(schema, initial);
    }

    let view = SessionView::of(&session);
    info!(session_id = %session.id, template = schema.id.as_str(), "form session created");
    state.sessions.insert(session).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(session_id).await?;
    Ok(Json(SessionView::of(&session)))
}

/// PATCH /api/v1/sessions/:id/template
///
/// Switching templates discards the current state and re-seeds an empty one
/// for the new template.
pub async fn handle_switch_template(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SwitchTemplateRequest>,
) -> Result<Json<SessionView>, AppError> {
    state
        .sessions
        .with_mut(session_id, |session| {
            session.switch_template(request.template_id);
            Ok(Json(SessionView::of(session)))
        })
        .await
}

// ────────────────────────────────────────────────────────────────────────────
// Save flow
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/save
///
/// Unconfirmed requests validate and return a summary of what would be
/// persisted. Confirmed requests validate again, post the whole flat state
/// to the backend, and on success flip the session Draft → Completed.
pub async fn handle_save(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, AppError> {
    let (template_id, payload) = match state.sessions.begin_save(session_id, request.confirmed).await? {
        BeginSave::NeedsConfirmation(summary) => {
            return Ok(Json(SaveResponse::NeedsConfirmation { summary }));
        }
        BeginSave::Proceed {
            template_id,
            payload,
        } => (template_id, payload),
    };

    // Network call happens outside the store lock; the Saving flag keeps a
    // second save out until finish_save clears it.
    let persisted = state
        .backend
        .persist(template_id.as_str(), &payload)
        .await;

    match persisted {
        Ok(()) => {
            state.sessions.finish_save(session_id, true).await?;
            info!(session_id = %session_id, "form state persisted");
            let session = state.sessions.get(session_id).await?;
            Ok(Json(SaveResponse::Saved {
                session: SessionView::of(&session),
            }))
        }
        Err(e) => {
            state.sessions.finish_save(session_id, false).await?;
            Err(AppError::Backend(e))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Export
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/export
///
/// Independent of the save flow; gated only on the form being non-empty.
/// Proxies the backend's binary blob through as a download.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(session_id).await?;
    if session.state.is_empty() {
        return Err(AppError::Validation(
            "Nothing to export yet — fill in some details first".to_string(),
        ));
    }

    let schema = session.schema();
    let flat = session.state.to_flat(schema);
    let blob = state
        .backend
        .export(request.format, schema.id.as_str(), &flat)
        .await?;

    let filename = export_filename(&session.state, request.format);
    Ok((
        [
            (header::CONTENT_TYPE, request.format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        blob,
    ))
}

/// `resume_{first}_{last}.{ext}`, omitting blank name parts.
fn export_filename(state: &FormState, format: ExportFormat) -> String {
    let mut parts = vec!["resume".to_string()];
    for field in ["firstName", "lastName"] {
        if let Some(v) = state.scalar(field) {
            let cleaned = v.trim().replace(char::is_whitespace, "_");
            if !cleaned.is_empty() {
                parts.push(cleaned);
            }
        }
    }
    format!("{}.{}", parts.join("_"), format.extension())
}

// ────────────────────────────────────────────────────────────────────────────
// AI proxies and status
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/ai/generate
///
/// Opaque call to the AI service. Whatever flat keys come back are merged
/// into the form state; merged fields get their stale errors cleared.
pub async fn handle_ai_generate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }

    let session = state.sessions.get(session_id).await?;
    let schema = session.schema();
    let backend_request = GenerateContentRequest {
        template_id: schema.id.as_str().to_string(),
        prompt: request.prompt,
        resume_data: session.state.to_flat(schema),
    };
    let generated = state.backend.generate_content(&backend_request).await?;

    state
        .sessions
        .with_mut(session_id, |session| {
            let touched = session.state.merge_flat(session.schema(), &generated);
            for field_id in &touched {
                session.errors.remove(field_id);
            }
            session.touch();
            Ok(Json(GenerateResponse {
                touched_fields: touched,
                session: SessionView::of(session),
            }))
        })
        .await
}

/// POST /api/v1/sessions/:id/ai/suggest
pub async fn handle_ai_suggest(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<Suggestion>>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let schema = session.schema();
    let flat = session.state.to_flat(schema);
    let suggestions = state
        .backend
        .suggest_improvements(schema.id.as_str(), &flat)
        .await?;
    Ok(Json(suggestions))
}

/// PATCH /api/v1/sessions/:id/status
///
/// Forwards to the backend's status record; mirrors recognized statuses
/// onto the local session.
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<StatusCode, AppError> {
    // 404 before the network call if the session is unknown.
    state.sessions.get(session_id).await?;

    state
        .backend
        .update_status(
            &session_id.to_string(),
            &request.status,
            request.notes.as_deref(),
        )
        .await?;

    let mirrored = match request.status.as_str() {
        "draft" => Some(SessionStatus::Draft),
        "completed" => Some(SessionStatus::Completed),
        _ => None,
    };
    if let Some(status) = mirrored {
        state
            .sessions
            .with_mut(session_id, |session| {
                session.status = status;
                session.touch();
                Ok(())
            })
            .await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::config::Config;
    use crate::form::entries::{add_entry, set_entry_attr, set_items, set_scalar};
    use crate::session::SessionStore;
    use std::sync::Arc;

    fn make_state_with(backend: MockBackend) -> (AppState, Arc<MockBackend>) {
        let mock = Arc::new(backend);
        let state = AppState {
            sessions: SessionStore::default(),
            backend: mock.clone(),
            config: Config {
                backend_endpoint: "http://localhost:9".to_string(),
                backend_api_token: "test-token".to_string(),
                port: 0,
                rust_log: "info".to_string(),
            },
        };
        (state, mock)
    }

    async fn make_complete_session(state: &AppState) -> Uuid {
        let schema = templates::builtin(TemplateId::Modern);
        let mut session = FormSession::new(schema);
        let s = &mut session.state;
        set_scalar(s, "firstName", "Jane".to_string()).unwrap();
        set_scalar(s, "lastName", "Doe".to_string()).unwrap();
        set_scalar(s, "email", "jane@example.com".to_string()).unwrap();
        set_scalar(s, "summary", "Engineer.".to_string()).unwrap();
        add_entry(s, "experiences").unwrap();
        set_entry_attr(s, "experiences", 0, "company", "Acme".to_string()).unwrap();
        set_entry_attr(s, "experiences", 0, "position", "Dev".to_string()).unwrap();
        add_entry(s, "educations").unwrap();
        set_entry_attr(s, "educations", 0, "degree", "BSc".to_string()).unwrap();
        set_entry_attr(s, "educations", 0, "school", "MIT".to_string()).unwrap();
        set_items(s, "skills", vec!["Rust".to_string()]).unwrap();
        let id = session.id;
        state.sessions.insert(session).await;
        id
    }

    #[tokio::test]
    async fn test_save_invalid_never_reaches_backend() {
        let (state, mock) = make_state_with(MockBackend::default());
        let schema = templates::builtin(TemplateId::Modern);
        let session = FormSession::new(schema);
        let id = session.id;
        state.sessions.insert(session).await;

        let result = handle_save(
            State(state.clone()),
            Path(id),
            Json(SaveRequest { confirmed: true }),
        )
        .await;
        assert!(matches!(result, Err(AppError::ValidationFailed { .. })));
        assert_eq!(mock.persist_count(), 0);
    }

    #[tokio::test]
    async fn test_unconfirmed_save_returns_summary() {
        let (state, mock) = make_state_with(MockBackend::default());
        let id = make_complete_session(&state).await;

        let Json(response) = handle_save(
            State(state.clone()),
            Path(id),
            Json(SaveRequest { confirmed: false }),
        )
        .await
        .unwrap();

        match response {
            SaveResponse::NeedsConfirmation { summary } => {
                assert_eq!(summary.experience_count, 1);
            }
            SaveResponse::Saved { .. } => panic!("must not save unconfirmed"),
        }
        assert_eq!(mock.persist_count(), 0);
    }

    #[tokio::test]
    async fn test_confirmed_save_persists_once_and_completes() {
        let (state, mock) = make_state_with(MockBackend::default());
        let id = make_complete_session(&state).await;

        let Json(response) = handle_save(
            State(state.clone()),
            Path(id),
            Json(SaveRequest { confirmed: true }),
        )
        .await
        .unwrap();

        match response {
            SaveResponse::Saved { session } => {
                assert_eq!(session.status, SessionStatus::Completed);
                assert!(session.full_preview_unlocked);
            }
            SaveResponse::NeedsConfirmation { .. } => panic!("expected a save"),
        }

        assert_eq!(mock.persist_count(), 1);
        let calls = mock.persist_calls.lock().unwrap();
        assert_eq!(calls[0].0, "modern");
        assert_eq!(calls[0].1["company_0"], "Acme");
    }

    #[tokio::test]
    async fn test_failed_save_surfaces_error_and_returns_to_draft() {
        let (state, _mock) = make_state_with(MockBackend::failing());
        let id = make_complete_session(&state).await;

        let result = handle_save(
            State(state.clone()),
            Path(id),
            Json(SaveRequest { confirmed: true }),
        )
        .await;
        assert!(matches!(result, Err(AppError::Backend(_))));

        let session = state.sessions.get(id).await.unwrap();
        assert_eq!(session.status, SessionStatus::Draft);
        assert_eq!(session.save_state, crate::session::SaveState::Idle);
    }

    #[tokio::test]
    async fn test_export_empty_form_is_rejected() {
        let (state, _mock) = make_state_with(MockBackend::default());
        let schema = templates::builtin(TemplateId::Modern);
        let session = FormSession::new(schema);
        let id = session.id;
        state.sessions.insert(session).await;

        let result = handle_export(
            State(state),
            Path(id),
            Json(ExportRequest {
                format: ExportFormat::Pdf,
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_ai_generate_merges_and_clears_errors() {
        let mut backend = MockBackend::default();
        backend.generated = serde_json::json!({ "summary": "Seasoned engineer." })
            .as_object()
            .unwrap()
            .clone();
        let (state, _mock) = make_state_with(backend);

        let schema = templates::builtin(TemplateId::Modern);
        let mut session = FormSession::new(schema);
        session
            .errors
            .insert("summary".to_string(), "Summary is required".to_string());
        let id = session.id;
        state.sessions.insert(session).await;

        let Json(response) = handle_ai_generate(
            State(state.clone()),
            Path(id),
            Json(GenerateRequest {
                prompt: "write my summary".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.touched_fields, ["summary"]);
        let session = state.sessions.get(id).await.unwrap();
        assert_eq!(session.state.scalar("summary"), Some("Seasoned engineer."));
        assert!(!session.errors.contains_key("summary"));
    }

    #[test]
    fn test_export_filename_sanitizes_names() {
        let schema = templates::builtin(TemplateId::Modern);
        let mut form = FormState::for_schema(schema);
        set_scalar(&mut form, "firstName", "Mary Jane".to_string()).unwrap();
        set_scalar(&mut form, "lastName", "Watson".to_string()).unwrap();
        assert_eq!(
            export_filename(&form, ExportFormat::Pdf),
            "resume_Mary_Jane_Watson.pdf"
        );
    }

    #[test]
    fn test_export_filename_with_blank_names() {
        let schema = templates::builtin(TemplateId::Modern);
        let form = FormState::for_schema(schema);
        assert_eq!(export_filename(&form, ExportFormat::Docx), "resume.docx");
    }
}
