//! Axum route handlers for templates and field-level form mutations.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::form::completeness::{completion, CompletionReport};
use crate::form::entries::{add_entry, remove_entry, set_entry_attr, set_items, set_scalar};
use crate::form::validation::{validate, ValidationReport};
use crate::preview::{render_preview, PreviewDocument};
use crate::schema::{templates, TemplateId, TemplateSchema};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetFieldRequest {
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub struct SetEntryAttrRequest {
    pub attr: String,
    pub value: String,
}

/// Light response for every field write: the meter updates continuously,
/// so each mutation hands back the recomputed completion.
#[derive(Debug, Serialize)]
pub struct FieldWriteResponse {
    pub completion: CompletionReport,
}

#[derive(Debug, Serialize)]
pub struct AddEntryResponse {
    pub index: usize,
    pub completion: CompletionReport,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub report: ValidationReport,
    pub completion: CompletionReport,
}

// ────────────────────────────────────────────────────────────────────────────
// Template handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/templates
pub async fn handle_list_templates() -> Json<Vec<TemplateSchema>> {
    Json(templates::all().to_vec())
}

/// GET /api/v1/templates/:id
pub async fn handle_get_template(
    Path(id): Path<String>,
) -> Result<Json<TemplateSchema>, AppError> {
    let template_id = TemplateId::parse(&id)
        .ok_or_else(|| AppError::NotFound(format!("Template '{id}' not found")))?;
    Ok(Json(templates::builtin(template_id).clone()))
}

// ────────────────────────────────────────────────────────────────────────────
// Field mutation handlers
// ────────────────────────────────────────────────────────────────────────────

/// PATCH /api/v1/sessions/:id/fields/:field_id
///
/// Writes a scalar (string body) or a generic list (array-of-strings body).
/// Clears only this field's validation error; no batch re-validation runs.
pub async fn handle_set_field(
    State(state): State<AppState>,
    Path((session_id, field_id)): Path<(Uuid, String)>,
    Json(request): Json<SetFieldRequest>,
) -> Result<Json<FieldWriteResponse>, AppError> {
    state
        .sessions
        .with_mut(session_id, |session| {
            match request.value {
                Value::String(s) => set_scalar(&mut session.state, &field_id, s)?,
                Value::Array(raw) => {
                    let mut items = Vec::with_capacity(raw.len());
                    for v in raw {
                        match v {
                            Value::String(s) => items.push(s),
                            _ => {
                                return Err(AppError::Validation(
                                    "List values must be strings".to_string(),
                                ))
                            }
                        }
                    }
                    set_items(&mut session.state, &field_id, items)?;
                }
                _ => {
                    return Err(AppError::Validation(
                        "Field value must be a string or an array of strings".to_string(),
                    ))
                }
            }
            session.errors.remove(&field_id);
            session.touch();
            Ok(Json(FieldWriteResponse {
                completion: completion(session.schema(), &session.state),
            }))
        })
        .await
}

/// POST /api/v1/sessions/:id/fields/:field_id/entries
pub async fn handle_add_entry(
    State(state): State<AppState>,
    Path((session_id, field_id)): Path<(Uuid, String)>,
) -> Result<Json<AddEntryResponse>, AppError> {
    state
        .sessions
        .with_mut(session_id, |session| {
            let index = add_entry(&mut session.state, &field_id)?;
            session.errors.remove(&field_id);
            session.touch();
            Ok(Json(AddEntryResponse {
                index,
                completion: completion(session.schema(), &session.state),
            }))
        })
        .await
}

/// PATCH /api/v1/sessions/:id/fields/:field_id/entries/:index
pub async fn handle_set_entry_attr(
    State(state): State<AppState>,
    Path((session_id, field_id, index)): Path<(Uuid, String, usize)>,
    Json(request): Json<SetEntryAttrRequest>,
) -> Result<Json<FieldWriteResponse>, AppError> {
    state
        .sessions
        .with_mut(session_id, |session| {
            set_entry_attr(
                &mut session.state,
                &field_id,
                index,
                &request.attr,
                request.value,
            )?;
            session.errors.remove(&field_id);
            session.touch();
            Ok(Json(FieldWriteResponse {
                completion: completion(session.schema(), &session.state),
            }))
        })
        .await
}

/// DELETE /api/v1/sessions/:id/fields/:field_id/entries/:index
pub async fn handle_remove_entry(
    State(state): State<AppState>,
    Path((session_id, field_id, index)): Path<(Uuid, String, usize)>,
) -> Result<Json<FieldWriteResponse>, AppError> {
    state
        .sessions
        .with_mut(session_id, |session| {
            remove_entry(&mut session.state, &field_id, index)?;
            session.errors.remove(&field_id);
            session.touch();
            Ok(Json(FieldWriteResponse {
                completion: completion(session.schema(), &session.state),
            }))
        })
        .await
}

// ────────────────────────────────────────────────────────────────────────────
// Validation and preview
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/validate
///
/// Batch validation: recomputes the whole error map and stores it on the
/// session.
pub async fn handle_validate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ValidateResponse>, AppError> {
    state
        .sessions
        .with_mut(session_id, |session| {
            let report = validate(session.schema(), &session.state);
            session.errors = report.errors.clone();
            session.touch();
            Ok(Json(ValidateResponse {
                valid: report.is_valid(),
                completion: completion(session.schema(), &session.state),
                report,
            }))
        })
        .await
}

/// GET /api/v1/sessions/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<PreviewDocument>, AppError> {
    let session = state.sessions.get(session_id).await?;
    Ok(Json(render_preview(session.schema(), &session.state)))
}
