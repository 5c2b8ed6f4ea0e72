//! Form sessions and the save state machine.
//!
//! A session owns one `FormState` plus the bookkeeping around it: the last
//! validation error map, Draft/Completed status, the save-in-flight flag and
//! the full-preview gate. Sessions live in process memory — durable storage
//! belongs to the external backend, which receives the whole flat state on
//! save.
//!
//! Save flow: `idle -> validating -> (invalid: idle-with-errors) |
//! (valid: confirming -> saving -> success|error -> idle)`. The network call
//! happens outside the store lock; `begin_save` / `finish_save` bracket it
//! and enforce single-flight.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::form::completeness::completion;
use crate::form::store::{FieldValue, FormState};
use crate::form::validation::{validate, ValidationErrorMap};
use crate::schema::templates::builtin;
use crate::schema::{TemplateId, TemplateSchema};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Draft,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    Idle,
    /// Validation passed; awaiting explicit confirmation.
    Confirming,
    /// A persist call is in flight. A second save is rejected until it
    /// resolves.
    Saving,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSession {
    pub id: Uuid,
    pub status: SessionStatus,
    pub save_state: SaveState,
    pub state: FormState,
    /// Last batch validation result. Cleared per field on edit, wholesale on
    /// a passing validation.
    pub errors: ValidationErrorMap,
    /// Unlocked by the first successful save.
    pub full_preview_unlocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormSession {
    pub fn new(schema: &TemplateSchema) -> FormSession {
        let now = Utc::now();
        FormSession {
            id: Uuid::new_v4(),
            status: SessionStatus::Draft,
            save_state: SaveState::Idle,
            state: FormState::for_schema(schema),
            errors: ValidationErrorMap::new(),
            full_preview_unlocked: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn schema(&self) -> &'static TemplateSchema {
        builtin(self.state.template_id)
    }

    /// Discards the current state and re-seeds for a new template. Errors,
    /// status and the preview gate reset with it.
    pub fn switch_template(&mut self, id: TemplateId) {
        self.state = FormState::for_schema(builtin(id));
        self.errors.clear();
        self.status = SessionStatus::Draft;
        self.save_state = SaveState::Idle;
        self.full_preview_unlocked = false;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// What a confirmed save will persist, shown to the user before they commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveSummary {
    pub experience_count: usize,
    pub education_count: usize,
    pub has_summary: bool,
    pub has_skills: bool,
}

impl SaveSummary {
    /// Read-only derivation from the form state: counts of non-blank
    /// entries plus presence flags.
    pub fn from_state(state: &FormState) -> SaveSummary {
        let experience_count = match state.value("experiences") {
            Some(FieldValue::Experiences { entries }) => {
                entries.iter().filter(|e| !e.is_blank()).count()
            }
            _ => 0,
        };
        let education_count = match state.value("educations") {
            Some(FieldValue::Educations { entries }) => {
                entries.iter().filter(|e| !e.is_blank()).count()
            }
            _ => 0,
        };
        let has_summary = state
            .scalar("summary")
            .is_some_and(|s| !s.trim().is_empty());
        let has_skills = state
            .items("skills")
            .is_some_and(|items| items.iter().any(|i| !i.trim().is_empty()));

        SaveSummary {
            experience_count,
            education_count,
            has_summary,
            has_skills,
        }
    }
}

/// Outcome of `begin_save`: either the caller still has to confirm, or the
/// persist payload is ready and the session is marked saving.
#[derive(Debug)]
pub enum BeginSave {
    NeedsConfirmation(SaveSummary),
    Proceed {
        template_id: TemplateId,
        payload: Map<String, Value>,
    },
}

/// In-memory session store shared across handlers.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, FormSession>>>,
}

impl SessionStore {
    pub async fn insert(&self, session: FormSession) {
        self.inner.write().await.insert(session.id, session);
    }

    /// Snapshot of a session (cloned out of the lock).
    pub async fn get(&self, id: Uuid) -> Result<FormSession, AppError> {
        self.inner
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    /// Runs a closure against a session under the write lock.
    pub async fn with_mut<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut FormSession) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.inner.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        f(session)
    }

    /// First half of the save flow, entirely under the write lock:
    /// validate, then either request confirmation or mark the session
    /// saving and hand back the flat persist payload.
    pub async fn begin_save(&self, id: Uuid, confirmed: bool) -> Result<BeginSave, AppError> {
        self.with_mut(id, |session| {
            if session.save_state == SaveState::Saving {
                return Err(AppError::Conflict(
                    "A save is already in progress for this session".to_string(),
                ));
            }

            let report = validate(session.schema(), &session.state);
            if !report.is_valid() {
                session.errors = report.errors.clone();
                session.save_state = SaveState::Idle;
                return Err(AppError::ValidationFailed {
                    errors: report.errors,
                });
            }
            session.errors.clear();

            if !confirmed {
                session.save_state = SaveState::Confirming;
                return Ok(BeginSave::NeedsConfirmation(SaveSummary::from_state(
                    &session.state,
                )));
            }

            session.save_state = SaveState::Saving;
            Ok(BeginSave::Proceed {
                template_id: session.state.template_id,
                payload: session.state.to_flat(session.schema()),
            })
        })
        .await
    }

    /// Second half of the save flow: always clears the in-flight flag; a
    /// success flips the session to Completed and unlocks the full preview.
    pub async fn finish_save(&self, id: Uuid, success: bool) -> Result<(), AppError> {
        self.with_mut(id, |session| {
            session.save_state = SaveState::Idle;
            if success {
                session.status = SessionStatus::Completed;
                session.full_preview_unlocked = true;
            }
            session.touch();
            Ok(())
        })
        .await
    }
}

/// Wire snapshot of a session, including derived completion.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub template_id: TemplateId,
    pub status: SessionStatus,
    pub save_state: SaveState,
    pub completion: crate::form::completeness::CompletionReport,
    pub errors: ValidationErrorMap,
    pub full_preview_unlocked: bool,
    pub state: FormState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionView {
    pub fn of(session: &FormSession) -> SessionView {
        SessionView {
            id: session.id,
            template_id: session.state.template_id,
            status: session.status,
            save_state: session.save_state,
            completion: completion(session.schema(), &session.state),
            errors: session.errors.clone(),
            full_preview_unlocked: session.full_preview_unlocked,
            state: session.state.clone(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}
