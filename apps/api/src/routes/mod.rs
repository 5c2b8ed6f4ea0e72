pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::form::handlers as form_handlers;
use crate::session::handlers as session_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Templates
        .route("/api/v1/templates", get(form_handlers::handle_list_templates))
        .route(
            "/api/v1/templates/:id",
            get(form_handlers::handle_get_template),
        )
        // Session lifecycle
        .route(
            "/api/v1/sessions",
            post(session_handlers::handle_create_session),
        )
        .route(
            "/api/v1/sessions/:id",
            get(session_handlers::handle_get_session),
        )
        .route(
            "/api/v1/sessions/:id/template",
            patch(session_handlers::handle_switch_template),
        )
        // Field mutations
        .route(
            "/api/v1/sessions/:id/fields/:field_id",
            patch(form_handlers::handle_set_field),
        )
        .route(
            "/api/v1/sessions/:id/fields/:field_id/entries",
            post(form_handlers::handle_add_entry),
        )
        .route(
            "/api/v1/sessions/:id/fields/:field_id/entries/:index",
            patch(form_handlers::handle_set_entry_attr),
        )
        .route(
            "/api/v1/sessions/:id/fields/:field_id/entries/:index",
            delete(form_handlers::handle_remove_entry),
        )
        // Validation and preview
        .route(
            "/api/v1/sessions/:id/validate",
            post(form_handlers::handle_validate),
        )
        .route(
            "/api/v1/sessions/:id/preview",
            get(form_handlers::handle_preview),
        )
        // Save, export, AI, status
        .route(
            "/api/v1/sessions/:id/save",
            post(session_handlers::handle_save),
        )
        .route(
            "/api/v1/sessions/:id/export",
            post(session_handlers::handle_export),
        )
        .route(
            "/api/v1/sessions/:id/ai/generate",
            post(session_handlers::handle_ai_generate),
        )
        .route(
            "/api/v1/sessions/:id/ai/suggest",
            post(session_handlers::handle_ai_suggest),
        )
        .route(
            "/api/v1/sessions/:id/status",
            patch(session_handlers::handle_update_status),
        )
        .with_state(state)
}
