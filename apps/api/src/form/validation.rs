//! Batch validation of a form state against its template schema.
//!
//! Validation is wholesale: every pass recomputes the full error map from
//! `(schema, state)` with no incremental diffing. Clearing a single field's
//! error on edit is the session's job, not the validator's.
#![allow(dead_code)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::form::predicate::{field_satisfied, missing_identity_fields, MissingSubField};
use crate::form::store::{FieldValue, FormState};
use crate::schema::{FieldDef, FieldKind, ListKind, TemplateSchema};

/// How many missing sub-fields a record-list error message may name.
const MAX_NAMED_SUB_FIELDS: usize = 2;

/// Field-id-keyed error map. `BTreeMap` keeps serialization deterministic.
pub type ValidationErrorMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: ValidationErrorMap,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error(&self, field_id: &str) -> bool {
        self.errors.contains_key(field_id)
    }
}

/// Validates every required field in schema order and returns the complete
/// error map. No side effects.
pub fn validate(schema: &TemplateSchema, state: &FormState) -> ValidationReport {
    let mut errors = ValidationErrorMap::new();
    for field in schema.required_fields() {
        if !field_satisfied(field, state) {
            errors.insert(field.id.clone(), error_message(field, state));
        }
    }
    ValidationReport { errors }
}

fn error_message(field: &FieldDef, state: &FormState) -> String {
    match field.kind {
        FieldKind::Text | FieldKind::TextArea | FieldKind::Date => {
            format!("{} is required", field.name)
        }
        FieldKind::List { of: ListKind::Generic } => {
            format!("Add at least one entry to {}", field.name)
        }
        FieldKind::List { of: ListKind::Achievement } => {
            format!("Add at least one {} with content", field.name.to_lowercase())
        }
        FieldKind::List { of: ListKind::Experience | ListKind::Education } => {
            record_list_message(field, state)
        }
    }
}

/// For experience/education lists: an empty list reads "no entries"; a
/// non-empty but incomplete list names the first missing identity
/// sub-fields in ascending index order (1-based for humans, at most two).
fn record_list_message(field: &FieldDef, state: &FormState) -> String {
    let is_empty = match state.value(&field.id) {
        Some(FieldValue::Experiences { entries }) => entries.is_empty(),
        Some(FieldValue::Educations { entries }) => entries.is_empty(),
        _ => true,
    };
    if is_empty {
        return format!("Add at least one {} entry", field.name.to_lowercase());
    }

    let missing = missing_identity_fields(field, state, MAX_NAMED_SUB_FIELDS);
    let named: Vec<String> = missing
        .iter()
        .map(|MissingSubField { index, name }| format!("{} (entry {})", name, index + 1))
        .collect();
    format!(
        "{} needs one complete entry — missing: {}",
        field.name,
        named.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::entries::{add_entry, set_entry_attr, set_items, set_scalar};
    use crate::schema::templates::builtin;
    use crate::schema::TemplateId;

    fn make_state() -> (&'static TemplateSchema, FormState) {
        let schema = builtin(TemplateId::Modern);
        (schema, FormState::for_schema(schema))
    }

    fn fill_required_scalars(state: &mut FormState) {
        set_scalar(state, "firstName", "Jane".to_string()).unwrap();
        set_scalar(state, "lastName", "Doe".to_string()).unwrap();
        set_scalar(state, "email", "jane@example.com".to_string()).unwrap();
        set_scalar(state, "summary", "Engineer.".to_string()).unwrap();
    }

    fn fill_everything(state: &mut FormState) {
        fill_required_scalars(state);
        add_entry(state, "experiences").unwrap();
        set_entry_attr(state, "experiences", 0, "company", "Acme".to_string()).unwrap();
        set_entry_attr(state, "experiences", 0, "position", "Dev".to_string()).unwrap();
        add_entry(state, "educations").unwrap();
        set_entry_attr(state, "educations", 0, "degree", "BSc".to_string()).unwrap();
        set_entry_attr(state, "educations", 0, "school", "MIT".to_string()).unwrap();
        set_items(state, "skills", vec!["Rust".to_string()]).unwrap();
    }

    #[test]
    fn test_empty_state_reports_every_required_field() {
        let (schema, state) = make_state();
        let report = validate(schema, &state);
        assert!(!report.is_valid());
        let required: Vec<&str> = schema.required_fields().map(|f| f.id.as_str()).collect();
        assert_eq!(report.errors.len(), required.len());
        for id in required {
            assert!(report.has_error(id), "expected error for '{id}'");
        }
    }

    #[test]
    fn test_complete_state_is_valid() {
        let (schema, mut state) = make_state();
        fill_everything(&mut state);
        let report = validate(schema, &state);
        assert!(report.is_valid(), "unexpected errors: {:?}", report.errors);
    }

    #[test]
    fn test_optional_fields_never_error() {
        let (schema, mut state) = make_state();
        fill_everything(&mut state);
        // phone, location, achievements stay empty on Modern — all optional
        let report = validate(schema, &state);
        assert!(!report.has_error("phone"));
        assert!(!report.has_error("achievements"));
        assert!(report.is_valid());
    }

    #[test]
    fn test_empty_record_list_message_reads_no_entries() {
        let (schema, mut state) = make_state();
        fill_everything(&mut state);
        // empty the experiences list again
        crate::form::entries::remove_entry(&mut state, "experiences", 0).unwrap();
        let report = validate(schema, &state);
        assert_eq!(
            report.errors["experiences"],
            "Add at least one experience entry"
        );
    }

    #[test]
    fn test_incomplete_entry_message_names_first_two_missing_sub_fields() {
        let (schema, mut state) = make_state();
        add_entry(&mut state, "experiences").unwrap();
        add_entry(&mut state, "experiences").unwrap();
        set_entry_attr(&mut state, "experiences", 0, "company", "Acme".to_string()).unwrap();

        let report = validate(schema, &state);
        let message = &report.errors["experiences"];
        // lowest indices win: position (entry 1), then company (entry 2)
        assert!(
            message.contains("position (entry 1)") && message.contains("company (entry 2)"),
            "got: {message}"
        );
    }

    #[test]
    fn test_education_message_names_school() {
        let (schema, mut state) = make_state();
        add_entry(&mut state, "educations").unwrap();
        set_entry_attr(&mut state, "educations", 0, "degree", "BSc".to_string()).unwrap();
        let report = validate(schema, &state);
        assert!(
            report.errors["educations"].contains("school (entry 1)"),
            "got: {}",
            report.errors["educations"]
        );
    }

    #[test]
    fn test_creative_requires_achievements() {
        let schema = builtin(TemplateId::Creative);
        let state = FormState::for_schema(schema);
        let report = validate(schema, &state);
        assert!(report.has_error("achievements"));
    }

    #[test]
    fn test_whitespace_scalar_still_errors() {
        let (schema, mut state) = make_state();
        set_scalar(&mut state, "email", "  ".to_string()).unwrap();
        let report = validate(schema, &state);
        assert_eq!(report.errors["email"], "Email is required");
    }
}
