//! Completion meter — percentage of required fields satisfied.
//!
//! Uses the same predicate as the validator, so for every required field
//! "counts as complete here" and "has no validation error" are the same
//! statement.

use serde::{Deserialize, Serialize};

use crate::form::predicate::field_satisfied;
use crate::form::store::FormState;
use crate::schema::TemplateSchema;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionReport {
    /// `round(completed / total * 100)`; 0 when there are no required fields.
    pub percent: u8,
    pub completed: usize,
    pub total: usize,
}

pub fn completion(schema: &TemplateSchema, state: &FormState) -> CompletionReport {
    let mut completed = 0usize;
    let mut total = 0usize;
    for field in schema.required_fields() {
        total += 1;
        if field_satisfied(field, state) {
            completed += 1;
        }
    }

    let percent = if total == 0 {
        0
    } else {
        (completed as f64 / total as f64 * 100.0).round() as u8
    };

    CompletionReport {
        percent,
        completed,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::entries::{add_entry, set_entry_attr, set_items, set_scalar};
    use crate::form::validation::validate;
    use crate::schema::templates::builtin;
    use crate::schema::{FieldDef, FieldKind, ListKind, SectionDef, TemplateId};

    fn make_state() -> (&'static TemplateSchema, FormState) {
        let schema = builtin(TemplateId::Modern);
        (schema, FormState::for_schema(schema))
    }

    /// Minimal two-field template: required `title` scalar and required
    /// `experiences` list.
    fn make_two_field_schema() -> TemplateSchema {
        TemplateSchema {
            id: TemplateId::Minimal,
            name: "Two fields".to_string(),
            sections: vec![SectionDef {
                id: "main".to_string(),
                name: "Main".to_string(),
                required: true,
                order: 1,
                fields: vec![
                    FieldDef {
                        id: "title".to_string(),
                        name: "Title".to_string(),
                        kind: FieldKind::Text,
                        required: true,
                        placeholder: String::new(),
                    },
                    FieldDef {
                        id: "experiences".to_string(),
                        name: "Experience".to_string(),
                        kind: FieldKind::List {
                            of: ListKind::Experience,
                        },
                        required: true,
                        placeholder: String::new(),
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_no_required_fields_is_zero_percent() {
        let schema = TemplateSchema {
            id: TemplateId::Minimal,
            name: "Optional only".to_string(),
            sections: vec![SectionDef {
                id: "extra".to_string(),
                name: "Extra".to_string(),
                required: false,
                order: 1,
                fields: vec![FieldDef {
                    id: "note".to_string(),
                    name: "Note".to_string(),
                    kind: FieldKind::Text,
                    required: false,
                    placeholder: String::new(),
                }],
            }],
        };
        let state = FormState::for_schema(&schema);
        assert_eq!(
            completion(&schema, &state),
            CompletionReport {
                percent: 0,
                completed: 0,
                total: 0
            }
        );
    }

    #[test]
    fn test_two_field_example_from_zero_to_hundred() {
        let schema = make_two_field_schema();
        let mut state = FormState::for_schema(&schema);

        // {title: "", experiences: []} → 0%, two validation errors
        assert_eq!(completion(&schema, &state).percent, 0);
        assert_eq!(validate(&schema, &state).errors.len(), 2);

        set_scalar(&mut state, "title", "Engineer".to_string()).unwrap();
        add_entry(&mut state, "experiences").unwrap();
        set_entry_attr(&mut state, "experiences", 0, "company", "Acme".to_string()).unwrap();
        set_entry_attr(&mut state, "experiences", 0, "position", "Dev".to_string()).unwrap();

        assert_eq!(completion(&schema, &state).percent, 100);
        assert!(validate(&schema, &state).is_valid());
    }

    #[test]
    fn test_meter_agrees_with_validator_field_by_field() {
        let (schema, mut state) = make_state();
        set_scalar(&mut state, "firstName", "Jane".to_string()).unwrap();
        add_entry(&mut state, "experiences").unwrap();
        set_entry_attr(&mut state, "experiences", 0, "company", "Acme".to_string()).unwrap();
        // deliberately partial: position missing, most scalars empty

        let report = validate(schema, &state);
        for field in schema.required_fields() {
            let satisfied = crate::form::predicate::field_satisfied(field, &state);
            assert_eq!(
                !report.has_error(&field.id),
                satisfied,
                "validator and meter disagree on '{}'",
                field.id
            );
        }
    }

    #[test]
    fn test_percent_is_monotonic_under_filling() {
        let (schema, mut state) = make_state();
        let mut last = completion(schema, &state).percent;

        set_scalar(&mut state, "firstName", "Jane".to_string()).unwrap();
        let p = completion(schema, &state).percent;
        assert!(p >= last);
        last = p;

        set_items(&mut state, "skills", vec!["Rust".to_string()]).unwrap();
        let p = completion(schema, &state).percent;
        assert!(p >= last);
        last = p;

        add_entry(&mut state, "educations").unwrap();
        set_entry_attr(&mut state, "educations", 0, "degree", "BSc".to_string()).unwrap();
        set_entry_attr(&mut state, "educations", 0, "school", "MIT".to_string()).unwrap();
        let p = completion(schema, &state).percent;
        assert!(p >= last);
    }

    #[test]
    fn test_counts_track_required_fields_only() {
        let (schema, state) = make_state();
        let report = completion(schema, &state);
        assert_eq!(report.total, schema.required_fields().count());
        assert_eq!(report.completed, 0);
    }
}
