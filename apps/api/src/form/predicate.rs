//! The completion predicate — the single satisfaction rule shared by the
//! validator and the completion meter. Both MUST call these functions; a
//! second copy of this logic is how the two drift apart.

use crate::form::store::{FieldValue, FormState};
use crate::schema::{FieldDef, FieldKind, ListKind};

/// True when a field counts as filled for validation and completion.
///
/// - Scalars: non-empty after trimming.
/// - Generic lists: at least one non-empty element.
/// - Experience lists: at least one entry with both company and position.
/// - Education lists: at least one entry with both degree and school.
/// - Achievement lists: at least one entry with non-empty content.
pub fn field_satisfied(field: &FieldDef, state: &FormState) -> bool {
    let Some(value) = state.value(&field.id) else {
        return false;
    };
    match (field.kind, value) {
        (FieldKind::Text | FieldKind::TextArea | FieldKind::Date, FieldValue::Scalar { value }) => {
            !value.trim().is_empty()
        }
        (FieldKind::List { of: ListKind::Generic }, FieldValue::Items { items }) => {
            items.iter().any(|i| !i.trim().is_empty())
        }
        (FieldKind::List { of: ListKind::Experience }, FieldValue::Experiences { entries }) => {
            entries
                .iter()
                .any(|e| !e.company.trim().is_empty() && !e.position.trim().is_empty())
        }
        (FieldKind::List { of: ListKind::Education }, FieldValue::Educations { entries }) => {
            entries
                .iter()
                .any(|e| !e.degree.trim().is_empty() && !e.school.trim().is_empty())
        }
        (FieldKind::List { of: ListKind::Achievement }, FieldValue::Achievements { entries }) => {
            entries.iter().any(|e| !e.content.trim().is_empty())
        }
        // Schema kind and stored variant disagree — treat as unfilled.
        _ => false,
    }
}

/// A missing identity sub-field of one entry, for validator messages.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingSubField {
    /// Zero-based entry index.
    pub index: usize,
    /// Human-readable sub-field name.
    pub name: &'static str,
}

/// Scans an unsatisfied record list in ascending index order and names up to
/// `cap` missing identity sub-fields (lowest index wins ties).
pub fn missing_identity_fields(
    field: &FieldDef,
    state: &FormState,
    cap: usize,
) -> Vec<MissingSubField> {
    let mut missing = Vec::new();
    let Some(value) = state.value(&field.id) else {
        return missing;
    };

    match value {
        FieldValue::Experiences { entries } => {
            for (index, entry) in entries.iter().enumerate() {
                if entry.company.trim().is_empty() {
                    missing.push(MissingSubField { index, name: "company" });
                }
                if entry.position.trim().is_empty() {
                    missing.push(MissingSubField { index, name: "position" });
                }
                if missing.len() >= cap {
                    break;
                }
            }
        }
        FieldValue::Educations { entries } => {
            for (index, entry) in entries.iter().enumerate() {
                if entry.degree.trim().is_empty() {
                    missing.push(MissingSubField { index, name: "degree" });
                }
                if entry.school.trim().is_empty() {
                    missing.push(MissingSubField { index, name: "school" });
                }
                if missing.len() >= cap {
                    break;
                }
            }
        }
        _ => {}
    }

    missing.truncate(cap);
    missing
}
