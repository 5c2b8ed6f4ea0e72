//! Entry mutation engine for repeatable fields.
//!
//! All writes to a `FormState` go through these functions. Record lists keep
//! stable per-entry ids; removal is order-preserving, so the visible index
//! of every surviving entry stays dense 0..N-1 without any shadow-key
//! renumbering step.
//!
//! The engine permits a list to reach length zero — a required empty list is
//! a validation outcome ("no entries"), not an engine error. Keep-at-least-
//! one-entry policies belong to the caller.

use thiserror::Error;

use crate::form::store::{
    AchievementEntry, EducationEntry, ExperienceEntry, FieldValue, FormState,
};
#[cfg(test)]
use crate::schema::TemplateSchema;

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Field '{field}' does not hold {expected}")]
    WrongKind { field: String, expected: &'static str },

    #[error("Index {index} out of range for '{field}' (length {len})")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },

    #[error("Unknown attribute '{attr}' for field '{field}'")]
    UnknownAttr { field: String, attr: String },
}

/// Sets a scalar field (text, textarea, date).
pub fn set_scalar(state: &mut FormState, field_id: &str, new_value: String) -> Result<(), FormError> {
    match state.value_mut(field_id) {
        Some(FieldValue::Scalar { value }) => {
            *value = new_value;
            Ok(())
        }
        Some(_) => Err(FormError::WrongKind {
            field: field_id.to_string(),
            expected: "a scalar value",
        }),
        None => Err(FormError::UnknownField(field_id.to_string())),
    }
}

/// Replaces a generic string list wholesale.
pub fn set_items(state: &mut FormState, field_id: &str, new_items: Vec<String>) -> Result<(), FormError> {
    match state.value_mut(field_id) {
        Some(FieldValue::Items { items }) => {
            *items = new_items;
            Ok(())
        }
        Some(_) => Err(FormError::WrongKind {
            field: field_id.to_string(),
            expected: "a string list",
        }),
        None => Err(FormError::UnknownField(field_id.to_string())),
    }
}

/// Appends one empty entry to a record list. Returns the new entry's index.
pub fn add_entry(state: &mut FormState, field_id: &str) -> Result<usize, FormError> {
    match state.value_mut(field_id) {
        Some(FieldValue::Experiences { entries }) => {
            entries.push(ExperienceEntry::empty());
            Ok(entries.len() - 1)
        }
        Some(FieldValue::Educations { entries }) => {
            entries.push(EducationEntry::empty());
            Ok(entries.len() - 1)
        }
        Some(FieldValue::Achievements { entries }) => {
            entries.push(AchievementEntry::empty());
            Ok(entries.len() - 1)
        }
        Some(_) => Err(FormError::WrongKind {
            field: field_id.to_string(),
            expected: "a record list",
        }),
        None => Err(FormError::UnknownField(field_id.to_string())),
    }
}

/// Removes the entry at `index`, preserving the relative order of the rest.
/// Removing the last remaining entry is allowed; an empty required list then
/// fails validation rather than crashing anything.
pub fn remove_entry(state: &mut FormState, field_id: &str, index: usize) -> Result<(), FormError> {
    let len = entry_count(state, field_id)?;
    if index >= len {
        return Err(FormError::IndexOutOfRange {
            field: field_id.to_string(),
            index,
            len,
        });
    }
    match state.value_mut(field_id) {
        Some(FieldValue::Experiences { entries }) => {
            entries.remove(index);
        }
        Some(FieldValue::Educations { entries }) => {
            entries.remove(index);
        }
        Some(FieldValue::Achievements { entries }) => {
            entries.remove(index);
        }
        _ => unreachable!("entry_count already checked the variant"),
    }
    Ok(())
}

/// Writes one attribute of one entry, e.g. `("experiences", 0, "company")`.
/// Attribute names are the shadow-key prefixes; achievements accept
/// `achievement` (or `content`).
pub fn set_entry_attr(
    state: &mut FormState,
    field_id: &str,
    index: usize,
    attr: &str,
    value: String,
) -> Result<(), FormError> {
    let len = entry_count(state, field_id)?;
    if index >= len {
        return Err(FormError::IndexOutOfRange {
            field: field_id.to_string(),
            index,
            len,
        });
    }
    let unknown_attr = || FormError::UnknownAttr {
        field: field_id.to_string(),
        attr: attr.to_string(),
    };
    match state.value_mut(field_id) {
        Some(FieldValue::Experiences { entries }) => {
            if !entries[index].set_attr(attr, value) {
                return Err(unknown_attr());
            }
        }
        Some(FieldValue::Educations { entries }) => {
            if !entries[index].set_attr(attr, value) {
                return Err(unknown_attr());
            }
        }
        Some(FieldValue::Achievements { entries }) => match attr {
            "achievement" | "content" => entries[index].content = value,
            _ => return Err(unknown_attr()),
        },
        _ => unreachable!("entry_count already checked the variant"),
    }
    Ok(())
}

/// Number of entries in a record list field.
pub fn entry_count(state: &FormState, field_id: &str) -> Result<usize, FormError> {
    match state.value(field_id) {
        Some(FieldValue::Experiences { entries }) => Ok(entries.len()),
        Some(FieldValue::Educations { entries }) => Ok(entries.len()),
        Some(FieldValue::Achievements { entries }) => Ok(entries.len()),
        Some(_) => Err(FormError::WrongKind {
            field: field_id.to_string(),
            expected: "a record list",
        }),
        None => Err(FormError::UnknownField(field_id.to_string())),
    }
}

/// Debug-level invariant check used by tests: the flat projection of every
/// record list has exactly `{prefix}_0 ..= {prefix}_(N-1)` shadow keys.
#[cfg(test)]
pub fn assert_flat_contiguous(state: &FormState, schema: &TemplateSchema) {
    use crate::form::store::{
        shadow_key, ACHIEVEMENT_ATTR, EDUCATION_ATTRS, EXPERIENCE_ATTRS,
    };

    let flat = state.to_flat(schema);
    for (field_id, value) in &state.values {
        let (len, prefixes): (usize, Vec<&str>) = match value {
            FieldValue::Experiences { entries } => (entries.len(), EXPERIENCE_ATTRS.to_vec()),
            FieldValue::Educations { entries } => (entries.len(), EDUCATION_ATTRS.to_vec()),
            FieldValue::Achievements { entries } => (entries.len(), vec![ACHIEVEMENT_ATTR]),
            _ => continue,
        };
        assert_eq!(
            flat[field_id].as_array().map(Vec::len),
            Some(len),
            "length marker for '{field_id}'"
        );
        for prefix in prefixes {
            for i in 0..len {
                assert!(
                    flat.contains_key(&shadow_key(prefix, i)),
                    "missing shadow key {prefix}_{i}"
                );
            }
            assert!(
                !flat.contains_key(&shadow_key(prefix, len)),
                "orphaned shadow key {prefix}_{len}"
            );
        }
    }
}
