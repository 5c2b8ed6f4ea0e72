//! Field-indexed form state store.
//!
//! Each form session owns exactly one `FormState`: a map from field id to a
//! typed value. Repeatable entities (experiences, educations, achievements)
//! are ordered lists of small records with stable generated ids — positional
//! indices are derived from list position, so the visible indexing is always
//! dense 0..N-1 and removal can never strand a stale index.
//!
//! The wire format is flatter than the in-memory shape: external callers
//! (initial seed data, the persist payload, the export payload) see a flat
//! JSON object where each record list becomes a length-marker array of empty
//! placeholders plus per-index shadow keys (`company_0`, `degree_1`, ...).
//! `to_flat` / `from_flat` are the only places that format exists.
#![allow(dead_code)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::schema::{FieldKind, ListKind, TemplateId, TemplateSchema};

/// Shadow-key prefixes for experience entries, in attribute order.
pub const EXPERIENCE_ATTRS: [&str; 5] =
    ["company", "position", "startDate", "endDate", "description"];

/// Shadow-key prefixes for education entries, in attribute order.
/// Date prefixes are distinct from the experience ones: the wire map is
/// flat, so `startDate_0` cannot serve two entities at once.
pub const EDUCATION_ATTRS: [&str; 5] = ["degree", "school", "eduStartDate", "eduEndDate", "gpa"];

/// Shadow-key prefix for achievement entries.
pub const ACHIEVEMENT_ATTR: &str = "achievement";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperienceEntry {
    pub id: Uuid,
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

impl ExperienceEntry {
    pub fn empty() -> Self {
        ExperienceEntry {
            id: Uuid::new_v4(),
            company: String::new(),
            position: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            description: String::new(),
        }
    }

    pub fn attr(&self, attr: &str) -> Option<&str> {
        match attr {
            "company" => Some(&self.company),
            "position" => Some(&self.position),
            "startDate" => Some(&self.start_date),
            "endDate" => Some(&self.end_date),
            "description" => Some(&self.description),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, attr: &str, value: String) -> bool {
        match attr {
            "company" => self.company = value,
            "position" => self.position = value,
            "startDate" => self.start_date = value,
            "endDate" => self.end_date = value,
            "description" => self.description = value,
            _ => return false,
        }
        true
    }

    pub fn is_blank(&self) -> bool {
        EXPERIENCE_ATTRS
            .iter()
            .all(|a| self.attr(a).map_or(true, |v| v.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EducationEntry {
    pub id: Uuid,
    pub degree: String,
    pub school: String,
    pub start_date: String,
    pub end_date: String,
    pub gpa: String,
}

impl EducationEntry {
    pub fn empty() -> Self {
        EducationEntry {
            id: Uuid::new_v4(),
            degree: String::new(),
            school: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            gpa: String::new(),
        }
    }

    pub fn attr(&self, attr: &str) -> Option<&str> {
        match attr {
            "degree" => Some(&self.degree),
            "school" => Some(&self.school),
            "eduStartDate" => Some(&self.start_date),
            "eduEndDate" => Some(&self.end_date),
            "gpa" => Some(&self.gpa),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, attr: &str, value: String) -> bool {
        match attr {
            "degree" => self.degree = value,
            "school" => self.school = value,
            "eduStartDate" => self.start_date = value,
            "eduEndDate" => self.end_date = value,
            "gpa" => self.gpa = value,
            _ => return false,
        }
        true
    }

    pub fn is_blank(&self) -> bool {
        EDUCATION_ATTRS
            .iter()
            .all(|a| self.attr(a).map_or(true, |v| v.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AchievementEntry {
    pub id: Uuid,
    pub content: String,
}

impl AchievementEntry {
    pub fn empty() -> Self {
        AchievementEntry {
            id: Uuid::new_v4(),
            content: String::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// The typed value held for one field. A closed union: the variant is fixed
/// by the field's schema kind at session creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldValue {
    Scalar { value: String },
    Items { items: Vec<String> },
    Experiences { entries: Vec<ExperienceEntry> },
    Educations { entries: Vec<EducationEntry> },
    Achievements { entries: Vec<AchievementEntry> },
}

impl FieldValue {
    /// The empty value for a schema field kind.
    pub fn default_for(kind: FieldKind) -> FieldValue {
        match kind {
            FieldKind::Text | FieldKind::TextArea | FieldKind::Date => FieldValue::Scalar {
                value: String::new(),
            },
            FieldKind::List {
                of: ListKind::Generic,
            } => FieldValue::Items { items: vec![] },
            FieldKind::List {
                of: ListKind::Experience,
            } => FieldValue::Experiences { entries: vec![] },
            FieldKind::List {
                of: ListKind::Education,
            } => FieldValue::Educations { entries: vec![] },
            FieldKind::List {
                of: ListKind::Achievement,
            } => FieldValue::Achievements { entries: vec![] },
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Scalar { value } => value.trim().is_empty(),
            FieldValue::Items { items } => items.iter().all(|i| i.trim().is_empty()),
            FieldValue::Experiences { entries } => entries.iter().all(|e| e.is_blank()),
            FieldValue::Educations { entries } => entries.iter().all(|e| e.is_blank()),
            FieldValue::Achievements { entries } => entries.iter().all(|e| e.is_blank()),
        }
    }
}

/// Per-session form state. Exclusively owned by its session; every mutation
/// happens through the entry engine under the session store's write lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormState {
    pub template_id: TemplateId,
    pub values: BTreeMap<String, FieldValue>,
}

impl FormState {
    /// Creates an empty state with one default value per schema field.
    pub fn for_schema(schema: &TemplateSchema) -> FormState {
        let values = schema
            .fields()
            .map(|f| (f.id.clone(), FieldValue::default_for(f.kind)))
            .collect();
        FormState {
            template_id: schema.id,
            values,
        }
    }

    /// Creates a state seeded from externally supplied flat initial data.
    pub fn from_flat(schema: &TemplateSchema, flat: &Map<String, Value>) -> FormState {
        let mut state = FormState::for_schema(schema);
        state.merge_flat(schema, flat);
        state
    }

    pub fn value(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    pub fn value_mut(&mut self, field_id: &str) -> Option<&mut FieldValue> {
        self.values.get_mut(field_id)
    }

    pub fn scalar(&self, field_id: &str) -> Option<&str> {
        match self.values.get(field_id)? {
            FieldValue::Scalar { value } => Some(value),
            _ => None,
        }
    }

    pub fn experiences(&self, field_id: &str) -> Option<&[ExperienceEntry]> {
        match self.values.get(field_id)? {
            FieldValue::Experiences { entries } => Some(entries),
            _ => None,
        }
    }

    pub fn educations(&self, field_id: &str) -> Option<&[EducationEntry]> {
        match self.values.get(field_id)? {
            FieldValue::Educations { entries } => Some(entries),
            _ => None,
        }
    }

    pub fn achievements(&self, field_id: &str) -> Option<&[AchievementEntry]> {
        match self.values.get(field_id)? {
            FieldValue::Achievements { entries } => Some(entries),
            _ => None,
        }
    }

    pub fn items(&self, field_id: &str) -> Option<&[String]> {
        match self.values.get(field_id)? {
            FieldValue::Items { items } => Some(items),
            _ => None,
        }
    }

    /// True when nothing has been entered anywhere.
    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| v.is_blank())
    }

    /// Overwrites fields that are present in `flat`; untouched fields keep
    /// their current value. Returns the ids of the overwritten fields. Used
    /// both for seeding and for merging partial AI-generated content.
    pub fn merge_flat(
        &mut self,
        schema: &TemplateSchema,
        flat: &Map<String, Value>,
    ) -> Vec<String> {
        let mut touched = Vec::new();
        for field in schema.fields() {
            if let Some(value) = field_from_flat(&field.id, field.kind, flat) {
                self.values.insert(field.id.clone(), value);
                touched.push(field.id.clone());
            }
        }
        touched
    }

    /// Projects the state into the flat wire format: scalar fields by id,
    /// generic lists as string arrays, record lists as a length-marker array
    /// of empty placeholders plus dense per-index shadow keys.
    pub fn to_flat(&self, schema: &TemplateSchema) -> Map<String, Value> {
        let mut flat = Map::new();
        for field in schema.fields() {
            let Some(value) = self.values.get(&field.id) else {
                continue;
            };
            match value {
                FieldValue::Scalar { value } => {
                    flat.insert(field.id.clone(), Value::String(value.clone()));
                }
                FieldValue::Items { items } => {
                    flat.insert(
                        field.id.clone(),
                        Value::Array(items.iter().cloned().map(Value::String).collect()),
                    );
                }
                FieldValue::Experiences { entries } => {
                    insert_marker(&mut flat, &field.id, entries.len());
                    for (i, entry) in entries.iter().enumerate() {
                        for attr in EXPERIENCE_ATTRS {
                            flat.insert(
                                shadow_key(attr, i),
                                Value::String(entry.attr(attr).unwrap_or_default().to_string()),
                            );
                        }
                    }
                }
                FieldValue::Educations { entries } => {
                    insert_marker(&mut flat, &field.id, entries.len());
                    for (i, entry) in entries.iter().enumerate() {
                        for attr in EDUCATION_ATTRS {
                            flat.insert(
                                shadow_key(attr, i),
                                Value::String(entry.attr(attr).unwrap_or_default().to_string()),
                            );
                        }
                    }
                }
                FieldValue::Achievements { entries } => {
                    insert_marker(&mut flat, &field.id, entries.len());
                    for (i, entry) in entries.iter().enumerate() {
                        flat.insert(
                            shadow_key(ACHIEVEMENT_ATTR, i),
                            Value::String(entry.content.clone()),
                        );
                    }
                }
            }
        }
        flat
    }
}

pub fn shadow_key(prefix: &str, index: usize) -> String {
    format!("{prefix}_{index}")
}

fn insert_marker(flat: &mut Map<String, Value>, field_id: &str, len: usize) {
    let placeholders = vec![Value::String(String::new()); len];
    flat.insert(field_id.to_string(), Value::Array(placeholders));
}

fn flat_str(flat: &Map<String, Value>, key: &str) -> Option<String> {
    flat.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Entry count for a record list in flat data: the length-marker array when
/// present, otherwise inferred by scanning shadow keys for contiguous
/// indices (partial AI payloads ship shadow keys without markers).
fn flat_entry_count(flat: &Map<String, Value>, field_id: &str, prefixes: &[&str]) -> usize {
    if let Some(Value::Array(marker)) = flat.get(field_id) {
        return marker.len();
    }
    let mut n = 0;
    while prefixes
        .iter()
        .any(|p| flat.contains_key(&shadow_key(p, n)))
    {
        n += 1;
    }
    n
}

fn field_from_flat(field_id: &str, kind: FieldKind, flat: &Map<String, Value>) -> Option<FieldValue> {
    match kind {
        FieldKind::Text | FieldKind::TextArea | FieldKind::Date => {
            flat_str(flat, field_id).map(|value| FieldValue::Scalar { value })
        }
        FieldKind::List {
            of: ListKind::Generic,
        } => match flat.get(field_id)? {
            Value::Array(raw) => Some(FieldValue::Items {
                items: raw
                    .iter()
                    .map(|v| v.as_str().unwrap_or_default().to_string())
                    .collect(),
            }),
            _ => None,
        },
        FieldKind::List {
            of: ListKind::Experience,
        } => {
            let n = flat_entry_count(flat, field_id, &EXPERIENCE_ATTRS);
            if n == 0 && !flat.contains_key(field_id) {
                return None;
            }
            let entries = (0..n)
                .map(|i| {
                    let mut entry = ExperienceEntry::empty();
                    for attr in EXPERIENCE_ATTRS {
                        if let Some(v) = flat_str(flat, &shadow_key(attr, i)) {
                            entry.set_attr(attr, v);
                        }
                    }
                    entry
                })
                .collect();
            Some(FieldValue::Experiences { entries })
        }
        FieldKind::List {
            of: ListKind::Education,
        } => {
            let n = flat_entry_count(flat, field_id, &EDUCATION_ATTRS);
            if n == 0 && !flat.contains_key(field_id) {
                return None;
            }
            let entries = (0..n)
                .map(|i| {
                    let mut entry = EducationEntry::empty();
                    for attr in EDUCATION_ATTRS {
                        if let Some(v) = flat_str(flat, &shadow_key(attr, i)) {
                            entry.set_attr(attr, v);
                        }
                    }
                    entry
                })
                .collect();
            Some(FieldValue::Educations { entries })
        }
        FieldKind::List {
            of: ListKind::Achievement,
        } => {
            let n = flat_entry_count(flat, field_id, &[ACHIEVEMENT_ATTR]);
            if n == 0 && !flat.contains_key(field_id) {
                return None;
            }
            let entries = (0..n)
                .map(|i| AchievementEntry {
                    id: Uuid::new_v4(),
                    content: flat_str(flat, &shadow_key(ACHIEVEMENT_ATTR, i)).unwrap_or_default(),
                })
                .collect();
            Some(FieldValue::Achievements { entries })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::templates::builtin;
    use serde_json::json;

    fn make_state() -> (&'static TemplateSchema, FormState) {
        let schema = builtin(TemplateId::Modern);
        let state = FormState::for_schema(schema);
        (schema, state)
    }

    #[test]
    fn test_new_state_has_one_value_per_field() {
        let (schema, state) = make_state();
        assert_eq!(state.values.len(), schema.fields().count());
        assert!(state.is_empty());
    }

    #[test]
    fn test_to_flat_shadow_keys_contiguous() {
        let (schema, mut state) = make_state();
        if let Some(FieldValue::Experiences { entries }) = state.value_mut("experiences") {
            entries.push(ExperienceEntry::empty());
            entries.push(ExperienceEntry::empty());
            entries[0].company = "Acme".to_string();
            entries[1].company = "Globex".to_string();
        }

        let flat = state.to_flat(schema);
        assert_eq!(flat["experiences"].as_array().unwrap().len(), 2);
        for attr in EXPERIENCE_ATTRS {
            assert!(flat.contains_key(&shadow_key(attr, 0)), "missing {attr}_0");
            assert!(flat.contains_key(&shadow_key(attr, 1)), "missing {attr}_1");
            assert!(!flat.contains_key(&shadow_key(attr, 2)), "stray {attr}_2");
        }
        assert_eq!(flat["company_0"], "Acme");
        assert_eq!(flat["company_1"], "Globex");
    }

    #[test]
    fn test_from_flat_seeds_scalars_and_entries() {
        let schema = builtin(TemplateId::Classic);
        let flat = json!({
            "firstName": "Jane",
            "summary": "Engineer.",
            "experiences": ["", ""],
            "company_0": "Acme",
            "position_0": "Dev",
            "company_1": "Globex",
            "skills": ["Rust", "SQL"],
        });
        let state = FormState::from_flat(schema, flat.as_object().unwrap());

        assert_eq!(state.scalar("firstName"), Some("Jane"));
        assert_eq!(state.scalar("summary"), Some("Engineer."));
        let entries = state.experiences("experiences").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].company, "Acme");
        assert_eq!(entries[0].position, "Dev");
        assert_eq!(entries[1].company, "Globex");
        assert_eq!(entries[1].position, "");
        assert_eq!(state.items("skills").unwrap(), ["Rust", "SQL"]);
    }

    #[test]
    fn test_from_flat_infers_length_without_marker() {
        let schema = builtin(TemplateId::Modern);
        let flat = json!({
            "degree_0": "BSc",
            "school_0": "MIT",
            "degree_1": "MSc",
        });
        let state = FormState::from_flat(schema, flat.as_object().unwrap());
        let entries = state.educations("educations").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].school, "MIT");
        assert_eq!(entries[1].degree, "MSc");
    }

    #[test]
    fn test_flat_round_trip_preserves_content() {
        let schema = builtin(TemplateId::Minimal);
        let flat = json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "experiences": [""],
            "company_0": "Analytical Engines",
            "position_0": "Programmer",
            "achievements": [""],
            "achievement_0": "First published algorithm",
        });
        let state = FormState::from_flat(schema, flat.as_object().unwrap());
        let out = state.to_flat(schema);

        assert_eq!(out["firstName"], "Ada");
        assert_eq!(out["company_0"], "Analytical Engines");
        assert_eq!(out["achievement_0"], "First published algorithm");
        assert_eq!(out["achievements"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_merge_flat_leaves_unmentioned_fields_alone() {
        let schema = builtin(TemplateId::Modern);
        let mut state = FormState::for_schema(schema);
        if let Some(FieldValue::Scalar { value }) = state.value_mut("firstName") {
            *value = "Jane".to_string();
        }

        let partial = json!({ "summary": "Generated summary." });
        let touched = state.merge_flat(schema, partial.as_object().unwrap());
        assert_eq!(touched, ["summary"]);

        assert_eq!(state.scalar("firstName"), Some("Jane"));
        assert_eq!(state.scalar("summary"), Some("Generated summary."));
    }

    #[test]
    fn test_is_empty_ignores_whitespace_only_values() {
        let (_, mut state) = make_state();
        if let Some(FieldValue::Scalar { value }) = state.value_mut("firstName") {
            *value = "   ".to_string();
        }
        assert!(state.is_empty());
        if let Some(FieldValue::Scalar { value }) = state.value_mut("firstName") {
            *value = "Jane".to_string();
        }
        assert!(!state.is_empty());
    }
}
