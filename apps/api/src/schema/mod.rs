//! Template schemas — the declarative description of a resume template.
//!
//! A schema is pure data: named sections, each with an ordered list of typed
//! fields. It never changes after construction; everything downstream
//! (validation, completion, preview) is a function of `(schema, state)`.
#![allow(dead_code)]

pub mod templates;

use serde::{Deserialize, Serialize};

/// The four built-in template identities. Doubles as the discriminant for
/// preview layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    Modern,
    Classic,
    Creative,
    Minimal,
}

impl TemplateId {
    pub const ALL: [TemplateId; 4] = [
        TemplateId::Modern,
        TemplateId::Classic,
        TemplateId::Creative,
        TemplateId::Minimal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::Modern => "modern",
            TemplateId::Classic => "classic",
            TemplateId::Creative => "creative",
            TemplateId::Minimal => "minimal",
        }
    }

    pub fn parse(s: &str) -> Option<TemplateId> {
        match s {
            "modern" => Some(TemplateId::Modern),
            "classic" => Some(TemplateId::Classic),
            "creative" => Some(TemplateId::Creative),
            "minimal" => Some(TemplateId::Minimal),
            _ => None,
        }
    }
}

/// The kind of repeatable-entity list a `FieldKind::List` field holds.
///
/// Experience, education and achievement lists are structured records with
/// their own entry shapes; `Generic` is a flat list of strings (skills,
/// languages, ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Experience,
    Education,
    Achievement,
    Generic,
}

/// Closed set of field types a template may declare.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Date,
    List { of: ListKind },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    /// Unique within the template. Also the key in the form state store.
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
    pub placeholder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDef {
    pub id: String,
    pub name: String,
    pub required: bool,
    pub order: u32,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSchema {
    pub id: TemplateId,
    pub name: String,
    pub sections: Vec<SectionDef>,
}

impl TemplateSchema {
    /// All fields in schema order (sections by `order`, fields as declared).
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    /// Required fields in schema order.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields().filter(|f| f.required)
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldDef> {
        self.fields().find(|f| f.id == field_id)
    }

    /// Verifies the schema invariant: field ids are unique within the
    /// template. Built-ins are checked by tests; external schemas would be
    /// checked at load time.
    pub fn check(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for field in self.fields() {
            if !seen.insert(field.id.as_str()) {
                return Err(format!(
                    "duplicate field id '{}' in template '{}'",
                    field.id,
                    self.id.as_str()
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_field(id: &str, kind: FieldKind) -> FieldDef {
        FieldDef {
            id: id.to_string(),
            name: id.to_string(),
            kind,
            required: true,
            placeholder: String::new(),
        }
    }

    #[test]
    fn test_template_id_round_trip() {
        for id in TemplateId::ALL {
            assert_eq!(TemplateId::parse(id.as_str()), Some(id));
        }
        assert_eq!(TemplateId::parse("futuristic"), None);
    }

    #[test]
    fn test_check_rejects_duplicate_field_ids() {
        let schema = TemplateSchema {
            id: TemplateId::Modern,
            name: "Modern".to_string(),
            sections: vec![
                SectionDef {
                    id: "a".to_string(),
                    name: "A".to_string(),
                    required: true,
                    order: 1,
                    fields: vec![make_field("title", FieldKind::Text)],
                },
                SectionDef {
                    id: "b".to_string(),
                    name: "B".to_string(),
                    required: true,
                    order: 2,
                    fields: vec![make_field("title", FieldKind::TextArea)],
                },
            ],
        };
        let err = schema.check().unwrap_err();
        assert!(err.contains("duplicate field id 'title'"));
    }

    #[test]
    fn test_field_lookup_crosses_sections() {
        let schema = TemplateSchema {
            id: TemplateId::Classic,
            name: "Classic".to_string(),
            sections: vec![
                SectionDef {
                    id: "a".to_string(),
                    name: "A".to_string(),
                    required: true,
                    order: 1,
                    fields: vec![make_field("title", FieldKind::Text)],
                },
                SectionDef {
                    id: "b".to_string(),
                    name: "B".to_string(),
                    required: false,
                    order: 2,
                    fields: vec![make_field(
                        "skills",
                        FieldKind::List {
                            of: ListKind::Generic,
                        },
                    )],
                },
            ],
        };
        assert!(schema.field("skills").is_some());
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn test_field_kind_serde_tagging() {
        let kind = FieldKind::List {
            of: ListKind::Experience,
        };
        let json = serde_json::to_value(kind).unwrap();
        assert_eq!(json["type"], "list");
        assert_eq!(json["of"], "experience");
    }
}
