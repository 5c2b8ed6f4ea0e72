//! Built-in template registry.
//!
//! All four templates share the same core sections; they differ in how the
//! preview lays them out and in whether achievements are required
//! (`creative` treats them as part of its identity, the others keep them
//! optional).

use std::sync::OnceLock;

use super::{FieldDef, FieldKind, ListKind, SectionDef, TemplateId, TemplateSchema};

/// Returns the built-in schema for a template id.
pub fn builtin(id: TemplateId) -> &'static TemplateSchema {
    registry()
        .iter()
        .find(|t| t.id == id)
        .expect("registry covers every TemplateId")
}

/// All built-in schemas, one per `TemplateId`, in `TemplateId::ALL` order.
pub fn all() -> &'static [TemplateSchema] {
    registry()
}

fn registry() -> &'static [TemplateSchema] {
    static REGISTRY: OnceLock<Vec<TemplateSchema>> = OnceLock::new();
    REGISTRY.get_or_init(|| TemplateId::ALL.iter().map(|id| build_template(*id)).collect())
}

fn build_template(id: TemplateId) -> TemplateSchema {
    let display_name = match id {
        TemplateId::Modern => "Modern",
        TemplateId::Classic => "Classic",
        TemplateId::Creative => "Creative",
        TemplateId::Minimal => "Minimal",
    };
    let achievements_required = matches!(id, TemplateId::Creative);

    TemplateSchema {
        id,
        name: display_name.to_string(),
        sections: vec![
            SectionDef {
                id: "personal".to_string(),
                name: "Personal Information".to_string(),
                required: true,
                order: 1,
                fields: vec![
                    text("firstName", "First Name", true, "Jane"),
                    text("lastName", "Last Name", true, "Doe"),
                    text("email", "Email", true, "jane.doe@example.com"),
                    text("phone", "Phone", false, "+1 555 010 1234"),
                    text("location", "Location", false, "City, Country"),
                ],
            },
            SectionDef {
                id: "summary".to_string(),
                name: "Professional Summary".to_string(),
                required: true,
                order: 2,
                fields: vec![FieldDef {
                    id: "summary".to_string(),
                    name: "Summary".to_string(),
                    kind: FieldKind::TextArea,
                    required: true,
                    placeholder: "A short paragraph about your background".to_string(),
                }],
            },
            SectionDef {
                id: "experience".to_string(),
                name: "Work Experience".to_string(),
                required: true,
                order: 3,
                fields: vec![list("experiences", "Experience", ListKind::Experience, true)],
            },
            SectionDef {
                id: "education".to_string(),
                name: "Education".to_string(),
                required: true,
                order: 4,
                fields: vec![list("educations", "Education", ListKind::Education, true)],
            },
            SectionDef {
                id: "skills".to_string(),
                name: "Skills".to_string(),
                required: true,
                order: 5,
                fields: vec![list("skills", "Skills", ListKind::Generic, true)],
            },
            SectionDef {
                id: "achievements".to_string(),
                name: "Achievements".to_string(),
                required: achievements_required,
                order: 6,
                fields: vec![list(
                    "achievements",
                    "Achievements",
                    ListKind::Achievement,
                    achievements_required,
                )],
            },
        ],
    }
}

fn text(id: &str, name: &str, required: bool, placeholder: &str) -> FieldDef {
    FieldDef {
        id: id.to_string(),
        name: name.to_string(),
        kind: FieldKind::Text,
        required,
        placeholder: placeholder.to_string(),
    }
}

fn list(id: &str, name: &str, of: ListKind, required: bool) -> FieldDef {
    FieldDef {
        id: id.to_string(),
        name: name.to_string(),
        kind: FieldKind::List { of },
        required,
        placeholder: String::new(),
    }
}
