//! Preview renderer — a pure, read-only projection of `(schema, state)` into
//! a display structure. No markup, no styling: the client renders
//! `PreviewDocument` however it likes. Layout differences between the four
//! templates are expressed as `LayoutHints`.

use serde::{Deserialize, Serialize};

use crate::form::store::FormState;
use crate::schema::{TemplateId, TemplateSchema};

/// Text shown when the whole form is still empty.
pub const EMPTY_STATE_PLACEHOLDER: &str =
    "Start filling in your details to see a live preview here.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeaderAlignment {
    Left,
    Center,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutHints {
    pub accent: &'static str,
    pub header_alignment: HeaderAlignment,
    /// Section ids in render order.
    pub section_order: Vec<&'static str>,
    pub show_section_rules: bool,
}

impl LayoutHints {
    /// One layout per template id — the four known preview variants.
    pub fn for_template(id: TemplateId) -> LayoutHints {
        match id {
            TemplateId::Modern => LayoutHints {
                accent: "#2563eb",
                header_alignment: HeaderAlignment::Left,
                section_order: vec![
                    "summary",
                    "experience",
                    "skills",
                    "education",
                    "achievements",
                ],
                show_section_rules: true,
            },
            TemplateId::Classic => LayoutHints {
                accent: "#1f2937",
                header_alignment: HeaderAlignment::Center,
                section_order: vec![
                    "summary",
                    "experience",
                    "education",
                    "skills",
                    "achievements",
                ],
                show_section_rules: true,
            },
            TemplateId::Creative => LayoutHints {
                accent: "#db2777",
                header_alignment: HeaderAlignment::Left,
                section_order: vec![
                    "summary",
                    "achievements",
                    "experience",
                    "skills",
                    "education",
                ],
                show_section_rules: false,
            },
            TemplateId::Minimal => LayoutHints {
                accent: "#111111",
                header_alignment: HeaderAlignment::Left,
                section_order: vec!["summary", "experience", "education", "skills"],
                show_section_rules: false,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewHeader {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewExperience {
    pub company: String,
    pub position: String,
    pub date_range: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewEducation {
    pub degree: String,
    pub school: String,
    pub date_range: Option<String>,
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewDocument {
    pub template_id: TemplateId,
    pub layout: LayoutHints,
    /// True when the state holds nothing; clients show `placeholder`.
    pub is_empty: bool,
    pub placeholder: Option<String>,
    pub header: Option<PreviewHeader>,
    pub summary: Option<String>,
    pub experiences: Vec<PreviewExperience>,
    pub educations: Vec<PreviewEducation>,
    pub skills: Vec<String>,
    pub achievements: Vec<String>,
}

/// Renders the read-only preview. Pure function of its inputs.
pub fn render_preview(schema: &TemplateSchema, state: &FormState) -> PreviewDocument {
    let layout = LayoutHints::for_template(schema.id);

    if state.is_empty() {
        return PreviewDocument {
            template_id: schema.id,
            layout,
            is_empty: true,
            placeholder: Some(EMPTY_STATE_PLACEHOLDER.to_string()),
            header: None,
            summary: None,
            experiences: vec![],
            educations: vec![],
            skills: vec![],
            achievements: vec![],
        };
    }

    PreviewDocument {
        template_id: schema.id,
        layout,
        is_empty: false,
        placeholder: None,
        header: render_header(state),
        summary: nonblank(state.scalar("summary")),
        experiences: render_experiences(state),
        educations: render_educations(state),
        skills: render_items(state, "skills"),
        achievements: render_achievements(state),
    }
}

fn nonblank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn render_header(state: &FormState) -> Option<PreviewHeader> {
    let first = nonblank(state.scalar("firstName"));
    let last = nonblank(state.scalar("lastName"));
    let email = nonblank(state.scalar("email"));
    let phone = nonblank(state.scalar("phone"));
    let location = nonblank(state.scalar("location"));

    if first.is_none() && last.is_none() && email.is_none() {
        return None;
    }

    let full_name = match (first, last) {
        (Some(f), Some(l)) => format!("{f} {l}"),
        (Some(f), None) => f,
        (None, Some(l)) => l,
        (None, None) => String::new(),
    };

    Some(PreviewHeader {
        full_name,
        email,
        phone,
        location,
    })
}

/// `start – end`, with `Present` standing in for a blank end date. None when
/// no start exists.
fn date_range(start: &str, end: &str) -> Option<String> {
    let start = start.trim();
    let end = end.trim();
    if start.is_empty() {
        return None;
    }
    if end.is_empty() {
        Some(format!("{start} – Present"))
    } else {
        Some(format!("{start} – {end}"))
    }
}

fn render_experiences(state: &FormState) -> Vec<PreviewExperience> {
    let Some(entries) = state.experiences("experiences") else {
        return vec![];
    };
    entries
        .iter()
        // Omit entries with neither identity sub-field present.
        .filter(|e| !e.company.trim().is_empty() || !e.position.trim().is_empty())
        .map(|e| PreviewExperience {
            company: e.company.trim().to_string(),
            position: e.position.trim().to_string(),
            date_range: date_range(&e.start_date, &e.end_date),
            description: nonblank(Some(&e.description)),
        })
        .collect()
}

fn render_educations(state: &FormState) -> Vec<PreviewEducation> {
    let Some(entries) = state.educations("educations") else {
        return vec![];
    };
    entries
        .iter()
        .filter(|e| !e.degree.trim().is_empty() || !e.school.trim().is_empty())
        .map(|e| PreviewEducation {
            degree: e.degree.trim().to_string(),
            school: e.school.trim().to_string(),
            date_range: date_range(&e.start_date, &e.end_date),
            gpa: nonblank(Some(&e.gpa)),
        })
        .collect()
}

fn render_items(state: &FormState, field_id: &str) -> Vec<String> {
    state
        .items(field_id)
        .unwrap_or_default()
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(str::to_string)
        .collect()
}

fn render_achievements(state: &FormState) -> Vec<String> {
    state
        .achievements("achievements")
        .unwrap_or_default()
        .iter()
        .map(|e| e.content.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
