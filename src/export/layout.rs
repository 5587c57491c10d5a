//! Renderer-neutral resume layout
//!
//! A section is laid out only when its visibility flag is on and it has
//! something to show. Sections always come in the same order: summary,
//! skills, work experience, education, personal details.

use crate::document::{Education, ResumeDocument, Section, WorkExperience};
use crate::profile::Template;
use chrono::NaiveDate;
use serde::Serialize;

pub const PLACEHOLDER_NAME: &str = "Your Name";
pub const SEPARATOR: &str = "  •  ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub template: Template,
    pub header: Header,
    pub sections: Vec<LayoutSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub name: String,
    /// email, phone, location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// linkedin, github, website
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSection {
    pub section: Section,
    pub title: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Block {
    Paragraph { text: String },
    /// Skills sharing a category
    Group { label: String, items: Vec<String> },
    Entry {
        title: String,
        subtitle: String,
        dates: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        bullets: Vec<String>,
    },
    Field { label: String, value: String },
}

impl Layout {
    pub fn build(document: &ResumeDocument, template: Template) -> Self {
        let sections = Section::all()
            .iter()
            .filter(|s| document.section_visibility.is_visible(**s))
            .filter_map(|s| {
                let blocks = section_blocks(document, *s);
                if blocks.is_empty() {
                    return None;
                }
                Some(LayoutSection {
                    section: *s,
                    title: section_title(*s, template),
                    blocks,
                })
            })
            .collect();

        Self {
            template,
            header: header(document),
            sections,
        }
    }

    pub fn section(&self, section: Section) -> Option<&LayoutSection> {
        self.sections.iter().find(|s| s.section == section)
    }
}

/// Heading text for a section. Minimal keeps title case, the other
/// templates shout.
pub fn section_title(section: Section, template: Template) -> String {
    let title = match section {
        Section::Summary => "Professional Summary",
        Section::Skills => "Skills",
        Section::WorkExperience => "Work Experience",
        Section::Education => "Education",
        Section::PersonalDetails => "Personal Details",
    };
    match template {
        Template::Minimal => title.to_string(),
        _ => title.to_uppercase(),
    }
}

fn header(document: &ResumeDocument) -> Header {
    let info = &document.personal_info;
    let name = match info.full_name.trim() {
        "" => PLACEHOLDER_NAME.to_string(),
        name => name.to_string(),
    };
    let contact = join_present([
        Some(info.email.as_str()),
        Some(info.phone.as_str()),
        info.location.as_deref(),
    ]);
    let links = join_present([
        info.linkedin.as_deref(),
        info.github.as_deref(),
        info.website.as_deref(),
    ]);
    Header { name, contact, links }
}

fn join_present<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    let parts: Vec<&str> = parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(SEPARATOR))
}

fn section_blocks(document: &ResumeDocument, section: Section) -> Vec<Block> {
    match section {
        Section::Summary => match document.summary.trim() {
            "" => Vec::new(),
            text => vec![Block::Paragraph { text: text.to_string() }],
        },
        Section::Skills => skill_groups(document),
        Section::WorkExperience => document.work_experience.iter().map(work_entry).collect(),
        Section::Education => document.education.iter().map(education_entry).collect(),
        Section::PersonalDetails => document
            .personal_details
            .entries()
            .into_iter()
            .map(|(label, value)| Block::Field {
                label: label.to_string(),
                value: if label == "Date of Birth" {
                    format_birth_date(value)
                } else {
                    value.to_string()
                },
            })
            .collect(),
    }
}

/// Skills grouped by category, groups in order of first appearance
fn skill_groups(document: &ResumeDocument) -> Vec<Block> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for skill in &document.skills {
        match groups.iter_mut().find(|(label, _)| *label == skill.category) {
            Some((_, items)) => items.push(skill.name.clone()),
            None => groups.push((skill.category.clone(), vec![skill.name.clone()])),
        }
    }
    groups
        .into_iter()
        .map(|(label, items)| Block::Group { label, items })
        .collect()
}

fn work_entry(exp: &WorkExperience) -> Block {
    let end = if exp.current {
        "Present".to_string()
    } else {
        format_month(&exp.end_date)
    };
    Block::Entry {
        title: exp.role.clone(),
        subtitle: exp.company.clone(),
        dates: format!("{} - {}", format_month(&exp.start_date), end),
        description: exp
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        bullets: exp
            .projects
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

fn education_entry(edu: &Education) -> Block {
    let mut dates = format!("{} - {}", format_month(&edu.start_date), format_month(&edu.end_date));
    if let Some(gpa) = edu.gpa.as_deref().filter(|g| !g.trim().is_empty()) {
        dates.push_str(&format!(" | GPA: {}", gpa.trim()));
    }
    Block::Entry {
        title: format!("{} in {}", edu.degree, edu.field),
        subtitle: edu.institution.clone(),
        dates,
        description: None,
        bullets: Vec::new(),
    }
}

/// `2020-01` -> `Jan 2020`. Values that are not a year-month pass through.
pub fn format_month(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    match NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d") {
        Ok(date) => date.format("%b %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// `1990-05-17` -> `May 17, 1990`
fn format_birth_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}
