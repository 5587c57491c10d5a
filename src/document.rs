//! Resume document model
//!
//! The document is serialized as one JSON blob with camelCase keys. Both
//! storage backends persist exactly this shape, so a document written by one
//! backend reads back identically through the other.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Contact block at the top of every resume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    pub id: String,
    pub company: String,
    pub role: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub current: bool,
    /// Bullet points; the editor keeps at least one (possibly empty) slot.
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: String,
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    /// Free-text grouping label
    pub category: String,
}

/// Regional fields some markets expect on a CV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages_known: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
}

impl Default for PersonalDetails {
    /// Every field present and empty, matching what older records are
    /// backfilled with on load.
    fn default() -> Self {
        let blank = || Some(String::new());
        Self {
            father_name: blank(),
            date_of_birth: blank(),
            gender: blank(),
            marital_status: blank(),
            languages_known: blank(),
            nationality: blank(),
        }
    }
}

impl PersonalDetails {
    /// Labelled non-empty fields, in display order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Father's Name", &self.father_name),
            ("Date of Birth", &self.date_of_birth),
            ("Gender", &self.gender),
            ("Marital Status", &self.marital_status),
            ("Languages Known", &self.languages_known),
            ("Nationality", &self.nationality),
        ]
        .into_iter()
        .filter_map(|(label, value)| match value.as_deref() {
            Some(v) if !v.trim().is_empty() => Some((label, v)),
            _ => None,
        })
        .collect()
    }
}

/// The sections a template may show or hide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Summary,
    Skills,
    WorkExperience,
    Education,
    PersonalDetails,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Summary => "summary",
            Section::Skills => "skills",
            Section::WorkExperience => "workExperience",
            Section::Education => "education",
            Section::PersonalDetails => "personalDetails",
        }
    }

    /// All sections in render order
    pub fn all() -> &'static [Section] {
        &[
            Section::Summary,
            Section::Skills,
            Section::WorkExperience,
            Section::Education,
            Section::PersonalDetails,
        ]
    }
}

impl FromStr for Section {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "summary" => Ok(Section::Summary),
            "skills" => Ok(Section::Skills),
            "workexperience" | "experience" | "work" => Ok(Section::WorkExperience),
            "education" => Ok(Section::Education),
            "personaldetails" | "details" => Ok(Section::PersonalDetails),
            _ => Err(Error::InvalidSection(s.to_string())),
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-section render switches. Always carries all five keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionVisibility {
    pub summary: bool,
    pub skills: bool,
    pub work_experience: bool,
    pub education: bool,
    pub personal_details: bool,
}

impl Default for SectionVisibility {
    fn default() -> Self {
        Self {
            summary: true,
            skills: true,
            work_experience: true,
            education: true,
            personal_details: true,
        }
    }
}

impl SectionVisibility {
    pub fn is_visible(&self, section: Section) -> bool {
        match section {
            Section::Summary => self.summary,
            Section::Skills => self.skills,
            Section::WorkExperience => self.work_experience,
            Section::Education => self.education,
            Section::PersonalDetails => self.personal_details,
        }
    }

    fn flag_mut(&mut self, section: Section) -> &mut bool {
        match section {
            Section::Summary => &mut self.summary,
            Section::Skills => &mut self.skills,
            Section::WorkExperience => &mut self.work_experience,
            Section::Education => &mut self.education,
            Section::PersonalDetails => &mut self.personal_details,
        }
    }

    /// Flip one flag and return its new value
    pub fn toggle(&mut self, section: Section) -> bool {
        let flag = self.flag_mut(section);
        *flag = !*flag;
        *flag
    }

    pub fn set(&mut self, section: Section, visible: bool) {
        *self.flag_mut(section) = visible;
    }
}

/// A complete resume.
///
/// `Default` is the zero-value document: every text field empty, every list
/// empty and every section visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    pub personal_details: PersonalDetails,
    pub section_visibility: SectionVisibility,
}

impl ResumeDocument {
    /// Check that ids are unique within each list.
    pub fn validate_ids(&self) -> Result<()> {
        check_unique("workExperience", self.work_experience.iter().map(|e| e.id.as_str()))?;
        check_unique("education", self.education.iter().map(|e| e.id.as_str()))?;
        check_unique("skills", self.skills.iter().map(|s| s.id.as_str()))?;
        Ok(())
    }
}

fn check_unique<'a>(list: &str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::DuplicateEntryId {
                list: list.to_string(),
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

/// A partial document. Fields left as `None` keep their current value when
/// the patch is merged; present fields replace the whole top-level value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_info: Option<PersonalInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_experience: Option<Vec<WorkExperience>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<Education>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Skill>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_details: Option<PersonalDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_visibility: Option<SectionVisibility>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        *self == DocumentPatch::default()
    }

    /// Shallow-merge into `doc`.
    pub fn merge_into(self, doc: &mut ResumeDocument) {
        if let Some(v) = self.personal_info {
            doc.personal_info = v;
        }
        if let Some(v) = self.summary {
            doc.summary = v;
        }
        if let Some(v) = self.work_experience {
            doc.work_experience = v;
        }
        if let Some(v) = self.education {
            doc.education = v;
        }
        if let Some(v) = self.skills {
            doc.skills = v;
        }
        if let Some(v) = self.personal_details {
            doc.personal_details = v;
        }
        if let Some(v) = self.section_visibility {
            doc.section_visibility = v;
        }
    }

    /// The document `doc` would become, without touching it.
    pub fn merged(self, doc: &ResumeDocument) -> ResumeDocument {
        let mut next = doc.clone();
        self.merge_into(&mut next);
        next
    }

    pub fn summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            ..Self::default()
        }
    }

    pub fn personal_info(info: PersonalInfo) -> Self {
        Self {
            personal_info: Some(info),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(id: &str, name: &str) -> Skill {
        Skill { id: id.into(), name: name.into(), category: "Languages".into() }
    }

    #[test]
    fn test_default_document_shape() {
        let json = serde_json::to_value(ResumeDocument::default()).unwrap();

        assert_eq!(json["personalInfo"]["fullName"], "");
        assert_eq!(json["personalDetails"]["fatherName"], "");
        assert_eq!(json["sectionVisibility"]["workExperience"], true);
        assert!(json["personalInfo"].get("location").is_none());
        assert_eq!(json["skills"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_patch_preserves_untouched_fields() {
        let mut doc = ResumeDocument::default();
        doc.skills.push(skill("1", "Rust"));

        DocumentPatch::summary("Systems engineer").merge_into(&mut doc);

        assert_eq!(doc.summary, "Systems engineer");
        assert_eq!(doc.skills.len(), 1);
        assert!(doc.section_visibility.summary);
    }

    #[test]
    fn test_toggle_flips_only_one_flag() {
        let mut vis = SectionVisibility::default();
        assert!(!vis.toggle(Section::Skills));
        assert!(!vis.skills);
        assert!(vis.summary && vis.work_experience && vis.education && vis.personal_details);
        assert!(vis.toggle(Section::Skills));
    }

    #[test]
    fn test_section_parsing() {
        assert_eq!("workExperience".parse::<Section>().unwrap(), Section::WorkExperience);
        assert_eq!("personal_details".parse::<Section>().unwrap(), Section::PersonalDetails);
        assert_eq!("personal-details".parse::<Section>().unwrap(), Section::PersonalDetails);
        assert!("hobbies".parse::<Section>().is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut doc = ResumeDocument::default();
        doc.skills = vec![skill("1", "Rust"), skill("1", "Go")];

        let err = doc.validate_ids().unwrap_err();
        assert!(matches!(err, Error::DuplicateEntryId { ref list, .. } if list == "skills"));
    }

    #[test]
    fn test_work_experience_round_trips_camel_case() {
        let json = serde_json::json!({
            "id": "w1",
            "company": "Acme",
            "role": "Engineer",
            "startDate": "2020-01",
            "endDate": "",
            "current": true,
            "projects": ["Built the thing"]
        });
        let exp: WorkExperience = serde_json::from_value(json).unwrap();
        assert!(exp.current);
        assert_eq!(exp.start_date, "2020-01");
        assert!(exp.description.is_none());
    }

    #[test]
    fn test_personal_details_entries_skip_blank() {
        let details = PersonalDetails {
            nationality: Some("Indian".into()),
            ..PersonalDetails::default()
        };
        assert_eq!(details.entries(), vec![("Nationality", "Indian")]);
    }
}
