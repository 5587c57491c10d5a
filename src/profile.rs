//! Profiles - named, independently persisted resume documents

use crate::document::ResumeDocument;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Profile identifier. Positive, unique per store.
pub type ProfileId = i64;

pub const DEFAULT_PROFILE_NAME: &str = "Default Profile";

const MIN_NAME_CHARS: usize = 2;
const MAX_NAME_CHARS: usize = 50;

/// Layout strategy applied to a document for preview and export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Classic,
    #[default]
    Modern,
    Minimal,
    Creative,
}

impl Template {
    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Classic => "classic",
            Template::Modern => "modern",
            Template::Minimal => "minimal",
            Template::Creative => "creative",
        }
    }

    pub fn all() -> &'static [Template] {
        &[Template::Classic, Template::Modern, Template::Minimal, Template::Creative]
    }

    /// Lenient parse for stored values: anything unrecognised becomes the
    /// default template.
    pub fn from_stored(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            tracing::warn!("unknown stored template '{}', using {}", raw, Template::default());
            Template::default()
        })
    }
}

impl FromStr for Template {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "classic" => Ok(Template::Classic),
            "modern" => Ok(Template::Modern),
            "minimal" => Ok(Template::Minimal),
            "creative" => Ok(Template::Creative),
            _ => Err(Error::InvalidTemplate(s.to_string())),
        }
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated profile name: trimmed, 2 to 50 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProfileName(String);

impl ProfileName {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidProfileName("Profile name is required".into()));
        }
        let chars = trimmed.chars().count();
        if chars < MIN_NAME_CHARS {
            return Err(Error::InvalidProfileName(
                "Profile name must be at least 2 characters".into(),
            ));
        }
        if chars > MAX_NAME_CHARS {
            return Err(Error::InvalidProfileName(
                "Profile name must be less than 50 characters".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ProfileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// List entry for a profile (no document payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: ProfileId,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

impl ProfileSummary {
    /// Human label for how long ago the profile changed
    pub fn updated_label(&self, now: DateTime<Utc>) -> String {
        relative_age(self.updated_at, now)
    }
}

/// A profile with its document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub data: ResumeDocument,
    pub template: Template,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.id,
            name: self.name.clone(),
            updated_at: self.updated_at,
        }
    }
}

pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - then).num_days().max(0);
    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        d if d < 7 => format!("{} days ago", d),
        d if d < 30 => format!("{} weeks ago", d / 7),
        d if d < 365 => format!("{} months ago", d / 30),
        d => format!("{} years ago", d / 365),
    }
}
