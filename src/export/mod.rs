//! Export Framework
//!
//! A renderer turns a finished document plus its template into bytes in one
//! format. PDF and DOCX renderers live outside this crate and plug in through
//! [`Renderer`]; plain text and JSON are built in.
//!
//! Every renderer works from the same [`layout::Layout`], so section
//! visibility is honored in one place.

pub mod layout;
pub mod text;

use crate::document::ResumeDocument;
use crate::profile::Template;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use layout::{Block, Header, Layout, LayoutSection};
pub use text::{JsonRenderer, TextRenderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
    Text,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Text => "text/plain; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" | "word" => Ok(ExportFormat::Docx),
            "text" | "txt" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Rendered bytes plus what a caller needs to save or serve them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime: &'static str,
}

/// `<full name>_resume.<ext>` with inner whitespace runs collapsed to `_`.
/// Leading and trailing whitespace is dropped rather than mapped to `_`,
/// so a blank or all-space name becomes `resume`.
pub fn suggested_filename(document: &ResumeDocument, format: ExportFormat) -> String {
    let name = document
        .personal_info
        .full_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    let stem = if name.is_empty() { "resume" } else { name.as_str() };
    format!("{}_resume.{}", stem, format.extension())
}

/// Trait for export renderers
pub trait Renderer: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn render(&self, document: &ResumeDocument, template: Template) -> Result<Vec<u8>>;
}

/// Registry of renderers, one per format
#[derive(Default)]
pub struct Exporter {
    renderers: Vec<Box<dyn Renderer>>,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer, replacing any earlier one for the same format
    pub fn register(&mut self, renderer: impl Renderer + 'static) {
        let format = renderer.format();
        self.renderers.retain(|r| r.format() != format);
        self.renderers.push(Box::new(renderer));
    }

    pub fn find_renderer(&self, format: ExportFormat) -> Option<&dyn Renderer> {
        self.renderers
            .iter()
            .find(|r| r.format() == format)
            .map(|r| r.as_ref())
    }

    pub fn formats(&self) -> Vec<ExportFormat> {
        self.renderers.iter().map(|r| r.format()).collect()
    }

    pub fn export(
        &self,
        document: &ResumeDocument,
        template: Template,
        format: ExportFormat,
    ) -> Result<ExportArtifact> {
        let renderer = self
            .find_renderer(format)
            .ok_or_else(|| Error::UnsupportedFormat(format.to_string()))?;
        let bytes = renderer.render(document, template)?;
        tracing::debug!("rendered {} export ({} bytes)", format, bytes.len());
        Ok(ExportArtifact {
            bytes,
            filename: suggested_filename(document, format),
            mime: format.mime(),
        })
    }
}

/// Exporter with the built-in text and JSON renderers
pub fn default_exporter() -> Exporter {
    let mut exporter = Exporter::new();
    exporter.register(TextRenderer);
    exporter.register(JsonRenderer);
    exporter
}
