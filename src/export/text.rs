//! Built-in plain text and JSON renderers

use super::layout::{Block, Layout};
use super::{ExportFormat, Renderer};
use crate::document::ResumeDocument;
use crate::profile::Template;
use crate::Result;
use std::fmt::Write as _;

/// Plain text, one line per layout element
pub struct TextRenderer;

impl TextRenderer {
    pub fn render_layout(layout: &Layout) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", layout.header.name);
        for line in [&layout.header.contact, &layout.header.links].into_iter().flatten() {
            let _ = writeln!(out, "{}", line);
        }

        for section in &layout.sections {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", section.title);
            let _ = writeln!(out, "{}", "-".repeat(section.title.chars().count()));
            for block in &section.blocks {
                write_block(&mut out, block);
            }
        }
        out
    }
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Paragraph { text } => {
            let _ = writeln!(out, "{}", text);
        }
        Block::Group { label, items } => {
            let _ = writeln!(out, "{}: {}", label, items.join(", "));
        }
        Block::Entry { title, subtitle, dates, description, bullets } => {
            let _ = writeln!(out, "{}", title);
            if !subtitle.is_empty() {
                let _ = writeln!(out, "{}", subtitle);
            }
            let _ = writeln!(out, "{}", dates);
            if let Some(description) = description {
                let _ = writeln!(out, "{}", description);
            }
            for bullet in bullets {
                let _ = writeln!(out, "  • {}", bullet);
            }
        }
        Block::Field { label, value } => {
            let _ = writeln!(out, "{}: {}", label, value);
        }
    }
}

impl Renderer for TextRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Text
    }

    fn render(&self, document: &ResumeDocument, template: Template) -> Result<Vec<u8>> {
        let layout = Layout::build(document, template);
        Ok(Self::render_layout(&layout).into_bytes())
    }
}

/// The layout as pretty-printed JSON, for renderers outside the process
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn render(&self, document: &ResumeDocument, template: Template) -> Result<Vec<u8>> {
        let layout = Layout::build(document, template);
        Ok(serde_json::to_vec_pretty(&layout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Skill;

    fn document() -> ResumeDocument {
        let mut doc = ResumeDocument::default();
        doc.personal_info.full_name = "Jane Doe".into();
        doc.personal_info.email = "jane@example.com".into();
        doc.personal_info.phone = "555-0100".into();
        doc.summary = "Systems engineer.".into();
        doc.skills = vec![Skill { id: "1".into(), name: "Rust".into(), category: "Languages".into() }];
        doc
    }

    #[test]
    fn test_text_output() {
        let bytes = TextRenderer.render(&document(), Template::Modern).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            "Jane Doe\n\
             jane@example.com  •  555-0100\n\
             \n\
             PROFESSIONAL SUMMARY\n\
             --------------------\n\
             Systems engineer.\n\
             \n\
             SKILLS\n\
             ------\n\
             Languages: Rust\n"
        );
    }

    #[test]
    fn test_hidden_summary_not_rendered() {
        let mut doc = document();
        doc.section_visibility.summary = false;

        let text = String::from_utf8(TextRenderer.render(&doc, Template::Minimal).unwrap()).unwrap();
        assert!(!text.contains("Systems engineer."));
        assert!(text.contains("Skills\n------\n"));
    }

    #[test]
    fn test_json_output_is_layout() {
        let bytes = JsonRenderer.render(&document(), Template::Creative).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["template"], "creative");
        assert_eq!(json["header"]["name"], "Jane Doe");
        assert_eq!(json["sections"][0]["section"], "summary");
        assert_eq!(json["sections"][1]["blocks"][0]["kind"], "group");
    }
}
