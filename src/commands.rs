use crate::{OutputMode, emit_success};
use chrono::Utc;
use resumekit::config::{self, ResumekitConfig};
use resumekit::document::Section;
use resumekit::export::{self, ExportFormat};
use resumekit::storage::{BackendKind, BackendPreference, Storage};
use resumekit::ui::{self, Icons, TableBuilder, section, success};
use resumekit::{DocumentPatch, Session, Template};
use std::path::Path;

pub async fn run_init(
    path: &Path,
    backend: Option<&str>,
    force: bool,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let backend: BackendPreference = match backend {
        Some(raw) => raw.parse()?,
        None => BackendPreference::default(),
    };
    let cfg = ResumekitConfig {
        backend: Some(backend),
        ..ResumekitConfig::default()
    };
    config::write_config(path, &cfg, force)?;

    let root = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    config::ensure_gitignore(&root)?;

    let storage_config = cfg.storage_config(&root);
    config::ensure_db_dir(&storage_config.database)?;
    let storage = Storage::open(&storage_config).await?;
    let seeded = storage.ensure_default_profile().await?;

    if backend == BackendPreference::Auto && storage.backend_kind() == BackendKind::KeyValue {
        ui::warn("SQLite unavailable, using the key-value store");
    }

    if output_mode.is_human() {
        ui::header("Initialized resumekit");
        ui::field(Icons::FILE, "Config", &path.display().to_string());
        ui::field(Icons::DATABASE, "Backend", storage.backend_kind().as_str());
        if let Some(id) = seeded {
            ui::field(Icons::NEW, "Created", &format!("Default Profile (#{})", id));
        }
    } else {
        emit_success(output_mode, "init", serde_json::json!({
            "config": path.display().to_string(),
            "backend": storage.backend_kind(),
            "seededProfile": seeded,
        }))?;
    }
    Ok(())
}

pub fn run_profiles(session: &Session, output_mode: OutputMode) -> anyhow::Result<()> {
    if !output_mode.is_human() {
        return emit_success(output_mode, "profiles", serde_json::to_value(session.profiles())?);
    }

    if session.profiles().is_empty() {
        println!("∅ No profiles yet.");
        return Ok(());
    }
    section("Profiles");
    println!(
        "{}",
        ui::profiles_table(session.profiles(), session.current_profile_id(), Utc::now())
    );
    Ok(())
}

pub fn run_show(session: &Session, output_mode: OutputMode) -> anyhow::Result<()> {
    let document = session.document();
    if !output_mode.is_human() {
        return emit_success(output_mode, "show", serde_json::json!({
            "id": session.current_profile_id(),
            "name": session.current_profile_name(),
            "template": session.template(),
            "data": document,
        }));
    }

    ui::profile_banner(session.current_profile_name(), session.template());

    let info = &document.personal_info;
    let mut table = TableBuilder::new();
    table.add_row("Template", session.template().as_str());
    table.add_row("Full name", &info.full_name);
    table.add_row("Email", &info.email);
    table.add_row("Phone", &info.phone);
    if let Some(location) = &info.location {
        table.add_row("Location", location);
    }
    table.add_row("Summary", &truncate(&document.summary, 60));
    table.add_row("Work experience", &document.work_experience.len().to_string());
    table.add_row("Education", &document.education.len().to_string());
    table.add_row("Skills", &document.skills.len().to_string());
    println!("{}", table.build());

    let hidden: Vec<&str> = Section::all()
        .iter()
        .filter(|s| !document.section_visibility.is_visible(**s))
        .map(|s| s.as_str())
        .collect();
    if !hidden.is_empty() {
        ui::note("Hidden sections:", &ui::muted(&hidden.join(", ")));
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut)
}

fn profile_result(session: &Session, output_mode: OutputMode, command: &str, message: &str) -> anyhow::Result<()> {
    if output_mode.is_human() {
        success(message);
        return Ok(());
    }
    emit_success(output_mode, command, serde_json::json!({
        "id": session.current_profile_id(),
        "name": session.current_profile_name(),
        "profiles": session.profiles(),
    }))
}

pub async fn run_create(session: &mut Session, name: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    let id = session.create_new_profile(name).await?;
    let message = format!("{} Created profile '{}' (#{})", Icons::NEW, session.current_profile_name(), id);
    profile_result(session, output_mode, "create", &message)
}

pub async fn run_duplicate(session: &mut Session, name: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    let source = session.current_profile_name().to_string();
    let id = session.duplicate_current_profile(name).await?;
    let message = format!("{} Copied '{}' to '{}' (#{})", Icons::COPY, source, session.current_profile_name(), id);
    profile_result(session, output_mode, "duplicate", &message)
}

pub async fn run_rename(session: &mut Session, name: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    session.rename_current_profile(name).await?;
    let message = format!("{} Renamed profile to '{}'", Icons::MOD, session.current_profile_name());
    profile_result(session, output_mode, "rename", &message)
}

pub async fn run_delete(session: &mut Session, output_mode: OutputMode) -> anyhow::Result<()> {
    let deleted = session.current_profile_name().to_string();
    session.delete_current_profile().await?;
    let message = format!(
        "{} Deleted '{}', now editing '{}'",
        Icons::DEL,
        deleted,
        session.current_profile_name()
    );
    profile_result(session, output_mode, "delete", &message)
}

/// The most recently updated profile is the one a new session opens, so
/// switching saves the target to move it to the top.
pub async fn run_switch(session: &mut Session, id: resumekit::ProfileId, output_mode: OutputMode) -> anyhow::Result<()> {
    session.load_profile(id).await?;
    session.save_now().await?;
    let message = format!("{} Now editing '{}'", Icons::EYE, session.current_profile_name());
    profile_result(session, output_mode, "switch", &message)
}

pub fn run_set(session: &mut Session, raw: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => raw.to_string(),
    };
    let patch: DocumentPatch = serde_json::from_str(&text)?;
    if patch.is_empty() {
        anyhow::bail!("patch does not set any resume field");
    }
    session.update_document(patch)?;
    profile_result(session, output_mode, "set", &format!("{} Updated resume", Icons::MOD))
}

pub fn run_toggle(session: &mut Session, raw: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    let section: Section = raw.parse()?;
    let visible = session.toggle_section_visibility(section);
    if !output_mode.is_human() {
        return emit_success(output_mode, "toggle", serde_json::json!({
            "section": section,
            "visible": visible,
        }));
    }
    let state = if visible { "shown" } else { "hidden" };
    success(&format!("Section {} is now {}", section, state));
    Ok(())
}

pub fn run_template(session: &mut Session, raw: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    let template: Template = raw.parse()?;
    session.set_template(template);
    if !output_mode.is_human() {
        return emit_success(output_mode, "template", serde_json::json!({ "template": template }));
    }
    success(&format!("Template set to {}", template));
    Ok(())
}

pub async fn run_clear(session: &mut Session, output_mode: OutputMode) -> anyhow::Result<()> {
    session.clear_all_data().await?;
    let message = format!("{} Cleared resume '{}'", Icons::DEL, session.current_profile_name());
    profile_result(session, output_mode, "clear", &message)
}

pub fn run_export(
    session: &Session,
    format: &str,
    output: Option<&Path>,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let format: ExportFormat = format.parse()?;
    let exporter = export::default_exporter();
    let artifact = exporter.export(session.document(), session.template(), format)?;

    if output == Some(Path::new("-")) {
        use std::io::Write;
        std::io::stdout().write_all(&artifact.bytes)?;
        return Ok(());
    }

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| artifact.filename.clone().into());
    std::fs::write(&path, &artifact.bytes)?;

    if !output_mode.is_human() {
        return emit_success(output_mode, "export", serde_json::json!({
            "path": path.display().to_string(),
            "format": format,
            "bytes": artifact.bytes.len(),
        }));
    }
    success(&format!("Exported {} to {}", format, path.display()));
    Ok(())
}
