//! Resumekit CLI - manage resume profiles from the terminal

mod commands;

use clap::{Parser, Subcommand};
use resumekit::config::{self, ResumekitConfig};
use resumekit::{ProfileId, Session, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "resumekit")]
#[command(version)]
#[command(about = "Profile-backed resume storage with debounced autosave and export")]
#[command(long_about = r#"
Resumekit keeps named resume profiles in a local store, enabling:
  • Several resumes side by side (one per profile)
  • Partial edits that preserve every untouched field
  • Per-section visibility for exports
  • A local HTTP API for editors and renderers

Example usage:
  resumekit init
  resumekit create "Manager Track"
  resumekit set '{"summary": "Engineering lead with ten years of experience"}'
  resumekit toggle personalDetails
  resumekit export --format text
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the data directory
    Init {
        /// Storage backend (auto, sqlite, kv)
        #[arg(short, long)]
        backend: Option<String>,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// List profiles, most recently updated first
    Profiles,

    /// Show the active profile
    Show,

    /// Create a profile with a blank resume and switch to it
    Create {
        name: String,
    },

    /// Copy the active profile under a new name and switch to it
    Duplicate {
        name: String,
    },

    /// Rename the active profile
    Rename {
        name: String,
    },

    /// Delete the active profile
    Delete,

    /// Make another profile the active one
    Switch {
        id: ProfileId,
    },

    /// Merge a partial resume into the active profile
    Set {
        /// Inline JSON, or @path to a JSON file
        patch: String,
    },

    /// Show or hide a section
    Toggle {
        /// summary, skills, workExperience, education or personalDetails
        section: String,
    },

    /// Choose the layout template
    Template {
        /// classic, modern, minimal or creative
        name: String,
    },

    /// Blank the active resume and drop the pre-profile document
    Clear,

    /// Render the active profile
    Export {
        /// Output format (text, json, pdf, docx)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Destination file ("-" for stdout); defaults to the suggested filename
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the profile API over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let payload = serde_json::json!({
            "success": true,
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    if let Commands::Init { backend, force } = &cli.command {
        let path = cli.config.clone().unwrap_or_else(config::default_config_path);
        return commands::run_init(&path, backend.as_deref(), *force, output_mode).await;
    }

    let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let base = project_root(cli.config.as_deref())?;
    let storage = open_storage(&config, &base).await?;

    if let Commands::Serve { port } = cli.command {
        storage.ensure_default_profile().await?;
        let port = port.unwrap_or_else(|| config.port());
        return resumekit::server::start_server(port, storage).await;
    }

    let mut session = Session::start(storage, config.autosave_delay()).await?;

    let result = match cli.command {
        Commands::Profiles => commands::run_profiles(&session, output_mode),
        Commands::Show => commands::run_show(&session, output_mode),
        Commands::Create { name } => commands::run_create(&mut session, &name, output_mode).await,
        Commands::Duplicate { name } => commands::run_duplicate(&mut session, &name, output_mode).await,
        Commands::Rename { name } => commands::run_rename(&mut session, &name, output_mode).await,
        Commands::Delete => commands::run_delete(&mut session, output_mode).await,
        Commands::Switch { id } => commands::run_switch(&mut session, id, output_mode).await,
        Commands::Set { patch } => commands::run_set(&mut session, &patch, output_mode),
        Commands::Toggle { section } => commands::run_toggle(&mut session, &section, output_mode),
        Commands::Template { name } => commands::run_template(&mut session, &name, output_mode),
        Commands::Clear => commands::run_clear(&mut session, output_mode).await,
        Commands::Export { format, output } => {
            commands::run_export(&session, &format, output.as_deref(), output_mode)
        }
        Commands::Init { .. } | Commands::Serve { .. } => Ok(()),
    };

    // edits are debounced; a one-shot process writes them before exiting
    session.flush().await?;

    if let Err(e) = result {
        resumekit::ui::error(&e.to_string());
        std::process::exit(1);
    }
    Ok(())
}

/// Directory relative config paths are resolved against
fn project_root(config_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    match config_path.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => Ok(std::env::current_dir()?),
    }
}

async fn open_storage(config: &ResumekitConfig, base: &Path) -> anyhow::Result<Arc<Storage>> {
    let storage_config = config.storage_config(base);
    config::ensure_db_dir(&storage_config.database)?;
    Ok(Arc::new(Storage::open(&storage_config).await?))
}
