use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::storage::{BackendPreference, StorageConfig};

pub const DATA_DIR: &str = ".resumekit";
pub const DEFAULT_AUTOSAVE_MS: u64 = 500;
pub const DEFAULT_PORT: u16 = 7878;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ResumekitConfig {
    pub backend: Option<BackendPreference>,
    pub database: Option<String>,
    pub kv_dir: Option<String>,
    pub autosave_ms: Option<u64>,
    pub port: Option<u16>,
}

impl ResumekitConfig {
    /// Storage locations, relative paths resolved against `base`
    pub fn storage_config(&self, base: &Path) -> StorageConfig {
        StorageConfig {
            backend: self.backend.unwrap_or_default(),
            database: self
                .database
                .as_deref()
                .map(|p| base.join(p))
                .unwrap_or_else(|| default_database_path_in(base)),
            kv_dir: self
                .kv_dir
                .as_deref()
                .map(|p| base.join(p))
                .unwrap_or_else(|| default_kv_dir_in(base)),
        }
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_ms.unwrap_or(DEFAULT_AUTOSAVE_MS))
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("resumekit.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(DATA_DIR).join("resume.db")
}

pub fn default_kv_dir_in(base: &Path) -> PathBuf {
    base.join(DATA_DIR).join("kv")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ResumekitConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ResumekitConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ResumekitConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = format!("{}/", DATA_DIR);

    let mut content = String::new();
    if gitignore_path.exists() {
        content = std::fs::read_to_string(&gitignore_path)?;
        if content.lines().any(|line| line.trim() == entry) {
            return Ok(());
        }
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
    }
    content.push_str(&entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}
