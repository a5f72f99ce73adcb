use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::editor::history::DEFAULT_MAX_VERSIONS;
use crate::error::{EditorError, Result};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Http,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Directory for the file backend. Defaults to `documents/` next to the config.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EditorConfig {
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,
    #[serde(default = "default_user_name")]
    pub user_name: String,
    /// Saved versions kept per open document.
    #[serde(default = "default_max_versions")]
    pub max_versions: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: default_save_debounce_ms(),
            user_name: default_user_name(),
            max_versions: default_max_versions(),
        }
    }
}

impl EditorConfig {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub theme: Theme,
}

fn default_save_debounce_ms() -> u64 {
    1000
}

fn default_user_name() -> String {
    "me".into()
}

fn default_max_versions() -> usize {
    DEFAULT_MAX_VERSIONS
}

impl AppConfig {
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::defaults()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("BLOCKDOC_").split("__").lowercase(true))
            .extract()
            .map_err(|e| EditorError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.store.backend == StoreBackend::Http && self.store.url.is_empty() {
            return Err(EditorError::Config(
                "store.url is required for the http backend".into(),
            ));
        }
        if self.editor.save_debounce_ms == 0 {
            return Err(EditorError::Config(
                "editor.save_debounce_ms must be greater than 0".into(),
            ));
        }
        if self.editor.max_versions == 0 {
            return Err(EditorError::Config(
                "editor.max_versions must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn config_dir() -> Option<PathBuf> {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(|xdg| PathBuf::from(xdg).join("blockdoc"))
            .or_else(|| {
                directories::BaseDirs::new()
                    .map(|dirs| dirs.home_dir().join(".config").join("blockdoc"))
            })
    }

    /// Where the file backend keeps documents.
    pub fn documents_dir(&self) -> PathBuf {
        self.store.dir.clone().unwrap_or_else(|| {
            Self::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("documents")
        })
    }

    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = r#"[store]
backend = "file"  # file | http
# dir = "/path/to/documents"  # file backend, defaults to ./documents next to this file
# url = "https://docs.example.com/api"  # http backend
# token = ""  # or set BLOCKDOC_STORE__TOKEN env var

[editor]
save_debounce_ms = 1000
user_name = "me"
max_versions = 50

[ui]
theme = "dark"  # dark | light
"#;

        std::fs::write(path, content)?;
        Ok(())
    }

    fn defaults() -> Self {
        Self {
            store: StoreConfig::default(),
            editor: EditorConfig::default(),
            ui: UiConfig::default(),
        }
    }
}
