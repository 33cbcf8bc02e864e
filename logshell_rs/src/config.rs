//! Settings: global flags merged over the optional config file.
//!
//! The file lives at `~/.config/logshell/config.toml` and only fills in
//! values the command line left unset. A missing or unparsable file degrades
//! to defaults with a stderr warning, never a hard error.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::colors::ColorMode;

/// Effective global settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub insecure: bool,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub color: ColorMode,
    pub no_interactive: bool,
    /// Hidden: write timing profiles here.
    pub profile_output: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: None,
            user: None,
            password: None,
            token: None,
            insecure: false,
            log_level: "info".to_string(),
            log_file: None,
            color: ColorMode::Auto,
            no_interactive: false,
            profile_output: None,
        }
    }
}

impl Settings {
    /// Credential flags are mutually exclusive in pairs: a token rules out
    /// user/password and vice versa.
    pub fn validate(&self) -> Result<(), String> {
        if self.token.is_some() && (self.user.is_some() || self.password.is_some()) {
            return Err("--token cannot be combined with --user/--password".to_string());
        }
        if self.password.is_some() && self.user.is_none() {
            return Err("--password requires --user".to_string());
        }
        Ok(())
    }

    /// Fill unset fields from the config file.
    pub fn merge_file(&mut self, file: &FileConfig) {
        if self.server.is_none() {
            self.server = file.server.clone();
        }
        if !self.insecure {
            self.insecure = file.insecure;
        }
        if self.log_file.is_none() {
            self.log_file = file.log_file.clone().map(PathBuf::from);
        }
        if let Some(level) = &file.log_level
            && self.log_level == Settings::default().log_level
        {
            self.log_level = level.clone();
        }
        if self.color == ColorMode::Auto
            && let Some(mode) = file.color.as_deref().and_then(ColorMode::parse)
        {
            self.color = mode;
        }
    }
}

/// On-disk configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: Option<String>,
    pub insecure: bool,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    /// auto | always | never
    pub color: Option<String>,
}

impl FileConfig {
    /// Load from the default location, or defaults when absent.
    pub fn load() -> Self {
        match dirs::config_dir() {
            Some(dir) => Self::load_from_path(&dir.join("logshell").join("config.toml")),
            None => Self::default(),
        }
    }

    /// Load from a specific path. Returns defaults if the file is missing
    /// or invalid.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(err) => {
                    eprintln!("[logsh][warn] failed to parse {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                eprintln!("[logsh][warn] failed to read {}: {err}", path.display());
                Self::default()
            }
        }
    }
}
