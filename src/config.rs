//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (later sources override earlier ones):
//! 1. Global `~/.config/tccf/config.toml`
//! 2. Project-local `.tccf.toml` in the current working directory
//! 3. `$TCCF_CONFIG` environment variable (path to config file)
//! 4. `--config <path>`
//! 5. CLI flags (`--org`, `--base-url`, `--token`)
//!
//! Unset values fall back to built-in defaults through the getters.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::folders::manager::ViewMode;
use crate::remote::model::CurrentUser;

// ── Section configs ──────────────────────────────────────────────────────────

/// Backend connection settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// API base URL, e.g. `https://tcc.example.edu/api`.
    pub base_url: Option<String>,
    /// Whole-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
}

/// Signed-in user and page identity.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionConfig {
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Organization whose folders are shown (the page id).
    pub organization_id: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    /// Whether the user may delete folders.
    pub is_admin: Option<bool>,
    /// Where session state files are kept.
    pub state_dir: Option<String>,
}

/// Content pane settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ViewConfig {
    /// View used when the session has none: "list" or "grid".
    pub default_view: Option<String>,
    /// Use nerd font icons (false = ASCII fallback).
    pub use_icons: Option<bool>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub sidebar_fg: Option<String>,
    pub selected_bg: Option<String>,
    pub selected_fg: Option<String>,
    pub folder_fg: Option<String>,
    pub file_fg: Option<String>,
    pub marked_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
    pub dialog_bg: Option<String>,
    pub dialog_border_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub view: ViewConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// ── Config file locator ──────────────────────────────────────────────────────

/// Candidate config files, lowest priority first.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("tccf").join("config.toml"));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".tccf.toml"));
    }

    if let Ok(env_path) = std::env::var("TCCF_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    paths
}

/// Read and parse a TOML config file. Returns `None` if the file doesn't
/// exist or can't be parsed (the latter is logged).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config file");
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                base_url: other.server.base_url.clone().or(self.server.base_url),
                timeout_secs: other.server.timeout_secs.or(self.server.timeout_secs),
                connect_timeout_secs: other
                    .server
                    .connect_timeout_secs
                    .or(self.server.connect_timeout_secs),
            },
            session: SessionConfig {
                token: other.session.token.clone().or(self.session.token),
                organization_id: other
                    .session
                    .organization_id
                    .clone()
                    .or(self.session.organization_id),
                user_id: other.session.user_id.clone().or(self.session.user_id),
                user_name: other.session.user_name.clone().or(self.session.user_name),
                is_admin: other.session.is_admin.or(self.session.is_admin),
                state_dir: other.session.state_dir.clone().or(self.session.state_dir),
            },
            view: ViewConfig {
                default_view: other.view.default_view.clone().or(self.view.default_view),
                use_icons: other.view.use_icons.or(self.view.use_icons),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: other.theme.custom.clone().or(self.theme.custom),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        for path in candidate_paths() {
            if let Some(file_cfg) = load_file(&path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn base_url(&self) -> &str {
        self.server.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.server
                .connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.session
            .organization_id
            .as_deref()
            .filter(|o| !o.is_empty())
    }

    /// The signed-in user. Missing fields give a non-admin anonymous user.
    pub fn current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.session.user_id.clone().unwrap_or_default(),
            name: self
                .session
                .user_name
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            is_admin: self.session.is_admin.unwrap_or(false),
        }
    }

    /// Directory for session state files.
    pub fn state_dir(&self) -> PathBuf {
        match &self.session.state_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .unwrap_or_else(std::env::temp_dir)
                .join("tccf"),
        }
    }

    /// Session file for one organization.
    pub fn session_file(&self, organization_id: &str) -> PathBuf {
        self.state_dir()
            .join("sessions")
            .join(format!("{}.json", sanitize_file_stem(organization_id)))
    }

    /// Initial view mode when the session has none stored.
    pub fn default_view(&self) -> ViewMode {
        match self.view.default_view.as_deref() {
            Some("grid") => ViewMode::Grid,
            _ => ViewMode::List,
        }
    }

    /// Whether to use nerd font icons.
    pub fn use_icons(&self) -> bool {
        self.view.use_icons.unwrap_or(true)
    }
}

fn sanitize_file_stem(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────
