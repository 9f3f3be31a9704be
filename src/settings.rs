use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::motd::DEFAULT_UTC_OFFSET_MINUTES;
use crate::playback::{DEFAULT_AUTOPLAY_INTERVAL_MS, snap_interval_ms};

pub const CURRENT_VERSION: u32 = 2;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "signboard";
const DECK_FILENAME: &str = "whiteboard.json";
const MESSAGES_FILENAME: &str = "messages.json";

/// Where the active document comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentSourceConfig {
    /// Uploads and the active pointer kept in a local directory
    Local { data_dir: PathBuf },
    /// Signage web backend
    Http { base_url: String },
}

/// Where announcement slides are stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeckSourceConfig {
    Local { path: PathBuf },
    Http { base_url: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_document_source")]
    pub document_source: DocumentSourceConfig,

    #[serde(default = "default_deck_source")]
    pub deck_source: DeckSourceConfig,

    #[serde(default = "default_interval_ms")]
    pub autoplay_interval_ms: u64,

    #[serde(default = "default_interval_ms")]
    pub board_interval_ms: u64,

    #[serde(default = "default_true")]
    pub board_enabled: bool,

    /// Restored at start-up
    #[serde(default)]
    pub tv_mode: bool,

    #[serde(default = "default_idle_hide_ms")]
    pub idle_hide_ms: u64,

    #[serde(default = "default_fullscreen_grace_ms")]
    pub fullscreen_grace_ms: u64,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Page background as `#rrggbb`
    #[serde(default = "default_background")]
    pub background: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_good_locator: Option<String>,

    /// JSON list of `{id, mensagem, referencia}` for the message of the day
    #[serde(default = "default_message_file")]
    pub message_file: PathBuf,

    /// Offset from UTC that decides the message's calendar day
    #[serde(default = "default_message_utc_offset_minutes")]
    pub message_utc_offset_minutes: i32,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_interval_ms() -> u64 {
    DEFAULT_AUTOPLAY_INTERVAL_MS
}

fn default_idle_hide_ms() -> u64 {
    3_000
}

fn default_fullscreen_grace_ms() -> u64 {
    3_000
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_background() -> String {
    "#ffffff".to_string()
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn default_message_file() -> PathBuf {
    default_data_dir().join(MESSAGES_FILENAME)
}

fn default_message_utc_offset_minutes() -> i32 {
    DEFAULT_UTC_OFFSET_MINUTES
}

fn default_document_source() -> DocumentSourceConfig {
    DocumentSourceConfig::Local {
        data_dir: default_data_dir(),
    }
}

fn default_deck_source() -> DeckSourceConfig {
    DeckSourceConfig::Local {
        path: default_data_dir().join(DECK_FILENAME),
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            document_source: default_document_source(),
            deck_source: default_deck_source(),
            autoplay_interval_ms: default_interval_ms(),
            board_interval_ms: default_interval_ms(),
            board_enabled: true,
            tv_mode: false,
            idle_hide_ms: default_idle_hide_ms(),
            fullscreen_grace_ms: default_fullscreen_grace_ms(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            background: default_background(),
            last_good_locator: None,
            message_file: default_message_file(),
            message_utc_offset_minutes: default_message_utc_offset_minutes(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

/// Set by `--config`; wins over the platform config directory
static CONFIG_OVERRIDE: LazyLock<RwLock<Option<PathBuf>>> = LazyLock::new(|| RwLock::new(None));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

fn config_path() -> Option<PathBuf> {
    CONFIG_OVERRIDE
        .read()
        .ok()
        .and_then(|p| p.clone())
        .or_else(preferred_config_path)
}

/// Use `path` instead of the platform config file
pub fn set_config_path(path: PathBuf) {
    if let Ok(mut global) = CONFIG_OVERRIDE.write() {
        *global = Some(path);
    }
}

pub fn load_settings() {
    let Some(path) = config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match parse_settings(&content) {
            Ok((settings, migrated)) => {
                debug!("Loaded settings from {path:?}");
                if migrated {
                    save_settings_to_file(&settings, path);
                }
                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

/// Parse YAML settings, migrating old versions. The flag tells whether a
/// migration happened and the file should be rewritten.
fn parse_settings(content: &str) -> Result<(Settings, bool), serde_yaml::Error> {
    let mut settings: Settings = serde_yaml::from_str(content)?;
    let migrated = settings.version < CURRENT_VERSION;
    if migrated {
        migrate_settings(&mut settings);
    }
    Ok((settings, migrated))
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // v1 accepted any interval; later versions only the fixed set
    if settings.version < 2 {
        settings.autoplay_interval_ms = snap_interval_ms(settings.autoplay_interval_ms);
    }

    settings.version = CURRENT_VERSION;
}

pub fn save_settings() {
    let Some(path) = config_path() else {
        warn!("Could not determine config directory, cannot save settings");
        return;
    };

    if let Ok(settings) = SETTINGS.read() {
        save_settings_to_file(&settings, &path);
    }
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = match serde_yaml::to_string(settings) {
        Ok(yaml) => format!("{SETTINGS_HEADER}{yaml}"),
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

const SETTINGS_HEADER: &str = "\
# Signboard settings
#
# document_source / deck_source: `kind: local` keeps files on this machine,
# `kind: http` talks to the signage web backend at `base_url`.
# autoplay_interval_ms must be one of 5000, 8000, 10000, 15000, 20000.
# message_utc_offset_minutes: -180 is Sao Paulo time.
";

// Public API for accessing/modifying settings

/// Snapshot of the current settings
pub fn get_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn is_tv_mode() -> bool {
    SETTINGS.read().map(|s| s.tv_mode).unwrap_or(false)
}

pub fn set_tv_mode(enabled: bool) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.tv_mode = enabled;
    }
    save_settings();
}

pub fn get_autoplay_interval_ms() -> u64 {
    SETTINGS
        .read()
        .map(|s| snap_interval_ms(s.autoplay_interval_ms))
        .unwrap_or_else(|_| default_interval_ms())
}

pub fn set_autoplay_interval_ms(ms: u64) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.autoplay_interval_ms = snap_interval_ms(ms);
    }
    save_settings();
}

pub fn get_last_good_locator() -> Option<String> {
    SETTINGS
        .read()
        .ok()
        .and_then(|s| s.last_good_locator.clone())
}

pub fn set_last_good_locator(locator: &str) {
    if let Ok(mut settings) = SETTINGS.write() {
        if settings.last_good_locator.as_deref() == Some(locator) {
            return;
        }
        settings.last_good_locator = Some(locator.to_string());
    }
    save_settings();
}
