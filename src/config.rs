use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use config::{Config, Environment, File, FileFormat};
use dirs_next::config_dir;
use serde::{Deserialize, Serialize};

use crate::types::{TitleLang, Translation};

pub const ENV_PREFIX: &str = "ANISRC";
pub const DEFAULT_ALLMANGA_URL: &str = "https://allmanga.to";
pub const DEFAULT_ANIZONE_URL: &str = "https://anizone.to";
pub const DEFAULT_JIKAN_URL: &str = "https://api.jikan.moe/v4";

/// User preferences read by the AllManga source.
///
/// Each field mirrors one host preference key:
///
/// | field                 | key                            | default               |
/// |-----------------------|--------------------------------|-----------------------|
/// | `base_url`            | `allmanga_base_url`            | `https://allmanga.to` |
/// | `popular_latest_type` | `allmanga_popular_latest_type` | `["sub"]`             |
/// | `title_lang`          | `allmanga_title_lang`          | `title`               |
/// | `ep_thumbnail`        | `allmanga_pref_ep_thumbnail`   | `true`                |
/// | `ep_description`      | `allmanga_pref_ep_description` | `false`               |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub base_url: String,
    pub popular_latest_type: Vec<Translation>,
    pub title_lang: TitleLang,
    pub ep_thumbnail: bool,
    /// Exposed to the host; the site has no per-episode description to show.
    pub ep_description: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ALLMANGA_URL.to_string(),
            popular_latest_type: vec![Translation::Sub],
            title_lang: TitleLang::Title,
            ep_thumbnail: true,
            ep_description: false,
        }
    }
}

impl Preferences {
    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Type used for the popular and latest listings.
    pub fn listing_type(&self) -> Translation {
        self.popular_latest_type.first().copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AniZoneSettings {
    pub base_url: String,
    pub api_url: String,
    /// Extraction backend; empty means placeholder stream info only.
    pub backend_url: String,
}

impl Default for AniZoneSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ANIZONE_URL.to_string(),
            api_url: DEFAULT_JIKAN_URL.to_string(),
            backend_url: String::new(),
        }
    }
}

impl AniZoneSettings {
    pub fn backend_url(&self) -> Option<&str> {
        let trimmed = self.backend_url.trim().trim_end_matches('/');
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub allmanga: Preferences,
    pub anizone: AniZoneSettings,
}

impl Settings {
    /// Defaults, then the config file (if any), then `ANISRC__*` variables.
    pub fn load(path_override: Option<&Path>) -> Result<Self> {
        let path = match path_override {
            Some(path) => Some(path.to_path_buf()),
            None => settings_path().ok(),
        };
        let mut builder = Config::builder();
        if let Some(path) = &path {
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(path_override.is_some()),
            );
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("allmanga.popular_latest_type")
                .try_parsing(true),
        );
        let settings = builder
            .build()
            .context("failed to read settings")?
            .try_deserialize()
            .context("failed to parse settings")?;
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .context("failed to read settings")?
            .try_deserialize()
            .context("failed to parse settings")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize settings")
    }
}

pub fn settings_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
    Ok(base.join("anisrc").join("config.toml"))
}
