//! Configuration file management for atelier.
//!
//! Provides a TOML-based config file at `~/.config/atelier/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use atelier_cloud::{CloudConfig, HmacKey};

pub const ENV_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
pub const ENV_LOCATION: &str = "ATELIER_LOCATION";
pub const ENV_TEXT_MODEL: &str = "ATELIER_TEXT_MODEL";
pub const ENV_IMAGE_MODEL: &str = "ATELIER_IMAGE_MODEL";
pub const ENV_ACCESS_TOKEN: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
pub const ENV_BUCKET: &str = "ATELIER_BUCKET";
pub const ENV_HMAC_ACCESS_ID: &str = "ATELIER_GCS_HMAC_ACCESS_ID";
pub const ENV_HMAC_SECRET: &str = "ATELIER_GCS_HMAC_SECRET";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub google: GoogleSection,
    #[serde(default)]
    pub storage: StorageSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GoogleSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_model: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmac_access_id: Option<String>,
    /// HMAC secret; the file is written with 0600 permissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmac_secret: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the atelier config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/atelier` or `~/.config/atelier`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("atelier");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("atelier")
}

/// Return the path to the atelier config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Like [`load_config`], but a missing file is `Ok(None)`. A file that exists
/// and does not parse is still an error.
pub fn load_config_if_present() -> Result<Option<ConfigFile>> {
    if !config_path().exists() {
        return Ok(None);
    }
    load_config().map(Some)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Read a non-empty environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve cloud settings from the process environment and config file.
pub fn resolve(cli_project: Option<&str>) -> Result<CloudConfig> {
    let file = load_config_if_present()?.unwrap_or_default();
    resolve_with(cli_project, &file, env_var)
}

/// Resolve using the chain: CLI flag > env var > config file > default.
///
/// - Project: `cli_project` > `GOOGLE_CLOUD_PROJECT` > `google.project` > error
/// - HMAC key: `ATELIER_GCS_HMAC_*` > `storage.hmac_*` > error
/// - Access token: `GOOGLE_OAUTH_ACCESS_TOKEN`, else the metadata server
pub fn resolve_with(
    cli_project: Option<&str>,
    file: &ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> Result<CloudConfig> {
    let pick = |name: &str, from_file: &Option<String>| env(name).or_else(|| from_file.clone());

    let project = match cli_project {
        Some(project) => project.to_owned(),
        None => match pick(ENV_PROJECT, &file.google.project) {
            Some(project) => project,
            None => bail!(
                "project id not found; pass --project, set {ENV_PROJECT}, or run `atelier init`"
            ),
        },
    };

    let access_id = pick(ENV_HMAC_ACCESS_ID, &file.storage.hmac_access_id);
    let secret = pick(ENV_HMAC_SECRET, &file.storage.hmac_secret);
    let (Some(access_id), Some(secret)) = (access_id, secret) else {
        bail!(
            "storage HMAC key not found; set {ENV_HMAC_ACCESS_ID} and {ENV_HMAC_SECRET}, or run `atelier init`"
        );
    };

    let mut config = CloudConfig::new(project, HmacKey::new(access_id, secret));
    if let Some(location) = pick(ENV_LOCATION, &file.google.location) {
        config.location = location;
    }
    if let Some(model) = pick(ENV_TEXT_MODEL, &file.google.text_model) {
        config.text_model = model;
    }
    if let Some(model) = pick(ENV_IMAGE_MODEL, &file.google.image_model) {
        config.image_model = model;
    }
    if let Some(bucket) = pick(ENV_BUCKET, &file.storage.bucket) {
        config.bucket = bucket;
    }
    config.access_token = env(ENV_ACCESS_TOKEN);

    Ok(config)
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
