//! Migration settings and content API credentials.
//!
//! Throttle delays and the page size come from an optional `migrate.toml`; every
//! field has a default so the file may be absent or partial. Source credentials
//! are read from the environment only when a client is built, so a missing
//! variable shows up as a runtime error of the command that needs it.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default location of the settings file
pub const DEFAULT_SETTINGS_PATH: &str = "migrate.toml";

/// Configuration structure representing the entire `migrate.toml` file
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Paging and throttle settings for migration runs
    #[serde(default)]
    pub migration: MigrationSettings,
}

/// Paging and throttle settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MigrationSettings {
    /// Records requested per page from the content API
    pub page_size: u32,
    /// Pause between consecutive page requests
    pub fetch_delay_ms: u64,
    /// Pause between consecutive product writes
    pub product_write_delay_ms: u64,
    /// Pause between consecutive sale writes
    pub sale_write_delay_ms: u64,
    /// Pause between consecutive product creates when replicating to another project
    pub replicate_delay_ms: u64,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            fetch_delay_ms: 100,
            product_write_delay_ms: 50,
            sale_write_delay_ms: 100,
            replicate_delay_ms: 200,
        }
    }
}

impl MigrationSettings {
    /// Settings with every delay set to zero; used by tests and dry runs against local fakes.
    #[must_use]
    pub const fn unthrottled(page_size: u32) -> Self {
        Self {
            page_size,
            fetch_delay_ms: 0,
            product_write_delay_ms: 0,
            sale_write_delay_ms: 0,
            replicate_delay_ms: 0,
        }
    }

    /// Pause between page requests
    #[must_use]
    pub const fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    /// Pause between product writes
    #[must_use]
    pub const fn product_write_delay(&self) -> Duration {
        Duration::from_millis(self.product_write_delay_ms)
    }

    /// Pause between sale writes
    #[must_use]
    pub const fn sale_write_delay(&self) -> Duration {
        Duration::from_millis(self.sale_write_delay_ms)
    }

    /// Pause between product creates in the target project
    #[must_use]
    pub const fn replicate_delay(&self) -> Duration {
        Duration::from_millis(self.replicate_delay_ms)
    }
}

/// Endpoint and token of one content API project.
#[derive(Clone)]
pub struct SourceSettings {
    /// GraphQL endpoint URL
    pub endpoint: String,
    /// Bearer token sent with every request
    pub token: String,
}

impl std::fmt::Debug for SourceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceSettings")
            .field("endpoint", &self.endpoint)
            .field("token", &"****")
            .finish()
    }
}

impl SourceSettings {
    /// Reads `<PREFIX>_ENDPOINT` and `<PREFIX>_TOKEN` from the environment.
    ///
    /// The migration source uses the `HYGRAPH` prefix, the replication target
    /// `HYGRAPH_TARGET`.
    pub fn from_env(prefix: &str) -> Result<Self> {
        Ok(Self {
            endpoint: read_var(&format!("{prefix}_ENDPOINT"))?,
            token: read_var(&format!("{prefix}_TOKEN"))?,
        })
    }
}

fn read_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|source| Error::EnvVar {
        name: name.to_string(),
        source,
    })
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading settings from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path_ref.display()),
    })?;

    parse_settings(&contents)
}

/// Loads settings from `migrate.toml` in the working directory, falling back to
/// defaults when the file does not exist.
pub fn load_default_settings() -> Result<Settings> {
    if Path::new(DEFAULT_SETTINGS_PATH).exists() {
        load_settings(DEFAULT_SETTINGS_PATH)
    } else {
        tracing::debug!("No {DEFAULT_SETTINGS_PATH} found, using default settings");
        Ok(Settings::default())
    }
}

fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {DEFAULT_SETTINGS_PATH}: {e}"),
    })
}
