//! Runtime configuration read from the environment (and `.env`).

use std::path::PathBuf;
use std::time::Duration;

use crate::vfs::{EngineOptions, HydrationPolicy, DEFAULT_DEBOUNCE};

/// REST path of the filesystem snapshot, relative to the remote base URL.
pub const SNAPSHOT_ENDPOINT: &str = "/api/fs";
/// REST path of the recycle-bin side-table.
pub const RECYCLE_ENDPOINT: &str = "/api/recycle";

/// Where snapshots live and how the engine behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory for local JSON stores and the remote cache.
    pub data_dir: PathBuf,
    /// Base URL of the game API; local files are used when unset.
    pub remote_url: Option<String>,
    /// Session JWT sent as a bearer token.
    pub token: Option<String>,
    /// Home directory name for a fresh tree.
    pub user: String,
    /// Debounce window for persists.
    pub debounce: Duration,
    /// Conflict rule for late hydration.
    pub hydration: HydrationPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".retrofs"),
            remote_url: None,
            token: None,
            user: "guest".into(),
            debounce: DEFAULT_DEBOUNCE,
            hydration: HydrationPolicy::default(),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads `RETROFS_*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error string if a variable holds an unparseable value.
    pub fn from_env() -> Result<Self, String> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error string if a variable holds an unparseable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let debounce = match get("RETROFS_DEBOUNCE_MS") {
            Some(raw) => Duration::from_millis(
                raw.trim().parse().map_err(|e| format!("Invalid RETROFS_DEBOUNCE_MS {raw:?}: {e}"))?,
            ),
            None => defaults.debounce,
        };
        let hydration = match get("RETROFS_HYDRATION") {
            Some(raw) => raw.trim().parse()?,
            None => defaults.hydration,
        };

        Ok(Self {
            data_dir: get("RETROFS_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            remote_url: get("RETROFS_REMOTE_URL").map(|url| url.trim_end_matches('/').to_string()),
            token: get("RETROFS_TOKEN"),
            user: get("RETROFS_USER").unwrap_or(defaults.user),
            debounce,
            hydration,
        })
    }

    /// Engine settings derived from this config.
    #[must_use]
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions { debounce: self.debounce, hydration: self.hydration, user: self.user.clone() }
    }

    /// Local file holding (or caching) the filesystem snapshot.
    #[must_use]
    pub fn snapshot_file(&self) -> PathBuf {
        self.data_dir.join("fs.json")
    }

    /// Local file holding (or caching) the recycle-bin side-table.
    #[must_use]
    pub fn recycle_file(&self) -> PathBuf {
        self.data_dir.join("recycle.json")
    }

    /// Full URL of a remote endpoint, if a remote is configured.
    #[must_use]
    pub fn remote_endpoint(&self, endpoint: &str) -> Option<String> {
        self.remote_url.as_ref().map(|base| format!("{base}{endpoint}"))
    }
}
