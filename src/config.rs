//! Application-level configuration loading: listening port and storage backend selection.

use std::{env, fmt, fs, io::ErrorKind, path::PathBuf, str::FromStr};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAME_REVIEWS_BACK_CONFIG_PATH";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
const DEFAULT_COUCH_URL: &str = "http://localhost:5984";
const DEFAULT_DATABASE: &str = "game_reviews";

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// TCP port the HTTP server listens on.
    pub port: u16,
    /// Backend selection and connection settings.
    pub storage: StorageConfig,
}

/// Which document store holds the games and reviews.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// MongoDB, reached through `mongo_uri`.
    Mongo,
    /// CouchDB, reached through `couch_base_url`.
    Couch,
    /// Process-local store, lost on restart.
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageBackend::Mongo => "mongo",
            StorageBackend::Couch => "couch",
            StorageBackend::Memory => "memory",
        })
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "couch" | "couchdb" => Ok(StorageBackend::Couch),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend `{other}`")),
        }
    }
}

/// Settings for every supported backend; only those of `backend` are used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Backend selected at startup.
    pub backend: StorageBackend,
    /// MongoDB connection string.
    pub mongo_uri: String,
    /// MongoDB database name.
    pub mongo_db: String,
    /// CouchDB server URL.
    pub couch_base_url: String,
    /// CouchDB database name.
    pub couch_db: String,
    /// Optional CouchDB basic-auth user.
    pub couch_username: Option<String>,
    /// Optional CouchDB basic-auth password.
    pub couch_password: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Mongo,
            mongo_uri: DEFAULT_MONGO_URI.to_owned(),
            mongo_db: DEFAULT_DATABASE.to_owned(),
            couch_base_url: DEFAULT_COUCH_URL.to_owned(),
            couch_db: DEFAULT_DATABASE.to_owned(),
            couch_username: None,
            couch_password: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            storage: StorageConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load the configuration file, falling back to defaults, then apply environment overrides.
    pub fn load() -> Self {
        let raw = read_config_file();
        Self::from_sources(raw, |key| env::var(key).ok())
    }

    /// Merge the file contents with the variables returned by `lookup`; variables win.
    fn from_sources(raw: RawConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(port) = raw.port {
            config.port = port;
        }
        raw.storage.apply_to(&mut config.storage);

        if let Some(value) = lookup("PORT").or_else(|| lookup("SERVER_PORT")) {
            match value.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(err) => {
                    warn!(value = %value, error = %err, "ignoring invalid port override")
                }
            }
        }

        if let Some(value) = lookup("STORAGE_BACKEND") {
            match value.parse::<StorageBackend>() {
                Ok(backend) => config.storage.backend = backend,
                Err(err) => warn!(
                    value = %value,
                    error = %err,
                    "ignoring invalid storage backend override"
                ),
            }
        }

        let storage = &mut config.storage;
        for (key, slot) in [
            ("MONGO_URI", &mut storage.mongo_uri),
            ("MONGO_DB", &mut storage.mongo_db),
            ("COUCH_BASE_URL", &mut storage.couch_base_url),
            ("COUCH_DB", &mut storage.couch_db),
        ] {
            if let Some(value) = lookup(key).filter(|value| !value.is_empty()) {
                *slot = value;
            }
        }
        if let Some(username) = lookup("COUCH_USERNAME") {
            storage.couch_username = Some(username);
        }
        if let Some(password) = lookup("COUCH_PASSWORD") {
            storage.couch_password = Some(password);
        }

        config
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    port: Option<u16>,
    storage: RawStorage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawStorage {
    backend: Option<StorageBackend>,
    mongo_uri: Option<String>,
    mongo_db: Option<String>,
    couch_base_url: Option<String>,
    couch_db: Option<String>,
    couch_username: Option<String>,
    couch_password: Option<String>,
}

impl RawStorage {
    fn apply_to(self, storage: &mut StorageConfig) {
        if let Some(backend) = self.backend {
            storage.backend = backend;
        }
        if let Some(uri) = self.mongo_uri {
            storage.mongo_uri = uri;
        }
        if let Some(db) = self.mongo_db {
            storage.mongo_db = db;
        }
        if let Some(url) = self.couch_base_url {
            storage.couch_base_url = url;
        }
        if let Some(db) = self.couch_db {
            storage.couch_db = db;
        }
        storage.couch_username = self.couch_username.or(storage.couch_username.take());
        storage.couch_password = self.couch_password.or(storage.couch_password.take());
    }
}

fn read_config_file() -> RawConfig {
    let path = resolve_config_path();
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
            Ok(raw) => {
                info!(path = %path.display(), "loaded configuration file");
                raw
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config; falling back to defaults"
                );
                RawConfig::default()
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(
                path = %path.display(),
                "config file not found; using built-in defaults"
            );
            RawConfig::default()
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to read config; falling back to defaults"
            );
            RawConfig::default()
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
