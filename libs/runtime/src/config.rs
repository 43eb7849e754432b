use anyhow::{Context, Result};
use dbkit::DbConnConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::paths::{resolve_home_dir, resolve_under};

/// Main application configuration with strongly-typed global sections
/// and a flexible per-module configuration bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Core server configuration.
    pub server: ServerConfig,
    /// Database connection (optional; a SQLite file under home_dir by default).
    pub database: Option<DbConnConfig>,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    /// Directory containing per-module YAML files (optional).
    #[serde(default)]
    pub modules_dir: Option<String>,
    /// Per-module configuration bag: module_name → arbitrary JSON/YAML value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub home_dir: String, // will be normalized to absolute path
    pub host: String,
    pub port: u16,
    /// Per-request timeout; 0 disables it.
    #[serde(default)]
    pub timeout_sec: u64,
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    pub file: String,          // "logs/nutrition.log"; empty disables the file
    #[serde(default)]
    pub file_level: String,
    /// Rotated files older than this are removed (used when `max_backups` is unset).
    #[serde(default)]
    pub max_age_days: Option<u32>,
    /// How many rotated files to keep.
    #[serde(default)]
    pub max_backups: Option<usize>,
    /// Rotate once the file grows past this size.
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Empty => platform default resolved by resolve_home_dir():
            // Windows: %APPDATA%/.nutrition-tracker
            // Unix/macOS: $HOME/.nutrition-tracker
            home_dir: String::new(),
            host: "127.0.0.1".to_string(),
            port: 8050,
            timeout_sec: 30,
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/nutrition.log".to_string(),
            file_level: "debug".to_string(),
            max_age_days: Some(7),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

/// Default database: a SQLite file next to the logs, under home_dir.
pub fn default_database_config() -> DbConnConfig {
    DbConnConfig {
        path: Some(PathBuf::from("data/nutrition.db")),
        ..Default::default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: Some(default_database_config()),
            logging: Some(default_logging_config()),
            modules_dir: None,
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    /// Also normalizes `server.home_dir` into an absolute path and creates the directory.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let config_path = config_path.as_ref();
        if !config_path.is_file() {
            anyhow::bail!("config file not found: {}", config_path.display());
        }

        // Optional sections stay None unless YAML/ENV provides them.
        let base = AppConfig {
            server: ServerConfig::default(),
            database: None,
            logging: None,
            modules_dir: None,
            modules: HashMap::new(),
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(config_path))
            // APP__DATABASE__PASSWORD=... maps to database.password
            .merge(Env::prefixed("APP__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

        normalize_home_dir_inplace(&mut config.server)
            .context("Failed to resolve server.home_dir")?;

        if let Some(dir) = config.modules_dir.clone() {
            merge_module_files(&mut config.modules, dir)?;
        }

        Ok(config)
    }

    /// Load configuration from file or fall back to defaults.
    /// Also normalizes `server.home_dir` into an absolute path and creates the directory.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                normalize_home_dir_inplace(&mut c.server)
                    .context("Failed to resolve server.home_dir (defaults)")?;
                Ok(c)
            }
        }
    }

    /// Serialize configuration to YAML.
    /// Literal database secrets are masked; `${VAR}` references are kept.
    pub fn to_yaml(&self) -> Result<String> {
        let mut shown = self.clone();
        if let Some(db) = shown.database.as_mut() {
            if db.password.as_deref().is_some_and(|p| !p.contains("${")) {
                db.password = Some("***".to_string());
            }
            if let Some(dsn) = db.dsn.as_deref().filter(|d| !d.contains("${")) {
                db.dsn = Some(dbkit::redact_credentials_in_dsn(Some(dsn)));
            }
        }
        serde_yaml::to_string(&shown).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            match args.verbose {
                0 => {}
                1 => default_section.console_level = "debug".to_string(),
                _ => default_section.console_level = "trace".to_string(),
            }
        }
    }

    /// Database settings ready for `dbkit::build_db_handle`, with a relative
    /// SQLite `path` resolved under `server.home_dir`.
    pub fn database_config(&self) -> DbConnConfig {
        let mut cfg = self
            .database
            .clone()
            .unwrap_or_else(default_database_config);
        if let Some(path) = cfg.path.take() {
            cfg.path = Some(resolve_under(Path::new(&self.server.home_dir), &path));
        }
        cfg
    }

    /// Typed view of `modules.<name>`; a missing section yields the defaults.
    pub fn module_config<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        match self.modules.get(name) {
            None | Some(serde_json::Value::Null) => Ok(T::default()),
            Some(raw) => serde_json::from_value(raw.clone())
                .with_context(|| format!("invalid configuration for module '{name}'")),
        }
    }
}

/// Command line arguments relevant to configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
}

const DEFAULT_SUBDIR: &str = ".nutrition-tracker";

fn normalize_home_dir_inplace(server: &mut ServerConfig) -> Result<()> {
    let opt = if server.home_dir.trim().is_empty() {
        None
    } else {
        Some(server.home_dir.clone())
    };

    let resolved: PathBuf = resolve_home_dir(opt, DEFAULT_SUBDIR, /*create*/ true)
        .context("home_dir normalization failed")?;

    server.home_dir = resolved.to_string_lossy().to_string();
    Ok(())
}

fn merge_module_files(
    bag: &mut HashMap<String, serde_json::Value>,
    dir: impl AsRef<Path>,
) -> Result<()> {
    use std::fs;
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if ext != "yml" && ext != "yaml" {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let val: serde_yaml::Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid YAML in {}", path.display()))?;
        bag.insert(name.to_string(), serde_json::to_value(val)?);
    }
    Ok(())
}
