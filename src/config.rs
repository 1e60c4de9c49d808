//! Configuration for the StratFlow board client.
//!
//! Settings are read from `stratflow.toml` and layered file → environment →
//! CLI. The file is looked up at an explicit `--config` path, else
//! `./stratflow.toml`, else `<config dir>/stratflow/stratflow.toml`; with no
//! file at all the defaults apply.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "http://127.0.0.1:3141"
//! token = "secret"
//! timeout_secs = 10
//!
//! [board]
//! default_board = "core"
//! refetch_on_confirm = true
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "stratflow.toml";

/// Overrides `[api] base_url`.
pub const ENV_API_URL: &str = "STRATFLOW_API_URL";
/// Overrides `[api] token`.
pub const ENV_API_TOKEN: &str = "STRATFLOW_API_TOKEN";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid log format '{}'. Valid values: pretty, json", s),
        }
    }
}

/// Board API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    /// Base URL of the board API (default: "http://127.0.0.1:3141")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:3141".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Board behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSection {
    /// Board used when `--board` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_board: Option<String>,
    /// Refetch the board after a confirmed move (default: true)
    #[serde(default = "default_refetch_on_confirm")]
    pub refetch_on_confirm: bool,
}

fn default_refetch_on_confirm() -> bool {
    true
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            default_board: None,
            refetch_on_confirm: default_refetch_on_confirm(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Level or filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// The complete stratflow.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StratflowToml {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub board: BoardSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl StratflowToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse stratflow.toml")
    }

    /// Load `stratflow.toml` from a directory, or defaults if it has none.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize stratflow.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        match reqwest::Url::parse(&self.api.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => warnings.push(format!(
                "Invalid base_url '{}': scheme '{}' is not http or https",
                self.api.base_url,
                url.scheme()
            )),
            Err(e) => warnings.push(format!("Invalid base_url '{}': {}", self.api.base_url, e)),
        }

        if self.api.timeout_secs == 0 {
            warnings.push("timeout_secs is 0: every request would time out immediately".to_string());
        }

        if !is_valid_log_level(&self.logging.level) {
            warnings.push(format!(
                "Unknown log level '{}': expected one of {} or a filter directive",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        warnings
    }
}

/// Plain levels, or `target=level` directives separated by commas.
fn is_valid_log_level(level: &str) -> bool {
    if level.is_empty() {
        return false;
    }
    level.split(',').all(|directive| {
        let level = directive.rsplit('=').next().unwrap_or(directive).trim();
        LOG_LEVELS.contains(&level.to_lowercase().as_str())
    })
}

/// Where to look for a config file when `--config` is not given.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("stratflow").join(CONFIG_FILE_NAME));
    }
    paths
}

/// Resolved configuration: the file plus environment and CLI overrides.
#[derive(Debug, Clone, Default)]
pub struct StratflowConfig {
    /// Parsed stratflow.toml
    pub toml: StratflowToml,
    /// File the configuration was read from, if any
    pub source: Option<PathBuf>,
    /// CLI override: --api-url
    pub cli_api_url: Option<String>,
    /// CLI override: --board
    pub cli_board: Option<String>,
    /// CLI override: --verbose
    pub verbose: bool,
    /// CLI override: --json-logs
    pub json_logs: bool,
}

impl StratflowConfig {
    /// Load from an explicit path, which must exist, or from the first
    /// default location that does.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let toml = StratflowToml::load(path)?;
            return Ok(Self {
                toml,
                source: Some(path.to_path_buf()),
                ..Self::default()
            });
        }

        for path in default_config_paths() {
            if path.exists() {
                let toml = StratflowToml::load(&path)?;
                return Ok(Self {
                    toml,
                    source: Some(path),
                    ..Self::default()
                });
            }
        }

        Ok(Self::default())
    }

    pub fn with_cli_args(
        mut self,
        api_url: Option<String>,
        board: Option<String>,
        verbose: bool,
        json_logs: bool,
    ) -> Self {
        self.cli_api_url = api_url;
        self.cli_board = board;
        self.verbose = verbose;
        self.json_logs = json_logs;
        self
    }

    /// Base URL (CLI → env → file).
    pub fn api_url(&self) -> String {
        self.cli_api_url
            .clone()
            .or_else(|| non_empty_env(ENV_API_URL))
            .unwrap_or_else(|| self.toml.api.base_url.clone())
    }

    /// Bearer token (env → file).
    pub fn api_token(&self) -> Option<String> {
        non_empty_env(ENV_API_TOKEN).or_else(|| self.toml.api.token.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.toml.api.timeout_secs)
    }

    /// Board id (CLI → file).
    pub fn board_id(&self) -> Option<String> {
        self.cli_board
            .clone()
            .or_else(|| self.toml.board.default_board.clone())
    }

    pub fn require_board(&self) -> Result<String> {
        self.board_id().context(
            "No board selected. Pass --board <ID> or set [board] default_board in stratflow.toml",
        )
    }

    pub fn refetch_on_confirm(&self) -> bool {
        self.toml.board.refetch_on_confirm
    }

    /// Log filter used when RUST_LOG is unset; `--verbose` forces debug.
    pub fn log_level(&self) -> String {
        if self.verbose {
            "debug".to_string()
        } else {
            self.toml.logging.level.clone()
        }
    }

    pub fn log_format(&self) -> LogFormat {
        if self.json_logs {
            LogFormat::Json
        } else {
            self.toml.logging.format
        }
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() -> (Option<String>, Option<String>) {
        let saved = (
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_API_TOKEN).ok(),
        );
        unsafe {
            std::env::remove_var(ENV_API_URL);
            std::env::remove_var(ENV_API_TOKEN);
        }
        saved
    }

    fn restore_env(saved: (Option<String>, Option<String>)) {
        unsafe {
            match saved.0 {
                Some(v) => std::env::set_var(ENV_API_URL, v),
                None => std::env::remove_var(ENV_API_URL),
            }
            match saved.1 {
                Some(v) => std::env::set_var(ENV_API_TOKEN, v),
                None => std::env::remove_var(ENV_API_TOKEN),
            }
        }
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let toml = StratflowToml::parse("").unwrap();
        assert_eq!(toml.api.base_url, "http://127.0.0.1:3141");
        assert_eq!(toml.api.timeout_secs, 10);
        assert!(toml.api.token.is_none());
        assert!(toml.board.default_board.is_none());
        assert!(toml.board.refetch_on_confirm);
        assert_eq!(toml.logging.level, "info");
        assert_eq!(toml.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_parse_full_file() {
        let content = r#"
[api]
base_url = "https://boards.example.com"
token = "abc"
timeout_secs = 3

[board]
default_board = "core"
refetch_on_confirm = false

[logging]
level = "debug"
format = "json"
"#;
        let toml = StratflowToml::parse(content).unwrap();
        assert_eq!(toml.api.base_url, "https://boards.example.com");
        assert_eq!(toml.api.token.as_deref(), Some("abc"));
        assert_eq!(toml.api.timeout_secs, 3);
        assert_eq!(toml.board.default_board.as_deref(), Some("core"));
        assert!(!toml.board.refetch_on_confirm);
        assert_eq!(toml.logging.format, LogFormat::Json);
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_parse_invalid_toml_fails() {
        assert!(StratflowToml::parse("[api\nbase_url=").is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        let err = "xml".parse::<LogFormat>().unwrap_err();
        assert!(err.to_string().contains("Invalid log format"));
    }

    #[test]
    fn test_validate_defaults_clean() {
        assert!(StratflowToml::default().validate().is_empty());
    }

    #[test]
    fn test_validate_bad_scheme() {
        let mut toml = StratflowToml::default();
        toml.api.base_url = "ftp://boards".to_string();
        let warnings = toml.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ftp"));
    }

    #[test]
    fn test_validate_unparseable_url() {
        let mut toml = StratflowToml::default();
        toml.api.base_url = "not a url".to_string();
        assert!(toml.validate()[0].contains("Invalid base_url"));
    }

    #[test]
    fn test_validate_zero_timeout_and_unknown_level() {
        let mut toml = StratflowToml::default();
        toml.api.timeout_secs = 0;
        toml.logging.level = "loud".to_string();
        let warnings = toml.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("timeout_secs")));
        assert!(warnings.iter().any(|w| w.contains("loud")));
    }

    #[test]
    fn test_log_level_directives() {
        assert!(is_valid_log_level("info"));
        assert!(is_valid_log_level("WARN"));
        assert!(is_valid_log_level("stratflow=debug,reqwest=warn"));
        assert!(!is_valid_log_level("stratflow=chatty"));
        assert!(!is_valid_log_level(""));
    }

    #[test]
    fn test_load_and_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut toml = StratflowToml::default();
        toml.board.default_board = Some("ops".to_string());
        toml.api.timeout_secs = 30;
        toml.save(&path).unwrap();

        let loaded = StratflowToml::load(&path).unwrap();
        assert_eq!(loaded.board.default_board.as_deref(), Some("ops"));
        assert_eq!(loaded.api.timeout_secs, 30);
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempdir().unwrap();
        let toml = StratflowToml::load_or_default(dir.path()).unwrap();
        assert_eq!(toml.api.timeout_secs, 10);

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[api]\ntimeout_secs = 4\n").unwrap();
        let toml = StratflowToml::load_or_default(dir.path()).unwrap();
        assert_eq!(toml.api.timeout_secs, 4);
    }

    #[test]
    fn test_discover_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[board]\ndefault_board = \"core\"\n").unwrap();

        let config = StratflowConfig::discover(Some(&path)).unwrap();
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
        assert_eq!(config.board_id().as_deref(), Some("core"));
    }

    #[test]
    fn test_discover_explicit_missing_path_fails() {
        let dir = tempdir().unwrap();
        let err = StratflowConfig::discover(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_api_url_layering() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = clear_env();

        let mut config = StratflowConfig::default();
        config.toml.api.base_url = "http://from-file".to_string();
        assert_eq!(config.api_url(), "http://from-file");

        unsafe { std::env::set_var(ENV_API_URL, "http://from-env") };
        assert_eq!(config.api_url(), "http://from-env");

        let config = config.with_cli_args(Some("http://from-cli".to_string()), None, false, false);
        assert_eq!(config.api_url(), "http://from-cli");

        restore_env(saved);
    }

    #[test]
    fn test_api_token_env_overrides_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = clear_env();

        let mut config = StratflowConfig::default();
        assert!(config.api_token().is_none());
        config.toml.api.token = Some("file-token".to_string());
        assert_eq!(config.api_token().as_deref(), Some("file-token"));

        unsafe { std::env::set_var(ENV_API_TOKEN, "env-token") };
        assert_eq!(config.api_token().as_deref(), Some("env-token"));

        restore_env(saved);
    }

    #[test]
    fn test_board_and_logging_overrides() {
        let mut config = StratflowConfig::default();
        config.toml.board.default_board = Some("file-board".to_string());
        assert_eq!(config.board_id().as_deref(), Some("file-board"));
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.log_format(), LogFormat::Pretty);

        let config = config.with_cli_args(None, Some("cli-board".to_string()), true, true);
        assert_eq!(config.require_board().unwrap(), "cli-board");
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn test_require_board_without_board_fails() {
        let err = StratflowConfig::default().require_board().unwrap_err();
        assert!(err.to_string().contains("--board"));
    }
}
