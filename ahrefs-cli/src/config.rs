//! CLI configuration management
//!
//! Handles the stored API key file and the resolution of the settings used
//! by a single invocation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use ahrefs_core::{BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT_SECS};

use crate::client::ClientConfig;
use crate::format::OutputFormat;

/// File name of the stored configuration in the home directory
pub const CONFIG_FILE_NAME: &str = ".ahrefsrc";

pub const ENV_API_KEY: &str = "AHREFS_API_KEY";
pub const ENV_BASE_URL: &str = "AHREFS_BASE_URL";
pub const ENV_TIMEOUT: &str = "AHREFS_TIMEOUT";

/// Persisted CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    /// Ahrefs API key
    #[serde(default)]
    pub api_key: String,
}

/// The configuration file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.ahrefsrc`
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().context("Cannot determine home directory")?;
        Ok(Self::new(home.join(CONFIG_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration; a missing file is an empty configuration
    pub fn load(&self) -> Result<CliConfig> {
        if !self.path.exists() {
            return Ok(CliConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config file {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", self.path.display()))
    }

    /// Save the configuration, readable by the owner only
    pub fn save(&self, config: &CliConfig) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize CLI config")?;
        write_private(&self.path, content.as_bytes())
            .with_context(|| format!("Failed to write config file {}", self.path.display()))?;

        debug!(path = %self.path.display(), "Saved config file");
        Ok(())
    }

    /// Stored API key, if any
    pub fn api_key(&self) -> Result<Option<String>> {
        let config = self.load()?;
        Ok(Some(config.api_key).filter(|key| !key.is_empty()))
    }
}

fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        // the mode only applies to newly created files
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content)
}

/// Mask an API key for display
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}

/// Settings of a single invocation, resolved once and passed to handlers
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Per-attempt timeout in seconds
    pub timeout: u64,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub format: OutputFormat,
    /// Output file, stdout when unset
    pub output: Option<PathBuf>,
    pub quiet: bool,
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            format: OutputFormat::default(),
            output: None,
            quiet: false,
            dry_run: false,
        }
    }
}

impl Settings {
    /// Create a new builder for constructing settings
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Connection settings for the API client
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_key: self.api_key.clone().unwrap_or_default(),
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout),
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
        }
    }
}

/// Builder for [`Settings`] with validation and priority chain support
///
/// Priority chain (lowest to highest):
/// 1. Defaults
/// 2. Config file
/// 3. Environment variables
/// 4. CLI arguments
///
/// Explicit setters always win. [`with_env_overrides`](Self::with_env_overrides)
/// and [`with_config_file`](Self::with_config_file) only fill values that are
/// still unset, so call them after the CLI setters, environment first.
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<u64>,
    format: OutputFormat,
    output: Option<PathBuf>,
    quiet: bool,
    dry_run: bool,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key; empty keys are ignored
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|key| !key.is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    /// Set base URL (with validation)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        Self::validate_url(&url)?;
        self.base_url = Some(url);
        Ok(self)
    }

    /// Set timeout (with validation)
    pub fn with_timeout(mut self, timeout: u64) -> Result<Self> {
        Self::validate_timeout(timeout)?;
        self.timeout = Some(timeout);
        Ok(self)
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Fill unset values from environment variables; invalid values are skipped
    pub fn with_env_overrides(mut self) -> Self {
        if self.api_key.is_none() {
            if let Ok(key) = std::env::var(ENV_API_KEY) {
                if !key.is_empty() {
                    self.api_key = Some(key);
                }
            }
        }

        if self.base_url.is_none() {
            if let Ok(url) = std::env::var(ENV_BASE_URL) {
                match Self::validate_url(&url) {
                    Ok(()) => self.base_url = Some(url),
                    Err(e) => warn!(variable = ENV_BASE_URL, "Ignoring environment value: {}", e),
                }
            }
        }

        if self.timeout.is_none() {
            if let Ok(raw) = std::env::var(ENV_TIMEOUT) {
                match raw.trim().parse::<u64>() {
                    Ok(timeout) if Self::validate_timeout(timeout).is_ok() => {
                        self.timeout = Some(timeout)
                    }
                    _ => warn!(variable = ENV_TIMEOUT, value = %raw, "Ignoring invalid timeout"),
                }
            }
        }

        self
    }

    /// Fill the API key from the config file if still unset
    pub fn with_config_file(mut self, store: &ConfigStore) -> Self {
        if self.api_key.is_some() {
            return self;
        }

        match store.api_key() {
            Ok(key) => self.api_key = key,
            Err(e) => {
                // If the file can't be loaded, continue without it
                warn!(path = %store.path().display(), "Ignoring config file: {:#}", e);
            }
        }
        self
    }

    /// Build the final settings with validation
    pub fn build(self) -> Result<Settings> {
        let defaults = Settings::default();

        let base_url = self.base_url.unwrap_or(defaults.base_url);
        let timeout = self.timeout.unwrap_or(defaults.timeout);

        // Validate final values
        Self::validate_url(&base_url)?;
        Self::validate_timeout(timeout)?;

        Ok(Settings {
            api_key: self.api_key,
            base_url,
            timeout,
            max_retries: defaults.max_retries,
            retry_delay: defaults.retry_delay,
            format: self.format,
            output: self.output,
            quiet: self.quiet,
            dry_run: self.dry_run,
        })
    }

    /// Validate URL format
    fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(anyhow::anyhow!("Base URL cannot be empty"));
        }

        // Basic URL validation - must start with http:// or https://
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(anyhow::anyhow!("Base URL must start with http:// or https://"));
        }

        Ok(())
    }

    /// Validate timeout value
    fn validate_timeout(timeout: u64) -> Result<()> {
        if timeout == 0 {
            return Err(anyhow::anyhow!("Timeout must be greater than 0"));
        }

        if timeout > 300 {
            return Err(anyhow::anyhow!(
                "Timeout must be less than or equal to 300 seconds"
            ));
        }

        Ok(())
    }
}
