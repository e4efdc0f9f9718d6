//! Configuration management for scour.
//!
//! Configuration is read from `~/.config/scour/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub render: RenderConfig,
}

/// Tuning for the lightweight HTTP tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds (default: 15)
    pub timeout_secs: u64,

    /// Maximum HTTP redirects to follow (default: 10)
    pub max_redirects: usize,

    /// User agent presented to target sites
    pub user_agent: String,

    /// Accept-Language header value
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_redirects: 10,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Tuning for static content extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Minimum body text length for an extraction to count (default: 200)
    pub min_content_length: usize,

    /// Penalty multiplier applied to text inside links when scoring
    pub link_density_penalty: f32,

    /// Flat penalty for containers whose class/id looks like boilerplate
    pub boilerplate_penalty: f32,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_content_length: 200,
            link_density_penalty: 2.0,
            boilerplate_penalty: 500.0,
        }
    }
}

/// Tuning for the headless-browser tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Navigation timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Settle time after load for dynamic content in milliseconds (default: 1500)
    pub settle_ms: u64,

    /// Maximum concurrent browser pages (default: 4)
    pub max_concurrency: usize,

    /// User agent override for the browser session
    pub user_agent: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout_secs: 30,
            settle_ms: 1500,
            max_concurrency: 4,
            user_agent: Some(FetchConfig::default().user_agent),
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path.
    pub fn load_from(config_path: &PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.clone(),
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/scour/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("scour").join("config.toml"))
    }

    /// Overall wall-clock budget for one request: both tiers plus fixed overhead.
    pub fn request_budget(&self) -> Duration {
        self.fetch.timeout() + self.render.timeout() + Duration::from_secs(5)
    }

    /// Create a config optimized for speed (less patient with slow pages).
    pub fn fast() -> Self {
        Self {
            fetch: FetchConfig {
                timeout_secs: 8,
                ..Default::default()
            },
            render: RenderConfig {
                timeout_secs: 15,
                settle_ms: 500,
                max_concurrency: 8,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Create a config optimized for stubborn pages (slower).
    pub fn thorough() -> Self {
        Self {
            fetch: FetchConfig {
                timeout_secs: 30,
                ..Default::default()
            },
            render: RenderConfig {
                timeout_secs: 60,
                settle_ms: 3000,
                max_concurrency: 2,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# scour configuration

[fetch]
# Request timeout for the lightweight HTTP tier (seconds)
timeout_secs = 15

# Maximum HTTP redirects to follow before giving up
max_redirects = 10

# Presented to target sites; a realistic desktop UA avoids trivial bot blocks
user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
accept_language = "en-US,en;q=0.9"

[extract]
# Minimum body text length for an extraction to count as a success
min_content_length = 200

# Scoring penalties for the readability heuristic
link_density_penalty = 2.0
boilerplate_penalty = 500.0

[render]
# Run the browser without a visible window
headless = true

# Navigation timeout (seconds); on expiry the partial DOM is still used
timeout_secs = 30

# Extra wait after load so client-side content can populate (milliseconds)
settle_ms = 1500

# Maximum concurrent browser pages
max_concurrency = 4
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.fetch.timeout_secs, 15);
        assert_eq!(config.extract.min_content_length, 200);
        assert_eq!(config.render.max_concurrency, 4);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[render]
headless = false
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        // Custom value
        assert!(!config.render.headless);
        // Default values
        assert_eq!(config.render.timeout_secs, 30);
        assert_eq!(config.fetch.max_redirects, 10);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.fetch.timeout_secs, 15);
        assert_eq!(config.extract.min_content_length, 200);
    }

    #[test]
    fn test_request_budget_covers_both_tiers() {
        let config = Config::default();
        assert!(config.request_budget() > config.fetch.timeout() + config.render.timeout());
    }

    #[test]
    fn test_presets() {
        let fast = Config::fast();
        assert_eq!(fast.fetch.timeout_secs, 8);
        assert_eq!(fast.render.settle_ms, 500);

        let thorough = Config::thorough();
        assert_eq!(thorough.render.timeout_secs, 60);
        assert_eq!(thorough.render.max_concurrency, 2);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[fetch]\ntimeout_secs = 3\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.fetch.timeout_secs, 3);
        assert_eq!(config.render.timeout_secs, 30);
    }
}
