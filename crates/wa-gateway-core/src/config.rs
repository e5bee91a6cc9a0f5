//! Configuration types for wa-gateway.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Error;

/// Server configuration loaded from YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Server settings
    pub server: ServerSettings,
    /// Credential storage settings
    pub auth: AuthSettings,
    /// Client driver settings
    pub driver: DriverSettings,
    /// Rate limiting settings
    pub rate_limit: RateLimitSettings,
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: ServerConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be > 0".to_string()));
        }

        if self.server.max_sessions == 0 {
            return Err(Error::Config("server.max_sessions must be > 0".to_string()));
        }

        if self.auth.data_path.as_os_str().is_empty() {
            return Err(Error::Config("auth.data_path cannot be empty".to_string()));
        }

        if self.driver.command.trim().is_empty() {
            return Err(Error::Config("driver.command cannot be empty".to_string()));
        }

        if self.rate_limit.enabled
            && (self.rate_limit.window_secs == 0 || self.rate_limit.max_requests == 0)
        {
            return Err(Error::Config(
                "rate_limit.window_secs and rate_limit.max_requests must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Maximum accepted request body size
    pub body_limit_bytes: usize,
    /// Maximum number of concurrent sessions
    pub max_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            body_limit_bytes: 50 * 1024 * 1024,
            max_sessions: 50,
        }
    }
}

/// Credential storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Root directory holding one `session-<id>` directory per session
    pub data_path: PathBuf,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./.wwebjs_auth"),
        }
    }
}

impl AuthSettings {
    /// Credential directory owned by one session.
    pub fn session_dir(&self, session_id: &crate::SessionId) -> PathBuf {
        self.data_path.join(format!("session-{session_id}"))
    }
}

/// Client driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Driver executable
    pub command: String,
    /// Driver arguments
    pub args: Vec<String>,
    /// Run the browser without a window
    pub headless: bool,
    /// Extra browser flags
    pub browser_args: Vec<String>,
    /// Destroy sessions that are not ready after this many seconds (0 = never)
    pub ready_timeout_secs: u64,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            command: "node".to_string(),
            args: vec!["driver/index.js".to_string()],
            headless: true,
            browser_args: [
                "--no-sandbox",
                "--disable-setuid-sandbox",
                "--disable-dev-shm-usage",
                "--disable-accelerated-2d-canvas",
                "--no-first-run",
                "--no-zygote",
                "--disable-gpu",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            ready_timeout_secs: 0,
        }
    }
}

impl DriverSettings {
    /// Script arguments (`*.js`, `*.mjs`, `*.cjs`) that do not exist on disk.
    ///
    /// The driver program is installed separately from the server; a missing
    /// script means no session can start.
    pub fn missing_scripts(&self) -> Vec<PathBuf> {
        self.args
            .iter()
            .map(PathBuf::from)
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("js" | "mjs" | "cjs")
                )
            })
            .filter(|path| !path.exists())
            .collect()
    }
}

/// Rate limiting settings for the `/api` routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Enable rate limiting
    pub enabled: bool,
    /// Window length in seconds
    pub window_secs: u64,
    /// Requests allowed per client address per window
    pub max_requests: u32,
    /// Identify clients by `X-Forwarded-For` / `X-Real-IP`
    pub trust_proxy: bool,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 15 * 60,
            max_requests: 1000,
            trust_proxy: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionId;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.max_sessions, 50);
        assert_eq!(config.auth.data_path, PathBuf::from("./.wwebjs_auth"));
        assert!(config.driver.headless);
        assert_eq!(config.driver.browser_args.len(), 7);
        assert_eq!(config.rate_limit.max_requests, 1000);
        assert!(!config.rate_limit.trust_proxy);
    }

    #[test]
    fn test_missing_driver_scripts() {
        let dir = std::env::temp_dir();
        let present = dir.join(format!("wa-gateway-driver-{}.js", std::process::id()));
        std::fs::write(&present, b"").unwrap();
        let absent = dir.join("wa-gateway-no-such-driver.js");

        let settings = DriverSettings {
            args: vec![
                "--inspect".to_string(),
                present.display().to_string(),
                absent.display().to_string(),
            ],
            ..DriverSettings::default()
        };
        assert_eq!(settings.missing_scripts(), vec![absent]);

        std::fs::remove_file(&present).unwrap();
    }

    #[test]
    fn test_config_validation() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_max_sessions() {
        let mut config = ServerConfig::default();
        config.server.max_sessions = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_driver_command() {
        let mut config = ServerConfig::default();
        config.driver.command = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_rate_limit_skips_window_check() {
        let mut config = ServerConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.window_secs = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
server:
  host: 127.0.0.1
  port: 8080
  log_level: debug
  max_sessions: 5

auth:
  data_path: /var/lib/wa-gateway

driver:
  command: /usr/bin/node
  args: [bridge.js]
  headless: false
  ready_timeout_secs: 120

rate_limit:
  window_secs: 60
  max_requests: 10
"#;

        let config = ServerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.max_sessions, 5);
        assert_eq!(config.server.body_limit_bytes, 50 * 1024 * 1024);
        assert_eq!(config.auth.data_path, PathBuf::from("/var/lib/wa-gateway"));
        assert_eq!(config.driver.args, vec!["bridge.js".to_string()]);
        assert!(!config.driver.headless);
        assert_eq!(config.driver.ready_timeout_secs, 120);
        assert_eq!(config.driver.browser_args.len(), 7);
        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit.max_requests, 10);
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let result = ServerConfig::from_yaml("server: [not, a, map]");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_session_dir_layout() {
        let auth = AuthSettings::default();
        let id = SessionId::parse("s1").unwrap();
        assert_eq!(
            auth.session_dir(&id),
            PathBuf::from("./.wwebjs_auth").join("session-s1")
        );
    }
}
