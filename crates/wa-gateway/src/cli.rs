//! Command line interface.

use std::path::PathBuf;

use clap::Parser;

use wa_gateway_core::{Result, ServerConfig};

/// REST gateway for multi-session WhatsApp Web clients
#[derive(Debug, Parser)]
#[command(name = "wa-gateway", version, about)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "WA_GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory holding per-session credentials
    #[arg(long, env = "WA_GATEWAY_DATA_PATH")]
    pub data_path: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Load the configuration file (or defaults) and apply overrides.
    pub fn load_config(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(data_path) = &self.data_path {
            config.auth.data_path = data_path.clone();
        }
        if let Some(log_level) = &self.log_level {
            config.server.log_level = log_level.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_flags() {
        let cli = Cli::try_parse_from(["wa-gateway"]).unwrap();
        let config = Cli {
            port: None,
            host: None,
            ..cli
        }
        .load_config()
        .unwrap();
        assert_eq!(config.auth.data_path, PathBuf::from("./.wwebjs_auth"));
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server:\n  port: 8080\n  max_sessions: 3\nauth:\n  data_path: /var/lib/wa"
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "wa-gateway",
            "--config",
            file.path().to_str().unwrap(),
            "--port",
            "9090",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.max_sessions, 3);
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.auth.data_path, PathBuf::from("/var/lib/wa"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = Cli::try_parse_from(["wa-gateway", "--port", "0"]).unwrap();
        assert!(cli.load_config().is_err());
    }
}
