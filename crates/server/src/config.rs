//! Server configuration.
//!
//! Sources, lowest precedence first: built-in defaults, the TOML file named
//! by `--config`, environment variables, command-line flags. Clap resolves
//! the last two, so a flag beats its environment variable.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use clap::Parser;
use roamdb_core::Timestamp;
use serde::Deserialize;
use thiserror::Error;

/// Port used when nothing else is configured.
pub const DEFAULT_PORT: u16 = 80;
/// Archive loaded when nothing else is configured.
pub const DEFAULT_DATA: &str = "/tmp/data/data.zip";
/// Log filter used when neither `--log`, `RUST_LOG` nor the file sets one.
pub const DEFAULT_LOG: &str = "info";

/// Command line of the `roamdb` binary.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "roamdb", version, about = "In-memory travel store over HTTP")]
pub struct Cli {
    /// TOML file with server settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Archive (zip file or directory) to load at startup
    #[arg(long, env = "ROAMDB_DATA", value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Instant ages are computed against, in seconds since the epoch
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub reference_time: Option<Timestamp>,

    /// Log filter, e.g. `info` or `roamdb::store=debug`
    #[arg(long, env = "RUST_LOG", value_name = "FILTER")]
    pub log: Option<String>,

    /// Worker threads of the async runtime
    #[arg(long)]
    pub workers: Option<usize>,
}

/// Errors reading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("cannot read config {path}: {source}")]
    Read {
        /// File that was requested
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`ServerConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Archive loaded at startup
    pub data: PathBuf,
    /// Age reference instant; overrides the archive's `options.txt`
    pub reference_time: Option<Timestamp>,
    /// Log filter directives
    pub log: String,
    /// Worker threads; the runtime default when unset
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data: PathBuf::from(DEFAULT_DATA),
            reference_time: None,
            log: DEFAULT_LOG.to_string(),
            workers: None,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Combine every source into the final settings.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let base = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.overlay(cli))
    }

    fn overlay(mut self, cli: &Cli) -> Self {
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(data) = &cli.data {
            self.data = data.clone();
        }
        if cli.reference_time.is_some() {
            self.reference_time = cli.reference_time;
        }
        if let Some(log) = &cli.log {
            self.log = log.clone();
        }
        if cli.workers.is_some() {
            self.workers = cli.workers;
        }
        self
    }

    /// Address to bind, on all interfaces.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
