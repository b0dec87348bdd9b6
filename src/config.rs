use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_client::UpstreamClientConfig;

const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8085;
const DEFAULT_ROOT: &str = ".";
const DEFAULT_WORKER_COUNT: usize = 4;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Serves a directory over HTTP and relays `/proxy/{url}` requests with
/// permissive CORS headers.
#[derive(Parser, Debug, Default)]
#[command(name = "dev_proxy_server", version)]
pub struct Cli {
  /// Address to listen on
  #[arg(long, env = "HTTP_BIND")]
  pub bind: Option<String>,

  #[arg(short, long, env = "HTTP_PORT")]
  pub port: Option<u16>,

  /// Directory served for every path outside /proxy/
  #[arg(short, long, env = "SERVER_ROOT")]
  pub root: Option<PathBuf>,

  #[arg(long, env = "HTTP_WORKER_COUNT")]
  pub workers: Option<usize>,

  /// Upstream timeout in seconds
  #[arg(long = "timeout", env = "PROXY_TIMEOUT_SECS")]
  pub timeout_secs: Option<u64>,

  /// Outbound HTTP or SOCKS proxy used for upstream requests
  #[arg(long, env = "HTTP_PROXY_URL")]
  pub upstream_proxy: Option<String>,

  #[arg(long, env = "HTTP_PROXY_USER")]
  pub upstream_proxy_user: Option<String>,

  #[arg(long, env = "HTTP_PROXY_PASS", hide_env_values = true)]
  pub upstream_proxy_pass: Option<String>,

  /// off, error, warn, info, debug or trace
  #[arg(long, env = "LOG_LEVEL")]
  pub log_level: Option<String>,

  /// YAML file with the same keys; command line and environment win
  #[arg(short, long, env = "SERVER_CONF_LOCATION")]
  pub config: Option<PathBuf>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
  pub bind: Option<String>,
  pub port: Option<u16>,
  pub root: Option<PathBuf>,
  pub workers: Option<usize>,
  pub timeout_secs: Option<u64>,
  pub upstream_proxy: Option<String>,
  pub upstream_proxy_user: Option<String>,
  pub upstream_proxy_pass: Option<String>,
  pub log_level: Option<String>,
}

impl ConfigFile {
  pub fn load_from_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    serde_yaml::from_reader(file).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("cannot read config file {path}: {source}")]
  Read {
    path: PathBuf,
    source: std::io::Error,
  },

  #[error("invalid config file {path}: {source}")]
  Parse {
    path: PathBuf,
    source: serde_yaml::Error,
  },

  #[error("invalid log level '{0}'")]
  LogLevel(String),

  #[error("worker count must be at least 1")]
  NoWorkers,

  #[error("upstream timeout must be at least 1 second")]
  NoTimeout,

  #[error("root directory {path} is not usable: {reason}")]
  Root { path: PathBuf, reason: String },
}

impl From<ConfigError> for std::io::Error {
  fn from(err: ConfigError) -> Self {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
  }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
  pub bind: String,
  pub port: u16,
  pub root: Arc<Path>,
  pub workers: usize,
  pub log_level: LevelFilter,
  pub upstream: UpstreamClientConfig,
}

impl ServerConfig {
  pub fn from_cli(cli: Cli) -> Result<ServerConfig, ConfigError> {
    let file = match &cli.config {
      Some(path) => ConfigFile::load_from_file(path)?,
      None => ConfigFile::default(),
    };

    ServerConfig::merge(cli, file)
  }

  /// Command line and environment values take precedence over the file.
  fn merge(cli: Cli, file: ConfigFile) -> Result<ServerConfig, ConfigError> {
    let log_level = cli
      .log_level
      .or(file.log_level)
      .unwrap_or_else(|| DEFAULT_LOG_LEVEL.into());
    let log_level = LevelFilter::from_str(&log_level).map_err(|_| ConfigError::LogLevel(log_level))?;

    let workers = cli.workers.or(file.workers).unwrap_or(DEFAULT_WORKER_COUNT);
    if workers == 0 {
      return Err(ConfigError::NoWorkers);
    }

    let timeout_secs = cli.timeout_secs.or(file.timeout_secs).unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
      return Err(ConfigError::NoTimeout);
    }

    let root = cli.root.or(file.root).unwrap_or_else(|| DEFAULT_ROOT.into());
    let root = canonical_root(root)?;

    Ok(ServerConfig {
      bind: cli.bind.or(file.bind).unwrap_or_else(|| DEFAULT_BIND.into()),
      port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
      root,
      workers,
      log_level,
      upstream: UpstreamClientConfig {
        timeout: Duration::from_secs(timeout_secs),
        http_proxy: cli.upstream_proxy.or(file.upstream_proxy),
        user: cli.upstream_proxy_user.or(file.upstream_proxy_user),
        pass: cli.upstream_proxy_pass.or(file.upstream_proxy_pass),
      },
    })
  }
}

fn canonical_root(root: PathBuf) -> Result<Arc<Path>, ConfigError> {
  let canonical = root.canonicalize().map_err(|err| ConfigError::Root {
    path: root.clone(),
    reason: err.to_string(),
  })?;

  if !canonical.is_dir() {
    return Err(ConfigError::Root {
      path: root,
      reason: "not a directory".into(),
    });
  }

  Ok(Arc::from(canonical))
}
