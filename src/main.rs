mod config;
mod cors;
mod http_client;
mod proxy_service;
mod server;
mod static_files;
mod std_logger;
#[cfg(test)]
mod test_support;

use std::io::{Error, ErrorKind, Result};

use clap::Parser;

use config::{Cli, ServerConfig};

#[actix_web::main]
async fn main() -> Result<()> {
  let config = ServerConfig::from_cli(Cli::parse())?;

  std_logger::init(config.log_level).map_err(|error| Error::new(ErrorKind::Other, error.to_string()))?;

  server::run(config).await
}
