use std::path::Path;
use std::sync::Arc;

use actix_web::{guard, web, App, HttpServer};
use log::info;
use reqwest::Client;

use crate::config::ServerConfig;
use crate::cors;
use crate::proxy_service::proxy_factory::proxy_route;
use crate::static_files::{self, StaticRoot};

/// Route table shared by every worker: `OPTIONS` anywhere is a preflight,
/// `GET /proxy/...` is relayed, everything else goes to the file tree.
pub fn routes(http_client: Client, root: Arc<Path>) -> impl FnOnce(&mut web::ServiceConfig) {
  move |cfg| {
    cfg
      .app_data(web::Data::new(StaticRoot(root)))
      .service(
        web::resource("/{any:.*}")
          .guard(guard::Options())
          .to(cors::preflight),
      )
      .service(proxy_route(http_client))
      .default_service(web::to(static_files::serve));
  }
}

pub async fn run(config: ServerConfig) -> std::io::Result<()> {
  let ServerConfig {
    bind,
    port,
    root,
    workers,
    upstream,
    ..
  } = config;

  let http_client = upstream
    .to_client()
    .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;

  let server = {
    let root = root.clone();
    HttpServer::new(move || App::new().configure(routes(http_client.clone(), root.clone())))
      .workers(workers)
      .bind((bind.as_str(), port))?
  };

  info!("Serving HTTP on port {} from directory {}", port, root.display());
  info!("Open http://localhost:{}", port);

  server.run().await
}
