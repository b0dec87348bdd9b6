use actix_web::dev::{HttpServiceFactory, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{guard, web, Error};
use futures_util::future::{ok, Ready};
use log::debug;
use reqwest::Client;

use crate::proxy_service::proxy_route_service::ProxyRouteService;
use crate::proxy_service::PROXY_ROUTE;

/// Hands every worker its own handle to the shared upstream client pool.
#[derive(Clone)]
pub struct ProxyRouteServiceFactory(Client);

impl From<Client> for ProxyRouteServiceFactory {
  fn from(http_client: Client) -> Self {
    Self(http_client)
  }
}

impl ServiceFactory<ServiceRequest> for ProxyRouteServiceFactory {
  type Response = ServiceResponse;
  type Error = Error;
  type Config = ();
  type Service = ProxyRouteService;
  type InitError = ();
  type Future = Ready<Result<Self::Service, Self::InitError>>;

  fn new_service(&self, _: Self::Config) -> Self::Future {
    debug!("proxy service started for {}", PROXY_ROUTE);

    ok(ProxyRouteService {
      http_client: self.0.clone(),
    })
  }
}

/// `GET /proxy/{target}` bound to the relay service. Other methods on the
/// same path are left to the services registered after it.
pub fn proxy_route(http_client: Client) -> impl HttpServiceFactory {
  web::service(PROXY_ROUTE)
    .guard(guard::Get())
    .finish(ProxyRouteServiceFactory::from(http_client))
}
