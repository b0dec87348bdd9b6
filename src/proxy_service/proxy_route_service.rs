use std::panic::AssertUnwindSafe;

use actix_web::body::BoxBody;
use actix_web::dev::{self, Service, ServiceRequest, ServiceResponse};
use actix_web::http::header::{ACCEPT, USER_AGENT};
use actix_web::{Error, HttpRequest, HttpResponse, ResponseError};
use bytes::Bytes;
use futures_core::future::LocalBoxFuture;
use futures_util::FutureExt;
use hyper::ext::ReasonPhrase;
use log::{debug, error, info, warn};
use reqwest::{Client, RequestBuilder, Response};

use crate::cors;
use crate::proxy_service::proxy_error::ProxyError;
use crate::proxy_service::proxy_target::ProxyTarget;
use crate::proxy_service::{is_relayed_header, ACCEPT_ANY, BROWSER_USER_AGENT};

pub struct ProxyRouteService {
  pub(super) http_client: Client,
}

impl Service<ServiceRequest> for ProxyRouteService {
  type Response = ServiceResponse;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  dev::always_ready!();

  fn call(&self, req: ServiceRequest) -> Self::Future {
    // The inbound body is never forwarded, so the payload is dropped here.
    let (http_request, _) = req.into_parts();
    let client = self.http_client.clone();

    Box::pin(async move {
      let response = AssertUnwindSafe(ProxyRouteService::exec(&client, &http_request))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
          let err = ProxyError::from_panic(panic);
          error!("{}", err);
          err.error_response()
        });

      Ok(ServiceResponse::new(http_request, response))
    })
  }
}

impl ProxyRouteService {
  async fn exec(client: &Client, http: &HttpRequest) -> HttpResponse {
    match ProxyRouteService::relay(client, http).await {
      Ok(response) => response,
      Err(err) => {
        match &err {
          ProxyError::InvalidTargetScheme(_) | ProxyError::UpstreamHttp { .. } => warn!("{}", err),
          ProxyError::Transport(_) | ProxyError::Unexpected(_) => error!("{}", err),
        }
        err.error_response()
      }
    }
  }

  async fn relay(client: &Client, http: &HttpRequest) -> Result<HttpResponse, ProxyError> {
    let raw_target = http
      .uri()
      .path_and_query()
      .map_or_else(|| http.path(), |path_and_query| path_and_query.as_str());
    let target = ProxyTarget::parse(raw_target)?;
    info!("Proxying request to: {}", target);
    debug!("Decoded from request target {}", target.raw_target());

    let upstream = ProxyRouteService::init_request(client, &target)
      .send()
      .await
      .map_err(ProxyError::from_send)?;

    debug!("Upstream response {:?}", &upstream);

    let status = upstream.status();
    if status.is_client_error() || status.is_server_error() {
      let phrase = upstream.extensions().get::<ReasonPhrase>();
      return Err(ProxyError::from_status(status, phrase));
    }

    let response = ProxyRouteService::map_response_head(&upstream);
    let body: Bytes = upstream.bytes().await.map_err(ProxyError::from_body)?;

    Ok(response.set_body(BoxBody::new(body)))
  }

  fn init_request(client: &Client, target: &ProxyTarget) -> RequestBuilder {
    client
      .get(target.url())
      .header(USER_AGENT, BROWSER_USER_AGENT)
      .header(ACCEPT, ACCEPT_ANY)
  }

  fn map_response_head(response: &Response) -> HttpResponse {
    let mut http_response = HttpResponse::new(response.status());
    let headers = http_response.headers_mut();

    cors::append_full_set(headers);

    for (name, value) in response.headers() {
      if is_relayed_header(name) {
        headers.append(name.clone(), value.clone());
      }
    }

    http_response
  }
}
