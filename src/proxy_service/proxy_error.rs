use std::any::Any;
use std::error::Error as _;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use hyper::ext::ReasonPhrase;
use thiserror::Error;

use crate::cors;
use crate::http_client::RedirectLimit;

/// Every way a `/proxy/` request can fail. The `Display` text is the
/// response body sent to the client.
#[derive(Debug, Error)]
pub enum ProxyError {
  #[error("Bad Request: Invalid URL format - {0}")]
  InvalidTargetScheme(String),

  #[error("HTTP Error: {code} {reason}", code = .status.as_u16())]
  UpstreamHttp { status: StatusCode, reason: String },

  #[error("Proxy Error: {0}")]
  Transport(String),

  #[error("Internal Server Error: {0}")]
  Unexpected(String),
}

impl ProxyError {
  /// `phrase` is the reason the upstream sent when it differs from the
  /// canonical one; the canonical phrase is used otherwise.
  pub fn from_status(status: StatusCode, phrase: Option<&ReasonPhrase>) -> Self {
    let reason = match phrase {
      Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
      None => status.canonical_reason().unwrap_or_default().to_owned(),
    };

    ProxyError::UpstreamHttp { status, reason }
  }

  /// Failures while sending: anything before a status line is a transport
  /// failure, except a URL the client could not even build a request for
  /// and a redirect chain cut off by the limit, which reports the refused
  /// redirect's status.
  pub fn from_send(err: reqwest::Error) -> Self {
    if err.is_builder() {
      return ProxyError::Unexpected(err.to_string());
    }

    let redirect_limit = err
      .source()
      .and_then(|source| source.downcast_ref::<RedirectLimit>());
    match redirect_limit {
      Some(limit) => ProxyError::UpstreamHttp {
        status: limit.status,
        reason: limit.to_string(),
      },
      None => ProxyError::Transport(err.to_string()),
    }
  }

  /// Failures while reading the upstream body. Timeout expiry counts as a
  /// transport failure wherever it happens.
  pub fn from_body(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      ProxyError::Transport(err.to_string())
    } else {
      ProxyError::Unexpected(err.to_string())
    }
  }

  pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
      (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
      message.clone()
    } else {
      "proxy handler panicked".to_owned()
    };

    ProxyError::Unexpected(message)
  }
}

impl ResponseError for ProxyError {
  fn status_code(&self) -> StatusCode {
    match self {
      ProxyError::InvalidTargetScheme(_) => StatusCode::BAD_REQUEST,
      ProxyError::UpstreamHttp { status, .. } => *status,
      ProxyError::Transport(_) => StatusCode::BAD_GATEWAY,
      ProxyError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    HttpResponse::build(self.status_code())
      .insert_header(cors::allow_origin())
      .body(self.to_string())
  }
}
