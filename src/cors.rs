//! Permissive cross-origin headers attached to proxy responses.

use actix_web::http::header::{
  HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
  ACCESS_CONTROL_ALLOW_ORIGIN,
};
use actix_web::HttpResponse;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Origin, Content-Type, Accept";

/// The full set sent on relayed responses and preflight answers. Error
/// responses only carry the origin header.
pub fn full_set() -> [(HeaderName, HeaderValue); 3] {
  [
    allow_origin(),
    (ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS)),
    (ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS)),
  ]
}

pub fn allow_origin() -> (HeaderName, HeaderValue) {
  (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN))
}

pub fn append_full_set(headers: &mut HeaderMap) {
  for (name, value) in full_set() {
    headers.append(name, value);
  }
}

/// Answers `OPTIONS` on any path without looking at it.
pub async fn preflight() -> HttpResponse {
  let mut response = HttpResponse::Ok().finish();
  append_full_set(response.headers_mut());
  response
}
