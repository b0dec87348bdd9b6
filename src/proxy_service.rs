use actix_web::http::header::HeaderName;

pub mod proxy_error;
pub mod proxy_factory;
pub mod proxy_route_service;
pub mod proxy_target;

pub const PROXY_PREFIX: &str = "/proxy/";

/// Route pattern matching every path under [`PROXY_PREFIX`].
pub const PROXY_ROUTE: &str = "/proxy/{target:.*}";

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
pub const ACCEPT_ANY: &str = "*/*";

/// Framing headers owned by the serving connection, never relayed.
const EXCLUDED_RESPONSE_HEADERS: [&str; 3] = ["content-length", "transfer-encoding", "connection"];

#[inline]
fn is_relayed_header(name: &HeaderName) -> bool {
  let name = name.as_str().to_ascii_lowercase();
  !EXCLUDED_RESPONSE_HEADERS.contains(&name.as_str())
}
