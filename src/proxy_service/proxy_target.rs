use std::fmt::{Display, Formatter};

use percent_encoding::percent_decode_str;

use crate::proxy_service::proxy_error::ProxyError;
use crate::proxy_service::PROXY_PREFIX;

const ALLOWED_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Upstream URL taken from a `/proxy/` request target.
///
/// Only [`ProxyTarget::parse`] builds one, so holding a value means the
/// scheme was checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
  raw_target: Box<str>,
  url: Box<str>,
}

impl ProxyTarget {
  /// `raw_target` is the inbound path plus query, still percent-encoded.
  /// Everything after the prefix is decoded as one opaque string, so an
  /// encoded `?` becomes part of the upstream URL.
  pub fn parse(raw_target: &str) -> Result<ProxyTarget, ProxyError> {
    let encoded = raw_target.strip_prefix(PROXY_PREFIX).ok_or_else(|| {
      ProxyError::Unexpected(format!("request target '{raw_target}' is outside {PROXY_PREFIX}"))
    })?;
    let url = percent_decode_str(encoded).decode_utf8_lossy();

    if !ALLOWED_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
      return Err(ProxyError::InvalidTargetScheme(url.into_owned()));
    }

    Ok(ProxyTarget {
      raw_target: Box::from(raw_target),
      url: Box::from(url.as_ref()),
    })
  }

  pub fn raw_target(&self) -> &str {
    &self.raw_target
  }

  pub fn url(&self) -> &str {
    &self.url
  }
}

impl Display for ProxyTarget {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.url)
  }
}
