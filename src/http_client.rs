use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use thiserror::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 10;

/// Raised by the redirect policy once [`MAX_REDIRECTS`] hops were followed;
/// keeps the status of the redirect that was refused.
#[derive(Debug, Error)]
#[error("redirect limit of {} exceeded", MAX_REDIRECTS)]
pub struct RedirectLimit {
  pub status: StatusCode,
}

fn redirect_policy() -> Policy {
  Policy::custom(|attempt| {
    if attempt.previous().len() > MAX_REDIRECTS {
      let status = attempt.status();
      attempt.error(RedirectLimit { status })
    } else {
      attempt.follow()
    }
  })
}

/// Settings of the client used for every `/proxy/` exchange.
///
/// The built client keeps no cookies and no idle connections, so nothing
/// learned from one upstream exchange leaks into the next.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamClientConfig {
  pub timeout: Duration,
  pub http_proxy: Option<String>,
  pub user: Option<String>,
  pub pass: Option<String>,
}

impl Default for UpstreamClientConfig {
  fn default() -> Self {
    Self {
      timeout: DEFAULT_TIMEOUT,
      http_proxy: None,
      user: None,
      pass: None,
    }
  }
}

impl UpstreamClientConfig {
  pub fn to_client(self) -> Result<Client, reqwest::Error> {
    let UpstreamClientConfig {
      timeout,
      http_proxy,
      user,
      pass,
    } = self;
    let mut client_builder = reqwest::ClientBuilder::new();

    if let Some(proxy_url) = http_proxy {
      let mut proxy = reqwest::Proxy::all(proxy_url)?;

      if let (Some(user_name), Some(password)) = (user, pass) {
        proxy = proxy.basic_auth(&user_name, &password);
      }

      client_builder = client_builder.proxy(proxy);
    } else {
      client_builder = client_builder.no_proxy();
    }

    let client = client_builder
      .timeout(timeout)
      .pool_max_idle_per_host(0)
      .redirect(redirect_policy())
      .build()?;

    Ok(client)
  }
}
