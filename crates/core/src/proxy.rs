//! Proxy settings for API traffic.
//!
//! A proxy is written as a URL, `scheme://[user@]host:port`, with `http`,
//! `https` or `socks5` as the scheme. The password is never part of the
//! stored form; the HTTP client factory in `compscope-client` takes it
//! separately.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    pub fn scheme(self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }

    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Some(ProxyProtocol::Http),
            "https" => Some(ProxyProtocol::Https),
            "socks5" | "socks5h" => Some(ProxyProtocol::Socks5),
            _ => None,
        }
    }
}

/// Proxy endpoint as kept in the config file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl ProxyConfig {
    /// Parse `scheme://[user[:password]@]host:port`.
    ///
    /// A password in the URL is rejected rather than silently dropped.
    pub fn parse(input: &str) -> CoreResult<Self> {
        let input = input.trim();
        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| CoreError::validation(format!("proxy {:?} has no scheme", input)))?;
        let protocol = ProxyProtocol::from_scheme(scheme).ok_or_else(|| {
            CoreError::validation(format!(
                "unsupported proxy scheme {:?}; use http, https or socks5",
                scheme
            ))
        })?;

        let rest = rest.trim_end_matches('/');
        let (username, endpoint) = match rest.rsplit_once('@') {
            Some((user, endpoint)) => {
                if user.contains(':') {
                    return Err(CoreError::validation(
                        "proxy password must not be stored in the URL; set COMPSCOPE_PROXY_PASSWORD",
                    ));
                }
                (Some(user.to_string()).filter(|u| !u.is_empty()), endpoint)
            }
            None => (None, rest),
        };

        let (host, port) = endpoint
            .rsplit_once(':')
            .ok_or_else(|| CoreError::validation(format!("proxy {:?} needs a port", input)))?;
        if host.is_empty() {
            return Err(CoreError::validation("proxy host cannot be empty"));
        }
        let port = port
            .parse::<u16>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| CoreError::validation(format!("invalid proxy port {:?}", port)))?;

        Ok(Self {
            protocol,
            host: host.to_string(),
            port,
            username,
        })
    }

    /// Endpoint URL without credentials
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }
}

impl fmt::Display for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.username {
            Some(user) => write!(
                f,
                "{}://{}@{}:{}",
                self.protocol.scheme(),
                user,
                self.host,
                self.port
            ),
            None => f.write_str(&self.url()),
        }
    }
}

impl FromStr for ProxyConfig {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}
