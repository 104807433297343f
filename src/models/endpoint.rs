//! Target endpoint of the server under test

use crate::error::{AppError, Result};
use std::fmt;
use url::{Host, Url};

/// WebSocket URI composed from scheme, host:port and path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Compose an endpoint from its parts, e.g. `("ws", "localhost:8090", "/")`
    pub fn new(scheme: &str, addr: &str, path: &str) -> Result<Self> {
        if addr.trim().is_empty() {
            return Err(AppError::config("Target address cannot be empty"));
        }

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        Self::parse(&format!("{}://{}{}", scheme, addr.trim(), path))
    }

    /// Parse a full `ws://` or `wss://` URI
    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri)
            .map_err(|e| AppError::config(format!("Invalid target '{}': {}", uri, e)))?;

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(AppError::config(format!(
                    "Unsupported scheme '{}': expected ws or wss",
                    other
                )))
            }
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(AppError::config(format!("Target '{}' has no host", uri)));
        }

        Ok(Self { url })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "wss"
    }

    /// Whether the host is the local machine
    pub fn is_loopback(&self) -> bool {
        match self.url.host() {
            Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
            Some(Host::Ipv4(ip)) => ip.is_loopback(),
            Some(Host::Ipv6(ip)) => ip.is_loopback(),
            None => false,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
