//! Remote target value object - where a remote-shell session is opened

use std::fmt;

use crate::errors::DomainError;
use crate::value_objects::Credentials;

/// Port used when a host address does not name one
pub const DEFAULT_SSH_PORT: u16 = 22;

/// A remote host together with the credentials used to reach it
#[derive(Debug, Clone)]
pub struct RemoteTarget {
    host: String,
    port: u16,
    credentials: Credentials,
}

impl RemoteTarget {
    /// Create a target on the default SSH port
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            credentials,
        }
    }

    /// Parse `host`, `host:port` or `[v6addr]:port`
    ///
    /// A bare IPv6 address (several colons, no brackets) is taken as a host
    /// on the default port.
    pub fn parse(address: &str, credentials: Credentials) -> Result<Self, DomainError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(DomainError::InvalidHost("empty host".to_string()));
        }

        let (host, port) = if let Some(rest) = address.strip_prefix('[') {
            let Some((host, tail)) = rest.split_once(']') else {
                return Err(DomainError::InvalidHost(address.to_string()));
            };
            match tail.strip_prefix(':') {
                Some(port) => (host, parse_port(address, port)?),
                None if tail.is_empty() => (host, DEFAULT_SSH_PORT),
                None => return Err(DomainError::InvalidHost(address.to_string())),
            }
        } else if address.matches(':').count() == 1 {
            let (host, port) = address
                .split_once(':')
                .ok_or_else(|| DomainError::InvalidHost(address.to_string()))?;
            (host, parse_port(address, port)?)
        } else {
            (address, DEFAULT_SSH_PORT)
        };

        if host.is_empty() {
            return Err(DomainError::InvalidHost(address.to_string()));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            credentials,
        })
    }

    /// Host name or address
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Login credentials
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

fn parse_port(address: &str, port: &str) -> Result<u16, DomainError> {
    port.parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| DomainError::InvalidHost(address.to_string()))
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
