//! Port tokens.
//!
//! Ports travel as `<port>/<protocol>` (`80/tcp`), a bare number meaning TCP,
//! or the single token `icmp`. The textual form doubles as the reconciliation
//! key, so [`Port::key`] and [`Port::from_str`] must stay inverse.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Highest valid port number.
pub const MAX_PORT: u32 = 65_535;

/// Transport protocol of an opened port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP
    Tcp,
    /// UDP
    Udp,
    /// ICMP (no port number)
    Icmp,
}

impl Protocol {
    /// Lowercase protocol name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp => "icmp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "icmp" => Ok(Self::Icmp),
            other => Err(ProtocolError::InvalidPort(format!("unknown protocol {other:?}"))),
        }
    }
}

/// One opened port.
///
/// Ordering is by number, then protocol, which is also the order
/// `opened-ports` reports them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Port {
    /// Port number; always 0 for ICMP.
    pub port: u16,
    /// Transport protocol.
    pub protocol: Protocol,
}

impl Port {
    /// TCP port.
    pub fn tcp(port: u16) -> Self {
        Self { port, protocol: Protocol::Tcp }
    }

    /// UDP port.
    pub fn udp(port: u16) -> Self {
        Self { port, protocol: Protocol::Udp }
    }

    /// ICMP pseudo-port.
    pub fn icmp() -> Self {
        Self { port: 0, protocol: Protocol::Icmp }
    }

    /// Reconciliation key, identical to the wire token.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.protocol {
            Protocol::Icmp => f.write_str("icmp"),
            protocol => write!(f, "{}/{protocol}", self.port),
        }
    }
}

impl FromStr for Port {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "icmp" {
            return Ok(Self::icmp());
        }

        let (number, protocol) = match s.split_once('/') {
            Some((number, protocol)) => (number, protocol.parse::<Protocol>()?),
            None => (s, Protocol::Tcp),
        };
        if protocol == Protocol::Icmp {
            return Err(ProtocolError::InvalidPort(format!("icmp takes no port number: {s:?}")));
        }

        if !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::InvalidPort(format!("port must be digits only: {s:?}")));
        }
        let port = number
            .parse::<u32>()
            .ok()
            .filter(|port| *port <= MAX_PORT)
            .ok_or_else(|| ProtocolError::InvalidPort(format!("port out of range: {s:?}")))?;

        Ok(Self { port: port as u16, protocol })
    }
}
