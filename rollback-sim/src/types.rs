//! Process addressing.
//!
//! A [`NetworkAddress`] identifies one simulated process. The IP part is the
//! host identity: faults are modeled per host, so two processes sharing an IP
//! are affected by the same interface or link clog.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Network address of a simulated process (IP + port).
///
/// # Examples
///
/// ```
/// use rollback_sim::NetworkAddress;
/// use std::net::{IpAddr, Ipv4Addr};
///
/// let addr = NetworkAddress::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 4500);
/// assert_eq!(addr.to_string(), "10.0.0.1:4500");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkAddress {
    /// IP address (IPv4 or IPv6). Doubles as the host identity.
    pub ip: IpAddr,
    /// Port number.
    pub port: u16,
}

impl NetworkAddress {
    /// Create a new network address.
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    /// Whether both addresses live on the same simulated host.
    pub fn same_host(&self, other: &NetworkAddress) -> bool {
        self.ip == other.ip
    }

    /// Parse from string "ip:port" format.
    ///
    /// Supports both IPv4 (`127.0.0.1:4500`) and IPv6 (`[::1]:4500`) notation.
    ///
    /// # Errors
    ///
    /// Returns error if IP or port cannot be parsed.
    pub fn parse(s: &str) -> Result<Self, NetworkAddressParseError> {
        if let Some(bracket_end) = s.rfind(']') {
            if !s.starts_with('[') {
                return Err(NetworkAddressParseError::InvalidIp);
            }
            let ip: IpAddr = s[1..bracket_end]
                .parse()
                .map_err(|_| NetworkAddressParseError::InvalidIp)?;
            let port_str = s
                .get(bracket_end + 1..)
                .and_then(|rest| rest.strip_prefix(':'))
                .ok_or(NetworkAddressParseError::MissingPort)?;
            let port: u16 = port_str
                .parse()
                .map_err(|_| NetworkAddressParseError::InvalidPort)?;
            Ok(Self::new(ip, port))
        } else {
            let (ip_str, port_str) = s
                .rsplit_once(':')
                .ok_or(NetworkAddressParseError::MissingPort)?;
            let ip: IpAddr = ip_str
                .parse()
                .map_err(|_| NetworkAddressParseError::InvalidIp)?;
            let port: u16 = port_str
                .parse()
                .map_err(|_| NetworkAddressParseError::InvalidPort)?;
            Ok(Self::new(ip, port))
        }
    }
}

impl std::fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ip {
            IpAddr::V4(ip) => write!(f, "{}:{}", ip, self.port),
            IpAddr::V6(ip) => write!(f, "[{}]:{}", ip, self.port),
        }
    }
}

impl std::str::FromStr for NetworkAddress {
    type Err = NetworkAddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error parsing a network address from string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkAddressParseError {
    /// The IP address could not be parsed.
    #[error("invalid IP address")]
    InvalidIp,
    /// The port number could not be parsed.
    #[error("invalid port number")]
    InvalidPort,
    /// No port separator (`:`) found in the input.
    #[error("missing port separator")]
    MissingPort,
}

/// Role a simulated process plays in the commit pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessRole {
    /// Orchestrates commits; the process isolated or killed to trigger recovery.
    Coordinator,
    /// Holds a copy of the replicated log.
    Replica,
}
