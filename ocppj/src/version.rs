//! Protocol versions and endpoint roles

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// OCPP 1.6J websocket subprotocol
pub const SUBPROTOCOL_V16: &str = "ocpp1.6";

/// OCPP 2.0.1 websocket subprotocol
pub const SUBPROTOCOL_V201: &str = "ocpp2.0.1";

/// Supported OCPP-J protocol versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OcppVersion {
    #[serde(rename = "1.6")]
    V16,
    #[serde(rename = "2.0.1")]
    V201,
}

impl OcppVersion {
    /// Subprotocol negotiated during the websocket upgrade
    pub fn subprotocol(&self) -> &'static str {
        match self {
            OcppVersion::V16 => SUBPROTOCOL_V16,
            OcppVersion::V201 => SUBPROTOCOL_V201,
        }
    }

    pub fn from_subprotocol(protocol: &str) -> Option<Self> {
        match protocol {
            SUBPROTOCOL_V16 => Some(OcppVersion::V16),
            SUBPROTOCOL_V201 => Some(OcppVersion::V201),
            _ => None,
        }
    }

    /// Error code reported for malformed frames
    pub fn format_violation(&self) -> ErrorCode {
        match self {
            OcppVersion::V16 => ErrorCode::FormationViolation,
            OcppVersion::V201 => ErrorCode::FormatViolation,
        }
    }

    /// Human readable name of a role, as used in error descriptions
    pub fn role_name(&self, role: Role) -> &'static str {
        match (self, role) {
            (OcppVersion::V16, Role::ChargingStation) => "charge point",
            (OcppVersion::V16, Role::Csms) => "central system",
            (OcppVersion::V201, Role::ChargingStation) => "charging station",
            (OcppVersion::V201, Role::Csms) => "CSMS",
        }
    }
}

impl std::fmt::Display for OcppVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcppVersion::V16 => write!(f, "1.6"),
            OcppVersion::V201 => write!(f, "2.0.1"),
        }
    }
}

impl std::str::FromStr for OcppVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.6" | "1.6j" | "1.6J" | SUBPROTOCOL_V16 => Ok(OcppVersion::V16),
            "2.0.1" | SUBPROTOCOL_V201 => Ok(OcppVersion::V201),
            other => Err(format!("unsupported OCPP version: {other}")),
        }
    }
}

/// Which side of the connection an endpoint plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Charging station / charge point (websocket client)
    ChargingStation,
    /// CSMS / central system (websocket server)
    Csms,
}

impl Role {
    /// The role of the other end of the connection
    pub fn peer(&self) -> Role {
        match self {
            Role::ChargingStation => Role::Csms,
            Role::Csms => Role::ChargingStation,
        }
    }
}
