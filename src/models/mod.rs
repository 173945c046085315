//! Data models shared by the vendor clients and the integration facade

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ThermostatError;

// ============================================================================
// Vendor Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThermostatVendor {
    /// Google Nest, OAuth2 device-management API
    #[serde(rename = "NEST")]
    Nest,
    /// Cielo, token-based cloud API
    #[serde(rename = "CIELO")]
    Cielo,
    /// Pioneer (NetHome), device-key / credential API
    #[serde(rename = "PIONEER")]
    Pioneer,
}

impl ThermostatVendor {
    pub fn supports_schedule(&self) -> bool {
        match self {
            ThermostatVendor::Nest => false,
            ThermostatVendor::Cielo | ThermostatVendor::Pioneer => true,
        }
    }
}

impl std::fmt::Display for ThermostatVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThermostatVendor::Nest => write!(f, "NEST"),
            ThermostatVendor::Cielo => write!(f, "CIELO"),
            ThermostatVendor::Pioneer => write!(f, "PIONEER"),
        }
    }
}

impl std::str::FromStr for ThermostatVendor {
    type Err = ThermostatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nest" => Ok(ThermostatVendor::Nest),
            "cielo" => Ok(ThermostatVendor::Cielo),
            "pioneer" | "nethome" => Ok(ThermostatVendor::Pioneer),
            _ => Err(ThermostatError::UnsupportedVendor(s.to_string())),
        }
    }
}

// ============================================================================
// Status Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermostatMode {
    #[default]
    Heat,
    Cool,
    Auto,
    Off,
}

impl ThermostatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThermostatMode::Heat => "heat",
            ThermostatMode::Cool => "cool",
            ThermostatMode::Auto => "auto",
            ThermostatMode::Off => "off",
        }
    }
}

impl std::fmt::Display for ThermostatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ThermostatMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heat" => Ok(ThermostatMode::Heat),
            "cool" => Ok(ThermostatMode::Cool),
            "auto" => Ok(ThermostatMode::Auto),
            "off" => Ok(ThermostatMode::Off),
            _ => Err(format!("Unknown mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanMode {
    #[default]
    Auto,
    On,
}

impl FanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FanMode::Auto => "auto",
            FanMode::On => "on",
        }
    }
}

impl std::fmt::Display for FanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FanMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(FanMode::Auto),
            "on" => Ok(FanMode::On),
            _ => Err(format!("Unknown fan mode: {}", s)),
        }
    }
}

/// The single schema every vendor response is translated into.
/// Temperatures are Fahrenheit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStatus {
    pub temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub mode: ThermostatMode,
    pub fan_mode: FanMode,
    pub is_online: bool,
    pub humidity: Option<i32>,
}

// ============================================================================
// Session Models
// ============================================================================

/// Per-client token cache. Never shared between client instances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSession {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    /// A token is usable only when both the token and a future expiry are known
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.access_token, self.expires_at) {
            (Some(token), Some(expires_at)) => !token.is_empty() && now < expires_at,
            _ => false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn bearer(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Tokens obtained during a call that the caller should persist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshedCredentials {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Boundary Models
// ============================================================================

/// Device record handed over by the persistence layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device_id: String,
    /// Vendor tag as stored, e.g. "NEST"
    pub vendor: String,
    /// Opaque stored credential: a JSON object or a raw token
    #[serde(default)]
    pub credential: String,
}

impl DeviceRecord {
    pub fn new(
        device_id: impl Into<String>,
        vendor: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            vendor: vendor.into(),
            credential: credential.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetStatus,
    SetTemperature(f64),
    SetMode(String),
    SetFanMode(String),
    GetSchedule,
    SetSchedule(serde_json::Value),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetStatus => "status",
            Command::SetTemperature(_) => "set_temperature",
            Command::SetMode(_) => "set_mode",
            Command::SetFanMode(_) => "set_fan_mode",
            Command::GetSchedule => "get_schedule",
            Command::SetSchedule(_) => "set_schedule",
        }
    }
}

/// Result of a dispatched [`Command`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandResponse {
    Status(NormalizedStatus),
    Schedule(serde_json::Value),
    Applied { success: bool },
}
