//! Error handling module

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThermostatError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Unsupported thermostat type: {0}")]
    UnsupportedVendor(String),

    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Integration error: {0}")]
    Integration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ThermostatError {
    /// HTTP status the web layer should answer with for this failure
    pub fn status_code(&self) -> StatusCode {
        match self {
            ThermostatError::NotAuthenticated | ThermostatError::AuthenticationFailed => {
                StatusCode::UNAUTHORIZED
            }
            ThermostatError::UnsupportedVendor(_)
            | ThermostatError::UnsupportedOperation(_)
            | ThermostatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ThermostatError::Network(_) => StatusCode::BAD_GATEWAY,
            ThermostatError::Integration(_) | ThermostatError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Error body in the `{ "error": ..., "status": ... }` shape
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.to_string(),
            "status": self.status_code().as_u16()
        })
    }
}

impl From<reqwest::Error> for ThermostatError {
    fn from(e: reqwest::Error) -> Self {
        ThermostatError::Network(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ThermostatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_unauthorized() {
        assert_eq!(
            ThermostatError::AuthenticationFailed.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ThermostatError::NotAuthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_error_body_shape() {
        let body = ThermostatError::UnsupportedVendor("ECOBEE".to_string()).to_json();
        assert_eq!(body["status"], 400);
        assert_eq!(body["error"], "Unsupported thermostat type: ECOBEE");

        let body = ThermostatError::Integration("boom".to_string()).to_json();
        assert_eq!(body["status"], 500);
    }
}
