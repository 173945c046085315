//! Vendor thermostat clients
//!
//! - `nest`: Google Nest Smart Device Management API (OAuth2)
//! - `cielo`: Cielo cloud API (login token or static token)
//! - `pioneer`: Pioneer/NetHome API (device key or login token)
//! - `factory`: vendor tag → client resolution

pub mod cielo;
pub mod factory;
pub mod nest;
pub mod pioneer;
mod rest;

pub use self::cielo::CieloClient;
pub use self::factory::ClientFactory;
pub use self::nest::NestClient;
pub use self::pioneer::PioneerClient;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;

use crate::error::{Result, ThermostatError};
use crate::models::{AuthSession, NormalizedStatus, ThermostatVendor};

/// Capability set shared by every vendor client.
///
/// Expected vendor failures (HTTP errors, timeouts, unparseable payloads) are
/// logged and surface as `None` / `false`. The only `Err` a client returns is
/// [`ThermostatError::NotAuthenticated`], when no usable session exists and
/// none can be obtained.
#[async_trait]
pub trait ThermostatClient: Send + Sync {
    fn vendor(&self) -> ThermostatVendor;

    /// Current token cache of this client
    fn session(&self) -> &AuthSession;

    /// Establish or refresh a usable session. Never errors; returns `false`
    /// when no session could be obtained.
    async fn authenticate(&mut self, auth_code: Option<&str>) -> bool;

    async fn get_status(&mut self, device_id: &str) -> Result<Option<NormalizedStatus>>;

    /// Set the target temperature in °F
    async fn set_temperature(&mut self, device_id: &str, fahrenheit: f64) -> Result<bool>;

    /// Set the operating mode (heat, cool, auto, off)
    async fn set_mode(&mut self, device_id: &str, mode: &str) -> Result<bool>;

    /// Set the fan mode (auto, on)
    async fn set_fan_mode(&mut self, device_id: &str, fan_mode: &str) -> Result<bool>;

    /// `None` when the vendor has no schedule API or the call failed
    async fn get_schedule(&mut self, device_id: &str) -> Result<Option<Value>>;

    /// `false` when the vendor has no schedule API or the call failed
    async fn set_schedule(&mut self, device_id: &str, schedule: &Value) -> Result<bool>;
}

/// Build the shared HTTP client. Every vendor request is bounded by `timeout`.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Read a vendor `expires_in` field. Integers, floats and numeric strings are
/// accepted; anything else counts as absent.
pub(crate) fn lenient_seconds(value: Option<&Value>) -> Option<i64> {
    let secs = match value? {
        Value::Number(n) => n.as_i64().map(|i| i as f64).or_else(|| n.as_f64()),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    secs.is_finite().then(|| secs.round() as i64)
}

/// Timestamp `expires_in` seconds from now, or `None` when it does not fit
pub(crate) fn expiry_after(expires_in: i64) -> Option<DateTime<Utc>> {
    chrono::Duration::try_seconds(expires_in).and_then(|d| Utc::now().checked_add_signed(d))
}

/// Authenticate (reusing a cached token when possible) and hand back the bearer token
pub(crate) async fn bearer_token<C>(client: &mut C) -> Result<String>
where
    C: ThermostatClient + ?Sized,
{
    if !client.authenticate(None).await {
        return Err(ThermostatError::NotAuthenticated);
    }

    client
        .session()
        .bearer()
        .map(|t| t.to_string())
        .ok_or(ThermostatError::NotAuthenticated)
}
