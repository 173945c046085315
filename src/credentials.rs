//! Credential resolution
//!
//! A device's stored credential is an opaque string: normally a JSON object,
//! sometimes a bare token. The resolver turns it into typed client arguments
//! for the device's vendor, filling shared Nest app secrets from configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::NestConfig;
use crate::models::ThermostatVendor;

/// Client construction arguments. Only the fields relevant to the target
/// vendor are read; the rest are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientArgs {
    // Nest
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub project_id: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    // Cielo / Pioneer
    pub username: Option<String>,
    pub password: Option<String>,
    pub device_key: Option<String>,
    pub static_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCredential {
    pub vendor: ThermostatVendor,
    pub args: ClientArgs,
}

/// Parse a stored credential string into a field map.
///
/// Non-JSON input (or JSON that is not an object) degrades to `{ "token": <input> }`.
pub fn parse_credential(raw: &str) -> Map<String, Value> {
    let raw = raw.trim();
    let mut fields = Map::new();

    if raw.is_empty() {
        return fields;
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => return map,
        Ok(Value::String(token)) => {
            fields.insert("token".to_string(), Value::String(token));
        }
        _ => {
            fields.insert("token".to_string(), Value::String(raw.to_string()));
        }
    }

    fields
}

fn field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn expiry_field(fields: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    let raw = field(fields, key)?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            tracing::debug!("Ignoring unparseable {} '{}': {}", key, raw, e);
            None
        }
    }
}

/// Configured value wins; the stored one fills the gap
fn shared_secret(configured: &Option<String>, stored: Option<String>) -> Option<String> {
    configured
        .as_ref()
        .filter(|v| !v.is_empty())
        .cloned()
        .or(stored)
}

#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    nest: NestConfig,
}

impl CredentialResolver {
    pub fn new(nest: NestConfig) -> Self {
        Self { nest }
    }

    pub fn resolve(&self, vendor: ThermostatVendor, raw: &str) -> DeviceCredential {
        let fields = parse_credential(raw);

        let args = match vendor {
            ThermostatVendor::Nest => ClientArgs {
                client_id: shared_secret(&self.nest.client_id, field(&fields, "client_id")),
                client_secret: shared_secret(
                    &self.nest.client_secret,
                    field(&fields, "client_secret"),
                ),
                redirect_uri: shared_secret(
                    &self.nest.redirect_uri,
                    field(&fields, "redirect_uri"),
                ),
                project_id: shared_secret(&self.nest.project_id, field(&fields, "project_id")),
                access_token: field(&fields, "access_token"),
                refresh_token: field(&fields, "refresh_token"),
                token_expires_at: expiry_field(&fields, "expires_at"),
                ..Default::default()
            },
            ThermostatVendor::Cielo => ClientArgs {
                username: field(&fields, "username"),
                password: field(&fields, "password"),
                static_token: field(&fields, "token"),
                ..Default::default()
            },
            ThermostatVendor::Pioneer => ClientArgs {
                username: field(&fields, "username"),
                password: field(&fields, "password"),
                device_key: field(&fields, "device_key").or_else(|| field(&fields, "token")),
                ..Default::default()
            },
        };

        DeviceCredential { vendor, args }
    }
}
