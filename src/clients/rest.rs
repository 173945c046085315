//! Flat JSON device API shared by the Cielo and Pioneer clients
//!
//! Both vendors expose the same shape:
//! - `POST {base}/auth`                      → `{ "token": ..., "expires_in": ... }`
//! - `GET  {base}/devices/{id}/status`       → flat status already in °F / standard modes
//! - `POST {base}/devices/{id}/temperature|mode|fan`
//! - `GET|POST {base}/devices/{id}/schedule`

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{expiry_after, lenient_seconds};
use crate::convert::{standard_fan_mode_or_default, standard_mode_or_default};
use crate::models::NormalizedStatus;

/// Default lifetime of a login token when the vendor omits `expires_in`
pub(crate) const DEFAULT_LOGIN_TOKEN_TTL_SECS: i64 = 86_400;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
    expires_in: Option<Value>,
}

#[derive(Debug, Clone)]
pub(crate) struct TokenGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub(crate) struct RestDeviceApi {
    http_client: Client,
    base_url: String,
    label: &'static str,
}

impl RestDeviceApi {
    pub fn new(http_client: Client, base_url: &str, label: &'static str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            label,
        }
    }

    fn device_url(&self, device_id: &str, resource: &str) -> String {
        format!("{}/devices/{}/{}", self.base_url, device_id, resource)
    }

    /// Exchange username/password for a token
    pub async fn login(&self, username: &str, password: &str) -> Option<TokenGrant> {
        let url = format!("{}/auth", self.base_url);
        let body = serde_json::json!({
            "username": username,
            "password": password
        });

        let resp = match self.http_client.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("[{}] Login request failed: {}", self.label, e);
                return None;
            }
        };

        if resp.status() != StatusCode::OK {
            tracing::warn!("[{}] Login rejected: HTTP {}", self.label, resp.status());
            return None;
        }

        let login: LoginResponse = match resp.json().await {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!("[{}] Login parse failed: {}", self.label, e);
                return None;
            }
        };

        let token = login.token.filter(|t| !t.is_empty())?;
        let expires_in =
            lenient_seconds(login.expires_in.as_ref()).unwrap_or(DEFAULT_LOGIN_TOKEN_TTL_SECS);
        let Some(expires_at) = expiry_after(expires_in) else {
            tracing::warn!("[{}] Token lifetime out of range: {} sec", self.label, expires_in);
            return None;
        };

        tracing::info!("[{}] Token acquired, expires in {} sec", self.label, expires_in);
        Some(TokenGrant { token, expires_at })
    }

    pub async fn fetch_status(&self, token: &str, device_id: &str) -> Option<NormalizedStatus> {
        let data = self.get_json(token, device_id, "status").await?;
        Some(parse_flat_status(&data))
    }

    pub async fn fetch_schedule(&self, token: &str, device_id: &str) -> Option<Value> {
        self.get_json(token, device_id, "schedule").await
    }

    async fn get_json(&self, token: &str, device_id: &str, resource: &str) -> Option<Value> {
        let url = self.device_url(device_id, resource);

        let resp = match self.http_client.get(&url).bearer_auth(token).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("[{}] GET {} failed: {}", self.label, resource, e);
                return None;
            }
        };

        if resp.status() != StatusCode::OK {
            tracing::warn!(
                "[{}] GET {} for {} returned HTTP {}",
                self.label,
                resource,
                device_id,
                resp.status()
            );
            return None;
        }

        match resp.json().await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("[{}] {} parse failed: {}", self.label, resource, e);
                None
            }
        }
    }

    /// POST a JSON body to a device resource; succeeds iff HTTP 200
    pub async fn post(&self, token: &str, device_id: &str, resource: &str, body: &Value) -> bool {
        let url = self.device_url(device_id, resource);

        match self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
        {
            Ok(resp) if resp.status() == StatusCode::OK => true,
            Ok(resp) => {
                tracing::warn!(
                    "[{}] POST {} for {} returned HTTP {}",
                    self.label,
                    resource,
                    device_id,
                    resp.status()
                );
                false
            }
            Err(e) => {
                tracing::warn!("[{}] POST {} failed: {}", self.label, resource, e);
                false
            }
        }
    }
}

/// Map a flat vendor status payload onto the normalized schema.
/// Missing fields default to mode heat, fan auto, online.
pub(crate) fn parse_flat_status(data: &Value) -> NormalizedStatus {
    NormalizedStatus {
        temperature: data.get("current_temperature").and_then(Value::as_f64),
        target_temperature: data.get("target_temperature").and_then(Value::as_f64),
        mode: standard_mode_or_default(data.get("mode").and_then(Value::as_str)),
        fan_mode: standard_fan_mode_or_default(data.get("fan_mode").and_then(Value::as_str)),
        is_online: data.get("is_online").and_then(Value::as_bool).unwrap_or(true),
        humidity: data
            .get("humidity")
            .and_then(Value::as_f64)
            .map(|h| h.round() as i32),
    }
}
