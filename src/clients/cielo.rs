//! Cielo cloud API client
//!
//! Auth precedence: valid cached token → pre-supplied static token → username/password login.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::Value;

use super::rest::{RestDeviceApi, DEFAULT_LOGIN_TOKEN_TTL_SECS};
use super::{bearer_token, ThermostatClient};
use crate::config::CieloConfig;
use crate::credentials::ClientArgs;
use crate::error::Result;
use crate::models::{AuthSession, NormalizedStatus, ThermostatVendor};

pub struct CieloClient {
    api: RestDeviceApi,
    username: Option<String>,
    password: Option<String>,
    static_token: Option<String>,
    session: AuthSession,
}

impl CieloClient {
    pub fn new(http_client: Client, config: &CieloConfig, args: ClientArgs) -> Self {
        Self {
            api: RestDeviceApi::new(http_client, &config.api_base_url, "Cielo"),
            username: args.username,
            password: args.password,
            static_token: args.static_token,
            session: AuthSession::default(),
        }
    }
}

#[async_trait]
impl ThermostatClient for CieloClient {
    fn vendor(&self) -> ThermostatVendor {
        ThermostatVendor::Cielo
    }

    fn session(&self) -> &AuthSession {
        &self.session
    }

    async fn authenticate(&mut self, _auth_code: Option<&str>) -> bool {
        if self.session.is_valid() {
            return true;
        }

        if let Some(token) = self.static_token.clone() {
            // no expiry is published for static tokens
            self.session.access_token = Some(token);
            self.session.expires_at =
                Some(Utc::now() + Duration::seconds(DEFAULT_LOGIN_TOKEN_TTL_SECS));
            return true;
        }

        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            tracing::debug!("[Cielo] No static token or username/password configured");
            return false;
        };

        match self.api.login(username, password).await {
            Some(grant) => {
                self.session.access_token = Some(grant.token);
                self.session.expires_at = Some(grant.expires_at);
                true
            }
            None => false,
        }
    }

    async fn get_status(&mut self, device_id: &str) -> Result<Option<NormalizedStatus>> {
        let token = bearer_token(self).await?;
        Ok(self.api.fetch_status(&token, device_id).await)
    }

    async fn set_temperature(&mut self, device_id: &str, fahrenheit: f64) -> Result<bool> {
        let token = bearer_token(self).await?;
        let body = serde_json::json!({ "temperature": fahrenheit });
        Ok(self.api.post(&token, device_id, "temperature", &body).await)
    }

    async fn set_mode(&mut self, device_id: &str, mode: &str) -> Result<bool> {
        let token = bearer_token(self).await?;
        let body = serde_json::json!({ "mode": mode.trim().to_lowercase() });
        Ok(self.api.post(&token, device_id, "mode", &body).await)
    }

    async fn set_fan_mode(&mut self, device_id: &str, fan_mode: &str) -> Result<bool> {
        let token = bearer_token(self).await?;
        let body = serde_json::json!({ "fan_mode": fan_mode.trim().to_lowercase() });
        Ok(self.api.post(&token, device_id, "fan", &body).await)
    }

    async fn get_schedule(&mut self, device_id: &str) -> Result<Option<Value>> {
        let token = bearer_token(self).await?;
        Ok(self.api.fetch_schedule(&token, device_id).await)
    }

    async fn set_schedule(&mut self, device_id: &str, schedule: &Value) -> Result<bool> {
        let token = bearer_token(self).await?;
        Ok(self.api.post(&token, device_id, "schedule", schedule).await)
    }
}
