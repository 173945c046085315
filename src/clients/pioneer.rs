//! Pioneer (NetHome) API client
//!
//! Auth precedence: valid cached token → device key (long-lived bearer, no
//! network call) → username/password login.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::Value;

use super::rest::RestDeviceApi;
use super::{bearer_token, ThermostatClient};
use crate::config::PioneerConfig;
use crate::credentials::ClientArgs;
use crate::error::Result;
use crate::models::{AuthSession, NormalizedStatus, ThermostatVendor};

/// Assumed validity of a device key
const DEVICE_KEY_TTL_DAYS: i64 = 30;

pub struct PioneerClient {
    api: RestDeviceApi,
    username: Option<String>,
    password: Option<String>,
    device_key: Option<String>,
    session: AuthSession,
}

impl PioneerClient {
    pub fn new(http_client: Client, config: &PioneerConfig, args: ClientArgs) -> Self {
        Self {
            api: RestDeviceApi::new(http_client, &config.api_base_url, "Pioneer"),
            username: args.username,
            password: args.password,
            device_key: args.device_key,
            session: AuthSession::default(),
        }
    }
}

#[async_trait]
impl ThermostatClient for PioneerClient {
    fn vendor(&self) -> ThermostatVendor {
        ThermostatVendor::Pioneer
    }

    fn session(&self) -> &AuthSession {
        &self.session
    }

    async fn authenticate(&mut self, _auth_code: Option<&str>) -> bool {
        if self.session.is_valid() {
            return true;
        }

        if let Some(key) = self.device_key.clone() {
            self.session.access_token = Some(key);
            self.session.expires_at = Some(Utc::now() + Duration::days(DEVICE_KEY_TTL_DAYS));
            return true;
        }

        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            tracing::debug!("[Pioneer] No device key or username/password configured");
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
        // Pioneer uses the standard mode names
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FanMode, NormalizedStatus, ThermostatMode};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer) -> PioneerConfig {
        PioneerConfig {
            api_base_url: server.uri(),
        }
    }

    fn device_key_args() -> ClientArgs {
        ClientArgs {
            device_key: Some("dk1".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_device_key_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/devices/dev1/status"))
            .and(header("authorization", "Bearer dk1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current_temperature": 70,
                "target_temperature": 72,
                "mode": "heat",
                "fan_mode": "auto",
                "is_online": true,
                "humidity": 35
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = PioneerClient::new(Client::new(), &test_config(&server), device_key_args());
        assert!(client.authenticate(None).await);
        assert_eq!(client.session().access_token.as_deref(), Some("dk1"));

        let status = client.get_status("dev1").await.unwrap();
        assert_eq!(
            status,
            Some(NormalizedStatus {
                temperature: Some(70.0),
                target_temperature: Some(72.0),
                mode: ThermostatMode::Heat,
                fan_mode: FanMode::Auto,
                is_online: true,
                humidity: Some(35),
            })
        );
    }

    #[tokio::test]
    async fn test_device_key_validity_window() {
        let server = MockServer::start().await;
        let mut client = PioneerClient::new(Client::new(), &test_config(&server), device_key_args());
        assert!(client.authenticate(None).await);

        let expires_at = client.session().expires_at.unwrap();
        assert!(expires_at > Utc::now() + Duration::days(29));
        assert!(expires_at <= Utc::now() + Duration::days(30));
    }

    #[tokio::test]
    async fn test_password_login_default_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "test_token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let args = ClientArgs {
            username: Some("test_username".to_string()),
            password: Some("test_password".to_string()),
            ..Default::default()
        };
        let mut client = PioneerClient::new(Client::new(), &test_config(&server), args);

        let before = Utc::now();
        assert!(client.authenticate(None).await);
        assert_eq!(client.session().access_token.as_deref(), Some("test_token"));
        let expires_at = client.session().expires_at.unwrap();
        assert!(expires_at >= before + Duration::hours(24));
    }

    #[tokio::test]
    async fn test_login_without_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let args = ClientArgs {
            username: Some("u".to_string()),
            password: Some("p".to_string()),
            ..Default::default()
        };
        let mut client = PioneerClient::new(Client::new(), &test_config(&server), args);
        assert!(!client.authenticate(None).await);
    }

    #[tokio::test]
    async fn test_mode_pass_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/devices/dev1/mode"))
            .and(body_json(serde_json::json!({ "mode": "cool" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = PioneerClient::new(Client::new(), &test_config(&server), device_key_args());
        assert_eq!(client.set_mode("dev1", "COOL").await, Ok(true));
    }

    #[tokio::test]
    async fn test_schedule_proxy() {
        let server = MockServer::start().await;
        let schedule = serde_json::json!({ "weekday": { "wake": 68, "sleep": 64 } });

        Mock::given(method("GET"))
            .and(path("/devices/dev1/schedule"))
            .respond_with(ResponseTemplate::new(200).set_body_json(schedule.clone()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/devices/dev1/schedule"))
            .and(body_json(schedule.clone()))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mut client = PioneerClient::new(Client::new(), &test_config(&server), device_key_args());
        assert_eq!(client.get_schedule("dev1").await, Ok(Some(schedule.clone())));
        assert_eq!(client.set_schedule("dev1", &schedule).await, Ok(true));
    }

    #[tokio::test]
    async fn test_unreachable_vendor_returns_none() {
        // nothing listens on the discard port
        let config = PioneerConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
        };
        let mut client = PioneerClient::new(Client::new(), &config, device_key_args());

        assert_eq!(client.get_status("dev1").await, Ok(None));
        assert_eq!(client.set_temperature("dev1", 70.0).await, Ok(false));
    }
}
