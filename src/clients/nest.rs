//! Google Nest Smart Device Management client
//!
//! Authentication state machine:
//! - cached access token with a future expiry → reuse, no network call
//! - refresh token present → `refresh_token` grant
//! - authorization code supplied → one-time `authorization_code` grant
//! - otherwise → fail

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{bearer_token, expiry_after, lenient_seconds, ThermostatClient};
use crate::config::NestConfig;
use crate::convert::{
    celsius_to_fahrenheit, fahrenheit_to_celsius, nest_fan_timer_to_standard,
    nest_mode_to_standard, standard_fan_to_nest_timer, standard_mode_to_nest,
};
use crate::credentials::ClientArgs;
use crate::error::Result;
use crate::models::{AuthSession, NormalizedStatus, ThermostatMode, ThermostatVendor};

/// Half-width of the heat/cool range written in auto mode (≈ 2 °F)
pub const DEFAULT_AUTO_RANGE_OFFSET_C: f64 = 1.1;

/// Fan "on" is a timed override on Nest
pub const FAN_TIMER_DURATION_SECS: u64 = 3600;

const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

const TRAIT_TEMPERATURE: &str = "sdm.devices.traits.Temperature";
const TRAIT_MODE: &str = "sdm.devices.traits.ThermostatMode";
const TRAIT_SETPOINT: &str = "sdm.devices.traits.ThermostatTemperatureSetpoint";
const TRAIT_FAN: &str = "sdm.devices.traits.Fan";
const TRAIT_HUMIDITY: &str = "sdm.devices.traits.Humidity";

const CMD_SET_HEAT: &str = "sdm.devices.commands.ThermostatTemperatureSetpoint.SetHeat";
const CMD_SET_COOL: &str = "sdm.devices.commands.ThermostatTemperatureSetpoint.SetCool";
const CMD_SET_RANGE: &str = "sdm.devices.commands.ThermostatTemperatureSetpoint.SetRange";
const CMD_SET_MODE: &str = "sdm.devices.commands.ThermostatMode.SetMode";
const CMD_SET_FAN_TIMER: &str = "sdm.devices.commands.Fan.SetTimer";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<Value>,
}

pub struct NestClient {
    http_client: Client,
    api_base_url: String,
    token_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    project_id: Option<String>,
    auto_range_offset_c: f64,
    session: AuthSession,
}

impl NestClient {
    pub fn new(http_client: Client, config: &NestConfig, args: ClientArgs) -> Self {
        Self {
            http_client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.clone(),
            client_id: args.client_id,
            client_secret: args.client_secret,
            redirect_uri: args.redirect_uri,
            project_id: args.project_id,
            auto_range_offset_c: config.auto_range_offset_celsius,
            session: AuthSession {
                access_token: args.access_token,
                refresh_token: args.refresh_token,
                expires_at: args.token_expires_at,
            },
        }
    }

    /// Override the auto-mode setpoint half-width
    pub fn with_auto_range_offset(mut self, offset_celsius: f64) -> Self {
        self.auto_range_offset_c = offset_celsius;
        self
    }

    async fn request_token(&self, grant: &[(&str, &str)]) -> std::result::Result<TokenResponse, String> {
        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", self.client_id.as_deref().unwrap_or_default()),
            ("client_secret", self.client_secret.as_deref().unwrap_or_default()),
        ];
        form.extend_from_slice(grant);

        let resp = self
            .http_client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| format!("Token request failed: {}", e))?;

        if resp.status() != StatusCode::OK {
            return Err(format!("Token endpoint returned HTTP {}", resp.status()));
        }

        resp.json()
            .await
            .map_err(|e| format!("Token parse failed: {}", e))
    }

    fn apply_token(&mut self, token: TokenResponse) -> bool {
        let expires_in =
            lenient_seconds(token.expires_in.as_ref()).unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let Some(expires_at) = expiry_after(expires_in) else {
            tracing::warn!("[Nest] Token lifetime out of range: {} sec", expires_in);
            return false;
        };

        self.session.access_token = token.access_token.filter(|t| !t.is_empty());
        if token.refresh_token.is_some() {
            self.session.refresh_token = token.refresh_token;
        }
        self.session.expires_at = Some(expires_at);

        if self.session.access_token.is_some() {
            tracing::info!("[Nest] Token acquired, expires in {} sec", expires_in);
            true
        } else {
            tracing::warn!("[Nest] Token response carried no access token");
            false
        }
    }

    async fn refresh_access_token(&mut self) -> bool {
        let refresh_token = self.session.refresh_token.clone().unwrap_or_default();
        let grant = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ];

        match self.request_token(&grant).await {
            Ok(token) => self.apply_token(token),
            Err(e) => {
                tracing::warn!("[Nest] Token refresh failed: {}", e);
                false
            }
        }
    }

    async fn exchange_auth_code(&mut self, auth_code: &str) -> bool {
        let redirect_uri = self.redirect_uri.clone().unwrap_or_default();
        let grant = [
            ("grant_type", "authorization_code"),
            ("code", auth_code),
            ("redirect_uri", redirect_uri.as_str()),
        ];

        match self.request_token(&grant).await {
            Ok(token) => self.apply_token(token),
            Err(e) => {
                tracing::warn!("[Nest] Authorization code exchange failed: {}", e);
                false
            }
        }
    }

    fn device_url(&self, device_id: &str) -> Option<String> {
        let project_id = self.project_id.as_deref().filter(|p| !p.is_empty())?;
        Some(format!(
            "{}/enterprises/{}/devices/{}",
            self.api_base_url, project_id, device_id
        ))
    }

    async fn fetch_device(&self, token: &str, device_id: &str) -> Option<Value> {
        let Some(url) = self.device_url(device_id) else {
            tracing::warn!("[Nest] No project_id configured, cannot address {}", device_id);
            return None;
        };

        let resp = match self.http_client.get(&url).bearer_auth(token).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("[Nest] Device request failed: {}", e);
                return None;
            }
        };

        if resp.status() != StatusCode::OK {
            tracing::warn!("[Nest] Device {} returned HTTP {}", device_id, resp.status());
            return None;
        }

        match resp.json().await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("[Nest] Device parse failed: {}", e);
                None
            }
        }
    }

    async fn execute_command(&self, token: &str, device_id: &str, payload: Value) -> bool {
        let Some(url) = self.device_url(device_id) else {
            tracing::warn!("[Nest] No project_id configured, cannot address {}", device_id);
            return false;
        };
        let url = format!("{}:executeCommand", url);

        match self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) if resp.status() == StatusCode::OK => true,
            Ok(resp) => {
                tracing::warn!(
                    "[Nest] Command {} for {} returned HTTP {}",
                    payload["command"],
                    device_id,
                    resp.status()
                );
                false
            }
            Err(e) => {
                tracing::warn!("[Nest] Command request failed: {}", e);
                false
            }
        }
    }
}

/// Translate a Nest device resource into the normalized schema
pub(crate) fn parse_device_status(data: &Value) -> NormalizedStatus {
    let traits = &data["traits"];

    let ambient_c = traits[TRAIT_TEMPERATURE]["ambientTemperatureCelsius"].as_f64();
    let nest_mode = traits[TRAIT_MODE]["mode"].as_str().unwrap_or("HEAT");

    let setpoint = &traits[TRAIT_SETPOINT];
    let heat_c = setpoint["heatCelsius"].as_f64();
    let cool_c = setpoint["coolCelsius"].as_f64();
    let target_c = match nest_mode {
        "HEAT" => heat_c,
        "COOL" => cool_c,
        "HEATCOOL" => match (heat_c, cool_c) {
            (Some(h), Some(c)) => Some((h + c) / 2.0),
            _ => None,
        },
        _ => None,
    };

    let fan_timer = traits[TRAIT_FAN]["timerMode"].as_str().unwrap_or("OFF");

    NormalizedStatus {
        temperature: ambient_c.map(celsius_to_fahrenheit),
        target_temperature: target_c.map(celsius_to_fahrenheit),
        mode: nest_mode_to_standard(nest_mode),
        fan_mode: nest_fan_timer_to_standard(fan_timer),
        // the payload itself is the only liveness signal at this tier
        is_online: true,
        humidity: traits[TRAIT_HUMIDITY]["ambientHumidityPercent"]
            .as_f64()
            .map(|h| h.round() as i32),
    }
}

#[async_trait]
impl ThermostatClient for NestClient {
    fn vendor(&self) -> ThermostatVendor {
        ThermostatVendor::Nest
    }

    fn session(&self) -> &AuthSession {
        &self.session
    }

    async fn authenticate(&mut self, auth_code: Option<&str>) -> bool {
        if self.session.is_valid() {
            return true;
        }

        if self.session.refresh_token.is_some() {
            return self.refresh_access_token().await;
        }

        if let Some(code) = auth_code {
            return self.exchange_auth_code(code).await;
        }

        tracing::debug!("[Nest] No valid token, refresh token or authorization code");
        false
    }

    async fn get_status(&mut self, device_id: &str) -> Result<Option<NormalizedStatus>> {
        let token = bearer_token(self).await?;
        let data = self.fetch_device(&token, device_id).await;
        Ok(data.as_ref().map(parse_device_status))
    }

    async fn set_temperature(&mut self, device_id: &str, fahrenheit: f64) -> Result<bool> {
        let token = bearer_token(self).await?;

        // the setpoint command differs per mode
        let Some(status) = self.get_status(device_id).await? else {
            tracing::warn!("[Nest] Cannot set temperature, status of {} unavailable", device_id);
            return Ok(false);
        };

        let celsius = fahrenheit_to_celsius(fahrenheit);
        let payload = match status.mode {
            ThermostatMode::Heat => serde_json::json!({
                "command": CMD_SET_HEAT,
                "params": { "heatCelsius": celsius }
            }),
            ThermostatMode::Cool => serde_json::json!({
                "command": CMD_SET_COOL,
                "params": { "coolCelsius": celsius }
            }),
            ThermostatMode::Auto => serde_json::json!({
                "command": CMD_SET_RANGE,
                "params": {
                    "heatCelsius": celsius - self.auto_range_offset_c,
                    "coolCelsius": celsius + self.auto_range_offset_c
                }
            }),
            ThermostatMode::Off => {
                tracing::info!("[Nest] {} is off, no setpoint to change", device_id);
                return Ok(false);
            }
        };

        Ok(self.execute_command(&token, device_id, payload).await)
    }

    async fn set_mode(&mut self, device_id: &str, mode: &str) -> Result<bool> {
        let token = bearer_token(self).await?;

        let payload = serde_json::json!({
            "command": CMD_SET_MODE,
            "params": { "mode": standard_mode_to_nest(mode) }
        });

        Ok(self.execute_command(&token, device_id, payload).await)
    }

    async fn set_fan_mode(&mut self, device_id: &str, fan_mode: &str) -> Result<bool> {
        let token = bearer_token(self).await?;

        let (timer_mode, duration) = standard_fan_to_nest_timer(fan_mode, FAN_TIMER_DURATION_SECS);
        let payload = serde_json::json!({
            "command": CMD_SET_FAN_TIMER,
            "params": {
                "timerMode": timer_mode,
                "duration": duration
            }
        });

        Ok(self.execute_command(&token, device_id, payload).await)
    }

    async fn get_schedule(&mut self, _device_id: &str) -> Result<Option<Value>> {
        // no schedule API in Device Access
        Ok(None)
    }

    async fn set_schedule(&mut self, _device_id: &str, _schedule: &Value) -> Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ThermostatError;
    use chrono::{Duration, Utc};
    use crate::models::FanMode;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer) -> NestConfig {
        NestConfig {
            api_base_url: server.uri(),
            token_url: format!("{}/token", server.uri()),
            ..Default::default()
        }
    }

    fn base_args() -> ClientArgs {
        ClientArgs {
            client_id: Some("test_client_id".to_string()),
            client_secret: Some("test_client_secret".to_string()),
            redirect_uri: Some("https://example.com/callback".to_string()),
            project_id: Some("proj".to_string()),
            ..Default::default()
        }
    }

    fn authenticated_args() -> ClientArgs {
        ClientArgs {
            access_token: Some("cached_token".to_string()),
            token_expires_at: Some(Utc::now() + Duration::seconds(600)),
            ..base_args()
        }
    }

    fn device_payload(mode: &str, fan: &str) -> Value {
        serde_json::json!({
            "name": "enterprises/proj/devices/dev1",
            "traits": {
                "sdm.devices.traits.Temperature": { "ambientTemperatureCelsius": 22.0 },
                "sdm.devices.traits.ThermostatMode": { "mode": mode },
                "sdm.devices.traits.ThermostatTemperatureSetpoint": {
                    "heatCelsius": 20.0,
                    "coolCelsius": 24.0
                },
                "sdm.devices.traits.Fan": { "timerMode": fan },
                "sdm.devices.traits.Humidity": { "ambientHumidityPercent": 45 }
            }
        })
    }

    async fn mount_device(server: &MockServer, mode: &str) {
        Mock::given(method("GET"))
            .and(path("/enterprises/proj/devices/dev1"))
            .and(header("authorization", "Bearer cached_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(device_payload(mode, "OFF")))
            .mount(server)
            .await;
    }

    async fn mount_command(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/enterprises/proj/devices/dev1:executeCommand"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn last_command(server: &MockServer) -> Value {
        let requests = server.received_requests().await.unwrap();
        let command = requests
            .iter()
            .filter(|r| r.url.path().ends_with(":executeCommand"))
            .last()
            .expect("no command sent");
        serde_json::from_slice(&command.body).unwrap()
    }

    #[tokio::test]
    async fn test_cached_token_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut client = NestClient::new(Client::new(), &test_config(&server), authenticated_args());
        assert!(client.authenticate(None).await);
        assert_eq!(client.session().access_token.as_deref(), Some("cached_token"));
    }

    #[tokio::test]
    async fn test_refresh_token_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=rt-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh_token",
                "expires_in": 1800
            })))
            .expect(1)
            .mount(&server)
            .await;

        let args = ClientArgs {
            refresh_token: Some("rt-1".to_string()),
            ..base_args()
        };
        let mut client = NestClient::new(Client::new(), &test_config(&server), args);

        let before = Utc::now();
        assert!(client.authenticate(None).await);
        let session = client.session();
        assert_eq!(session.access_token.as_deref(), Some("fresh_token"));
        assert_eq!(session.refresh_token.as_deref(), Some("rt-1"));

        let expires_at = session.expires_at.unwrap();
        assert!(expires_at >= before + Duration::seconds(1800));
        assert!(expires_at <= Utc::now() + Duration::seconds(1800));

        // now cached: no second refresh
        assert!(client.authenticate(None).await);
    }

    #[tokio::test]
    async fn test_refresh_defaults_expiry_to_an_hour() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh_token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let args = ClientArgs {
            refresh_token: Some("rt-1".to_string()),
            ..base_args()
        };
        let mut client = NestClient::new(Client::new(), &test_config(&server), args);

        let before = Utc::now();
        assert!(client.authenticate(None).await);
        let expires_at = client.session().expires_at.unwrap();
        assert!(expires_at >= before + Duration::seconds(3600));
        assert!(expires_at <= Utc::now() + Duration::seconds(3600));
    }

    #[tokio::test]
    async fn test_refresh_accepts_string_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh_token",
                "expires_in": "1800"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let args = ClientArgs {
            refresh_token: Some("rt-1".to_string()),
            ..base_args()
        };
        let mut client = NestClient::new(Client::new(), &test_config(&server), args);

        let before = Utc::now();
        assert!(client.authenticate(None).await);
        let expires_at = client.session().expires_at.unwrap();
        assert!(expires_at >= before + Duration::seconds(1800));
        assert!(expires_at <= Utc::now() + Duration::seconds(1800));
    }

    #[tokio::test]
    async fn test_oversized_expiry_fails_without_panic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh_token",
                "expires_in": 9_000_000_000_000_000i64
            })))
            .expect(1)
            .mount(&server)
            .await;

        let args = ClientArgs {
            refresh_token: Some("rt-1".to_string()),
            ..base_args()
        };
        let mut client = NestClient::new(Client::new(), &test_config(&server), args);

        assert!(!client.authenticate(None).await);
        assert!(!client.session().is_valid());
    }

    #[tokio::test]
    async fn test_auth_code_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=test_auth_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "test_access_token",
                "refresh_token": "test_refresh_token",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = NestClient::new(Client::new(), &test_config(&server), base_args());
        assert!(client.authenticate(Some("test_auth_code")).await);
        assert_eq!(client.session().access_token.as_deref(), Some("test_access_token"));
        assert_eq!(client.session().refresh_token.as_deref(), Some("test_refresh_token"));
    }

    #[tokio::test]
    async fn test_token_endpoint_error_returns_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let args = ClientArgs {
            refresh_token: Some("revoked".to_string()),
            ..base_args()
        };
        let mut client = NestClient::new(Client::new(), &test_config(&server), args);
        assert!(!client.authenticate(None).await);
    }

    #[tokio::test]
    async fn test_no_credentials_fails() {
        let server = MockServer::start().await;
        let mut client = NestClient::new(Client::new(), &test_config(&server), base_args());
        assert!(!client.authenticate(None).await);
        assert_eq!(
            client.get_status("dev1").await,
            Err(ThermostatError::NotAuthenticated)
        );
    }

    #[test]
    fn test_parse_heatcool_status() {
        let status = parse_device_status(&device_payload("HEATCOOL", "OFF"));

        assert_eq!(status.mode, ThermostatMode::Auto);
        assert_eq!(status.fan_mode, FanMode::Auto);
        assert_eq!(status.humidity, Some(45));
        assert!(status.is_online);
        // 22 °C ambient, (20 + 24) / 2 = 22 °C target
        assert!((status.temperature.unwrap() - 71.6).abs() < 0.01);
        assert!((status.target_temperature.unwrap() - 71.6).abs() < 0.01);
    }

    #[test]
    fn test_parse_off_and_unknown_modes() {
        let status = parse_device_status(&device_payload("OFF", "ON"));
        assert_eq!(status.mode, ThermostatMode::Off);
        assert_eq!(status.target_temperature, None);
        assert_eq!(status.fan_mode, FanMode::On);

        let status = parse_device_status(&device_payload("ECO", "OFF"));
        assert_eq!(status.mode, ThermostatMode::Heat);

        let status = parse_device_status(&serde_json::json!({}));
        assert_eq!(status.mode, ThermostatMode::Heat);
        assert_eq!(status.temperature, None);
        assert_eq!(status.humidity, None);
    }

    #[tokio::test]
    async fn test_get_status_maps_payload() {
        let server = MockServer::start().await;
        mount_device(&server, "COOL").await;

        let mut client = NestClient::new(Client::new(), &test_config(&server), authenticated_args());
        let status = client.get_status("dev1").await.unwrap().unwrap();

        assert_eq!(status.mode, ThermostatMode::Cool);
        assert!((status.target_temperature.unwrap() - 75.2).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_get_status_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut client = NestClient::new(Client::new(), &test_config(&server), authenticated_args());
        assert_eq!(client.get_status("missing").await, Ok(None));
    }

    #[tokio::test]
    async fn test_set_temperature_heat_mode() {
        let server = MockServer::start().await;
        mount_device(&server, "HEAT").await;
        mount_command(&server).await;

        let mut client = NestClient::new(Client::new(), &test_config(&server), authenticated_args());
        assert_eq!(client.set_temperature("dev1", 72.0).await, Ok(true));

        let body = last_command(&server).await;
        assert_eq!(body["command"], CMD_SET_HEAT);
        let heat = body["params"]["heatCelsius"].as_f64().unwrap();
        assert!((heat - 22.2).abs() < 0.1);
    }

    #[tokio::test]
    async fn test_set_temperature_auto_mode_writes_range() {
        let server = MockServer::start().await;
        mount_device(&server, "HEATCOOL").await;
        mount_command(&server).await;

        let mut client = NestClient::new(Client::new(), &test_config(&server), authenticated_args());
        assert_eq!(client.set_temperature("dev1", 72.0).await, Ok(true));

        let body = last_command(&server).await;
        assert_eq!(body["command"], CMD_SET_RANGE);
        let heat = body["params"]["heatCelsius"].as_f64().unwrap();
        let cool = body["params"]["coolCelsius"].as_f64().unwrap();
        let target = fahrenheit_to_celsius(72.0);
        assert!((target - heat - 1.1).abs() < 1e-9);
        assert!((cool - target - 1.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_set_temperature_custom_range_offset() {
        let server = MockServer::start().await;
        mount_device(&server, "HEATCOOL").await;
        mount_command(&server).await;

        let mut client = NestClient::new(Client::new(), &test_config(&server), authenticated_args())
            .with_auto_range_offset(2.0);
        assert_eq!(client.set_temperature("dev1", 72.0).await, Ok(true));

        let body = last_command(&server).await;
        let heat = body["params"]["heatCelsius"].as_f64().unwrap();
        let cool = body["params"]["coolCelsius"].as_f64().unwrap();
        assert!((cool - heat - 4.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_set_temperature_off_mode_rejected() {
        let server = MockServer::start().await;
        mount_device(&server, "OFF").await;
        Mock::given(method("POST"))
            .and(path("/enterprises/proj/devices/dev1:executeCommand"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut client = NestClient::new(Client::new(), &test_config(&server), authenticated_args());
        assert_eq!(client.set_temperature("dev1", 72.0).await, Ok(false));
    }

    #[tokio::test]
    async fn test_set_temperature_aborts_when_status_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut client = NestClient::new(Client::new(), &test_config(&server), authenticated_args());
        assert_eq!(client.set_temperature("dev1", 70.0).await, Ok(false));
    }

    #[tokio::test]
    async fn test_set_mode_maps_vocabulary() {
        let server = MockServer::start().await;
        mount_command(&server).await;

        let mut client = NestClient::new(Client::new(), &test_config(&server), authenticated_args());
        assert_eq!(client.set_mode("dev1", "auto").await, Ok(true));

        let body = last_command(&server).await;
        assert_eq!(body["command"], CMD_SET_MODE);
        assert_eq!(body["params"]["mode"], "HEATCOOL");
    }

    #[tokio::test]
    async fn test_set_fan_mode_timer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/enterprises/proj/devices/dev1:executeCommand"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let mut client = NestClient::new(Client::new(), &test_config(&server), authenticated_args());

        assert_eq!(client.set_fan_mode("dev1", "on").await, Ok(true));
        let body = last_command(&server).await;
        assert_eq!(body["params"]["timerMode"], "ON");
        assert_eq!(body["params"]["duration"], "3600s");

        assert_eq!(client.set_fan_mode("dev1", "auto").await, Ok(true));
        let body = last_command(&server).await;
        assert_eq!(body["params"]["timerMode"], "OFF");
        assert_eq!(body["params"]["duration"], "0s");
    }

    #[tokio::test]
    async fn test_command_rejected_by_vendor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let mut client = NestClient::new(Client::new(), &test_config(&server), authenticated_args());
        assert_eq!(client.set_mode("dev1", "cool").await, Ok(false));
    }

    #[tokio::test]
    async fn test_schedule_unsupported() {
        let server = MockServer::start().await;
        let mut client = NestClient::new(Client::new(), &test_config(&server), authenticated_args());

        assert_eq!(client.get_schedule("dev1").await, Ok(None));
        assert_eq!(
            client
                .set_schedule("dev1", &serde_json::json!({ "monday": [] }))
                .await,
            Ok(false)
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
