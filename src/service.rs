//! ThermostatService: the integration facade used by the web layer
//!
//! Every operation follows the same flow:
//! resolve credential → build client → authenticate → operate → normalize.
//! Failures come back as a typed [`ThermostatError`]; nothing vendor-side
//! escapes unhandled.

use serde::Serialize;
use serde_json::Value;

use crate::clients::{ClientFactory, ThermostatClient};
use crate::config::Config;
use crate::credentials::{ClientArgs, CredentialResolver, DeviceCredential};
use crate::error::{Result, ThermostatError};
use crate::models::{
    AuthSession, Command, CommandResponse, DeviceRecord, NormalizedStatus, RefreshedCredentials,
    ThermostatVendor,
};

/// Result of a facade call plus any tokens the caller should persist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrationOutcome<T> {
    pub value: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshed: Option<RefreshedCredentials>,
}

pub struct ThermostatService {
    resolver: CredentialResolver,
    factory: ClientFactory,
}

impl ThermostatService {
    pub fn new(config: Config) -> Result<Self> {
        let resolver = CredentialResolver::new(config.nest.clone());
        let factory = ClientFactory::new(config)?;
        Ok(Self::from_parts(resolver, factory))
    }

    pub fn from_parts(resolver: CredentialResolver, factory: ClientFactory) -> Self {
        Self { resolver, factory }
    }

    fn resolve(&self, record: &DeviceRecord) -> Result<DeviceCredential> {
        let vendor: ThermostatVendor = record.vendor.parse()?;
        Ok(self.resolver.resolve(vendor, &record.credential))
    }

    /// Build a fresh client for the record and authenticate it
    async fn connect(
        &self,
        record: &DeviceRecord,
    ) -> Result<(Box<dyn ThermostatClient>, ClientArgs)> {
        let credential = self.resolve(record)?;
        let stored = credential.args.clone();
        let mut client = self.factory.create_for(credential);

        if !client.authenticate(None).await {
            tracing::warn!(
                "[Thermostat] Authentication failed for {} ({})",
                record.device_id,
                client.vendor()
            );
            return Err(ThermostatError::AuthenticationFailed);
        }

        Ok((client, stored))
    }

    fn finish<T>(
        client: &dyn ThermostatClient,
        stored: &ClientArgs,
        value: T,
    ) -> IntegrationOutcome<T> {
        IntegrationOutcome {
            value,
            refreshed: refreshed_credentials(client.session(), stored),
        }
    }

    pub async fn status(
        &self,
        record: &DeviceRecord,
    ) -> Result<IntegrationOutcome<NormalizedStatus>> {
        let (mut client, stored) = self.connect(record).await?;

        let status = client
            .get_status(&record.device_id)
            .await
            .map_err(|e| operation_error("status", e))?
            .ok_or_else(|| {
                ThermostatError::Integration("Failed to get thermostat status".to_string())
            })?;

        tracing::info!(
            "[Thermostat] {} status: {:?}°F → {:?}°F, {} / fan {}",
            record.device_id,
            status.temperature,
            status.target_temperature,
            status.mode,
            status.fan_mode
        );
        Ok(Self::finish(client.as_ref(), &stored, status))
    }

    pub async fn set_temperature(
        &self,
        record: &DeviceRecord,
        fahrenheit: f64,
    ) -> Result<IntegrationOutcome<bool>> {
        if !fahrenheit.is_finite() {
            return Err(ThermostatError::InvalidInput(
                "Temperature is required".to_string(),
            ));
        }

        let (mut client, stored) = self.connect(record).await?;
        let success = client
            .set_temperature(&record.device_id, fahrenheit)
            .await
            .map_err(|e| operation_error("set_temperature", e))?;

        log_command(record, "set_temperature", success);
        Ok(Self::finish(client.as_ref(), &stored, success))
    }

    pub async fn set_mode(
        &self,
        record: &DeviceRecord,
        mode: &str,
    ) -> Result<IntegrationOutcome<bool>> {
        if mode.trim().is_empty() {
            return Err(ThermostatError::InvalidInput("Mode is required".to_string()));
        }

        let (mut client, stored) = self.connect(record).await?;
        let success = client
            .set_mode(&record.device_id, mode)
            .await
            .map_err(|e| operation_error("set_mode", e))?;

        log_command(record, "set_mode", success);
        Ok(Self::finish(client.as_ref(), &stored, success))
    }

    pub async fn set_fan_mode(
        &self,
        record: &DeviceRecord,
        fan_mode: &str,
    ) -> Result<IntegrationOutcome<bool>> {
        if fan_mode.trim().is_empty() {
            return Err(ThermostatError::InvalidInput(
                "Fan mode is required".to_string(),
            ));
        }

        let (mut client, stored) = self.connect(record).await?;
        let success = client
            .set_fan_mode(&record.device_id, fan_mode)
            .await
            .map_err(|e| operation_error("set_fan_mode", e))?;

        log_command(record, "set_fan_mode", success);
        Ok(Self::finish(client.as_ref(), &stored, success))
    }

    pub async fn get_schedule(&self, record: &DeviceRecord) -> Result<IntegrationOutcome<Value>> {
        let vendor = self.resolve(record)?.vendor;
        if !vendor.supports_schedule() {
            return Err(unsupported_schedule(vendor));
        }

        let (mut client, stored) = self.connect(record).await?;
        let schedule = client
            .get_schedule(&record.device_id)
            .await
            .map_err(|e| operation_error("get_schedule", e))?
            .ok_or_else(|| ThermostatError::Integration("Failed to get schedule".to_string()))?;

        Ok(Self::finish(client.as_ref(), &stored, schedule))
    }

    pub async fn set_schedule(
        &self,
        record: &DeviceRecord,
        schedule: &Value,
    ) -> Result<IntegrationOutcome<bool>> {
        if !schedule.as_object().is_some_and(|m| !m.is_empty()) {
            return Err(ThermostatError::InvalidInput(
                "Schedule data is required".to_string(),
            ));
        }

        let vendor = self.resolve(record)?.vendor;
        if !vendor.supports_schedule() {
            return Err(unsupported_schedule(vendor));
        }

        let (mut client, stored) = self.connect(record).await?;
        let success = client
            .set_schedule(&record.device_id, schedule)
            .await
            .map_err(|e| operation_error("set_schedule", e))?;

        log_command(record, "set_schedule", success);
        Ok(Self::finish(client.as_ref(), &stored, success))
    }

    /// Dispatch any [`Command`] through the matching operation
    pub async fn execute(
        &self,
        record: &DeviceRecord,
        command: Command,
    ) -> Result<IntegrationOutcome<CommandResponse>> {
        tracing::debug!("[Thermostat] {} on {}", command.name(), record.device_id);

        fn applied(o: IntegrationOutcome<bool>) -> IntegrationOutcome<CommandResponse> {
            IntegrationOutcome {
                value: CommandResponse::Applied { success: o.value },
                refreshed: o.refreshed,
            }
        }

        let outcome = match command {
            Command::GetStatus => {
                let o = self.status(record).await?;
                IntegrationOutcome {
                    value: CommandResponse::Status(o.value),
                    refreshed: o.refreshed,
                }
            }
            Command::SetTemperature(f) => applied(self.set_temperature(record, f).await?),
            Command::SetMode(mode) => applied(self.set_mode(record, &mode).await?),
            Command::SetFanMode(fan) => applied(self.set_fan_mode(record, &fan).await?),
            Command::GetSchedule => {
                let o = self.get_schedule(record).await?;
                IntegrationOutcome {
                    value: CommandResponse::Schedule(o.value),
                    refreshed: o.refreshed,
                }
            }
            Command::SetSchedule(schedule) => {
                applied(self.set_schedule(record, &schedule).await?)
            }
        };

        Ok(outcome)
    }

    /// One-time OAuth authorization-code exchange for a newly linked account.
    /// Returns the tokens to persist on the device record.
    pub async fn link_account(
        &self,
        record: &DeviceRecord,
        auth_code: &str,
    ) -> Result<RefreshedCredentials> {
        if auth_code.trim().is_empty() {
            return Err(ThermostatError::InvalidInput(
                "Authorization code is required".to_string(),
            ));
        }

        let credential = self.resolve(record)?;
        if credential.vendor != ThermostatVendor::Nest {
            return Err(ThermostatError::UnsupportedOperation(format!(
                "account linking is only available for {}",
                ThermostatVendor::Nest
            )));
        }

        let mut client = self.factory.create_for(credential);
        if !client.authenticate(Some(auth_code)).await {
            return Err(ThermostatError::AuthenticationFailed);
        }

        let session = client.session();
        let access_token = session
            .bearer()
            .ok_or(ThermostatError::AuthenticationFailed)?
            .to_string();

        tracing::info!("[Thermostat] Linked account for {}", record.device_id);
        Ok(RefreshedCredentials {
            access_token,
            refresh_token: session.refresh_token.clone(),
            expires_at: session.expires_at,
        })
    }
}

fn operation_error(operation: &str, e: ThermostatError) -> ThermostatError {
    tracing::error!("[Thermostat] {} failed: {}", operation, e);
    ThermostatError::Integration(e.to_string())
}

fn unsupported_schedule(vendor: ThermostatVendor) -> ThermostatError {
    ThermostatError::UnsupportedOperation(format!("schedules are not available for {}", vendor))
}

fn log_command(record: &DeviceRecord, operation: &str, success: bool) {
    if success {
        tracing::info!("[Thermostat] {} applied to {}", operation, record.device_id);
    } else {
        tracing::warn!("[Thermostat] {} rejected for {}", operation, record.device_id);
    }
}

/// Tokens worth handing back: a session token that is neither the stored
/// access token nor one of the long-lived static secrets.
fn refreshed_credentials(session: &AuthSession, stored: &ClientArgs) -> Option<RefreshedCredentials> {
    let token = session.bearer()?;

    let unchanged = [&stored.access_token, &stored.static_token, &stored.device_key]
        .iter()
        .any(|s| s.as_deref() == Some(token));
    if unchanged {
        return None;
    }

    Some(RefreshedCredentials {
        access_token: token.to_string(),
        refresh_token: session.refresh_token.clone(),
        expires_at: session.expires_at,
    })
}
