//! Vendor tag → client resolution

use reqwest::Client;

use super::{build_http_client, CieloClient, NestClient, PioneerClient, ThermostatClient};
use crate::config::Config;
use crate::credentials::{ClientArgs, DeviceCredential};
use crate::error::Result;
use crate::models::ThermostatVendor;

/// Builds vendor clients. Construction performs no I/O; every client gets
/// its own empty session and shares only the connection pool.
#[derive(Clone)]
pub struct ClientFactory {
    http_client: Client,
    config: Config,
}

impl ClientFactory {
    pub fn new(config: Config) -> Result<Self> {
        let http_client = build_http_client(config.http_timeout())?;
        Ok(Self::with_http_client(http_client, config))
    }

    pub fn with_http_client(http_client: Client, config: Config) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Resolve a stored vendor tag. Unknown tags are `UnsupportedVendor`.
    pub fn create_client(
        &self,
        vendor_tag: &str,
        args: ClientArgs,
    ) -> Result<Box<dyn ThermostatClient>> {
        let vendor: ThermostatVendor = vendor_tag.parse()?;
        Ok(self.create(vendor, args))
    }

    pub fn create_for(&self, credential: DeviceCredential) -> Box<dyn ThermostatClient> {
        self.create(credential.vendor, credential.args)
    }

    pub fn create(&self, vendor: ThermostatVendor, args: ClientArgs) -> Box<dyn ThermostatClient> {
        let http_client = self.http_client.clone();
        match vendor {
            ThermostatVendor::Nest => Box::new(NestClient::new(http_client, &self.config.nest, args)),
            ThermostatVendor::Cielo => {
                Box::new(CieloClient::new(http_client, &self.config.cielo, args))
            }
            ThermostatVendor::Pioneer => {
                Box::new(PioneerClient::new(http_client, &self.config.pioneer, args))
            }
        }
    }
}
