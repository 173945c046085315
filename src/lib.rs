//! thermostat-bridge - uniform thermostat control layer
//!
//! Puts Google Nest (OAuth2), Cielo (token) and Pioneer (device key) cloud
//! APIs behind one client contract, and exposes a facade that turns a stored
//! device record into normalized status or command results.

pub mod clients;
pub mod config;
pub mod convert;
pub mod credentials;
pub mod error;
pub mod models;
pub mod service;

pub use crate::clients::{ClientFactory, ThermostatClient};
pub use crate::config::Config;
pub use crate::credentials::{ClientArgs, CredentialResolver, DeviceCredential};
pub use crate::error::ThermostatError;
pub use crate::models::{
    AuthSession, Command, CommandResponse, DeviceRecord, FanMode, NormalizedStatus,
    RefreshedCredentials, ThermostatMode, ThermostatVendor,
};
pub use crate::service::{IntegrationOutcome, ThermostatService};
