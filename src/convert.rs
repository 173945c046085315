//! Unit and vocabulary conversion helpers
//!
//! Standard vocabulary: modes heat/cool/auto/off, fan modes auto/on, temperatures in °F.
//! Nest vocabulary: modes HEAT/COOL/HEATCOOL/OFF, fan timer ON/OFF, temperatures in °C.

use crate::models::{FanMode, ThermostatMode};

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Nest mode string → standard mode. Unknown values fall back to heat.
pub fn nest_mode_to_standard(nest_mode: &str) -> ThermostatMode {
    match nest_mode {
        "HEAT" => ThermostatMode::Heat,
        "COOL" => ThermostatMode::Cool,
        "HEATCOOL" => ThermostatMode::Auto,
        "OFF" => ThermostatMode::Off,
        _ => ThermostatMode::Heat,
    }
}

/// Standard mode string (any case) → Nest mode. Unmapped values fall back to HEAT.
pub fn standard_mode_to_nest(mode: &str) -> &'static str {
    match mode.parse::<ThermostatMode>() {
        Ok(ThermostatMode::Heat) | Err(_) => "HEAT",
        Ok(ThermostatMode::Cool) => "COOL",
        Ok(ThermostatMode::Auto) => "HEATCOOL",
        Ok(ThermostatMode::Off) => "OFF",
    }
}

/// Nest fan timer mode → standard fan mode
pub fn nest_fan_timer_to_standard(timer_mode: &str) -> FanMode {
    if timer_mode == "ON" {
        FanMode::On
    } else {
        FanMode::Auto
    }
}

/// Standard fan mode (any case) → Nest fan timer mode and duration
pub fn standard_fan_to_nest_timer(fan_mode: &str, on_duration_secs: u64) -> (&'static str, String) {
    if fan_mode.trim().eq_ignore_ascii_case("on") {
        ("ON", format!("{}s", on_duration_secs))
    } else {
        ("OFF", "0s".to_string())
    }
}

/// Lenient parse of a mode already in the standard vocabulary
pub fn standard_mode_or_default(mode: Option<&str>) -> ThermostatMode {
    match mode {
        Some(m) => m.parse().unwrap_or_else(|_| {
            tracing::debug!("Unrecognised mode '{}', reporting heat", m);
            ThermostatMode::Heat
        }),
        None => ThermostatMode::Heat,
    }
}

/// Lenient parse of a fan mode already in the standard vocabulary
pub fn standard_fan_mode_or_default(fan_mode: Option<&str>) -> FanMode {
    fan_mode.and_then(|m| m.parse().ok()).unwrap_or(FanMode::Auto)
}
