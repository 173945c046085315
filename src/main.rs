//! thermostat-bridge - operator tool
//!
//! Runs one facade operation against a device and prints the JSON result:
//!
//! ```text
//! thermostat-bridge <vendor> <device_id> <credential> [status|temperature <F>|mode <m>|fan <m>|schedule]
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thermostat_bridge::{
    Command, CommandResponse, Config, DeviceRecord, IntegrationOutcome, ThermostatError,
    ThermostatService,
};

const USAGE: &str = "usage: thermostat-bridge <vendor> <device_id> <credential> \
                     [status|temperature <F>|mode <m>|fan <m>|schedule]";

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    let value = || {
        args.get(1)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("missing value for '{}'\n{}", args[0], USAGE))
    };

    let command = match args.first().map(String::as_str) {
        None | Some("status") => Command::GetStatus,
        Some("temperature") => Command::SetTemperature(value()?.parse()?),
        Some("mode") => Command::SetMode(value()?),
        Some("fan") => Command::SetFanMode(value()?),
        Some("schedule") => Command::GetSchedule,
        Some(other) => anyhow::bail!("unknown command '{}'\n{}", other, USAGE),
    };

    Ok(command)
}

/// Render a facade result: the outcome as JSON for stdout, or the error body
/// on stderr and the error itself for a non-zero exit.
fn render(
    result: Result<IntegrationOutcome<CommandResponse>, ThermostatError>,
) -> anyhow::Result<String> {
    match result {
        Ok(outcome) => Ok(serde_json::to_string_pretty(&outcome)?),
        Err(e) => {
            eprintln!("{}", e.to_json());
            Err(e.into())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thermostat_bridge=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        anyhow::bail!(USAGE);
    }

    let record = DeviceRecord::new(args[1].clone(), args[0].clone(), args[2].clone());
    let command = parse_command(&args[3..])?;

    // Load configuration
    let config = Config::load()?;
    tracing::debug!("Configuration loaded");

    let service = ThermostatService::new(config)?;

    let output = render(service.execute(&record, command).await)?;
    println!("{}", output);

    Ok(())
}
