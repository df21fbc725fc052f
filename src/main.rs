//! BLE WiFi configuration peripheral.
//!
//! # Usage
//!
//! ```bash
//! sudo ble-wifi-config --time 300
//! ```

#[cfg(feature = "bluez")]
#[tokio::main]
async fn main() {
    use ble_wifi_config::host::BluezHost;
    use ble_wifi_config::{build_application, AppContext, Cli, ServiceConfig};
    use clap::Parser;
    use log::{error, info};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config: ServiceConfig = Cli::parse().into();
    info!("=== BLE WiFi config starting ===");
    match config.advertising_duration() {
        Some(duration) => info!("Advertising for {}s", duration.as_secs()),
        None => info!("Advertising until shutdown"),
    }

    let host = match BluezHost::connect().await {
        Ok(host) => Arc::new(host),
        Err(e) => {
            error!("Bluetooth initialization failed: {}", e);
            std::process::exit(1);
        }
    };

    let (application, configurator) = build_application(&config, host.sink());
    let shutdown = CancellationToken::new();
    let app = AppContext::new(
        config,
        host.clone(),
        host,
        application,
        configurator,
        shutdown.clone(),
    );

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received");
                shutdown.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    if let Err(e) = app.run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "bluez"))]
fn main() {
    println!("This binary requires the 'bluez' feature.");
    println!("Use 'cargo run --features bluez' on a Linux host with BlueZ.");
    std::process::exit(1);
}
