//! Entry point: loads configuration and station descriptors, connects each
//! station's `WsTransport`, starts its heartbeat/ping timers and ATG loop,
//! and serves the operator UI until shutdown.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use ocpp_station_sim::application::diagnostics::DiagnosticsCollaborator;
use ocpp_station_sim::application::{perform_boot_handshake, Atg, Fleet, StationHandle};
use ocpp_station_sim::config::AppConfig;
use ocpp_station_sim::domain::StationDescriptor;
use ocpp_station_sim::infrastructure::descriptor_loader::{DescriptorSource, TomlDescriptorLoader};
use ocpp_station_sim::infrastructure::{operator_ui, FileSystemDiagnostics, TracingPerformanceSink, WsTransport};
use ocpp_station_sim::support::ShutdownSignal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let config = AppConfig::load(config_path).await?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let shutdown = ShutdownSignal::new();
    shutdown.start_signal_listener();

    let loader = TomlDescriptorLoader::new(config.station_descriptor_dir.clone());
    let descriptors = loader.load_all().await?;
    if descriptors.is_empty() {
        tracing::warn!(dir = %config.station_descriptor_dir.display(), "no station descriptors found");
    }

    let fleet = Arc::new(Fleet::new());
    for descriptor in descriptors {
        if let Err(e) = spawn_station(&config, &fleet, descriptor, &shutdown).await {
            tracing::error!(error = %e, "failed to start station");
        }
    }

    let operator_fleet = Arc::clone(&fleet);
    let operator_addr = config.operator_ui_addr;
    let operator_shutdown = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = operator_ui::serve(operator_fleet, operator_addr) => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "operator UI exited");
                }
            }
            _ = operator_shutdown.wait() => {}
        }
    });

    shutdown.wait().await;
    tracing::info!("shutting down");
    Ok(())
}

async fn spawn_station(
    config: &AppConfig,
    fleet: &Arc<Fleet>,
    descriptor: StationDescriptor,
    shutdown: &ShutdownSignal,
) -> Result<(), Box<dyn std::error::Error>> {
    let station_id = descriptor.charging_station_id.clone();
    let url = format!("{}/{}", config.central_system_url.trim_end_matches('/'), station_id);
    let transport = WsTransport::connect(&url).await?;

    let diagnostics: Arc<dyn DiagnosticsCollaborator> =
        Arc::new(FileSystemDiagnostics::new(config.diagnostics_log_root.clone()));

    let handle = StationHandle::new(
        descriptor,
        transport.clone(),
        Arc::new(TracingPerformanceSink),
        diagnostics,
    );
    transport.bind_station(&handle);
    fleet.register(Arc::clone(&handle));

    match perform_boot_handshake(&handle).await {
        Ok(registration) => tracing::info!(station_id, ?registration, "boot handshake complete"),
        Err(e) => tracing::warn!(station_id, error = %e, "boot handshake failed, station stays Unknown"),
    }

    spawn_heartbeat_timer(Arc::clone(&handle), shutdown.clone());
    spawn_ping_timer(Arc::clone(&handle), shutdown.clone());

    let atg = Atg::new(Arc::clone(&handle));
    atg.start().await;

    tracing::info!(station_id, "station started");
    Ok(())
}

fn spawn_heartbeat_timer(handle: Arc<StationHandle>, shutdown: ShutdownSignal) {
    tokio::spawn(async move {
        loop {
            let interval_secs: u64 = handle
                .with_state("heartbeat.read_interval", |s| {
                    s.configuration
                        .get("HeartbeatInterval")
                        .and_then(|entry| entry.value.parse().ok())
                })
                .await
                .unwrap_or(300);

            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_secs(interval_secs)) => {
                    let _ = handle.outbound().heartbeat().await;
                }
                _ = handle.heartbeat_restart.notified() => {}
                _ = shutdown.wait() => break,
            }
        }
    });
}

fn spawn_ping_timer(handle: Arc<StationHandle>, shutdown: ShutdownSignal) {
    tokio::spawn(async move {
        loop {
            let interval_secs: u64 = handle
                .with_state("ping.read_interval", |s| {
                    s.configuration
                        .get("WebSocketPingInterval")
                        .and_then(|entry| entry.value.parse().ok())
                })
                .await
                .unwrap_or(60);

            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_secs(interval_secs)) => {
                    tracing::trace!(station_id = handle.station_id(), "websocket ping tick");
                }
                _ = handle.ping_restart.notified() => {}
                _ = shutdown.wait() => break,
            }
        }
    });
}
