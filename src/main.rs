use button_input::config::ButtonConfig;
use button_input::service::{ButtonService, Created};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ButtonConfig::load(config_path.as_deref()).await?;
    info!("Starting button daemon with config: {:?}", config);

    let service = ButtonService::<Created>::create(config)
        .map_err(|e| eyre!("Failed to open button driver: {}", e))?;
    let running = service
        .start()
        .map_err(|e| eyre!("Failed to register input device: {}", e))?;

    wait_for_shutdown().await?;
    info!("Shutdown requested");

    running
        .stop()
        .shutdown()
        .await
        .map_err(|e| eyre!("Error closing button driver: {}", e))?;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

async fn wait_for_shutdown() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = terminate.recv() => info!("Received SIGTERM"),
    }
    Ok(())
}
