use std::time::Duration;

use anyhow::Context;
use backon::BlockingRetryable;
use backon::ConstantBuilder;
use classifier::Classifier;
use config::Config;
use db::DB;
use display::LedMatrix;
use log::LevelFilter;
use monitor::Monitor;
use sensor::SenseHat;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

mod classifier;
mod config;
mod db;
mod display;
mod hts221;
mod lps25h;
mod lsm9ds1;
mod monitor;
mod reading;
mod sensor;

const EXIT_STARTUP_ERROR: i32 = 1;
const EXIT_CONFIG_ERROR: i32 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    TermLogger::init(
        LevelFilter::Info,
        ConfigBuilder::new()
            .set_time_format_rfc3339()
            .set_time_offset_to_local()
            .map_err(|_| anyhow::anyhow!("Failed to set time offset to local"))?
            .build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;

    let config_path =
        std::env::var(config::CONFIG_ENV).unwrap_or_else(|_| config::CONFIG_FILE.to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e:#}");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };
    log::info!("Loaded config from {config_path}");

    if let Err(e) = run(config).await {
        log::error!("{e:#}");
        std::process::exit(EXIT_STARTUP_ERROR);
    }

    Ok(())
}

pub async fn run(config: Config) -> Result<(), anyhow::Error> {
    let retry_builder = ConstantBuilder::default()
        .with_delay(Duration::from_millis(100))
        .with_max_times(20);

    let mut sense_hat = SenseHat::new(config.meta.temperature_calibration_offset)
        .context("Failed to initialize Sense HAT")?;
    (|| sense_hat.init())
        .retry(retry_builder)
        .notify(|e, dur| {
            log::error!("{e:#}");
            log::info!("Retrying in {:?}", dur);
        })
        .call()
        .context("Failed to initialize Sense HAT sensors")?;

    let led_matrix = (LedMatrix::new)
        .retry(retry_builder)
        .notify(|e, dur| {
            log::error!("{e:#}");
            log::info!("Retrying in {:?}", dur);
        })
        .call()
        .context("Failed to initialize LED matrix")?;

    let db = DB::new(&config.meta.db_path).context("Failed to initialize database")?;
    db.init().context("Failed to initialize database")?;

    let monitor = Monitor::new(
        sense_hat,
        led_matrix,
        db,
        Classifier::new(config.thresholds),
        config.poll_interval(),
    );
    log::info!("Sampling every {:?}", config.poll_interval());

    monitor.run(shutdown_signal()).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to wait for Ctrl+C signal: {e}");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
