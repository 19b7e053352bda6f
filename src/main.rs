// main.rs - Entry point for the Pacifica/Lighter funding arbitrage monitor

use env_logger::Env;
use fundfury::config::{get_config, init_config, Config};
use fundfury::error_handling::init_error_tracker;
use fundfury::{run_funding_display, AppError, FundingMonitor};
use log::{error, info, LevelFilter};
use std::io::Write;

/// Environment variable naming an alternative config file
const CONFIG_PATH_ENV: &str = "FUNDFURY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration from file
    let config_path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config_status = match init_config(&config_path) {
        Ok(_) => Ok(()),
        Err(e) => {
            let _ = Config::global().set(Config::default().with_env_overrides());
            Err(e)
        }
    };

    // Initialize the error tracker
    init_error_tracker();

    let config = get_config();

    // Configure logging based on configuration
    env_logger::Builder::from_env(Env::default().default_filter_or(&config.general.log_level))
        .filter_module("fundfury::terminal_log", LevelFilter::Info)
        .filter_module("fundfury::cross_exchange", LevelFilter::Info)
        .format(|buf, record| {
            if record.level() <= log::Level::Info {
                writeln!(buf, "[{}] {}", record.level(), record.args())
            } else {
                writeln!(
                    buf,
                    "[{} {}:{}] {}",
                    record.level(),
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            }
        })
        .filter_module("hyper", LevelFilter::Warn)
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("tokio", LevelFilter::Warn)
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    match config_status {
        Ok(()) => info!("Configuration loaded from {}", config_path),
        Err(e) => {
            error!("Error loading configuration from {}: {}", config_path, e);
            info!("Falling back to default configuration");
        }
    }

    info!("Starting FundFury funding arbitrage monitor");
    info!(
        "Pacifica: {} | Lighter: {}",
        config.sources.pacifica_base_url, config.sources.lighter_base_url
    );

    let monitor = FundingMonitor::from_config(config)?;
    let display = tokio::spawn(run_funding_display(
        monitor.subscribe(),
        config.display.view_options(),
        config.display.clone(),
    ));
    monitor.start();

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    }

    info!("Shutting down");
    monitor.shutdown();
    display.abort();

    Ok(())
}
