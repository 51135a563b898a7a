//! Shipgate - Entry Point
//!
//! A minimal self-hosted deploy trigger. Listens for push webhooks from a
//! source-control host and runs the configured project's deploy steps.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use secrecy::SecretString;
use shipgate::app::options::{AppOptions, ServerOptions};
use shipgate::app::run::run;
use shipgate::config::Config;
use shipgate::deploy::executor;
use shipgate::logs::{init_logging, LogOptions};
use shipgate::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load .env before reading the environment
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(rendered) => println!("{}", rendered),
            Err(e) => println!("Failed to render version info: {e}"),
        }
        return;
    }

    // Initialize logging
    if let Err(e) = init_logging(LogOptions::default()) {
        println!("Failed to initialize logging: {e}");
    }

    // Load the project configuration
    let config_path = cli_args
        .get("config")
        .cloned()
        .unwrap_or_else(|| "config.json".to_string());
    let config = match Config::load(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to load configuration: {}", e);
            return;
        }
    };

    // Environment inputs
    let secret = env::var("WEBHOOK_SECRET").ok().map(SecretString::from);

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = match env::var("PORT") {
        Ok(raw) => match raw.parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                error!("Invalid PORT value: {}", raw);
                return;
            }
        },
        Err(_) => 9000,
    };

    let options = AppOptions {
        server: ServerOptions { host, port },
        deploy: executor::Options {
            logs_dir: cli_args
                .get("logs-dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs")),
            ..Default::default()
        },
    };

    info!("Running shipgate {}", version.version);
    let result = run(options, config, secret, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the deploy server: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                let _ = tokio::signal::ctrl_c().await;
                info!("Ctrl+C received, shutting down...");
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            // No shutdown signal available; run until the process is killed
            std::future::pending::<()>().await;
        }
        info!("Ctrl+C received, shutting down...");
    }
}
