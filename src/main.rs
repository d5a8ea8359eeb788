// src/main.rs
use std::fs::OpenOptions;
use std::process;
use std::sync::Arc;

use env_logger::{Builder, Target};
use log::{error, info, warn, LevelFilter};

use stockwatch::api::ApiClient;
use stockwatch::config;
use stockwatch::scheduler::RefreshScheduler;
use stockwatch::sink::LogSink;
use stockwatch::storage::{JsonFileStore, WatchStore};
use stockwatch::watchlist::WatchList;

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "stockwatch.json".to_string());
    let config = match config::load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config {}: {}", config_path, e);
            process::exit(1);
        }
    };

    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .format_timestamp_secs();
    if let Some(path) = &config.log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Failed to open log file {}: {}", path.display(), e),
        }
    }
    builder.init();

    info!("Starting the stock watch engine...");
    let store = Arc::new(JsonFileStore::new(config.watchlist_file.clone()));
    let list = match store.load() {
        Ok(list) => list,
        Err(e) => {
            warn!("Failed to load watch list, starting empty: {}", e);
            WatchList::default()
        }
    };
    info!("Loaded {} positions", list.len());

    let api = Arc::new(ApiClient::new(
        config.base_url.clone(),
        config.api_key.clone(),
    ));
    let mut scheduler = RefreshScheduler::new(config, list, api.clone(), api, Arc::new(LogSink), store);
    scheduler.start();

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for shutdown signal: {}", e);
    }
    scheduler.stop();
    info!("Stopped");
}
