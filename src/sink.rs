// src/sink.rs
use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::watchlist::WatchList;

/// Where the engine pushes fresh state. The desktop app hangs its window
/// off this seam; the bundled binary just logs. All calls are
/// fire-and-forget.
pub trait PresentationSink: Send + Sync {
    /// Called after every successful merge and after every list edit.
    fn render(&self, list: &WatchList, news: &str, last_update: Option<DateTime<Utc>>);

    /// Transient popup; dismissal timing is the sink's concern.
    fn show_popup(&self, text: &str);

    /// Status line for non-fatal trouble the user should see, e.g. a
    /// rejected API key.
    fn show_status(&self, text: &str);
}

/// Log-backed sink used by the headless binary.
pub struct LogSink;

impl PresentationSink for LogSink {
    fn render(&self, list: &WatchList, news: &str, last_update: Option<DateTime<Utc>>) {
        let stamp = last_update
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        info!("Tracking {} positions, last update {}", list.len(), stamp);
        for position in list.positions() {
            match (position.last_price, position.gain()) {
                (Some(price), Some(gain)) => info!(
                    "  {} {} @ {} now {:.2} ({:+.2})",
                    position.symbol, position.shares, position.price_paid, price, gain
                ),
                _ => info!(
                    "  {} {} @ {} (no quote yet)",
                    position.symbol, position.shares, position.price_paid
                ),
            }
        }
        if !news.is_empty() {
            info!("News: {}", news);
        }
    }

    fn show_popup(&self, text: &str) {
        info!("[popup] {}", text);
    }

    fn show_status(&self, text: &str) {
        warn!("[status] {}", text);
    }
}
