// src/scheduler.rs
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time;

use crate::api::{NewsSource, QuoteSource};
use crate::config::RefreshConfig;
use crate::error::{FetchError, ListError};
use crate::models::{NewsItem, QuoteEntry};
use crate::notify::Notifier;
use crate::sink::PresentationSink;
use crate::storage::WatchStore;
use crate::watchlist::WatchList;

#[derive(Debug, Clone, Copy)]
enum Lane {
    Quotes,
    News,
}

impl Lane {
    fn name(self) -> &'static str {
        match self {
            Lane::Quotes => "quote",
            Lane::News => "news",
        }
    }
}

#[derive(Debug)]
pub enum EditCommand {
    Add {
        symbol: String,
        shares: f64,
        price_paid: f64,
    },
    Delete {
        index: usize,
    },
    MoveUp {
        index: usize,
    },
    MoveDown {
        index: usize,
    },
}

enum Msg {
    Tick(Lane),
    Quotes(Result<HashMap<String, QuoteEntry>, FetchError>),
    News(Result<NewsItem, FetchError>),
    Edit {
        command: EditCommand,
        reply: oneshot::Sender<Result<(), ListError>>,
    },
}

/// Owns the watch list and drives the two refresh lanes.
///
/// All mutation happens in one spawned loop; timer ticks and fetch
/// completions only send messages into it, so a quote and a news fetch can
/// be in flight at once but their merges never race. Completions are not
/// fenced by sequence number: when overlapping fetches finish out of order
/// the later-applied result wins, stale or not.
///
/// `stop()` raises the final-update flag. Fetches already in flight are
/// left to finish, but once the flag is up their results are drained
/// without touching the list, the sink, or the store.
pub struct RefreshScheduler {
    config: RefreshConfig,
    tx: mpsc::Sender<Msg>,
    final_update: Arc<AtomicBool>,
    running: bool,
    lanes: Vec<JoinHandle<()>>,
    engine: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn new(
        config: RefreshConfig,
        list: WatchList,
        quotes: Arc<dyn QuoteSource>,
        news: Arc<dyn NewsSource>,
        sink: Arc<dyn PresentationSink>,
        store: Arc<dyn WatchStore>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let final_update = Arc::new(AtomicBool::new(false));
        let engine = Engine {
            list,
            news_text: String::new(),
            last_update: None,
            notifier: Notifier::new(sink.clone(), config.price_alert_epsilon),
            quotes,
            news,
            sink,
            store,
            final_update: final_update.clone(),
            tx: tx.clone(),
        };
        // The mutation loop runs for the scheduler's whole life so list
        // edits keep working while polling is stopped.
        let engine = tokio::spawn(engine.run(rx));
        RefreshScheduler {
            config,
            tx,
            final_update,
            running: false,
            lanes: Vec::new(),
            engine,
        }
    }

    /// Begins both refresh lanes. No-op while already running or after
    /// `stop()`.
    pub fn start(&mut self) {
        if self.running || self.final_update.load(Ordering::SeqCst) {
            return;
        }
        info!(
            "Starting refresh: quotes every {}s, news every {}s",
            self.config.quote_rate_secs, self.config.news_rate_secs
        );
        self.lanes.push(spawn_lane(
            self.tx.clone(),
            self.final_update.clone(),
            self.config.quote_interval(),
            Lane::Quotes,
        ));
        self.lanes.push(spawn_lane(
            self.tx.clone(),
            self.final_update.clone(),
            self.config.news_interval(),
            Lane::News,
        ));
        self.running = true;
    }

    /// Requests cancellation. In-flight fetches finish but no longer have
    /// any visible effect. No-op when not running. A stopped scheduler
    /// stays stopped; new rates or credentials mean a new instance.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        info!("Stopping refresh, in-flight fetches will be discarded");
        self.final_update.store(true, Ordering::SeqCst);
        for lane in self.lanes.drain(..) {
            lane.abort();
        }
        self.running = false;
    }

    pub async fn add(&self, symbol: &str, shares: f64, price_paid: f64) -> Result<(), ListError> {
        self.edit(EditCommand::Add {
            symbol: symbol.to_string(),
            shares,
            price_paid,
        })
        .await
    }

    pub async fn delete(&self, index: usize) -> Result<(), ListError> {
        self.edit(EditCommand::Delete { index }).await
    }

    pub async fn move_up(&self, index: usize) -> Result<(), ListError> {
        self.edit(EditCommand::MoveUp { index }).await
    }

    pub async fn move_down(&self, index: usize) -> Result<(), ListError> {
        self.edit(EditCommand::MoveDown { index }).await
    }

    /// Applies one list edit on the mutation loop and waits for its result.
    pub async fn edit(&self, command: EditCommand) -> Result<(), ListError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Msg::Edit { command, reply })
            .await
            .expect("mutation loop lives as long as the scheduler");
        response
            .await
            .expect("mutation loop replies to every edit")
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
        self.engine.abort();
    }
}

fn spawn_lane(
    tx: mpsc::Sender<Msg>,
    final_update: Arc<AtomicBool>,
    period: Duration,
    lane: Lane,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Fixed cadence, first tick immediate. A slow fetch never delays
        // the next tick; overlapping requests are the merge step's problem.
        let mut ticker = time::interval(period);
        loop {
            ticker.tick().await;
            if final_update.load(Ordering::SeqCst) {
                break;
            }
            if tx.send(Msg::Tick(lane)).await.is_err() {
                break;
            }
        }
    })
}

struct Engine {
    list: WatchList,
    news_text: String,
    last_update: Option<DateTime<Utc>>,
    notifier: Notifier,
    quotes: Arc<dyn QuoteSource>,
    news: Arc<dyn NewsSource>,
    sink: Arc<dyn PresentationSink>,
    store: Arc<dyn WatchStore>,
    final_update: Arc<AtomicBool>,
    tx: mpsc::Sender<Msg>,
}

impl Engine {
    async fn run(mut self, mut rx: mpsc::Receiver<Msg>) {
        while let Some(msg) = rx.recv().await {
            self.handle(msg);
        }
    }

    fn handle(&mut self, msg: Msg) {
        match msg {
            Msg::Tick(lane) => self.on_tick(lane),
            Msg::Quotes(result) => self.on_quotes(result),
            Msg::News(result) => self.on_news(result),
            Msg::Edit { command, reply } => {
                let _ = reply.send(self.on_edit(command));
            }
        }
    }

    fn stopped(&self) -> bool {
        self.final_update.load(Ordering::SeqCst)
    }

    fn on_tick(&mut self, lane: Lane) {
        if self.stopped() {
            return;
        }
        let tx = self.tx.clone();
        match lane {
            Lane::Quotes => {
                let symbols = self.list.symbols();
                let quotes = self.quotes.clone();
                tokio::spawn(async move {
                    let result = quotes.fetch_quotes(&symbols).await;
                    let _ = tx.send(Msg::Quotes(result)).await;
                });
            }
            Lane::News => {
                let news = self.news.clone();
                tokio::spawn(async move {
                    let result = news.fetch_news().await;
                    let _ = tx.send(Msg::News(result)).await;
                });
            }
        }
    }

    fn on_quotes(&mut self, result: Result<HashMap<String, QuoteEntry>, FetchError>) {
        if self.stopped() {
            debug!("Discarding quote completion after stop");
            return;
        }
        let entries = match result {
            Ok(entries) => entries,
            Err(e) => return self.on_fetch_error(Lane::Quotes, e),
        };

        let mut applied = 0;
        for (symbol, entry) in &entries {
            let previous = self.list.last_price(symbol);
            let updated = self.list.apply_quote(symbol, entry.price, entry.timestamp);
            if updated > 0 {
                applied += updated;
                self.notifier.on_price_move(symbol, previous, entry.price);
            }
        }
        debug!("Applied quotes to {} positions", applied);
        self.last_update = Some(Utc::now());
        self.render();
    }

    fn on_news(&mut self, result: Result<NewsItem, FetchError>) {
        if self.stopped() {
            debug!("Discarding news completion after stop");
            return;
        }
        let item = match result {
            Ok(item) => item,
            Err(e) => return self.on_fetch_error(Lane::News, e),
        };

        self.news_text = item.text.clone();
        self.notifier.on_news(&item);
        self.last_update = Some(item.fetched_at);
        self.render();
    }

    fn on_fetch_error(&mut self, lane: Lane, err: FetchError) {
        match err {
            // Not a failure: nothing is tracked, so the lane skipped the call.
            FetchError::EmptySymbolSet => {
                debug!("No symbols tracked, {} fetch skipped", lane.name())
            }
            FetchError::Auth(_) => {
                error!("Failed to fetch {}: {}", lane.name(), err);
                self.sink
                    .show_status(&format!("{} refresh rejected, check API key", lane.name()));
            }
            // Transient; the lane keeps its schedule, no backoff.
            _ => error!("Failed to fetch {}: {}", lane.name(), err),
        }
    }

    fn on_edit(&mut self, command: EditCommand) -> Result<(), ListError> {
        match command {
            EditCommand::Add {
                symbol,
                shares,
                price_paid,
            } => self.list.add(&symbol, shares, price_paid)?,
            EditCommand::Delete { index } => {
                self.list.delete(index)?;
            }
            EditCommand::MoveUp { index } => self.list.move_up(index)?,
            EditCommand::MoveDown { index } => self.list.move_down(index)?,
        }
        if let Err(e) = self.store.save(&self.list) {
            error!("Failed to persist watch list: {}", e);
        }
        self.render();
        Ok(())
    }

    fn render(&self) {
        self.sink.render(&self.list, &self.news_text, self.last_update);
    }
}
