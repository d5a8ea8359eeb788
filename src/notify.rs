// src/notify.rs
use std::sync::Arc;

use log::info;

use crate::models::NewsItem;
use crate::sink::PresentationSink;

/// Decides when the user gets a popup. News pops on a novel feed id only;
/// price pops are optional and gated by an epsilon so quote jitter stays
/// quiet.
pub struct Notifier {
    sink: Arc<dyn PresentationSink>,
    last_news_id: Option<i64>,
    price_epsilon: Option<f64>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn PresentationSink>, price_epsilon: Option<f64>) -> Self {
        Notifier {
            sink,
            last_news_id: None,
            price_epsilon,
        }
    }

    /// Pops the item iff its id differs from the last one seen, then
    /// remembers the id. Returns whether a popup was shown.
    pub fn on_news(&mut self, item: &NewsItem) -> bool {
        if self.last_news_id == Some(item.id) {
            return false;
        }
        self.last_news_id = Some(item.id);
        info!("New market news, id {}", item.id);
        self.sink.show_popup(&item.text);
        true
    }

    /// Pops when a freshly fetched price differs from the previously
    /// applied one by more than the configured epsilon. Disabled when no
    /// epsilon is configured or the symbol has no prior price.
    pub fn on_price_move(&mut self, symbol: &str, previous: Option<f64>, price: f64) -> bool {
        let Some(epsilon) = self.price_epsilon else {
            return false;
        };
        let Some(previous) = previous else {
            return false;
        };
        if (price - previous).abs() <= epsilon {
            return false;
        }
        self.sink
            .show_popup(&format!("{}: {:.2} to {:.2}", symbol, previous, price));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    use crate::watchlist::WatchList;
    use chrono::DateTime;

    #[derive(Default)]
    struct PopupCounter {
        popups: Mutex<Vec<String>>,
    }

    impl PresentationSink for PopupCounter {
        fn render(&self, _list: &WatchList, _news: &str, _last_update: Option<DateTime<Utc>>) {}

        fn show_popup(&self, text: &str) {
            self.popups.lock().unwrap().push(text.to_string());
        }

        fn show_status(&self, _text: &str) {}
    }

    fn item(id: i64) -> NewsItem {
        NewsItem {
            id,
            text: format!("headline {}", id),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn news_pops_once_per_id() {
        let sink = Arc::new(PopupCounter::default());
        let mut notifier = Notifier::new(sink.clone(), None);

        assert!(notifier.on_news(&item(42)));
        assert!(!notifier.on_news(&item(42)));
        assert!(!notifier.on_news(&item(42)));
        assert_eq!(sink.popups.lock().unwrap().len(), 1);

        assert!(notifier.on_news(&item(43)));
        assert_eq!(sink.popups.lock().unwrap().len(), 2);
    }

    #[test]
    fn price_pops_only_past_epsilon() {
        let sink = Arc::new(PopupCounter::default());
        let mut notifier = Notifier::new(sink.clone(), Some(0.5));

        assert!(!notifier.on_price_move("AAPL", Some(100.0), 100.4));
        assert!(notifier.on_price_move("AAPL", Some(100.0), 101.0));
        assert_eq!(sink.popups.lock().unwrap().len(), 1);
    }

    #[test]
    fn price_pop_needs_a_previous_price_and_an_epsilon() {
        let sink = Arc::new(PopupCounter::default());

        let mut silent = Notifier::new(sink.clone(), None);
        assert!(!silent.on_price_move("AAPL", Some(100.0), 200.0));

        let mut armed = Notifier::new(sink.clone(), Some(0.5));
        assert!(!armed.on_price_move("AAPL", None, 200.0));

        assert!(sink.popups.lock().unwrap().is_empty());
    }
}
