// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tracked holding. The symbol is fixed at creation; the quote fields
/// stay empty until the first successful fetch and are replaced together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub shares: f64,
    pub price_paid: f64,
    #[serde(default)]
    pub last_price: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Position {
    pub fn new(symbol: &str, shares: f64, price_paid: f64) -> Self {
        Position {
            symbol: symbol.trim().to_uppercase(),
            shares,
            price_paid,
            last_price: None,
            last_updated: None,
        }
    }

    pub fn market_value(&self) -> Option<f64> {
        self.last_price.map(|price| price * self.shares)
    }

    pub fn gain(&self) -> Option<f64> {
        self.last_price.map(|price| (price - self.price_paid) * self.shares)
    }
}

/// One entry of a quote response: symbol maps to this. Fields beyond
/// price and timestamp are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteEntry {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewsItem {
    pub id: i64,
    pub text: String,
    pub fetched_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_position_normalizes_symbol_and_has_no_quote() {
        let position = Position::new("  aapl ", 10.0, 100.0);
        assert_eq!(position.symbol, "AAPL");
        assert_eq!(position.last_price, None);
        assert_eq!(position.last_updated, None);
        assert_eq!(position.market_value(), None);
        assert_eq!(position.gain(), None);
    }

    #[test]
    fn value_and_gain_follow_last_price() {
        let mut position = Position::new("AAPL", 10.0, 100.0);
        position.last_price = Some(105.0);
        assert_eq!(position.market_value(), Some(1050.0));
        assert_eq!(position.gain(), Some(50.0));
    }
}
