// src/watchlist.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ListError;
use crate::models::Position;

/// Ordered list of tracked positions. Order is what the table shows, so
/// moves only ever swap neighbors. Duplicate symbols are allowed; a quote
/// for a symbol updates every matching row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchList {
    positions: Vec<Position>,
}

impl WatchList {
    pub fn new() -> Self {
        WatchList::default()
    }

    pub fn from_positions(positions: Vec<Position>) -> Self {
        WatchList { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Distinct symbols in display order, for one batched quote request.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for position in &self.positions {
            if !symbols.contains(&position.symbol) {
                symbols.push(position.symbol.clone());
            }
        }
        symbols
    }

    pub fn add(&mut self, symbol: &str, shares: f64, price_paid: f64) -> Result<(), ListError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(ListError::EmptySymbol);
        }
        if shares < 0.0 || price_paid < 0.0 {
            return Err(ListError::InvalidAmount);
        }
        self.positions.push(Position::new(symbol, shares, price_paid));
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<Position, ListError> {
        if index >= self.positions.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.positions.remove(index))
    }

    /// Swaps the entry with the one above it. Moving the first entry up is
    /// a no-op, not an error.
    pub fn move_up(&mut self, index: usize) -> Result<(), ListError> {
        if index >= self.positions.len() {
            return Err(self.out_of_range(index));
        }
        if index > 0 {
            self.positions.swap(index, index - 1);
        }
        Ok(())
    }

    /// Swaps the entry with the one below it. Moving the last entry down is
    /// a no-op, not an error.
    pub fn move_down(&mut self, index: usize) -> Result<(), ListError> {
        let len = self.positions.len();
        if index >= len {
            return Err(self.out_of_range(index));
        }
        if index + 1 < len {
            self.positions.swap(index, index + 1);
        }
        Ok(())
    }

    /// Writes a fresh quote into every position holding the symbol and
    /// returns how many rows changed. Order and the other fields stay put.
    pub fn apply_quote(&mut self, symbol: &str, price: f64, timestamp: DateTime<Utc>) -> usize {
        let symbol = symbol.trim().to_uppercase();
        let mut updated = 0;
        for position in self.positions.iter_mut().filter(|p| p.symbol == symbol) {
            position.last_price = Some(price);
            position.last_updated = Some(timestamp);
            updated += 1;
        }
        updated
    }

    pub fn last_price(&self, symbol: &str) -> Option<f64> {
        let symbol = symbol.trim().to_uppercase();
        self.positions
            .iter()
            .find(|p| p.symbol == symbol)
            .and_then(|p| p.last_price)
    }

    fn out_of_range(&self, index: usize) -> ListError {
        ListError::IndexOutOfRange {
            index,
            len: self.positions.len(),
        }
    }
}
