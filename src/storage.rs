// src/storage.rs
use std::fs;
use std::path::PathBuf;

use crate::error::StoreError;
use crate::watchlist::WatchList;

/// Persistence seam for the watch list. Loaded once at startup, saved
/// after every structural edit.
pub trait WatchStore: Send + Sync {
    fn load(&self) -> Result<WatchList, StoreError>;
    fn save(&self, list: &WatchList) -> Result<(), StoreError>;
}

/// Keeps the list as a JSON array in a single file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        JsonFileStore { path }
    }
}

impl WatchStore for JsonFileStore {
    fn load(&self) -> Result<WatchList, StoreError> {
        // First launch: no file yet, start with an empty list.
        if !self.path.exists() {
            return Ok(WatchList::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        let list = serde_json::from_str(&raw)?;
        Ok(list)
    }

    fn save(&self, list: &WatchList) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(list)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn temp_store(tag: &str) -> JsonFileStore {
        let path = std::env::temp_dir().join(format!(
            "stockwatch-{}-{}.json",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        JsonFileStore::new(path)
    }

    #[test]
    fn missing_file_loads_as_empty_list() {
        let store = temp_store("missing");
        let list = store.load().unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn round_trip_preserves_positions_and_order() {
        let store = temp_store("roundtrip");
        let mut list = WatchList::new();
        list.add("MSFT", 5.0, 200.0).unwrap();
        list.add("AAPL", 10.0, 100.0).unwrap();
        list.apply_quote("AAPL", 105.0, Utc::now());

        store.save(&list).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.positions()[0].symbol, "MSFT");
        assert_eq!(loaded.positions()[1].symbol, "AAPL");
        assert_eq!(loaded.positions()[1].last_price, Some(105.0));

        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn corrupt_file_is_a_format_error() {
        let store = temp_store("corrupt");
        fs::write(&store.path, "not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Format(_))));
        let _ = fs::remove_file(&store.path);
    }
}
