// src/error.rs
use std::fmt;

#[derive(Debug)]
pub enum FetchError {
    Network(String),
    Auth(String),
    Parse(String),
    EmptySymbolSet,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "network error: {}", msg),
            FetchError::Auth(msg) => write!(f, "authentication failed: {}", msg),
            FetchError::Parse(msg) => write!(f, "malformed payload: {}", msg),
            FetchError::EmptySymbolSet => write!(f, "no symbols to fetch"),
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, PartialEq, Eq)]
pub enum ListError {
    IndexOutOfRange { index: usize, len: usize },
    EmptySymbol,
    InvalidAmount,
}

impl fmt::Display for ListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListError::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for list of {}", index, len)
            }
            ListError::EmptySymbol => write!(f, "symbol must not be empty"),
            ListError::InvalidAmount => {
                write!(f, "shares and price paid must be non-negative")
            }
        }
    }
}

impl std::error::Error for ListError {}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Format(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "storage io error: {}", e),
            StoreError::Format(e) => write!(f, "storage format error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Format(e)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}
