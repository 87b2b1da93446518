use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

/// A link backing a quoted rate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateCitation {
    pub title: String,
    pub uri: String,
}

/// Fresh rates keyed by bank id, with where they came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RateQuote {
    #[serde(default)]
    pub rates: BTreeMap<String, f64>,
    #[serde(default)]
    pub sources: Vec<RateCitation>,
}

pub trait RateProvider {
    /// Returns `None` when no usable quote could be obtained.
    fn fetch_rates(&self) -> Option<RateQuote>;
}

/// Reads a JSON rate feed of the form `{"rates": {...}, "sources": [...]}`.
#[derive(Debug, Clone)]
pub struct FeedFileRates {
    path: PathBuf,
}

impl FeedFileRates {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RateProvider for FeedFileRates {
    fn fetch_rates(&self) -> Option<RateQuote> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "rate feed unavailable");
                return None;
            }
        };
        let mut quote: RateQuote = match serde_json::from_str(&raw) {
            Ok(quote) => quote,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "rate feed is malformed");
                return None;
            }
        };
        let mut seen = HashSet::new();
        quote.sources.retain(|source| seen.insert(source.uri.clone()));
        if quote.rates.is_empty() {
            tracing::warn!(path = %self.path.display(), "rate feed has no rates");
            return None;
        }
        Some(quote)
    }
}

/// Always answers with the same quote.
#[derive(Debug, Clone, Default)]
pub struct StaticRates(pub Option<RateQuote>);

impl RateProvider for StaticRates {
    fn fetch_rates(&self) -> Option<RateQuote> {
        self.0.clone()
    }
}
