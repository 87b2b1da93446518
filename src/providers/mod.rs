//! External collaborators: bank rate quotes and activity suggestions.
//!
//! Collaborators are allowed to fail. A failure is reported as `None` and the
//! caller keeps whatever it already had.

pub mod rates;
pub mod suggest;

pub use rates::{FeedFileRates, RateCitation, RateProvider, RateQuote, StaticRates};
pub use suggest::{ActivitySuggester, ActivitySuggestion, PastEntrySuggester};

use crate::errors::LedgerError;
use crate::storage::StateStore;

pub const API_KEY_ENV: &str = "STARJAR_API_KEY";

/// Stored credential first, then `STARJAR_API_KEY`. Blank values count as unset.
pub fn resolve_api_key(store: &dyn StateStore) -> Result<Option<String>, LedgerError> {
    let stored = store
        .api_key()?
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty());
    if stored.is_some() {
        return Ok(stored);
    }
    Ok(std::env::var(API_KEY_ENV)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn stored_key_wins() {
        let store = MemoryStore::new();
        store.save_api_key(Some("  stored-key ")).unwrap();
        assert_eq!(
            resolve_api_key(&store).unwrap().as_deref(),
            Some("stored-key")
        );
    }
}
