#![doc(test(attr(deny(warnings))))]

//! StarJar keeps a points ledger for children: chores and good behaviour earn
//! points, rewards spend them, and saved points can be locked in simulated
//! fixed deposits that pay interest at maturity.
//!
//! [`core::LedgerManager`] is the entry point. It owns a [`storage::StateStore`]
//! and applies every change as a single transaction.

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod providers;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("StarJar tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
