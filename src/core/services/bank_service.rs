use std::collections::BTreeMap;

use crate::ledger::{default_banks, is_known_bank, Bank};

use super::{ServiceError, ServiceResult};

/// Resolves the bank list against persisted rate overrides.
pub struct BankService;

impl BankService {
    /// Default banks in display order with any override applied.
    pub fn banks(overrides: &BTreeMap<String, f64>) -> Vec<Bank> {
        default_banks()
            .into_iter()
            .map(|mut bank| {
                if let Some(rate) = overrides.get(&bank.id) {
                    bank.rate = *rate;
                }
                bank
            })
            .collect()
    }

    pub fn find(overrides: &BTreeMap<String, f64>, bank_id: &str) -> ServiceResult<Bank> {
        let needle = bank_id.trim().to_lowercase();
        Self::banks(overrides)
            .into_iter()
            .find(|bank| bank.id == needle || bank.name.to_lowercase() == needle)
            .ok_or_else(|| ServiceError::NotFound(format!("Bank `{}`", bank_id.trim())))
    }

    pub fn validate_rate(rate: f64) -> ServiceResult<f64> {
        if rate.is_finite() && rate >= 0.0 {
            Ok(rate)
        } else {
            Err(ServiceError::Invalid(format!(
                "Rate must be a non-negative number, got {}",
                rate
            )))
        }
    }

    /// Folds fresh quotes into `overrides`, returning how many were accepted.
    pub fn merge_rates(overrides: &mut BTreeMap<String, f64>, fresh: &BTreeMap<String, f64>) -> usize {
        let mut accepted = 0;
        for (bank_id, rate) in fresh {
            if !is_known_bank(bank_id) {
                tracing::warn!(bank = %bank_id, "ignoring rate for unknown bank");
                continue;
            }
            if Self::validate_rate(*rate).is_err() {
                tracing::warn!(bank = %bank_id, rate, "ignoring invalid rate");
                continue;
            }
            overrides.insert(bank_id.clone(), *rate);
            accepted += 1;
        }
        accepted
    }
}
