use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A source of fixed-deposit rate quotes. `rate` is percent per annum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    pub id: String,
    pub name: String,
    pub description: String,
    pub color: String,
    pub rate: f64,
}

impl Bank {
    fn preset(id: &str, name: &str, description: &str, color: &str, rate: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            color: color.into(),
            rate,
        }
    }
}

static DEFAULT_BANKS: Lazy<Vec<Bank>> = Lazy::new(|| {
    vec![
        Bank::preset(
            "mbank",
            "M Bank",
            "The big yellow tiger. Steady and reliable.",
            "yellow",
            2.50,
        ),
        Bank::preset(
            "cbank",
            "C Bank",
            "Bold red. Pays a little more for patience.",
            "red",
            2.65,
        ),
        Bank::preset(
            "ubank",
            "U Bank",
            "Friendly neighbourhood bank with the best board rate.",
            "pink",
            2.80,
        ),
    ]
});

/// The fixed set of banks with their fallback rates, in display order.
pub fn default_banks() -> Vec<Bank> {
    DEFAULT_BANKS.clone()
}

pub fn is_known_bank(id: &str) -> bool {
    DEFAULT_BANKS.iter().any(|bank| bank.id == id)
}
