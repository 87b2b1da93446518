use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    activity::{ActivityCategory, ActivityLog},
    child::Child,
    investment::Investment,
};

/// The three mutually consistent collections that make up a family's ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ledger {
    #[serde(default)]
    pub children: Vec<Child>,
    #[serde(default)]
    pub logs: Vec<ActivityLog>,
    #[serde(default)]
    pub investments: Vec<Investment>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self, id: Uuid) -> Option<&Child> {
        self.children.iter().find(|child| child.id == id)
    }

    pub fn child_mut(&mut self, id: Uuid) -> Option<&mut Child> {
        self.children.iter_mut().find(|child| child.id == id)
    }

    pub fn log(&self, id: Uuid) -> Option<&ActivityLog> {
        self.logs.iter().find(|log| log.id == id)
    }

    pub fn investment(&self, id: Uuid) -> Option<&Investment> {
        self.investments.iter().find(|inv| inv.id == id)
    }

    pub fn investment_mut(&mut self, id: Uuid) -> Option<&mut Investment> {
        self.investments.iter_mut().find(|inv| inv.id == id)
    }

    pub fn logs_for(&self, child_id: Uuid) -> impl Iterator<Item = &ActivityLog> {
        self.logs.iter().filter(move |log| log.child_id == child_id)
    }

    pub fn investments_for(&self, child_id: Uuid) -> impl Iterator<Item = &Investment> {
        self.investments
            .iter()
            .filter(move |inv| inv.child_id == child_id)
    }

    /// Sum of the child's log entries, independent of the cached total.
    /// `None` when the sum does not fit in an `i64`.
    pub fn balance_of(&self, child_id: Uuid) -> Option<i64> {
        self.logs_for(child_id)
            .try_fold(0i64, |sum, log| sum.checked_add(log.points))
    }

    /// The child's total once `delta` is applied, or `None` for an unknown
    /// child or a total outside the `i64` range.
    pub fn total_after(&self, child_id: Uuid, delta: i64) -> Option<i64> {
        self.child(child_id)?.total_points.checked_add(delta)
    }

    /// Applies `delta` to the child's cached total and returns the new total.
    /// Nothing changes when [`Ledger::total_after`] yields `None`.
    pub fn adjust_balance(&mut self, child_id: Uuid, delta: i64) -> Option<i64> {
        let total = self.total_after(child_id, delta)?;
        self.child_mut(child_id)?.total_points = total;
        Some(total)
    }

    /// Appends an entry and moves its owner's total by the entry's points.
    ///
    /// Returns `None` and leaves the ledger untouched when the owner is unknown
    /// or the new total would overflow.
    pub fn post_entry(&mut self, entry: ActivityLog) -> Option<Uuid> {
        self.adjust_balance(entry.child_id, entry.points)?;
        let id = entry.id;
        self.logs.push(entry);
        Some(id)
    }

    /// Removes an entry and takes its points back from the owner.
    ///
    /// Entries of unknown children are dropped without touching any total.
    /// Returns `None` when the entry is missing or the owner's total would overflow.
    pub fn remove_log(&mut self, id: Uuid) -> Option<ActivityLog> {
        let index = self.logs.iter().position(|log| log.id == id)?;
        let (child_id, points) = (self.logs[index].child_id, self.logs[index].points);
        if self.child(child_id).is_some() {
            self.adjust_balance(child_id, points.checked_neg()?)?;
        }
        Some(self.logs.remove(index))
    }

    /// Human readable descriptions of every broken cross-collection invariant.
    pub fn warnings(&self) -> Vec<String> {
        let child_ids: HashSet<_> = self.children.iter().map(|c| c.id).collect();
        let mut sums: HashMap<Uuid, i128> = HashMap::new();
        let mut warnings = Vec::new();

        for log in &self.logs {
            if child_ids.contains(&log.child_id) {
                *sums.entry(log.child_id).or_default() += i128::from(log.points);
            } else {
                warnings.push(format!(
                    "log {} references unknown child {}",
                    log.id, log.child_id
                ));
            }
        }

        for child in &self.children {
            let sum = sums.get(&child.id).copied().unwrap_or_default();
            if sum != i128::from(child.total_points) {
                warnings.push(format!(
                    "child `{}` shows {} points but its log sums to {}",
                    child.name, child.total_points, sum
                ));
            }
        }

        for inv in &self.investments {
            if !child_ids.contains(&inv.child_id) {
                warnings.push(format!(
                    "investment {} references unknown child {}",
                    inv.id, inv.child_id
                ));
                continue;
            }
            if inv.is_active() {
                let debited = self.logs_for(inv.child_id).any(|log| {
                    log.category == ActivityCategory::Investment && log.points == -inv.principal
                });
                if !debited {
                    warnings.push(format!(
                        "active investment {} has no matching debit entry",
                        inv.id
                    ));
                }
            }
        }

        warnings
    }
}
