//! Month-grouped views over a child's activity log.

use chrono::{Datelike, NaiveDate, TimeZone};
use uuid::Uuid;

use crate::ledger::{ActivityLog, Ledger};

/// Entries that fall in one calendar month, newest first.
#[derive(Debug, Clone)]
pub struct MonthGroup<'a> {
    pub year: i32,
    pub month: u32,
    pub entries: Vec<&'a ActivityLog>,
}

impl MonthGroup<'_> {
    /// Heading such as "March 2024".
    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|date| date.format("%B %Y").to_string())
            .unwrap_or_else(|| format!("{}-{:02}", self.year, self.month))
    }

    pub fn net_points(&self) -> i64 {
        self.entries.iter().map(|entry| entry.points).sum()
    }
}

pub struct HistoryService;

impl HistoryService {
    /// Groups the child's entries by calendar month as seen in `tz`.
    pub fn monthly<'a, Tz: TimeZone>(
        ledger: &'a Ledger,
        child_id: Uuid,
        tz: &Tz,
    ) -> Vec<MonthGroup<'a>> {
        let mut entries: Vec<&ActivityLog> = ledger.logs_for(child_id).collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let mut groups: Vec<MonthGroup<'a>> = Vec::new();
        for entry in entries {
            let local = entry.timestamp.with_timezone(tz);
            let (year, month) = (local.year(), local.month());
            match groups.last_mut() {
                Some(group) if group.year == year && group.month == month => {
                    group.entries.push(entry)
                }
                _ => groups.push(MonthGroup {
                    year,
                    month,
                    entries: vec![entry],
                }),
            }
        }
        groups
    }
}
