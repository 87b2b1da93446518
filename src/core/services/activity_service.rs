//! Business logic for posting, editing and removing activity log entries.

use uuid::Uuid;

use crate::ledger::{ActivityLog, Ledger};

use super::{out_of_range, ServiceError, ServiceResult};

/// Keeps each child's cached total in step with its log entries.
pub struct ActivityService;

impl ActivityService {
    /// Appends `entry` and adds its points to the owning child.
    pub fn add(ledger: &mut Ledger, entry: ActivityLog) -> ServiceResult<Uuid> {
        if ledger.log(entry.id).is_some() {
            return Err(ServiceError::Invalid(format!(
                "Entry {} already exists",
                entry.id
            )));
        }
        if ledger.child(entry.child_id).is_none() {
            return Err(ServiceError::Invalid(format!(
                "Entry refers to unknown child {}",
                entry.child_id
            )));
        }
        tracing::debug!(child = %entry.child_id, points = entry.points, "posting entry");
        let child_id = entry.child_id;
        ledger
            .post_entry(entry)
            .ok_or_else(|| out_of_range(child_id))
    }

    /// Replaces the stored entry with the same id, moving the point difference.
    ///
    /// When the owner changes, the previous child loses the old points and the
    /// new child gains the updated points.
    pub fn update(ledger: &mut Ledger, updated: ActivityLog) -> ServiceResult<ActivityLog> {
        if ledger.child(updated.child_id).is_none() {
            return Err(ServiceError::Invalid(format!(
                "Entry refers to unknown child {}",
                updated.child_id
            )));
        }
        let index = ledger
            .logs
            .iter()
            .position(|log| log.id == updated.id)
            .ok_or_else(|| ServiceError::NotFound(format!("Entry {}", updated.id)))?;

        let previous = &ledger.logs[index];
        let mut moves = Vec::with_capacity(2);
        if previous.child_id == updated.child_id {
            moves.push((updated.child_id, updated.points.checked_sub(previous.points)));
        } else {
            if ledger.child(previous.child_id).is_some() {
                moves.push((previous.child_id, previous.points.checked_neg()));
            }
            moves.push((updated.child_id, Some(updated.points)));
        }
        // Every new total is computed before anything is written.
        let totals = moves
            .into_iter()
            .map(|(child_id, delta)| {
                delta
                    .and_then(|delta| ledger.total_after(child_id, delta))
                    .map(|total| (child_id, total))
                    .ok_or_else(|| out_of_range(child_id))
            })
            .collect::<ServiceResult<Vec<_>>>()?;

        let id = updated.id;
        let previous = std::mem::replace(&mut ledger.logs[index], updated);
        for (child_id, total) in totals {
            if let Some(child) = ledger.child_mut(child_id) {
                child.total_points = total;
            }
        }
        tracing::debug!(entry = %id, "entry updated");
        Ok(previous)
    }

    /// Removes the entry and takes its points back from the owner.
    pub fn remove(ledger: &mut Ledger, id: Uuid) -> ServiceResult<ActivityLog> {
        let child_id = ledger
            .log(id)
            .map(|log| log.child_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Entry {}", id)))?;
        ledger.remove_log(id).ok_or_else(|| out_of_range(child_id))
    }

    /// Rejects a redemption larger than what the child currently holds.
    pub fn check_redemption(ledger: &Ledger, child_id: Uuid, points: i64) -> ServiceResult<()> {
        let child = ledger
            .child(child_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Child {}", child_id)))?;
        let cost = points.checked_abs().ok_or_else(|| {
            ServiceError::Invalid(format!("{} is not a valid point amount", points))
        })?;
        if cost > child.total_points {
            return Err(ServiceError::Invalid(format!(
                "{} only has {} points, cannot redeem {}",
                child.name, child.total_points, cost
            )));
        }
        Ok(())
    }

    /// Entries for one child, newest first.
    pub fn list(ledger: &Ledger, child_id: Uuid) -> Vec<&ActivityLog> {
        let mut entries: Vec<&ActivityLog> = ledger.logs_for(child_id).collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }

    /// Finds an entry by full id or unique id prefix.
    pub fn find<'a>(ledger: &'a Ledger, query: &str) -> ServiceResult<&'a ActivityLog> {
        let needle = query.trim().to_lowercase();
        if let Ok(id) = Uuid::parse_str(&needle) {
            return ledger
                .log(id)
                .ok_or_else(|| ServiceError::NotFound(format!("Entry {}", id)));
        }
        let matches: Vec<&ActivityLog> = ledger
            .logs
            .iter()
            .filter(|log| !needle.is_empty() && log.id.to_string().starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [single] => Ok(single),
            [] => Err(ServiceError::NotFound(format!("Entry `{}`", query.trim()))),
            _ => Err(ServiceError::Invalid(format!(
                "`{}` matches more than one entry",
                query.trim()
            ))),
        }
    }
}
