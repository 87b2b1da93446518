//! Child profile management, including the cascade on removal.

use uuid::Uuid;

use crate::ledger::{Child, Ledger};

use super::{ServiceError, ServiceResult};

/// What a cascade delete took with it.
#[derive(Debug, Clone)]
pub struct ChildRemoval {
    pub child: Child,
    pub logs_removed: usize,
    pub investments_removed: usize,
}

pub struct ChildService;

impl ChildService {
    pub fn add(ledger: &mut Ledger, child: Child) -> ServiceResult<Uuid> {
        let name = Self::validate_name(&child.name)?;
        if ledger.child(child.id).is_some() {
            return Err(ServiceError::Invalid(format!(
                "Child {} already exists",
                child.id
            )));
        }
        if child.total_points != 0 {
            return Err(ServiceError::Invalid(
                "A new child must start with zero points".into(),
            ));
        }
        let id = child.id;
        ledger.children.push(Child { name, ..child });
        tracing::info!(%id, "child added");
        Ok(id)
    }

    pub fn rename(ledger: &mut Ledger, id: Uuid, name: &str) -> ServiceResult<()> {
        let name = Self::validate_name(name)?;
        let child = Self::require_mut(ledger, id)?;
        child.name = name;
        Ok(())
    }

    pub fn set_avatar(ledger: &mut Ledger, id: Uuid, avatar_url: &str) -> ServiceResult<()> {
        Self::require_mut(ledger, id)?.avatar_url = avatar_url.trim().to_string();
        Ok(())
    }

    /// Removes the child together with every log entry and investment it owns.
    pub fn remove(ledger: &mut Ledger, id: Uuid) -> ServiceResult<ChildRemoval> {
        let index = ledger
            .children
            .iter()
            .position(|child| child.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("Child {}", id)))?;
        let child = ledger.children.remove(index);

        let logs_before = ledger.logs.len();
        ledger.logs.retain(|log| log.child_id != id);
        let investments_before = ledger.investments.len();
        ledger.investments.retain(|inv| inv.child_id != id);

        let removal = ChildRemoval {
            child,
            logs_removed: logs_before - ledger.logs.len(),
            investments_removed: investments_before - ledger.investments.len(),
        };
        tracing::info!(
            %id,
            logs = removal.logs_removed,
            investments = removal.investments_removed,
            "child removed"
        );
        Ok(removal)
    }

    /// Moves a child to `position` in the display order, clamped to the end.
    pub fn move_to(ledger: &mut Ledger, id: Uuid, position: usize) -> ServiceResult<usize> {
        let index = ledger
            .children
            .iter()
            .position(|child| child.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("Child {}", id)))?;
        let child = ledger.children.remove(index);
        let target = position.min(ledger.children.len());
        ledger.children.insert(target, child);
        Ok(target)
    }

    /// Finds a child by full id, id prefix, or case-insensitive name.
    pub fn find<'a>(ledger: &'a Ledger, query: &str) -> ServiceResult<&'a Child> {
        let needle = query.trim();
        if let Ok(id) = Uuid::parse_str(needle) {
            return ledger
                .child(id)
                .ok_or_else(|| ServiceError::NotFound(format!("Child {}", id)));
        }
        let lowered = needle.to_lowercase();
        if let Some(child) = ledger
            .children
            .iter()
            .find(|child| child.name.to_lowercase() == lowered)
        {
            return Ok(child);
        }
        let matches: Vec<&Child> = ledger
            .children
            .iter()
            .filter(|child| !lowered.is_empty() && child.id.to_string().starts_with(&lowered))
            .collect();
        match matches.as_slice() {
            [single] => Ok(single),
            [] => Err(ServiceError::NotFound(format!("Child `{}`", needle))),
            _ => Err(ServiceError::Invalid(format!(
                "`{}` matches more than one child",
                needle
            ))),
        }
    }

    fn require_mut(ledger: &mut Ledger, id: Uuid) -> ServiceResult<&mut Child> {
        ledger
            .child_mut(id)
            .ok_or_else(|| ServiceError::NotFound(format!("Child {}", id)))
    }

    fn validate_name(name: &str) -> ServiceResult<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            Err(ServiceError::Invalid("Child name cannot be empty".into()))
        } else {
            Ok(trimmed.to_string())
        }
    }
}
