use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::clock::{Clock, SystemClock};
use crate::core::services::{
    ActivityService, BankService, ChildRemoval, ChildService, InvestmentService, NewInvestment,
    ServiceError, ServiceResult, Settlement,
};
use crate::core::transfer::{parse_import, ExportDocument, ImportSummary};
use crate::ledger::{ActivityCategory, ActivityLog, Bank, Child, EntryMode, Ledger};
use crate::providers::{resolve_api_key, ActivitySuggester, RateProvider, RateQuote};
use crate::storage::StateStore;

const IMPORT_BACKUP_NOTE: &str = "pre-import";

/// Facade that owns the store and clock and runs every mutation as one unit.
///
/// Each operation loads a snapshot, applies a service to a working copy and
/// commits the three collections together. A failed operation leaves the
/// store exactly as it was.
pub struct LedgerManager {
    store: Box<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl LedgerManager {
    pub fn new(store: Box<dyn StateStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Box<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current persisted state.
    pub fn snapshot(&self) -> ServiceResult<Ledger> {
        Ok(self.store.load_ledger()?)
    }

    /// Runs `operation` against a working copy and commits it on success.
    ///
    /// Nothing is written when the operation fails or leaves the ledger
    /// unchanged. If the commit itself fails, the prior snapshot is written
    /// back before the error is returned.
    pub fn transact<T, F>(&self, operation: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut Ledger) -> ServiceResult<T>,
    {
        let original = self.store.load_ledger()?;
        let mut working = original.clone();
        let output = operation(&mut working)?;
        if working == original {
            return Ok(output);
        }
        if let Err(err) = self.store.commit(&working) {
            tracing::warn!(%err, "commit failed, restoring previous state");
            if let Err(restore_err) = self.store.commit(&original) {
                tracing::error!(%restore_err, "failed to restore previous state");
            }
            return Err(err.into());
        }
        Ok(output)
    }

    pub fn add_child(&self, child: Child) -> ServiceResult<Uuid> {
        self.transact(|ledger| ChildService::add(ledger, child))
    }

    pub fn rename_child(&self, id: Uuid, name: &str) -> ServiceResult<()> {
        self.transact(|ledger| ChildService::rename(ledger, id, name))
    }

    pub fn set_avatar(&self, id: Uuid, avatar_url: &str) -> ServiceResult<()> {
        self.transact(|ledger| ChildService::set_avatar(ledger, id, avatar_url))
    }

    /// Deletes the child with all of its entries and deposits.
    pub fn remove_child(&self, id: Uuid) -> ServiceResult<ChildRemoval> {
        self.transact(|ledger| ChildService::remove(ledger, id))
    }

    pub fn move_child(&self, id: Uuid, position: usize) -> ServiceResult<usize> {
        self.transact(|ledger| ChildService::move_to(ledger, id, position))
    }

    pub fn add_entry(&self, entry: ActivityLog) -> ServiceResult<Uuid> {
        self.transact(|ledger| ActivityService::add(ledger, entry))
    }

    /// Replaces an entry, returning the version it replaced.
    pub fn update_entry(&self, updated: ActivityLog) -> ServiceResult<ActivityLog> {
        self.transact(|ledger| ActivityService::update(ledger, updated))
    }

    pub fn delete_entry(&self, id: Uuid) -> ServiceResult<ActivityLog> {
        self.transact(|ledger| ActivityService::remove(ledger, id))
    }

    /// Posts an earn or redeem entry stamped with the manager's clock.
    ///
    /// Redemptions larger than the child's balance are refused.
    pub fn record_activity(
        &self,
        child_id: Uuid,
        description: &str,
        points: i64,
        mode: EntryMode,
        category: Option<ActivityCategory>,
    ) -> ServiceResult<ActivityLog> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ServiceError::Invalid("Description cannot be empty".into()));
        }
        if points == 0 {
            return Err(ServiceError::Invalid("Points must be non-zero".into()));
        }
        let entry = ActivityLog::with_mode(child_id, description, points, mode, category)
            .ok_or_else(|| {
                ServiceError::Invalid(format!("{} is not a valid point amount", points))
            })?
            .at(self.now());
        self.transact(|ledger| {
            if mode == EntryMode::Redeem {
                ActivityService::check_redemption(ledger, child_id, entry.points)?;
            }
            ActivityService::add(ledger, entry.clone())?;
            Ok(entry)
        })
    }

    /// Proposes an entry for `text` without posting it.
    pub fn suggest_entry(
        &self,
        suggester: &dyn ActivitySuggester,
        child_id: Uuid,
        text: &str,
        mode: EntryMode,
    ) -> ServiceResult<Option<ActivityLog>> {
        let ledger = self.snapshot()?;
        if ledger.child(child_id).is_none() {
            return Err(ServiceError::NotFound(format!("Child {}", child_id)));
        }
        Ok(suggester
            .suggest(text)
            .and_then(|suggestion| suggestion.into_entry(child_id, mode))
            .map(|entry| entry.at(self.now())))
    }

    /// Banks with persisted rate overrides applied.
    pub fn banks(&self) -> ServiceResult<Vec<Bank>> {
        Ok(BankService::banks(&self.store.bank_rates()?))
    }

    pub fn set_bank_rate(&self, bank_id: &str, rate: f64) -> ServiceResult<Bank> {
        let mut overrides = self.store.bank_rates()?;
        let bank = BankService::find(&overrides, bank_id)?;
        let rate = BankService::validate_rate(rate)?;
        overrides.insert(bank.id.clone(), rate);
        self.store.save_bank_rates(&overrides)?;
        tracing::info!(bank = %bank.id, rate, "bank rate set");
        Ok(Bank { rate, ..bank })
    }

    /// Merges fresh rates into the persisted overrides; returns how many were kept.
    pub fn update_bank_rates(&self, fresh: &BTreeMap<String, f64>) -> ServiceResult<usize> {
        let mut overrides = self.store.bank_rates()?;
        let accepted = BankService::merge_rates(&mut overrides, fresh);
        if accepted > 0 {
            self.store.save_bank_rates(&overrides)?;
        }
        Ok(accepted)
    }

    /// Asks `provider` for fresh rates. `None` means the current rates stay.
    pub fn refresh_rates(&self, provider: &dyn RateProvider) -> ServiceResult<Option<RateQuote>> {
        match provider.fetch_rates() {
            Some(quote) => {
                let accepted = self.update_bank_rates(&quote.rates)?;
                tracing::info!(accepted, sources = quote.sources.len(), "bank rates refreshed");
                Ok(Some(quote))
            }
            None => {
                tracing::info!("rate provider returned nothing, keeping current rates");
                Ok(None)
            }
        }
    }

    /// Opens a deposit at the bank's current rate.
    pub fn create_investment(&self, request: &NewInvestment) -> ServiceResult<Uuid> {
        let banks = self.banks()?;
        let now = self.now();
        self.transact(|ledger| InvestmentService::create(ledger, &banks, request, now))
    }

    /// Withdraws a deposit early. A deposit that has already matured pays out
    /// in full instead.
    pub fn withdraw_investment(&self, id: Uuid) -> ServiceResult<Settlement> {
        let banks = self.banks()?;
        let now = self.now();
        self.transact(|ledger| {
            let matured = InvestmentService::settle_matured(ledger, &banks, now);
            if let Some(settlement) = matured.into_iter().find(|s| s.investment_id == id) {
                return Ok(settlement);
            }
            InvestmentService::withdraw(ledger, &banks, id, now)
        })
    }

    /// Credits every deposit whose maturity date has passed. Safe to call repeatedly.
    pub fn check_matured_investments(&self) -> ServiceResult<Vec<Settlement>> {
        let banks = self.banks()?;
        let now = self.now();
        self.transact(|ledger| Ok(InvestmentService::settle_matured(ledger, &banks, now)))
    }

    /// Brings time-dependent state up to date before a read.
    pub fn reconcile(&self) -> ServiceResult<Vec<Settlement>> {
        self.check_matured_investments()
    }

    pub fn api_key(&self) -> ServiceResult<Option<String>> {
        Ok(resolve_api_key(self.store.as_ref())?)
    }

    pub fn set_api_key(&self, key: Option<&str>) -> ServiceResult<()> {
        let key = key.map(str::trim).filter(|key| !key.is_empty());
        self.store.save_api_key(key)?;
        Ok(())
    }

    pub fn export_document(&self) -> ServiceResult<ExportDocument> {
        Ok(ExportDocument::from_ledger(&self.snapshot()?, self.now()))
    }

    pub fn export_json(&self) -> ServiceResult<String> {
        let document = self.export_document()?;
        serde_json::to_string_pretty(&document)
            .map_err(|err| ServiceError::Ledger(err.into()))
    }

    /// Replaces the whole ledger with the payload, or changes nothing.
    pub fn import_json(&self, raw: &str) -> ServiceResult<ImportSummary> {
        let imported = parse_import(raw)?.into_ledger();
        let current = self.snapshot()?;
        let backup = self.store.backup(&current, Some(IMPORT_BACKUP_NOTE))?;
        let summary = ImportSummary {
            children: imported.children.len(),
            logs: imported.logs.len(),
            investments: imported.investments.len(),
            backup,
            warnings: imported.warnings(),
        };
        self.transact(|ledger| {
            *ledger = imported;
            Ok(())
        })?;
        tracing::info!(
            children = summary.children,
            logs = summary.logs,
            investments = summary.investments,
            "ledger imported"
        );
        Ok(summary)
    }

    /// Consistency problems in the stored ledger, empty when all is well.
    pub fn verify(&self) -> ServiceResult<Vec<String>> {
        Ok(self.snapshot()?.warnings())
    }
}
