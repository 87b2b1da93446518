use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    errors::LedgerError,
    ledger::{ActivityLog, Child, Investment, Ledger},
    utils::paths::ensure_dir,
};

use super::{Result, StateStore, StoreKey};

const FILE_EXTENSION: &str = "json";
const BACKUP_PREFIX: &str = "starjar";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Directory-backed store writing one pretty-printed JSON file per key.
#[derive(Clone)]
pub struct JsonStore {
    root: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub created_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl JsonStore {
    pub fn new(root: PathBuf, retention: Option<usize>) -> Result<Self> {
        ensure_dir(&root)?;
        let backups_dir = root.join("backups");
        ensure_dir(&backups_dir)?;
        Ok(Self {
            root,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: StoreKey) -> PathBuf {
        self.root
            .join(format!("{}.{}", key.as_str(), FILE_EXTENSION))
    }

    fn read<T>(&self, key: StoreKey) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(T::default());
        }
        let data = fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(&data).map_err(|err| {
            tracing::error!(path = %path.display(), %err, "failed to decode stored collection");
            LedgerError::Persistence(format!("`{}` is unreadable: {}", path.display(), err))
        })
    }

    fn write<T>(&self, key: StoreKey, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let path = self.path_for(key);
        let tmp = self.stage(&path, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn stage<T>(&self, path: &Path, value: &T) -> Result<PathBuf>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string_pretty(value)?;
        let tmp = tmp_path(path);
        write_file(&tmp, &json)?;
        Ok(tmp)
    }

    fn stage_ledger(&self, ledger: &Ledger, staged: &mut Vec<(PathBuf, PathBuf)>) -> Result<()> {
        let children = self.path_for(StoreKey::Children);
        staged.push((self.stage(&children, &ledger.children)?, children));
        let logs = self.path_for(StoreKey::Logs);
        staged.push((self.stage(&logs, &ledger.logs)?, logs));
        let investments = self.path_for(StoreKey::Investments);
        staged.push((self.stage(&investments, &ledger.investments)?, investments));
        Ok(())
    }

    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let (created_at, note) = parse_backup_stem(stem);
            entries.push(BackupInfo {
                path,
                created_at,
                note,
            });
        }
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    pub fn load_backup(&self, path: &Path) -> Result<Ledger> {
        if !path.exists() {
            return Err(LedgerError::Persistence(format!(
                "backup `{}` not found",
                path.display()
            )));
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn prune_backups(&self) -> Result<()> {
        let backups = self.list_backups()?;
        for stale in backups.iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&stale.path) {
                tracing::warn!(path = %stale.path.display(), %err, "could not prune backup");
            }
        }
        Ok(())
    }
}

impl StateStore for JsonStore {
    fn children(&self) -> Result<Vec<Child>> {
        self.read(StoreKey::Children)
    }

    fn save_children(&self, children: &[Child]) -> Result<()> {
        self.write(StoreKey::Children, children)
    }

    fn logs(&self) -> Result<Vec<ActivityLog>> {
        self.read(StoreKey::Logs)
    }

    fn save_logs(&self, logs: &[ActivityLog]) -> Result<()> {
        self.write(StoreKey::Logs, logs)
    }

    fn investments(&self) -> Result<Vec<Investment>> {
        self.read(StoreKey::Investments)
    }

    fn save_investments(&self, investments: &[Investment]) -> Result<()> {
        self.write(StoreKey::Investments, investments)
    }

    fn bank_rates(&self) -> Result<BTreeMap<String, f64>> {
        self.read(StoreKey::BankRates)
    }

    fn save_bank_rates(&self, rates: &BTreeMap<String, f64>) -> Result<()> {
        self.write(StoreKey::BankRates, rates)
    }

    fn api_key(&self) -> Result<Option<String>> {
        self.read(StoreKey::ApiKey)
    }

    fn save_api_key(&self, key: Option<&str>) -> Result<()> {
        match key {
            Some(key) => self.write(StoreKey::ApiKey, key),
            None => {
                let path = self.path_for(StoreKey::ApiKey);
                if path.exists() {
                    fs::remove_file(path)?;
                }
                Ok(())
            }
        }
    }

    /// Stages all three collections before renaming any of them into place.
    fn commit(&self, ledger: &Ledger) -> Result<()> {
        let mut staged = Vec::with_capacity(3);
        if let Err(err) = self.stage_ledger(ledger, &mut staged) {
            for (tmp, _) in &staged {
                let _ = fs::remove_file(tmp);
            }
            return Err(err);
        }
        for (tmp, target) in staged {
            fs::rename(&tmp, &target)?;
        }
        Ok(())
    }

    fn backup(&self, ledger: &Ledger, note: Option<&str>) -> Result<Option<PathBuf>> {
        ensure_dir(&self.backups_dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", BACKUP_PREFIX, timestamp);
        if let Some(label) = sanitize_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let path = self
            .backups_dir
            .join(format!("{}.{}", stem, FILE_EXTENSION));
        let json = serde_json::to_string_pretty(ledger)?;
        write_file(&path, &json)?;
        self.prune_backups()?;
        tracing::info!(path = %path.display(), "wrote ledger backup");
        Ok(Some(path))
    }
}

fn sanitize_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Splits `starjar_<date>_<time>[_<note>]` into its timestamp and note.
fn parse_backup_stem(stem: &str) -> (Option<DateTime<Utc>>, Option<String>) {
    let mut parts = stem.splitn(4, '_');
    let _prefix = parts.next();
    let date = parts.next().unwrap_or_default();
    let time = parts.next().unwrap_or_default();
    let note = parts.next().map(str::to_string);
    let created_at = NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S%3f")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc));
    (created_at, note)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
