//! Whole-ledger export and all-or-nothing import.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::services::{ServiceError, ServiceResult};
use crate::ledger::{ActivityLog, Child, Investment, Ledger};

pub const EXPORT_VERSION: &str = "1.0";

const REQUIRED_COLLECTIONS: [&str; 3] = ["children", "logs", "investments"];

/// The document written by `export` and read back by `import`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub children: Vec<Child>,
    pub logs: Vec<ActivityLog>,
    pub investments: Vec<Investment>,
    #[serde(default)]
    pub version: String,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "Utc::now")]
    pub exported_at: DateTime<Utc>,
}

impl ExportDocument {
    pub fn from_ledger(ledger: &Ledger, exported_at: DateTime<Utc>) -> Self {
        Self {
            children: ledger.children.clone(),
            logs: ledger.logs.clone(),
            investments: ledger.investments.clone(),
            version: EXPORT_VERSION.to_string(),
            exported_at,
        }
    }

    pub fn into_ledger(self) -> Ledger {
        Ledger {
            children: self.children,
            logs: self.logs,
            investments: self.investments,
        }
    }
}

/// What an accepted import replaced the ledger with.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub children: usize,
    pub logs: usize,
    pub investments: usize,
    pub backup: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Validates an import payload and decodes it into a ledger.
///
/// The three collections must be present as arrays and every element must
/// decode, otherwise the whole payload is rejected.
pub fn parse_import(raw: &str) -> ServiceResult<ExportDocument> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| ServiceError::ImportRejected(format!("not valid JSON ({})", err)))?;
    let object = value
        .as_object()
        .ok_or_else(|| ServiceError::ImportRejected("expected a JSON object".into()))?;
    for key in REQUIRED_COLLECTIONS {
        match object.get(key) {
            Some(Value::Array(_)) => {}
            Some(_) => {
                return Err(ServiceError::ImportRejected(format!(
                    "`{}` must be an array",
                    key
                )))
            }
            None => {
                return Err(ServiceError::ImportRejected(format!(
                    "missing `{}`",
                    key
                )))
            }
        }
    }
    let document: ExportDocument = serde_json::from_value(value)
        .map_err(|err| ServiceError::ImportRejected(format!("malformed record ({})", err)))?;
    if !document.version.is_empty() && document.version != EXPORT_VERSION {
        tracing::warn!(version = %document.version, "importing document from another version");
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ActivityCategory;
    use chrono::TimeZone;

    fn sample() -> Ledger {
        let mut ledger = Ledger::new();
        let child = Child::new("Alice");
        let id = child.id;
        ledger.children.push(child);
        ledger.post_entry(ActivityLog::new(id, "Dishes", 10, ActivityCategory::Chore));
        ledger
    }

    #[test]
    fn export_uses_document_field_names() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let doc = ExportDocument::from_ledger(&sample(), at);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["version"], EXPORT_VERSION);
        assert_eq!(json["exportedAt"], at.timestamp_millis());
        assert_eq!(json["children"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn export_parses_back_into_the_same_ledger() {
        let ledger = sample();
        let raw = serde_json::to_string(&ExportDocument::from_ledger(&ledger, Utc::now())).unwrap();
        assert_eq!(parse_import(&raw).unwrap().into_ledger(), ledger);
    }

    #[test]
    fn missing_collection_is_rejected() {
        let err = parse_import(r#"{"children": [], "investments": []}"#).unwrap_err();
        assert!(matches!(err, ServiceError::ImportRejected(ref m) if m.contains("logs")));
    }

    #[test]
    fn non_array_collection_is_rejected() {
        let err = parse_import(r#"{"children": [], "logs": {}, "investments": []}"#).unwrap_err();
        assert!(err.to_string().contains("must be an array"));
    }

    #[test]
    fn undecodable_element_is_rejected() {
        let raw = r#"{"children": [{"name": "no id"}], "logs": [], "investments": []}"#;
        assert!(matches!(
            parse_import(raw),
            Err(ServiceError::ImportRejected(_))
        ));
    }

    #[test]
    fn version_and_timestamp_are_optional() {
        let doc = parse_import(r#"{"children": [], "logs": [], "investments": []}"#).unwrap();
        assert!(doc.into_ledger().children.is_empty());
    }
}
