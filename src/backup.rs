/// Portable JSON backups of every group and category

use chrono::{DateTime, SecondsFormat};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{KeeperError, Result};
use crate::storage::decode_groups;
use crate::store::GroupStore;
use crate::tab_data::TabGroup;

pub const BACKUP_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: String,
    pub export_date: String,
    pub tab_groups: Vec<TabGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

/// ISO-8601 in UTC with milliseconds, e.g. `2024-10-28T10:30:00.000Z`
pub fn iso_timestamp(now_ms: f64) -> String {
    DateTime::from_timestamp_millis(now_ms as i64)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

pub fn export_document(store: &GroupStore, now_ms: f64) -> BackupDocument {
    BackupDocument {
        version: BACKUP_VERSION.to_string(),
        export_date: iso_timestamp(now_ms),
        tab_groups: store.groups().to_vec(),
        categories: Some(store.categories().all().to_vec()),
    }
}

pub fn to_json(document: &BackupDocument) -> Result<String> {
    serde_json::to_string_pretty(document)
        .map_err(|e| KeeperError::InvalidFormat(format!("Failed to serialize backup: {}", e)))
}

pub fn backup_filename(document: &BackupDocument) -> String {
    let day: String = document.export_date.chars().take(10).collect();
    format!("tabkeeper-backup-{}.json", day)
}

/// Parse and validate a backup file, rejecting it as a whole on any error
pub fn parse_document(text: &str) -> Result<BackupDocument> {
    let mut value: Value = serde_json::from_str(text)
        .map_err(|e| KeeperError::InvalidFormat(format!("not JSON: {}", e)))?;

    let object = value
        .as_object_mut()
        .ok_or_else(|| KeeperError::InvalidFormat("backup is not an object".to_string()))?;

    let tab_groups = match object.remove("tabGroups") {
        Some(Value::Null) | None => {
            return Err(KeeperError::InvalidFormat("missing tabGroups".to_string()));
        }
        Some(groups) => decode_groups(groups)?,
    };

    let categories = match object.remove("categories") {
        Some(Value::Null) | None => None,
        Some(names) => Some(serde_json::from_value::<Vec<String>>(names).map_err(|e| {
            KeeperError::InvalidFormat(format!("bad categories: {}", e))
        })?),
    };

    let version = object
        .get("version")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if version != BACKUP_VERSION {
        warn!("Importing backup with unexpected version {:?}", version);
    }

    let export_date = object
        .get("exportDate")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(BackupDocument {
        version,
        export_date,
        tab_groups,
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CategorySet;
    use crate::testing::group;

    fn sample_store() -> GroupStore {
        let mut a = group("a", 2);
        a.title = "Trip".to_string();
        a.category = "Home".to_string();
        let categories = CategorySet::with_custom("Uncategorized", &["Home".to_string()]);
        GroupStore::new(vec![a, group("b", 1)], categories)
    }

    #[test]
    fn test_iso_timestamp() {
        assert_eq!(iso_timestamp(1698489000000.0), "2023-10-28T10:30:00.000Z");
        assert_eq!(iso_timestamp(0.0), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_export_document_shape() {
        let document = export_document(&sample_store(), 1698489000000.0);
        let value: Value = serde_json::from_str(&to_json(&document).unwrap()).unwrap();

        assert_eq!(value["version"], "1.0");
        assert_eq!(value["exportDate"], "2023-10-28T10:30:00.000Z");
        assert_eq!(value["tabGroups"].as_array().unwrap().len(), 2);
        assert_eq!(value["categories"], serde_json::json!(["Uncategorized", "Home"]));
        assert_eq!(backup_filename(&document), "tabkeeper-backup-2023-10-28.json");
    }

    #[test]
    fn test_export_then_parse_restores_everything() {
        let store = sample_store();
        let json = to_json(&export_document(&store, 0.0)).unwrap();

        let document = parse_document(&json).unwrap();

        assert_eq!(document.tab_groups, store.groups());
        assert_eq!(document.categories.as_deref(), Some(store.categories().all()));
    }

    #[test]
    fn test_missing_tab_groups_is_invalid() {
        let err = parse_document(r#"{"version":"1.0","categories":[]}"#).unwrap_err();
        assert!(matches!(err, KeeperError::InvalidFormat(_)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(parse_document("not json"), Err(KeeperError::InvalidFormat(_))));
        assert!(matches!(parse_document("[1, 2]"), Err(KeeperError::InvalidFormat(_))));
        assert!(matches!(
            parse_document(r#"{"tabGroups":[{"id":"1"}]}"#),
            Err(KeeperError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_without_categories() {
        let document = parse_document(r#"{"tabGroups":[]}"#).unwrap();
        assert!(document.tab_groups.is_empty());
        assert!(document.categories.is_none());
    }

    #[test]
    fn test_parse_accepts_other_versions() {
        let document = parse_document(r#"{"version":"2.0","tabGroups":[]}"#).unwrap();
        assert_eq!(document.version, "2.0");
    }
}
