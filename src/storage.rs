/// Storage adapter over chrome.storage.local and chrome.storage.sync

use std::collections::HashSet;
use std::rc::Rc;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::config::KeeperConfig;
use crate::error::{KeeperError, Result};
use crate::tab_data::TabGroup;

pub const GROUPS_KEY: &str = "tabGroups";
pub const CATEGORIES_KEY: &str = "customCategories";
pub const SYNC_DATA_KEY: &str = "syncData";
pub const LAST_SYNC_KEY: &str = "lastSync";

/// One chrome.storage area
#[async_trait(?Send)]
pub trait StorageArea {
    /// `None` when the key has never been written
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Writes all items in one call, like `chrome.storage.*.set`
    async fn set_items(&self, items: Map<String, Value>) -> Result<()>;
}

/// Validate a stored `tabGroups` value
///
/// Missing titles and categories are filled in; groups with no tabs are
/// dropped because they must never exist in storage. A repeated id is
/// replaced with a fresh one derived from the group's `createdAt`.
pub fn decode_groups(value: Value) -> Result<Vec<TabGroup>> {
    if !value.is_array() {
        return Err(KeeperError::InvalidFormat(format!(
            "expected a list of tab groups, found {}",
            json_kind(&value)
        )));
    }

    let groups: Vec<TabGroup> = serde_json::from_value(value)
        .map_err(|e| KeeperError::InvalidFormat(format!("bad tab group: {}", e)))?;

    let total = groups.len();
    let groups: Vec<TabGroup> = groups.into_iter().filter(|g| !g.tabs.is_empty()).collect();
    if groups.len() < total {
        warn!("Dropped {} empty tab groups", total - groups.len());
    }

    Ok(unique_ids(groups))
}

fn unique_ids(mut groups: Vec<TabGroup>) -> Vec<TabGroup> {
    let mut taken: HashSet<String> = groups.iter().map(|g| g.id.clone()).collect();
    let mut seen = HashSet::new();

    for group in groups.iter_mut() {
        if seen.insert(group.id.clone()) {
            continue;
        }
        let mut candidate = group.created_at;
        while taken.contains(&candidate.to_string()) {
            candidate += 1;
        }
        let id = candidate.to_string();
        warn!("Group id {} is repeated; using {}", group.id, id);
        taken.insert(id.clone());
        seen.insert(id.clone());
        group.id = id;
    }
    groups
}

/// Validate a stored `customCategories` value
pub fn decode_categories(value: Value) -> Result<Vec<String>> {
    serde_json::from_value(value)
        .map_err(|e| KeeperError::InvalidFormat(format!("bad category list: {}", e)))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| KeeperError::StorageFailure(format!("serialize: {}", e)))
}

/// Cloud mirror as found in chrome.storage.sync
#[derive(Debug, Clone, PartialEq)]
pub struct CloudSnapshot {
    pub groups: Vec<TabGroup>,
    pub last_sync: Option<f64>,
}

/// Everything the main page needs at startup
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Persisted {
    pub groups: Vec<TabGroup>,
    pub custom_categories: Vec<String>,
}

#[derive(Clone)]
pub struct StorageAdapter {
    local: Rc<dyn StorageArea>,
    cloud: Rc<dyn StorageArea>,
    config: KeeperConfig,
}

impl StorageAdapter {
    pub fn new(local: Rc<dyn StorageArea>, cloud: Rc<dyn StorageArea>, config: KeeperConfig) -> Self {
        StorageAdapter { local, cloud, config }
    }

    pub async fn load_groups(&self) -> Result<Vec<TabGroup>> {
        match self.local.get(GROUPS_KEY).await? {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(value) => decode_groups(value),
        }
    }

    pub async fn load_custom_categories(&self) -> Result<Vec<String>> {
        match self.local.get(CATEGORIES_KEY).await? {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(value) => decode_categories(value),
        }
    }

    pub async fn save_groups(&self, groups: &[TabGroup]) -> Result<()> {
        let mut items = Map::new();
        items.insert(GROUPS_KEY.to_string(), encode(groups)?);
        self.local.set_items(items).await?;
        debug!("Saved {} groups to local storage", groups.len());
        Ok(())
    }

    /// Groups and custom categories in a single local write
    pub async fn save_all(&self, groups: &[TabGroup], custom: &[String]) -> Result<()> {
        let mut items = Map::new();
        items.insert(GROUPS_KEY.to_string(), encode(groups)?);
        items.insert(CATEGORIES_KEY.to_string(), encode(custom)?);
        self.local.set_items(items).await?;
        debug!("Saved {} groups and {} categories to local storage", groups.len(), custom.len());
        Ok(())
    }

    pub async fn save_custom_categories(&self, custom: &[String]) -> Result<()> {
        let mut items = Map::new();
        items.insert(CATEGORIES_KEY.to_string(), encode(custom)?);
        self.local.set_items(items).await
    }

    /// Push the newest groups to chrome.storage.sync
    pub async fn mirror_to_cloud(&self, groups: &[TabGroup], now: f64) -> Result<()> {
        let newest = &groups[..groups.len().min(self.config.cloud_group_limit)];
        let sync_data = serde_json::to_string(newest)
            .map_err(|e| KeeperError::StorageFailure(format!("serialize: {}", e)))?;

        let mut items = Map::new();
        items.insert(LAST_SYNC_KEY.to_string(), Value::from(now));
        items.insert(SYNC_DATA_KEY.to_string(), Value::String(sync_data));
        self.cloud.set_items(items).await?;

        info!("Mirrored {} groups to cloud storage", newest.len());
        Ok(())
    }

    /// Like [`mirror_to_cloud`](Self::mirror_to_cloud) but only logs failures
    pub async fn mirror_best_effort(&self, groups: &[TabGroup], now: f64) {
        if let Err(e) = self.mirror_to_cloud(groups, now).await {
            warn!("Cloud sync failed: {}", e);
        }
    }

    pub async fn load_cloud(&self) -> Result<Option<CloudSnapshot>> {
        let sync_data = match self.cloud.get(SYNC_DATA_KEY).await? {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => return Ok(None),
        };

        let parsed: Value = serde_json::from_str(&sync_data)
            .map_err(|e| KeeperError::InvalidFormat(format!("bad cloud data: {}", e)))?;
        let groups = decode_groups(parsed)?;
        let last_sync = self.cloud.get(LAST_SYNC_KEY).await?.and_then(|v| v.as_f64());

        Ok(Some(CloudSnapshot { groups, last_sync }))
    }

    /// Load local data, letting fresh (or sole) cloud data win
    ///
    /// Last write wins: a concurrent edit on another device within the
    /// freshness window is overwritten without merging.
    pub async fn load(&self, now: f64) -> Result<Persisted> {
        let mut persisted = Persisted {
            groups: self.load_groups().await?,
            custom_categories: self.load_custom_categories().await?,
        };

        match self.load_cloud().await {
            Ok(Some(snapshot)) => {
                let prefer_cloud = snapshot.last_sync.is_some_and(|last| {
                    persisted.groups.is_empty() || last > now - self.config.cloud_fresh_window_ms
                });

                if prefer_cloud {
                    info!("Using {} groups from cloud storage", snapshot.groups.len());
                    persisted.groups = snapshot.groups;
                    if let Err(e) = self.save_groups(&persisted.groups).await {
                        warn!("Failed to copy cloud data to local storage: {}", e);
                    }
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Cloud sync load failed: {}", e),
        }

        Ok(persisted)
    }
}
