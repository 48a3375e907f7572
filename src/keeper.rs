/// Persisting actions behind the main page
///
/// Every mutation runs on a copy of the store, is written to local storage,
/// and only then replaces the in-memory state. A failed write leaves both
/// storage and memory as they were.

use std::rc::Rc;

use log::{debug, info, warn};
use serde_json::Value;

use crate::backup::{BackupDocument, export_document};
use crate::browser::Clock;
use crate::config::KeeperConfig;
use crate::error::Result;
use crate::restore::{RestoreOutcome, Restorer};
use crate::storage::{StorageAdapter, decode_groups};
use crate::store::{CategorySet, GroupStore};

/// Everything the main page can ask of the keeper
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Load,
    DeleteTab(String, usize),
    DeleteGroup(String),
    RestoreAll(String),
    RestoreOne(String, usize),
    Rename(String, String),
    Recategorize(String, String),
    AddCategory(String),
    SyncNow,
    Import(BackupDocument),
    /// New `tabGroups` value seen by the storage-change listener
    Remote(Option<Value>),
}

pub struct Keeper {
    store: GroupStore,
    storage: StorageAdapter,
    restorer: Rc<dyn Restorer>,
    clock: Rc<dyn Clock>,
    config: KeeperConfig,
}

impl Keeper {
    pub fn new(
        storage: StorageAdapter,
        restorer: Rc<dyn Restorer>,
        clock: Rc<dyn Clock>,
        config: KeeperConfig,
    ) -> Self {
        Keeper {
            store: GroupStore::empty(&config),
            storage,
            restorer,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &GroupStore {
        &self.store
    }

    pub async fn load(&mut self) -> Result<()> {
        let persisted = self.storage.load(self.clock.now_ms()).await?;
        self.store = GroupStore::new(
            persisted.groups,
            CategorySet::with_custom(&self.config.default_category, &persisted.custom_categories),
        );
        self.log_totals();
        Ok(())
    }

    async fn commit_groups(&mut self, next: GroupStore) -> Result<()> {
        self.storage.save_groups(next.groups()).await?;
        self.store = next;
        self.log_totals();
        Ok(())
    }

    async fn commit_categories(&mut self, next: GroupStore) -> Result<()> {
        self.storage
            .save_custom_categories(next.categories().custom())
            .await?;
        self.store = next;
        Ok(())
    }

    fn log_totals(&self) {
        debug!(
            "{} groups, {} tabs",
            self.store.group_count(),
            self.store.total_tabs()
        );
    }

    /// Returns false (and writes nothing) for an unknown group or index
    pub async fn delete_tab(&mut self, group_id: &str, tab_index: usize) -> Result<bool> {
        let mut next = self.store.clone();
        if next.delete_tab(group_id, tab_index).is_none() {
            return Ok(false);
        }
        self.commit_groups(next).await?;
        Ok(true)
    }

    pub async fn delete_group(&mut self, group_id: &str) -> Result<bool> {
        let mut next = self.store.clone();
        if !next.delete_group(group_id) {
            return Ok(false);
        }
        self.commit_groups(next).await?;
        Ok(true)
    }

    /// Reopen a whole group; it is dropped only when the restore succeeded
    pub async fn restore_all(&mut self, group_id: &str) -> Result<Option<RestoreOutcome>> {
        let Some(group) = self.store.group(group_id).cloned() else {
            return Ok(None);
        };

        let outcome = self.restorer.restore(&group.tabs, true).await;
        if outcome.success {
            let mut next = self.store.clone();
            next.delete_group(group_id);
            self.commit_groups(next).await?;
        } else {
            warn!(
                "Keeping group {} after failed restore: {}",
                group_id,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(Some(outcome))
    }

    /// Reopen one tab; it leaves the group whatever the restore reported
    pub async fn restore_one(&mut self, group_id: &str, tab_index: usize) -> Result<Option<RestoreOutcome>> {
        let Some(tab) = self
            .store
            .group(group_id)
            .and_then(|g| g.tabs.get(tab_index))
            .cloned()
        else {
            return Ok(None);
        };

        let outcome = self.restorer.restore(std::slice::from_ref(&tab), true).await;
        if !outcome.success {
            warn!("Restore of {} reported failure; removing it anyway", tab.url);
        }

        let mut next = self.store.clone();
        next.delete_tab(group_id, tab_index);
        self.commit_groups(next).await?;
        Ok(Some(outcome))
    }

    pub async fn rename(&mut self, group_id: &str, title: String) -> Result<bool> {
        let mut next = self.store.clone();
        if !next.rename(group_id, title) {
            return Ok(false);
        }
        self.commit_groups(next).await?;
        Ok(true)
    }

    pub async fn recategorize(&mut self, group_id: &str, category: String) -> Result<bool> {
        let mut next = self.store.clone();
        if !next.recategorize(group_id, category) {
            return Ok(false);
        }
        self.commit_groups(next).await?;
        Ok(true)
    }

    pub async fn add_category(&mut self, name: &str) -> Result<bool> {
        let mut next = self.store.clone();
        if !next.add_category(name) {
            return Ok(false);
        }
        self.commit_categories(next).await?;
        Ok(true)
    }

    /// Explicit "sync now"; unlike capture, failures reach the caller
    pub async fn sync_now(&self) -> Result<()> {
        self.storage
            .mirror_to_cloud(self.store.groups(), self.clock.now_ms())
            .await
    }

    pub fn export(&self) -> BackupDocument {
        export_document(&self.store, self.clock.now_ms())
    }

    /// Overwrite everything with a backup's contents
    pub async fn import(&mut self, document: BackupDocument) -> Result<()> {
        let mut next = self.store.clone();
        next.replace_groups(document.tab_groups);
        if let Some(names) = &document.categories {
            next.replace_categories(CategorySet::from_full(&self.config.default_category, names));
        }

        self.storage
            .save_all(next.groups(), next.categories().custom())
            .await?;
        self.store = next;
        info!("Imported {} groups", self.store.group_count());
        Ok(())
    }

    /// Run one action, returning a message worth showing the user
    pub async fn dispatch(&mut self, action: Action) -> Result<Option<String>> {
        match action {
            Action::Load => self.load().await.map(|_| None),
            Action::DeleteTab(id, index) => self.delete_tab(&id, index).await.map(|_| None),
            Action::DeleteGroup(id) => self.delete_group(&id).await.map(|_| None),
            Action::RestoreAll(id) => Ok(self
                .restore_all(&id)
                .await?
                .filter(|outcome| !outcome.success)
                .map(|outcome| {
                    format!(
                        "Restore failed: {}",
                        outcome.error.unwrap_or_else(|| "unknown error".to_string())
                    )
                })),
            Action::RestoreOne(id, index) => self.restore_one(&id, index).await.map(|_| None),
            Action::Rename(id, title) => self.rename(&id, title).await.map(|_| None),
            Action::Recategorize(id, category) => self.recategorize(&id, category).await.map(|_| None),
            Action::AddCategory(name) => self.add_category(&name).await.map(|_| None),
            Action::SyncNow => self
                .sync_now()
                .await
                .map(|_| Some("Cloud sync complete".to_string())),
            Action::Import(document) => self
                .import(document)
                .await
                .map(|_| Some("Import complete".to_string())),
            Action::Remote(value) => self.apply_remote_groups(value).map(|_| None),
        }
    }

    /// Another instance wrote `tabGroups`; adopt its list without writing
    pub fn apply_remote_groups(&mut self, new_value: Option<Value>) -> Result<()> {
        let groups = match new_value {
            Some(Value::Null) | None => Vec::new(),
            Some(value) => decode_groups(value)?,
        };
        self.store.replace_groups(groups);
        self.log_totals();
        Ok(())
    }
}
