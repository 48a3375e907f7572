/// Capture a window's tabs into a saved group

use std::rc::Rc;

use log::{debug, info, warn};

use crate::browser::{Browser, Clock, CreateTab};
use crate::config::KeeperConfig;
use crate::error::Result;
use crate::storage::StorageAdapter;
use crate::tab_data::{TabGroup, TabInfo, fresh_group_id};

pub struct CaptureService {
    browser: Rc<dyn Browser>,
    storage: StorageAdapter,
    clock: Rc<dyn Clock>,
    config: KeeperConfig,
}

impl CaptureService {
    pub fn new(
        browser: Rc<dyn Browser>,
        storage: StorageAdapter,
        clock: Rc<dyn Clock>,
        config: KeeperConfig,
    ) -> Self {
        CaptureService {
            browser,
            storage,
            clock,
            config,
        }
    }

    /// Toolbar icon handler
    pub async fn capture_current(&self) -> Result<Option<TabGroup>> {
        let window_id = self.browser.current_window_id().await?;
        self.capture(window_id).await
    }

    /// Save every non-UI tab of `window_id` as a new group and close them
    ///
    /// Returns `None` without touching storage when there is nothing to save.
    pub async fn capture(&self, window_id: i32) -> Result<Option<TabGroup>> {
        let window_tabs = self.browser.window_tabs(window_id).await?;
        let ui_tab = window_tabs
            .iter()
            .find(|tab| self.config.is_ui_page(&tab.url))
            .map(|tab| tab.id);
        let tabs: Vec<TabInfo> = window_tabs
            .into_iter()
            .filter(|tab| !self.config.is_ui_page(&tab.url))
            .collect();

        if tabs.is_empty() {
            debug!("Window {} has nothing to capture", window_id);
            return Ok(None);
        }

        let now = self.clock.now_ms();
        let mut groups = self.storage.load_groups().await?;
        let group = TabGroup {
            id: fresh_group_id(now, &groups),
            title: String::new(),
            category: self.config.default_category.clone(),
            created_at: now as i64,
            tabs: tabs.iter().map(TabInfo::snapshot).collect(),
        };

        groups.insert(0, group.clone());
        self.storage.save_groups(&groups).await?;
        self.storage.mirror_best_effort(&groups, now).await;

        // The window closes with its last tab, so the UI tab must exist first
        let opened_here = match ui_tab {
            Some(_) => true,
            None => match self.browser.create_tab(self.ui_tab_request(Some(window_id))).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Could not open the main page in window {}: {}", window_id, e);
                    false
                }
            },
        };

        let tab_ids: Vec<i32> = tabs.iter().map(|t| t.id).collect();
        self.browser.remove_tabs(&tab_ids).await?;
        info!("Captured {} tabs into group {}", tab_ids.len(), group.id);

        match ui_tab {
            Some(tab_id) => self.browser.activate_tab(tab_id).await?,
            None if !opened_here => self.open_main_page().await?,
            None => {}
        }
        Ok(Some(group))
    }

    fn ui_tab_request(&self, window_id: Option<i32>) -> CreateTab {
        CreateTab {
            window_id,
            url: self.config.ui_page.clone(),
            active: true,
        }
    }

    /// Focus an existing UI tab in any window, or open a new one
    pub async fn open_main_page(&self) -> Result<()> {
        let tabs = self.browser.all_tabs().await?;
        match tabs.iter().find(|t| self.config.is_ui_page(&t.url)) {
            Some(ui_tab) => {
                self.browser.activate_tab(ui_tab.id).await?;
                self.browser.focus_window(ui_tab.window_id).await
            }
            None => self.browser.create_tab(self.ui_tab_request(None)).await,
        }
    }
}
