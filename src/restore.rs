/// Reopen saved tabs as live browser tabs

use std::rc::Rc;

use async_trait::async_trait;
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::browser::{Browser, CreateTab};
use crate::config::KeeperConfig;
use crate::error::Result;
use crate::tab_data::TabRef;

/// Reply to a `restoreTabs` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoreOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RestoreOutcome {
    pub fn ok() -> Self {
        RestoreOutcome {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        RestoreOutcome {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Anything that can turn saved tabs back into open ones
///
/// The main page talks to the background worker through runtime
/// messages; the worker runs [`RestoreService`] directly.
#[async_trait(?Send)]
pub trait Restorer {
    /// `remove_after_restore` is passed through for the caller's benefit;
    /// no implementation deletes anything.
    async fn restore(&self, tabs: &[TabRef], remove_after_restore: bool) -> RestoreOutcome;
}

pub struct RestoreService {
    browser: Rc<dyn Browser>,
    config: KeeperConfig,
}

impl RestoreService {
    pub fn new(browser: Rc<dyn Browser>, config: KeeperConfig) -> Self {
        RestoreService { browser, config }
    }

    /// True when the window's only tab is the management page
    pub async fn is_ui_only(&self, window_id: i32) -> Result<bool> {
        let tabs = self.browser.window_tabs(window_id).await?;
        Ok(tabs.len() == 1 && self.config.is_ui_page(&tabs[0].url))
    }

    /// Stops at the first failure; tabs already opened stay open.
    pub async fn open_tabs(&self, tabs: &[TabRef]) -> Result<()> {
        let Some((first, rest)) = tabs.split_first() else {
            return Ok(());
        };

        let current = self.browser.current_window_id().await?;
        if self.is_ui_only(current).await? {
            for tab in tabs {
                self.browser.create_tab(CreateTab::background(&tab.url)).await?;
            }
        } else {
            let window_id = self.browser.create_window(&first.url).await?;
            for tab in rest {
                self.browser
                    .create_tab(CreateTab::background(&tab.url).in_window(window_id))
                    .await?;
            }
        }

        info!("Restored {} tabs", tabs.len());
        Ok(())
    }
}

#[async_trait(?Send)]
impl Restorer for RestoreService {
    async fn restore(&self, tabs: &[TabRef], _remove_after_restore: bool) -> RestoreOutcome {
        match self.open_tabs(tabs).await {
            Ok(()) => RestoreOutcome::ok(),
            Err(e) => {
                error!("Failed to restore tabs: {}", e);
                RestoreOutcome::failed(e.to_string())
            }
        }
    }
}
