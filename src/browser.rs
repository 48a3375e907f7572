/// Seams over the host browser: tabs, windows and the clock

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::tab_data::TabInfo;

/// Arguments for `chrome.tabs.create`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTab {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_id: Option<i32>,
    pub url: String,
    pub active: bool,
}

impl CreateTab {
    /// A background tab in the current window
    pub fn background(url: &str) -> Self {
        CreateTab {
            window_id: None,
            url: url.to_string(),
            active: false,
        }
    }

    pub fn in_window(mut self, window_id: i32) -> Self {
        self.window_id = Some(window_id);
        self
    }
}

#[async_trait(?Send)]
pub trait Browser {
    async fn current_window_id(&self) -> Result<i32>;

    /// Tabs of one window, in tab strip order
    async fn window_tabs(&self, window_id: i32) -> Result<Vec<TabInfo>>;

    /// Tabs of every window
    async fn all_tabs(&self) -> Result<Vec<TabInfo>>;

    async fn create_tab(&self, request: CreateTab) -> Result<()>;

    /// Opens a focused window showing `url`, returning its id
    async fn create_window(&self, url: &str) -> Result<i32>;

    async fn remove_tabs(&self, tab_ids: &[i32]) -> Result<()>;

    async fn activate_tab(&self, tab_id: i32) -> Result<()>;

    async fn focus_window(&self, window_id: i32) -> Result<()>;
}

pub trait Clock {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> f64;
}
