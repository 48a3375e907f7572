/// Runtime settings for Tab Keeper

/// File name of the extension's own management page
pub const UI_PAGE: &str = "tabkeeper.html";

/// Name of the fixed first category
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq)]
pub struct KeeperConfig {
    pub ui_page: String,
    pub default_category: String,
    /// chrome.storage.sync quota only fits this many groups
    pub cloud_group_limit: usize,
    pub page_size: usize,
    /// Cloud data newer than this (ms) wins over local data on load
    pub cloud_fresh_window_ms: f64,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        KeeperConfig {
            ui_page: UI_PAGE.to_string(),
            default_category: DEFAULT_CATEGORY.to_string(),
            cloud_group_limit: 50,
            page_size: 10,
            cloud_fresh_window_ms: 60_000.0,
        }
    }
}

impl KeeperConfig {
    /// Does this URL point at the management page?
    ///
    /// Parsed URLs match on their last path segment; anything `url` can't
    /// parse falls back to a substring check.
    pub fn is_ui_page(&self, tab_url: &str) -> bool {
        match url::Url::parse(tab_url) {
            Ok(parsed) => parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .is_some_and(|last| last == self.ui_page),
            Err(_) => tab_url.contains(&self.ui_page),
        }
    }
}
