/// Data structures for Tab Keeper
use serde::{Deserialize, Deserializer, Serialize};

/// A live browser tab as chrome.tabs reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: i32,
    pub window_id: i32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fav_icon_url: Option<String>,
}

impl TabInfo {
    pub fn new(id: i32, window_id: i32, url: String, title: String) -> TabInfo {
        TabInfo {
            id,
            window_id,
            url,
            title,
            fav_icon_url: None,
        }
    }

    pub fn snapshot(&self) -> TabRef {
        TabRef {
            title: self.title.clone(),
            url: self.url.clone(),
            fav_icon_url: self.fav_icon_url.clone(),
        }
    }
}

/// A saved tab within a group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabRef {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub fav_icon_url: Option<String>,
}

/// A captured, named and categorized set of tabs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabGroup {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_category")]
    pub category: String,
    /// Epoch milliseconds, written as an integer
    #[serde(deserialize_with = "millis")]
    pub created_at: i64,
    pub tabs: Vec<TabRef>,
}

fn default_category() -> String {
    crate::config::DEFAULT_CATEGORY.to_string()
}

// Any JSON number; fractional stamps are truncated
fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    f64::deserialize(deserializer).map(|ms| ms as i64)
}

impl TabGroup {
    /// Case-insensitive match against the group title and its tabs
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.tabs.iter().any(|tab| {
                tab.title.to_lowercase().contains(&query)
                    || tab.url.to_lowercase().contains(&query)
            })
    }
}

/// Pick an id derived from `now` that no existing group uses
pub fn fresh_group_id(now: f64, existing: &[TabGroup]) -> String {
    let mut candidate = now as i64;
    while existing.iter().any(|g| g.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}
