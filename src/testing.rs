/// In-memory stand-ins for chrome.* used by the unit tests

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::browser::{Browser, Clock, CreateTab};
use crate::error::{KeeperError, Result};
use crate::restore::{RestoreOutcome, Restorer};
use crate::storage::StorageArea;
use crate::tab_data::{TabGroup, TabInfo, TabRef};

pub const UI_URL: &str = "chrome-extension://keeper/tabkeeper.html";

pub fn tab_ref(url: &str) -> TabRef {
    TabRef {
        title: url.to_string(),
        url: url.to_string(),
        fav_icon_url: None,
    }
}

/// A group with `tab_count` tabs at https://<id>-<n>.com/
pub fn group(id: &str, tab_count: usize) -> TabGroup {
    TabGroup {
        id: id.to_string(),
        title: String::new(),
        category: "Uncategorized".to_string(),
        created_at: 1_000,
        tabs: (0..tab_count)
            .map(|n| tab_ref(&format!("https://{}-{}.com/", id, n)))
            .collect(),
    }
}

pub struct MemoryStorage {
    items: RefCell<HashMap<String, Value>>,
    failing: Cell<bool>,
    /// Writes touching this key fail
    rejected_key: RefCell<Option<String>>,
    writes: Cell<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage {
            items: RefCell::new(HashMap::new()),
            failing: Cell::new(false),
            rejected_key: RefCell::new(None),
            writes: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        let storage = Self::new();
        storage.failing.set(true);
        storage
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn reject_writes_of(&self, key: &str) {
        *self.rejected_key.borrow_mut() = Some(key.to_string());
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.items.borrow().get(key).cloned()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

#[async_trait(?Send)]
impl StorageArea for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        if self.failing.get() {
            return Err(KeeperError::StorageFailure("quota exceeded".to_string()));
        }
        Ok(self.value(key))
    }

    async fn set_items(&self, items: Map<String, Value>) -> Result<()> {
        let rejected = self
            .rejected_key
            .borrow()
            .as_ref()
            .is_some_and(|key| items.contains_key(key));
        if self.failing.get() || rejected {
            return Err(KeeperError::StorageFailure("quota exceeded".to_string()));
        }
        self.writes.set(self.writes.get() + 1);
        self.items.borrow_mut().extend(items);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateTab(CreateTab),
    CreateWindow(String),
    RemoveTabs(Vec<i32>),
    ActivateTab(i32),
    FocusWindow(i32),
}

/// Windows with tabs; new windows and tabs get fresh ids
pub struct FakeBrowser {
    windows: RefCell<Vec<(i32, Vec<TabInfo>)>>,
    current: Cell<i32>,
    next_id: Cell<i32>,
    calls: RefCell<Vec<Call>>,
    /// Tab creations allowed before the next one fails
    create_budget: Cell<Option<usize>>,
    /// Chrome closes a window once its last tab goes
    closes_empty: Cell<bool>,
    refused_window: Cell<Option<i32>>,
}

impl FakeBrowser {
    /// One window (id 1) holding `urls`
    pub fn with_window(urls: &[&str]) -> Self {
        let browser = FakeBrowser {
            windows: RefCell::new(vec![(1, Vec::new())]),
            current: Cell::new(1),
            next_id: Cell::new(100),
            calls: RefCell::new(Vec::new()),
            create_budget: Cell::new(None),
            closes_empty: Cell::new(false),
            refused_window: Cell::new(None),
        };
        for url in urls {
            browser.push_tab(1, url);
        }
        browser
    }

    pub fn add_window(&self, urls: &[&str]) -> i32 {
        let id = self.fresh_id();
        self.windows.borrow_mut().push((id, Vec::new()));
        for url in urls {
            self.push_tab(id, url);
        }
        id
    }

    pub fn fail_after_creating(&self, count: usize) {
        self.create_budget.set(Some(count));
    }

    pub fn close_empty_windows(&self) {
        self.closes_empty.set(true);
    }

    /// Tab creation in `window_id` fails, as for a popup window
    pub fn refuse_tabs_in(&self, window_id: i32) {
        self.refused_window.set(Some(window_id));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn urls_in(&self, window_id: i32) -> Vec<String> {
        self.windows
            .borrow()
            .iter()
            .find(|(id, _)| *id == window_id)
            .map(|(_, tabs)| tabs.iter().map(|t| t.url.clone()).collect())
            .unwrap_or_default()
    }

    pub fn window_count(&self) -> usize {
        self.windows.borrow().len()
    }

    fn has_window(&self, window_id: i32) -> bool {
        self.windows.borrow().iter().any(|(id, _)| *id == window_id)
    }

    fn fresh_id(&self) -> i32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn push_tab(&self, window_id: i32, url: &str) {
        let id = self.fresh_id();
        let mut windows = self.windows.borrow_mut();
        if let Some((_, tabs)) = windows.iter_mut().find(|(w, _)| *w == window_id) {
            tabs.push(TabInfo::new(id, window_id, url.to_string(), url.to_string()));
        }
    }

    fn spend_create(&self) -> Result<()> {
        match self.create_budget.get() {
            Some(0) => Err(KeeperError::TabOperationFailure("Tabs cannot be created".to_string())),
            Some(n) => {
                self.create_budget.set(Some(n - 1));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait(?Send)]
impl Browser for FakeBrowser {
    async fn current_window_id(&self) -> Result<i32> {
        Ok(self.current.get())
    }

    async fn window_tabs(&self, window_id: i32) -> Result<Vec<TabInfo>> {
        Ok(self
            .windows
            .borrow()
            .iter()
            .find(|(id, _)| *id == window_id)
            .map(|(_, tabs)| tabs.clone())
            .unwrap_or_default())
    }

    async fn all_tabs(&self) -> Result<Vec<TabInfo>> {
        Ok(self
            .windows
            .borrow()
            .iter()
            .flat_map(|(_, tabs)| tabs.clone())
            .collect())
    }

    async fn create_tab(&self, request: CreateTab) -> Result<()> {
        self.spend_create()?;
        let window_id = request.window_id.unwrap_or(self.current.get());
        if self.has_window(window_id) {
            if self.refused_window.get() == Some(window_id) {
                return Err(KeeperError::TabOperationFailure("Tabs cannot be created here".to_string()));
            }
            self.push_tab(window_id, &request.url);
        } else if request.window_id.is_some() {
            return Err(KeeperError::TabOperationFailure(format!(
                "No window with id: {}.",
                window_id
            )));
        } else {
            let id = self.add_window(&[&request.url]);
            self.current.set(id);
        }
        self.calls.borrow_mut().push(Call::CreateTab(request));
        Ok(())
    }

    async fn create_window(&self, url: &str) -> Result<i32> {
        self.spend_create()?;
        self.calls.borrow_mut().push(Call::CreateWindow(url.to_string()));
        Ok(self.add_window(&[url]))
    }

    async fn remove_tabs(&self, tab_ids: &[i32]) -> Result<()> {
        self.calls.borrow_mut().push(Call::RemoveTabs(tab_ids.to_vec()));
        let mut windows = self.windows.borrow_mut();
        for (_, tabs) in windows.iter_mut() {
            tabs.retain(|t| !tab_ids.contains(&t.id));
        }
        if self.closes_empty.get() {
            windows.retain(|(_, tabs)| !tabs.is_empty());
        }
        Ok(())
    }

    async fn activate_tab(&self, tab_id: i32) -> Result<()> {
        self.calls.borrow_mut().push(Call::ActivateTab(tab_id));
        Ok(())
    }

    async fn focus_window(&self, window_id: i32) -> Result<()> {
        self.calls.borrow_mut().push(Call::FocusWindow(window_id));
        Ok(())
    }
}

/// Records every request and answers with a canned outcome
pub struct FakeRestorer {
    outcome: RefCell<RestoreOutcome>,
    requests: RefCell<Vec<Vec<TabRef>>>,
}

impl FakeRestorer {
    pub fn succeeding() -> Self {
        FakeRestorer {
            outcome: RefCell::new(RestoreOutcome::ok()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        let restorer = Self::succeeding();
        *restorer.outcome.borrow_mut() = RestoreOutcome::failed(message);
        restorer
    }

    pub fn requests(&self) -> Vec<Vec<TabRef>> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Restorer for FakeRestorer {
    async fn restore(&self, tabs: &[TabRef], _remove_after_restore: bool) -> RestoreOutcome {
        self.requests.borrow_mut().push(tabs.to_vec());
        self.outcome.borrow().clone()
    }
}

pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn now_ms(&self) -> f64 {
        self.0
    }
}
