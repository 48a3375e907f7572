/// chrome.* implementations of the browser and storage seams

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;

use crate::browser::{Browser, Clock, CreateTab};
use crate::error::{KeeperError, Result};
use crate::messages::MessageChannel;
use crate::storage::StorageArea;
use crate::tab_data::TabInfo;

// Import JS bridge functions
#[wasm_bindgen(module = "/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getCurrentWindowId() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn queryTabs(query: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn createTab(properties: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn createWindow(url: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeTabs(tab_ids: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn activateTab(tab_id: i32) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn focusWindow(window_id: i32) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getStorage(area: &str, key: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(area: &str, items: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendMessage(message: JsValue) -> std::result::Result<JsValue, JsValue>;

    pub fn onActionClicked(handler: &js_sys::Function);

    pub fn onRuntimeMessage(handler: &js_sys::Function);

    pub fn onLocalStorageChanged(handler: &js_sys::Function);

    pub fn exportToFile(data: &str, filename: &str);
}

/// Chrome rejections are usually `Error` objects; keep just their message
fn js_message(error: &JsValue) -> String {
    js_sys::Reflect::get(error, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| error.as_string())
        .unwrap_or_else(|| format!("{:?}", error))
}

fn tab_error(error: JsValue) -> KeeperError {
    KeeperError::TabOperationFailure(js_message(&error))
}

fn storage_error(error: JsValue) -> KeeperError {
    KeeperError::StorageFailure(js_message(&error))
}

/// Plain JS objects rather than `Map`s, so chrome.* accepts them
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| KeeperError::InvalidFormat(format!("Failed to serialize: {:?}", e)))
}

pub fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| KeeperError::InvalidFormat(format!("Failed to parse: {:?}", e)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TabQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    window_id: Option<i32>,
}

pub struct ChromeBrowser;

impl ChromeBrowser {
    async fn query(&self, window_id: Option<i32>) -> Result<Vec<TabInfo>> {
        let tabs_js = queryTabs(to_js(&TabQuery { window_id })?).await.map_err(tab_error)?;
        from_js(tabs_js)
    }
}

#[async_trait(?Send)]
impl Browser for ChromeBrowser {
    async fn current_window_id(&self) -> Result<i32> {
        let id = getCurrentWindowId().await.map_err(tab_error)?;
        id.as_f64()
            .map(|id| id as i32)
            .ok_or_else(|| KeeperError::TabOperationFailure("window has no id".to_string()))
    }

    async fn window_tabs(&self, window_id: i32) -> Result<Vec<TabInfo>> {
        self.query(Some(window_id)).await
    }

    async fn all_tabs(&self) -> Result<Vec<TabInfo>> {
        self.query(None).await
    }

    async fn create_tab(&self, request: CreateTab) -> Result<()> {
        createTab(to_js(&request)?).await.map_err(tab_error)?;
        Ok(())
    }

    async fn create_window(&self, url: &str) -> Result<i32> {
        let id = createWindow(url).await.map_err(tab_error)?;
        id.as_f64()
            .map(|id| id as i32)
            .ok_or_else(|| KeeperError::TabOperationFailure("new window has no id".to_string()))
    }

    async fn remove_tabs(&self, tab_ids: &[i32]) -> Result<()> {
        removeTabs(to_js(tab_ids)?).await.map_err(tab_error)
    }

    async fn activate_tab(&self, tab_id: i32) -> Result<()> {
        activateTab(tab_id).await.map_err(tab_error)
    }

    async fn focus_window(&self, window_id: i32) -> Result<()> {
        focusWindow(window_id).await.map_err(tab_error)
    }
}

/// `chrome.storage.local` or `chrome.storage.sync`
pub struct ChromeStorage {
    area: &'static str,
}

impl ChromeStorage {
    pub fn local() -> Self {
        ChromeStorage { area: "local" }
    }

    pub fn sync() -> Self {
        ChromeStorage { area: "sync" }
    }
}

#[async_trait(?Send)]
impl StorageArea for ChromeStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let value_js = getStorage(self.area, key).await.map_err(storage_error)?;
        if value_js.is_null() || value_js.is_undefined() {
            Ok(None)
        } else {
            from_js(value_js).map(Some)
        }
    }

    async fn set_items(&self, items: Map<String, Value>) -> Result<()> {
        setStorage(self.area, to_js(&items)?).await.map_err(storage_error)
    }
}

/// `chrome.runtime.sendMessage`
pub struct RuntimeChannel;

#[async_trait(?Send)]
impl MessageChannel for RuntimeChannel {
    async fn send(&self, message: Value) -> Result<Value> {
        let reply = sendMessage(to_js(&message)?).await.map_err(tab_error)?;
        if reply.is_undefined() {
            return Ok(Value::Null);
        }
        from_js(reply)
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use serde_json::json;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_to_js_builds_plain_objects() {
        let value = to_js(&json!({ "tabGroups": [{ "id": "1" }] })).unwrap();

        assert!(!value.is_instance_of::<js_sys::Map>());
        let groups = js_sys::Reflect::get(&value, &JsValue::from_str("tabGroups")).unwrap();
        assert!(js_sys::Array::is_array(&groups));
    }

    #[wasm_bindgen_test]
    fn test_js_message_prefers_error_message() {
        let error: JsValue = js_sys::Error::new("No tab with id: 5").into();
        assert_eq!(js_message(&error), "No tab with id: 5");
        assert_eq!(js_message(&JsValue::from_str("plain")), "plain");
    }

    #[wasm_bindgen_test]
    fn test_from_js_round_trip() {
        let tab: TabInfo = from_js(to_js(&json!({ "id": 3, "windowId": 1, "url": "https://a.com/" })).unwrap()).unwrap();
        assert_eq!(tab.url, "https://a.com/");
    }
}
