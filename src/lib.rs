/// Tab Keeper - Chrome Extension that saves windows of tabs as groups
/// Built with Rust + WASM + Yew

mod backup;
mod browser;
mod capture;
mod chrome;
mod config;
mod error;
mod keeper;
mod messages;
mod restore;
mod storage;
mod store;
mod tab_data;
#[cfg(test)]
mod testing;
pub mod ui;

use std::rc::Rc;

use log::{error, info};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use capture::CaptureService;
use chrome::{ChromeBrowser, ChromeStorage, SystemClock};
use config::KeeperConfig;
use messages::MessageHandler;
use restore::RestoreService;
use storage::StorageAdapter;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

fn chrome_storage(config: &KeeperConfig) -> StorageAdapter {
    StorageAdapter::new(
        Rc::new(ChromeStorage::local()),
        Rc::new(ChromeStorage::sync()),
        config.clone(),
    )
}

fn capture_service() -> CaptureService {
    let config = KeeperConfig::default();
    CaptureService::new(
        Rc::new(ChromeBrowser),
        chrome_storage(&config),
        Rc::new(SystemClock),
        config,
    )
}

// Wire up the background service worker: toolbar click and runtime messages
#[wasm_bindgen]
pub fn start_background() {
    let on_click = Closure::wrap(Box::new(|| {
        spawn_local(async {
            match capture_service().capture_current().await {
                Ok(Some(group)) => info!("Saved {} tabs", group.tabs.len()),
                Ok(None) => info!("Nothing to save in this window"),
                Err(e) => error!("Failed to save tabs: {}", e),
            }
        });
    }) as Box<dyn Fn()>);
    chrome::onActionClicked(on_click.as_ref().unchecked_ref());
    on_click.forget();

    let config = KeeperConfig::default();
    let handler = Rc::new(MessageHandler::new(
        RestoreService::new(Rc::new(ChromeBrowser), config.clone()),
        chrome_storage(&config),
    ));
    let on_message = Closure::wrap(Box::new(move |request: JsValue| -> JsValue {
        let message: Value = match chrome::from_js(request) {
            Ok(message) => message,
            Err(_) => return JsValue::UNDEFINED,
        };
        if !MessageHandler::<RestoreService>::owns(&message) {
            return JsValue::UNDEFINED;
        }

        let handler = handler.clone();
        future_to_promise(async move {
            let reply = handler.handle(message).await.unwrap_or(Value::Null);
            chrome::to_js(&reply).map_err(|e| JsValue::from_str(&e.to_string()))
        })
        .into()
    }) as Box<dyn Fn(JsValue) -> JsValue>);
    chrome::onRuntimeMessage(on_message.as_ref().unchecked_ref());
    on_message.forget();
}

// Start the Yew app for tabkeeper.html
#[wasm_bindgen]
pub fn start_main_page() {
    yew::Renderer::<ui::main_page::MainPage>::new().render();
}

// Focus the management page, opening it if needed
#[wasm_bindgen]
pub async fn open_main_page() -> Result<(), JsValue> {
    capture_service()
        .open_main_page()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
