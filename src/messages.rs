/// Runtime messages between the main page and the background worker

use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{KeeperError, Result};
use crate::restore::{RestoreOutcome, Restorer};
use crate::storage::StorageAdapter;
use crate::tab_data::{TabGroup, TabRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    RestoreTabs {
        tabs: Vec<TabRef>,
        #[serde(default = "default_remove_after_restore")]
        remove_after_restore: bool,
    },
    ExportData,
}

fn default_remove_after_restore() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub data: Vec<TabGroup>,
}

/// Answers requests inside the background worker
pub struct MessageHandler<R: Restorer> {
    restorer: R,
    storage: StorageAdapter,
}

impl<R: Restorer> MessageHandler<R> {
    pub fn new(restorer: R, storage: StorageAdapter) -> Self {
        MessageHandler { restorer, storage }
    }

    /// Must be answered synchronously, before `handle` runs
    pub fn owns(message: &Value) -> bool {
        serde_json::from_value::<Request>(message.clone()).is_ok()
    }

    /// `None` for messages this handler does not own
    pub async fn handle(&self, message: Value) -> Option<Value> {
        let request: Request = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                warn!("Ignoring message: {}", e);
                return None;
            }
        };

        let response = match request {
            Request::RestoreTabs {
                tabs,
                remove_after_restore,
            } => serde_json::to_value(self.restorer.restore(&tabs, remove_after_restore).await),
            Request::ExportData => {
                let data = match self.storage.load_groups().await {
                    Ok(groups) => groups,
                    Err(e) => {
                        warn!("Export failed to read storage: {}", e);
                        Vec::new()
                    }
                };
                serde_json::to_value(ExportResponse { data })
            }
        };

        response
            .map_err(|e| warn!("Failed to encode response: {}", e))
            .ok()
    }
}

/// Something that delivers a JSON message and returns the JSON reply
#[async_trait(?Send)]
pub trait MessageChannel {
    async fn send(&self, message: Value) -> Result<Value>;
}

/// Restores by asking the background worker, as the main page does
pub struct RemoteRestorer<C: MessageChannel> {
    channel: C,
}

impl<C: MessageChannel> RemoteRestorer<C> {
    pub fn new(channel: C) -> Self {
        RemoteRestorer { channel }
    }
}

#[async_trait(?Send)]
impl<C: MessageChannel> Restorer for RemoteRestorer<C> {
    async fn restore(&self, tabs: &[TabRef], remove_after_restore: bool) -> RestoreOutcome {
        let request = Request::RestoreTabs {
            tabs: tabs.to_vec(),
            remove_after_restore,
        };
        let reply = match serde_json::to_value(&request) {
            Ok(message) => self.channel.send(message).await,
            Err(e) => Err(KeeperError::InvalidFormat(e.to_string())),
        };

        match reply.and_then(|value| {
            serde_json::from_value::<RestoreOutcome>(value)
                .map_err(|e| KeeperError::InvalidFormat(format!("bad restore reply: {}", e)))
        }) {
            Ok(outcome) => outcome,
            Err(e) => RestoreOutcome::failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeeperConfig;
    use crate::testing::{FakeRestorer, MemoryStorage, group, tab_ref};
    use futures::executor::block_on;
    use serde_json::json;
    use std::rc::Rc;

    fn handler(restorer: FakeRestorer, groups: &[TabGroup]) -> MessageHandler<FakeRestorer> {
        let local = Rc::new(MemoryStorage::new());
        let storage = StorageAdapter::new(local, Rc::new(MemoryStorage::new()), KeeperConfig::default());
        block_on(storage.save_groups(groups)).unwrap();
        MessageHandler::new(restorer, storage)
    }

    #[test]
    fn test_request_wire_format() {
        let request: Request = serde_json::from_value(json!({
            "action": "restoreTabs",
            "tabs": [{ "title": "A", "url": "https://a.com/", "favIconUrl": null }],
            "removeAfterRestore": false
        }))
        .unwrap();

        assert_eq!(
            request,
            Request::RestoreTabs {
                tabs: vec![TabRef {
                    title: "A".to_string(),
                    url: "https://a.com/".to_string(),
                    fav_icon_url: None,
                }],
                remove_after_restore: false,
            }
        );

        let request: Request = serde_json::from_value(json!({ "action": "exportData" })).unwrap();
        assert_eq!(request, Request::ExportData);
    }

    #[test]
    fn test_handle_restore() {
        let handler = handler(FakeRestorer::failing("nope"), &[]);

        let reply = block_on(handler.handle(json!({
            "action": "restoreTabs",
            "tabs": [{ "url": "https://a.com/" }]
        })));

        assert_eq!(reply, Some(json!({ "success": false, "error": "nope" })));
    }

    #[test]
    fn test_handle_export() {
        let handler = handler(FakeRestorer::succeeding(), &[group("a", 1)]);

        let reply = block_on(handler.handle(json!({ "action": "exportData" }))).unwrap();

        let response: ExportResponse = serde_json::from_value(reply).unwrap();
        assert_eq!(response.data, vec![group("a", 1)]);
    }

    #[test]
    fn test_handle_unknown_action() {
        let handler = handler(FakeRestorer::succeeding(), &[]);

        assert!(!MessageHandler::<FakeRestorer>::owns(&json!({ "action": "dance" })));
        assert!(MessageHandler::<FakeRestorer>::owns(&json!({ "action": "exportData" })));
        assert_eq!(block_on(handler.handle(json!({ "action": "dance" }))), None);
    }

    struct Loopback(Rc<MessageHandler<FakeRestorer>>);

    #[async_trait(?Send)]
    impl MessageChannel for Loopback {
        async fn send(&self, message: Value) -> Result<Value> {
            Ok(self.0.handle(message).await.unwrap_or(Value::Null))
        }
    }

    #[test]
    fn test_remote_restorer_round_trip() {
        let handler = Rc::new(handler(FakeRestorer::succeeding(), &[]));
        let remote = RemoteRestorer::new(Loopback(handler));

        let outcome = block_on(remote.restore(&[tab_ref("https://a.com/")], true));

        assert_eq!(outcome, RestoreOutcome::ok());
    }

    struct Disconnected;

    #[async_trait(?Send)]
    impl MessageChannel for Disconnected {
        async fn send(&self, _message: Value) -> Result<Value> {
            Err(KeeperError::TabOperationFailure("Receiving end does not exist".to_string()))
        }
    }

    #[test]
    fn test_remote_restorer_transport_failure() {
        let outcome = block_on(RemoteRestorer::new(Disconnected).restore(&[tab_ref("https://a.com/")], true));

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("Receiving end"));
    }
}
