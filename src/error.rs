/// Error taxonomy shared by every service
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum KeeperError {
    /// chrome.storage (local or sync) refused a read or write
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// The browser refused to query, create or remove a tab or window
    #[error("tab operation failed: {0}")]
    TabOperationFailure(String),

    /// A stored record or backup document has the wrong shape
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, KeeperError>;
