use crate::store::error::StoreResult;

/// String-keyed, string-valued storage.
///
/// Implementations must be usable behind `Arc<dyn KeyValueStore>`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Well-known keys
pub mod keys {
    // Durable
    pub const STORAGE_USAGE: &str = "storage-usage";
    pub const STORAGE_USAGE_SNAPSHOT: &str = "storage-usage-snapshot";
    pub const TUTORIAL_STATE: &str = "tutorial-state";

    // Session
    pub const SHOWN_EXPIRY_ALERT: &str = "shown-expiry-alert";
    pub const NOTIFIED_FILE_IDS: &str = "notified-file-ids";
    pub const LAST_FILE_IDS: &str = "last-file-ids";
}
