//! Object storage for uploaded case documents.
//!
//! [`ObjectStore`] is the capability the orchestrator is built against;
//! [`FirebaseStorageClient`] talks to the Firebase Storage REST API and
//! [`InMemoryObjectStore`] backs tests and offline runs.
mod config;
mod error;
mod firebase;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use config::{
    StorageConfig, StorageConfigError, DEFAULT_FIREBASE_STORAGE_API_BASE, FIREBASE_API_KEY_ENV,
    FIREBASE_PROJECT_ID_ENV, FIREBASE_STORAGE_API_BASE_ENV, FIREBASE_STORAGE_BUCKET_ENV,
};
pub use error::StorageError;
pub use firebase::FirebaseStorageClient;
pub use memory::InMemoryObjectStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Durable location of an uploaded object.
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

#[async_trait]
/// Trait contract for `ObjectStore` behavior.
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;
}

/// Time-stamped, name-qualified key under the `documents/` prefix.
pub fn object_key(file_name: &str, unix_ms: u64) -> String {
    format!("documents/{unix_ms}-{file_name}")
}

#[cfg(test)]
mod tests {
    use super::object_key;

    #[test]
    fn unit_object_key_is_timestamped_and_name_qualified() {
        assert_eq!(
            object_key("complaint.pdf", 1_700_000_000_123),
            "documents/1700000000123-complaint.pdf"
        );
    }
}
