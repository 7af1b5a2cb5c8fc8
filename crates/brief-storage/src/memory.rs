use std::collections::BTreeMap;

use async_trait::async_trait;
use brief_core::ServiceError;
use tokio::sync::Mutex;

use crate::{ObjectStore, StorageError, StoredObject};

#[derive(Debug, Default)]
struct MemoryState {
    objects: BTreeMap<String, (String, Vec<u8>)>,
    failure: Option<ServiceError>,
}

#[derive(Debug, Default)]
/// Process-local object store; optionally scripted to fail every upload.
pub struct InMemoryObjectStore {
    state: Mutex<MemoryState>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_with(error: ServiceError) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                objects: BTreeMap::new(),
                failure: Some(error),
            }),
        }
    }

    pub async fn keys(&self) -> Vec<String> {
        self.state.lock().await.objects.keys().cloned().collect()
    }

    pub async fn get(&self, key: &str) -> Option<(String, Vec<u8>)> {
        self.state.lock().await.objects.get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let mut state = self.state.lock().await;
        if let Some(error) = state.failure.clone() {
            return Err(StorageError::Service(error));
        }
        state
            .objects
            .insert(key.to_string(), (content_type.to_string(), bytes.to_vec()));
        Ok(StoredObject {
            key: key.to_string(),
            url: format!("memory://{key}"),
        })
    }
}
