//! A process-local stand-in for the external object store addressed by
//! session `gcsIn`/`gcsOut` identifiers (§4.6). `Config` carries only a
//! bucket name, no credentials, so there is no real bucket client to call
//! here; this cache lets `gcsIn`/`gcsOut` round-trip bytes within one
//! process the same way `GeneralBots-botserver`'s `PRESENTATION_CACHE`
//! holds generated artifacts in memory rather than against a real bucket.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

#[derive(Clone, Default)]
pub struct ObjectStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, key: &str, bytes: Vec<u8>) {
        self.blobs.lock().await.insert(key.to_string(), bytes);
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().await.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = ObjectStore::new();
        store.put("gs://b/x", vec![1, 2, 3]).await;
        assert_eq!(store.get("gs://b/x").await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let store = ObjectStore::new();
        assert!(store.get("nope").await.is_none());
    }
}
