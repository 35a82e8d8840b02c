//! Last known good copies of the task and event collections.
//!
//! Lists are read back only when a live fetch cannot be trusted, so that a
//! transient backend failure does not empty the screen.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EmptyListPolicy;
use crate::error::DeskResult;
use crate::store::JsonStore;

pub const CACHED_TASKS_KEY: &str = "cachedTasks";
pub const CACHED_EVENTS_KEY: &str = "cachedEvents";

pub struct CollectionCache {
    store: JsonStore,
    empty_list_policy: EmptyListPolicy,
}

impl CollectionCache {
    pub async fn open(path: impl Into<PathBuf>, empty_list_policy: EmptyListPolicy) -> DeskResult<Self> {
        Ok(Self {
            store: JsonStore::open(path).await?,
            empty_list_policy,
        })
    }

    pub fn empty_list_policy(&self) -> EmptyListPolicy {
        self.empty_list_policy
    }

    /// Cached collection under `key`, if one was stored and still parses
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<Vec<T>> {
        self.store.get(key).await
    }

    /// Record a successful fetch. Empty lists are only written under the
    /// authoritative policy.
    pub async fn store<T: Serialize>(&self, key: &str, items: &[T]) -> DeskResult<()> {
        if items.is_empty() && self.empty_list_policy == EmptyListPolicy::Fallback {
            debug!(key = key, "Empty result, keeping cached collection");
            return Ok(());
        }
        self.store.set(key, &items).await?;
        debug!(key = key, count = items.len(), "Cached collection");
        Ok(())
    }

    /// Best-effort write; a cache failure never fails the fetch itself
    pub async fn remember<T: Serialize>(&self, key: &str, items: &[T]) {
        if let Err(e) = self.store(key, items).await {
            warn!(key = key, error = %e, "Failed to update collection cache");
        }
    }
}
