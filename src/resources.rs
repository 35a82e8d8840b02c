use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::{routes, ApiClient};
use crate::cache::{CollectionCache, CACHED_EVENTS_KEY, CACHED_TASKS_KEY};
use crate::config::EmptyListPolicy;
use crate::error::DeskResult;
use crate::models::{
    Attendee, AttendeeDraft, Event, EventDraft, RecordId, Searchable, Task, TaskDraft, TaskStatus,
};

/// A collection exposed by the backend under `COLLECTION`
pub trait Resource:
    Searchable + Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    /// Writable fields sent on create and update
    type Draft: Serialize + Send + Sync;

    const COLLECTION: &'static str;
    /// Singular noun used in messages ("event")
    const NOUN: &'static str;
    /// Plural noun used in messages ("events")
    const PLURAL: &'static str;
    /// Collection cache key, for resources whose lists are cached
    const CACHE_KEY: Option<&'static str> = None;

    fn id(&self) -> &RecordId;

    fn validate_draft(draft: &Self::Draft) -> DeskResult<()>;
}

/// Resources the backend lets clients delete
pub trait Deletable: Resource {}

impl Resource for Event {
    type Draft = EventDraft;
    const COLLECTION: &'static str = routes::EVENTS;
    const NOUN: &'static str = "event";
    const PLURAL: &'static str = "events";
    const CACHE_KEY: Option<&'static str> = Some(CACHED_EVENTS_KEY);

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn validate_draft(draft: &EventDraft) -> DeskResult<()> {
        draft.validate()
    }
}

impl Deletable for Event {}

impl Resource for Attendee {
    type Draft = AttendeeDraft;
    const COLLECTION: &'static str = routes::ATTENDEES;
    const NOUN: &'static str = "attendee";
    const PLURAL: &'static str = "attendees";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn validate_draft(draft: &AttendeeDraft) -> DeskResult<()> {
        draft.validate()
    }
}

impl Deletable for Attendee {}

impl Resource for Task {
    type Draft = TaskDraft;
    const COLLECTION: &'static str = routes::TASKS;
    const NOUN: &'static str = "task";
    const PLURAL: &'static str = "tasks";
    const CACHE_KEY: Option<&'static str> = Some(CACHED_TASKS_KEY);

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn validate_draft(draft: &TaskDraft) -> DeskResult<()> {
        draft.validate()
    }
}

/// Where a listing came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    Live,
    Cache,
}

#[derive(Debug, Clone)]
pub struct Listing<R> {
    pub items: Vec<R>,
    pub source: ListSource,
}

impl<R> Listing<R> {
    fn live(items: Vec<R>) -> Self {
        Self {
            items,
            source: ListSource::Live,
        }
    }

    fn cached(items: Vec<R>) -> Self {
        Self {
            items,
            source: ListSource::Cache,
        }
    }
}

/// Typed access to one backend collection
pub struct ResourceClient<R> {
    client: Arc<ApiClient>,
    cache: Option<Arc<CollectionCache>>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            cache: self.cache.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceClient<R> {
    pub fn new(client: Arc<ApiClient>, cache: Option<Arc<CollectionCache>>) -> Self {
        Self {
            client,
            cache,
            _resource: PhantomData,
        }
    }

    /// Fetch the collection.
    ///
    /// For cached resources, a successful fetch refreshes the cache, and a
    /// network or server failure is answered from the cache when it holds
    /// items. Authorization and client errors are always returned.
    pub async fn list(&self) -> DeskResult<Listing<R>> {
        match self.client.get_json::<Vec<R>>(R::COLLECTION).await {
            Ok(items) => {
                debug!(resource = R::PLURAL, count = items.len(), "Fetched collection");
                if let Some((cache, key)) = self.cache_slot() {
                    if items.is_empty() && cache.empty_list_policy() == EmptyListPolicy::Fallback {
                        if let Some(cached) = self.cached_items(cache, key).await {
                            info!(resource = R::PLURAL, "Empty result, showing cached collection");
                            return Ok(Listing::cached(cached));
                        }
                    }
                    cache.remember(key, &items).await;
                }
                Ok(Listing::live(items))
            }
            Err(e) if e.allows_cache_fallback() => {
                if let Some((cache, key)) = self.cache_slot() {
                    if let Some(cached) = self.cached_items(cache, key).await {
                        warn!(
                            resource = R::PLURAL,
                            error = %e,
                            count = cached.len(),
                            "Live fetch failed, showing cached collection"
                        );
                        return Ok(Listing::cached(cached));
                    }
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Validate and POST a new record; returns the record as stored
    pub async fn create(&self, draft: &R::Draft) -> DeskResult<R> {
        R::validate_draft(draft)?;
        let created: R = self.client.post_json(R::COLLECTION, draft).await?;
        info!(resource = R::NOUN, id = %created.id(), "Created record");
        Ok(created)
    }

    /// Validate and PUT a record; returns the record as stored
    pub async fn update(&self, id: &RecordId, draft: &R::Draft) -> DeskResult<R> {
        R::validate_draft(draft)?;
        let updated: R = self
            .client
            .put_json(&routes::item(R::COLLECTION, id), draft)
            .await?;
        info!(resource = R::NOUN, id = %id, "Updated record");
        Ok(updated)
    }

    fn cache_slot(&self) -> Option<(&CollectionCache, &'static str)> {
        match (self.cache.as_deref(), R::CACHE_KEY) {
            (Some(cache), Some(key)) => Some((cache, key)),
            _ => None,
        }
    }

    async fn cached_items(&self, cache: &CollectionCache, key: &str) -> Option<Vec<R>> {
        cache
            .load::<R>(key)
            .await
            .filter(|items| !items.is_empty())
    }
}

impl<R: Deletable> ResourceClient<R> {
    pub async fn delete(&self, id: &RecordId) -> DeskResult<()> {
        self.client
            .delete_authorized(&routes::item(R::COLLECTION, id))
            .await?;
        info!(resource = R::NOUN, id = %id, "Deleted record");
        Ok(())
    }
}

impl ResourceClient<Event> {
    /// Link an attendee to an event through the event's action endpoint
    pub async fn add_attendee(&self, event: &RecordId, attendee: &RecordId) -> DeskResult<()> {
        self.client
            .post_authorized(
                &routes::action(routes::EVENTS, event, "add_attendee"),
                &json!({ "attendee_id": attendee }),
            )
            .await?;
        info!(event = %event, attendee = %attendee, "Attendee added to event");
        Ok(())
    }
}

impl ResourceClient<Attendee> {
    /// Events an attendee is registered for
    pub async fn events_of(&self, attendee: &RecordId) -> DeskResult<Vec<Event>> {
        self.client
            .get_json(&routes::action(routes::ATTENDEES, attendee, "events"))
            .await
    }
}

impl ResourceClient<Task> {
    /// PUT the full task back with a new status
    pub async fn set_status(&self, task: &Task, status: TaskStatus) -> DeskResult<()> {
        let mut body = task.clone();
        body.status = status;
        self.client
            .put_authorized(&routes::item(routes::TASKS, &task.id), &body)
            .await?;
        info!(id = %task.id, status = %status, "Task status updated");
        Ok(())
    }
}
