use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{ApiClient, HttpClient};
use crate::auth::{FileTokenStore, SessionController, TokenStore};
use crate::cache::CollectionCache;
use crate::config::Config;
use crate::error::DeskResult;
use crate::models::{Attendee, Event, Task};
use crate::resources::{Resource, ResourceClient};
use crate::search::SearchContext;
use crate::views::ListView;

/// Everything one dashboard session needs, wired together.
///
/// The token store is shared by the API client and the session controller,
/// and one search context is shared by every list view created here.
pub struct Desk {
    pub tokens: Arc<dyn TokenStore>,
    pub client: Arc<ApiClient>,
    pub session: Arc<SessionController>,
    pub search: SearchContext,
    cache: Option<Arc<CollectionCache>>,
}

impl Desk {
    /// Open the persisted session and cache described by `config`
    pub async fn open(config: &Config) -> DeskResult<Self> {
        let tokens = FileTokenStore::open(config.storage.session_path())
            .await?
            .into_shared();
        let client = Arc::new(ApiClient::from_config(&config.api, tokens.clone())?);
        let cache = open_cache(config).await?;

        info!(api_root = %config.api.root_url, "Dashboard ready");
        Ok(Self::assemble(tokens, client, cache))
    }

    /// Build on an explicit transport and token store
    pub fn with_parts(
        root_url: impl Into<String>,
        http: Arc<dyn HttpClient>,
        tokens: Arc<dyn TokenStore>,
        cache: Option<Arc<CollectionCache>>,
    ) -> Self {
        let client = Arc::new(ApiClient::new(root_url, http, tokens.clone()));
        Self::assemble(tokens, client, cache)
    }

    fn assemble(
        tokens: Arc<dyn TokenStore>,
        client: Arc<ApiClient>,
        cache: Option<Arc<CollectionCache>>,
    ) -> Self {
        let session = Arc::new(SessionController::new(tokens.clone(), client.clone()));
        Self {
            tokens,
            client,
            session,
            search: SearchContext::new(),
            cache,
        }
    }

    pub fn resource<R: Resource>(&self) -> ResourceClient<R> {
        ResourceClient::new(self.client.clone(), self.cache.clone())
    }

    pub fn view<R: Resource>(&self) -> ListView<R> {
        ListView::new(self.resource(), self.session.clone(), self.search.clone())
    }

    pub fn events_view(&self) -> ListView<Event> {
        self.view()
    }

    pub fn attendees_view(&self) -> ListView<Attendee> {
        self.view()
    }

    pub fn tasks_view(&self) -> ListView<Task> {
        self.view()
    }
}

async fn open_cache(config: &Config) -> DeskResult<Option<Arc<CollectionCache>>> {
    if !config.cache.enabled {
        debug!("Collection cache disabled");
        return Ok(None);
    }
    let cache =
        CollectionCache::open(config.storage.cache_path(), config.cache.empty_list_policy).await?;
    Ok(Some(Arc::new(cache)))
}
