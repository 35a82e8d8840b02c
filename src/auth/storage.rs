use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::auth::token::TokenPair;
use crate::error::DeskResult;
use crate::store::JsonStore;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Holder for the current session's tokens.
///
/// This is a dumb key/value holder: it does not look inside tokens and does
/// not track expiry. An empty access token reads as absent.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Current tokens, if any
    async fn get(&self) -> DeskResult<Option<TokenPair>>;

    /// Replace the stored tokens
    async fn set(&self, access: &str, refresh: &str) -> DeskResult<()>;

    /// Remove both tokens. Clearing an empty store is not an error.
    async fn clear(&self) -> DeskResult<()>;
}

/// Token store persisted to a JSON file so sessions survive restarts
pub struct FileTokenStore {
    store: JsonStore,
}

impl FileTokenStore {
    /// Open (or lazily create) the token file at `path`
    pub async fn open(path: impl Into<PathBuf>) -> DeskResult<Self> {
        let store = JsonStore::open(path).await?;
        Ok(Self { store })
    }

    pub fn into_shared(self) -> Arc<dyn TokenStore> {
        Arc::new(self)
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self) -> DeskResult<Option<TokenPair>> {
        let access: Option<String> = self.store.get(ACCESS_TOKEN_KEY).await;
        let access = match access {
            Some(access) if !access.is_empty() => access,
            _ => {
                debug!("No access token in session store");
                return Ok(None);
            }
        };
        let refresh: String = self
            .store
            .get(REFRESH_TOKEN_KEY)
            .await
            .unwrap_or_default();

        Ok(Some(TokenPair { access, refresh }))
    }

    async fn set(&self, access: &str, refresh: &str) -> DeskResult<()> {
        self.store
            .set_many([
                (ACCESS_TOKEN_KEY.to_string(), Value::String(access.to_string())),
                (REFRESH_TOKEN_KEY.to_string(), Value::String(refresh.to_string())),
            ])
            .await?;
        info!(path = %self.store.path().display(), "Session tokens stored");
        Ok(())
    }

    async fn clear(&self) -> DeskResult<()> {
        self.store
            .delete_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])
            .await?;
        debug!(path = %self.store.path().display(), "Session tokens cleared");
        Ok(())
    }
}

/// Process-local token store; nothing is written to disk
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with tokens already present
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        Self {
            tokens: RwLock::new(Some(TokenPair::new(access, refresh))),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> DeskResult<Option<TokenPair>> {
        Ok(self
            .tokens
            .read()
            .await
            .clone()
            .filter(|tokens| !tokens.access.is_empty()))
    }

    async fn set(&self, access: &str, refresh: &str) -> DeskResult<()> {
        *self.tokens.write().await = Some(TokenPair::new(access, refresh));
        Ok(())
    }

    async fn clear(&self) -> DeskResult<()> {
        *self.tokens.write().await = None;
        Ok(())
    }
}
