use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::api::{routes, ApiClient};
use crate::auth::storage::TokenStore;
use crate::auth::token::{Credentials, Registration, TokenPair};
use crate::error::{DeskError, DeskResult};

const SESSION_EVENT_CAPACITY: usize = 16;

/// Whether the current session holds an access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Transitions published to session subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
    /// An authorized call was rejected and the session was dropped
    Expired { status: u16 },
}

/// Login, logout and the derived authentication state.
///
/// Authentication is a presence check on the token store: no signature or
/// expiry validation happens on the client, so `is_authenticated` says a
/// token exists, not that the server will accept it.
pub struct SessionController {
    tokens: Arc<dyn TokenStore>,
    client: Arc<ApiClient>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    /// `tokens` must be the same store the client reads from
    pub fn new(tokens: Arc<dyn TokenStore>, client: Arc<ApiClient>) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            tokens,
            client,
            events,
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Subscribe to session transitions
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Store a freshly issued token pair; the session becomes authenticated
    pub async fn login(&self, access: &str, refresh: &str) -> DeskResult<()> {
        self.tokens.set(access, refresh).await?;
        info!("Session authenticated");
        self.publish(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Clear stored tokens. Calling this on an anonymous session is a no-op.
    pub async fn logout(&self) -> DeskResult<()> {
        self.tokens.clear().await?;
        info!("Session cleared");
        self.publish(SessionEvent::LoggedOut);
        Ok(())
    }

    pub async fn is_authenticated(&self) -> DeskResult<bool> {
        Ok(self.tokens.get().await?.is_some())
    }

    pub async fn state(&self) -> DeskResult<SessionState> {
        Ok(if self.is_authenticated().await? {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        })
    }

    /// Exchange credentials at `token/` and start a session.
    ///
    /// Empty fields fail validation without any request being made.
    pub async fn sign_in(&self, credentials: &Credentials) -> DeskResult<TokenPair> {
        credentials.validate()?;

        debug!(username = %credentials.username, "Requesting token pair");
        let tokens: TokenPair = serde_json::from_value(
            self.client
                .post_unauthorized(routes::TOKEN, credentials)
                .await?,
        )?;

        self.login(&tokens.access, &tokens.refresh).await?;
        Ok(tokens)
    }

    /// Create an account at `register/`, then sign in with the same
    /// credentials.
    ///
    /// Missing fields or a confirmation that is not byte-for-byte equal to
    /// the password fail validation without any request being made.
    pub async fn register(&self, registration: &Registration) -> DeskResult<TokenPair> {
        registration.validate()?;

        let credentials = &registration.credentials;
        debug!(username = %credentials.username, "Registering account");
        self.client
            .post_unauthorized(routes::REGISTER, credentials)
            .await?;
        info!(username = %credentials.username, "Account registered");

        self.sign_in(credentials).await
    }

    /// Drop the session if `error` is an authorization failure.
    ///
    /// Views call this with the errors they observe; returns whether the
    /// session was ended.
    pub async fn end_session_on_auth_failure(&self, error: &DeskError) -> DeskResult<bool> {
        let status = match error {
            DeskError::Auth { status, .. } => *status,
            _ => return Ok(false),
        };

        warn!(status = status, "Authorization rejected, ending session");
        self.tokens.clear().await?;
        self.publish(SessionEvent::Expired { status });
        Ok(true)
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
