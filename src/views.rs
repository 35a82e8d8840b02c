//! Screen state for the events, attendees and tasks lists.
//!
//! A view keeps the list it last showed and applies its own successful
//! mutations locally (append, replace, remove) without refetching, so the
//! last write wins. When a call is rejected as unauthorized the view ends
//! the session and asks the caller to go to the login screen.

use std::sync::Arc;

use tracing::{error, warn};

use crate::auth::SessionController;
use crate::error::DeskError;
use crate::models::{CalendarEntry, Event, RecordId, Task};
use crate::resources::{Deletable, ListSource, Resource, ResourceClient};
use crate::search::SearchContext;

/// What the caller should do after a view operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutcome {
    Done,
    /// Show the message; the view stays where it is
    Failed(String),
    /// The session was ended; navigate to the login screen
    LoginRequired,
}

impl ViewOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, ViewOutcome::Done)
    }
}

pub struct ListView<R: Resource> {
    resources: ResourceClient<R>,
    session: Arc<SessionController>,
    search: SearchContext,
    items: Vec<R>,
    error: Option<String>,
    loading: bool,
    source: Option<ListSource>,
}

impl<R: Resource> ListView<R> {
    pub fn new(
        resources: ResourceClient<R>,
        session: Arc<SessionController>,
        search: SearchContext,
    ) -> Self {
        Self {
            resources,
            session,
            search,
            items: Vec::new(),
            error: None,
            loading: true,
            source: None,
        }
    }

    /// Every loaded item, unfiltered
    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// Items matching the shared search term
    pub fn visible(&self) -> Vec<&R> {
        self.search.filter(&self.items)
    }

    /// Current error banner
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True until the first refresh finishes
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the shown list came from the live backend or the cache
    pub fn source(&self) -> Option<ListSource> {
        self.source
    }

    pub fn find(&self, id: &RecordId) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub async fn refresh(&mut self) -> ViewOutcome {
        let result = self.resources.list().await;
        self.loading = false;

        match result {
            Ok(listing) => {
                self.items = listing.items;
                self.source = Some(listing.source);
                self.error = None;
                ViewOutcome::Done
            }
            Err(e) => self.fail(e, format!("Failed to fetch {}", R::PLURAL)).await,
        }
    }

    pub async fn create(&mut self, draft: &R::Draft) -> ViewOutcome {
        match self.resources.create(draft).await {
            Ok(created) => {
                self.items.push(created);
                self.error = None;
                ViewOutcome::Done
            }
            Err(e) => self.fail(e, format!("Failed to add {}", R::NOUN)).await,
        }
    }

    /// Replace the item with the backend's copy after a successful update
    pub async fn update(&mut self, id: &RecordId, draft: &R::Draft) -> ViewOutcome {
        match self.resources.update(id, draft).await {
            Ok(updated) => {
                for item in self.items.iter_mut().filter(|item| item.id() == id) {
                    *item = updated.clone();
                }
                self.error = None;
                ViewOutcome::Done
            }
            Err(e) => self.fail(e, format!("Failed to update {}", R::NOUN)).await,
        }
    }

    async fn fail(&mut self, error: DeskError, context: String) -> ViewOutcome {
        if let DeskError::Validation(message) = &error {
            self.error = Some(message.clone());
            return ViewOutcome::Failed(message.clone());
        }

        if error.is_auth_failure() {
            if let Err(e) = self.session.end_session_on_auth_failure(&error).await {
                error!(error = %e, "Failed to clear session after authorization failure");
            }
            self.items.clear();
            self.source = None;
            self.error = Some(error.user_message());
            return ViewOutcome::LoginRequired;
        }

        warn!(resource = R::PLURAL, error = %error, "{}", context);
        let message = format!("{}: {}", context, error.user_message());
        self.error = Some(message.clone());
        ViewOutcome::Failed(message)
    }
}

impl<R: Deletable> ListView<R> {
    pub async fn delete(&mut self, id: &RecordId) -> ViewOutcome {
        match self.resources.delete(id).await {
            Ok(()) => {
                self.items.retain(|item| item.id() != id);
                self.error = None;
                ViewOutcome::Done
            }
            Err(e) => self.fail(e, format!("Failed to delete {}", R::NOUN)).await,
        }
    }
}

impl ListView<Event> {
    /// Visible events as calendar entries
    pub fn calendar(&self) -> Vec<CalendarEntry> {
        self.visible().into_iter().map(CalendarEntry::from).collect()
    }

    pub async fn add_attendee(&mut self, event: &RecordId, attendee: &RecordId) -> ViewOutcome {
        match self.resources.add_attendee(event, attendee).await {
            Ok(()) => {
                if let Some(item) = self.items.iter_mut().find(|item| &item.id == event) {
                    item.attendees_count += 1;
                }
                self.error = None;
                ViewOutcome::Done
            }
            Err(e) => self.fail(e, "Failed to add attendee".to_string()).await,
        }
    }
}

impl ListView<Task> {
    /// Flip Pending/Completed on the backend, then locally
    pub async fn toggle_status(&mut self, id: &RecordId) -> ViewOutcome {
        let task = match self.find(id) {
            Some(task) => task.clone(),
            None => return ViewOutcome::Failed(format!("Task {} is not loaded", id)),
        };
        let status = task.status.toggled();

        match self.resources.set_status(&task, status).await {
            Ok(()) => {
                for item in self.items.iter_mut().filter(|item| &item.id == id) {
                    item.status = status;
                }
                self.error = None;
                ViewOutcome::Done
            }
            Err(e) => self.fail(e, "Failed to update task".to_string()).await,
        }
    }
}
