//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chaton_action::{ActionRegistry, ActionServices};
use chaton_core::config::ChatonConfig;
use chaton_core::error::ChatonError;
use chaton_storage::Database;

use crate::auth::SessionStore;
use crate::relay::ChatRelay;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<ChatonConfig>,
    /// SQLite database for persistent storage.
    pub database: Arc<Database>,
    /// Repositories and matching policy, shared with the action handlers.
    pub services: Arc<ActionServices>,
    /// Action-server handlers keyed by action name.
    pub actions: Arc<ActionRegistry>,
    /// Storefront login sessions.
    pub sessions: Arc<SessionStore>,
    /// Client for the dialogue server's REST webhook.
    pub relay: ChatRelay,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState and register every built-in action.
    pub fn new(config: ChatonConfig, database: Database) -> Result<Self, ChatonError> {
        let database = Arc::new(database);
        let services = Arc::new(ActionServices::new(Arc::clone(&database), &config));

        let mut actions = ActionRegistry::new();
        actions.register_defaults(Arc::clone(&services));

        let idle = Duration::from_secs(u64::from(config.auth.session_timeout_minutes) * 60);
        let relay = ChatRelay::new(&config.chat)?;

        Ok(Self {
            config: Arc::new(config),
            database,
            services,
            actions: Arc::new(actions),
            sessions: Arc::new(SessionStore::new(idle)),
            relay,
            start_time: Instant::now(),
        })
    }
}
