use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::Config;
use crate::editor::session::{EditorSession, SessionSettings};
use crate::errors::AppError;
use crate::profile_client::ProfileStore;

pub type SessionMap = Arc<RwLock<HashMap<Uuid, Arc<EditorSession>>>>;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Persistence collaborator. HTTP when PROFILE_SERVICE_URL is set, in-memory otherwise.
    pub profiles: Arc<dyn ProfileStore>,
    pub sessions: SessionMap,
}

impl AppState {
    pub fn new(config: Config, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            config,
            profiles,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            quiet_window: self.config.autosave_quiet,
            notification_backlog: self.config.notification_backlog,
        }
    }

    pub async fn session(&self, id: Uuid) -> Result<Arc<EditorSession>, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }
}
