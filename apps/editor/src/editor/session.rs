//! One user's editing session: block store, history and save orchestrator
//! wired together. Every accepted edit re-arms the autosave timer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::editor::autosave::{SaveOrchestrator, SaveOutcome, SaveTrigger, SharedStore};
use crate::editor::blocks::{Block, BlockId, Document, EntryId};
use crate::editor::builders::build_initial_blocks;
use crate::editor::entries;
use crate::editor::preview::render_document_to_md;
use crate::editor::store::{BlockStore, Edit};
use crate::editor::EditorError;
use crate::models::profile::ProfileSnapshot;
use crate::notifications::{Notification, NotificationLog};
use crate::profile_client::{ProfileError, ProfileStore};

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub quiet_window: Duration,
    pub notification_backlog: usize,
}

/// Snapshot of a session for the client: the document plus toolbar state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub blocks: Document,
    pub can_undo: bool,
    pub can_redo: bool,
    pub dirty: bool,
    pub saving: bool,
    pub autosave_pending: bool,
    pub opened_at: DateTime<Utc>,
}

pub struct EditorSession {
    id: Uuid,
    store: SharedStore,
    saver: SaveOrchestrator,
    notifications: Arc<NotificationLog>,
    opened_at: DateTime<Utc>,
}

impl EditorSession {
    /// Loads the profile and seeds a new session from it.
    pub async fn open(
        profiles: Arc<dyn ProfileStore>,
        settings: &SessionSettings,
    ) -> Result<Self, ProfileError> {
        let profile = profiles.get_profile().await?;
        Ok(Self::from_profile(&profile, profiles, settings))
    }

    pub fn from_profile(
        profile: &ProfileSnapshot,
        profiles: Arc<dyn ProfileStore>,
        settings: &SessionSettings,
    ) -> Self {
        let id = Uuid::new_v4();
        let store = Arc::new(Mutex::new(BlockStore::load(build_initial_blocks(profile))));
        let notifications = Arc::new(NotificationLog::new(settings.notification_backlog));
        let saver = SaveOrchestrator::new(
            store.clone(),
            profiles,
            notifications.clone(),
            settings.quiet_window,
        );
        info!("Opened editor session {id}");
        Self {
            id,
            store,
            saver,
            notifications,
            opened_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn view(&self) -> SessionView {
        let store = self.store.lock().await;
        SessionView {
            session_id: self.id,
            blocks: store.document().clone(),
            can_undo: store.history().can_undo(),
            can_redo: store.history().can_redo(),
            dirty: store.is_dirty(),
            saving: self.saver.is_saving(),
            autosave_pending: self.saver.has_pending_autosave(),
            opened_at: self.opened_at,
        }
    }

    pub async fn add_block(&self, type_name: &str) -> Result<BlockId, EditorError> {
        let id = self.store.lock().await.add_block_named(type_name)?;
        self.saver.schedule();
        Ok(id)
    }

    pub async fn delete_block(&self, id: BlockId) -> Edit {
        let edit = self.store.lock().await.delete_block(id);
        self.after(edit)
    }

    pub async fn update_block(&self, id: BlockId, replacement: Block) -> Result<(), EditorError> {
        self.store.lock().await.update_block(id, replacement)?;
        self.saver.schedule();
        Ok(())
    }

    pub async fn move_block(&self, index: usize, direction: i32) -> Edit {
        let edit = self.store.lock().await.move_block(index, direction);
        self.after(edit)
    }

    pub async fn toggle_block(&self, id: BlockId) -> Result<(), EditorError> {
        self.modify_block(id, |block| Ok((entries::toggle_collapsed(block), ())))
            .await
    }

    pub async fn add_entry(&self, block_id: BlockId) -> Result<EntryId, EditorError> {
        self.modify_block(block_id, entries::append_empty_entry).await
    }

    pub async fn update_entry(
        &self,
        block_id: BlockId,
        entry_id: EntryId,
        fields: Value,
    ) -> Result<(), EditorError> {
        self.modify_block(block_id, |block| {
            Ok((entries::replace_entry(block, entry_id, fields)?, ()))
        })
        .await
    }

    pub async fn delete_entry(&self, block_id: BlockId, entry_id: EntryId) -> Result<(), EditorError> {
        self.modify_block(block_id, |block| {
            Ok((entries::remove_entry(block, entry_id)?, ()))
        })
        .await
    }

    pub async fn add_skill(&self, block_id: BlockId, skill: &str) -> Result<(), EditorError> {
        self.modify_block(block_id, |block| Ok((entries::add_skill(block, skill)?, ())))
            .await
    }

    pub async fn remove_skill(&self, block_id: BlockId, index: usize) -> Result<(), EditorError> {
        self.modify_block(block_id, |block| {
            Ok((entries::remove_skill(block, index)?, ()))
        })
        .await
    }

    pub async fn undo(&self) -> Edit {
        let edit = self.store.lock().await.undo();
        self.after(edit)
    }

    pub async fn redo(&self) -> Edit {
        let edit = self.store.lock().await.redo();
        self.after(edit)
    }

    /// User-triggered save; bypasses the quiet window.
    pub async fn save(&self) -> SaveOutcome {
        self.saver.save(SaveTrigger::Manual).await
    }

    pub async fn preview(&self) -> String {
        render_document_to_md(self.store.lock().await.document())
    }

    pub fn drain_notifications(&self) -> Vec<Notification> {
        self.notifications.drain()
    }

    /// Ends the session. Unsaved changes are flushed immediately instead of
    /// waiting out the quiet window, after any save already in flight.
    pub async fn close(&self) -> Option<SaveOutcome> {
        let outcome = self.saver.close().await;
        info!("Closed editor session {}", self.id);
        outcome
    }

    /// Applies `f` to the current block and stores the block it returns.
    async fn modify_block<T, F>(&self, id: BlockId, f: F) -> Result<T, EditorError>
    where
        F: FnOnce(&Block) -> Result<(Block, T), EditorError>,
    {
        let mut store = self.store.lock().await;
        let current = store
            .document()
            .get(id)
            .ok_or(EditorError::BlockNotFound(id))?;
        let (next, extra) = f(current)?;
        store.update_block(id, next)?;
        drop(store);
        self.saver.schedule();
        Ok(extra)
    }

    fn after(&self, edit: Edit) -> Edit {
        if edit.applied() {
            self.saver.schedule();
        }
        edit
    }
}
