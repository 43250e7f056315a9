pub mod persistence;
pub mod question;
pub mod round;
pub mod score;
pub mod session;
pub mod state_machine;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig, dao::player_store::PlayerStore, error::ServiceError,
    services::session_service::SessionHandle, state::question::QuestionBank,
};

pub type SharedState = Arc<AppState>;

/// Central application state storing the storage handle, configuration and live sessions.
pub struct AppState {
    config: AppConfig,
    bank: Arc<QuestionBank>,
    player_store: RwLock<Option<Arc<dyn PlayerStore>>>,
    degraded: watch::Sender<bool>,
    sessions: DashMap<Uuid, SessionHandle>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let bank = Arc::new(config.question_bank().clone());
        Arc::new(Self {
            config,
            bank,
            player_store: RwLock::new(None),
            degraded: degraded_tx,
            sessions: DashMap::new(),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Question bank shared by every session.
    pub fn question_bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.bank)
    }

    /// Obtain a handle to the current player store, if one is installed.
    pub async fn player_store(&self) -> Option<Arc<dyn PlayerStore>> {
        let guard = self.player_store.read().await;
        guard.as_ref().cloned()
    }

    /// Return the player store or fail when running degraded.
    pub async fn require_player_store(&self) -> Result<Arc<dyn PlayerStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.player_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new player store implementation and leave degraded mode.
    pub async fn set_player_store(&self, store: Arc<dyn PlayerStore>) {
        {
            let mut guard = self.player_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current player store and enter degraded mode.
    pub async fn clear_player_store(&self) {
        {
            let mut guard = self.player_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Live game sessions keyed by their identifier.
    pub fn sessions(&self) -> &DashMap<Uuid, SessionHandle> {
        &self.sessions
    }
}
