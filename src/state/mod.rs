use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    dao::record_store::RecordStore,
    error::ServiceError,
    services::{game_service::GameService, review_service::ReviewService},
};

/// Handle to the state shared by handlers and background tasks.
pub type SharedState = Arc<AppState>;

/// Central application state holding the storage handle shared by every request.
pub struct AppState {
    store: RwLock<Option<Arc<dyn RecordStore>>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new() -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            degraded: degraded_tx,
        })
    }

    /// Construct a state with `store` already installed.
    pub fn with_store(store: Arc<dyn RecordStore>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        Arc::new(Self {
            store: RwLock::new(Some(store)),
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current record store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn RecordStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Like [`AppState::store`], failing with [`ServiceError::Degraded`] when none is installed.
    pub async fn require_store(&self) -> Result<Arc<dyn RecordStore>, ServiceError> {
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new record store and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn RecordStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current record store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Set the degraded flag, ignoring no-op updates.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Game operations bound to the installed store.
    pub async fn games(&self) -> Result<GameService, ServiceError> {
        Ok(GameService::new(self.require_store().await?))
    }

    /// Review operations bound to the installed store.
    pub async fn reviews(&self) -> Result<ReviewService, ServiceError> {
        Ok(ReviewService::new(self.require_store().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::record_store::memory::MemoryRecordStore;

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new();
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));

        state.set_store(Arc::new(MemoryRecordStore::new())).await;
        assert!(!state.is_degraded());
        state.update_degraded(true);
        assert!(state.is_degraded());
        state.update_degraded(false);
        assert!(state.require_store().await.is_ok());

        state.clear_store().await;
        assert!(state.is_degraded());
        assert!(state.store().await.is_none());
    }
}
