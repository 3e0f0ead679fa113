//! Process-level owner of the shared durable store.
//!
//! The extension process holds one [`StoreContainer`]. The first overlay
//! request opens the durable store (and loads its metadata); every later
//! request in the same process reuses it, together with the shared
//! [`CursorOverride`].
//!
//! Nothing here serializes overlapping notification invocations. The host is
//! expected not to run two of them against the same account at once.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

use riot_nse_core::Credentials;
use riot_nse_store::{FileStore, SessionStore};

use crate::config::{CredentialPolicy, NseConfig};
use crate::cursor::CursorOverride;
use crate::error::{OverlayError, Result};
use crate::overlay::OverlayStore;

/// The shared durable store plus the state every overlay on it shares.
pub struct SharedStore<S> {
    owner: Credentials,
    store: Arc<S>,
    cursor: Arc<CursorOverride>,
}

impl<S> SharedStore<S> {
    /// The credentials the store was created for.
    pub fn owner(&self) -> &Credentials {
        &self.owner
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cursor(&self) -> &Arc<CursorOverride> {
        &self.cursor
    }
}

/// Once-initialized holder of the process's [`SharedStore`].
pub struct StoreContainer<S> {
    config: NseConfig,
    shared: OnceCell<SharedStore<S>>,
}

impl<S: SessionStore> StoreContainer<S> {
    /// An empty container; the store is created on first use.
    pub fn new(config: NseConfig) -> Self {
        Self {
            config,
            shared: OnceCell::new(),
        }
    }

    /// A container around a store the host has already opened and loaded.
    pub fn with_store(config: NseConfig, owner: Credentials, store: Arc<S>) -> Self {
        Self {
            config,
            shared: OnceCell::new_with(Some(SharedStore {
                owner,
                store,
                cursor: Arc::new(CursorOverride::new()),
            })),
        }
    }

    pub fn config(&self) -> &NseConfig {
        &self.config
    }

    /// The shared store, if it has been created.
    pub fn shared(&self) -> Option<&SharedStore<S>> {
        self.shared.get()
    }

    /// Get the shared store, creating it with `factory` on first use.
    ///
    /// The factory runs at most once per container even under concurrent
    /// callers, and must return a store whose metadata is already loaded.
    /// If it fails the error is returned and the next call tries again.
    /// Later calls check `credentials` against the owner according to the
    /// configured [`CredentialPolicy`].
    pub async fn get_or_init<F, Fut>(
        &self,
        credentials: &Credentials,
        factory: F,
    ) -> Result<&SharedStore<S>>
    where
        F: FnOnce(Credentials) -> Fut,
        Fut: Future<Output = riot_nse_store::Result<S>>,
    {
        let shared = self
            .shared
            .get_or_try_init(|| async {
                tracing::info!(user_id = %credentials.user_id, "creating shared session store");
                let store = factory(credentials.clone()).await?;
                Ok::<_, OverlayError>(SharedStore {
                    owner: credentials.clone(),
                    store: Arc::new(store),
                    cursor: Arc::new(CursorOverride::new()),
                })
            })
            .await?;

        self.check_owner(shared, credentials)?;
        Ok(shared)
    }

    /// Build an overlay for `credentials`, creating the shared store with
    /// `factory` if needed.
    pub async fn overlay<F, Fut>(
        &self,
        credentials: Credentials,
        factory: F,
    ) -> Result<OverlayStore<S>>
    where
        F: FnOnce(Credentials) -> Fut,
        Fut: Future<Output = riot_nse_store::Result<S>>,
    {
        let shared = self.get_or_init(&credentials, factory).await?;
        Ok(OverlayStore::new(credentials, shared))
    }

    fn check_owner(&self, shared: &SharedStore<S>, credentials: &Credentials) -> Result<()> {
        if shared.owner.same_account(credentials) {
            return Ok(());
        }

        match self.config.credential_policy {
            CredentialPolicy::Reject => Err(OverlayError::CredentialMismatch {
                owner: shared.owner.user_id.clone(),
                requested: credentials.user_id.clone(),
            }),
            CredentialPolicy::Reuse => {
                tracing::warn!(
                    owner = %shared.owner.user_id,
                    requested = %credentials.user_id,
                    "reusing shared session store opened for another account"
                );
                Ok(())
            }
        }
    }
}

impl StoreContainer<FileStore> {
    /// Build an overlay over the account's on-disk store under
    /// [`NseConfig::store_root`], opening it read-only and loading its
    /// metadata on first use.
    ///
    /// The file must already exist. A file owned by another account fails
    /// with [`StoreError::ForeignOwner`](riot_nse_store::StoreError::ForeignOwner)
    /// and is left as it is.
    pub async fn open_overlay(&self, credentials: Credentials) -> Result<OverlayStore<FileStore>> {
        let path = self.config.store_path(&credentials);
        self.overlay(credentials, |credentials| async move {
            let store = FileStore::open_read_only(&path, credentials)?;
            store.load_metadata().await?;
            Ok(store)
        })
        .await
    }
}
