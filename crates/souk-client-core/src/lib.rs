//! Souk client core: the reliability layer of the marketplace client.
//!
//! Screens, theming and navigation live elsewhere; this crate owns the
//! parts with real contracts:
//! - persistent credential/preference storage with a fail-soft facade
//! - the auth session state machine (optimistic restore, fail-closed
//!   login, never-failing logout)
//! - the connectivity monitor with its pre-action gate
//! - the single global message box
//! - the user-facing error classifier
//!
//! [`ClientCore`] is the composition root: it wires the pieces together
//! once and hands out cheap clones. Nothing in this crate is a global.

pub mod api;
pub mod config;
pub mod connectivity;
pub mod errors;
pub mod message_box;
pub mod preferences;
pub mod session;
pub mod storage;

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::{ClientConfig, ConfigError};
use crate::connectivity::{ConnectivityMonitor, SystemReachability};
use crate::errors::ApiError;
use crate::message_box::MessageBoxStore;
use crate::preferences::Preferences;
use crate::session::SessionHandle;
use crate::storage::SecureKeyValueStore;

/// Failure to assemble the client core.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The assembled reliability layer. Owned by the application root and
/// injected into collaborators; every field is a cheap-to-clone handle.
pub struct ClientCore {
    pub config: ClientConfig,
    pub store: SecureKeyValueStore,
    pub api: Arc<ApiClient>,
    pub session: SessionHandle,
    pub message_box: MessageBoxStore,
    pub monitor: ConnectivityMonitor,
}

impl ClientCore {
    /// Wire the layer from configuration: storage backend probe, API
    /// client, session handle, message box and monitor.
    pub fn new(config: ClientConfig) -> Result<Self, BootstrapError> {
        let store = SecureKeyValueStore::detect(&config.data_path());
        let api = Arc::new(ApiClient::from_config(&config)?);
        let message_box = MessageBoxStore::new();
        let session = SessionHandle::new(store.clone(), api.clone());
        let monitor = ConnectivityMonitor::new(
            Arc::new(SystemReachability::from_base_url(&config.base_url)?),
            api.clone(),
            message_box.clone(),
            config.probe_timeout(),
            config.check_interval(),
        );

        Ok(Self {
            config,
            store,
            api,
            session,
            message_box,
            monitor,
        })
    }

    /// Load configuration from the conventional location and wire the
    /// layer from it.
    pub fn bootstrap() -> Result<Self, BootstrapError> {
        Self::new(ClientConfig::load()?)
    }

    /// Preference accessors over the same storage surface.
    pub fn preferences(&self) -> Preferences {
        Preferences::new(self.store.clone())
    }
}
