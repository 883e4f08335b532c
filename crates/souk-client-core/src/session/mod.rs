//! Auth session state machine.
//!
//! [`SessionHandle`] owns the single shared [`Session`] slot and is the
//! only writer to it. It is an explicit context object: the composition
//! root creates one and clones it into collaborators; nothing here is
//! global. Collaborators read reactively through
//! [`subscribe`](SessionHandle::subscribe).
//!
//! Every commit bumps a monotonic version. Synchronous commits land
//! unconditionally; the asynchronous tail of
//! [`initialize_auth`](SessionHandle::initialize_auth) commits through a
//! version guard so a profile fetch that resolves after a newer `login` or
//! `logout` cannot overwrite their state.

mod profile;

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::errors::ErrorKind;
use crate::storage::{SecureKeyValueStore, keys};

pub use profile::{Profile, ProfileFetcher};

/// The client-held session: token pair, user identity and the operation
/// flags UI collaborators render from.
///
/// While `is_loading` is true the other fields are not yet authoritative.
/// `token` and `is_authenticated` are deliberately not coupled by any
/// invariant; see [`SessionHandle::initialize_auth`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<Profile>,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

struct SessionShared {
    state: watch::Sender<Session>,
    // Guards the commit version; every commit bumps it while holding the
    // lock, so a guarded commit observes a consistent (version, state) pair.
    version: Mutex<u64>,
}

/// Handle to the shared session slot. Cheap to clone.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
    store: SecureKeyValueStore,
    fetcher: Arc<dyn ProfileFetcher>,
}

impl SessionHandle {
    pub fn new(store: SecureKeyValueStore, fetcher: Arc<dyn ProfileFetcher>) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            shared: Arc::new(SessionShared {
                state,
                version: Mutex::new(0),
            }),
            store,
            fetcher,
        }
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> Session {
        self.shared.state.borrow().clone()
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.shared.state.subscribe()
    }

    /// Restore the session from persisted credentials.
    ///
    /// With no stored token this terminates at unauthenticated without a
    /// profile fetch. With a token, the session is committed as
    /// authenticated *before* verification so the UI can proceed
    /// optimistically; the profile fetch then fills in `user`. A failed
    /// fetch records the error and leaves `is_authenticated` true: the
    /// user keeps their session and sees the error inline. This
    /// authenticated-but-profile-less outcome is a deliberate, documented
    /// contract of the layer.
    pub async fn initialize_auth(&self) {
        self.commit(|s| s.is_loading = true);

        let token = match self.store.try_get(keys::AUTH_TOKEN).await {
            Ok(token) => token,
            Err(error) => {
                warn!(%error, "failed to read stored auth token");
                self.commit(|s| {
                    s.is_authenticated = false;
                    s.is_loading = false;
                    s.error = Some(ErrorKind::AuthFailure.user_message().to_string());
                });
                return;
            }
        };

        let refresh_token = match self.store.try_get(keys::REFRESH_TOKEN).await {
            Ok(refresh) => refresh,
            Err(error) => {
                warn!(%error, "failed to read stored refresh token");
                self.commit(|s| {
                    s.is_authenticated = false;
                    s.is_loading = false;
                    s.error = Some(ErrorKind::AuthFailure.user_message().to_string());
                });
                return;
            }
        };

        let Some(token) = token else {
            debug!("no stored token; session starts unauthenticated");
            self.commit(|s| {
                s.is_authenticated = false;
                s.is_loading = false;
            });
            return;
        };

        // Optimistic commit: authenticated before the profile is verified.
        let observed = self.commit(|s| {
            s.token = Some(token.clone());
            s.refresh_token = refresh_token;
            s.is_authenticated = true;
        });

        match self.fetcher.fetch_profile(&token).await {
            Ok(profile) => {
                self.commit_if_current(observed, |s| {
                    s.user = Some(profile);
                    s.is_loading = false;
                });
            }
            Err(error) => {
                warn!(%error, "profile fetch failed during session restore");
                let message = error.user_message();
                self.commit_if_current(observed, |s| {
                    s.user = None;
                    s.is_loading = false;
                    s.error = Some(message);
                });
            }
        }
    }

    /// Establish an authenticated session.
    ///
    /// The token pair is persisted first; only on persistence success does
    /// the authenticated state commit. On failure the previous
    /// authentication flag is left untouched and only the error field is
    /// set (fail-closed).
    pub async fn login(&self, user: Profile, token: String, refresh_token: Option<String>) {
        let mut persisted = self.store.try_save(keys::AUTH_TOKEN, &token).await;
        if persisted.is_ok() {
            if let Some(refresh) = &refresh_token {
                persisted = self.store.try_save(keys::REFRESH_TOKEN, refresh).await;
            }
        }

        match persisted {
            Ok(()) => {
                self.commit(|s| {
                    s.user = Some(user);
                    s.token = Some(token);
                    s.refresh_token = refresh_token;
                    s.is_authenticated = true;
                    s.is_loading = false;
                    s.error = None;
                });
            }
            Err(error) => {
                warn!(%error, "failed to persist credentials; login not committed");
                self.commit(|s| {
                    s.error = Some(ErrorKind::Persistence.user_message().to_string());
                    s.is_loading = false;
                });
            }
        }
    }

    /// Clear the session. Never fails: each credential delete failure is
    /// caught independently and the baseline logged-out state commits
    /// regardless.
    pub async fn logout(&self) {
        if let Err(error) = self.store.try_delete(keys::AUTH_TOKEN).await {
            warn!(%error, "failed to delete stored auth token");
        }
        if let Err(error) = self.store.try_delete(keys::REFRESH_TOKEN).await {
            warn!(%error, "failed to delete stored refresh token");
        }
        self.commit(|s| *s = Session::default());
    }

    pub fn set_loading(&self, loading: bool) {
        self.commit(|s| s.is_loading = loading);
    }

    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.commit(|s| s.error = Some(message));
    }

    pub fn clear_error(&self) {
        self.commit(|s| s.error = None);
    }

    /// Apply a mutation unconditionally; returns the commit's version.
    fn commit(&self, mutate: impl FnOnce(&mut Session)) -> u64 {
        let mut version = self.shared.version.lock().unwrap_or_else(|e| e.into_inner());
        *version += 1;
        self.shared.state.send_modify(mutate);
        *version
    }

    /// Commit only if no other commit landed since `observed`; returns
    /// whether the commit was applied. Used by async completions so a
    /// stale result cannot clobber newer state.
    fn commit_if_current(&self, observed: u64, mutate: impl FnOnce(&mut Session)) -> bool {
        let mut version = self.shared.version.lock().unwrap_or_else(|e| e.into_inner());
        if *version != observed {
            debug!(observed, current = *version, "dropping stale session commit");
            return false;
        }
        *version += 1;
        self.shared.state.send_modify(mutate);
        true
    }
}
