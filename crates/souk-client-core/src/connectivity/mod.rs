//! Network and backend health monitoring.
//!
//! [`ConnectivityMonitor`] owns the tri-state [`ConnectivityStatus`] and
//! publishes it through a watch channel. A check asks the device first
//! (cheap, no backend traffic when offline) and only then probes the
//! backend with a bounded liveness/write-path pair. Checks are idempotent
//! reads, so overlapping invocations are fine; the last resolved result
//! wins the slot.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, timeout};
use tracing::{debug, info, warn};

use crate::errors::{ApiError, ErrorKind};
use crate::message_box::{MessageBoxPayload, MessageBoxStore};

/// Default reachability probe budget.
const REACHABILITY_TIMEOUT: Duration = Duration::from_millis(1500);

/// Health of the connection between this device and the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityStatus {
    /// Device online and both backend probes passing.
    Ok,
    /// The device itself has no network connectivity.
    Offline,
    /// Device online but the backend failed its probes.
    ServerDown,
}

impl ConnectivityStatus {
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Failure category for this status, when it is a failure.
    pub fn error_kind(self) -> Option<ErrorKind> {
        match self {
            Self::Ok => None,
            Self::Offline => Some(ErrorKind::NetworkUnreachable),
            Self::ServerDown => Some(ErrorKind::BackendUnavailable),
        }
    }

    /// Banner wording; `None` means render nothing.
    pub fn user_message(self) -> Option<&'static str> {
        self.error_kind().map(ErrorKind::user_message)
    }
}

/// Device-level reachability, answered without touching the backend API.
#[async_trait]
pub trait Reachability: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Reachability via a bounded TCP connect to the API host. No OS
/// network-information service is involved, so this works the same on
/// every platform the client runs on.
pub struct SystemReachability {
    addr: String,
    timeout: Duration,
}

impl SystemReachability {
    /// Derive the probe address from the API base URL.
    pub fn from_base_url(base_url: &str) -> Result<Self, ApiError> {
        let url = url::Url::parse(base_url)
            .map_err(|err| ApiError::Transport(format!("invalid base url: {err}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| ApiError::Transport("base url has no host".to_string()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ApiError::Transport("base url has no port".to_string()))?;
        Ok(Self {
            addr: format!("{host}:{port}"),
            timeout: REACHABILITY_TIMEOUT,
        })
    }
}

#[async_trait]
impl Reachability for SystemReachability {
    async fn is_reachable(&self) -> bool {
        match timeout(self.timeout, tokio::net::TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(err)) => {
                debug!(addr = %self.addr, %err, "reachability connect failed");
                false
            }
            Err(_) => {
                debug!(addr = %self.addr, "reachability connect timed out");
                false
            }
        }
    }
}

/// The two backend probes. Production is [`ApiClient`](crate::api::ApiClient).
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// Plain health request; `Ok` only for a success status.
    async fn liveness(&self) -> Result<(), ApiError>;

    /// Request against a representative mutating endpoint with a fixed
    /// test payload. Returns the HTTP status of any completed exchange;
    /// `Err` only when no response was received.
    async fn write_path(&self) -> Result<u16, ApiError>;
}

/// A completed write-path exchange proves reachability when the backend
/// either accepted the payload or rejected it as invalid.
fn write_probe_ok(status: u16) -> bool {
    (200..300).contains(&status) || status == 400 || status == 422
}

/// Monitors connectivity and backend health. Cheap to clone; all clones
/// share the same status slot.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    reachability: Arc<dyn Reachability>,
    transport: Arc<dyn ProbeTransport>,
    message_box: MessageBoxStore,
    status: Arc<watch::Sender<ConnectivityStatus>>,
    poke: Arc<Notify>,
    probe_timeout: Duration,
    check_interval: Duration,
}

impl ConnectivityMonitor {
    pub fn new(
        reachability: Arc<dyn Reachability>,
        transport: Arc<dyn ProbeTransport>,
        message_box: MessageBoxStore,
        probe_timeout: Duration,
        check_interval: Duration,
    ) -> Self {
        let (status, _) = watch::channel(ConnectivityStatus::Ok);
        Self {
            reachability,
            transport,
            message_box,
            status: Arc::new(status),
            poke: Arc::new(Notify::new()),
            probe_timeout,
            check_interval,
        }
    }

    /// Last resolved status.
    pub fn status(&self) -> ConnectivityStatus {
        *self.status.borrow()
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.status.subscribe()
    }

    /// Signal a network change; the background task re-checks promptly.
    pub fn poke(&self) {
        self.poke.notify_one();
    }

    /// Run one check and publish the result.
    pub async fn check(&self) -> ConnectivityStatus {
        let status = self.run_check().await;
        self.status.send_replace(status);
        status
    }

    async fn run_check(&self) -> ConnectivityStatus {
        if !self.reachability.is_reachable().await {
            debug!("device unreachable; skipping backend probes");
            return ConnectivityStatus::Offline;
        }

        let liveness = timeout(self.probe_timeout, self.transport.liveness());
        let write_path = timeout(self.probe_timeout, self.transport.write_path());
        let (liveness, write_path) = tokio::join!(liveness, write_path);

        let liveness_ok = matches!(liveness, Ok(Ok(())));
        let write_ok = matches!(write_path, Ok(Ok(status)) if write_probe_ok(status));

        if liveness_ok && write_ok {
            ConnectivityStatus::Ok
        } else {
            warn!(liveness_ok, write_ok, "backend probes failed");
            ConnectivityStatus::ServerDown
        }
    }

    /// Start the background loop: an immediate check, then one per
    /// interval tick and one per [`poke`](Self::poke). Dropping the
    /// returned guard aborts the task so no further status updates land.
    pub fn spawn(&self) -> MonitorGuard {
        let monitor = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(monitor.check_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        monitor.check().await;
                    }
                    _ = monitor.poke.notified() => {
                        info!("network change signalled; re-checking connectivity");
                        monitor.check().await;
                    }
                }
            }
        });
        MonitorGuard { handle }
    }

    /// Pre-action gate: re-run the two-stage check right before a
    /// user-triggered action. On failure a context-specific message is
    /// pushed into the message box and the caller must abort the action.
    pub async fn guard_action(&self, action_label: &str) -> bool {
        let status = self.check().await;
        match status.error_kind() {
            None => true,
            Some(kind) => {
                self.message_box.show(MessageBoxPayload::new(
                    action_label.to_string(),
                    kind.user_message().to_string(),
                ));
                false
            }
        }
    }
}

/// Aborts the monitor's background task on drop.
pub struct MonitorGuard {
    handle: JoinHandle<()>,
}

impl Drop for MonitorGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_probe_accepts_validation_statuses() {
        assert!(write_probe_ok(200));
        assert!(write_probe_ok(201));
        assert!(write_probe_ok(400));
        assert!(write_probe_ok(422));
        assert!(!write_probe_ok(404));
        assert!(!write_probe_ok(500));
        assert!(!write_probe_ok(503));
    }

    #[test]
    fn status_wording_matches_taxonomy() {
        assert_eq!(ConnectivityStatus::Ok.user_message(), None);
        assert_eq!(
            ConnectivityStatus::Offline.user_message(),
            Some(crate::errors::OFFLINE)
        );
        assert_eq!(
            ConnectivityStatus::ServerDown.user_message(),
            Some(crate::errors::SERVER_MAINTENANCE)
        );
    }
}
