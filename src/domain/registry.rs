//! Connection registry: device slot, viewer set, and fan-out.
//!
//! [`ConnectionRegistry`] tracks every open WebSocket connection behind a
//! single [`tokio::sync::RwLock`]. One connection at a time may hold the
//! privileged device slot; everyone else is a viewer. Critical sections are
//! lock-mutate-release with no I/O under the lock beyond non-blocking
//! channel sends, so a slow peer can never stall the registry.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};

use super::ConnId;
use crate::error::GatewayError;
use crate::ws::messages::{DeviceStatus, ServerFrame};

/// Instruction delivered to a connection's writer half through its
/// outbound channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A serialized JSON text frame to send to the peer.
    Frame(String),
    /// Send a transport-level Ping probe.
    Probe,
    /// Close the socket and end the connection task.
    Terminate,
}

/// Role of a registered connection.
///
/// Every connection starts as a viewer; announcing as the reader device
/// promotes it. A role never reverts from [`Role::Device`] back to
/// [`Role::Viewer`] within a connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A monitoring client.
    Viewer,
    /// The reader device gateway.
    Device,
}

#[derive(Debug)]
struct PeerHandle {
    sender: mpsc::UnboundedSender<Outbound>,
    role: Role,
    alive: bool,
}

#[derive(Debug, Default)]
struct RegistryInner {
    device: Option<ConnId>,
    peers: HashMap<ConnId, PeerHandle>,
}

/// Central store for all open connections.
///
/// # Invariants
///
/// - At most one connection holds the device slot at any time.
/// - On takeover the new slot reference is installed before the evicted
///   connection's termination is requested, so the evicted connection's
///   delayed close event is recognized as stale and ignored.
/// - Broadcast never targets a connection with [`Role::Device`].
/// - [`ConnectionRegistry::remove`] is idempotent.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly accepted connection as a viewer.
    ///
    /// The liveness flag starts true so the connection always survives its
    /// first probe cycle. The current device status is pushed to the new
    /// connection directly so a late-joining viewer renders the correct
    /// indicator; transition notices remain broadcast-only.
    pub async fn accept(&self, id: ConnId, sender: mpsc::UnboundedSender<Outbound>) {
        let status_frame = {
            let mut inner = self.inner.write().await;
            let status = if inner.device.is_some() {
                DeviceStatus::Online
            } else {
                DeviceStatus::Offline
            };
            inner.peers.insert(
                id,
                PeerHandle {
                    sender: sender.clone(),
                    role: Role::Viewer,
                    alive: true,
                },
            );
            ServerFrame::DeviceStatus { status }.to_json()
        };
        let _ = sender.send(Outbound::Frame(status_frame));
    }

    /// Installs `id` as the device, evicting any previous holder.
    ///
    /// The slot is updated before the old connection is asked to terminate.
    /// Viewers are notified only on the offline→online transition, so a
    /// takeover while a device is already online produces no duplicate
    /// notice. The promoted connection is acknowledged directly.
    pub async fn promote_to_device(&self, id: ConnId) {
        let (evicted, became_online) = {
            let mut inner = self.inner.write().await;
            if !inner.peers.contains_key(&id) {
                tracing::warn!(conn_id = %id, "device announce from unregistered connection");
                return;
            }
            let was_online = inner.device.is_some();
            let previous = inner.device.replace(id);
            if let Some(peer) = inner.peers.get_mut(&id) {
                peer.role = Role::Device;
            }
            (previous.filter(|prev| *prev != id), !was_online)
        };

        if let Some(old) = evicted {
            tracing::info!(old_conn = %old, new_conn = %id, "device slot taken over");
            self.terminate(old).await;
        }

        let ack = ServerFrame::DeviceStatus {
            status: DeviceStatus::Online,
        }
        .to_json();
        if became_online {
            tracing::info!(conn_id = %id, "reader device online");
            self.broadcast_to_viewers(&ack).await;
        }
        self.send_to(id, ack).await;
    }

    /// Removes a connection from the registry.
    ///
    /// Clears the device slot and notifies viewers only when the closing
    /// connection still holds the slot; a stale close from an evicted
    /// device leaves the new holder untouched. Removing an already-removed
    /// connection is a no-op.
    pub async fn remove(&self, id: ConnId) {
        let became_offline = {
            let mut inner = self.inner.write().await;
            inner.peers.remove(&id);
            if inner.device == Some(id) {
                inner.device = None;
                true
            } else {
                false
            }
        };
        if became_offline {
            tracing::info!(conn_id = %id, "reader device offline");
            let notice = ServerFrame::DeviceStatus {
                status: DeviceStatus::Offline,
            }
            .to_json();
            self.broadcast_to_viewers(&notice).await;
        }
    }

    /// Sends a serialized frame to every open viewer.
    ///
    /// The payload is serialized once by the caller; delivery iterates a
    /// point-in-time snapshot of the viewer set, and a failed send to one
    /// peer never affects delivery to the others. The current device (and
    /// an evicted device awaiting close) is never targeted.
    pub async fn broadcast_to_viewers(&self, json: &str) {
        let targets: Vec<(ConnId, mpsc::UnboundedSender<Outbound>)> = {
            let inner = self.inner.read().await;
            inner
                .peers
                .iter()
                .filter(|(_, peer)| peer.role == Role::Viewer)
                .map(|(id, peer)| (*id, peer.sender.clone()))
                .collect()
        };
        for (id, sender) in targets {
            if sender.send(Outbound::Frame(json.to_owned())).is_err() {
                tracing::debug!(conn_id = %id, "dropped broadcast frame for closed connection");
            }
        }
    }

    /// Sends a serialized frame to one connection, if it is still open.
    pub async fn send_to(&self, id: ConnId, json: String) {
        let inner = self.inner.read().await;
        if let Some(peer) = inner.peers.get(&id)
            && peer.sender.send(Outbound::Frame(json)).is_err()
        {
            tracing::debug!(conn_id = %id, "dropped frame for closed connection");
        }
    }

    /// Forwards a serialized frame to the device.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DeviceOffline`] when no device holds the
    /// slot or its connection task is already gone.
    pub async fn forward_to_device(&self, json: &str) -> Result<(), GatewayError> {
        let inner = self.inner.read().await;
        let device = inner.device.ok_or(GatewayError::DeviceOffline)?;
        let peer = inner.peers.get(&device).ok_or(GatewayError::DeviceOffline)?;
        peer.sender
            .send(Outbound::Frame(json.to_owned()))
            .map_err(|_| GatewayError::DeviceOffline)
    }

    /// Returns `true` while a device connection holds the slot.
    pub async fn is_device_online(&self) -> bool {
        self.inner.read().await.device.is_some()
    }

    /// Returns the number of open viewer connections.
    pub async fn viewer_count(&self) -> usize {
        self.inner
            .read()
            .await
            .peers
            .values()
            .filter(|peer| peer.role == Role::Viewer)
            .count()
    }

    /// Marks a connection as having answered the latest probe.
    pub async fn mark_alive(&self, id: ConnId) {
        let mut inner = self.inner.write().await;
        if let Some(peer) = inner.peers.get_mut(&id) {
            peer.alive = true;
        }
    }

    /// Runs one liveness sweep.
    ///
    /// A connection whose flag is still false from the previous sweep is
    /// terminated; everyone else has the flag cleared and receives a probe.
    /// The flag becomes true again only through [`Self::mark_alive`] (or on
    /// accept), so a silent peer is evicted within one to two sweep periods.
    pub async fn sweep(&self) {
        let mut silent = Vec::new();
        {
            let mut inner = self.inner.write().await;
            for (id, peer) in &mut inner.peers {
                if peer.alive {
                    peer.alive = false;
                    let _ = peer.sender.send(Outbound::Probe);
                } else {
                    silent.push(*id);
                }
            }
        }
        for id in silent {
            tracing::warn!(conn_id = %id, "liveness probe unanswered, terminating");
            self.terminate(id).await;
        }
    }

    /// Best-effort shutdown notice and termination for every connection.
    pub async fn shutdown_all(&self) {
        let targets: Vec<(ConnId, mpsc::UnboundedSender<Outbound>)> = {
            let inner = self.inner.read().await;
            inner
                .peers
                .iter()
                .map(|(id, peer)| (*id, peer.sender.clone()))
                .collect()
        };
        tracing::info!(count = targets.len(), "terminating all connections");
        let notice = ServerFrame::Shutdown.to_json();
        for (_, sender) in targets {
            let _ = sender.send(Outbound::Frame(notice.clone()));
            let _ = sender.send(Outbound::Terminate);
        }
    }

    /// Requests termination of one connection through its writer half,
    /// falling back to direct removal when the task is already gone (its
    /// close event would otherwise never fire).
    async fn terminate(&self, id: ConnId) {
        let task_gone = {
            let inner = self.inner.read().await;
            match inner.peers.get(&id) {
                Some(peer) => peer.sender.send(Outbound::Terminate).is_err(),
                None => false,
            }
        };
        if task_gone {
            self.remove(id).await;
        }
    }
}
