//! The seam between the discovery subsystem and its consumers.

use std::fmt;
use std::sync::Arc;

use crate::model::{Device, DeviceCategory, DeviceId, SessionEpoch};

/// Receives presence notifications from the discovery subsystem.
///
/// Callbacks may arrive on any thread and concurrently for different
/// devices. Notifications for one device identity arrive in the order they
/// happened. Implementations must return quickly and must not call back into
/// the source's mutating methods (`announce`, `byebye`, `restart`).
pub trait DiscoveryListener: Send + Sync {
    /// A device appeared (or re-appeared after being lost) in session `epoch`.
    fn on_device_discovered(&self, epoch: SessionEpoch, device: Device);

    /// A device left the network in session `epoch`.
    fn on_device_lost(&self, epoch: SessionEpoch, category: DeviceCategory, id: DeviceId);
}

/// Handle returned by [`DiscoverySource::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Authoritative view of what the discovery subsystem currently knows.
///
/// Consumers keep their own incremental copy and compare against this view
/// to detect missed notifications.
pub trait DiscoverySource: Send + Sync {
    /// Number of devices of `category` currently known.
    fn current_device_count(&self, category: DeviceCategory) -> usize;

    /// Devices of `category` currently known, in discovery order.
    fn current_device_list(&self, category: DeviceCategory) -> Vec<Device>;

    /// Epoch of the running discovery session.
    fn session_epoch(&self) -> SessionEpoch;

    /// Tear down the running session and start a new one.
    ///
    /// Every device is forgotten; the returned epoch tags all notifications
    /// of the new session.
    fn restart(&self) -> SessionEpoch;

    /// Register a listener for presence notifications.
    fn add_listener(&self, listener: Arc<dyn DiscoveryListener>) -> ListenerId;

    /// Unregister a listener. Returns whether it was registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}
