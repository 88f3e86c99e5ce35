//! Error types for dms-state

use dms_discovery::{DeviceCategory, DeviceId};
use thiserror::Error;

/// Result type for dms-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors surfaced to the presentation layer
///
/// Stale notifications, count drift and duplicate notifications are not
/// errors: the engine absorbs them.
#[derive(Error, Debug)]
pub enum StateError {
    /// `select()` named a device that is not in the list
    #[error("Cannot select {id}: no such {category} in the device list")]
    InvalidSelection { category: DeviceCategory, id: DeviceId },

    /// The update thread is gone
    #[error("Update thread channel has been closed")]
    ChannelClosed,

    /// The controller has already been shut down
    #[error("Controller has already been shut down")]
    AlreadyShutdown,

    /// The update thread could not be started
    #[error("Failed to spawn update thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}
