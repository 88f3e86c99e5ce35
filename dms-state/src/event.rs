//! Events delivered to the presentation layer

use dms_discovery::{Device, DeviceCategory, DeviceId};

/// How a device list changed in one reconciliation step.
///
/// Lets the consumer pick a cheap single-row update over a full redraw.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeDescriptor {
    /// `device` was inserted at `index`
    Inserted { index: usize, device: Device },
    /// The entry at `index` was removed
    Removed { index: usize },
    /// The whole list was replaced
    Replaced(Vec<Device>),
}

impl ChangeDescriptor {
    /// Whether the consumer has to rebuild the whole list.
    pub fn is_full_refresh(&self) -> bool {
        matches!(self, ChangeDescriptor::Replaced(_))
    }
}

/// Result of selecting a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The selection moved to the device
    NewlySelected,
    /// The device was already the selection
    AlreadySelected,
}

impl SelectOutcome {
    pub fn already_selected(self) -> bool {
        self == SelectOutcome::AlreadySelected
    }
}

/// Everything the controller reports, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// A device list changed
    Registry {
        category: DeviceCategory,
        change: ChangeDescriptor,
    },
    /// The selection was set or cleared on request
    SelectionChanged {
        category: DeviceCategory,
        device: Option<DeviceId>,
    },
    /// The selected device disappeared and the selection was dropped with it
    SelectionClearedDueToLoss {
        category: DeviceCategory,
        device: DeviceId,
    },
    /// Discovery started waiting for devices, or received its first one
    RefreshingChanged {
        category: DeviceCategory,
        refreshing: bool,
    },
}

impl ControllerEvent {
    pub fn category(&self) -> DeviceCategory {
        match self {
            ControllerEvent::Registry { category, .. }
            | ControllerEvent::SelectionChanged { category, .. }
            | ControllerEvent::SelectionClearedDueToLoss { category, .. }
            | ControllerEvent::RefreshingChanged { category, .. } => *category,
        }
    }
}
