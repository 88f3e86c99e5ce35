//! Immutable views of the device lists handed to readers

use std::sync::Arc;

use dms_discovery::{Device, DeviceCategory, DeviceId, SessionEpoch};

/// Point-in-time copy of one category's list and selection.
///
/// Cloning is cheap: the device list is shared.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    pub category: DeviceCategory,
    pub devices: Arc<[Device]>,
    pub selected: Option<DeviceId>,
    /// Discovery is waiting for its first device of this category
    pub refreshing: bool,
    pub epoch: SessionEpoch,
}

impl RegistrySnapshot {
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Position of the selected device in the list.
    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        self.devices.iter().position(|d| &d.id == selected)
    }

    pub fn selected_device(&self) -> Option<&Device> {
        self.selected_index().map(|index| &self.devices[index])
    }

    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| &d.id == id)
    }
}

/// Snapshots of both categories, swapped in as a unit after every step.
#[derive(Debug, Clone)]
pub(crate) struct Published {
    pub(crate) servers: RegistrySnapshot,
    pub(crate) renderers: RegistrySnapshot,
}

impl Published {
    pub(crate) fn get(&self, category: DeviceCategory) -> &RegistrySnapshot {
        match category {
            DeviceCategory::Server => &self.servers,
            DeviceCategory::Renderer => &self.renderers,
        }
    }
}
