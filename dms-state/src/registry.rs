//! Ordered device list for one category
//!
//! The registry is owned by the reconciliation engine and only touched on
//! the update thread, so it carries no synchronization of its own.

use std::collections::HashSet;

use dms_discovery::{Device, DeviceCategory, DeviceId};

/// Ordered collection of devices, unique by identity.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    category: DeviceCategory,
    devices: Vec<Device>,
}

impl DeviceRegistry {
    pub fn new(category: DeviceCategory) -> Self {
        Self {
            category,
            devices: Vec::new(),
        }
    }

    pub fn category(&self) -> DeviceCategory {
        self.category
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| &d.id == id)
    }

    pub fn contains(&self, id: &DeviceId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: &DeviceId) -> Option<usize> {
        self.devices.iter().position(|d| &d.id == id)
    }

    /// Append `device` at the end of the list.
    ///
    /// Returns the index it landed at, or `None` when a device with the same
    /// identity is already listed (the list is left untouched).
    pub fn push(&mut self, device: Device) -> Option<usize> {
        if self.contains(&device.id) {
            return None;
        }
        self.devices.push(device);
        Some(self.devices.len() - 1)
    }

    /// Remove the device with identity `id`, returning the index it had.
    pub fn remove(&mut self, id: &DeviceId) -> Option<usize> {
        let index = self.index_of(id)?;
        self.devices.remove(index);
        Some(index)
    }

    /// Replace the whole list with `devices`, keeping their order.
    ///
    /// Entries of another category are skipped and repeated identities keep
    /// their first occurrence.
    pub fn replace_all(&mut self, devices: Vec<Device>) {
        let mut seen = HashSet::with_capacity(devices.len());
        self.devices = devices
            .into_iter()
            .filter(|d| d.category == self.category && seen.insert(d.id.clone()))
            .collect();
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }

    /// Whether the list holds exactly `other`'s identities in `other`'s order.
    pub fn same_order_as(&self, other: &[Device]) -> bool {
        self.devices.len() == other.len()
            && self
                .devices
                .iter()
                .zip(other)
                .all(|(mine, theirs)| mine.id == theirs.id)
    }

    pub fn ids(&self) -> Vec<DeviceId> {
        self.devices.iter().map(|d| d.id.clone()).collect()
    }
}
