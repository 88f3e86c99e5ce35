//! Test helpers: a discovery source the test drives by hand

// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

use std::sync::Arc;

use dms_discovery::{
    Device, DeviceCategory, DeviceId, DiscoveryListener, DiscoverySource, ListenerId,
    SessionEpoch,
};
use parking_lot::Mutex;

/// Discovery source whose tables only change when the test says so.
///
/// Changing the tables does not notify anyone, which is how tests simulate
/// notifications that never arrived.
#[derive(Default)]
pub struct ScriptedSource {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    epoch: u64,
    servers: Vec<Device>,
    renderers: Vec<Device>,
    restarts: usize,
}

impl Inner {
    fn table_mut(&mut self, category: DeviceCategory) -> &mut Vec<Device> {
        match category {
            DeviceCategory::Server => &mut self.servers,
            DeviceCategory::Renderer => &mut self.renderers,
        }
    }
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                epoch: 1,
                ..Default::default()
            }),
        })
    }

    /// Replace the table for `category` with devices named by `ids`.
    pub fn set(&self, category: DeviceCategory, ids: &[&str]) {
        let devices = ids.iter().map(|id| device(category, id)).collect();
        *self.inner.lock().table_mut(category) = devices;
    }

    /// Append `device` unless its identity is already listed.
    pub fn add(&self, device: Device) -> bool {
        let mut inner = self.inner.lock();
        let table = inner.table_mut(device.category);
        if table.iter().any(|d| d.id == device.id) {
            return false;
        }
        table.push(device);
        true
    }

    pub fn remove(&self, category: DeviceCategory, id: &DeviceId) -> bool {
        let mut inner = self.inner.lock();
        let table = inner.table_mut(category);
        let before = table.len();
        table.retain(|d| &d.id != id);
        table.len() != before
    }

    pub fn ids(&self, category: DeviceCategory) -> Vec<DeviceId> {
        self.current_device_list(category)
            .into_iter()
            .map(|d| d.id)
            .collect()
    }

    pub fn restarts(&self) -> usize {
        self.inner.lock().restarts
    }
}

impl DiscoverySource for ScriptedSource {
    fn current_device_count(&self, category: DeviceCategory) -> usize {
        self.current_device_list(category).len()
    }

    fn current_device_list(&self, category: DeviceCategory) -> Vec<Device> {
        let inner = self.inner.lock();
        match category {
            DeviceCategory::Server => inner.servers.clone(),
            DeviceCategory::Renderer => inner.renderers.clone(),
        }
    }

    fn session_epoch(&self) -> SessionEpoch {
        SessionEpoch::new(self.inner.lock().epoch)
    }

    fn restart(&self) -> SessionEpoch {
        let mut inner = self.inner.lock();
        inner.servers.clear();
        inner.renderers.clear();
        inner.epoch += 1;
        inner.restarts += 1;
        SessionEpoch::new(inner.epoch)
    }

    fn add_listener(&self, _listener: Arc<dyn DiscoveryListener>) -> ListenerId {
        ListenerId::new(1)
    }

    fn remove_listener(&self, _id: ListenerId) -> bool {
        true
    }
}

/// Device named after its id
pub fn device(category: DeviceCategory, id: &str) -> Device {
    Device::new(id, category, id.to_uppercase())
}

pub fn ids(names: &[&str]) -> Vec<DeviceId> {
    names.iter().map(DeviceId::new).collect()
}
