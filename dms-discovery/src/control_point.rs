//! In-process discovery session state.
//!
//! [`ControlPoint`] is what the SSDP layer feeds: it keeps the authoritative
//! per-category device tables for the running session, numbers sessions, and
//! fans presence changes out to registered [`DiscoveryListener`]s.
//!
//! ```
//! use std::sync::Arc;
//! use dms_discovery::{ControlPoint, Device, DeviceCategory, DiscoverySource};
//!
//! let control_point = ControlPoint::new();
//! control_point.announce(Device::new("uuid:nas", DeviceCategory::Server, "NAS"));
//!
//! assert_eq!(control_point.current_device_count(DeviceCategory::Server), 1);
//! assert_eq!(control_point.current_device_count(DeviceCategory::Renderer), 0);
//! ```

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::model::{Device, DeviceCategory, DeviceId, SessionEpoch};
use crate::source::{DiscoveryListener, DiscoverySource, ListenerId};

#[derive(Default)]
struct Tables {
    epoch: SessionEpoch,
    servers: Vec<Device>,
    renderers: Vec<Device>,
}

impl Tables {
    fn table(&self, category: DeviceCategory) -> &Vec<Device> {
        match category {
            DeviceCategory::Server => &self.servers,
            DeviceCategory::Renderer => &self.renderers,
        }
    }

    fn table_mut(&mut self, category: DeviceCategory) -> &mut Vec<Device> {
        match category {
            DeviceCategory::Server => &mut self.servers,
            DeviceCategory::Renderer => &mut self.renderers,
        }
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Arc<dyn DiscoveryListener>)>,
}

/// Authoritative device tables for the running discovery session.
///
/// Cheap to clone; clones share the same tables.
#[derive(Clone, Default)]
pub struct ControlPoint {
    tables: Arc<RwLock<Tables>>,
    listeners: Arc<RwLock<Listeners>>,
    /// Serializes "mutate table, then notify" so listeners see changes in
    /// the order they were applied.
    delivery: Arc<Mutex<()>>,
}

impl ControlPoint {
    /// Create an empty control point in the first session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a device advertisement.
    ///
    /// A device not yet known in this session is appended and listeners are
    /// told about it; returns `true`. A device already known has its record
    /// replaced wholesale (attributes may have changed) without a
    /// notification; returns `false`.
    pub fn announce(&self, device: Device) -> bool {
        let _delivery = self.delivery.lock();
        let epoch = {
            let mut tables = self.tables.write();
            let epoch = tables.epoch;
            let table = tables.table_mut(device.category);
            if let Some(existing) = table.iter_mut().find(|d| d.id == device.id) {
                *existing = device;
                return false;
            }
            table.push(device.clone());
            epoch
        };

        debug!(
            "Device {} ({}) discovered as {} in session {}",
            device.id, device.friendly_name, device.category, epoch
        );
        for listener in self.snapshot_listeners() {
            listener.on_device_discovered(epoch, device.clone());
        }
        true
    }

    /// Record a device leaving the network.
    ///
    /// Returns `false` and stays silent if the device was not known.
    pub fn byebye(&self, category: DeviceCategory, id: &DeviceId) -> bool {
        let _delivery = self.delivery.lock();
        let epoch = {
            let mut tables = self.tables.write();
            let epoch = tables.epoch;
            let table = tables.table_mut(category);
            let Some(position) = table.iter().position(|d| &d.id == id) else {
                return false;
            };
            table.remove(position);
            epoch
        };

        debug!("Device {} ({}) lost in session {}", id, category, epoch);
        for listener in self.snapshot_listeners() {
            listener.on_device_lost(epoch, category, id.clone());
        }
        true
    }

    /// Look up a device known in the current session.
    pub fn device(&self, category: DeviceCategory, id: &DeviceId) -> Option<Device> {
        self.tables
            .read()
            .table(category)
            .iter()
            .find(|d| &d.id == id)
            .cloned()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().entries.len()
    }

    fn snapshot_listeners(&self) -> Vec<Arc<dyn DiscoveryListener>> {
        self.listeners
            .read()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

impl DiscoverySource for ControlPoint {
    fn current_device_count(&self, category: DeviceCategory) -> usize {
        self.tables.read().table(category).len()
    }

    fn current_device_list(&self, category: DeviceCategory) -> Vec<Device> {
        self.tables.read().table(category).clone()
    }

    fn session_epoch(&self) -> SessionEpoch {
        self.tables.read().epoch
    }

    fn restart(&self) -> SessionEpoch {
        let _delivery = self.delivery.lock();
        let mut tables = self.tables.write();
        tables.servers.clear();
        tables.renderers.clear();
        tables.epoch = tables.epoch.next();
        info!("Discovery restarted, now in session {}", tables.epoch);
        tables.epoch
    }

    fn add_listener(&self, listener: Arc<dyn DiscoveryListener>) -> ListenerId {
        let mut listeners = self.listeners.write();
        listeners.next_id += 1;
        let id = ListenerId::new(listeners.next_id);
        listeners.entries.push((id, listener));
        debug!("Registered discovery {}", id);
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry, _)| *entry != id);
        listeners.entries.len() != before
    }
}

impl std::fmt::Debug for ControlPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.read();
        f.debug_struct("ControlPoint")
            .field("epoch", &tables.epoch)
            .field("servers", &tables.servers.len())
            .field("renderers", &tables.renderers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl DiscoveryListener for Recorder {
        fn on_device_discovered(&self, epoch: SessionEpoch, device: Device) {
            self.seen.lock().push(format!("+{}@{}", device.id, epoch.value()));
        }

        fn on_device_lost(&self, epoch: SessionEpoch, _category: DeviceCategory, id: DeviceId) {
            self.seen.lock().push(format!("-{}@{}", id, epoch.value()));
        }
    }

    fn server(id: &str) -> Device {
        Device::new(id, DeviceCategory::Server, format!("Server {}", id))
    }

    #[test]
    fn test_announce_notifies_once_per_session() {
        let cp = ControlPoint::new();
        let recorder = Arc::new(Recorder::default());
        cp.add_listener(recorder.clone());

        assert!(cp.announce(server("a")));
        assert!(!cp.announce(server("a")));

        assert_eq!(cp.current_device_count(DeviceCategory::Server), 1);
        assert_eq!(*recorder.seen.lock(), vec!["+a@1".to_string()]);
    }

    #[test]
    fn test_reannounce_replaces_record() {
        let cp = ControlPoint::new();
        cp.announce(server("a"));

        let mut renamed = server("a");
        renamed.friendly_name = "Renamed".to_string();
        cp.announce(renamed);

        let stored = cp.device(DeviceCategory::Server, &DeviceId::new("a")).unwrap();
        assert_eq!(stored.friendly_name, "Renamed");
    }

    #[test]
    fn test_byebye_unknown_is_silent() {
        let cp = ControlPoint::new();
        let recorder = Arc::new(Recorder::default());
        cp.add_listener(recorder.clone());

        assert!(!cp.byebye(DeviceCategory::Server, &DeviceId::new("ghost")));
        assert!(recorder.seen.lock().is_empty());
    }

    #[test]
    fn test_restart_clears_and_bumps_epoch() {
        let cp = ControlPoint::new();
        let recorder = Arc::new(Recorder::default());
        cp.add_listener(recorder.clone());

        cp.announce(server("a"));
        let epoch = cp.restart();
        assert_eq!(epoch, SessionEpoch::new(2));
        assert_eq!(cp.current_device_count(DeviceCategory::Server), 0);

        cp.announce(server("a"));
        cp.byebye(DeviceCategory::Server, &DeviceId::new("a"));
        assert_eq!(
            *recorder.seen.lock(),
            vec!["+a@1".to_string(), "+a@2".to_string(), "-a@2".to_string()]
        );
    }

    #[test]
    fn test_remove_listener() {
        let cp = ControlPoint::new();
        let recorder = Arc::new(Recorder::default());
        let id = cp.add_listener(recorder.clone());
        assert_eq!(cp.listener_count(), 1);

        assert!(cp.remove_listener(id));
        assert!(!cp.remove_listener(id));

        cp.announce(server("a"));
        assert!(recorder.seen.lock().is_empty());
    }

    #[test]
    fn test_categories_are_separate() {
        let cp = ControlPoint::new();
        cp.announce(server("a"));
        cp.announce(Device::new("tv", DeviceCategory::Renderer, "TV"));

        assert_eq!(cp.current_device_list(DeviceCategory::Server), vec![server("a")]);
        assert_eq!(cp.current_device_count(DeviceCategory::Renderer), 1);
    }
}
