//! Reconciliation of discovery notifications into the device lists
//!
//! The engine is a plain single-threaded state machine: every operation
//! mutates the registries and selections and returns the events that
//! describe the mutation, in order. The update thread in
//! [`marshaller`](crate::marshaller) owns the only instance.
//!
//! After each arrival or loss the engine asks the source whether its own
//! list is still in step. Under [`ResyncPolicy::CountCheck`] that is a count
//! comparison; under [`ResyncPolicy::FullDiff`] the identity sequences are
//! compared. When the answer is no, the list is replaced wholesale from the
//! source and a [`ChangeDescriptor::Replaced`] is emitted instead of the
//! incremental descriptor.

use std::sync::Arc;

use dms_discovery::{
    Device, DeviceCategory, DeviceId, DiscoverySource, SessionEpoch, SessionEpochOrder,
};
use tracing::{debug, info, trace, warn};

use crate::config::{ControllerConfig, ResyncPolicy, SelectionPolicy};
use crate::error::{Result, StateError};
use crate::event::{ChangeDescriptor, ControllerEvent, SelectOutcome};
use crate::registry::DeviceRegistry;
use crate::selection::SelectionTracker;
use crate::snapshot::{Published, RegistrySnapshot};

/// Registry, selection and refreshing flag of one category
#[derive(Debug)]
struct CategoryState {
    registry: DeviceRegistry,
    selection: SelectionTracker,
    refreshing: bool,
}

impl CategoryState {
    fn new(category: DeviceCategory) -> Self {
        Self {
            registry: DeviceRegistry::new(category),
            selection: SelectionTracker::new(),
            refreshing: true,
        }
    }

    fn category(&self) -> DeviceCategory {
        self.registry.category()
    }

    fn registry_event(&self, change: ChangeDescriptor) -> ControllerEvent {
        ControllerEvent::Registry {
            category: self.category(),
            change,
        }
    }

    fn in_step(&self, source: &dyn DiscoverySource, policy: ResyncPolicy) -> bool {
        let category = self.category();
        match policy {
            ResyncPolicy::CountCheck => source.current_device_count(category) == self.registry.len(),
            ResyncPolicy::FullDiff => self
                .registry
                .same_order_as(&source.current_device_list(category)),
        }
    }

    /// Replace the list from the source and drop a selection that vanished.
    fn resync(&mut self, source: &dyn DiscoverySource, events: &mut Vec<ControllerEvent>) {
        let category = self.category();
        let before = self.registry.len();
        self.registry.replace_all(source.current_device_list(category));
        debug!(
            "Resynced {} list ({} -> {} devices)",
            category,
            before,
            self.registry.len()
        );
        events.push(self.registry_event(ChangeDescriptor::Replaced(
            self.registry.devices().to_vec(),
        )));

        let vanished = self
            .selection
            .current()
            .filter(|selected| !self.registry.contains(selected))
            .cloned();
        if let Some(selected) = vanished {
            self.clear_on_loss(&selected, events);
        }
    }

    fn clear_on_loss(&mut self, id: &DeviceId, events: &mut Vec<ControllerEvent>) {
        if self.selection.clear_on_loss(id) {
            info!("Selected {} {} is gone, selection cleared", self.category(), id);
            events.push(ControllerEvent::SelectionClearedDueToLoss {
                category: self.category(),
                device: id.clone(),
            });
        }
    }

    fn set_refreshing(&mut self, refreshing: bool, events: &mut Vec<ControllerEvent>) {
        if self.refreshing != refreshing {
            self.refreshing = refreshing;
            events.push(ControllerEvent::RefreshingChanged {
                category: self.category(),
                refreshing,
            });
        }
    }

    /// Forget every device and the selection.
    fn reset(&mut self, events: &mut Vec<ControllerEvent>) {
        let category = self.category();
        if !self.registry.is_empty() {
            self.registry.clear();
            events.push(self.registry_event(ChangeDescriptor::Replaced(Vec::new())));
        }
        if self.selection.clear().is_some() {
            events.push(ControllerEvent::SelectionChanged {
                category,
                device: None,
            });
        }
        self.set_refreshing(true, events);
    }

    fn snapshot(&self, epoch: SessionEpoch) -> RegistrySnapshot {
        RegistrySnapshot {
            category: self.category(),
            devices: Arc::from(self.registry.devices()),
            selected: self.selection.current().cloned(),
            refreshing: self.refreshing,
            epoch,
        }
    }
}

/// Applies discovery notifications and user requests to the device lists.
pub struct ReconciliationEngine {
    source: Arc<dyn DiscoverySource>,
    config: ControllerConfig,
    epoch: SessionEpoch,
    servers: CategoryState,
    renderers: CategoryState,
}

impl ReconciliationEngine {
    /// Create an engine with empty lists in the source's current session.
    pub fn new(source: Arc<dyn DiscoverySource>, config: ControllerConfig) -> Self {
        let epoch = source.session_epoch();
        Self {
            source,
            config,
            epoch,
            servers: CategoryState::new(DeviceCategory::Server),
            renderers: CategoryState::new(DeviceCategory::Renderer),
        }
    }

    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn registry(&self, category: DeviceCategory) -> &DeviceRegistry {
        &self.state(category).registry
    }

    pub fn selected(&self, category: DeviceCategory) -> Option<&DeviceId> {
        self.state(category).selection.current()
    }

    pub fn is_refreshing(&self, category: DeviceCategory) -> bool {
        self.state(category).refreshing
    }

    pub fn snapshot(&self, category: DeviceCategory) -> RegistrySnapshot {
        self.state(category).snapshot(self.epoch)
    }

    pub(crate) fn published(&self) -> Published {
        Published {
            servers: self.servers.snapshot(self.epoch),
            renderers: self.renderers.snapshot(self.epoch),
        }
    }

    /// Seed the lists with what the source already knows.
    ///
    /// Used once when the controller starts, so devices discovered before
    /// the listener was registered are not missed.
    pub fn prime(&mut self) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        self.epoch = self.source.session_epoch();

        let source = self.source.as_ref();
        for state in [&mut self.servers, &mut self.renderers] {
            let devices = source.current_device_list(state.category());
            if devices.is_empty() {
                continue;
            }
            state.registry.replace_all(devices);
            debug!(
                "Primed {} list with {} devices",
                state.category(),
                state.registry.len()
            );
            events.push(state.registry_event(ChangeDescriptor::Replaced(
                state.registry.devices().to_vec(),
            )));
            state.set_refreshing(false, &mut events);
        }
        events
    }

    /// Apply a device arrival reported in session `epoch`.
    pub fn on_discovered(&mut self, epoch: SessionEpoch, device: Device) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        if !self.admit(epoch, &mut events) {
            return events;
        }

        let policy = self.config.resync_policy;
        let source = self.source.as_ref();
        let state = match device.category {
            DeviceCategory::Server => &mut self.servers,
            DeviceCategory::Renderer => &mut self.renderers,
        };

        if state.registry.contains(&device.id) {
            debug!("Ignoring repeated discovery of {} {}", device.category, device.id);
            return events;
        }

        debug!(
            "Discovered {} {} ({})",
            device.category, device.id, device.friendly_name
        );
        let Some(index) = state.registry.push(device.clone()) else {
            return events;
        };
        if state.in_step(source, policy) {
            events.push(state.registry_event(ChangeDescriptor::Inserted { index, device }));
        } else {
            warn!("{} list drifted from discovery, resyncing", device.category);
            state.resync(source, &mut events);
        }
        if !state.registry.is_empty() {
            state.set_refreshing(false, &mut events);
        }
        events
    }

    /// Apply a device loss reported in session `epoch`.
    pub fn on_lost(
        &mut self,
        epoch: SessionEpoch,
        category: DeviceCategory,
        id: &DeviceId,
    ) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        if !self.admit(epoch, &mut events) {
            return events;
        }

        let policy = self.config.resync_policy;
        let source = self.source.as_ref();
        let state = match category {
            DeviceCategory::Server => &mut self.servers,
            DeviceCategory::Renderer => &mut self.renderers,
        };

        match state.registry.remove(id) {
            Some(index) => {
                debug!("Lost {} {} at index {}", category, id, index);
                if state.in_step(source, policy) {
                    events.push(state.registry_event(ChangeDescriptor::Removed { index }));
                } else {
                    warn!("{} list drifted from discovery, resyncing", category);
                    state.resync(source, &mut events);
                }
            }
            None => debug!("Ignoring loss of unlisted {} {}", category, id),
        }
        state.clear_on_loss(id, &mut events);
        events
    }

    /// Select `id`, subject to the configured [`SelectionPolicy`].
    pub fn select(
        &mut self,
        category: DeviceCategory,
        id: DeviceId,
    ) -> Result<(SelectOutcome, Vec<ControllerEvent>)> {
        let policy = self.config.selection_policy;
        let state = self.state_mut(category);

        if !state.registry.contains(&id) {
            match policy {
                SelectionPolicy::Reject => {
                    return Err(StateError::InvalidSelection { category, id });
                }
                SelectionPolicy::Tolerate => {
                    debug!("Selecting unlisted {} {}", category, id);
                }
            }
        }

        let outcome = state.selection.select(id.clone());
        let mut events = Vec::new();
        if outcome == SelectOutcome::NewlySelected {
            info!("Selected {} {}", category, id);
            events.push(ControllerEvent::SelectionChanged {
                category,
                device: Some(id),
            });
        }
        Ok((outcome, events))
    }

    /// Drop the selection of `category`, returning what was selected.
    pub fn clear_selection(
        &mut self,
        category: DeviceCategory,
    ) -> (Option<DeviceId>, Vec<ControllerEvent>) {
        let previous = self.state_mut(category).selection.clear();
        let mut events = Vec::new();
        if previous.is_some() {
            events.push(ControllerEvent::SelectionChanged {
                category,
                device: None,
            });
        }
        (previous, events)
    }

    /// Clear everything and start a new discovery session.
    pub fn restart(&mut self) -> (SessionEpoch, Vec<ControllerEvent>) {
        let mut events = Vec::new();
        self.reset(&mut events);
        let epoch = self.source.restart();
        if epoch <= self.epoch {
            warn!(
                "Discovery restart returned {} which does not follow {}",
                epoch, self.epoch
            );
        }
        self.epoch = epoch;
        info!("Restarted discovery, now in session {}", epoch);
        (epoch, events)
    }

    /// Rebuild every list from the source on demand.
    ///
    /// Adopts the source's current session, so a restart the source went
    /// through on its own is picked up without waiting for a notification.
    /// Selections that are no longer listed are cleared as losses; the
    /// refreshing flag follows whether the list ended up empty.
    pub fn resync(&mut self) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        let epoch = self.source.session_epoch();
        if epoch != self.epoch {
            info!("Resync moves from session {} to {}", self.epoch, epoch);
            self.epoch = epoch;
        }

        let source = self.source.as_ref();
        for state in [&mut self.servers, &mut self.renderers] {
            state.resync(source, &mut events);
            let empty = state.registry.is_empty();
            state.set_refreshing(empty, &mut events);
        }
        events
    }

    /// Decide whether an event of session `epoch` may be applied.
    fn admit(&mut self, epoch: SessionEpoch, events: &mut Vec<ControllerEvent>) -> bool {
        match self.epoch.classify(epoch) {
            SessionEpochOrder::Current => true,
            SessionEpochOrder::Stale => {
                trace!("Discarding event from session {} (now {})", epoch, self.epoch);
                false
            }
            SessionEpochOrder::Newer => {
                info!(
                    "Discovery moved from session {} to {} on its own, clearing lists",
                    self.epoch, epoch
                );
                self.reset(events);
                self.epoch = epoch;
                true
            }
        }
    }

    fn reset(&mut self, events: &mut Vec<ControllerEvent>) {
        self.servers.reset(events);
        self.renderers.reset(events);
    }

    fn state(&self, category: DeviceCategory) -> &CategoryState {
        match category {
            DeviceCategory::Server => &self.servers,
            DeviceCategory::Renderer => &self.renderers,
        }
    }

    fn state_mut(&mut self, category: DeviceCategory) -> &mut CategoryState {
        match category {
            DeviceCategory::Server => &mut self.servers,
            DeviceCategory::Renderer => &mut self.renderers,
        }
    }
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("epoch", &self.epoch)
            .field("config", &self.config)
            .field("servers", &self.servers)
            .field("renderers", &self.renderers)
            .finish()
    }
}
