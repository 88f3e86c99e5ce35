//! Controller - main entry point for dms-state
//!
//! Owns the update thread and gives the presentation layer synchronous
//! access to device lists, selection and restart.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dms_discovery::{ControlPoint, DeviceCategory};
//! use dms_state::Controller;
//!
//! let control_point = Arc::new(ControlPoint::new());
//! let controller = Controller::new(control_point.clone())?;
//!
//! for event in controller.iter() {
//!     let servers = controller.snapshot(DeviceCategory::Server);
//!     println!("{:?}: {} servers", event, servers.len());
//! }
//! ```

use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use dms_discovery::{
    DeviceCategory, DeviceId, DiscoveryListener, DiscoverySource, ListenerId, SessionEpoch,
};
use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::{ControllerConfig, ResyncPolicy, SelectionPolicy};
use crate::engine::ReconciliationEngine;
use crate::error::{Result, StateError};
use crate::event::{ControllerEvent, SelectOutcome};
use crate::iter::ChangeIterator;
use crate::marshaller::{spawn_update_worker, Command, EventMarshaller, EventSink, EventWatch};
use crate::snapshot::{Published, RegistrySnapshot};

/// Live device lists and selections fed by a discovery source
///
/// Reads come from snapshots published by the update thread and never
/// block on it. Requests (`select`, `clear_selection`, `restart`,
/// `resync`) are applied on the update thread; they return once the
/// matching snapshot is visible.
pub struct Controller {
    source: Arc<dyn DiscoverySource>,
    config: ControllerConfig,
    marshaller: EventMarshaller,
    command_tx: mpsc::Sender<Command>,
    listener_id: ListenerId,
    published: Arc<RwLock<Published>>,
    watch: EventWatch,
    event_rx: Arc<Mutex<mpsc::Receiver<ControllerEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    /// Create a controller with default configuration
    pub fn new(source: Arc<dyn DiscoverySource>) -> Result<Self> {
        Self::builder().build(source)
    }

    /// Create a builder for configuring the controller
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::default()
    }

    /// Blocking iterator over change events
    ///
    /// Events are queued from the first call on. Everything before that is
    /// already reflected in [`Controller::snapshot`], so a consumer reads
    /// the snapshot after subscribing and applies events on top of it.
    pub fn iter(&self) -> ChangeIterator {
        self.watch.watch(&self.published);
        ChangeIterator::new(Arc::clone(&self.event_rx))
    }

    /// Current list, selection and refreshing state of `category`
    pub fn snapshot(&self, category: DeviceCategory) -> RegistrySnapshot {
        self.published.read().get(category).clone()
    }

    /// Whether any device of `category` is listed
    ///
    /// Lets the presentation layer hide actions that need a renderer when
    /// none is around.
    pub fn has_devices(&self, category: DeviceCategory) -> bool {
        !self.published.read().get(category).is_empty()
    }

    /// Whether discovery is still waiting for its first `category` device
    pub fn is_refreshing(&self, category: DeviceCategory) -> bool {
        self.published.read().get(category).refreshing
    }

    /// The selected device of `category`, if any
    pub fn selected(&self, category: DeviceCategory) -> Option<DeviceId> {
        self.published.read().get(category).selected.clone()
    }

    /// Session the published lists belong to
    pub fn epoch(&self) -> SessionEpoch {
        self.published.read().servers.epoch
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// The listener registered with the discovery source
    ///
    /// Notifications passed to it are handled exactly like those from the
    /// source, so they must describe the source's own sessions and lists.
    /// Meant for tests and for hosts that relay the source's callbacks.
    pub fn listener(&self) -> Arc<dyn DiscoveryListener> {
        Arc::new(self.marshaller.clone())
    }

    /// Select `id` in `category`
    ///
    /// Selecting the current selection again succeeds with
    /// [`SelectOutcome::AlreadySelected`] and emits nothing.
    pub fn select(&self, category: DeviceCategory, id: impl Into<DeviceId>) -> Result<SelectOutcome> {
        let id = id.into();
        self.request(|reply| Command::Select {
            category,
            id,
            reply,
        })?
    }

    /// Clear the selection of `category`, returning what was selected
    pub fn clear_selection(&self, category: DeviceCategory) -> Result<Option<DeviceId>> {
        self.request(|reply| Command::ClearSelection { category, reply })
    }

    /// Clear every list and selection and restart discovery
    ///
    /// Returns the new session epoch. Notifications from earlier sessions
    /// that are still in flight are discarded.
    pub fn restart(&self) -> Result<SessionEpoch> {
        self.request(|reply| Command::Restart { reply })
    }

    /// Rebuild every list from the discovery source
    ///
    /// Picks up a session the source moved to on its own, and clears
    /// selections whose devices are gone. Returns the session the lists now
    /// belong to.
    pub fn resync(&self) -> Result<SessionEpoch> {
        self.request(|reply| Command::Resync { reply })
    }

    /// Whether the update thread is still running
    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Stop the update thread and unregister from the discovery source
    ///
    /// Events already produced stay readable through [`Controller::iter`].
    pub fn shutdown(&self) -> Result<()> {
        let worker = self
            .worker
            .lock()
            .take()
            .ok_or(StateError::AlreadyShutdown)?;

        self.source.remove_listener(self.listener_id);
        let _ = self.command_tx.send(Command::Shutdown);
        if worker.join().is_err() {
            warn!("Update thread panicked");
        }

        info!("Controller shut down");
        Ok(())
    }

    fn request<T>(&self, command: impl FnOnce(mpsc::Sender<T>) -> Command) -> Result<T> {
        if !self.is_running() {
            return Err(StateError::AlreadyShutdown);
        }

        let (reply_tx, reply_rx) = mpsc::channel();
        self.command_tx
            .send(command(reply_tx))
            .map_err(|_| StateError::ChannelClosed)?;
        reply_rx.recv().map_err(|_| StateError::ChannelClosed)
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.shutdown();
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("config", &self.config)
            .field("listener_id", &self.listener_id)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ControllerBuilder
// ============================================================================

/// Builder for [`Controller`]
#[derive(Debug, Clone, Default)]
pub struct ControllerBuilder {
    config: ControllerConfig,
}

impl ControllerBuilder {
    /// Start from an existing configuration
    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set how drift between the lists and the source is detected
    pub fn resync_policy(mut self, policy: ResyncPolicy) -> Self {
        self.config.resync_policy = policy;
        self
    }

    /// Set what selecting an unlisted device does
    pub fn selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.config.selection_policy = policy;
        self
    }

    /// Set the name of the update thread
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Build the controller and start listening to `source`
    ///
    /// The lists are seeded from what `source` already knows before this
    /// returns.
    pub fn build(self, source: Arc<dyn DiscoverySource>) -> Result<Controller> {
        let config = self.config;
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        // Register first: anything announced from here on is queued, and
        // whatever the seed already covers is ignored as a repeat.
        let marshaller = EventMarshaller::new(command_tx.clone());
        let listener_id = source.add_listener(Arc::new(marshaller.clone()));

        // Nobody is watching yet; the seed is visible through the snapshots
        let mut engine = ReconciliationEngine::new(Arc::clone(&source), config.clone());
        engine.prime();
        let published = Arc::new(RwLock::new(engine.published()));
        let watch = EventWatch::default();

        let worker = match spawn_update_worker(
            engine,
            command_rx,
            Arc::clone(&published),
            EventSink::new(event_tx, watch.clone()),
            config.thread_name.clone(),
        ) {
            Ok(worker) => worker,
            Err(err) => {
                source.remove_listener(listener_id);
                return Err(err);
            }
        };

        info!(
            "Controller started ({:?}, {:?})",
            config.resync_policy, config.selection_policy
        );
        Ok(Controller {
            source,
            config,
            marshaller,
            command_tx,
            listener_id,
            published,
            watch,
            event_rx: Arc::new(Mutex::new(event_rx)),
            worker: Mutex::new(Some(worker)),
        })
    }
}
