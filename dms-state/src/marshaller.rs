//! Hand-off from discovery threads to the update thread
//!
//! Discovery callbacks arrive on whatever thread the discovery subsystem
//! uses. [`EventMarshaller`] turns each callback into a [`Command`] on a
//! single FIFO channel; the update thread spawned by
//! [`spawn_update_worker`] is the only consumer and the only code that
//! touches the [`ReconciliationEngine`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use dms_discovery::{Device, DeviceCategory, DeviceId, DiscoveryListener, SessionEpoch};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::engine::ReconciliationEngine;
use crate::error::Result;
use crate::event::{ControllerEvent, SelectOutcome};
use crate::snapshot::Published;

/// Work item for the update thread
pub(crate) enum Command {
    Discovered {
        epoch: SessionEpoch,
        device: Device,
    },
    Lost {
        epoch: SessionEpoch,
        category: DeviceCategory,
        id: DeviceId,
    },
    Select {
        category: DeviceCategory,
        id: DeviceId,
        reply: mpsc::Sender<Result<SelectOutcome>>,
    },
    ClearSelection {
        category: DeviceCategory,
        reply: mpsc::Sender<Option<DeviceId>>,
    },
    Restart {
        reply: mpsc::Sender<SessionEpoch>,
    },
    Resync {
        reply: mpsc::Sender<SessionEpoch>,
    },
    Shutdown,
}

/// [`DiscoveryListener`] that forwards every notification to the update
/// thread.
///
/// Never blocks and never fails. Once the update thread has stopped,
/// notifications are dropped.
#[derive(Clone)]
pub struct EventMarshaller {
    command_tx: mpsc::Sender<Command>,
}

impl EventMarshaller {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>) -> Self {
        Self { command_tx }
    }

    /// Queue a device arrival for the update thread.
    pub fn notify_discovered(&self, epoch: SessionEpoch, device: Device) {
        let id = device.id.clone();
        if self
            .command_tx
            .send(Command::Discovered { epoch, device })
            .is_err()
        {
            debug!("Update thread stopped, dropping discovery of {}", id);
        }
    }

    /// Queue a device loss for the update thread.
    pub fn notify_lost(&self, epoch: SessionEpoch, category: DeviceCategory, id: DeviceId) {
        let command = Command::Lost {
            epoch,
            category,
            id: id.clone(),
        };
        if self.command_tx.send(command).is_err() {
            debug!("Update thread stopped, dropping loss of {}", id);
        }
    }
}

impl DiscoveryListener for EventMarshaller {
    fn on_device_discovered(&self, epoch: SessionEpoch, device: Device) {
        self.notify_discovered(epoch, device);
    }

    fn on_device_lost(&self, epoch: SessionEpoch, category: DeviceCategory, id: DeviceId) {
        self.notify_lost(epoch, category, id);
    }
}

impl std::fmt::Debug for EventMarshaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventMarshaller").finish_non_exhaustive()
    }
}

/// Whether anybody has asked for change events
///
/// Nothing is queued until [`EventWatch::watch`] has been called, so a
/// consumer that only reads snapshots does not accumulate events.
#[derive(Clone, Default)]
pub(crate) struct EventWatch(Arc<AtomicBool>);

impl EventWatch {
    /// Start queueing events.
    ///
    /// Takes the publication slot for reading so that every step is either
    /// already in the published snapshots or will be queued, never both.
    pub(crate) fn watch(&self, published: &RwLock<Published>) {
        let _slot = published.read();
        if !self.0.swap(true, Ordering::AcqRel) {
            debug!("Change events are now queued");
        }
    }

    pub(crate) fn is_watched(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Where the update thread sends change events
pub(crate) struct EventSink {
    tx: mpsc::Sender<ControllerEvent>,
    watch: EventWatch,
}

impl EventSink {
    pub(crate) fn new(tx: mpsc::Sender<ControllerEvent>, watch: EventWatch) -> Self {
        Self { tx, watch }
    }
}

/// Spawns the update thread
///
/// The thread:
/// - Applies commands in arrival order until `Shutdown` or until every
///   sender is gone
/// - Publishes fresh snapshots after each step, then forwards the step's
///   events to the consumer
/// - Answers request commands only after publishing, so a caller that gets
///   a reply also sees the matching snapshot
pub(crate) fn spawn_update_worker(
    mut engine: ReconciliationEngine,
    command_rx: mpsc::Receiver<Command>,
    published: Arc<RwLock<Published>>,
    sink: EventSink,
    thread_name: String,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new().name(thread_name).spawn(move || {
        info!("Update thread started in session {}", engine.epoch());

        for command in command_rx.iter() {
            match command {
                Command::Discovered { epoch, device } => {
                    let events = engine.on_discovered(epoch, device);
                    publish(&engine, &published, &sink, events);
                }
                Command::Lost {
                    epoch,
                    category,
                    id,
                } => {
                    let events = engine.on_lost(epoch, category, &id);
                    publish(&engine, &published, &sink, events);
                }
                Command::Select {
                    category,
                    id,
                    reply,
                } => {
                    let (result, events) = match engine.select(category, id) {
                        Ok((outcome, events)) => (Ok(outcome), events),
                        Err(err) => (Err(err), Vec::new()),
                    };
                    publish(&engine, &published, &sink, events);
                    let _ = reply.send(result);
                }
                Command::ClearSelection { category, reply } => {
                    let (previous, events) = engine.clear_selection(category);
                    publish(&engine, &published, &sink, events);
                    let _ = reply.send(previous);
                }
                Command::Restart { reply } => {
                    let (epoch, events) = engine.restart();
                    publish(&engine, &published, &sink, events);
                    let _ = reply.send(epoch);
                }
                Command::Resync { reply } => {
                    let events = engine.resync();
                    publish(&engine, &published, &sink, events);
                    let _ = reply.send(engine.epoch());
                }
                Command::Shutdown => break,
            }
        }

        info!("Update thread stopped");
    })?;
    Ok(handle)
}

/// Swap in new snapshots, then hand the step's events to the consumer if
/// one is watching.
fn publish(
    engine: &ReconciliationEngine,
    published: &RwLock<Published>,
    sink: &EventSink,
    events: Vec<ControllerEvent>,
) {
    if events.is_empty() && published.read().servers.epoch == engine.epoch() {
        return;
    }

    let watched = {
        let mut slot = published.write();
        *slot = engine.published();
        sink.watch.is_watched()
    };
    if !watched {
        return;
    }

    for event in events {
        tracing::trace!("Emitting {:?}", event);
        if sink.tx.send(event).is_err() {
            debug!("Change receiver dropped, discarding remaining events");
            break;
        }
    }
}
