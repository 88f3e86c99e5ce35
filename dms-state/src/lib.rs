//! DMS Explorer state
//!
//! Keeps live, ordered lists of the media servers and renderers a discovery
//! source reports, plus one selected device per list.
//!
//! # Architecture
//!
//! ```text
//! discovery threads → EventMarshaller → update thread → ReconciliationEngine
//!                                          │ publishes         │ emits
//!                                          ▼                   ▼
//!                                   RegistrySnapshot    ControllerEvent → ChangeIterator
//! ```
//!
//! Every mutation happens on the update thread. Readers get immutable
//! snapshots; consumers that redraw incrementally follow the
//! [`ChangeDescriptor`]s in the event stream, which is only queued once
//! [`Controller::iter`] has been called.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use dms_discovery::{ControlPoint, Device, DeviceCategory};
//! use dms_state::{ChangeDescriptor, Controller, ControllerEvent};
//!
//! let control_point = Arc::new(ControlPoint::new());
//! let controller = Controller::new(control_point.clone()).unwrap();
//! let changes = controller.iter();
//!
//! control_point.announce(Device::new("uuid:tv-1", DeviceCategory::Renderer, "TV"));
//!
//! let event = changes.recv_timeout(Duration::from_secs(1)).unwrap();
//! assert!(matches!(
//!     event,
//!     ControllerEvent::Registry { change: ChangeDescriptor::Inserted { index: 0, .. }, .. }
//! ));
//!
//! controller.select(DeviceCategory::Renderer, "uuid:tv-1").unwrap();
//! assert_eq!(controller.snapshot(DeviceCategory::Renderer).selected_index(), Some(0));
//! ```

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod event;
pub mod iter;
pub mod logging;
pub mod marshaller;
pub mod registry;
pub mod selection;
pub mod snapshot;

pub use config::{ControllerConfig, ResyncPolicy, SelectionPolicy};
pub use controller::{Controller, ControllerBuilder};
pub use engine::ReconciliationEngine;
pub use error::{Result, StateError};
pub use event::{ChangeDescriptor, ControllerEvent, SelectOutcome};
pub use iter::{ChangeIterator, TimeoutIter, TryIter};
pub use marshaller::EventMarshaller;
pub use registry::DeviceRegistry;
pub use selection::SelectionTracker;
pub use snapshot::RegistrySnapshot;

/// Everything a presentation layer usually needs
pub mod prelude {
    pub use crate::{
        ChangeDescriptor, Controller, ControllerEvent, RegistrySnapshot, SelectOutcome,
        StateError,
    };
    pub use dms_discovery::{Device, DeviceCategory, DeviceId, SessionEpoch};
}
