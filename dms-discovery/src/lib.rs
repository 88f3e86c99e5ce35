//! Media device discovery model
//!
//! This crate holds everything the explorer needs to know about discovered
//! UPnP media devices without speaking the discovery protocol itself:
//!
//! - the [`Device`] model and its stable [`DeviceId`]
//! - parsing of UPnP device descriptions into devices ([`device`])
//! - the [`DiscoverySource`] / [`DiscoveryListener`] seam consumers plug into
//! - [`ControlPoint`], the session tables the SSDP layer feeds
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use dms_discovery::{
//!     ControlPoint, Device, DeviceCategory, DeviceId, DiscoveryListener, DiscoverySource,
//!     SessionEpoch,
//! };
//!
//! struct Printer;
//!
//! impl DiscoveryListener for Printer {
//!     fn on_device_discovered(&self, epoch: SessionEpoch, device: Device) {
//!         println!("{}: found {}", epoch, device.friendly_name);
//!     }
//!
//!     fn on_device_lost(&self, epoch: SessionEpoch, category: DeviceCategory, id: DeviceId) {
//!         println!("{}: lost {} {}", epoch, category, id);
//!     }
//! }
//!
//! let control_point = ControlPoint::new();
//! control_point.add_listener(Arc::new(Printer));
//! control_point.announce(Device::new("uuid:nas-1", DeviceCategory::Server, "NAS"));
//! ```
//!
//! # From a description document
//!
//! ```
//! use dms_discovery::{device_from_description, DeviceCategory};
//!
//! let xml = r#"<root><device>
//!   <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
//!   <friendlyName>Living Room TV</friendlyName>
//!   <UDN>uuid:tv-1</UDN>
//! </device></root>"#;
//!
//! let device = device_from_description(xml, "http://192.168.1.50:49152/desc.xml").unwrap();
//! assert_eq!(device.category, DeviceCategory::Renderer);
//! ```

mod error;
mod model;
mod source;
pub mod control_point;
pub mod device;

pub use control_point::ControlPoint;
pub use device::{device_from_description, DeviceDescription};
pub use error::{DiscoveryError, Result};
pub use model::{
    Capabilities, Device, DeviceCategory, DeviceId, SessionEpoch, SessionEpochOrder,
};
pub use source::{DiscoveryListener, DiscoverySource, ListenerId};
