//! Core device types shared by the discovery layer and the controller.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;

/// Stable identity of a UPnP device.
///
/// Built from the device UDN. A `uuid:` prefix in any case is stripped and
/// the remainder lower-cased, so `UUID:ABC-1` and `abc-1` name the same
/// device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a new DeviceId, normalizing the format
    pub fn new(id: impl AsRef<str>) -> Self {
        let id = id.as_ref().trim();
        let normalized = match id.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("uuid:") => &id[5..],
            _ => id,
        };
        Self(normalized.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        DeviceId::new(s)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        DeviceId::new(s)
    }
}

/// The two kinds of device the controller keeps lists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    /// A media server exposing a ContentDirectory to browse
    Server,
    /// A media renderer content can be sent to
    Renderer,
}

impl DeviceCategory {
    /// Both categories, servers first.
    pub const ALL: [DeviceCategory; 2] = [DeviceCategory::Server, DeviceCategory::Renderer];
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCategory::Server => f.pad("server"),
            DeviceCategory::Renderer => f.pad("renderer"),
        }
    }
}

/// Generation counter for a discovery session.
///
/// Every restart of discovery moves to the next epoch; notifications tagged
/// with an older epoch belong to a session that no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionEpoch(u64);

impl SessionEpoch {
    /// Epoch of the first discovery session.
    pub const FIRST: SessionEpoch = SessionEpoch(1);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for SessionEpoch {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for SessionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// UPnP services a device advertises in its description.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub has_content_directory: bool,
    pub has_avtransport: bool,
    pub has_rendering_control: bool,
    pub has_connection_manager: bool,
}

/// A discovered media device.
///
/// Identity is the [`DeviceId`]; everything else is descriptive and may be
/// refreshed when the device re-announces itself. Two `Device` values are
/// equal when their ids are equal, whatever their attributes say.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub category: DeviceCategory,
    pub friendly_name: String,
    /// Description URL the device advertised
    pub location: String,
    pub ip_address: Option<IpAddr>,
    pub manufacturer: String,
    pub model_name: String,
    /// Full device type URN, e.g. `urn:schemas-upnp-org:device:MediaServer:1`
    pub device_type: String,
    pub capabilities: Capabilities,
}

impl Device {
    /// Minimal device with only identity, category and a name.
    ///
    /// Handy for hosts that learn about devices from something other than a
    /// UPnP description, and for tests.
    pub fn new(
        id: impl Into<DeviceId>,
        category: DeviceCategory,
        friendly_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            friendly_name: friendly_name.into(),
            location: String::new(),
            ip_address: None,
            manufacturer: String::new(),
            model_name: String::new(),
            device_type: String::new(),
            capabilities: Capabilities::default(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self.ip_address = crate::device::extract_ip_from_url(&self.location);
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Whether both values describe the same device.
    ///
    /// Same as `==`, spelled out for call sites that compare records.
    pub fn same_device(&self, other: &Device) -> bool {
        self.id == other.id
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Device {}

impl Hash for Device {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Where an event's epoch sits relative to the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEpochOrder {
    /// Belongs to a session that has been torn down
    Stale,
    /// Belongs to the current session
    Current,
    /// Belongs to a session started without this side being told
    Newer,
}

impl SessionEpoch {
    /// Classify `event` relative to `self`, the current epoch.
    pub fn classify(self, event: SessionEpoch) -> SessionEpochOrder {
        match event.cmp(&self) {
            Ordering::Less => SessionEpochOrder::Stale,
            Ordering::Equal => SessionEpochOrder::Current,
            Ordering::Greater => SessionEpochOrder::Newer,
        }
    }
}
