//! Device description parsing and classification.
//!
//! This module turns a UPnP device description document into a [`Device`],
//! deciding whether it is a media server or a media renderer. Fetching the
//! document is left to the protocol layer.

use crate::error::{DiscoveryError, Result};
use crate::model::{Capabilities, Device, DeviceCategory, DeviceId};
use serde::Deserialize;
use std::net::IpAddr;

const CONTENT_DIRECTORY: &str = "ContentDirectory";
const AV_TRANSPORT: &str = "AVTransport";
const RENDERING_CONTROL: &str = "RenderingControl";
const CONNECTION_MANAGER: &str = "ConnectionManager";

/// UPnP device description root element.
#[derive(Debug, Deserialize)]
pub struct Root {
    pub device: DeviceDescription,
}

/// Device description parsed from XML.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescription {
    pub device_type: String,
    pub friendly_name: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(rename = "UDN")]
    pub udn: String,
    #[serde(default)]
    pub service_list: Option<ServiceList>,
}

/// `<serviceList>` element of a device description.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceList {
    #[serde(rename = "service", default)]
    pub services: Vec<ServiceDescription>,
}

/// One `<service>` entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescription {
    pub service_type: String,
    #[serde(default)]
    pub service_id: String,
}

impl DeviceDescription {
    /// Parse device description from XML.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::ParseError` if the XML is malformed or missing required fields.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root: Root = quick_xml::de::from_str(xml)
            .map_err(|e| DiscoveryError::ParseError(format!("Failed to parse device XML: {}", e)))?;

        Ok(root.device)
    }

    /// Services advertised by the description, empty when there is no service list.
    pub fn services(&self) -> &[ServiceDescription] {
        self.service_list
            .as_ref()
            .map(|list| list.services.as_slice())
            .unwrap_or(&[])
    }

    fn has_service(&self, name: &str) -> bool {
        self.services()
            .iter()
            .any(|service| service_type_name(&service.service_type) == Some(name))
    }

    /// Capability flags derived from the service list.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            has_content_directory: self.has_service(CONTENT_DIRECTORY),
            has_avtransport: self.has_service(AV_TRANSPORT),
            has_rendering_control: self.has_service(RENDERING_CONTROL),
            has_connection_manager: self.has_service(CONNECTION_MANAGER),
        }
    }

    /// Decide which list this device belongs to.
    ///
    /// The device type wins; a generic device type falls back to the
    /// services it offers. Returns `None` for anything that is neither.
    pub fn category(&self) -> Option<DeviceCategory> {
        match device_type_name(&self.device_type) {
            Some("MediaServer") => return Some(DeviceCategory::Server),
            Some("MediaRenderer") => return Some(DeviceCategory::Renderer),
            _ => {}
        }
        if self.has_service(CONTENT_DIRECTORY) {
            Some(DeviceCategory::Server)
        } else if self.has_service(AV_TRANSPORT) {
            Some(DeviceCategory::Renderer)
        } else {
            None
        }
    }

    /// Convert the description into a [`Device`].
    ///
    /// # Arguments
    ///
    /// * `location` - Description URL the device advertised
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::InvalidDevice` when the device is neither a
    /// media server nor a media renderer, or has an empty UDN.
    pub fn to_device(&self, location: &str) -> Result<Device> {
        if self.udn.trim().is_empty() {
            return Err(DiscoveryError::InvalidDevice(format!(
                "{} has no UDN",
                self.friendly_name
            )));
        }
        let category = self.category().ok_or_else(|| {
            DiscoveryError::InvalidDevice(format!(
                "{} ({}) is not a media server or renderer",
                self.friendly_name, self.device_type
            ))
        })?;

        Ok(Device {
            id: DeviceId::new(&self.udn),
            category,
            friendly_name: self.friendly_name.clone(),
            location: location.to_string(),
            ip_address: extract_ip_from_url(location),
            manufacturer: self.manufacturer.clone(),
            model_name: self.model_name.clone(),
            device_type: self.device_type.clone(),
            capabilities: self.capabilities(),
        })
    }
}

/// Parse a description document and build the device in one go.
pub fn device_from_description(xml: &str, location: &str) -> Result<Device> {
    DeviceDescription::from_xml(xml)?.to_device(location)
}

/// `urn:schemas-upnp-org:device:MediaServer:1` -> `MediaServer`
fn device_type_name(urn: &str) -> Option<&str> {
    urn_type_name(urn, "device")
}

/// `urn:schemas-upnp-org:service:AVTransport:1` -> `AVTransport`
fn service_type_name(urn: &str) -> Option<&str> {
    urn_type_name(urn, "service")
}

fn urn_type_name<'a>(urn: &'a str, kind: &str) -> Option<&'a str> {
    let mut parts = urn.split(':');
    let _urn = parts.next()?;
    let _domain = parts.next()?;
    if parts.next()? != kind {
        return None;
    }
    parts.next()
}

/// Extract IP address from a URL.
///
/// # Arguments
///
/// * `url` - URL string (e.g., "http://192.168.1.100:8200/rootDesc.xml")
///
/// # Returns
///
/// The IP address of the host portion of the URL, or `None` if the URL is
/// malformed or the host is a name rather than an address.
pub fn extract_ip_from_url(url: &str) -> Option<IpAddr> {
    let authority = url.split("//").nth(1)?.split('/').next()?;
    let host = match authority.strip_prefix('[') {
        Some(v6) => v6.split(']').next()?,
        None => authority.split(':').next()?,
    };
    host.parse().ok()
}
