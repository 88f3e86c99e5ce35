//! Test helpers for fixture-based description tests

use std::fs;
use std::path::PathBuf;

/// A device description fixture served from a given address
#[derive(Debug, Clone)]
pub struct DeviceFixture {
    pub name: String,
    pub ip: String,
    pub xml_content: String,
}

impl DeviceFixture {
    /// Load a fixture from the fixtures directory
    pub fn load(filename: &str, ip: &str) -> Self {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("tests/fixtures");
        path.push(filename);

        let xml_content = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e));

        Self {
            name: filename.to_string(),
            ip: ip.to_string(),
            xml_content,
        }
    }

    /// Description URL the device would advertise
    pub fn location_url(&self) -> String {
        format!("http://{}:8200/rootDesc.xml", self.ip)
    }
}

/// Collection of fixtures for multi-device scenarios
pub struct FixtureSet {
    pub devices: Vec<DeviceFixture>,
}

impl FixtureSet {
    pub fn new(devices: Vec<DeviceFixture>) -> Self {
        Self { devices }
    }

    /// One server, one renderer, one server recognised by its services
    pub fn media_devices() -> Self {
        Self::new(vec![
            DeviceFixture::load("minidlna_server.xml", "192.168.1.20"),
            DeviceFixture::load("tv_renderer.xml", "192.168.1.50"),
            DeviceFixture::load("generic_server.xml", "192.168.1.21"),
        ])
    }

    /// Media devices plus a router that must be rejected
    pub fn mixed_devices() -> Self {
        let mut set = Self::media_devices();
        set.devices
            .push(DeviceFixture::load("router.xml", "192.168.1.1"));
        set
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }
}
