//! Discovery Churn Example
//!
//! Simulates a busy network: a background thread announces and drops media
//! servers and renderers while the main thread follows the change stream,
//! selects a renderer and finally restarts discovery.
//!
//! Run with: `cargo run -p dms-explorer-state --example churn`
//! Set `DMS_LOG_MODE=development` to see the controller's own logs.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dms_discovery::{device_from_description, ControlPoint, Device, DeviceCategory, DeviceId};
use dms_state::logging::init_logging_from_env;
use dms_state::{ChangeDescriptor, Controller, ControllerEvent};

const RENDERER_XML: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
    <friendlyName>Living Room TV</friendlyName>
    <manufacturer>Example</manufacturer>
    <modelName>TV-1000</modelName>
    <UDN>uuid:living-room-tv</UDN>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:AVTransport:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:AVTransport</serviceId>
      </service>
    </serviceList>
  </device>
</root>"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_from_env()?;

    println!("DMS Explorer discovery churn");
    println!("============================\n");

    let control_point = Arc::new(ControlPoint::new());
    let controller = Controller::new(control_point.clone())?;

    let changes = controller.iter();
    let tv = device_from_description(RENDERER_XML, "http://192.168.1.50:49152/desc.xml")?;
    let tv_id = tv.id.clone();

    let network = {
        let control_point = Arc::clone(&control_point);
        thread::spawn(move || {
            control_point.announce(tv);
            for round in 0..6 {
                let id = format!("uuid:nas-{}", round);
                control_point.announce(Device::new(
                    id.as_str(),
                    DeviceCategory::Server,
                    format!("NAS {}", round),
                ));
                thread::sleep(Duration::from_millis(20));
                if round % 2 == 1 {
                    control_point.byebye(DeviceCategory::Server, &DeviceId::new(&id));
                }
            }
        })
    };

    for event in changes.timeout_iter(Duration::from_millis(500)) {
        print_event(&event);
    }
    network.join().map_err(|_| "network thread panicked")?;

    let outcome = controller.select(DeviceCategory::Renderer, tv_id.clone())?;
    println!("\nSelected {} ({:?})", tv_id, outcome);

    let servers = controller.snapshot(DeviceCategory::Server);
    println!("{} servers listed:", servers.len());
    for device in servers.devices.iter() {
        println!("  - {} [{}]", device.friendly_name, device.id);
    }

    control_point.byebye(DeviceCategory::Renderer, &tv_id);
    for event in changes.timeout_iter(Duration::from_millis(200)) {
        print_event(&event);
    }

    let epoch = controller.restart()?;
    println!("\nRestarted discovery, now in session {}", epoch);
    for event in changes.try_iter() {
        print_event(&event);
    }

    controller.shutdown()?;
    Ok(())
}

fn print_event(event: &ControllerEvent) {
    match event {
        ControllerEvent::Registry { category, change } => match change {
            ChangeDescriptor::Inserted { index, device } => {
                println!("{:>8}: + {} at {}", category, device.friendly_name, index)
            }
            ChangeDescriptor::Removed { index } => println!("{:>8}: - row {}", category, index),
            ChangeDescriptor::Replaced(devices) => {
                println!("{:>8}: list replaced ({} devices)", category, devices.len())
            }
        },
        ControllerEvent::SelectionChanged { category, device } => match device {
            Some(id) => println!("{:>8}: selected {}", category, id),
            None => println!("{:>8}: selection cleared", category),
        },
        ControllerEvent::SelectionClearedDueToLoss { category, device } => {
            println!("{:>8}: selected {} went away", category, device)
        }
        ControllerEvent::RefreshingChanged {
            category,
            refreshing,
        } => println!("{:>8}: refreshing = {}", category, refreshing),
    }
}
