//! End-to-end tests: discovery source → controller → change iterator

mod helpers;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dms_discovery::{
    ControlPoint, Device, DeviceCategory, DeviceId, DiscoveryListener, DiscoverySource,
    SessionEpoch,
};
use dms_state::{
    ChangeDescriptor, Controller, ControllerEvent, ResyncPolicy, SelectionPolicy, StateError,
};
use helpers::{device, ids, ScriptedSource};
use rstest::rstest;

const WAIT: Duration = Duration::from_millis(300);

fn renderer(id: &str) -> Device {
    device(DeviceCategory::Renderer, id)
}

fn drain(controller: &Controller) -> Vec<ControllerEvent> {
    controller.iter().timeout_iter(WAIT).collect()
}

#[test]
fn test_incremental_insert_through_controller() {
    let source = ScriptedSource::new();
    source.set(DeviceCategory::Renderer, &["a", "b"]);
    let controller = Controller::new(source.clone()).unwrap();
    drain(&controller);

    source.set(DeviceCategory::Renderer, &["a", "b", "c"]);
    controller
        .listener()
        .on_device_discovered(SessionEpoch::FIRST, renderer("c"));

    let events = drain(&controller);
    assert_eq!(
        events,
        vec![ControllerEvent::Registry {
            category: DeviceCategory::Renderer,
            change: ChangeDescriptor::Inserted {
                index: 2,
                device: renderer("c"),
            },
        }]
    );
    assert_eq!(
        controller
            .snapshot(DeviceCategory::Renderer)
            .devices
            .iter()
            .map(|d| d.id.clone())
            .collect::<Vec<_>>(),
        ids(&["a", "b", "c"])
    );
}

#[test]
fn test_selected_loss_through_controller() {
    let source = ScriptedSource::new();
    source.set(DeviceCategory::Renderer, &["a", "b", "c"]);
    let controller = Controller::new(source.clone()).unwrap();
    controller.select(DeviceCategory::Renderer, "b").unwrap();
    drain(&controller);

    source.set(DeviceCategory::Renderer, &["a", "c"]);
    controller.listener().on_device_lost(
        SessionEpoch::FIRST,
        DeviceCategory::Renderer,
        DeviceId::new("b"),
    );

    let events = drain(&controller);
    assert_eq!(
        events,
        vec![
            ControllerEvent::Registry {
                category: DeviceCategory::Renderer,
                change: ChangeDescriptor::Removed { index: 1 },
            },
            ControllerEvent::SelectionClearedDueToLoss {
                category: DeviceCategory::Renderer,
                device: DeviceId::new("b"),
            },
        ]
    );
    let snapshot = controller.snapshot(DeviceCategory::Renderer);
    assert_eq!(snapshot.selected, None);
    assert_eq!(snapshot.len(), 2);
}

#[test]
fn test_missed_events_resync_through_controller() {
    let source = ScriptedSource::new();
    source.set(DeviceCategory::Renderer, &["a", "b"]);
    let controller = Controller::new(source.clone()).unwrap();
    drain(&controller);

    source.set(DeviceCategory::Renderer, &["a", "b", "x", "y", "c"]);
    controller
        .listener()
        .on_device_discovered(SessionEpoch::FIRST, renderer("c"));

    let events = drain(&controller);
    assert_eq!(events.len(), 1);
    match &events[0] {
        ControllerEvent::Registry {
            change: ChangeDescriptor::Replaced(list),
            ..
        } => assert_eq!(
            list.iter().map(|d| d.id.clone()).collect::<Vec<_>>(),
            ids(&["a", "b", "x", "y", "c"])
        ),
        other => panic!("expected a full replacement, got {:?}", other),
    }
    assert_eq!(controller.snapshot(DeviceCategory::Renderer).len(), 5);
}

#[test]
fn test_restart_discards_late_notifications() {
    let source = ScriptedSource::new();
    source.set(DeviceCategory::Server, &["nas"]);
    let controller = Controller::new(source.clone()).unwrap();
    controller.select(DeviceCategory::Server, "nas").unwrap();

    let epoch = controller.restart().unwrap();
    assert_eq!(epoch, SessionEpoch::new(2));
    assert_eq!(source.restarts(), 1);
    drain(&controller);

    let listener = controller.listener();
    listener.on_device_discovered(SessionEpoch::FIRST, device(DeviceCategory::Server, "late"));
    listener.on_device_lost(SessionEpoch::FIRST, DeviceCategory::Server, DeviceId::new("nas"));

    assert!(drain(&controller).is_empty());
    let snapshot = controller.snapshot(DeviceCategory::Server);
    assert!(snapshot.is_empty());
    assert!(snapshot.refreshing);
    assert_eq!(snapshot.selected, None);
    assert_eq!(snapshot.epoch, epoch);
}

#[rstest]
#[case::count_check(ResyncPolicy::CountCheck)]
#[case::full_diff(ResyncPolicy::FullDiff)]
fn test_concurrent_announcers_converge(#[case] policy: ResyncPolicy) {
    let control_point = Arc::new(ControlPoint::new());
    let controller = Controller::builder()
        .resync_policy(policy)
        .build(control_point.clone())
        .unwrap();

    let announcers: Vec<_> = (0..4)
        .map(|worker| {
            let control_point = Arc::clone(&control_point);
            thread::spawn(move || {
                for i in 0..20 {
                    let id = format!("uuid:{}-{}", worker, i);
                    control_point.announce(Device::new(id.as_str(), DeviceCategory::Server, "NAS"));
                    if i % 3 == 0 {
                        control_point.byebye(DeviceCategory::Server, &DeviceId::new(&id));
                    }
                }
            })
        })
        .collect();
    for announcer in announcers {
        announcer.join().unwrap();
    }
    // Every notification is queued by now; a request runs after all of them
    controller.clear_selection(DeviceCategory::Renderer).unwrap();

    let snapshot = controller.snapshot(DeviceCategory::Server);
    let listed: Vec<DeviceId> = snapshot.devices.iter().map(|d| d.id.clone()).collect();
    let authoritative: Vec<DeviceId> = control_point
        .current_device_list(DeviceCategory::Server)
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(listed, authoritative);
    assert_eq!(listed.len(), 4 * 13);
}

#[test]
fn test_event_stream_replays_to_snapshot() {
    let control_point = Arc::new(ControlPoint::new());
    let controller = Controller::new(control_point.clone()).unwrap();
    let changes = controller.iter();

    for id in ["a", "b", "c", "d"] {
        control_point.announce(renderer(id));
    }
    control_point.byebye(DeviceCategory::Renderer, &DeviceId::new("b"));
    control_point.announce(renderer("e"));

    let mut replayed: Vec<Device> = Vec::new();
    for event in changes.timeout_iter(WAIT) {
        if let ControllerEvent::Registry { change, .. } = event {
            match change {
                ChangeDescriptor::Inserted { index, device } => replayed.insert(index, device),
                ChangeDescriptor::Removed { index } => {
                    replayed.remove(index);
                }
                ChangeDescriptor::Replaced(devices) => replayed = devices,
            }
        }
    }

    let snapshot = controller.snapshot(DeviceCategory::Renderer);
    assert_eq!(replayed, snapshot.devices.to_vec());
    assert_eq!(
        replayed.iter().map(|d| d.id.clone()).collect::<Vec<_>>(),
        ids(&["a", "c", "d", "e"])
    );
}

#[test]
fn test_tolerated_selection_of_unlisted_device() {
    let control_point = Arc::new(ControlPoint::new());
    let controller = Controller::builder()
        .selection_policy(SelectionPolicy::Tolerate)
        .build(control_point.clone())
        .unwrap();

    controller.select(DeviceCategory::Renderer, "tv").unwrap();
    assert_eq!(controller.selected(DeviceCategory::Renderer), Some(DeviceId::new("tv")));

    let changes = controller.iter();
    control_point.announce(renderer("tv"));
    assert!(changes.recv_timeout(WAIT).is_some());
    assert_eq!(
        controller.snapshot(DeviceCategory::Renderer).selected_index(),
        Some(0)
    );
}

#[test]
fn test_rejected_selection_of_unlisted_device() {
    let control_point = Arc::new(ControlPoint::new());
    let controller = Controller::new(control_point).unwrap();

    let err = controller
        .select(DeviceCategory::Renderer, "tv")
        .unwrap_err();
    assert!(matches!(err, StateError::InvalidSelection { .. }));
    assert!(err.to_string().contains("tv"));
}

#[test]
fn test_drop_unregisters_listener() {
    let control_point = Arc::new(ControlPoint::new());
    {
        let _controller = Controller::new(control_point.clone()).unwrap();
        assert_eq!(control_point.listener_count(), 1);
    }
    assert_eq!(control_point.listener_count(), 0);

    // Nobody is listening any more; announcing must not block or panic
    control_point.announce(renderer("tv"));
}
