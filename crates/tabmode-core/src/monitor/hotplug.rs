// Tabmode Device Monitor - udev Hotplug
// Enumeration and add/remove notifications for the input subsystem

use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

use log::{debug, trace};

use super::MonitorError;

const INPUT_SUBSYSTEM: &str = "input";

/// Hotplug event for an evdev node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotplugEvent {
    Added(String),
    Removed(String),
}

/// Only /dev/input/eventN nodes speak the evdev protocol; mouseN/jsN and
/// the parent inputN devices are skipped.
pub fn is_event_node(devnode: &Path) -> bool {
    devnode
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("event"))
        .unwrap_or(false)
}

/// List the evdev nodes currently known to udev.
pub fn enumerate_event_nodes() -> Result<Vec<String>, MonitorError> {
    let mut enumerator = udev::Enumerator::new().map_err(MonitorError::Enumerate)?;
    enumerator
        .match_subsystem(INPUT_SUBSYSTEM)
        .map_err(MonitorError::Enumerate)?;

    let mut nodes: Vec<String> = enumerator
        .scan_devices()
        .map_err(MonitorError::Enumerate)?
        .filter_map(|device| {
            let devnode = device.devnode()?;
            if !is_event_node(devnode) {
                return None;
            }
            devnode.to_str().map(|s| s.to_string())
        })
        .collect();
    nodes.sort();
    Ok(nodes)
}

/// udev-based hotplug monitor for the input subsystem
pub struct HotplugMonitor {
    socket: udev::MonitorSocket,
}

impl HotplugMonitor {
    /// Subscribe to input subsystem uevents
    pub fn new() -> Result<Self, MonitorError> {
        let socket = udev::MonitorBuilder::new()
            .and_then(|builder| builder.match_subsystem(INPUT_SUBSYSTEM))
            .and_then(|builder| builder.listen())
            .map_err(MonitorError::Hotplug)?;

        debug!("udev hotplug monitor listening on subsystem '{}'", INPUT_SUBSYSTEM);
        Ok(Self { socket })
    }

    /// Get the raw file descriptor for polling
    pub fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }

    /// Drain pending uevents (non-blocking)
    pub fn drain(&mut self) -> Vec<HotplugEvent> {
        let mut events = Vec::new();
        for event in self.socket.iter() {
            let Some(devnode) = event.devnode() else {
                continue;
            };
            if !is_event_node(devnode) {
                continue;
            }
            let Some(path) = devnode.to_str().map(|s| s.to_string()) else {
                continue;
            };

            match event.event_type() {
                udev::EventType::Add => events.push(HotplugEvent::Added(path)),
                udev::EventType::Remove => events.push(HotplugEvent::Removed(path)),
                other => trace!("Ignoring uevent {:?} for {}", other, path),
            }
        }
        events
    }
}
