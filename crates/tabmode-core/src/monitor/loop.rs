// Tabmode Device Monitor - Event Loop
// Blocking stream of device and relay-key notifications

use std::collections::VecDeque;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::time::SystemTime;

use evdev::{Device, InputEvent};
use log::{debug, error, info, warn};

use super::hotplug::{enumerate_event_nodes, HotplugEvent, HotplugMonitor};
use super::registry::{DeviceRegistry, InputDevice, Notification};
use super::{MonitorError, MonitorResult};
use crate::input::{Classifier, DeviceCapabilities, KeyEvent};

/// An open relay device whose key events are read
struct RelayStream {
    path: String,
    device: Device,
}

/// Device Monitor
///
/// Subscribes to udev before enumerating so nothing added in between is
/// lost, then yields notifications in arrival order. Iteration blocks in
/// `poll(2)` until the kernel delivers something and ends when the
/// shutdown stream becomes readable.
pub struct DeviceMonitor {
    registry: DeviceRegistry,
    hotplug: HotplugMonitor,
    relays: Vec<RelayStream>,
    shutdown: Option<UnixStream>,
    pending: VecDeque<Notification>,
    failure: Option<MonitorError>,
    finished: bool,
}

impl DeviceMonitor {
    /// Subscribe to hotplug events and enumerate existing devices.
    ///
    /// `shutdown` is the read end of a wake-up pipe; when it becomes
    /// readable the stream ends.
    pub fn new(classifier: Classifier, shutdown: Option<UnixStream>) -> MonitorResult<Self> {
        let hotplug = HotplugMonitor::new()?;
        let nodes = enumerate_event_nodes()?;

        let mut monitor = Self {
            registry: DeviceRegistry::new(classifier),
            hotplug,
            relays: Vec::new(),
            shutdown,
            pending: VecDeque::new(),
            failure: None,
            finished: false,
        };

        for path in &nodes {
            monitor.probe(path);
        }
        info!(
            "Enumerated {} input device(s): {} keyboard(s), {} relay device(s)",
            monitor.registry.len(),
            monitor.registry.keyboard_count(),
            monitor.relays.len()
        );
        monitor.pending.push_back(Notification::EnumerationComplete);

        Ok(monitor)
    }

    /// Enumerate and classify every input device without subscribing.
    ///
    /// This is used by the --list-devices CLI flag.
    pub fn list_devices(classifier: Classifier) -> MonitorResult<Vec<InputDevice>> {
        let mut registry = DeviceRegistry::new(classifier);
        let mut devices = Vec::new();

        for path in enumerate_event_nodes()? {
            match Device::open(&path) {
                Ok(device) => {
                    registry.add(&DeviceCapabilities::from_evdev(&path, &device));
                    if let Some(entry) = registry.get(&path) {
                        devices.push(entry.clone());
                    }
                }
                Err(e) => warn!("Cannot probe {}: {}", path, e),
            }
        }

        Ok(devices)
    }

    /// Error that ended the stream early, if any
    pub fn take_error(&mut self) -> Option<MonitorError> {
        self.failure.take()
    }

    /// Open and classify one device node.
    ///
    /// Probe failures (permissions, a node that vanished already) are not
    /// fatal; the device is skipped.
    fn probe(&mut self, path: &str) {
        if self.registry.contains(path) {
            debug!("{} already tracked", path);
            return;
        }

        let device = match Device::open(path) {
            Ok(device) => device,
            Err(e) => {
                warn!("Cannot probe {}: {}", path, e);
                return;
            }
        };

        let capabilities = DeviceCapabilities::from_evdev(path, &device);
        let note = self.registry.add(&capabilities);
        if let Some(entry) = self.registry.get(path) {
            debug!(
                "{}: '{}' [{}] classified as {}",
                entry.path, entry.name, entry.id, entry.class
            );
        }

        if let Some(Notification::Attached(ref entry)) = note {
            info!("Attached {} '{}' ({})", entry.class, entry.name, entry.path);
            if entry.is_relay() {
                self.relays.push(RelayStream {
                    path: path.to_string(),
                    device,
                });
            }
        }

        if let Some(note) = note {
            self.pending.push_back(note);
        }
    }

    fn forget(&mut self, path: &str) {
        self.relays.retain(|relay| relay.path != path);
        if let Some(note) = self.registry.remove(path) {
            if let Notification::Detached(ref entry) = note {
                info!("Detached {} '{}' ({})", entry.class, entry.name, entry.path);
            }
            self.pending.push_back(note);
        }
    }

    /// Block until the kernel delivers something, then queue notifications.
    fn wait(&mut self) {
        let mut poll_fds: Vec<libc::pollfd> = Vec::with_capacity(self.relays.len() + 2);
        let shutdown_fd: Option<RawFd> = self.shutdown.as_ref().map(|s| s.as_raw_fd());
        if let Some(fd) = shutdown_fd {
            poll_fds.push(pollfd(fd));
        }
        let hotplug_index = poll_fds.len();
        poll_fds.push(pollfd(self.hotplug.as_raw_fd()));
        let relay_offset = poll_fds.len();
        poll_fds.extend(self.relays.iter().map(|r| pollfd(r.device.as_raw_fd())));

        let poll_result = unsafe {
            libc::poll(
                poll_fds.as_mut_ptr(),
                poll_fds.len() as libc::nfds_t,
                -1,
            )
        };

        if poll_result < 0 {
            let err = io::Error::last_os_error();
            // A signal arrived; the shutdown pipe tells us whether to stop
            if err.kind() == io::ErrorKind::Interrupted {
                return;
            }
            error!("poll failed: {}", err);
            self.fail(MonitorError::Io(err));
            return;
        }

        if shutdown_fd.is_some() && poll_fds[0].revents != 0 {
            info!("Shutdown requested");
            self.finished = true;
            return;
        }

        let mut batches: Vec<Vec<(SystemTime, KeyEvent)>> = Vec::new();
        let mut lost: Vec<String> = Vec::new();
        for (i, relay) in self.relays.iter_mut().enumerate() {
            let revents = poll_fds[relay_offset + i].revents;
            if revents == 0 {
                continue;
            }
            match read_relay(relay, self.registry.classifier()) {
                Ok(batch) => batches.push(batch),
                Err(e) => {
                    warn!("Lost relay device {}: {}", relay.path, e);
                    lost.push(relay.path.clone());
                }
            }
        }

        // Device changes are queued ahead of keys read in the same wakeup
        let hotplug_revents = poll_fds[hotplug_index].revents;
        let hotplug_failed = hotplug_revents & (libc::POLLERR | libc::POLLNVAL) != 0;
        if !hotplug_failed && hotplug_revents & libc::POLLIN != 0 {
            for event in self.hotplug.drain() {
                match event {
                    HotplugEvent::Added(path) => self.probe(&path),
                    HotplugEvent::Removed(path) => self.forget(&path),
                }
            }
        }

        self.pending
            .extend(merge_relay_keys(batches).into_iter().map(Notification::Key));

        for path in lost {
            self.forget(&path);
        }

        if hotplug_failed {
            error!("udev monitor socket failed");
            self.fail(MonitorError::Hotplug(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "udev monitor socket closed",
            )));
        }
    }

    fn fail(&mut self, err: MonitorError) {
        self.failure = Some(err);
        self.finished = true;
    }
}

impl Iterator for DeviceMonitor {
    type Item = Notification;

    fn next(&mut self) -> Option<Notification> {
        loop {
            if let Some(note) = self.pending.pop_front() {
                return Some(note);
            }
            if self.finished {
                return None;
            }
            self.wait();
        }
    }
}

fn pollfd(fd: RawFd) -> libc::pollfd {
    libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    }
}

/// Read pending events from a relay device.
///
/// `WouldBlock` just means the queue is drained; any other error means the
/// device is gone.
fn read_relay(
    relay: &mut RelayStream,
    classifier: &Classifier,
) -> io::Result<Vec<(SystemTime, KeyEvent)>> {
    match relay.device.fetch_events() {
        Ok(events) => Ok(relay_keys(&relay.path, events, classifier)),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Keep only relayed key events, tagged with their kernel timestamp.
fn relay_keys<I>(source: &str, events: I, classifier: &Classifier) -> Vec<(SystemTime, KeyEvent)>
where
    I: IntoIterator<Item = InputEvent>,
{
    events
        .into_iter()
        .filter(|event| classifier.is_relay_key(event.code()))
        .filter_map(|event| {
            KeyEvent::from_raw(source, event.event_type().0, event.code(), event.value())
                .map(|key| (event.timestamp(), key))
        })
        .collect()
}

/// Merge per-device batches into one stream ordered by kernel timestamp.
///
/// Events with equal timestamps keep their per-device read order.
fn merge_relay_keys(batches: Vec<Vec<(SystemTime, KeyEvent)>>) -> Vec<KeyEvent> {
    let mut keys: Vec<(SystemTime, KeyEvent)> = batches.into_iter().flatten().collect();
    keys.sort_by_key(|(timestamp, _)| *timestamp);
    keys.into_iter().map(|(_, key)| key).collect()
}
