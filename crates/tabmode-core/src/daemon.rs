// Tabmode Daemon
// Wires the mode tracker to the virtual device and drives the notification stream

use log::{debug, warn};

use crate::mode::{ModeState, ModeTracker};
use crate::monitor::{MonitorError, Notification};
use crate::output::{SwitchSink, UInputError};

/// Errors that end the daemon
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("{0}")]
    Hotplug(#[from] MonitorError),

    #[error("{0}")]
    VirtualDevice(#[from] UInputError),
}

impl DaemonError {
    /// Process exit code reported to the service manager
    pub fn exit_code(&self) -> i32 {
        match self {
            DaemonError::Config(_) => 1,
            DaemonError::Hotplug(_) => 2,
            DaemonError::VirtualDevice(_) => 3,
        }
    }
}

/// Counters kept while the daemon runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaemonStats {
    pub transitions: usize,
    pub relayed: usize,
    pub dropped: usize,
}

/// The one owned context: mode tracker plus the sink it writes to.
///
/// Each notification is fully handled before the next one, so a switch
/// write always lands before any key relayed after it. A switch write that
/// failed is retried before every later notification until it succeeds.
pub struct Daemon<S: SwitchSink> {
    tracker: ModeTracker,
    sink: S,
    written: Option<ModeState>,
    stats: DaemonStats,
}

impl<S: SwitchSink> Daemon<S> {
    pub fn new(tracker: ModeTracker, sink: S) -> Self {
        Self {
            tracker,
            sink,
            written: None,
            stats: DaemonStats::default(),
        }
    }

    pub fn tracker(&self) -> &ModeTracker {
        &self.tracker
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn stats(&self) -> DaemonStats {
        self.stats
    }

    /// Current mode, `None` until initial enumeration has completed
    pub fn mode(&self) -> Option<ModeState> {
        self.tracker.current()
    }

    /// Last switch state the sink accepted
    pub fn written(&self) -> Option<ModeState> {
        self.written
    }

    /// Process a single notification.
    pub fn handle(&mut self, note: Notification) {
        self.sync_switch();

        let transition = match note {
            Notification::EnumerationComplete => self.tracker.enumeration_complete(),
            Notification::Attached(ref device) if device.is_keyboard() => {
                self.tracker.keyboard_attached()
            }
            Notification::Detached(ref device) if device.is_keyboard() => {
                self.tracker.keyboard_detached()
            }
            Notification::Attached(_) | Notification::Detached(_) => None,
            Notification::Key(key) => {
                match self.sink.write_key(key.code, key.action) {
                    Ok(()) => self.stats.relayed += 1,
                    Err(e) => {
                        self.stats.dropped += 1;
                        warn!("Dropped key {} {} from {}: {}", key.code, key.action, key.source, e);
                    }
                }
                None
            }
        };

        if let Some(state) = transition {
            debug!(
                "Mode -> {} ({} keyboard(s))",
                state,
                self.tracker.keyboard_count()
            );
            self.stats.transitions += 1;
            self.sync_switch();
        }
    }

    /// Write the tracker's state if the sink does not hold it yet.
    fn sync_switch(&mut self) {
        let Some(state) = self.tracker.current() else {
            return;
        };
        if self.written == Some(state) {
            return;
        }
        match self.sink.write_switch(state) {
            Ok(()) => self.written = Some(state),
            Err(e) => {
                self.stats.dropped += 1;
                warn!("Dropped SW_TABLET_MODE {}: {}", state.switch_value(), e);
            }
        }
    }

    /// Drain a notification stream, returning the sink when it ends.
    pub fn run<I>(mut self, notifications: I) -> S
    where
        I: IntoIterator<Item = Notification>,
    {
        for note in notifications {
            self.handle(note);
        }
        self.sink
    }
}
