// Tabmode Core Library
// Keyboard-presence driven tablet-mode switch and volume-key relay

pub mod config;
pub mod daemon;
pub mod input;
pub mod mode;
pub mod monitor;
pub mod output;

pub use config::{Config, ConfigError};
pub use daemon::{Daemon, DaemonError, DaemonStats};
pub use input::{Classifier, DeviceCapabilities, DeviceClass, DeviceMatch, KeyAction, KeyEvent};
pub use mode::{ModeState, ModeTracker, ParseModeError};
pub use monitor::{DeviceMonitor, InputDevice, MonitorError, Notification};
pub use output::{MemorySink, SinkEvent, SwitchSink, UInputError, VirtualSwitchDevice};
