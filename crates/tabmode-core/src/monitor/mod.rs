// Tabmode Device Monitor
// Enumeration, hotplug and relay-key capture

pub mod hotplug;
pub mod r#loop;
pub mod registry;

pub use hotplug::{HotplugEvent, HotplugMonitor};
pub use r#loop::DeviceMonitor;
pub use registry::{DeviceRegistry, InputDevice, Notification};

/// Result type for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors that can occur in the device monitor
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Cannot subscribe to udev hotplug events: {0}")]
    Hotplug(#[source] std::io::Error),

    #[error("Cannot enumerate input devices: {0}")]
    Enumerate(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
