// Tabmode Output Layer
// Virtual switch device and the sink seam the daemon writes to

mod sink;
mod uinput;

pub use sink::{MemorySink, SinkEvent, SwitchSink};
pub use uinput::VirtualSwitchDevice;

/// Name of the virtual device unless configured otherwise
pub const DEFAULT_DEVICE_NAME: &str = "tabmode virtual switch";

/// Error types for uinput operations
#[derive(Debug, thiserror::Error)]
pub enum UInputError {
    #[error("Failed to create virtual device: {0}")]
    DeviceCreation(#[source] std::io::Error),

    #[error("Failed to write event: {0}")]
    Write(#[source] std::io::Error),

    #[error("Key code {0} is not advertised by the virtual device")]
    UnsupportedKey(u16),
}
