// Tabmode Input Layer - Device Detection
// Device capability snapshots and keyboard detection

use std::collections::HashSet;
use std::fmt;

/// BUS_USB from linux/input.h
pub const BUS_USB: u16 = 0x03;
/// BUS_BLUETOOTH from linux/input.h
pub const BUS_BLUETOOTH: u16 = 0x05;
/// BUS_VIRTUAL from linux/input.h
pub const BUS_VIRTUAL: u16 = 0x06;
/// BUS_I8042 from linux/input.h
pub const BUS_I8042: u16 = 0x11;
/// BUS_I2C from linux/input.h
pub const BUS_I2C: u16 = 0x18;
/// BUS_HOST from linux/input.h
pub const BUS_HOST: u16 = 0x19;

/// Kernel input id (bus, vendor, product, version)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InputId {
    pub bus: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

impl InputId {
    pub fn new(bus: u16, vendor: u16, product: u16, version: u16) -> Self {
        Self {
            bus,
            vendor,
            product,
            version,
        }
    }
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x}:{:04x}:{:04x}",
            self.bus, self.vendor, self.product, self.version
        )
    }
}

/// Capability snapshot of one input device, taken when it is probed.
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// Device node path (e.g. "/dev/input/event4")
    pub path: String,
    /// Device name as reported by the kernel
    pub name: String,
    pub id: InputId,
    /// Whether the device supports EV_KEY events
    pub has_ev_key: bool,
    /// Supported key codes (EV_KEY capability codes)
    pub supported_keys: Vec<u16>,
}

impl DeviceCapabilities {
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        id: InputId,
        has_ev_key: bool,
        supported_keys: Vec<u16>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            id,
            has_ev_key,
            supported_keys,
        }
    }

    /// Snapshot the capabilities of an opened evdev device.
    pub fn from_evdev(path: &str, device: &evdev::Device) -> Self {
        let input_id = device.input_id();
        let has_ev_key = device.supported_events().contains(evdev::EventType::KEY);
        let supported_keys = device
            .supported_keys()
            .map(|keys| keys.iter().map(|key| key.code()).collect())
            .unwrap_or_default();

        Self {
            path: path.to_string(),
            name: device.name().unwrap_or("Unknown").to_string(),
            id: InputId::new(
                input_id.bus_type().0,
                input_id.vendor(),
                input_id.product(),
                input_id.version(),
            ),
            has_ev_key,
            supported_keys,
        }
    }

    /// Check if a specific key code is supported
    pub fn supports_key(&self, key_code: u16) -> bool {
        self.has_ev_key && self.supported_keys.contains(&key_code)
    }

    pub fn key_set(&self) -> HashSet<u16> {
        self.supported_keys.iter().copied().collect()
    }
}

/// Classification of a probed device.
///
/// The capability space is fixed, so this is a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// A detachable keyboard; its presence means laptop mode.
    Keyboard,
    /// A built-in device whose volume keys are relayed through the virtual device.
    VolumeRelay,
    /// Anything else, including our own virtual device.
    Ignored,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Keyboard => "keyboard",
            DeviceClass::VolumeRelay => "volume-relay",
            DeviceClass::Ignored => "ignored",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// QWERTY row key codes: Q, W, E, R, T, Y
const QWERTY_CODES: &[u16] = &[16, 17, 18, 19, 20, 21];

// Representative A-Z and SPACE codes for keyboard detection
const A_Z_SPACE_CODES: &[u16] = &[57, 30, 44]; // SPACE, A, Z

/// Determine if a device is a keyboard based on its capabilities.
///
/// A device is considered a keyboard if:
/// 1. It supports EV_KEY events
/// 2. All QWERTY row keys (Q, W, E, R, T, Y) are present
/// 3. Representative A-Z keys (A, Z) and SPACE are present
///
/// Volume buttons, power buttons, mice and gamepads all fail this probe.
pub fn is_keyboard(capabilities: &DeviceCapabilities) -> bool {
    if !capabilities.has_ev_key {
        return false;
    }

    let key_set = capabilities.key_set();

    let qwerty_present = QWERTY_CODES.iter().all(|code| key_set.contains(code));
    let az_present = A_Z_SPACE_CODES.iter().all(|code| key_set.contains(code));

    qwerty_present && az_present
}

/// Check if a device is a virtual device created by tabmode based on its name.
///
/// # Arguments
/// * `name` - The device name from evdev
/// * `prefix` - The virtual device name (e.g., "tabmode virtual switch")
pub fn is_virtual_device(name: &str, prefix: &str) -> bool {
    !prefix.is_empty() && name.starts_with(prefix)
}
