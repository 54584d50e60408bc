// Tabmode Input Layer - Device Filtering
// Relay allow-list matching and device classification

use super::device::{is_keyboard, is_virtual_device, DeviceCapabilities, DeviceClass, InputId};
use super::device::BUS_I8042;
use super::event::DEFAULT_RELAY_KEYS;

/// One allow-list entry. Every field that is set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceMatch {
    pub name: Option<String>,
    pub path: Option<String>,
    pub bus: Option<u16>,
    pub vendor: Option<u16>,
    pub product: Option<u16>,
    pub version: Option<u16>,
}

impl DeviceMatch {
    /// Match on the full input id.
    pub fn from_input_id(id: InputId) -> Self {
        Self {
            bus: Some(id.bus),
            vendor: Some(id.vendor),
            product: Some(id.product),
            version: Some(id.version),
            ..Self::default()
        }
    }

    /// The built-in AT keyboard controller of the Legion Go.
    ///
    /// It advertises a full key set but is not detachable, and it is the
    /// device carrying the volume rocker.
    pub fn internal_keyboard() -> Self {
        Self::from_input_id(InputId::new(BUS_I8042, 0x0001, 0x0001, 0xab83))
    }

    /// True if no field is constrained (such an entry would match everything)
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches(&self, device: &DeviceCapabilities) -> bool {
        if self.is_empty() {
            return false;
        }

        let name_ok = self.name.as_deref().map_or(true, |n| n == device.name);
        let path_ok = self.path.as_deref().map_or(true, |p| p == device.path);
        let bus_ok = self.bus.map_or(true, |b| b == device.id.bus);
        let vendor_ok = self.vendor.map_or(true, |v| v == device.id.vendor);
        let product_ok = self.product.map_or(true, |p| p == device.id.product);
        let version_ok = self.version.map_or(true, |v| v == device.id.version);

        name_ok && path_ok && bus_ok && vendor_ok && product_ok && version_ok
    }
}

/// Check if a device matches any entry of the relay allow-list.
pub fn matches_relay_filter(device: &DeviceCapabilities, allow_list: &[DeviceMatch]) -> bool {
    allow_list.iter().any(|entry| entry.matches(device))
}

/// Pure classification of probed devices into [`DeviceClass`].
#[derive(Debug, Clone)]
pub struct Classifier {
    relay_matches: Vec<DeviceMatch>,
    relay_keys: Vec<u16>,
    virtual_name: String,
    virtual_paths: Vec<String>,
}

impl Classifier {
    pub fn new(relay_matches: Vec<DeviceMatch>, relay_keys: Vec<u16>, virtual_name: &str) -> Self {
        Self {
            relay_matches,
            relay_keys,
            virtual_name: virtual_name.to_string(),
            virtual_paths: Vec::new(),
        }
    }

    /// Device nodes belonging to our own virtual device.
    pub fn with_virtual_paths(mut self, paths: Vec<String>) -> Self {
        self.virtual_paths = paths;
        self
    }

    pub fn relay_keys(&self) -> &[u16] {
        &self.relay_keys
    }

    pub fn is_relay_key(&self, code: u16) -> bool {
        self.relay_keys.contains(&code)
    }

    /// Classify a device.
    ///
    /// Order matters:
    /// 1. Our own virtual device is always ignored
    /// 2. Allow-listed devices that carry a relayed key are relay devices,
    ///    even when they would pass the keyboard probe
    /// 3. Keyboards
    /// 4. Everything else is ignored
    pub fn classify(&self, device: &DeviceCapabilities) -> DeviceClass {
        if is_virtual_device(&device.name, &self.virtual_name)
            || self.virtual_paths.iter().any(|p| p == &device.path)
        {
            return DeviceClass::Ignored;
        }

        if matches_relay_filter(device, &self.relay_matches) {
            if self.relay_keys.iter().any(|code| device.supports_key(*code)) {
                return DeviceClass::VolumeRelay;
            }
            return DeviceClass::Ignored;
        }

        if is_keyboard(device) {
            return DeviceClass::Keyboard;
        }

        DeviceClass::Ignored
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            vec![DeviceMatch::internal_keyboard()],
            DEFAULT_RELAY_KEYS.to_vec(),
            crate::output::DEFAULT_DEVICE_NAME,
        )
    }
}
