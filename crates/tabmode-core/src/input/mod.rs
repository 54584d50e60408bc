// Tabmode Input Layer
// Device detection, classification and key events

mod device;
mod event;
mod filter;

pub use device::{
    is_keyboard, is_virtual_device, DeviceCapabilities, DeviceClass, InputId, BUS_BLUETOOTH,
    BUS_HOST, BUS_I2C, BUS_I8042, BUS_USB, BUS_VIRTUAL,
};
pub use event::{
    is_key_event, KeyAction, KeyEvent, DEFAULT_RELAY_KEYS, EV_KEY, KEY_VOLUMEDOWN, KEY_VOLUMEUP,
};
pub use filter::{matches_relay_filter, Classifier, DeviceMatch};
