// Tabmode uinput Output Layer
// Virtual switch device creation and event emission

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, BusType, EventType, InputEvent, Key, SwitchType};
use log::{debug, info};

use super::sink::SwitchSink;
use super::UInputError;
use crate::input::KeyAction;
use crate::mode::ModeState;

/// The single synthetic device exposed to the desktop's input stack.
///
/// It advertises SW_TABLET_MODE and the relayed keys. Dropping it closes
/// the uinput handle and the kernel removes the device.
pub struct VirtualSwitchDevice {
    device: VirtualDevice,
    name: String,
    relay_keys: Vec<u16>,
    dev_nodes: Vec<String>,
    state: Option<ModeState>,
}

impl VirtualSwitchDevice {
    /// Create and register the virtual device
    pub fn new(name: &str, relay_keys: &[u16]) -> Result<Self, UInputError> {
        let mut keys = AttributeSet::<Key>::new();
        for code in relay_keys {
            keys.insert(Key::new(*code));
        }

        let mut switches = AttributeSet::<SwitchType>::new();
        switches.insert(SwitchType::SW_TABLET_MODE);

        let mut builder = VirtualDeviceBuilder::new()
            .map_err(UInputError::DeviceCreation)?
            .name(name)
            .input_id(evdev::InputId::new(BusType::BUS_VIRTUAL, 0, 0, 0))
            .with_switches(&switches)
            .map_err(UInputError::DeviceCreation)?;
        if !relay_keys.is_empty() {
            builder = builder
                .with_keys(&keys)
                .map_err(UInputError::DeviceCreation)?;
        }
        let mut device = builder.build().map_err(UInputError::DeviceCreation)?;

        // The node paths let the monitor exclude this device even if another
        // device happens to share its name prefix
        let dev_nodes: Vec<String> = match device.enumerate_dev_nodes_blocking() {
            Ok(nodes) => nodes
                .filter_map(|node| node.ok())
                .filter_map(|path| path.to_str().map(|s| s.to_string()))
                .collect(),
            Err(e) => {
                debug!("Cannot resolve virtual device nodes: {}", e);
                Vec::new()
            }
        };

        info!("Created virtual device '{}' {:?}", name, dev_nodes);

        Ok(Self {
            device,
            name: name.to_string(),
            relay_keys: relay_keys.to_vec(),
            dev_nodes,
            state: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// /dev/input nodes of this device
    pub fn dev_nodes(&self) -> &[String] {
        &self.dev_nodes
    }

    /// Last switch state written
    pub fn state(&self) -> Option<ModeState> {
        self.state
    }

    fn emit(&mut self, event_type: EventType, code: u16, value: i32) -> Result<(), UInputError> {
        let event = InputEvent::new(event_type, code, value);
        // SYN_REPORT makes the change a discrete event for readers
        let syn_event = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);

        self.device
            .emit(&[event, syn_event])
            .map_err(UInputError::Write)
    }
}

impl SwitchSink for VirtualSwitchDevice {
    fn write_switch(&mut self, state: ModeState) -> Result<(), UInputError> {
        self.emit(
            EventType::SWITCH,
            SwitchType::SW_TABLET_MODE.0,
            state.switch_value(),
        )?;
        self.state = Some(state);
        info!("SW_TABLET_MODE {} ({})", state.switch_value(), state);
        Ok(())
    }

    fn write_key(&mut self, code: u16, action: KeyAction) -> Result<(), UInputError> {
        if !self.relay_keys.contains(&code) {
            return Err(UInputError::UnsupportedKey(code));
        }
        self.emit(EventType::KEY, code, action.to_i32())?;
        debug!("KEY {} {}", code, action);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{DEFAULT_RELAY_KEYS, KEY_VOLUMEDOWN};

    #[test]
    fn test_virtual_device_creation() {
        // Requires /dev/uinput access
        match VirtualSwitchDevice::new("tabmode test switch", DEFAULT_RELAY_KEYS) {
            Ok(mut device) => {
                assert_eq!(device.name(), "tabmode test switch");
                assert!(device.state().is_none());
                device.write_switch(ModeState::Tablet).unwrap();
                assert_eq!(device.state(), Some(ModeState::Tablet));
                device.write_key(KEY_VOLUMEDOWN, KeyAction::Press).unwrap();
                device.write_key(KEY_VOLUMEDOWN, KeyAction::Release).unwrap();
                assert!(matches!(
                    device.write_key(30, KeyAction::Press),
                    Err(UInputError::UnsupportedKey(30))
                ));
            }
            Err(e) => println!("Skipping test: {}", e),
        }
    }
}
