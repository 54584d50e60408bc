// Tabmode Device Monitor - Live Device Registry
// Authoritative set of attached input devices and their classification

use std::collections::BTreeMap;

use crate::input::{Classifier, DeviceCapabilities, DeviceClass, InputId, KeyEvent};

/// An input device currently visible to the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDevice {
    /// Device node path, the stable identifier
    pub path: String,
    pub name: String,
    pub id: InputId,
    pub class: DeviceClass,
}

impl InputDevice {
    pub fn is_keyboard(&self) -> bool {
        self.class == DeviceClass::Keyboard
    }

    pub fn is_relay(&self) -> bool {
        self.class == DeviceClass::VolumeRelay
    }
}

/// Item produced by the device monitor stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A keyboard or relay device appeared
    Attached(InputDevice),
    /// A keyboard or relay device went away
    Detached(InputDevice),
    /// Initial enumeration is done; the mode baseline can be computed
    EnumerationComplete,
    /// Relayed key event from a relay device
    Key(KeyEvent),
}

/// Live device set, keyed by device node path.
///
/// Ignored devices are tracked too so repeated add/remove events for them
/// stay idempotent, but they never produce notifications.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    classifier: Classifier,
    devices: BTreeMap<String, InputDevice>,
}

impl DeviceRegistry {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            devices: BTreeMap::new(),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Record a probed device.
    ///
    /// Returns `Attached` for keyboard and relay devices. A path that is
    /// already live is left untouched and returns `None`.
    pub fn add(&mut self, capabilities: &DeviceCapabilities) -> Option<Notification> {
        if self.devices.contains_key(&capabilities.path) {
            return None;
        }

        let device = InputDevice {
            path: capabilities.path.clone(),
            name: capabilities.name.clone(),
            id: capabilities.id,
            class: self.classifier.classify(capabilities),
        };
        self.devices.insert(device.path.clone(), device.clone());

        match device.class {
            DeviceClass::Ignored => None,
            DeviceClass::Keyboard | DeviceClass::VolumeRelay => Some(Notification::Attached(device)),
        }
    }

    /// Drop a device. Unknown paths return `None`.
    pub fn remove(&mut self, path: &str) -> Option<Notification> {
        let device = self.devices.remove(path)?;
        match device.class {
            DeviceClass::Ignored => None,
            DeviceClass::Keyboard | DeviceClass::VolumeRelay => Some(Notification::Detached(device)),
        }
    }

    pub fn get(&self, path: &str) -> Option<&InputDevice> {
        self.devices.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.devices.contains_key(path)
    }

    pub fn keyboards(&self) -> impl Iterator<Item = &InputDevice> {
        self.devices.values().filter(|d| d.is_keyboard())
    }

    pub fn relays(&self) -> impl Iterator<Item = &InputDevice> {
        self.devices.values().filter(|d| d.is_relay())
    }

    pub fn keyboard_count(&self) -> usize {
        self.keyboards().count()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{DeviceMatch, BUS_I8042, BUS_USB, DEFAULT_RELAY_KEYS};

    fn keyboard(path: &str) -> DeviceCapabilities {
        DeviceCapabilities::new(
            path,
            "USB Keyboard",
            InputId::new(BUS_USB, 0x046d, 0xc31c, 0x0111),
            true,
            vec![16, 17, 18, 19, 20, 21, 30, 44, 57],
        )
    }

    fn internal(path: &str) -> DeviceCapabilities {
        DeviceCapabilities::new(
            path,
            "AT Translated Set 2 keyboard",
            InputId::new(BUS_I8042, 0x0001, 0x0001, 0xab83),
            true,
            vec![16, 17, 18, 19, 20, 21, 30, 44, 57, 114, 115],
        )
    }

    fn mouse(path: &str) -> DeviceCapabilities {
        DeviceCapabilities::new(path, "USB Mouse", InputId::default(), true, vec![272, 273])
    }

    fn registry() -> DeviceRegistry {
        DeviceRegistry::new(Classifier::new(
            vec![DeviceMatch::internal_keyboard()],
            DEFAULT_RELAY_KEYS.to_vec(),
            "tabmode virtual switch",
        ))
    }

    #[test]
    fn test_add_keyboard_notifies() {
        let mut reg = registry();
        match reg.add(&keyboard("/dev/input/event5")) {
            Some(Notification::Attached(dev)) => {
                assert_eq!(dev.path, "/dev/input/event5");
                assert!(dev.is_keyboard());
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(reg.keyboard_count(), 1);
    }

    #[test]
    fn test_add_relay_notifies() {
        let mut reg = registry();
        let note = reg.add(&internal("/dev/input/event3"));
        assert!(matches!(note, Some(Notification::Attached(ref d)) if d.is_relay()));
        assert_eq!(reg.keyboard_count(), 0);
        assert_eq!(reg.relays().count(), 1);
    }

    #[test]
    fn test_ignored_device_is_tracked_silently() {
        let mut reg = registry();
        assert!(reg.add(&mouse("/dev/input/event7")).is_none());
        assert!(reg.contains("/dev/input/event7"));
        assert!(reg.remove("/dev/input/event7").is_none());
        assert!(!reg.contains("/dev/input/event7"));
    }

    #[test]
    fn test_duplicate_add_is_ignored() {
        let mut reg = registry();
        assert!(reg.add(&keyboard("/dev/input/event5")).is_some());
        assert!(reg.add(&keyboard("/dev/input/event5")).is_none());
        assert_eq!(reg.keyboard_count(), 1);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut reg = registry();
        assert!(reg.remove("/dev/input/event42").is_none());
    }

    #[test]
    fn test_remove_keyboard_notifies_once() {
        let mut reg = registry();
        reg.add(&keyboard("/dev/input/event5"));
        assert!(matches!(
            reg.remove("/dev/input/event5"),
            Some(Notification::Detached(_))
        ));
        assert!(reg.remove("/dev/input/event5").is_none());
        assert_eq!(reg.keyboard_count(), 0);
    }
}
