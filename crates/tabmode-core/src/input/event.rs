// Tabmode Input Layer - Key Events
// Key actions captured from relay devices and forwarded verbatim

use std::fmt;

/// EV_KEY event type code from linux/input-event-codes.h
pub const EV_KEY: u16 = 0x01;

/// KEY_VOLUMEDOWN from linux/input-event-codes.h
pub const KEY_VOLUMEDOWN: u16 = 114;

/// KEY_VOLUMEUP from linux/input-event-codes.h
pub const KEY_VOLUMEUP: u16 = 115;

/// Keys relayed through the virtual device when no configuration overrides them.
pub const DEFAULT_RELAY_KEYS: &[u16] = &[KEY_VOLUMEDOWN, KEY_VOLUMEUP];

/// Action carried by an EV_KEY event.
///
/// From `evtest` output:
///   0 == 'released'
///   1 == 'pressed'
///   2 == 'repeated'
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum KeyAction {
    Release = 0,
    Press = 1,
    Repeat = 2,
}

impl KeyAction {
    /// Create a KeyAction from the raw evdev value
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyAction::Release),
            1 => Some(KeyAction::Press),
            2 => Some(KeyAction::Repeat),
            _ => None,
        }
    }

    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAction::Release => write!(f, "release"),
            KeyAction::Press => write!(f, "press"),
            KeyAction::Repeat => write!(f, "repeat"),
        }
    }
}

/// A key event captured from a relay-eligible device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Device node the event was read from
    pub source: String,
    /// Key code (EV_KEY code)
    pub code: u16,
    pub action: KeyAction,
}

impl KeyEvent {
    pub fn new(source: impl Into<String>, code: u16, action: KeyAction) -> Self {
        Self {
            source: source.into(),
            code,
            action,
        }
    }

    /// Build a KeyEvent from a raw (type, code, value) triple.
    ///
    /// Returns `None` for non-key events and for values outside
    /// release/press/repeat.
    pub fn from_raw(source: &str, event_type: u16, code: u16, value: i32) -> Option<Self> {
        if !is_key_event(event_type) {
            return None;
        }
        KeyAction::from_i32(value).map(|action| Self::new(source, code, action))
    }
}

/// Check if an event is a key event.
pub fn is_key_event(event_type: u16) -> bool {
    event_type == EV_KEY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_i32() {
        assert_eq!(KeyAction::from_i32(0), Some(KeyAction::Release));
        assert_eq!(KeyAction::from_i32(1), Some(KeyAction::Press));
        assert_eq!(KeyAction::from_i32(2), Some(KeyAction::Repeat));
        assert_eq!(KeyAction::from_i32(3), None);
        assert_eq!(KeyAction::from_i32(-1), None);
    }

    #[test]
    fn test_action_to_i32() {
        assert_eq!(KeyAction::Release.to_i32(), 0);
        assert_eq!(KeyAction::Press.to_i32(), 1);
        assert_eq!(KeyAction::Repeat.to_i32(), 2);
    }

    #[test]
    fn test_from_raw_key_event() {
        let event = KeyEvent::from_raw("/dev/input/event3", EV_KEY, KEY_VOLUMEDOWN, 1).unwrap();
        assert_eq!(event.source, "/dev/input/event3");
        assert_eq!(event.code, KEY_VOLUMEDOWN);
        assert_eq!(event.action, KeyAction::Press);
    }

    #[test]
    fn test_from_raw_ignores_other_types() {
        assert!(KeyEvent::from_raw("/dev/input/event3", 0x00, 0, 0).is_none()); // EV_SYN
        assert!(KeyEvent::from_raw("/dev/input/event3", 0x04, 4, 458792).is_none()); // EV_MSC
    }

    #[test]
    fn test_from_raw_ignores_unknown_value() {
        assert!(KeyEvent::from_raw("/dev/input/event3", EV_KEY, KEY_VOLUMEUP, 7).is_none());
    }

    #[test]
    fn test_ev_key_constant() {
        assert_eq!(EV_KEY, 0x01);
    }
}
