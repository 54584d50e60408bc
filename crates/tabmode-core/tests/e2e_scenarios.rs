// Tabmode End-to-End Test Scenarios
//
// These tests walk through the convertible use cases: keyboards coming and
// going, and volume keys pressed while in tablet mode. They drive the
// registry and daemon exactly as the device monitor does, without hardware.
//
// Run with: cargo test --test e2e_scenarios

mod e2e_tests {
    use tabmode_core::input::{
        DeviceCapabilities, DeviceMatch, InputId, KeyAction, KeyEvent, BUS_BLUETOOTH, BUS_I8042,
        BUS_USB, DEFAULT_RELAY_KEYS, KEY_VOLUMEDOWN, KEY_VOLUMEUP,
    };
    use tabmode_core::monitor::{DeviceRegistry, Notification};
    use tabmode_core::{Classifier, Daemon, MemorySink, ModeState, ModeTracker, SinkEvent};

    // =========================================================================
    // Test Helpers
    // =========================================================================

    const INTERNAL_PATH: &str = "/dev/input/event3";

    /// Registry plus daemon, fed the way the device monitor feeds them
    struct Harness {
        registry: DeviceRegistry,
        daemon: Daemon<MemorySink>,
    }

    impl Harness {
        fn new() -> Self {
            let classifier = Classifier::new(
                vec![DeviceMatch::internal_keyboard()],
                DEFAULT_RELAY_KEYS.to_vec(),
                "tabmode virtual switch",
            );
            Self {
                registry: DeviceRegistry::new(classifier),
                daemon: Daemon::new(ModeTracker::new(), MemorySink::new()),
            }
        }

        fn attach(&mut self, caps: DeviceCapabilities) {
            if let Some(note) = self.registry.add(&caps) {
                self.daemon.handle(note);
            }
        }

        fn detach(&mut self, path: &str) {
            if let Some(note) = self.registry.remove(path) {
                self.daemon.handle(note);
            }
        }

        fn enumeration_complete(&mut self) {
            self.daemon.handle(Notification::EnumerationComplete);
        }

        fn key(&mut self, code: u16, action: KeyAction) {
            self.daemon
                .handle(Notification::Key(KeyEvent::new(INTERNAL_PATH, code, action)));
        }

        fn switch_value(&self) -> Option<i32> {
            self.daemon.sink().switch_value()
        }

        fn switches(&self) -> Vec<ModeState> {
            self.daemon.sink().switches()
        }
    }

    fn letters() -> Vec<u16> {
        // ESC, QWERTY row, A, S, D, Z, X, SPACE
        vec![1, 16, 17, 18, 19, 20, 21, 30, 31, 32, 44, 45, 57]
    }

    fn keyboard_a() -> DeviceCapabilities {
        DeviceCapabilities::new(
            "/dev/input/event10",
            "Legion Go Detachable Keyboard",
            InputId::new(BUS_USB, 0x17ef, 0x6182, 0x0110),
            true,
            letters(),
        )
    }

    fn keyboard_b() -> DeviceCapabilities {
        DeviceCapabilities::new(
            "/dev/input/event11",
            "Keychron K3",
            InputId::new(BUS_BLUETOOTH, 0x05ac, 0x024f, 0x0001),
            true,
            letters(),
        )
    }

    fn internal_keyboard() -> DeviceCapabilities {
        let mut keys = letters();
        keys.extend_from_slice(&[KEY_VOLUMEDOWN, KEY_VOLUMEUP]);
        DeviceCapabilities::new(
            INTERNAL_PATH,
            "AT Translated Set 2 keyboard",
            InputId::new(BUS_I8042, 0x0001, 0x0001, 0xab83),
            true,
            keys,
        )
    }

    fn gamepad() -> DeviceCapabilities {
        DeviceCapabilities::new(
            "/dev/input/event12",
            "Legion Controller for Windows",
            InputId::new(BUS_USB, 0x17ef, 0x6182, 0x0110),
            true,
            vec![304, 305, 307, 308, 310, 311, 314, 315], // BTN_SOUTH..BTN_START
        )
    }

    /// Start with the internal keyboard present and finish enumeration
    fn booted_handheld() -> Harness {
        let mut h = Harness::new();
        h.attach(internal_keyboard());
        h.attach(gamepad());
        h.enumeration_complete();
        h
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    #[test]
    fn scenario_1_no_keyboard_at_startup_is_tablet() {
        let h = booted_handheld();
        assert_eq!(h.switches(), vec![ModeState::Tablet]);
        assert_eq!(h.switch_value(), Some(1));
    }

    #[test]
    fn scenario_2_keyboard_attaches() {
        let mut h = booted_handheld();
        h.attach(keyboard_a());
        assert_eq!(h.switches(), vec![ModeState::Tablet, ModeState::Laptop]);
        assert_eq!(h.switch_value(), Some(0));
    }

    #[test]
    fn scenario_3_one_of_two_keyboards_detaches() {
        let mut h = booted_handheld();
        h.attach(keyboard_a());
        h.attach(keyboard_b());
        h.detach(&keyboard_a().path);

        assert_eq!(h.switches(), vec![ModeState::Tablet, ModeState::Laptop]);
        assert_eq!(h.switch_value(), Some(0));
    }

    #[test]
    fn scenario_4_last_keyboard_detaches() {
        let mut h = booted_handheld();
        h.attach(keyboard_a());
        h.attach(keyboard_b());
        h.detach(&keyboard_a().path);
        h.detach(&keyboard_b().path);

        assert_eq!(
            h.switches(),
            vec![ModeState::Tablet, ModeState::Laptop, ModeState::Tablet]
        );
        assert_eq!(h.switch_value(), Some(1));
    }

    #[test]
    fn scenario_5_volume_down_in_tablet_mode() {
        let mut h = booted_handheld();
        assert_eq!(h.daemon.mode(), Some(ModeState::Tablet));

        h.key(KEY_VOLUMEDOWN, KeyAction::Press);

        let keys = h.daemon.sink().keys();
        assert_eq!(keys, vec![(KEY_VOLUMEDOWN, KeyAction::Press)]);
    }

    // =========================================================================
    // Further workflows
    // =========================================================================

    #[test]
    fn test_keyboard_present_at_boot_starts_in_laptop_mode() {
        let mut h = Harness::new();
        h.attach(internal_keyboard());
        h.attach(keyboard_a());
        h.enumeration_complete();

        assert_eq!(h.switches(), vec![ModeState::Laptop]);
        assert_eq!(h.switch_value(), Some(0));
    }

    #[test]
    fn test_internal_keyboard_never_counts_as_keyboard() {
        let mut h = booted_handheld();
        h.detach(INTERNAL_PATH);
        h.attach(internal_keyboard());
        assert_eq!(h.switches(), vec![ModeState::Tablet]);
    }

    #[test]
    fn test_own_virtual_device_is_ignored() {
        let mut h = booted_handheld();
        let mut echo = keyboard_a();
        echo.name = "tabmode virtual switch".to_string();
        echo.path = "/dev/input/event30".to_string();
        h.attach(echo);
        assert_eq!(h.switches(), vec![ModeState::Tablet]);
    }

    #[test]
    fn test_duplicate_hotplug_add_does_not_double_count() {
        let mut h = booted_handheld();
        h.attach(keyboard_a());
        // udev add seen during enumeration and again from the monitor
        h.attach(keyboard_a());
        h.detach(&keyboard_a().path);
        assert_eq!(
            h.switches(),
            vec![ModeState::Tablet, ModeState::Laptop, ModeState::Tablet]
        );
    }

    #[test]
    fn test_repeat_and_release_are_forwarded_verbatim() {
        let mut h = booted_handheld();
        h.key(KEY_VOLUMEUP, KeyAction::Press);
        h.key(KEY_VOLUMEUP, KeyAction::Repeat);
        h.key(KEY_VOLUMEUP, KeyAction::Repeat);
        h.key(KEY_VOLUMEUP, KeyAction::Release);

        assert_eq!(
            h.daemon.sink().keys(),
            vec![
                (KEY_VOLUMEUP, KeyAction::Press),
                (KEY_VOLUMEUP, KeyAction::Repeat),
                (KEY_VOLUMEUP, KeyAction::Repeat),
                (KEY_VOLUMEUP, KeyAction::Release),
            ]
        );
    }

    #[test]
    fn test_switch_lands_before_following_key() {
        let mut h = booted_handheld();
        h.attach(keyboard_a());
        h.key(KEY_VOLUMEDOWN, KeyAction::Press);
        h.detach(&keyboard_a().path);
        h.key(KEY_VOLUMEDOWN, KeyAction::Release);

        assert_eq!(
            h.daemon.sink().events(),
            &[
                SinkEvent::Switch(ModeState::Tablet),
                SinkEvent::Switch(ModeState::Laptop),
                SinkEvent::Key(KEY_VOLUMEDOWN, KeyAction::Press),
                SinkEvent::Switch(ModeState::Tablet),
                SinkEvent::Key(KEY_VOLUMEDOWN, KeyAction::Release),
            ]
        );
    }

    #[test]
    fn test_pinned_tablet_mode() {
        let classifier = Classifier::default();
        let mut registry = DeviceRegistry::new(classifier);
        let mut daemon = Daemon::new(ModeTracker::pinned(ModeState::Tablet), MemorySink::new());

        for caps in [keyboard_a(), keyboard_b()] {
            if let Some(note) = registry.add(&caps) {
                daemon.handle(note);
            }
        }
        daemon.handle(Notification::EnumerationComplete);
        if let Some(note) = registry.remove(&keyboard_a().path) {
            daemon.handle(note);
        }

        assert_eq!(daemon.sink().switches(), vec![ModeState::Tablet]);
        assert_eq!(daemon.sink().switch_value(), Some(1));
    }
}
