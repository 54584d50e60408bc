// Tabmode Mode Tracker
// Derives the tablet-mode switch state from the number of attached keyboards

use std::fmt;
use std::str::FromStr;

/// Convertible mode reported through SW_TABLET_MODE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeState {
    Laptop,
    Tablet,
}

impl ModeState {
    /// Tablet mode holds iff no keyboard is attached.
    pub fn from_keyboard_count(count: usize) -> Self {
        if count == 0 {
            ModeState::Tablet
        } else {
            ModeState::Laptop
        }
    }

    /// Value written to SW_TABLET_MODE
    pub fn switch_value(self) -> i32 {
        match self {
            ModeState::Laptop => 0,
            ModeState::Tablet => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeState::Laptop => "laptop",
            ModeState::Tablet => "tablet",
        }
    }
}

/// Mode name that is neither laptop nor tablet
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected 'tablet' or 'laptop', got '{0}'")]
pub struct ParseModeError(pub String);

impl FromStr for ModeState {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "laptop" | "0" | "off" => Ok(ModeState::Laptop),
            "tablet" | "1" | "on" => Ok(ModeState::Tablet),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

impl fmt::Display for ModeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts live keyboards and emits a [`ModeState`] only when it changes.
///
/// Nothing is emitted until [`ModeTracker::enumeration_complete`] is called;
/// that call always emits the baseline.
#[derive(Debug, Clone)]
pub struct ModeTracker {
    keyboards: usize,
    current: Option<ModeState>,
    pinned: Option<ModeState>,
}

impl ModeTracker {
    pub fn new() -> Self {
        Self {
            keyboards: 0,
            current: None,
            pinned: None,
        }
    }

    /// A tracker whose state never follows keyboard presence.
    pub fn pinned(state: ModeState) -> Self {
        Self {
            keyboards: 0,
            current: None,
            pinned: Some(state),
        }
    }

    /// Number of keyboards currently attached
    pub fn keyboard_count(&self) -> usize {
        self.keyboards
    }

    /// Last emitted state, `None` before the baseline
    pub fn current(&self) -> Option<ModeState> {
        self.current
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    /// Initial enumeration finished: emit the baseline exactly once.
    pub fn enumeration_complete(&mut self) -> Option<ModeState> {
        if self.current.is_some() {
            return None;
        }
        let state = self.desired();
        self.current = Some(state);
        Some(state)
    }

    pub fn keyboard_attached(&mut self) -> Option<ModeState> {
        self.keyboards += 1;
        self.update()
    }

    pub fn keyboard_detached(&mut self) -> Option<ModeState> {
        self.keyboards = self.keyboards.saturating_sub(1);
        self.update()
    }

    fn desired(&self) -> ModeState {
        self.pinned
            .unwrap_or_else(|| ModeState::from_keyboard_count(self.keyboards))
    }

    fn update(&mut self) -> Option<ModeState> {
        let current = self.current?;
        let next = self.desired();
        if next == current {
            return None;
        }
        self.current = Some(next);
        Some(next)
    }
}

impl Default for ModeTracker {
    fn default() -> Self {
        Self::new()
    }
}
