// Tabmode Output Layer - Sink Seam
// Where switch changes and relayed keys are written

use super::UInputError;
use crate::input::KeyAction;
use crate::mode::ModeState;

/// Destination for switch states and relayed key events.
pub trait SwitchSink {
    /// Report a new SW_TABLET_MODE value
    fn write_switch(&mut self, state: ModeState) -> Result<(), UInputError>;

    /// Forward one key event
    fn write_key(&mut self, code: u16, action: KeyAction) -> Result<(), UInputError>;
}

/// Event written to a [`MemorySink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    Switch(ModeState),
    Key(u16, KeyAction),
}

/// In-memory sink that records every write.
///
/// Writes can be made to fail to exercise the drop-and-continue path.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<SinkEvent>,
    failing: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Switch states in write order
    pub fn switches(&self) -> Vec<ModeState> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Switch(state) => Some(*state),
                SinkEvent::Key(..) => None,
            })
            .collect()
    }

    /// Relayed keys in write order
    pub fn keys(&self) -> Vec<(u16, KeyAction)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Key(code, action) => Some((*code, *action)),
                SinkEvent::Switch(_) => None,
            })
            .collect()
    }

    /// Current switch value, as a reader of the device would see it
    pub fn switch_value(&self) -> Option<i32> {
        self.switches().last().map(|s| s.switch_value())
    }

    fn check(&self) -> Result<(), UInputError> {
        if self.failing {
            return Err(UInputError::Write(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "sink unavailable",
            )));
        }
        Ok(())
    }
}

impl SwitchSink for MemorySink {
    fn write_switch(&mut self, state: ModeState) -> Result<(), UInputError> {
        self.check()?;
        self.events.push(SinkEvent::Switch(state));
        Ok(())
    }

    fn write_key(&mut self, code: u16, action: KeyAction) -> Result<(), UInputError> {
        self.check()?;
        self.events.push(SinkEvent::Key(code, action));
        Ok(())
    }
}
