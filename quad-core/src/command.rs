//! Last decoded command with hold-last-value semantics.

use quad_proto::{decode, Command, DecodeError};

/// The command the control loop acts on.
///
/// Only a successful decode replaces it; a missed or garbled frame keeps the
/// previous command for another cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandState {
    current: Command,
}

impl CommandState {
    /// Zero throttle, no direction.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: Command::NEUTRAL,
        }
    }

    /// Decode `snapshot` and adopt the result if it is a valid frame.
    pub fn update(&mut self, snapshot: &[u8]) -> Result<Command, DecodeError> {
        let decoded = decode(snapshot);
        match decoded {
            Ok(command) => self.current = command,
            Err(e) => trace!("no command this cycle: {:?}", e),
        }
        decoded
    }

    #[inline]
    #[must_use]
    pub const fn current(&self) -> Command {
        self.current
    }

    #[inline]
    #[must_use]
    pub const fn throttle(&self) -> u8 {
        self.current.throttle
    }

    #[inline]
    #[must_use]
    pub const fn joystick(&self) -> u8 {
        self.current.joystick
    }
}
