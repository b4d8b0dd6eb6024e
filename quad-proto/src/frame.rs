//! Command frame decoding and encoding.
//!
//! A frame is four bytes on the wire:
//!
//! ```text
//! 0x23 <throttle> <joystick> 0x2F
//! ```
//!
//! The decoder works on a snapshot of the receive ring buffer, so the frame
//! may sit at any rotation and straddle the end of the storage. Positions are
//! resolved with modular arithmetic: throttle follows the start marker and
//! joystick precedes the end marker, both taken modulo the snapshot length.

/// Frame start marker (`#`).
pub const START_MARKER: u8 = 0x23;

/// Frame end marker (`/`).
pub const END_MARKER: u8 = 0x2F;

/// Length of an encoded frame in bytes.
pub const FRAME_LEN: usize = 4;

/// Decoded command payload.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    /// Throttle level, 0x00-0xFF.
    pub throttle: u8,
    /// Joystick direction code (one of the single-bit codes, or don't-care).
    pub joystick: u8,
}

impl Command {
    #[must_use]
    pub const fn new(throttle: u8, joystick: u8) -> Self {
        Self { throttle, joystick }
    }

    /// Zero throttle, no direction.
    pub const NEUTRAL: Self = Self {
        throttle: 0,
        joystick: 0,
    };
}

/// Reasons a snapshot did not yield a command.
///
/// None of these are faults: the caller keeps its previous command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// No start marker in the snapshot.
    MissingStart,
    /// No end marker in the snapshot.
    MissingEnd,
    /// Markers found but fewer than two bytes lie between them.
    Truncated,
}

/// Decode a command from a ring buffer snapshot.
///
/// Scans the whole snapshot for start markers. The last start marker that is
/// followed by an end marker exactly three slots later (modulo the snapshot
/// length) is taken as a complete frame, so payload bytes equal to a marker
/// decode at every rotation. If no such frame exists, the last occurrence of
/// each marker wins. With `j` the start index, `k` the end index and `n` the
/// snapshot length:
///
/// - throttle = `snapshot[(j + 1) % n]`
/// - joystick = `snapshot[(k + n - 1) % n]`
///
/// # Example
///
/// ```
/// use quad_proto::{decode, Command};
///
/// // End marker at index 1, start marker at index 8.
/// let snapshot = [0x04, 0x2F, 0, 0, 0, 0, 0, 0, 0x23, 0x64];
/// assert_eq!(decode(&snapshot), Ok(Command::new(0x64, 0x04)));
/// ```
pub fn decode(snapshot: &[u8]) -> Result<Command, DecodeError> {
    let n = snapshot.len();

    let mut start = None;
    let mut framed_start = None;
    let mut end = None;
    for (i, &b) in snapshot.iter().enumerate() {
        match b {
            START_MARKER => {
                start = Some(i);
                if n >= FRAME_LEN && snapshot[(i + FRAME_LEN - 1) % n] == END_MARKER {
                    framed_start = Some(i);
                }
            }
            END_MARKER => end = Some(i),
            _ => {}
        }
    }

    if let Some(j) = framed_start {
        return Ok(Command {
            throttle: snapshot[(j + 1) % n],
            joystick: snapshot[(j + 2) % n],
        });
    }

    let j = start.ok_or(DecodeError::MissingStart)?;
    let k = end.ok_or(DecodeError::MissingEnd)?;

    // Circular distance from start to end marker; a payload needs two slots.
    if (k + n - j) % n < FRAME_LEN - 1 {
        trace!("markers too close: start={} end={}", j, k);
        return Err(DecodeError::Truncated);
    }

    Ok(Command {
        throttle: snapshot[(j + 1) % n],
        joystick: snapshot[(k + n - 1) % n],
    })
}

/// Encode a command into its wire frame.
#[must_use]
pub const fn encode(command: Command) -> [u8; FRAME_LEN] {
    [START_MARKER, command.throttle, command.joystick, END_MARKER]
}

/// Encode a command into `buf`, returning the number of bytes written.
///
/// Returns `None` if `buf` is shorter than [`FRAME_LEN`].
pub fn encode_into(command: Command, buf: &mut [u8]) -> Option<usize> {
    let dst = buf.get_mut(..FRAME_LEN)?;
    dst.copy_from_slice(&encode(command));
    Some(FRAME_LEN)
}
