//! Wire-level translation: the session bootstrap commands and the decode of
//! raw waterfall frames into calibrated lines.

use thiserror::Error;

use crate::{PowerRow, RowBytes, BINS};

/// Marker present in the payload of every waterfall data frame
pub const WF_MARKER: &[u8] = b"W/F";
/// Protocol sub-header stripped from the front of each waterfall frame
pub const FRAME_PREFIX_LEN: usize = 16;
/// Typical Kiwi waterfall calibration (dB)
pub const WF_CAL_DB: f32 = -13.0;

// The device reuses 0x37 to mark blocked frequency ranges, which collides with
// a real sample value. Remap to the value it stands for.
const BLOCKED_BYTE: u8 = 0x37;
const BLOCKED_SUB: u8 = 0xA0;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A waterfall frame whose body is not exactly one line of bins
    #[error("waterfall line of {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    /// A serialized buffer that does not split into a header plus whole lines
    #[error("buffer of {len} bytes does not split into a header plus whole lines")]
    UnalignedPayload { len: usize },
}

/// The configuration commands understood by the waterfall endpoint.
///
/// The device applies them fire-and-forget; there is no acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Password-less guest authentication
    Auth,
    /// Zoom exponent and the derived start-frequency wire parameter
    ZoomStart { zoom: u32, start: u32 },
    /// Displayed dB range, pinned to 0..-100
    DbRange,
    /// Waterfall update rate, pinned to max
    WfSpeed,
    /// Waterfall compression, pinned to off
    WfComp,
}

impl Command {
    /// The literal wire string for this command
    pub fn encode(&self) -> String {
        match self {
            Command::Auth => "SET auth t=kiwi p=".to_owned(),
            Command::ZoomStart { zoom, start } => format!("SET zoom={} start={}", zoom, start),
            Command::DbRange => "SET maxdb=0 mindb=-100".to_owned(),
            Command::WfSpeed => "SET wf_speed=4".to_owned(),
            Command::WfComp => "SET wf_comp=0".to_owned(),
        }
    }
}

/// Whether a received message is a waterfall data frame. Everything else is
/// client/server chatter and safe to drop.
pub fn is_waterfall(msg: &[u8]) -> bool {
    msg.windows(WF_MARKER.len()).any(|w| w == WF_MARKER)
}

/// Decode one waterfall frame into its raw corrected bytes and the calibrated
/// dBm line.
///
/// Strips the frame sub-header, applies the blocked-range byte correction and
/// converts each sample byte `b` to `-(255 - b)` dBm plus the fixed
/// calibration offset.
pub fn decode_row(msg: &[u8]) -> Result<(RowBytes, PowerRow), DecodeError> {
    let body = msg.get(FRAME_PREFIX_LEN..).unwrap_or(&[]);
    if body.len() != BINS {
        return Err(DecodeError::LengthMismatch {
            expected: BINS,
            actual: body.len(),
        });
    }
    let mut raw = [0u8; BINS];
    let mut power = [0f32; BINS];
    for (i, &b) in body.iter().enumerate() {
        let b = if b == BLOCKED_BYTE { BLOCKED_SUB } else { b };
        raw[i] = b;
        power[i] = -((255 - b) as f32) + WF_CAL_DB;
    }
    Ok((raw, power))
}
