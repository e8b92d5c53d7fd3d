//! The fixed-header binary buffer a capture is serialized into, and back out
//! of.

use chrono::{DateTime, Utc};

use crate::codec::DecodeError;
use crate::{PowerRow, RowBytes, BINS};

/// Serialized header length: two u32s plus the 26-byte timestamp token
pub const HEADER_LEN: usize = 34;
const TIMESTAMP_LEN: usize = 26;

/// Per-capture header stored ahead of the line data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Center frequency of the observed span in kHz
    pub center_freq: u32,
    /// Observed span in kHz
    pub span: u32,
    /// Opaque 26-byte capture timestamp
    pub timestamp: [u8; TIMESTAMP_LEN],
}

impl FrameHeader {
    pub fn new(center_freq: u32, span: u32, time: DateTime<Utc>) -> Self {
        Self {
            center_freq,
            span,
            timestamp: wf_timestamp(&time),
        }
    }

    /// Packed little-endian form: center_freq, span, timestamp, no padding
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&self.center_freq.to_le_bytes());
        out[4..8].copy_from_slice(&self.span.to_le_bytes());
        out[8..].copy_from_slice(&self.timestamp);
        out
    }

    pub fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Self {
        let mut center_freq = [0u8; 4];
        let mut span = [0u8; 4];
        let mut timestamp = [0u8; TIMESTAMP_LEN];
        center_freq.copy_from_slice(&bytes[..4]);
        span.copy_from_slice(&bytes[4..8]);
        timestamp.copy_from_slice(&bytes[8..]);
        Self {
            center_freq: u32::from_le_bytes(center_freq),
            span: u32::from_le_bytes(span),
            timestamp,
        }
    }
}

/// 26-byte UTC timestamp token, `YYYY-mm-dd HH:MM:SS.ffffff`
fn wf_timestamp(time: &DateTime<Utc>) -> [u8; TIMESTAMP_LEN] {
    let mut out = [0u8; TIMESTAMP_LEN];
    let formatted = time.format("%Y-%m-%d %H:%M:%S%.6f").to_string();
    for (slot, byte) in out.iter_mut().zip(formatted.as_bytes()) {
        *slot = *byte;
    }
    out
}

/// A captured (possibly partial) waterfall: the header, the calibrated matrix
/// and the raw line bytes preserved verbatim for serialization.
#[derive(Debug, Clone)]
pub struct WaterfallBuffer {
    pub header: FrameHeader,
    /// Calibrated dBm lines in arrival order
    pub matrix: Vec<PowerRow>,
    /// Corrected raw bytes for each line in `matrix`
    pub raw_rows: Vec<RowBytes>,
}

impl WaterfallBuffer {
    /// Number of collected lines
    pub fn rows(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    /// Header followed by every raw line, back to back. Line boundaries are
    /// implied by the fixed line width; there is no length prefix.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.raw_rows.len() * BINS);
        out.extend_from_slice(&self.header.to_bytes());
        for row in &self.raw_rows {
            out.extend_from_slice(row);
        }
        out
    }

    /// Split a serialized buffer back into its header and matrix.
    ///
    /// Replayed values are the plain mirrored bytes (`b - 255`), not the
    /// calibrated dBm of the live decode. The stored buffer is a raw re-view
    /// of the capture; the two decode paths are intentionally different.
    pub fn deserialize(bytes: &[u8]) -> Result<(FrameHeader, Vec<PowerRow>), DecodeError> {
        if bytes.len() < HEADER_LEN || (bytes.len() - HEADER_LEN) % BINS != 0 {
            return Err(DecodeError::UnalignedPayload { len: bytes.len() });
        }
        let mut header_bytes = [0u8; HEADER_LEN];
        header_bytes.copy_from_slice(&bytes[..HEADER_LEN]);
        let header = FrameHeader::from_bytes(&header_bytes);
        let matrix = bytes[HEADER_LEN..]
            .chunks_exact(BINS)
            .map(|line| {
                let mut row = [0f32; BINS];
                for (value, &b) in row.iter_mut().zip(line) {
                    *value = b as f32 - 255.0;
                }
                row
            })
            .collect();
        Ok((header, matrix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_header() -> FrameHeader {
        FrameHeader::new(16875, 3750, Utc::now())
    }

    fn buffer_with_rows(raw_rows: Vec<RowBytes>) -> WaterfallBuffer {
        let matrix = raw_rows
            .iter()
            .map(|row| {
                let mut power = [0f32; BINS];
                for (p, &b) in power.iter_mut().zip(row.iter()) {
                    *p = -((255 - b) as f32) - 13.0;
                }
                power
            })
            .collect();
        WaterfallBuffer {
            header: test_header(),
            matrix,
            raw_rows,
        }
    }

    #[test]
    fn test_header_round_trip() {
        let header = test_header();
        assert_eq!(FrameHeader::from_bytes(&header.to_bytes()), header);
    }

    #[test]
    fn test_header_layout() {
        let header = test_header();
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 16875);
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 3750);
    }

    #[test]
    fn test_timestamp_token_is_26_ascii_bytes() {
        let header = test_header();
        assert!(header.timestamp.iter().all(u8::is_ascii));
        let text = std::str::from_utf8(&header.timestamp).unwrap();
        // "YYYY-mm-dd HH:MM:SS.ffffff" fills the token exactly
        assert_eq!(text.len(), 26);
        assert_eq!(&text[4..5], "-");
        assert_eq!(&text[10..11], " ");
        assert_eq!(&text[19..20], ".");
    }

    #[test]
    fn test_serialized_layout() {
        let buffer = buffer_with_rows(vec![[1u8; BINS], [2u8; BINS]]);
        let bytes = buffer.serialize();
        assert_eq!(bytes.len(), HEADER_LEN + 2 * BINS);
        assert!(bytes[HEADER_LEN..HEADER_LEN + BINS].iter().all(|&b| b == 1));
        assert!(bytes[HEADER_LEN + BINS..].iter().all(|&b| b == 2));
    }

    #[test]
    fn test_round_trip_is_lossless_on_raw_bytes() {
        let mut line = [0u8; BINS];
        for (i, b) in line.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        let buffer = buffer_with_rows(vec![line, [0xA0; BINS]]);
        let bytes = buffer.serialize();
        let (header, replay) = WaterfallBuffer::deserialize(&bytes).unwrap();
        assert_eq!(header, buffer.header);
        assert_eq!(replay.len(), 2);
        // Replay values mirror the raw bytes exactly, so the bytes survive
        for (row, raw) in replay.iter().zip(&buffer.raw_rows) {
            for (&value, &b) in row.iter().zip(raw.iter()) {
                assert_eq!(value, b as f32 - 255.0);
                assert_eq!((value + 255.0) as u8, b);
            }
        }
    }

    #[test]
    fn test_replay_decode_differs_from_live_decode() {
        let buffer = buffer_with_rows(vec![[100u8; BINS]]);
        let (_, replay) = WaterfallBuffer::deserialize(&buffer.serialize()).unwrap();
        // Live decode carries the -13 dB calibration, the replay view does not
        assert_eq!(replay[0][0], 100.0 - 255.0);
        assert_eq!(buffer.matrix[0][0], -(255.0 - 100.0) - 13.0);
    }

    #[test]
    fn test_unaligned_payload_rejected() {
        let buffer = buffer_with_rows(vec![[1u8; BINS]]);
        let mut bytes = buffer.serialize();
        bytes.pop();
        assert_eq!(
            WaterfallBuffer::deserialize(&bytes),
            Err(DecodeError::UnalignedPayload {
                len: HEADER_LEN + BINS - 1
            })
        );
    }

    #[test]
    fn test_truncated_header_rejected() {
        assert_eq!(
            WaterfallBuffer::deserialize(&[0u8; 10]),
            Err(DecodeError::UnalignedPayload { len: 10 })
        );
    }

    #[test]
    fn test_header_only_buffer_is_empty_matrix() {
        let buffer = buffer_with_rows(Vec::new());
        let (header, replay) = WaterfallBuffer::deserialize(&buffer.serialize()).unwrap();
        assert_eq!(header, buffer.header);
        assert!(replay.is_empty());
    }
}
