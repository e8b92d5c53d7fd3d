//! Session bring-up and the bounded waterfall receive loop.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::buffer::{FrameHeader, WaterfallBuffer};
use crate::codec::{self, Command, DecodeError};
use crate::transport::{Channel, TransportError, CLOSE_GOING_AWAY};
use crate::{PowerRow, RowBytes, BINS, FULL_SPAN_KHZ};

/// Resolved acquisition parameters, immutable for the lifetime of a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    /// Span-halving zoom exponent
    pub zoom: u32,
    /// Start frequency offset in kHz
    pub offset_khz: u32,
    /// Number of waterfall lines to collect
    pub rows: usize,
}

impl SessionConfig {
    /// Observed span in kHz after zoom
    pub fn span_khz(&self) -> u32 {
        FULL_SPAN_KHZ >> self.zoom
    }

    /// Center frequency of the observed span in kHz
    pub fn center_freq_khz(&self) -> u32 {
        self.span_khz() / 2 + self.offset_khz
    }

    /// Wire value for the `start` parameter of the zoom command
    fn start_param(&self) -> u32 {
        if self.offset_khz > 0 {
            (self.offset_khz + 100) / (FULL_SPAN_KHZ / BINS as u32) * 16 * 1000
        } else {
            0
        }
    }

    /// The five bootstrap commands, in the order the device expects them
    fn handshake(&self) -> [Command; 5] {
        [
            Command::Auth,
            Command::ZoomStart {
                zoom: self.zoom,
                start: self.start_param(),
            },
            Command::DbRange,
            Command::WfSpeed,
            Command::WfComp,
        ]
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A dead session: the cause, plus whatever lines were collected before the
/// failure so the caller can still produce a degraded result.
#[derive(Error, Debug)]
#[error("acquisition abandoned: {cause}")]
pub struct SessionFailure {
    pub cause: SessionError,
    /// How many lines a successful session would have had
    pub expected: usize,
    /// Lines that made it across before the failure
    pub partial: WaterfallBuffer,
}

/// Drive one full acquisition over `channel`.
///
/// Sends the configuration commands fire-and-forget, then pulls frames until
/// `config.rows` waterfall lines have been decoded. Chatter frames are
/// discarded. Any transport or decode failure is terminal for the session;
/// the device enforces a single client slot, so a blind reconnect could
/// double-book it. The channel is closed best-effort on every exit path.
pub fn run(
    config: &SessionConfig,
    channel: &mut dyn Channel,
) -> Result<WaterfallBuffer, SessionFailure> {
    let header = FrameHeader::new(config.center_freq_khz(), config.span_khz(), Utc::now());
    let mut matrix: Vec<PowerRow> = Vec::with_capacity(config.rows);
    let mut raw_rows: Vec<RowBytes> = Vec::with_capacity(config.rows);

    let outcome = acquire(config, channel, &mut matrix, &mut raw_rows);

    // Closing is not part of the acquisition contract
    if let Err(e) = channel.close(CLOSE_GOING_AWAY) {
        warn!("close failed: {e}");
    }

    let buffer = WaterfallBuffer {
        header,
        matrix,
        raw_rows,
    };
    match outcome {
        Ok(()) => {
            info!(rows = buffer.rows(), "acquisition complete");
            Ok(buffer)
        }
        Err(cause) => Err(SessionFailure {
            cause,
            expected: config.rows,
            partial: buffer,
        }),
    }
}

fn acquire(
    config: &SessionConfig,
    channel: &mut dyn Channel,
    matrix: &mut Vec<PowerRow>,
    raw_rows: &mut Vec<RowBytes>,
) -> Result<(), SessionError> {
    debug!(zoom = config.zoom, offset_khz = config.offset_khz, "handshaking");
    for cmd in config.handshake() {
        channel.send_text(&cmd.encode())?;
    }

    // No acknowledgments to wait on; the device starts streaming immediately
    debug!("streaming");
    while matrix.len() < config.rows {
        let msg = channel.recv()?;
        if !codec::is_waterfall(&msg) {
            // Chatter between client and server
            debug!(len = msg.len(), "discarding chatter frame");
            continue;
        }
        let (raw, power) = codec::decode_row(&msg)?;
        raw_rows.push(raw);
        matrix.push(power);
        info!("received line {}/{}", matrix.len(), config.rows);
    }
    Ok(())
}
