//! MJPEG streaming: frame reads, JPEG encoding and multipart framing.
//!
//! A [`MjpegStream`] is a pull-based iterator over multipart chunks, one per
//! frame, suitable for an HTTP `multipart/x-mixed-replace` response body.
//! There is no internal pacing or buffering: each pull blocks on one device
//! read, and the single `&mut` borrow of the role's handle enforces the
//! one-consumer-per-role contract at compile time.

mod encode;

pub use encode::{encode_jpeg, EncodeError};

use crate::capture::VideoDevice;
use crate::manager::CameraRole;

/// Multipart boundary token; the HTTP layer advertises
/// `multipart/x-mixed-replace; boundary=frame`.
pub const BOUNDARY: &str = "frame";

const PART_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";

/// Wraps one JPEG image in a multipart boundary record.
pub fn multipart_chunk(jpeg: &[u8]) -> Vec<u8> {
    let mut chunk = Vec::with_capacity(PART_HEADER.len() + jpeg.len() + 2);
    chunk.extend_from_slice(PART_HEADER);
    chunk.extend_from_slice(jpeg);
    chunk.extend_from_slice(b"\r\n");
    chunk
}

/// An infinite, pull-based sequence of multipart JPEG chunks.
///
/// Transient read failures are logged and skipped so a live preview keeps
/// going; a fatal device error (or a role that never initialized) ends the
/// iterator. A new stream must be created per consumer.
pub struct MjpegStream<'a> {
    device: Option<&'a mut Box<dyn VideoDevice>>,
    role: CameraRole,
    quality: Option<u8>,
    finished: bool,
}

impl<'a> MjpegStream<'a> {
    /// Creates a stream over the given open device handle.
    pub(crate) fn open(device: &'a mut Box<dyn VideoDevice>, role: CameraRole) -> Self {
        Self {
            device: Some(device),
            role,
            quality: role.jpeg_quality(),
            finished: false,
        }
    }

    /// Creates an already-exhausted stream, used when the role failed to
    /// initialize: the contract is zero frames, not an error.
    pub(crate) fn empty(role: CameraRole) -> Self {
        Self {
            device: None,
            role,
            quality: None,
            finished: true,
        }
    }

    /// The role this stream reads from.
    pub fn role(&self) -> CameraRole {
        self.role
    }
}

impl Iterator for MjpegStream<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if self.finished {
            return None;
        }
        let device = match self.device.as_mut() {
            Some(device) => device,
            None => {
                self.finished = true;
                return None;
            }
        };

        loop {
            match device.read_frame() {
                Ok(frame) => match encode_jpeg(&frame, self.quality) {
                    Ok(jpeg) => return Some(multipart_chunk(&jpeg)),
                    Err(e) => {
                        tracing::warn!(role = %self.role, error = %e, "dropping unencodable frame");
                        continue;
                    }
                },
                Err(e) if !e.is_fatal() => {
                    // Dropped frames are acceptable in a live preview; keep trying.
                    tracing::warn!(role = %self.role, error = %e, "failed to read frame, skipping");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(role = %self.role, error = %e, "stream terminated");
                    self.finished = true;
                    return None;
                }
            }
        }
    }
}
