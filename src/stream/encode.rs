//! JPEG encoding of raw frames.

use crate::capture::Frame;
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

/// Errors that can occur while encoding a frame.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("frame buffer does not match its dimensions")]
    MalformedFrame,
    #[error("jpeg encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Encodes a frame as JPEG.
///
/// `quality` is 1-100; `None` uses the encoder's default. The returned
/// bytes are a complete JPEG image starting with the SOI marker.
pub fn encode_jpeg(frame: &Frame, quality: Option<u8>) -> Result<Vec<u8>, EncodeError> {
    if !frame.is_valid() {
        return Err(EncodeError::MalformedFrame);
    }

    let mut jpeg = Vec::new();
    let mut encoder = match quality {
        Some(q) => JpegEncoder::new_with_quality(&mut jpeg, q),
        None => JpegEncoder::new(&mut jpeg),
    };
    encoder.encode(
        frame.pixels(),
        frame.width(),
        frame.height(),
        image::ColorType::Rgb8,
    )?;
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame() -> Frame {
        let pixels = vec![128u8; 32 * 24 * 3];
        Frame::new(pixels, 32, 24, 1)
    }

    #[test]
    fn test_encode_produces_jpeg_soi() {
        let jpeg = encode_jpeg(&test_frame(), None).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_with_quality() {
        let jpeg = encode_jpeg(&test_frame(), Some(85)).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_rejects_malformed_frame() {
        let frame = Frame::new(vec![0u8; 10], 32, 24, 1);
        assert!(matches!(
            encode_jpeg(&frame, None),
            Err(EncodeError::MalformedFrame)
        ));
    }
}
