//! L2CAP basic frames (B-frames), which carry SMP PDUs on the fixed SMP channel.
//!
//! Channel implementations may use these helpers to frame and unframe PDUs.
use byteorder::{ByteOrder, LittleEndian};

/// Size of the basic L2CAP header.
pub const HEADER_SIZE: usize = 4;

/// Errors that can occur while framing or unframing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The frame is shorter than the basic header.
    #[error("truncated frame of {0} bytes")]
    Truncated(usize),
    /// The header's length field disagrees with the payload.
    #[error("frame length mismatch (header {expected}, payload {found})")]
    LengthMismatch {
        /// The length given by the header.
        expected: usize,
        /// The actual payload length.
        found: usize,
    },
    /// The output buffer cannot hold the frame.
    #[error("buffer too small (required {required}, available {available})")]
    BufferTooSmall {
        /// Bytes needed.
        required: usize,
        /// Bytes available.
        available: usize,
    },
}

/// The basic L2CAP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BasicHeader {
    /// Payload length, excluding the header.
    pub length: u16,
    /// Destination channel identifier.
    pub cid: u16,
}

impl BasicHeader {
    /// Parse a header from its binary representation.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < HEADER_SIZE {
            return Err(FrameError::Truncated(buf.len()));
        }

        Ok(Self {
            length: LittleEndian::read_u16(&buf[0..2]),
            cid: LittleEndian::read_u16(&buf[2..4]),
        })
    }

    /// Serialize the header to its binary representation.
    pub fn to_bytes(self, buf: &mut [u8]) -> usize {
        LittleEndian::write_u16(&mut buf[0..2], self.length);
        LittleEndian::write_u16(&mut buf[2..4], self.cid);
        HEADER_SIZE
    }
}

/// Frame `payload` for channel `cid` into `buffer`, returning the frame size.
pub fn encode(cid: u16, payload: &[u8], buffer: &mut [u8]) -> Result<usize, FrameError> {
    let required = HEADER_SIZE + payload.len();
    let length = u16::try_from(payload.len()).map_err(|_| FrameError::BufferTooSmall {
        required,
        available: u16::MAX as usize,
    })?;

    if buffer.len() < required {
        return Err(FrameError::BufferTooSmall {
            required,
            available: buffer.len(),
        });
    }

    let size = BasicHeader { length, cid }.to_bytes(buffer);
    buffer[size..required].copy_from_slice(payload);

    Ok(required)
}

/// Split a frame into its channel identifier and payload.
pub fn decode(frame: &[u8]) -> Result<(u16, &[u8]), FrameError> {
    let header = BasicHeader::from_bytes(frame)?;
    let payload = &frame[HEADER_SIZE..];

    if payload.len() != header.length as usize {
        return Err(FrameError::LengthMismatch {
            expected: header.length as usize,
            found: payload.len(),
        });
    }

    Ok((header.cid, payload))
}

#[cfg(test)]
mod tests {
    use super::{FrameError, HEADER_SIZE, decode, encode};
    use crate::pdu::SMP_CID;

    #[test]
    fn test_frame_layout() {
        let mut buffer = [0u8; 16];
        let size = encode(SMP_CID, &[0x05, 0x07], &mut buffer).unwrap();

        assert_eq!(size, HEADER_SIZE + 2);
        assert_eq!(&buffer[..size], &[0x02, 0x00, 0x06, 0x00, 0x05, 0x07]);
        assert_eq!(decode(&buffer[..size]), Ok((SMP_CID, &[0x05, 0x07][..])));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode(&[0x02, 0x00, 0x06]), Err(FrameError::Truncated(3)));
        assert_eq!(
            decode(&[0x03, 0x00, 0x06, 0x00, 0x05, 0x07]),
            Err(FrameError::LengthMismatch { expected: 3, found: 2 })
        );
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let mut buffer = [0u8; 5];

        assert_eq!(
            encode(SMP_CID, &[0x05, 0x07], &mut buffer),
            Err(FrameError::BufferTooSmall {
                required: 6,
                available: 5
            })
        );
    }
}
