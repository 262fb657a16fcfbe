/// Length-prefixed typed message framing.
///
/// A frame is a fixed 6-byte big-endian header, `type` (2 bytes) followed by
/// `length` (4 bytes), then exactly `length` bytes of UTF-8 JSON payload.
/// An unknown type code advances the decoder by one byte and retries, so a
/// corrupt frame cannot desynchronize the stream indefinitely.

pub const HEADER_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FrameType {
    RecommendRequest = 0x0001,
    SearchRequest = 0x0002,
    RecommendResponse = 0x1001,
    SearchResponse = 0x1002,
    ErrorResponse = 0x9001,
}

impl FrameType {
    pub fn from_u16(code: u16) -> Option<FrameType> {
        match code {
            0x0001 => Some(FrameType::RecommendRequest),
            0x0002 => Some(FrameType::SearchRequest),
            0x1001 => Some(FrameType::RecommendResponse),
            0x1002 => Some(FrameType::SearchResponse),
            0x9001 => Some(FrameType::ErrorResponse),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: FrameType,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(frame_type: FrameType, payload: Vec<u8>) -> Self {
        Frame {
            frame_type,
            payload,
        }
    }

    pub fn json(frame_type: FrameType, payload: &impl serde::Serialize) -> Frame {
        let bytes = serde_json::to_vec(payload).unwrap_or_default();
        Frame::new(frame_type, bytes)
    }
}

pub fn encode(frame: &Frame) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(HEADER_LEN + frame.payload.len());
    buffer.extend_from_slice(&frame.frame_type.as_u16().to_be_bytes());
    buffer.extend_from_slice(&(frame.payload.len() as u32).to_be_bytes());
    buffer.extend_from_slice(&frame.payload);
    buffer
}

/// Decode every complete frame in `buffer`. Returns the frames and the
/// number of consumed bytes; unconsumed bytes are a partial frame awaiting
/// more data.
pub fn decode(buffer: &[u8]) -> (Vec<Frame>, usize) {
    let mut frames = Vec::new();
    let mut parsed = 0usize;

    while parsed + HEADER_LEN <= buffer.len() {
        let code = u16::from_be_bytes([buffer[parsed], buffer[parsed + 1]]);
        let Some(frame_type) = FrameType::from_u16(code) else {
            // resync: skip one byte and retry
            parsed += 1;
            continue;
        };

        let length = u32::from_be_bytes([
            buffer[parsed + 2],
            buffer[parsed + 3],
            buffer[parsed + 4],
            buffer[parsed + 5],
        ]) as usize;

        if parsed + HEADER_LEN + length > buffer.len() {
            break; // partial frame, wait for more bytes
        }

        let start = parsed + HEADER_LEN;
        frames.push(Frame::new(frame_type, buffer[start..start + length].to_vec()));
        parsed += HEADER_LEN + length;
    }

    (frames, parsed)
}

/// True iff the buffer holds at least one whole frame.
pub fn has_complete(buffer: &[u8]) -> bool {
    if buffer.len() < HEADER_LEN {
        return false;
    }
    let length = u32::from_be_bytes([buffer[2], buffer[3], buffer[4], buffer[5]]) as usize;
    buffer.len() >= HEADER_LEN + length
}

/// Bytes still needed to complete the next frame, 0 when one is already
/// complete.
pub fn required(buffer: &[u8]) -> usize {
    if buffer.len() < HEADER_LEN {
        return HEADER_LEN - buffer.len();
    }
    let length = u32::from_be_bytes([buffer[2], buffer[3], buffer[4], buffer[5]]) as usize;
    (HEADER_LEN + length).saturating_sub(buffer.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let payload = br#"{"query":"abc","k":5,"timestamp":0}"#.to_vec();
        let frame = Frame::new(FrameType::RecommendRequest, payload.clone());
        let encoded = encode(&frame);

        assert_eq!(&encoded[..2], &[0x00, 0x01]);
        assert_eq!(
            u32::from_be_bytes([encoded[2], encoded[3], encoded[4], encoded[5]]) as usize,
            payload.len()
        );

        let (frames, consumed) = decode(&encoded);
        assert_eq!(consumed, encoded.len());
        assert_eq!(frames, vec![frame]);
    }

    #[test]
    fn resync_skips_junk_prefix() {
        let frame = Frame::new(FrameType::RecommendRequest, b"{}".to_vec());
        let mut stream = vec![0xFFu8];
        stream.extend_from_slice(&encode(&frame));

        let (frames, consumed) = decode(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0], frame);
        assert_eq!(consumed, 1 + HEADER_LEN + 2);
    }

    #[test]
    fn partial_frames_wait_for_more_bytes() {
        let frame = Frame::new(FrameType::SearchRequest, b"{\"q\":1}".to_vec());
        let encoded = encode(&frame);

        for cut in 0..encoded.len() {
            let (frames, consumed) = decode(&encoded[..cut]);
            assert!(frames.is_empty(), "cut at {}", cut);
            assert_eq!(consumed, 0);
        }

        assert!(!has_complete(&encoded[..encoded.len() - 1]));
        assert!(has_complete(&encoded));
        assert_eq!(required(&encoded[..3]), 3);
        assert_eq!(required(&encoded[..HEADER_LEN]), frame.payload.len());
        assert_eq!(required(&encoded), 0);
    }

    #[test]
    fn back_to_back_frames_decode_together() {
        let a = Frame::new(FrameType::RecommendRequest, b"{}".to_vec());
        let b = Frame::new(FrameType::SearchRequest, b"{\"x\":2}".to_vec());
        let mut stream = encode(&a);
        stream.extend_from_slice(&encode(&b));

        let (frames, consumed) = decode(&stream);
        assert_eq!(frames, vec![a, b]);
        assert_eq!(consumed, stream.len());
    }

    #[test]
    fn empty_payload_frame() {
        let frame = Frame::new(FrameType::ErrorResponse, Vec::new());
        let encoded = encode(&frame);
        assert_eq!(encoded.len(), HEADER_LEN);
        let (frames, consumed) = decode(&encoded);
        assert_eq!(frames, vec![frame]);
        assert_eq!(consumed, HEADER_LEN);
    }
}
