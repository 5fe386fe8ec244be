use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header size: 1 (type) + 4 (length) + 4 (request_id) = 9 bytes
pub const HEADER_SIZE: usize = 9;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

// --- Message Types ---

pub const LIST_REQ: u8 = 0x10;
pub const LIST_RESP: u8 = 0x11;
pub const CREATE_FILE_REQ: u8 = 0x12;
pub const CREATE_FOLDER_REQ: u8 = 0x13;
pub const DELETE_REQ: u8 = 0x14;
pub const OPEN_REQ: u8 = 0x15;
pub const OPEN_RESP: u8 = 0x16;

// Replies shared across operations
pub const OP_RESULT: u8 = 0x17;
pub const OP_ERROR: u8 = 0x18;
pub const OPEN_ERROR: u8 = 0x19;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("payload too large: {size} bytes (max {MAX_PAYLOAD_SIZE})")]
    PayloadTooLarge { size: usize },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw message header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub msg_type: u8,
    pub length: u32,
    pub request_id: u32,
}

/// A decoded protocol message
#[derive(Debug, Clone)]
pub struct Message {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(msg_type: u8, request_id: u32, payload: Vec<u8>) -> Self {
        Self {
            header: Header {
                msg_type,
                length: payload.len() as u32,
                request_id,
            },
            payload,
        }
    }

    /// Create a message with a JSON payload. Enforces the payload cap
    /// on the outbound side too, so an oversized reply (e.g. the
    /// content of a huge file) fails here instead of producing a frame
    /// the peer's `decode` rejects.
    pub fn json<T: Serialize>(
        msg_type: u8,
        request_id: u32,
        data: &T,
    ) -> Result<Self, ProtocolError> {
        let payload = serde_json::to_vec(data)?;
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload.len(),
            });
        }
        Ok(Self::new(msg_type, request_id, payload))
    }

    /// Parse the payload as JSON
    pub fn parse_json<'a, T: Deserialize<'a>>(&'a self) -> Result<T, ProtocolError> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    /// Encode this message into bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        buf.put_u8(self.header.msg_type);
        buf.put_u32_le(self.header.length);
        buf.put_u32_le(self.header.request_id);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Encode into an existing BytesMut buffer
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.reserve(HEADER_SIZE + self.payload.len());
        buf.put_u8(self.header.msg_type);
        buf.put_u32_le(self.header.length);
        buf.put_u32_le(self.header.request_id);
        buf.extend_from_slice(&self.payload);
    }

    /// Decode a message from bytes. Returns None if not enough data.
    pub fn decode(buf: &[u8]) -> Result<Option<(Message, usize)>, ProtocolError> {
        if buf.len() < HEADER_SIZE {
            return Ok(None);
        }

        let mut cursor = &buf[..];
        let msg_type = cursor.get_u8();
        let length = cursor.get_u32_le();
        let request_id = cursor.get_u32_le();

        let payload_len = length as usize;
        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge { size: payload_len });
        }

        let total_len = HEADER_SIZE + payload_len;
        if buf.len() < total_len {
            return Ok(None);
        }

        let payload = buf[HEADER_SIZE..total_len].to_vec();

        let msg = Message {
            header: Header {
                msg_type,
                length,
                request_id,
            },
            payload,
        };

        Ok(Some((msg, total_len)))
    }
}

// --- JSON payload types ---
//
// Absent fields deserialize as empty strings so that a request missing a
// field takes the same path as one carrying an empty value.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRequest {
    #[serde(default)]
    pub base_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFileRequest {
    #[serde(default)]
    pub base_dir: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    #[serde(default)]
    pub base_dir: String,
    #[serde(default)]
    pub foldername: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub base_dir: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRequest {
    #[serde(default)]
    pub base_dir: String,
    #[serde(default)]
    pub filename: String,
}

/// Acknowledgement or classified failure for mutating operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpResult {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Open success payload: the file content, verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    pub content: String,
}

/// Open failure payload. Open reports every failure uniformly, without
/// the not-found/missing-argument classification the other operations
/// perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenFailure {
    pub error: String,
}
