use serde::Deserialize;
use thiserror::Error;

/// How the payload bytes arrive on the wire, derived from the request
/// content type. Both encodings decode to the same in-memory buffer so the
/// transfer logic never branches on transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Raw octet stream: the body bytes are the payload.
    RawBinary,
    /// JSON document carrying the bytes under a `data` field.
    StructuredBytes,
}

impl Encoding {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.starts_with("application/json") => Self::StructuredBytes,
            _ => Self::RawBinary,
        }
    }
}

#[derive(Deserialize)]
struct StructuredPayload {
    data: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed structured payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode the request body into the canonical payload buffer.
pub fn decode(encoding: Encoding, body: &[u8]) -> Result<Vec<u8>, PayloadError> {
    match encoding {
        Encoding::RawBinary => Ok(body.to_vec()),
        Encoding::StructuredBytes => {
            let parsed: StructuredPayload = serde_json::from_slice(body)?;
            Ok(parsed.data)
        }
    }
}
