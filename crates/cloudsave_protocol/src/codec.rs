//! CBOR encoding of wire bodies.

use crate::error::{ProtocolError, ProtocolResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a body to CBOR bytes.
pub fn encode<T: Serialize>(body: &T) -> ProtocolResult<Vec<u8>> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(body, &mut out).map_err(|e| ProtocolError::encoding(e.to_string()))?;
    Ok(out)
}

/// Decodes a body from CBOR bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> ProtocolResult<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::decoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{LoadItemsRequest, RemoteError, RemoteErrorCode, Reply};

    #[test]
    fn decode_garbage_fails() {
        let result: ProtocolResult<LoadItemsRequest> = decode(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(ProtocolError::DecodingFailed { .. })));
    }

    #[test]
    fn decode_wrong_shape_fails() {
        let bytes = encode(&"just a string").unwrap();
        let result: ProtocolResult<LoadItemsRequest> = decode(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn reply_error_survives_encoding() {
        let reply: Reply<()> = Err(RemoteError::new(RemoteErrorCode::RateLimited, "slow down"));
        let bytes = encode(&reply).unwrap();
        let decoded: Reply<()> = decode(&bytes).unwrap();

        let err = decoded.unwrap_err();
        assert_eq!(err.code, RemoteErrorCode::RateLimited);
        assert_eq!(err.message, "slow down");
    }
}
