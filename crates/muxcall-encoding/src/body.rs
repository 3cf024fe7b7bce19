//! Scheme-dispatched encoders for arg2 and arg3.

use std::collections::HashMap;

use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;
use crate::header_block::{decode_header_block, encode_header_block};
use crate::scheme::ArgScheme;

/// Encode application headers into an arg2 payload for the given scheme.
///
/// The JSON scheme carries headers as a JSON object; every other scheme
/// uses the binary header block.
pub fn encode_app_headers(scheme: ArgScheme, headers: &HashMap<String, String>) -> Result<Bytes> {
    if scheme.uses_json_headers() {
        Ok(Bytes::from(serde_json::to_vec(headers)?))
    } else {
        encode_header_block(headers)
    }
}

/// Decode an arg2 payload back into application headers.
pub fn decode_app_headers(scheme: ArgScheme, arg2: &[u8]) -> Result<HashMap<String, String>> {
    if scheme.uses_json_headers() {
        Ok(serde_json::from_slice(arg2)?)
    } else {
        decode_header_block(arg2)
    }
}

/// Encode a JSON request body into an arg3 payload.
///
/// Bodies for the raw and thrift schemes arrive pre-encoded; their
/// serializers live outside this workspace.
pub fn encode_json_body<T: Serialize + ?Sized>(body: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(body)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HashMap<String, String> {
        HashMap::from([("caller".to_string(), "gateway".to_string())])
    }

    #[test]
    fn json_scheme_headers_are_a_json_object() {
        let arg2 = encode_app_headers(ArgScheme::Json, &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&arg2).unwrap();
        assert_eq!(value["caller"], "gateway");
    }

    #[test]
    fn binary_scheme_headers_roundtrip() {
        for scheme in [ArgScheme::Raw, ArgScheme::Thrift, ArgScheme::HealthCheck] {
            let arg2 = encode_app_headers(scheme, &sample()).unwrap();
            assert_eq!(decode_app_headers(scheme, &arg2).unwrap(), sample());
        }
    }

    #[test]
    fn json_body_encodes_via_serde() {
        #[derive(Serialize)]
        struct Login<'a> {
            user: &'a str,
        }

        let arg3 = encode_json_body(&Login { user: "ada" }).unwrap();
        assert_eq!(arg3.as_ref(), br#"{"user":"ada"}"#);
    }

    #[test]
    fn malformed_json_headers_rejected() {
        let err = decode_app_headers(ArgScheme::Json, b"{not json").unwrap_err();
        assert!(matches!(err, crate::EncodingError::Json(_)));
    }
}
