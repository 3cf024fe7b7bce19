use std::fmt;
use std::str::FromStr;

use crate::error::EncodingError;

/// How arg2 and arg3 are encoded.
///
/// Fixed when a builder is constructed and recorded in the `as` transport
/// header; peers use it to pick the right decoder for the argument
/// segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgScheme {
    /// Pass-through bytes; the caller owns the encoding.
    Raw,
    /// JSON bodies and a JSON object for application headers.
    Json,
    /// Thrift-encoded bodies with the binary header block for arg2.
    Thrift,
    /// Streaming thrift variant.
    StreamingThrift,
    /// Built-in health probe; fixed `Meta::health` endpoint.
    HealthCheck,
}

impl ArgScheme {
    /// The wire value recorded in the `as` transport header.
    pub fn as_str(self) -> &'static str {
        match self {
            ArgScheme::Raw => "raw",
            ArgScheme::Json => "json",
            ArgScheme::Thrift => "thrift",
            ArgScheme::StreamingThrift => "sthrift",
            ArgScheme::HealthCheck => "health",
        }
    }

    /// Returns true if application headers are encoded as a JSON object
    /// rather than the binary header block.
    pub fn uses_json_headers(self) -> bool {
        matches!(self, ArgScheme::Json)
    }
}

impl fmt::Display for ArgScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArgScheme {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(ArgScheme::Raw),
            "json" => Ok(ArgScheme::Json),
            "thrift" => Ok(ArgScheme::Thrift),
            "sthrift" => Ok(ArgScheme::StreamingThrift),
            "health" => Ok(ArgScheme::HealthCheck),
            other => Err(EncodingError::UnknownScheme(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_roundtrip() {
        for scheme in [
            ArgScheme::Raw,
            ArgScheme::Json,
            ArgScheme::Thrift,
            ArgScheme::StreamingThrift,
            ArgScheme::HealthCheck,
        ] {
            assert_eq!(scheme.as_str().parse::<ArgScheme>().unwrap(), scheme);
        }
    }

    #[test]
    fn unknown_scheme_rejected() {
        let err = "protobuf".parse::<ArgScheme>().unwrap_err();
        assert!(matches!(err, EncodingError::UnknownScheme(s) if s == "protobuf"));
    }

    #[test]
    fn display_matches_wire_value() {
        assert_eq!(ArgScheme::Thrift.to_string(), "thrift");
    }

    #[test]
    fn only_json_uses_json_headers() {
        assert!(ArgScheme::Json.uses_json_headers());
        assert!(!ArgScheme::Raw.uses_json_headers());
        assert!(!ArgScheme::Thrift.uses_json_headers());
    }
}
