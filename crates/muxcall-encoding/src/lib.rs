//! Argument schemes and header encoding for RPC request construction.
//!
//! Every request carries three opaque argument segments: arg1 (endpoint
//! name), arg2 (encoded application headers), and arg3 (encoded body). The
//! arg scheme tag says how arg2/arg3 are encoded and travels in the `as`
//! transport header. This crate owns the scheme tags, the reserved transport
//! header keys, and the encoders the builder calls to produce arg2/arg3.

pub mod body;
pub mod error;
pub mod header_block;
pub mod keys;
pub mod scheme;

pub use body::{decode_app_headers, encode_app_headers, encode_json_body};
pub use error::{EncodingError, Result};
pub use header_block::{decode_header_block, encode_header_block, MAX_ENTRY_LEN, MAX_HEADER_COUNT};
pub use scheme::ArgScheme;
