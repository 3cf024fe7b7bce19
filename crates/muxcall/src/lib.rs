//! Request construction for a multiplexed RPC transport.
//!
//! muxcall builds immutable outbound request messages — a service/endpoint
//! identity plus three opaque argument segments — with transactional buffer
//! ownership: a failed build releases every buffer it held, a successful
//! build transfers them to the request.
//!
//! # Crate Structure
//!
//! - [`buffer`] — Counted argument buffers and the allocator gauge
//! - [`encoding`] — Arg schemes, transport header keys, arg2/arg3 encoders
//! - [`request`] — The builder/validate/build core and the immutable request

/// Re-export buffer types.
pub mod buffer {
    pub use muxcall_buffer::*;
}

/// Re-export encoding types.
pub mod encoding {
    pub use muxcall_encoding::*;
}

/// Re-export request types.
pub mod request {
    pub use muxcall_request::*;
}
