//! Counted argument buffers for RPC request construction.
//!
//! Argument payloads (arg1/arg2/arg3) are shared between the encoder that
//! produces them, the builder that holds them while a request is assembled,
//! and the transport that consumes them. This crate tracks that sharing with
//! an allocator-level gauge instead of per-buffer reference counts: every
//! live [`ArgBuffer`] acquired from a [`BufferAllocator`] counts as one
//! outstanding buffer, and dropping the handle is the one and only release.
//!
//! Double release is unrepresentable: a handle releases when it is consumed
//! or dropped, whichever comes first, never both.

pub mod allocator;
pub mod buffer;

pub use allocator::BufferAllocator;
pub use buffer::ArgBuffer;
