//! Transactional request construction for a multiplexed RPC transport.
//!
//! A [`RequestBuilder`] accumulates request fields and up to three argument
//! buffers, then converts them atomically into an immutable [`Request`]:
//! on success the buffers transfer to the request, on any failure every
//! buffer the builder holds is released exactly once before the error
//! propagates. That release-on-failure guarantee is the load-bearing
//! property of this crate; everything else is bookkeeping around it.
//!
//! Builders are single-owner: configure and build from one logical flow.
//! No operation here blocks or suspends.

pub mod builder;
pub mod error;
pub mod request;
pub mod validate;

pub use builder::RequestBuilder;
pub use error::{RequestError, Result};
pub use request::Request;
pub use validate::{SchemePolicy, HEALTH_ENDPOINT};
