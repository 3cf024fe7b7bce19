use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use muxcall_buffer::ArgBuffer;
use muxcall_encoding::ArgScheme;
use tracing::trace;

/// An immutable, ready-to-transmit request.
///
/// Produced only by [`crate::RequestBuilder::build`]. Owns its three
/// argument buffers exclusively until the transport calls
/// [`release`](Request::release) once after the frame has been written
/// out; the request never releases them on its own before that handoff.
#[derive(Debug)]
pub struct Request {
    pub(crate) id: u64,
    pub(crate) ttl: Option<Duration>,
    pub(crate) service: String,
    pub(crate) arg_scheme: ArgScheme,
    pub(crate) transport_headers: HashMap<String, String>,
    pub(crate) application_headers: HashMap<String, String>,
    pub(crate) arg1: ArgBuffer,
    pub(crate) arg2: ArgBuffer,
    pub(crate) arg3: ArgBuffer,
    pub(crate) retry_limit: u8,
}

impl Request {
    /// Correlation identifier; 0 means the transport assigns one at send
    /// time.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Requested time budget, recorded for the transport to enforce.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Target service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// How arg2/arg3 are encoded.
    pub fn arg_scheme(&self) -> ArgScheme {
        self.arg_scheme
    }

    /// Transport-level headers, including the `as` scheme record.
    pub fn transport_headers(&self) -> &HashMap<String, String> {
        &self.transport_headers
    }

    /// A single transport header value.
    pub fn transport_header(&self, key: &str) -> Option<&str> {
        self.transport_headers.get(key).map(String::as_str)
    }

    /// Application headers as configured on the builder; the encoded form
    /// lives in arg2.
    pub fn application_headers(&self) -> &HashMap<String, String> {
        &self.application_headers
    }

    /// Endpoint name buffer.
    pub fn arg1(&self) -> &ArgBuffer {
        &self.arg1
    }

    /// Encoded application headers buffer.
    pub fn arg2(&self) -> &ArgBuffer {
        &self.arg2
    }

    /// Encoded body buffer.
    pub fn arg3(&self) -> &ArgBuffer {
        &self.arg3
    }

    /// Upper bound on transport-level retry attempts.
    pub fn retry_limit(&self) -> u8 {
        self.retry_limit
    }

    /// The endpoint name, when arg1 is valid UTF-8.
    pub fn endpoint(&self) -> Option<&str> {
        self.arg1.as_utf8()
    }

    /// Release the argument buffers.
    ///
    /// Called by the transport exactly once after the request has been
    /// fully serialized onto the wire.
    pub fn release(self) {
        trace!(service = %self.service, "request buffers released");
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.endpoint() {
            Some(endpoint) => write!(f, "{}::{}", self.service, endpoint),
            None => write!(f, "{}::<{} arg1 bytes>", self.service, self.arg1.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muxcall_buffer::BufferAllocator;

    fn sample(alloc: &BufferAllocator) -> Request {
        Request {
            id: 7,
            ttl: Some(Duration::from_millis(250)),
            service: "auth".to_string(),
            arg_scheme: ArgScheme::Raw,
            transport_headers: HashMap::from([("as".to_string(), "raw".to_string())]),
            application_headers: HashMap::new(),
            arg1: alloc.acquire("Login"),
            arg2: alloc.acquire(""),
            arg3: alloc.acquire("body"),
            retry_limit: 2,
        }
    }

    #[test]
    fn accessors_expose_every_field() {
        let alloc = BufferAllocator::new();
        let req = sample(&alloc);

        assert_eq!(req.id(), 7);
        assert_eq!(req.ttl(), Some(Duration::from_millis(250)));
        assert_eq!(req.service(), "auth");
        assert_eq!(req.arg_scheme(), ArgScheme::Raw);
        assert_eq!(req.transport_header("as"), Some("raw"));
        assert!(req.application_headers().is_empty());
        assert_eq!(req.endpoint(), Some("Login"));
        assert_eq!(req.arg3().as_ref(), b"body");
        assert_eq!(req.retry_limit(), 2);
    }

    #[test]
    fn release_returns_all_buffers() {
        let alloc = BufferAllocator::new();
        let req = sample(&alloc);
        assert_eq!(alloc.outstanding(), 3);

        req.release();
        assert_eq!(alloc.outstanding(), 0);
    }

    #[test]
    fn display_names_service_and_endpoint() {
        let alloc = BufferAllocator::new();
        assert_eq!(sample(&alloc).to_string(), "auth::Login");
    }
}
