use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use muxcall_buffer::{ArgBuffer, BufferAllocator};
use muxcall_encoding::{encode_app_headers, encode_json_body, keys, ArgScheme};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::{RequestError, Result};
use crate::request::Request;
use crate::validate::{self, SchemePolicy, HEALTH_ENDPOINT};

/// Mutable accumulator for request fields and argument buffers.
///
/// Configure with chained setters, then call [`build`](RequestBuilder::build)
/// exactly once. Build is a transaction: on success the held buffers
/// transfer into the returned [`Request`] and the builder's slots are
/// cleared; on failure every held buffer is released exactly once and the
/// builder becomes terminally spent. Setters return `Result<&mut Self>` so
/// chains compose with `?`, and a setter failure leaves the builder usable.
///
/// A builder instance belongs to one logical flow; it is not meant for
/// concurrent mutation.
#[derive(Debug)]
pub struct RequestBuilder {
    policy: SchemePolicy,
    id: u64,
    ttl: Option<Duration>,
    service: String,
    endpoint: Option<String>,
    transport_headers: HashMap<String, String>,
    application_headers: HashMap<String, String>,
    retry_limit: u8,
    allocator: Option<BufferAllocator>,
    arg1: Option<ArgBuffer>,
    arg2: Option<ArgBuffer>,
    arg3: Option<ArgBuffer>,
    spent: bool,
}

impl RequestBuilder {
    /// Create a builder for `scheme` targeting `service` and the named
    /// endpoint.
    pub fn new(scheme: ArgScheme, service: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::init(
            SchemePolicy::for_scheme(scheme),
            service.into(),
            Some(endpoint.into()),
            None,
        )
    }

    /// Create a builder from a pre-encoded arg1 buffer instead of an
    /// endpoint name. The buffer must decode to a non-empty UTF-8 name to
    /// pass validation.
    pub fn from_arg1(scheme: ArgScheme, service: impl Into<String>, arg1: ArgBuffer) -> Self {
        Self::init(
            SchemePolicy::for_scheme(scheme),
            service.into(),
            None,
            Some(arg1),
        )
    }

    /// Create a builder with a caller-supplied scheme policy.
    pub fn with_policy(
        policy: SchemePolicy,
        service: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self::init(policy, service.into(), Some(endpoint.into()), None)
    }

    /// Raw-scheme builder.
    pub fn raw(service: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(ArgScheme::Raw, service, endpoint)
    }

    /// JSON-scheme builder.
    pub fn json(service: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(ArgScheme::Json, service, endpoint)
    }

    /// Thrift-scheme builder. The endpoint must take the
    /// `Interface::method` form.
    pub fn thrift(service: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(ArgScheme::Thrift, service, endpoint)
    }

    /// Health-check builder with the fixed `Meta::health` endpoint.
    pub fn health_check(service: impl Into<String>) -> Self {
        Self::new(ArgScheme::HealthCheck, service, HEALTH_ENDPOINT)
    }

    fn init(
        policy: SchemePolicy,
        service: String,
        endpoint: Option<String>,
        arg1: Option<ArgBuffer>,
    ) -> Self {
        let mut transport_headers = HashMap::new();
        transport_headers.insert(
            keys::ARG_SCHEME_KEY.to_string(),
            policy.scheme().as_str().to_string(),
        );
        Self {
            policy,
            id: 0,
            ttl: None,
            service,
            endpoint,
            transport_headers,
            application_headers: HashMap::new(),
            retry_limit: 0,
            allocator: None,
            arg1,
            arg2: None,
            arg3: None,
            spent: false,
        }
    }

    /// The scheme this builder is fixed to.
    pub fn arg_scheme(&self) -> ArgScheme {
        self.policy.scheme()
    }

    /// Acquire buffers the builder encodes itself (arg1 from the endpoint
    /// name, arg2 from application headers, arg3 from `set_body`) through
    /// `allocator`, so they show up on its outstanding gauge.
    pub fn set_allocator(&mut self, allocator: BufferAllocator) -> Result<&mut Self> {
        self.ensure_live()?;
        self.allocator = Some(allocator);
        Ok(self)
    }

    /// Set the correlation id. 0 leaves assignment to the transport.
    pub fn set_id(&mut self, id: u64) -> Result<&mut Self> {
        self.ensure_live()?;
        self.id = id;
        Ok(self)
    }

    /// Set the request time budget. Must be positive.
    pub fn set_timeout(&mut self, ttl: Duration) -> Result<&mut Self> {
        self.ensure_live()?;
        if ttl.is_zero() {
            return Err(RequestError::InvalidField {
                field: "ttl",
                reason: "time budget must be positive".to_string(),
            });
        }
        self.ttl = Some(ttl);
        Ok(self)
    }

    /// Set the request time budget in milliseconds.
    pub fn set_timeout_ms(&mut self, millis: u64) -> Result<&mut Self> {
        self.set_timeout(Duration::from_millis(millis))
    }

    /// Merge one application header; last write for a key wins.
    pub fn set_header(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<&mut Self> {
        self.ensure_live()?;
        self.application_headers.insert(key.into(), value.into());
        Ok(self)
    }

    /// Merge a batch of application headers.
    pub fn set_headers(
        &mut self,
        headers: impl IntoIterator<Item = (String, String)>,
    ) -> Result<&mut Self> {
        self.ensure_live()?;
        self.application_headers.extend(headers);
        Ok(self)
    }

    /// Remove an application header.
    pub fn remove_header(&mut self, key: &str) -> Result<&mut Self> {
        self.ensure_live()?;
        self.application_headers.remove(key);
        Ok(self)
    }

    /// Merge one transport header. The `as` key is owned by the builder
    /// and rejected here.
    pub fn set_transport_header(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<&mut Self> {
        self.ensure_live()?;
        let key = key.into();
        if keys::is_protected(&key) {
            return Err(RequestError::InvalidField {
                field: "as",
                reason: "the arg-scheme key is fixed by the builder".to_string(),
            });
        }
        self.transport_headers.insert(key, value.into());
        Ok(self)
    }

    /// Merge a batch of transport headers. Protected keys are skipped;
    /// the builder re-asserts the scheme record before validation, so a
    /// bulk merge can never change the effective scheme.
    pub fn set_transport_headers(
        &mut self,
        headers: impl IntoIterator<Item = (String, String)>,
    ) -> Result<&mut Self> {
        self.ensure_live()?;
        for (key, value) in headers {
            if keys::is_protected(&key) {
                trace!(key = %key, "skipping protected transport header in bulk merge");
                continue;
            }
            self.transport_headers.insert(key, value);
        }
        Ok(self)
    }

    /// Record the calling service in the `cn` transport header.
    pub fn set_caller_name(&mut self, caller: impl Into<String>) -> Result<&mut Self> {
        self.set_transport_header(keys::CALLER_NAME_KEY, caller)
    }

    /// Replace the arg2 slot. A previously held buffer is released
    /// immediately. The passed buffer is consumed even when the call
    /// fails on a spent builder.
    pub fn set_arg2(&mut self, buffer: ArgBuffer) -> Result<&mut Self> {
        self.ensure_live()?;
        if let Some(previous) = self.arg2.replace(buffer) {
            trace!(len = previous.len(), "arg2 replaced, prior buffer released");
        }
        Ok(self)
    }

    /// Replace the arg3 slot. A previously held buffer is released
    /// immediately. The passed buffer is consumed even when the call
    /// fails on a spent builder.
    pub fn set_arg3(&mut self, buffer: ArgBuffer) -> Result<&mut Self> {
        self.ensure_live()?;
        self.store_arg3(buffer);
        Ok(self)
    }

    /// Encode `body` into arg3 with the JSON encoder.
    ///
    /// Only valid on JSON-scheme builders; other schemes take pre-encoded
    /// bodies via [`set_body_bytes`](RequestBuilder::set_body_bytes) or
    /// [`set_arg3`](RequestBuilder::set_arg3). On an encoding failure
    /// nothing is stored: the previous arg3, if any, stays in place and no
    /// partial buffer is referenced.
    pub fn set_body<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<&mut Self> {
        self.ensure_live()?;
        if self.policy.scheme() != ArgScheme::Json {
            return Err(RequestError::InvalidField {
                field: "arg3",
                reason: format!(
                    "scheme '{}' takes a pre-encoded body",
                    self.policy.scheme()
                ),
            });
        }
        let encoded = encode_json_body(body)?;
        let buffer = self.acquire(encoded);
        self.store_arg3(buffer);
        Ok(self)
    }

    /// Store an already-encoded body in arg3.
    pub fn set_body_bytes(&mut self, body: impl Into<Bytes>) -> Result<&mut Self> {
        self.ensure_live()?;
        let buffer = self.acquire(body.into());
        self.store_arg3(buffer);
        Ok(self)
    }

    /// Bound transport-level retry attempts. The `u8` range is the policy
    /// bound.
    pub fn set_retry_limit(&mut self, limit: u8) -> Result<&mut Self> {
        self.ensure_live()?;
        self.retry_limit = limit;
        Ok(self)
    }

    /// Run the shared validation pass over the current builder state.
    ///
    /// Checks, in order: service non-empty; endpoint present, UTF-8 and
    /// non-empty; the `as` transport header matches the fixed scheme; the
    /// scheme's endpoint hook; ttl positive when set. The retry limit is
    /// bounded by its type.
    ///
    /// Pure: no buffer is touched. Callers invoking this directly own
    /// cleanup of any buffers they handed the builder;
    /// [`build`](RequestBuilder::build) wraps it with automatic release.
    pub fn validate(&self) -> Result<()> {
        self.ensure_live()?;
        self.validate_with(self.arg1.as_ref())
    }

    /// Convert the accumulated state into an immutable [`Request`].
    ///
    /// Runs [`validate`](RequestBuilder::validate), then encodes any
    /// argument slot the caller left empty (arg1 from the endpoint name,
    /// arg2 from application headers, arg3 as an empty body). On success
    /// ownership of all three buffers transfers to the request. On any
    /// failure (validation, encoding, or a panic in between) every buffer
    /// the builder held is released exactly once and the builder is left
    /// terminally spent.
    pub fn build(&mut self) -> Result<Request> {
        self.ensure_live()?;
        self.spent = true;

        // Re-assert the scheme record so a bulk merge can never have
        // displaced it.
        self.transport_headers.insert(
            keys::ARG_SCHEME_KEY.to_string(),
            self.policy.scheme().as_str().to_string(),
        );

        // From here on every exit path either transfers the buffers into
        // the request or lets the guard release them.
        let mut slots = ArgSlots {
            arg1: self.arg1.take(),
            arg2: self.arg2.take(),
            arg3: self.arg3.take(),
        };

        self.validate_with(slots.arg1.as_ref())?;

        if slots.arg1.is_none() {
            if let Some(endpoint) = self.endpoint.as_deref() {
                let buffer = self.acquire(Bytes::copy_from_slice(endpoint.as_bytes()));
                slots.arg1 = Some(buffer);
            }
        }
        if slots.arg2.is_none() {
            let encoded = encode_app_headers(self.policy.scheme(), &self.application_headers)?;
            slots.arg2 = Some(self.acquire(encoded));
        }
        if slots.arg3.is_none() {
            slots.arg3 = Some(self.acquire(Bytes::new()));
        }

        let (arg1, arg2, arg3) = match slots.into_parts() {
            Some(parts) => parts,
            None => {
                return Err(RequestError::Validation {
                    field: "arg1",
                    reason: "argument slots incomplete".to_string(),
                })
            }
        };

        debug!(
            service = %self.service,
            scheme = %self.policy.scheme(),
            id = self.id,
            "request built"
        );

        Ok(Request {
            id: self.id,
            ttl: self.ttl,
            service: std::mem::take(&mut self.service),
            arg_scheme: self.policy.scheme(),
            transport_headers: std::mem::take(&mut self.transport_headers),
            application_headers: std::mem::take(&mut self.application_headers),
            arg1,
            arg2,
            arg3,
            retry_limit: self.retry_limit,
        })
    }

    fn ensure_live(&self) -> Result<()> {
        if self.spent {
            return Err(RequestError::BuilderSpent);
        }
        Ok(())
    }

    fn validate_with(&self, arg1: Option<&ArgBuffer>) -> Result<()> {
        validate::check_service(&self.service)?;
        let name = match self.endpoint.as_deref() {
            Some("") | None => match arg1 {
                Some(buffer) => validate::decode_endpoint(buffer.as_ref())?,
                None => return Err(validate::endpoint_missing()),
            },
            Some(name) => name,
        };
        validate::check_scheme_header(&self.transport_headers, self.policy.scheme())?;
        self.policy.check_endpoint(name)?;
        validate::check_ttl(self.ttl)
    }

    fn acquire(&self, payload: Bytes) -> ArgBuffer {
        match &self.allocator {
            Some(allocator) => allocator.acquire(payload),
            None => ArgBuffer::unattached(payload),
        }
    }

    fn store_arg3(&mut self, buffer: ArgBuffer) {
        if let Some(previous) = self.arg3.replace(buffer) {
            trace!(len = previous.len(), "arg3 replaced, prior buffer released");
        }
    }
}

/// Holds the builder's argument buffers while a build is in flight.
///
/// Dropping the guard with buffers still inside releases them; that is
/// the failure path, including panics. A successful build empties the
/// guard through [`into_parts`](ArgSlots::into_parts) first.
struct ArgSlots {
    arg1: Option<ArgBuffer>,
    arg2: Option<ArgBuffer>,
    arg3: Option<ArgBuffer>,
}

impl ArgSlots {
    fn held(&self) -> usize {
        usize::from(self.arg1.is_some())
            + usize::from(self.arg2.is_some())
            + usize::from(self.arg3.is_some())
    }

    fn into_parts(mut self) -> Option<(ArgBuffer, ArgBuffer, ArgBuffer)> {
        match (self.arg1.take(), self.arg2.take(), self.arg3.take()) {
            (Some(arg1), Some(arg2), Some(arg3)) => Some((arg1, arg2, arg3)),
            _ => None,
        }
    }
}

impl Drop for ArgSlots {
    fn drop(&mut self) {
        let held = self.held();
        if held > 0 {
            warn!(held, "releasing argument buffers after failed build");
        }
    }
}
