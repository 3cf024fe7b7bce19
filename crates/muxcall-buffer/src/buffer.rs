use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tracing::trace;

/// A counted argument buffer.
///
/// Holds one payload segment of a request (endpoint name, encoded headers,
/// or encoded body). A buffer acquired from a [`crate::BufferAllocator`]
/// counts as one outstanding buffer on that allocator's gauge until the
/// handle is released. Release happens exactly once: either through the
/// consuming [`release`](ArgBuffer::release) or through `Drop`.
pub struct ArgBuffer {
    payload: Bytes,
    gauge: Option<Arc<AtomicUsize>>,
}

impl ArgBuffer {
    pub(crate) fn attached(payload: Bytes, gauge: Arc<AtomicUsize>) -> Self {
        let outstanding = gauge.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(len = payload.len(), outstanding, "buffer acquired");
        Self {
            payload,
            gauge: Some(gauge),
        }
    }

    /// Create a buffer that is not tracked by any allocator.
    ///
    /// Useful for static payloads and tests where no leak accounting is
    /// wanted.
    pub fn unattached(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            gauge: None,
        }
    }

    /// Produce a second counted handle over the same payload.
    ///
    /// The payload storage is shared; the new handle counts as its own
    /// outstanding buffer and releases independently. Producers that hand a
    /// buffer to a builder but need to keep reading it retain first.
    pub fn retain(&self) -> ArgBuffer {
        match &self.gauge {
            Some(gauge) => Self::attached(self.payload.clone(), Arc::clone(gauge)),
            None => Self::unattached(self.payload.clone()),
        }
    }

    /// Release the buffer, returning it to its allocator's accounting.
    ///
    /// Equivalent to dropping the handle; provided so ownership handoffs
    /// read as such at call sites.
    pub fn release(self) {}

    /// The payload bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The payload as UTF-8, if it is valid UTF-8.
    pub fn as_utf8(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

impl AsRef<[u8]> for ArgBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.payload
    }
}

impl Drop for ArgBuffer {
    fn drop(&mut self) {
        if let Some(gauge) = &self.gauge {
            let outstanding = gauge.fetch_sub(1, Ordering::AcqRel) - 1;
            trace!(len = self.payload.len(), outstanding, "buffer released");
        }
    }
}

impl fmt::Debug for ArgBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgBuffer")
            .field("len", &self.payload.len())
            .field("attached", &self.gauge.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BufferAllocator;

    #[test]
    fn unattached_buffer_holds_payload() {
        let buf = ArgBuffer::unattached("hello");
        assert_eq!(buf.as_ref(), b"hello");
        assert_eq!(buf.len(), 5);
        assert!(!buf.is_empty());
        assert_eq!(buf.as_utf8(), Some("hello"));
    }

    #[test]
    fn retain_shares_payload_storage() {
        let alloc = BufferAllocator::new();
        let buf = alloc.acquire(Bytes::from_static(b"shared"));
        let second = buf.retain();

        assert_eq!(alloc.outstanding(), 2);
        assert_eq!(buf.payload().as_ptr(), second.payload().as_ptr());

        drop(buf);
        assert_eq!(alloc.outstanding(), 1);
        drop(second);
        assert_eq!(alloc.outstanding(), 0);
    }

    #[test]
    fn explicit_release_counts_once() {
        let alloc = BufferAllocator::new();
        let buf = alloc.acquire("payload");
        assert_eq!(alloc.outstanding(), 1);

        buf.release();
        assert_eq!(alloc.outstanding(), 0);
    }

    #[test]
    fn non_utf8_payload_has_no_text_form() {
        let buf = ArgBuffer::unattached(&[0xff, 0xfe][..]);
        assert!(buf.as_utf8().is_none());
    }

    #[test]
    fn debug_omits_payload_bytes() {
        let buf = ArgBuffer::unattached("secret-ish");
        let rendered = format!("{buf:?}");
        assert!(rendered.contains("len"));
        assert!(!rendered.contains("secret"));
    }
}
