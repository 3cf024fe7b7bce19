use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use crate::buffer::ArgBuffer;

/// Hands out counted [`ArgBuffer`]s and tracks how many are still live.
///
/// The allocator is a cheap handle; clone it freely, all clones share the
/// same outstanding-buffer gauge. The gauge is what leak tests assert
/// against: after any failed build it must read the same value it did
/// before the buffers were acquired.
#[derive(Clone, Debug, Default)]
pub struct BufferAllocator {
    outstanding: Arc<AtomicUsize>,
}

impl BufferAllocator {
    /// Create an allocator with a zeroed gauge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a payload in a counted buffer.
    pub fn acquire(&self, payload: impl Into<Bytes>) -> ArgBuffer {
        ArgBuffer::attached(payload.into(), Arc::clone(&self.outstanding))
    }

    /// Number of buffers acquired from this allocator and not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_tracks_acquire_and_release() {
        let alloc = BufferAllocator::new();
        assert_eq!(alloc.outstanding(), 0);

        let a = alloc.acquire("one");
        let b = alloc.acquire("two");
        assert_eq!(alloc.outstanding(), 2);

        drop(a);
        assert_eq!(alloc.outstanding(), 1);
        drop(b);
        assert_eq!(alloc.outstanding(), 0);
    }

    #[test]
    fn clones_share_the_gauge() {
        let alloc = BufferAllocator::new();
        let view = alloc.clone();

        let buf = alloc.acquire("payload");
        assert_eq!(view.outstanding(), 1);
        drop(buf);
        assert_eq!(view.outstanding(), 0);
    }

    #[test]
    fn unattached_buffers_do_not_count() {
        let alloc = BufferAllocator::new();
        let buf = ArgBuffer::unattached("free");
        assert_eq!(alloc.outstanding(), 0);
        drop(buf);
        assert_eq!(alloc.outstanding(), 0);
    }
}
