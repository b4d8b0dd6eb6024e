//! Fixed-capacity receive ring buffer shared between the serial receive
//! context (single writer) and the control loop (snapshot reader).
//!
//! The buffer never blocks and never takes a lock. When the writer laps the
//! buffer the oldest byte is overwritten. Readers do not track a read cursor;
//! they copy the whole storage with [`RingBuffer::snapshot`] and re-decode it
//! every cycle, so a snapshot that spans two producer writes only costs one
//! stale or missed command.
//!
//! # Example
//!
//! ```
//! use quad_proto::RingBuffer;
//!
//! static RX: RingBuffer<10> = RingBuffer::new();
//!
//! let producer = RX.producer().unwrap();
//! for &b in &[0x23, 0x64, 0x04, 0x2F] {
//!     producer.push(b);
//! }
//! assert_eq!(&RX.snapshot()[..4], &[0x23, 0x64, 0x04, 0x2F]);
//! ```

use portable_atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

/// Default receive buffer capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 10;

/// Lock-free circular byte store with wraparound-on-overflow semantics.
///
/// Storage is a plain array of atomic bytes so a `static` instance is `Sync`
/// without `unsafe`. Only load/store operations are used on the hot path,
/// which keeps it usable on cores without compare-and-swap.
pub struct RingBuffer<const N: usize = DEFAULT_CAPACITY> {
    bytes: [AtomicU8; N],
    /// Index of the next slot the producer writes.
    write: AtomicUsize,
    producer_taken: AtomicBool,
}

impl<const N: usize> RingBuffer<N> {
    const NON_EMPTY: () = assert!(N > 0, "ring buffer capacity must be non-zero");

    /// Create an empty (zero-filled) buffer.
    #[must_use]
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::NON_EMPTY;
        Self {
            bytes: [const { AtomicU8::new(0) }; N],
            write: AtomicUsize::new(0),
            producer_taken: AtomicBool::new(false),
        }
    }

    /// Buffer capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Claim the single writer handle for this buffer.
    ///
    /// Returns `None` if a producer has already been handed out.
    pub fn producer(&self) -> Option<Producer<'_, N>> {
        if self.producer_taken.swap(true, Ordering::AcqRel) {
            warn!("ring buffer producer already claimed");
            return None;
        }
        Some(Producer { ring: self })
    }

    /// Copy the storage as it is currently laid out in memory.
    ///
    /// The copy is not atomic as a whole: bytes written by the producer while
    /// the copy runs may or may not be included.
    #[must_use]
    pub fn snapshot(&self) -> [u8; N] {
        let mut out = [0u8; N];
        for (dst, src) in out.iter_mut().zip(self.bytes.iter()) {
            *dst = src.load(Ordering::Relaxed);
        }
        out
    }

    /// Index the producer will write next.
    #[inline]
    #[must_use]
    pub fn write_index(&self) -> usize {
        self.write.load(Ordering::Acquire)
    }

    fn store(&self, byte: u8) {
        // Single writer: the cursor is only ever stored from `Producer`.
        let idx = self.write.load(Ordering::Relaxed);
        self.bytes[idx].store(byte, Ordering::Relaxed);
        self.write.store((idx + 1) % N, Ordering::Release);
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer handle bound to one [`RingBuffer`].
///
/// Handed to the serial receive path at registration time; there is at most
/// one per buffer.
pub struct Producer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<const N: usize> Producer<'_, N> {
    /// Append one byte, overwriting the oldest byte once the buffer is full.
    #[inline]
    pub fn push(&self, byte: u8) {
        self.ring.store(byte);
    }

    /// Append every byte of `data` in order.
    pub fn push_slice(&self, data: &[u8]) {
        for &b in data {
            self.ring.store(b);
        }
    }
}
