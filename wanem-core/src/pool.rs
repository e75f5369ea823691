use bytes::BytesMut;

/// Number of buffers allocated whenever the pool runs dry.
pub(crate) const BATCH_SIZE: usize = 16;

/// A pool of reusable datagram buffers, each of capacity `max_packet_size`.
///
/// Growth is append-only: the pool allocates a batch whenever it is empty
/// and never shrinks. Buffers keep their full length for the lifetime of
/// the pool; the valid payload length of a datagram is tracked by the
/// packet group borrowing the buffer, so releasing a buffer never copies
/// or zeroes memory.
#[derive(Debug)]
pub(crate) struct BufferPool {
    free: Vec<BytesMut>,
    capacity: usize,
    allocated: usize,
}

impl BufferPool {
    /// Creates a pool and pre-allocates one batch.
    pub(crate) fn new(capacity: usize) -> Self {
        let mut pool = Self { free: Vec::new(), capacity, allocated: 0 };
        pool.allocate_batch();
        pool
    }

    fn allocate_batch(&mut self) {
        for _ in 0..BATCH_SIZE {
            self.free.push(BytesMut::zeroed(self.capacity));
        }
        self.allocated += BATCH_SIZE;
    }

    /// Takes a full-length buffer out of the pool, growing it if needed.
    pub(crate) fn acquire(&mut self) -> BytesMut {
        if self.free.is_empty() {
            self.allocate_batch();
        }
        self.free.pop().expect("pool replenished by allocate_batch")
    }

    /// Returns a buffer to the pool.
    ///
    /// Releasing a buffer that did not come from this pool, or releasing
    /// one twice, is a programming error; the ownership discipline of the
    /// packet path prevents both by construction.
    pub(crate) fn release(&mut self, buf: BytesMut) {
        self.free.push(buf);
    }

    /// Total number of buffers ever allocated.
    pub(crate) fn allocated(&self) -> usize {
        self.allocated
    }

    /// Number of buffers currently free.
    pub(crate) fn available(&self) -> usize {
        self.free.len()
    }
}
