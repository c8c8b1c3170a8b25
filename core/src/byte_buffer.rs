//! Circular byte buffer with independent push and pop positions.
//!
//! Gives a queue of bytes a fixed memory footprint with no allocation. Once
//! the buffer fills up, new data wraps around and overwrites unread bytes,
//! so the size has to be picked generously enough for the use case.

/// Fixed-capacity circular byte queue.
pub struct ByteBuffer<const N: usize> {
    buffer: [u8; N],
    write: usize,
    read: usize,
}

impl<const N: usize> ByteBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            write: 0,
            read: 0,
        }
    }

    /// Appends a byte, silently overwriting the oldest unread byte when the
    /// buffer is full.
    pub fn push(&mut self, value: u8) {
        self.buffer[self.write] = value;
        self.write += 1;
        if self.write == N {
            self.write = 0;
        }
    }

    /// The byte `pop` would return next. Only meaningful when the buffer is
    /// not empty.
    pub fn peek(&self) -> u8 {
        self.buffer[self.read]
    }

    /// Removes and returns the oldest byte. Only meaningful when the buffer
    /// is not empty.
    pub fn pop(&mut self) -> u8 {
        let result = self.buffer[self.read];
        self.read += 1;
        if self.read == N {
            self.read = 0;
        }
        result
    }

    pub fn is_empty(&self) -> bool {
        self.write == self.read
    }
}

impl<const N: usize> Default for ByteBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
