use std::collections::VecDeque;

/// Keeps the most recent `capacity` bytes of a stream.
///
/// Older bytes are dropped as new ones arrive; `dropped()` reports how many.
#[derive(Debug)]
pub struct OutputBuffer {
    data: VecDeque<u8>,
    capacity: usize,
    dropped: usize,
}

impl OutputBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(capacity.min(8192)),
            capacity,
            dropped: 0,
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        if self.capacity == 0 {
            self.dropped += bytes.len();
            return;
        }

        let bytes = if bytes.len() > self.capacity {
            let skip = bytes.len() - self.capacity;
            self.dropped += skip;
            &bytes[skip..]
        } else {
            bytes
        };

        let overflow = (self.data.len() + bytes.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.data.drain(..overflow);
            self.dropped += overflow;
        }
        self.data.extend(bytes);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Buffered bytes as text, with invalid UTF-8 replaced.
    pub fn contents(&self) -> String {
        let (front, back) = self.data.as_slices();
        let mut bytes = Vec::with_capacity(self.data.len());
        bytes.extend_from_slice(front);
        bytes.extend_from_slice(back);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
