//! Read-ahead buffer with incremental line scanning.

use crate::Result;

/// Bytes fetched from a volume but not yet returned to the caller.
///
/// `scanned_to` remembers how much of the pending bytes a line search has
/// already covered without finding a newline, so repeated line reads over an
/// unterminated buffer only scan newly fetched bytes.
#[derive(Debug, Default)]
pub(crate) struct ReadBuffer {
    data: Vec<u8>,
    start: usize,
    scanned_to: usize,
}

impl ReadBuffer {
    /// Number of pending bytes.
    pub(crate) fn len(&self) -> usize {
        self.data.len() - self.start
    }

    /// Drops all pending bytes and the scan marker.
    pub(crate) fn clear(&mut self) {
        self.data.clear();
        self.start = 0;
        self.scanned_to = 0;
    }

    /// Appends up to `max` bytes produced by `read`, returning how many arrived.
    pub(crate) fn fill_from<F>(&mut self, max: usize, read: F) -> Result<usize>
    where
        F: FnOnce(&mut [u8]) -> Result<usize>,
    {
        if self.start > 0 && self.start >= self.data.len() / 2 {
            self.data.drain(..self.start);
            self.start = 0;
        }
        let old_len = self.data.len();
        self.data.resize(old_len + max, 0);
        match read(&mut self.data[old_len..]) {
            Ok(n) => {
                self.data.truncate(old_len + n);
                Ok(n)
            }
            Err(e) => {
                self.data.truncate(old_len);
                Err(e)
            }
        }
    }

    /// Removes and returns the next chunk if the pending bytes satisfy the request.
    ///
    /// In line mode the chunk ends just after the first newline. With a
    /// `limit`, the chunk is cut at `limit` bytes if that comes first. Returns
    /// `None` when more bytes are needed.
    pub(crate) fn take(&mut self, limit: Option<usize>, line: bool) -> Option<Vec<u8>> {
        let pending = &self.data[self.start..];
        let mut end = None;

        if line {
            match pending[self.scanned_to..].iter().position(|&b| b == b'\n') {
                Some(i) => end = Some(self.scanned_to + i + 1),
                None => self.scanned_to = pending.len(),
            }
        }
        if let Some(n) = limit {
            if pending.len() >= n && end.is_none_or(|e| n < e) {
                end = Some(n);
            }
        }

        let end = end?;
        let chunk = pending[..end].to_vec();
        self.consume(end);
        Some(chunk)
    }

    /// Removes and returns every pending byte.
    pub(crate) fn take_all(&mut self) -> Vec<u8> {
        let chunk = self.data[self.start..].to_vec();
        self.clear();
        chunk
    }

    fn consume(&mut self, n: usize) {
        self.start += n;
        self.scanned_to = self.scanned_to.saturating_sub(n);
        if self.start == self.data.len() {
            self.data.clear();
            self.start = 0;
        }
    }
}
