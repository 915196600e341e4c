//! Range visitor
//!
//! Receives `(key, value)` pairs from a scan in ascending key order.

/// Callback for range scans
pub trait Visitor {
    /// Called once per entry; `key` is 8 big-endian bytes, `value` is 4096 bytes
    fn visit(&mut self, key: &[u8], value: &[u8]);
}

impl<F> Visitor for F
where
    F: FnMut(&[u8], &[u8]),
{
    fn visit(&mut self, key: &[u8], value: &[u8]) {
        self(key, value)
    }
}
