//! The shared, exhaustible supply of ports handed out to scan workers.
use std::sync::atomic::{AtomicU32, Ordering};

/// Hands out every port of an inclusive range exactly once, in ascending
/// order, to any number of concurrent readers.
///
/// The cursor is the only state shared between workers. It is advanced with
/// a single atomic read-modify-write, so two readers can never observe the
/// same port, and it stops one past `end` so an exhausted source keeps
/// answering `None` without wrapping around.
///
/// ```rust
/// # use portsweep::port_source::PortSource;
/// let source = PortSource::new(8000, 8002);
/// assert_eq!(source.next_port(), Some(8000));
/// assert_eq!(source.iter().collect::<Vec<_>>(), vec![8001, 8002]);
/// assert_eq!(source.next_port(), None);
/// ```
#[derive(Debug)]
pub struct PortSource {
    cursor: AtomicU32,
    end: u32,
}

impl PortSource {
    /// Creates a source for `start..=end`. A reversed range yields nothing.
    pub fn new(start: u16, end: u16) -> Self {
        Self {
            cursor: AtomicU32::new(u32::from(start)),
            end: u32::from(end),
        }
    }

    /// Takes the next port, or `None` once the range is exhausted.
    pub fn next_port(&self) -> Option<u16> {
        let end = self.end;
        self.cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cursor| {
                (cursor <= end).then_some(cursor + 1)
            })
            .ok()
            .and_then(|port| u16::try_from(port).ok())
    }

    /// Number of ports not yet handed out.
    pub fn remaining(&self) -> usize {
        let cursor = self.cursor.load(Ordering::Relaxed);
        (self.end + 1).saturating_sub(cursor) as usize
    }

    /// Drains the source lazily. Safe to call from several threads at once;
    /// each port still goes to exactly one caller.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        std::iter::from_fn(move || self.next_port())
    }
}
