//! Provenance tracking for test builds.
//!
//! Records every buffer handed out by an arena, keyed by the address of its
//! storage, and turns double frees and frees of foreign buffers into panics.
//! Each allocation also gets a ticket, so a record can be dropped by the owner
//! that created it even after the address was handed to someone else.
//! Concurrent use of one live buffer by two owners is not detected.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provenance {
    Live,
    Released,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    state: Provenance,
    ticket: u64,
}

/// Identifies one allocation. Zero means the allocation was not recorded.
pub(crate) type Ticket = u64;

/// Counters reported by [`Arena::tracker_stats`](crate::Arena::tracker_stats).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerStats {
    pub allocs: usize,
    pub frees: usize,
    /// Buffers currently owned by callers.
    pub live: usize,
}

pub(crate) struct Tracker {
    entries: Mutex<HashMap<usize, Entry>>,
    next_ticket: AtomicU64,
    allocs: AtomicUsize,
    frees: AtomicUsize,
}

impl Tracker {
    pub fn new() -> Self {
        Tracker {
            entries: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(1),
            allocs: AtomicUsize::new(0),
            frees: AtomicUsize::new(0),
        }
    }

    pub fn on_alloc(&self, addr: usize, capacity: usize) -> Ticket {
        if capacity == 0 {
            return 0;
        }
        self.allocs.fetch_add(1, Ordering::Relaxed);
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        // A live entry at this address belonged to a vector that was dropped
        // or reallocated instead of freed; its storage has been reused.
        self.entries.lock().unwrap().insert(
            addr,
            Entry {
                state: Provenance::Live,
                ticket,
            },
        );
        ticket
    }

    pub fn on_free(&self, addr: usize, capacity: usize, type_name: &str) {
        if capacity == 0 {
            return;
        }
        let previous = {
            let mut entries = self.entries.lock().unwrap();
            entries.get_mut(&addr).map(|entry| {
                let previous = entry.state;
                entry.state = Provenance::Released;
                previous
            })
        };
        match previous {
            Some(Provenance::Live) => {
                self.frees.fetch_add(1, Ordering::Relaxed);
            }
            Some(Provenance::Released) => Self::fail(format!(
                "double free of {type_name} buffer {addr:#x} (capacity {capacity})"
            )),
            None => Self::fail(format!(
                "free without alloc of {type_name} buffer {addr:#x} (capacity {capacity})"
            )),
        }
    }

    /// Drops the record of a live buffer whose storage the owner reallocated.
    /// Counts as a free.
    ///
    /// The old storage went back to the system allocator during the
    /// reallocation, so the address may already be recorded for another
    /// buffer; only the entry carrying `ticket` is removed.
    pub fn on_discard(&self, addr: usize, ticket: Ticket) {
        if ticket == 0 {
            return;
        }
        {
            let mut entries = self.entries.lock().unwrap();
            if entries.get(&addr).is_some_and(|entry| entry.ticket == ticket) {
                entries.remove(&addr);
            }
        }
        self.frees.fetch_add(1, Ordering::Relaxed);
    }

    /// Drops the record of a released buffer whose storage went back to the
    /// system allocator, so a later allocation may reuse the address.
    pub fn forget(&self, addr: usize) {
        self.entries.lock().unwrap().remove(&addr);
    }

    pub fn stats(&self) -> TrackerStats {
        let live = self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|entry| entry.state == Provenance::Live)
            .count();
        TrackerStats {
            allocs: self.allocs.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            live,
        }
    }

    #[cold]
    fn fail(message: String) -> ! {
        log::error!("arena: {message}");
        panic!("arena: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_free_cycle() {
        let tracker = Tracker::new();
        tracker.on_alloc(0x1000, 1024);
        tracker.on_free(0x1000, 1024, "u64");
        tracker.on_alloc(0x1000, 1024);
        tracker.on_free(0x1000, 1024, "u64");
        assert_eq!(
            tracker.stats(),
            TrackerStats {
                allocs: 2,
                frees: 2,
                live: 0
            }
        );
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn test_double_free_panics() {
        let tracker = Tracker::new();
        tracker.on_alloc(0x2000, 2048);
        tracker.on_free(0x2000, 2048, "i32");
        tracker.on_free(0x2000, 2048, "i32");
    }

    #[test]
    #[should_panic(expected = "free without alloc")]
    fn test_foreign_free_panics() {
        let tracker = Tracker::new();
        tracker.on_free(0x3000, 1024, "f64");
    }

    #[test]
    fn test_discard_keeps_a_reused_address() {
        let tracker = Tracker::new();
        let grown = tracker.on_alloc(0x5000, 1024);
        // The grown buffer's storage was released and handed out again.
        let other = tracker.on_alloc(0x5000, 1024);
        assert_ne!(grown, other);
        tracker.on_discard(0x5000, grown);
        assert_eq!(tracker.stats().live, 1);
        tracker.on_free(0x5000, 1024, "u32");
        assert_eq!(tracker.stats().live, 0);

        let ticket = tracker.on_alloc(0x6000, 1024);
        tracker.on_discard(0x6000, ticket);
        assert_eq!(tracker.stats().live, 0);
        assert_eq!(tracker.stats().frees, 2);
    }

    #[test]
    fn test_forgotten_address_can_be_reused() {
        let tracker = Tracker::new();
        tracker.on_alloc(0x4000, 100);
        tracker.on_free(0x4000, 100, "u8");
        tracker.forget(0x4000);
        tracker.on_alloc(0x4000, 100);
        assert_eq!(tracker.stats().live, 1);
    }
}
