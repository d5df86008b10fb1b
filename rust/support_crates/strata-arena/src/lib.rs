//! Size-classed pools of reusable typed buffers.
//!
//! Every codec in the encoding engine borrows its scratch memory from an
//! [`Arena`]. Buffers are grouped by element type and by power-of-two capacity
//! (2^10 through 2^17 elements); each `(type, class)` pair is an independent
//! thread-safe pool. Requests outside the class range are served by a plain
//! allocation and are never pooled.
//!
//! ```rust
//! use strata_arena::Arena;
//!
//! let arena = Arena::global();
//! let mut scratch = arena.buffer::<u64>(3000);
//! assert!(scratch.capacity() >= 3000);
//! scratch.extend_from_slice(&[1, 2, 3]);
//! // returned to the 4096-element u64 pool on drop
//! ```
//!
//! With the `debug-arena` feature (always enabled for this crate's own tests) the
//! arena keeps a provenance map of every buffer it handed out and panics on
//! double free or free without alloc.

mod arena;
mod buffer;
mod config;
#[cfg(any(test, feature = "debug-arena"))]
mod tracker;

#[cfg(test)]
mod tests;

pub use arena::{
    Arena, ArenaElement, MAX_CLASS_LOG2, MIN_CLASS_LOG2, NUM_CLASSES, size_class,
};
pub use buffer::ArenaBuffer;
pub use config::ArenaConfig;
#[cfg(any(test, feature = "debug-arena"))]
pub use tracker::TrackerStats;
