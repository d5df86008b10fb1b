use std::{
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
};

use crate::arena::{Arena, ArenaElement};

/// A buffer borrowed from an [`Arena`].
///
/// Dereferences to the underlying `Vec<T>` and returns it to the arena when
/// dropped. The lifetime ties the buffer to the arena it came from. Growing the
/// vector past its capacity is allowed; the reallocated storage is released
/// instead of pooled.
pub struct ArenaBuffer<'a, T: ArenaElement> {
    arena: &'a Arena,
    buffer: Vec<T>,
    /// Storage address at allocation time.
    origin: usize,
    /// Tracker ticket of the allocation.
    ticket: u64,
}

impl<'a, T: ArenaElement> ArenaBuffer<'a, T> {
    pub(crate) fn new(arena: &'a Arena, buffer: Vec<T>, ticket: u64) -> Self {
        let origin = buffer.as_ptr() as usize;
        ArenaBuffer {
            arena,
            buffer,
            origin,
            ticket,
        }
    }

    /// Detaches the vector from the arena. The caller becomes responsible for
    /// handing it back through [`Arena::free`] or dropping it.
    ///
    /// A vector that was reallocated while borrowed is no longer known to the
    /// arena and should simply be dropped.
    pub fn into_vec(self) -> Vec<T> {
        let mut this = ManuallyDrop::new(self);
        let buffer = std::mem::take(&mut this.buffer);
        if buffer.as_ptr() as usize != this.origin {
            this.arena.discard(this.origin, this.ticket);
        }
        buffer
    }
}

impl<T: ArenaElement> Deref for ArenaBuffer<'_, T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl<T: ArenaElement> DerefMut for ArenaBuffer<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl<T: ArenaElement> AsRef<[T]> for ArenaBuffer<'_, T> {
    fn as_ref(&self) -> &[T] {
        &self.buffer
    }
}

impl<T: ArenaElement> Drop for ArenaBuffer<'_, T> {
    fn drop(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        if buffer.as_ptr() as usize != self.origin {
            self.arena.discard(self.origin, self.ticket);
        } else if buffer.capacity() > 0 {
            self.arena.free(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Arena;

    #[test]
    fn test_buffer_returns_on_drop() {
        let arena = Arena::default();
        let mut buffer = arena.buffer::<i64>(1500);
        assert_eq!(0, buffer.len());
        buffer.push(1);
        buffer.push(2);
        buffer.push(3);
        assert_eq!(buffer.as_ref(), [1, 2, 3]);
        assert_eq!(arena.pooled::<i64>()[1], 0);
        drop(buffer);
        assert_eq!(arena.pooled::<i64>()[1], 1);

        let buffer = arena.buffer::<i64>(2000);
        let buffer2 = arena.buffer::<i64>(2000);
        assert_eq!(arena.pooled::<i64>()[1], 0);
        assert_eq!(0, buffer.len());
        assert_eq!(0, buffer2.len());
        drop(buffer);
        drop(buffer2);
        assert_eq!(arena.pooled::<i64>()[1], 2);
    }

    #[test]
    fn test_grown_buffer_is_released() {
        let arena = Arena::default();
        let mut buffer = arena.buffer::<u32>(1024);
        buffer.extend(0..5000);
        drop(buffer);
        assert_eq!(arena.pooled::<u32>()[0], 0);

        let mut unpooled = arena.buffer::<u8>(0);
        unpooled.extend_from_slice(b"grows from nothing");
        drop(unpooled);

        let mut detached = arena.buffer::<u8>(2048);
        detached.resize(10_000, 1);
        let vec = detached.into_vec();
        assert_eq!(vec.len(), 10_000);

        let stats = arena.tracker_stats();
        assert_eq!(stats.live, 0);
    }

    #[test]
    fn test_zeroed_and_detached() {
        let arena = Arena::default();
        let zeroed = arena.zeroed::<u16>(1024);
        assert_eq!(zeroed.len(), 1024);
        assert!(zeroed.iter().all(|&v| v == 0));

        let detached = zeroed.into_vec();
        assert_eq!(arena.pooled::<u16>()[0], 0);
        arena.free(detached);
        assert_eq!(arena.pooled::<u16>()[0], 1);
    }
}
