use std::sync::{LazyLock, Mutex};

use strata_common::{Result, error::Error};

use crate::{buffer::ArenaBuffer, config::ArenaConfig};

/// Log2 capacity of the smallest size class (1,024 elements).
pub const MIN_CLASS_LOG2: u32 = 10;

/// Log2 capacity of the largest size class (131,072 elements).
pub const MAX_CLASS_LOG2: u32 = 17;

/// Number of size classes per element type.
pub const NUM_CLASSES: usize = (MAX_CLASS_LOG2 - MIN_CLASS_LOG2 + 1) as usize;

/// Returns the log2 capacity of the size class serving a request of `len`
/// elements, or `None` when the request bypasses pooling.
#[inline]
pub fn size_class(len: usize) -> Option<u32> {
    let log2 = len.max(1).next_power_of_two().trailing_zeros();
    (MIN_CLASS_LOG2..=MAX_CLASS_LOG2)
        .contains(&log2)
        .then_some(log2)
}

/// Returns the size class a buffer of the given capacity belongs to, if any.
#[inline]
fn class_of_capacity(capacity: usize) -> Option<u32> {
    if !capacity.is_power_of_two() {
        return None;
    }
    let log2 = capacity.trailing_zeros();
    (MIN_CLASS_LOG2..=MAX_CLASS_LOG2)
        .contains(&log2)
        .then_some(log2)
}

/// A single `(element type, capacity)` pool.
struct SizeClass<T> {
    log2: u32,
    free: Mutex<Vec<Vec<T>>>,
}

impl<T> SizeClass<T> {
    fn new(log2: u32) -> Self {
        SizeClass {
            log2,
            free: Mutex::new(Vec::new()),
        }
    }

    fn take(&self) -> Vec<T> {
        let mut free = self.free.lock().unwrap();
        free.pop()
            .unwrap_or_else(|| Vec::with_capacity(1usize << self.log2))
    }

    /// Pools `buffer` unless the class already retains `max_retained` buffers,
    /// in which case the buffer is handed back.
    fn put(&self, buffer: Vec<T>, max_retained: usize) -> Option<Vec<T>> {
        let mut free = self.free.lock().unwrap();
        if free.len() >= max_retained {
            return Some(buffer);
        }
        free.push(buffer);
        None
    }

    fn pooled(&self) -> usize {
        self.free.lock().unwrap().len()
    }
}

/// Pools of one element type, one per size class.
#[doc(hidden)]
pub struct TypedPools<T> {
    classes: [SizeClass<T>; NUM_CLASSES],
}

impl<T> TypedPools<T> {
    fn new() -> Self {
        TypedPools {
            classes: std::array::from_fn(|i| SizeClass::new(MIN_CLASS_LOG2 + i as u32)),
        }
    }

    fn class(&self, log2: u32) -> &SizeClass<T> {
        &self.classes[(log2 - MIN_CLASS_LOG2) as usize]
    }
}

/// Element types an [`Arena`] can hand out.
pub trait ArenaElement: bytemuck::Pod + Send + Sync + 'static {
    const TYPE_NAME: &'static str;

    #[doc(hidden)]
    fn pools(arena: &Arena) -> &TypedPools<Self>;
}

macro_rules! arena_elements {
    ($($T:ident),* $(,)?) => {
        struct ElementPools {
            $($T: TypedPools<$T>,)*
        }

        impl ElementPools {
            fn new() -> Self {
                ElementPools {
                    $($T: TypedPools::new(),)*
                }
            }
        }

        $(
            impl ArenaElement for $T {
                const TYPE_NAME: &'static str = stringify!($T);

                #[inline]
                fn pools(arena: &Arena) -> &TypedPools<$T> {
                    &arena.pools.$T
                }
            }
        )*
    };
}

arena_elements!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

static GLOBAL: LazyLock<Arena> = LazyLock::new(|| Arena::new(ArenaConfig::default()));

/// Size-classed pool of reusable typed buffers.
///
/// # Thread Safety
///
/// Every `(type, class)` pool sits behind its own mutex, so concurrent `alloc`
/// and `free` calls never corrupt pool state. A buffer returned by `alloc` is
/// owned by exactly one caller until it is freed.
pub struct Arena {
    config: ArenaConfig,
    pools: ElementPools,
    #[cfg(any(test, feature = "debug-arena"))]
    tracker: crate::tracker::Tracker,
}

impl Arena {
    /// Creates an arena with the given configuration.
    pub fn new(config: ArenaConfig) -> Self {
        Arena {
            config,
            pools: ElementPools::new(),
            #[cfg(any(test, feature = "debug-arena"))]
            tracker: crate::tracker::Tracker::new(),
        }
    }

    /// Creates an arena after validating `config`.
    pub fn try_new(config: ArenaConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|message| Error::invalid_arg("config", message))?;
        Ok(Self::new(config))
    }

    /// Returns the process-wide arena.
    pub fn global() -> &'static Arena {
        &GLOBAL
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Returns an empty vector whose capacity is at least `len`.
    ///
    /// Requests between 1,024 and 131,072 elements are served from the matching
    /// size class and have exactly the class capacity. Other requests are
    /// allocated directly.
    pub fn alloc<T: ArenaElement>(&self, len: usize) -> Vec<T> {
        self.alloc_with_ticket(len).0
    }

    /// [`alloc`](Self::alloc), also returning the tracker ticket of the
    /// allocation (zero when tracking is off).
    fn alloc_with_ticket<T: ArenaElement>(&self, len: usize) -> (Vec<T>, u64) {
        let buffer = match size_class(len) {
            Some(log2) => T::pools(self).class(log2).take(),
            None => Vec::with_capacity(len),
        };
        #[cfg(any(test, feature = "debug-arena"))]
        let ticket = self
            .tracker
            .on_alloc(buffer.as_ptr() as usize, buffer.capacity());
        #[cfg(not(any(test, feature = "debug-arena")))]
        let ticket = 0;
        (buffer, ticket)
    }

    /// Returns a vector obtained from [`alloc`](Self::alloc) to its pool.
    ///
    /// The vector must not be used after this call. Vectors whose capacity does
    /// not match a size class are dropped.
    pub fn free<T: ArenaElement>(&self, mut buffer: Vec<T>) {
        #[cfg(any(test, feature = "debug-arena"))]
        let addr = buffer.as_ptr() as usize;
        #[cfg(any(test, feature = "debug-arena"))]
        self.tracker.on_free(addr, buffer.capacity(), T::TYPE_NAME);

        buffer.clear();
        let rejected = match class_of_capacity(buffer.capacity()) {
            Some(log2) => {
                let rejected = T::pools(self)
                    .class(log2)
                    .put(buffer, self.config.max_retained_per_class);
                if rejected.is_some() {
                    log::trace!(
                        "arena: {} class 2^{log2} is full, releasing buffer",
                        T::TYPE_NAME
                    );
                }
                rejected
            }
            None => Some(buffer),
        };

        // The record must go before the storage does, another thread may be
        // handed the same address right after the drop.
        if let Some(buffer) = rejected {
            #[cfg(any(test, feature = "debug-arena"))]
            self.tracker.forget(addr);
            drop(buffer);
        }
    }

    /// Forgets a buffer whose storage was reallocated, and so released, while it
    /// was borrowed through an [`ArenaBuffer`].
    pub(crate) fn discard(&self, _addr: usize, _ticket: u64) {
        #[cfg(any(test, feature = "debug-arena"))]
        self.tracker.on_discard(_addr, _ticket);
    }

    /// Allocates a buffer that returns itself to this arena when dropped.
    pub fn buffer<T: ArenaElement>(&self, len: usize) -> ArenaBuffer<'_, T> {
        let (buffer, ticket) = self.alloc_with_ticket(len);
        ArenaBuffer::new(self, buffer, ticket)
    }

    /// Allocates a buffer of `len` zeroed elements.
    pub fn zeroed<T: ArenaElement>(&self, len: usize) -> ArenaBuffer<'_, T> {
        let mut buffer = self.buffer::<T>(len);
        buffer.resize(len, T::zeroed());
        buffer
    }

    /// Number of free buffers currently pooled per size class for type `T`,
    /// smallest class first.
    pub fn pooled<T: ArenaElement>(&self) -> [usize; NUM_CLASSES] {
        let pools = T::pools(self);
        std::array::from_fn(|i| pools.classes[i].pooled())
    }

    /// Allocation counters of the provenance tracker.
    #[cfg(any(test, feature = "debug-arena"))]
    pub fn tracker_stats(&self) -> crate::tracker::TrackerStats {
        self.tracker.stats()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(ArenaConfig::default())
    }
}
