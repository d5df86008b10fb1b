use rayon::prelude::*;

use crate::{Arena, ArenaConfig, MIN_CLASS_LOG2, NUM_CLASSES};

#[test]
fn test_realloc_after_free_has_capacity() {
    let arena = Arena::default();
    for log2 in MIN_CLASS_LOG2..MIN_CLASS_LOG2 + NUM_CLASSES as u32 {
        let len = (1usize << log2) - 7;
        let buffer = arena.alloc::<u32>(len);
        arena.free(buffer);
        let buffer = arena.alloc::<u32>(len);
        assert!(buffer.capacity() >= len);
        assert!(buffer.is_empty());
        arena.free(buffer);
    }
    assert_eq!(arena.pooled::<u32>(), [1; NUM_CLASSES]);
}

#[test]
fn test_parallel_alloc_free_across_classes() {
    let arena = Arena::new(ArenaConfig::default().with_max_retained_per_class(16));

    (0..256usize).into_par_iter().for_each(|task| {
        for round in 0..32usize {
            let class = (task + round) % NUM_CLASSES;
            let len = (1usize << (MIN_CLASS_LOG2 as usize + class)) - fastrand::usize(0..512);
            let mut ints = arena.alloc::<i64>(len);
            let mut floats = arena.buffer::<f64>(len / 2 + 1);
            assert!(ints.capacity() >= len);
            ints.push(task as i64);
            floats.push(round as f64);
            assert_eq!(ints[0], task as i64);
            assert_eq!(floats[0], round as f64);
            arena.free(ints);
        }
    });

    let stats = arena.tracker_stats();
    assert_eq!(stats.allocs, 256 * 32 * 2);
    assert_eq!(stats.frees, stats.allocs);
    assert_eq!(stats.live, 0);
    assert!(arena.pooled::<i64>().iter().all(|&n| n <= 16));
}

#[test]
fn test_global_arena_is_shared() {
    let a = Arena::global() as *const Arena;
    let b = Arena::global() as *const Arena;
    assert_eq!(a, b);
    let buffer = Arena::global().buffer::<u8>(4096);
    assert_eq!(buffer.capacity(), 4096);
}

#[test]
#[should_panic(expected = "free without alloc")]
fn test_free_of_foreign_buffer_panics() {
    let arena = Arena::default();
    let foreign = Vec::<u64>::with_capacity(1024);
    arena.free(foreign);
}

#[test]
#[should_panic(expected = "free without alloc")]
fn test_free_into_wrong_arena_panics() {
    let first = Arena::default();
    let second = Arena::default();
    let buffer = first.alloc::<i16>(2048);
    second.free(buffer);
}
