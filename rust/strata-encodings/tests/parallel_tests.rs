use rayon::prelude::*;
use strata_arena::Arena;
use strata_encodings::codecs::{float, integer, time};

fn block_values(seed: u64) -> Vec<i64> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let len = rng.usize(1..20_000);
    match seed % 3 {
        0 => vec![rng.i64(..); len],
        1 => (0..len as i64).map(|i| i * 1_000 + rng.i64(0..10)).collect(),
        _ => (0..len).map(|_| rng.i64(..)).collect(),
    }
}

/// Many blocks encoded and decoded concurrently, all borrowing scratch space
/// from the global arena. The debug tracker panics on any double free.
#[test]
fn test_parallel_codecs_share_the_arena() {
    let live_before = Arena::global().tracker_stats().live;

    (0..256u64).into_par_iter().for_each(|seed| {
        let values = block_values(seed);

        let mut block = Vec::new();
        integer::encode(&values, &mut block).unwrap();
        let mut decoded = vec![0i64; values.len()];
        integer::decode_into(&block, &mut decoded).unwrap();
        assert_eq!(decoded, values, "integer seed {seed}");

        block.clear();
        time::encode(&values, &mut block).unwrap();
        let mut decoded = Vec::new();
        time::decode(&block, &mut decoded).unwrap();
        assert_eq!(decoded, values, "time seed {seed}");

        let floats: Vec<f64> = values.iter().map(|&v| v as f64 / 7.0).collect();
        block.clear();
        float::encode(&floats, &mut block).unwrap();
        let mut decoded = Vec::<f64>::new();
        float::decode(&block, &mut decoded).unwrap();
        assert_eq!(decoded, floats, "float seed {seed}");
    });

    let stats = Arena::global().tracker_stats();
    assert_eq!(stats.live, live_before);
    assert!(stats.frees > 0);
}
