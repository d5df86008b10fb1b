use std::collections::BTreeSet;

use strata_encodings::{Analysis, IntegerValue, KernelLevel, Kernels};

/// Straightforward analysis used as the reference for every kernel level.
fn naive_analysis<T: IntegerValue>(values: &[T]) -> Analysis<T> {
    let Some(&first) = values.first() else {
        return Analysis::default();
    };
    let min = values.iter().copied().min().unwrap();
    let max = values.iter().copied().max().unwrap();
    let run_count = 1 + values.windows(2).filter(|w| w[0] != w[1]).count();
    let delta = match values.get(1) {
        Some(&second) => {
            let step = second.wrapping_sub(&first);
            if values.windows(2).all(|w| w[1].wrapping_sub(&w[0]) == step) {
                step
            } else {
                T::zero()
            }
        }
        None => T::zero(),
    };
    Analysis {
        min,
        max,
        delta,
        run_count,
    }
}

fn kernel_sets() -> Vec<Kernels> {
    [KernelLevel::Portable, KernelLevel::Avx2]
        .into_iter()
        .filter_map(Kernels::with_level)
        .collect()
}

fn lengths(rng: &mut fastrand::Rng) -> Vec<usize> {
    let mut lengths = vec![0, 1, 2, 31, 32, 33, 63, 64, 65, 127, 128, 129];
    lengths.extend((0..6).map(|_| rng.usize(1..3000)));
    lengths
}

fn check_analysis<T: IntegerValue>(
    rng: &mut fastrand::Rng,
    gen_value: impl Fn(&mut fastrand::Rng) -> T,
) {
    for len in lengths(rng) {
        let random: Vec<T> = (0..len).map(|_| gen_value(rng)).collect();
        let sorted_runs = {
            let mut v = random.clone();
            v.sort();
            v
        };
        let progression: Vec<T> = (0..len)
            .map(|i| T::from_acc(-5 + 3 * i as i64))
            .collect();
        for values in [&random, &sorted_runs, &progression] {
            let expected = naive_analysis(values);
            for kernels in kernel_sets() {
                assert_eq!(
                    kernels.analyze(values),
                    expected,
                    "{:?} len {len}",
                    kernels.level()
                );
            }
        }
    }
}

#[test]
fn test_analysis_matches_reference() {
    let mut rng = fastrand::Rng::with_seed(21);
    check_analysis::<i8>(&mut rng, |r| r.i8(-3..3));
    check_analysis::<u8>(&mut rng, |r| r.u8(..));
    check_analysis::<i16>(&mut rng, |r| r.i16(..));
    check_analysis::<u32>(&mut rng, |r| r.u32(..8));
    check_analysis::<i64>(&mut rng, |r| r.i64(..));
    check_analysis::<u64>(&mut rng, |r| r.u64(u64::MAX - 4..));
}

#[test]
fn test_dictionary_matches_reference() {
    let mut rng = fastrand::Rng::with_seed(22);
    for distinct in [1usize, 2, 5, 100, 4000, 65_535] {
        let pool: Vec<i64> = (0..distinct).map(|i| i as i64 * 7919 - 1_000_000).collect();
        let len = distinct.max(rng.usize(1..20_000));
        // Every distinct value appears at least once.
        let mut values: Vec<i64> = pool.clone();
        values.extend((distinct..len).map(|_| pool[rng.usize(..distinct)]));
        rng.shuffle(&mut values);

        let expected: Vec<i64> = values
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut outputs = Vec::new();
        for kernels in kernel_sets() {
            let dict = kernels.build_dictionary(&values, distinct).unwrap();
            assert_eq!(dict.values, expected, "{:?}", kernels.level());
            assert_eq!(dict.len(), distinct);
            for (row, &code) in dict.codes.iter().enumerate() {
                assert_eq!(dict.values[code as usize], values[row]);
            }
            outputs.push(dict);
        }
        assert!(outputs.windows(2).all(|w| w[0] == w[1]));
    }
}

#[test]
fn test_float_dictionary_matches_reference() {
    let mut rng = fastrand::Rng::with_seed(24);
    for distinct in [1usize, 3, 700, 20_000] {
        let mut pool: Vec<f64> = (0..distinct)
            .map(|i| (i as f64 - distinct as f64 / 2.0) * 0.37)
            .collect();
        pool[0] = -0.0;
        if distinct > 2 {
            pool[1] = f64::NAN;
            pool[2] = f64::NEG_INFINITY;
        }
        let mut values = pool.clone();
        values.extend((0..rng.usize(1..10_000)).map(|_| pool[rng.usize(..distinct)]));
        rng.shuffle(&mut values);

        let mut expected = pool.clone();
        expected.sort_by(f64::total_cmp);
        let expected_bits: Vec<u64> = expected.iter().map(|v| v.to_bits()).collect();

        let mut outputs = Vec::new();
        for kernels in kernel_sets() {
            let dict = kernels.build_dictionary(&values, distinct).unwrap();
            let bits: Vec<u64> = dict.values.iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits, expected_bits, "{:?}", kernels.level());
            for (row, &code) in dict.codes.iter().enumerate() {
                assert_eq!(dict.values[code as usize].to_bits(), values[row].to_bits());
            }
            outputs.push((bits, dict.codes));
        }
        assert!(outputs.windows(2).all(|w| w[0] == w[1]));

        let narrow: Vec<f32> = values.iter().map(|&v| v as f32).collect();
        let sets: Vec<_> = kernel_sets()
            .iter()
            .map(|k| k.build_dictionary(&narrow, distinct).unwrap().codes)
            .collect();
        assert!(sets.windows(2).all(|w| w[0] == w[1]));
    }
}

#[test]
fn test_dictionary_with_misleading_hint() {
    let values: Vec<u32> = (0..50_000).map(|i| (i * 31) % 3000).collect();
    for kernels in kernel_sets() {
        for hint in [0, 1, 3000, 100_000] {
            let dict = kernels.build_dictionary(&values, hint).unwrap();
            assert_eq!(dict.len(), 3000);
            assert!(dict.values.windows(2).all(|w| w[0] < w[1]));
        }
    }
}

#[test]
fn test_too_many_distinct_values() {
    let values: Vec<u32> = (0..70_000).collect();
    for kernels in kernel_sets() {
        let err = kernels.build_dictionary(&values, 70_000).unwrap_err();
        assert!(err.to_string().starts_with("invalid argument"));
    }
}

#[test]
fn test_word_kernels_match() {
    let mut rng = fastrand::Rng::with_seed(23);
    let sets = kernel_sets();
    for len in lengths(&mut rng) {
        let values: Vec<u64> = (0..len)
            .map(|i| match (i / 50) % 4 {
                0 => 0,
                1 => 1,
                2 => {
                    let bits = rng.u32(1..60);
                    rng.u64(..1 << bits)
                }
                _ => rng.u64(..16),
            })
            .collect();
        let mut words = Vec::new();
        strata_encodings::bitpack::encode(&values, &mut words).unwrap();
        for kernels in &sets {
            assert_eq!((kernels.count_words)(&words), len);
            let mut out = Vec::new();
            (kernels.unpack_words)(&words, &mut out);
            assert_eq!(out, values, "{:?} len {len}", kernels.level());
        }
    }
}
