//! Reference kernels. Every accelerated kernel must agree with these.

use strata_common::Result;

use crate::{
    analyze::{Analysis, Scan},
    bitpack::{unpack_word, word_count},
    dictionary::{self, Dictionary, HashTable},
    value::{DictionaryValue, IntegerValue},
    zigzag::zigzag_decode,
};

pub fn unpack_words(words: &[u64], out: &mut Vec<u64>) {
    for &word in words {
        unpack_word(word, out);
    }
}

pub fn count_words(words: &[u64]) -> usize {
    words.iter().map(|&word| word_count(word)).sum()
}

pub fn delta_decode(data: &mut [u64]) {
    for i in 1..data.len() {
        data[i] = data[i].wrapping_add(data[i - 1]);
    }
}

pub fn zigzag_delta_decode(data: &mut [u64]) {
    for i in 1..data.len() {
        data[i] = data[i - 1].wrapping_add(zigzag_decode(data[i]) as u64);
    }
}

pub fn analyze<T: IntegerValue>(values: &[T]) -> Analysis<T> {
    let Some((mut scan, rest)) = Scan::start(values) else {
        return Analysis::default();
    };
    for &v in rest {
        scan.push(v);
    }
    scan.finish()
}

pub fn build_dictionary<T: DictionaryValue>(
    values: &[T],
    cardinality_hint: usize,
) -> Result<Dictionary<T>> {
    dictionary::build_with(values, cardinality_hint, insert_all)
}

pub(crate) fn insert_all<T: DictionaryValue>(
    table: &mut HashTable<'_, T>,
    values: &[T],
) -> Result<()> {
    for &v in values {
        table.insert(v, dictionary::hash_slot(v))?;
    }
    Ok(())
}
