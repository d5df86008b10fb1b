use strata_common::Result;

use super::{word_count, word_value_at};

/// Random access over a packed word stream.
///
/// Keeps the cumulative value count at the end of every word, so the value at
/// a logical position is found by a binary search over words instead of
/// decoding everything before it. The index holds nothing that cannot be
/// rebuilt from the words.
#[derive(Debug, Clone)]
pub struct PackedIndex {
    words: Vec<u64>,
    /// `ends[i]` is the number of values in `words[..=i]`.
    ends: Vec<usize>,
}

impl PackedIndex {
    pub fn build(words: Vec<u64>) -> Self {
        let ends = words
            .iter()
            .scan(0usize, |total, &word| {
                *total += word_count(word);
                Some(*total)
            })
            .collect();
        PackedIndex { words, ends }
    }

    /// Builds an index over big-endian words as written by
    /// [`encode_to_bytes`](super::encode_to_bytes).
    pub fn from_bytes(src: &[u8]) -> Result<Self> {
        let words = super::read_words(src)?;
        Ok(Self::build(words.to_vec()))
    }

    /// Total number of values.
    pub fn len(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Returns the value at logical position `pos`, or `None` past the end.
    pub fn value_at(&self, pos: usize) -> Option<u64> {
        let word_idx = self.ends.partition_point(|&end| end <= pos);
        let word = *self.words.get(word_idx)?;
        let word_start = if word_idx == 0 {
            0
        } else {
            self.ends[word_idx - 1]
        };
        Some(word_value_at(word, pos - word_start))
    }
}
