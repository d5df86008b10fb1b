//! Dictionary coding: a sorted table of distinct values plus a 16-bit code per
//! row.
//!
//! Distinct values are collected in a 64K-slot open-addressed hash table with
//! triangular probing, which visits every slot of a power-of-two table before
//! repeating one. The occupied slots are extracted, sorted, and each slot is
//! relabeled with the rank of its value; a final probe per row emits the codes.
//! Codes therefore depend only on the set of values, not on insertion order,
//! and every builder produces identical output.
//!
//! Integer and float values are both supported. Floats are hashed and matched
//! by bit pattern and sorted by their IEEE total order.

use strata_arena::{Arena, ArenaBuffer};
use strata_common::{Result, error::Error};

use crate::{kernels::Kernels, value::DictionaryValue};

/// Largest number of distinct values a dictionary can hold.
pub const MAX_DISTINCT: usize = u16::MAX as usize;

const TABLE_BITS: u32 = 16;
const TABLE_SIZE: usize = 1 << TABLE_BITS;
const TABLE_MASK: usize = TABLE_SIZE - 1;
const EMPTY: u16 = u16::MAX;

/// Sorted distinct values and the code of every input row.
///
/// `values[codes[i] as usize]` is the `i`-th input value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dictionary<T> {
    pub values: Vec<T>,
    pub codes: Vec<u16>,
}

impl<T: DictionaryValue> Dictionary<T> {
    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of coded rows.
    pub fn rows(&self) -> usize {
        self.codes.len()
    }

    /// Value of row `row`.
    pub fn get(&self, row: usize) -> Option<T> {
        let code = *self.codes.get(row)?;
        self.values.get(code as usize).copied()
    }

    /// Appends the decoded rows to `target`. Fails if a code is out of range.
    pub fn decode(&self, target: &mut Vec<T>) -> Result<()> {
        target.reserve(self.codes.len());
        for (row, &code) in self.codes.iter().enumerate() {
            let value = self.values.get(code as usize).copied().ok_or_else(|| {
                Error::invalid_format(
                    "dictionary codes",
                    format!("code {code} of row {row} exceeds {} values", self.values.len()),
                )
            })?;
            target.push(value);
        }
        Ok(())
    }
}

/// Builds the dictionary of `values` with the process-wide kernels.
///
/// `cardinality_hint` is the expected number of distinct values; the
/// dictionary buffer is sized a little above it. More than [`MAX_DISTINCT`]
/// distinct values is an invalid argument.
pub fn build_dictionary<T: DictionaryValue>(
    values: &[T],
    cardinality_hint: usize,
) -> Result<Dictionary<T>> {
    Kernels::get().build_dictionary(values, cardinality_hint)
}

/// Home slot of `value` (Fibonacci hashing of its key).
#[inline(always)]
pub(crate) fn hash_slot<T: DictionaryValue>(value: T) -> usize {
    (value.key().wrapping_mul(0x9E37_79B9_7F4A_7C15) >> (64 - TABLE_BITS)) as usize
}

/// The probe table. `slots[i]` is [`EMPTY`] or a code, `keys[i]` the value
/// stored in an occupied slot.
pub(crate) struct HashTable<'a, T: DictionaryValue> {
    slots: ArenaBuffer<'a, u16>,
    keys: ArenaBuffer<'a, T>,
    distinct: usize,
}

impl<'a, T: DictionaryValue> HashTable<'a, T> {
    fn new(arena: &'a Arena) -> Self {
        let mut slots = arena.buffer::<u16>(TABLE_SIZE);
        slots.resize(TABLE_SIZE, EMPTY);
        HashTable {
            slots,
            keys: arena.zeroed::<T>(TABLE_SIZE),
            distinct: 0,
        }
    }

    /// Inserts `value` unless present, probing from its home slot `home`.
    #[inline]
    pub fn insert(&mut self, value: T, home: usize) -> Result<()> {
        let mut slot = home;
        let mut step = 1;
        loop {
            if self.slots[slot] == EMPTY {
                if self.distinct == MAX_DISTINCT {
                    return Err(Error::invalid_arg(
                        "values",
                        format!("more than {MAX_DISTINCT} distinct values"),
                    ));
                }
                self.slots[slot] = 0;
                self.keys[slot] = value;
                self.distinct += 1;
                return Ok(());
            }
            if self.keys[slot].key() == value.key() {
                return Ok(());
            }
            slot = (slot + step) & TABLE_MASK;
            step += 1;
        }
    }

    /// Slot holding `value`.
    #[inline]
    fn find(&self, value: T) -> Option<usize> {
        let mut slot = hash_slot(value);
        for step in 1..=TABLE_SIZE {
            if self.slots[slot] == EMPTY {
                return None;
            }
            if self.keys[slot].key() == value.key() {
                return Some(slot);
            }
            slot = (slot + step) & TABLE_MASK;
        }
        None
    }

    fn slot_of(&self, value: T) -> Result<usize> {
        self.find(value).ok_or_else(|| {
            Error::invalid_operation(format!("dictionary lookup of {value:?}"))
        })
    }
}

/// Shared build procedure; `insert` fills the table with every input value.
pub(crate) fn build_with<T, F>(
    values: &[T],
    cardinality_hint: usize,
    insert: F,
) -> Result<Dictionary<T>>
where
    T: DictionaryValue,
    F: FnOnce(&mut HashTable<'_, T>, &[T]) -> Result<()>,
{
    if values.is_empty() {
        return Ok(Dictionary { values: Vec::new(), codes: Vec::new() });
    }

    let mut table = HashTable::new(Arena::global());
    insert(&mut table, values)?;

    // Room for an estimate that is off by about 6%.
    let hint = cardinality_hint.min(MAX_DISTINCT);
    let capacity = hint + hint / 16 + 1;
    let mut dict = Vec::with_capacity(capacity.max(table.distinct));
    for (slot, &code) in table.slots.iter().enumerate() {
        if code != EMPTY {
            dict.push(table.keys[slot]);
        }
    }
    dict.sort_unstable_by(T::dict_cmp);

    for (rank, &value) in dict.iter().enumerate() {
        let slot = table.slot_of(value)?;
        table.slots[slot] = rank as u16;
    }

    let mut codes = Vec::with_capacity(values.len());
    for &value in values {
        let slot = table.slot_of(value)?;
        codes.push(table.slots[slot]);
    }

    Ok(Dictionary {
        values: dict,
        codes,
    })
}
