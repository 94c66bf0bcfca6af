//! Open-addressing hash set with linear probing.
//!
//! Capacity is always a power of two; the table doubles once it would pass
//! a 0.7 load factor. Equality is set equality, independent of insertion
//! order and capacity.

use std::fmt;

use smol_str::SmolStr;
use tyr_types::{LogicalType, TypedValue};
use xxhash_rust::xxh3::xxh3_64_with_seed;

const HASH_SEED: u64 = 0x6f70_656e_7365_7473;
const MIN_CAPACITY: usize = 8;

/// An element type the set can hold and persist.
pub trait SetElement: Clone + Eq + fmt::Debug + Send + Sync + 'static {
    /// Suffix of the descriptor name, e.g. `int64` in `set_int64`.
    const TYPE_NAME: &'static str;

    fn logical_type() -> LogicalType;

    fn to_value(&self) -> TypedValue;

    /// Convert an internal value of exactly `logical_type()`.
    fn from_value(value: &TypedValue) -> Option<Self>;

    /// Convert a probe value, allowing integer widths to mix.
    fn from_probe(value: &TypedValue) -> Option<Self> {
        Self::from_value(value)
    }

    fn hash_key(&self) -> u64;
}

impl SetElement for i32 {
    const TYPE_NAME: &'static str = "int32";

    fn logical_type() -> LogicalType {
        LogicalType::Int32
    }

    fn to_value(&self) -> TypedValue {
        TypedValue::Int32(*self)
    }

    fn from_value(value: &TypedValue) -> Option<Self> {
        match value {
            TypedValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    fn from_probe(value: &TypedValue) -> Option<Self> {
        value.as_i64().and_then(|v| i32::try_from(v).ok())
    }

    fn hash_key(&self) -> u64 {
        xxh3_64_with_seed(&self.to_le_bytes(), HASH_SEED)
    }
}

impl SetElement for i64 {
    const TYPE_NAME: &'static str = "int64";

    fn logical_type() -> LogicalType {
        LogicalType::Int64
    }

    fn to_value(&self) -> TypedValue {
        TypedValue::Int64(*self)
    }

    fn from_value(value: &TypedValue) -> Option<Self> {
        match value {
            TypedValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    fn from_probe(value: &TypedValue) -> Option<Self> {
        value.as_i64()
    }

    fn hash_key(&self) -> u64 {
        xxh3_64_with_seed(&self.to_le_bytes(), HASH_SEED)
    }
}

impl SetElement for SmolStr {
    const TYPE_NAME: &'static str = "string";

    fn logical_type() -> LogicalType {
        LogicalType::String
    }

    fn to_value(&self) -> TypedValue {
        TypedValue::String(self.clone())
    }

    fn from_value(value: &TypedValue) -> Option<Self> {
        match value {
            TypedValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn hash_key(&self) -> u64 {
        xxh3_64_with_seed(self.as_bytes(), HASH_SEED)
    }
}

#[derive(Clone)]
pub struct OpenHashSet<T> {
    slots: Vec<Option<T>>,
    len: usize,
}

impl<T: SetElement> OpenHashSet<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// An empty set able to hold `n` elements without growing.
    pub fn with_capacity(n: usize) -> Self {
        let needed = (n * 10).div_ceil(7).max(MIN_CAPACITY);
        Self {
            slots: vec![None; needed.next_power_of_two()],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Insert `value`; returns false if it was already present.
    pub fn insert(&mut self, value: T) -> bool {
        let mut slot = match self.probe(&value) {
            Ok(_) => return false,
            Err(slot) => slot,
        };
        if (self.len + 1) * 10 > self.slots.len() * 7 {
            self.grow();
            slot = match self.probe(&value) {
                Ok(_) => return false,
                Err(slot) => slot,
            };
        }
        self.slots[slot] = Some(value);
        self.len += 1;
        true
    }

    pub fn contains(&self, value: &T) -> bool {
        self.probe(value).is_ok()
    }

    /// Elements in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().flatten()
    }

    /// `Ok(slot)` holding `value`, or `Err(slot)` of the first empty slot on
    /// its probe sequence. The table is never full, so the loop ends.
    fn probe(&self, value: &T) -> Result<usize, usize> {
        let mask = self.slots.len() - 1;
        let mut slot = (value.hash_key() as usize) & mask;
        loop {
            match &self.slots[slot] {
                None => return Err(slot),
                Some(existing) if existing == value => return Ok(slot),
                Some(_) => slot = (slot + 1) & mask,
            }
        }
    }

    fn grow(&mut self) {
        let doubled = vec![None; self.slots.len() * 2];
        let old = std::mem::replace(&mut self.slots, doubled);
        self.len = 0;
        for value in old.into_iter().flatten() {
            if let Err(slot) = self.probe(&value) {
                self.slots[slot] = Some(value);
                self.len += 1;
            }
        }
    }
}

impl<T: SetElement> Default for OpenHashSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SetElement> PartialEq for OpenHashSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|v| other.contains(v))
    }
}

impl<T: SetElement> Eq for OpenHashSet<T> {}

impl<T: SetElement> fmt::Debug for OpenHashSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: SetElement> FromIterator<T> for OpenHashSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut set = Self::with_capacity(iter.size_hint().0);
        for value in iter {
            set.insert(value);
        }
        set
    }
}
