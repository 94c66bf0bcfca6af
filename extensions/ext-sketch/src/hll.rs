//! HyperLogLog cardinality estimator with a fixed, versioned byte layout.
//!
//! Layout: `[version: u8 = 1][precision: u8][2^precision register bytes]`.
//! Items are hashed with xxh3-64 under a fixed seed, so two sketches with
//! the same precision fed the same items are byte-identical.

use tyr_common::{TyrError, TyrResult};
use xxhash_rust::xxh3::xxh3_64_with_seed;

pub const FORMAT_VERSION: u8 = 1;
pub const MIN_PRECISION: u8 = 4;
pub const MAX_PRECISION: u8 = 18;
const HASH_SEED: u64 = 0x6879_7065_726c_6f67;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HyperLogLog {
    precision: u8,
    registers: Vec<u8>,
}

impl HyperLogLog {
    /// An empty sketch with `2^precision` registers.
    pub fn new(precision: u8) -> TyrResult<Self> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(TyrError::Function(format!(
                "hyperloglog precision {precision} is outside {MIN_PRECISION}..={MAX_PRECISION}"
            )));
        }
        Ok(Self {
            precision,
            registers: vec![0; 1 << precision],
        })
    }

    /// An empty sketch whose precision gives roughly relative standard
    /// deviation `rsd`: `ceil(2 * log2(1.106 / rsd))`.
    pub fn with_relative_sd(rsd: f64) -> TyrResult<Self> {
        if !(rsd > 0.0 && rsd < 1.0) {
            return Err(TyrError::Function(format!(
                "relative standard deviation must be in (0, 1), got {rsd}"
            )));
        }
        let p = (2.0 * (1.106 / rsd).log2()).ceil();
        if p < f64::from(MIN_PRECISION) || p > f64::from(MAX_PRECISION) {
            return Err(TyrError::Function(format!(
                "relative standard deviation {rsd} needs precision {p}, outside {MIN_PRECISION}..={MAX_PRECISION}"
            )));
        }
        Self::new(p as u8)
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    pub fn add_bytes(&mut self, item: &[u8]) {
        let hash = xxh3_64_with_seed(item, HASH_SEED);
        let p = u32::from(self.precision);
        let idx = (hash >> (64 - p)) as usize;
        // Rank of the first set bit in the remaining 64 - p bits.
        let rank = ((hash << p).leading_zeros() + 1).min(64 - p + 1) as u8;
        if rank > self.registers[idx] {
            self.registers[idx] = rank;
        }
    }

    pub fn add_i64(&mut self, item: i64) {
        self.add_bytes(&item.to_le_bytes());
    }

    pub fn add_str(&mut self, item: &str) {
        self.add_bytes(item.as_bytes());
    }

    /// Fold `other` into this sketch. Both must have the same precision.
    pub fn merge(&mut self, other: &HyperLogLog) -> TyrResult<()> {
        if self.precision != other.precision {
            return Err(TyrError::Function(format!(
                "cannot merge hyperloglog sketches of precision {} and {}",
                self.precision, other.precision
            )));
        }
        for (r, o) in self.registers.iter_mut().zip(&other.registers) {
            *r = (*r).max(*o);
        }
        Ok(())
    }

    /// Estimated number of distinct items, with linear counting for small
    /// cardinalities.
    pub fn estimate(&self) -> f64 {
        let m = self.registers.len() as f64;
        let alpha = match self.registers.len() {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / m),
        };
        let sum: f64 = self
            .registers
            .iter()
            .map(|&r| 2f64.powi(-i32::from(r)))
            .sum();
        let raw = alpha * m * m / sum;

        let zeros = self.registers.iter().filter(|&&r| r == 0).count();
        if raw <= 2.5 * m && zeros > 0 {
            m * (m / zeros as f64).ln()
        } else {
            raw
        }
    }

    pub fn cardinality(&self) -> i64 {
        self.estimate().round() as i64
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.registers.len());
        out.push(FORMAT_VERSION);
        out.push(self.precision);
        out.extend_from_slice(&self.registers);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> TyrResult<Self> {
        let [version, precision, registers @ ..] = bytes else {
            return Err(TyrError::Shape(format!(
                "hyperloglog needs at least 2 header bytes, found {}",
                bytes.len()
            )));
        };
        if *version != FORMAT_VERSION {
            return Err(TyrError::Shape(format!("unsupported hyperloglog version {version}")));
        }
        if !(MIN_PRECISION..=MAX_PRECISION).contains(precision) {
            return Err(TyrError::Shape(format!("invalid hyperloglog precision {precision}")));
        }
        let expected = 1usize << precision;
        if registers.len() != expected {
            return Err(TyrError::Shape(format!(
                "hyperloglog of precision {precision} needs {expected} registers, found {}",
                registers.len()
            )));
        }
        Ok(Self {
            precision: *precision,
            registers: registers.to_vec(),
        })
    }
}
