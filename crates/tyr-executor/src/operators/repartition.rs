//! Repartition operator: byte-level redistribution of rows across partitions.
//!
//! Every row is encoded with the wire codec in its source partition, routed
//! to a target partition as bytes, and decoded there. Hash routing uses
//! xxh3-64 over the encoded key columns, so rows with equal keys always meet
//! in the same partition.

use rayon::prelude::*;
use tyr_catalog::{Dataset, Row};
use tyr_common::{TyrError, TyrResult};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::context::ExecutionContext;
use crate::wire;

const ROUTING_SEED: u64 = 0x7479_725f_7368_7566;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Partitioning {
    /// Deal rows to `n` partitions in global row order.
    RoundRobin(usize),
    /// Route each row by the hash of its values at `columns`.
    Hash { columns: Vec<usize>, num_partitions: usize },
}

impl Partitioning {
    pub fn num_partitions(&self) -> usize {
        match self {
            Self::RoundRobin(n) => *n,
            Self::Hash { num_partitions, .. } => *num_partitions,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RepartitionOp {
    pub partitioning: Partitioning,
}

impl RepartitionOp {
    pub fn new(partitioning: Partitioning) -> Self {
        Self { partitioning }
    }

    pub fn round_robin(n: usize) -> Self {
        Self::new(Partitioning::RoundRobin(n))
    }

    pub fn hash(columns: Vec<usize>, num_partitions: usize) -> Self {
        Self::new(Partitioning::Hash {
            columns,
            num_partitions,
        })
    }

    pub fn execute(&self, ctx: &ExecutionContext<'_>, input: Dataset) -> TyrResult<Dataset> {
        let n = self.partitioning.num_partitions();
        if n == 0 {
            return Err(TyrError::Execution(
                "repartition needs at least one target partition".into(),
            ));
        }
        let schema = input.schema().clone();
        if let Partitioning::Hash { columns, .. } = &self.partitioning {
            for &col in columns {
                schema.field_at(col)?;
            }
        }

        // Global offset of each source partition, for round-robin dealing.
        let offsets: Vec<usize> = input
            .partitions()
            .iter()
            .scan(0usize, |acc, rows| {
                let start = *acc;
                *acc += rows.len();
                Some(start)
            })
            .collect();

        let partitions = ctx.install(|| {
            // Encode: per source partition, one byte buffer per target.
            let buckets: Vec<Vec<Vec<u8>>> = input
                .partitions()
                .par_iter()
                .zip(offsets.par_iter())
                .map(|(rows, &offset)| self.encode_partition(rows, offset, n))
                .collect();

            // Decode: per target, the buffers of every source in source order.
            (0..n)
                .into_par_iter()
                .map(|target| {
                    let mut rows = Vec::new();
                    for source in &buckets {
                        rows.extend(wire::decode_rows(&source[target])?);
                    }
                    Ok(rows)
                })
                .collect::<TyrResult<Vec<Vec<Row>>>>()
        })?;

        tracing::debug!(
            rows = partitions.iter().map(Vec::len).sum::<usize>(),
            partitions = n,
            "redistributed rows"
        );
        Ok(Dataset::new(schema, partitions))
    }

    fn encode_partition(&self, rows: &[Row], offset: usize, n: usize) -> Vec<Vec<u8>> {
        let mut out = vec![Vec::new(); n];
        let mut key = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let target = match &self.partitioning {
                Partitioning::RoundRobin(_) => (offset + i) % n,
                Partitioning::Hash { columns, .. } => {
                    key.clear();
                    wire::encode_key(&mut key, row, columns);
                    (xxh3_64_with_seed(&key, ROUTING_SEED) % n as u64) as usize
                }
            };
            wire::encode_row(&mut out[target], row);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{Floats, dataset, ids};
    use std::collections::HashSet;
    use tyr_common::EngineConfig;
    use tyr_expression::FunctionRegistry;
    use tyr_types::TypedValue;

    #[test]
    fn round_robin_deals_in_order() {
        let reg = FunctionRegistry::new();
        let config = EngineConfig::default();
        let ctx = ExecutionContext::new(&reg, &config);
        let out = RepartitionOp::round_robin(3).execute(&ctx, dataset(7, 1, 2)).unwrap();
        assert_eq!(out.num_partitions(), 3);
        let sizes: Vec<usize> = out.partitions().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 2, 2]);
        let first: Vec<i64> = out.partitions()[0]
            .iter()
            .map(|r| r.get(0).unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(first, vec![0, 3, 6]);
    }

    #[test]
    fn hash_groups_equal_keys() {
        let reg = FunctionRegistry::new();
        let config = EngineConfig::default();
        let ctx = ExecutionContext::new(&reg, &config);
        let out = RepartitionOp::hash(vec![1], 4).execute(&ctx, dataset(40, 5, 3)).unwrap();
        assert_eq!(out.num_rows(), 40);
        for grp in 0..5 {
            let holding: HashSet<usize> = out
                .partitions()
                .iter()
                .enumerate()
                .filter(|(_, rows)| rows.iter().any(|r| r.get(1) == Some(&TypedValue::Int64(grp))))
                .map(|(i, _)| i)
                .collect();
            assert_eq!(holding.len(), 1, "group {grp} split across partitions");
        }
    }

    #[test]
    fn host_values_survive_redistribution() {
        let reg = FunctionRegistry::new();
        let config = EngineConfig::default();
        let ctx = ExecutionContext::new(&reg, &config);
        let input = dataset(12, 3, 2);
        let out = RepartitionOp::hash(vec![0], 5).execute(&ctx, input.clone()).unwrap();

        let mut before: Vec<(i64, Floats)> = ids(&input)
            .into_iter()
            .zip(input.host_column_as::<Floats>("vec").unwrap().into_iter().flatten())
            .collect();
        let mut after: Vec<(i64, Floats)> = ids(&out)
            .into_iter()
            .zip(out.host_column_as::<Floats>("vec").unwrap().into_iter().flatten())
            .collect();
        before.sort_by_key(|(id, _)| *id);
        after.sort_by_key(|(id, _)| *id);
        assert_eq!(before, after);
    }

    #[test]
    fn zero_targets_rejected() {
        let reg = FunctionRegistry::new();
        let config = EngineConfig::default();
        let ctx = ExecutionContext::new(&reg, &config);
        assert!(RepartitionOp::round_robin(0).execute(&ctx, dataset(1, 1, 1)).is_err());
        assert!(RepartitionOp::hash(vec![9], 2).execute(&ctx, dataset(1, 1, 1)).is_err());
    }
}
