//! Limit operator: SKIP + LIMIT row counting in partition order.

use tyr_catalog::Dataset;
use tyr_common::TyrResult;

use crate::context::ExecutionContext;

#[derive(Clone, Debug)]
pub struct LimitOp {
    pub skip: u64,
    pub limit: u64,
}

impl LimitOp {
    pub fn new(skip: u64, limit: u64) -> Self {
        Self { skip, limit }
    }

    /// Gather at most `limit` rows after the first `skip`, into one partition.
    /// Rows are taken partition by partition, preserving order within each.
    pub fn execute(&self, _ctx: &ExecutionContext<'_>, input: Dataset) -> TyrResult<Dataset> {
        let schema = input.schema().clone();
        let rows = input
            .into_partitions()
            .into_iter()
            .flatten()
            .skip(self.skip as usize)
            .take(self.limit as usize)
            .collect();
        Ok(Dataset::new(schema, vec![rows]))
    }
}
