//! Execution driver: run a chain of physical operators over a dataset.

use tyr_catalog::Dataset;
use tyr_common::TyrResult;

use crate::context::ExecutionContext;
use crate::physical_plan::PhysicalOperator;

/// Apply `plan` left to right, feeding each operator's output to the next.
pub fn execute_plan(
    ctx: &ExecutionContext<'_>,
    plan: &[PhysicalOperator],
    input: Dataset,
) -> TyrResult<Dataset> {
    let mut current = input;
    for op in plan {
        let rows_in = current.num_rows();
        current = op.execute(ctx, current)?;
        tracing::debug!(
            operator = op.name(),
            rows_in,
            rows_out = current.num_rows(),
            partitions = current.num_partitions(),
            "operator finished"
        );
    }
    Ok(current)
}
