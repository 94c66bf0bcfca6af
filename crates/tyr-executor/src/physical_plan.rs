//! Physical operator enum: whole-dataset execution, one operator at a time.

use tyr_catalog::{Dataset, Schema};
use tyr_common::TyrResult;
use tyr_expression::FunctionRegistry;

use crate::context::ExecutionContext;
use crate::operators::*;

/// A physical operator. Enum dispatch over the concrete operator structs.
#[derive(Clone, Debug)]
pub enum PhysicalOperator {
    Limit(LimitOp),
    Projection(ProjectionOp),
    Filter(FilterOp),
    OrderBy(OrderByOp),
    Repartition(RepartitionOp),
    Aggregate(AggregateOp),
}

impl PhysicalOperator {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Limit(_) => "limit",
            Self::Projection(_) => "projection",
            Self::Filter(_) => "filter",
            Self::OrderBy(_) => "order_by",
            Self::Repartition(_) => "repartition",
            Self::Aggregate(_) => "aggregate",
        }
    }

    /// Consume `input` and produce this operator's output dataset.
    pub fn execute(&self, ctx: &ExecutionContext<'_>, input: Dataset) -> TyrResult<Dataset> {
        match self {
            Self::Limit(op) => op.execute(ctx, input),
            Self::Projection(op) => op.execute(ctx, input),
            Self::Filter(op) => op.execute(ctx, input),
            Self::OrderBy(op) => op.execute(ctx, input),
            Self::Repartition(op) => op.execute(ctx, input),
            Self::Aggregate(op) => op.execute(ctx, input),
        }
    }

    /// Schema this operator produces for `input`, without running it.
    pub fn output_schema(&self, input: &Schema, registry: &FunctionRegistry) -> TyrResult<Schema> {
        match self {
            Self::Projection(op) => op.output_schema(input, registry),
            Self::Aggregate(op) => op.output_schema(input),
            Self::Limit(_) | Self::Filter(_) | Self::OrderBy(_) | Self::Repartition(_) => {
                Ok(input.clone())
            }
        }
    }
}

impl From<LimitOp> for PhysicalOperator {
    fn from(op: LimitOp) -> Self {
        Self::Limit(op)
    }
}

impl From<ProjectionOp> for PhysicalOperator {
    fn from(op: ProjectionOp) -> Self {
        Self::Projection(op)
    }
}

impl From<FilterOp> for PhysicalOperator {
    fn from(op: FilterOp) -> Self {
        Self::Filter(op)
    }
}

impl From<OrderByOp> for PhysicalOperator {
    fn from(op: OrderByOp) -> Self {
        Self::OrderBy(op)
    }
}

impl From<RepartitionOp> for PhysicalOperator {
    fn from(op: RepartitionOp) -> Self {
        Self::Repartition(op)
    }
}

impl From<AggregateOp> for PhysicalOperator {
    fn from(op: AggregateOp) -> Self {
        Self::Aggregate(op)
    }
}
