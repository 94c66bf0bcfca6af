//! tyr-executor: partition-parallel relational operators, redistribution
//! wire codec, and schema-driven result rendering.

pub mod context;
pub mod execute;
pub mod operators;
pub mod physical_plan;
pub mod result;
pub mod wire;

pub use context::ExecutionContext;
pub use execute::execute_plan;
pub use operators::{
    AggregateFunction, AggregateOp, AggregateSpec, FilterOp, LimitOp, OrderByOp, Partitioning,
    ProjectionOp, RepartitionOp, SortOrder,
};
pub use physical_plan::PhysicalOperator;
pub use result::QueryResult;

#[cfg(test)]
pub(crate) mod test_util;
