pub mod aggregate;
pub mod filter;
pub mod limit;
pub mod projection;
pub mod repartition;
pub mod sort;

pub use aggregate::{AggregateFunction, AggregateOp, AggregateSpec};
pub use filter::FilterOp;
pub use limit::LimitOp;
pub use projection::ProjectionOp;
pub use repartition::{Partitioning, RepartitionOp};
pub use sort::{OrderByOp, SortOrder};
