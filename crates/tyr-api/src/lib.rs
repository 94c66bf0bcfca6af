//! tyr-api: public Session/DataFrame over the partitioned engine.

pub mod dataframe;
pub mod session;

pub use dataframe::{DataFrame, GroupedDataFrame};
pub use session::Session;

pub use tyr_catalog::{ColumnType, Dataset, Field, Row, RowBuilder, Schema};
pub use tyr_common::{EngineConfig, TyrError, TyrResult};
pub use tyr_executor::{QueryResult, SortOrder};
pub use tyr_expression::{BoundExpression, ComparisonOp, FunctionArg};
pub use tyr_extension::Extension;
pub use tyr_types::{LogicalType, TypedValue};
pub use tyr_udt::{UdtRef, UserDefinedType, udt_ref};
