//! tyr-catalog: schemas, rows, datasets and the session's type catalog.

pub mod dataset;
pub mod row;
pub mod schema;
pub mod type_catalog;

pub use dataset::Dataset;
pub use row::{Row, RowBuilder};
pub use schema::{ColumnType, Field, Schema};
pub use type_catalog::TypeCatalog;
