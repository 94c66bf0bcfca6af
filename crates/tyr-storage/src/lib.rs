//! tyr-storage: datasets as directories of Parquet files plus a JSON manifest.
//!
//! User-defined columns are persisted in their internal form; only the
//! descriptor's name is recorded, and readers resolve it back through a
//! session's `TypeCatalog`.

pub mod arrow_convert;
pub mod manifest;
pub mod reader;
pub mod writer;

pub use manifest::{ColumnManifest, Manifest, SCHEMA_FILE};
pub use reader::{read_dataset, read_dataset_with_schema};
pub use writer::write_dataset;

#[cfg(test)]
pub(crate) mod test_util;
