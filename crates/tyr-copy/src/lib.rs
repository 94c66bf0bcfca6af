//! tyr-copy: schema-directed ingestion of semi-structured input.
//!
//! Every literal is parsed straight into its column's storage type. A
//! user-defined column's literal becomes its internal form without passing
//! through the descriptor's host type.

mod json_reader;

pub use json_reader::{JsonReader, parse_json_record, parse_json_value, read_json_lines};

use std::sync::Arc;

use tyr_catalog::{Row, Schema};
use tyr_common::TyrResult;

/// Trait for reading rows from an external data source.
///
/// Implementations yield one row at a time, already validated against
/// the target schema.
pub trait DataReader: Iterator<Item = TyrResult<Row>> {
    fn schema(&self) -> &Arc<Schema>;
}
