//! Shared fixtures for storage tests.

use std::path::PathBuf;
use std::sync::Arc;

use tyr_catalog::{Dataset, Field, RowBuilder, Schema};
use tyr_common::{TyrError, TyrResult};
use tyr_types::{LogicalType, TypedValue};
use tyr_udt::{UserDefinedType, udt_ref};

#[derive(Clone, Debug, PartialEq)]
pub struct Floats(pub Vec<f64>);

#[derive(Debug)]
pub struct FloatsUdt;

impl UserDefinedType for FloatsUdt {
    type Host = Floats;

    fn name(&self) -> &str {
        "floats"
    }

    fn sql_type(&self) -> LogicalType {
        LogicalType::list(LogicalType::Double)
    }

    fn serialize(&self, host: &Floats) -> TyrResult<TypedValue> {
        Ok(TypedValue::List(host.0.iter().map(|v| TypedValue::Double(*v)).collect()))
    }

    fn deserialize(&self, datum: &TypedValue) -> TyrResult<Floats> {
        datum
            .as_list()
            .ok_or_else(|| TyrError::Shape("floats expects a list".into()))?
            .iter()
            .map(|v| v.as_f64().ok_or_else(|| TyrError::Shape("expected DOUBLE".into())))
            .collect::<TyrResult<Vec<_>>>()
            .map(Floats)
    }
}

/// Same storage shape as `FloatsUdt`, under another name.
#[derive(Debug)]
pub struct OtherUdt;

impl UserDefinedType for OtherUdt {
    type Host = Vec<i64>;

    fn name(&self) -> &str {
        "floats"
    }

    fn sql_type(&self) -> LogicalType {
        LogicalType::list(LogicalType::Int64)
    }

    fn serialize(&self, host: &Vec<i64>) -> TyrResult<TypedValue> {
        Ok(TypedValue::List(host.iter().map(|v| TypedValue::Int64(*v)).collect()))
    }

    fn deserialize(&self, datum: &TypedValue) -> TyrResult<Vec<i64>> {
        datum
            .as_list()
            .ok_or_else(|| TyrError::Shape("expects a list".into()))?
            .iter()
            .map(|v| v.as_i64().ok_or_else(|| TyrError::Shape("expected INT64".into())))
            .collect()
    }
}

/// `{id: INT64 NOT NULL, name: STRING, vec: floats}`.
pub fn schema() -> Arc<Schema> {
    Schema::new(vec![
        Field::new("id", LogicalType::Int64, false),
        Field::new("name", LogicalType::String, true),
        Field::new("vec", udt_ref(FloatsUdt), true),
    ])
    .unwrap()
    .into_arc()
}

/// Rows `(i, "n<i>", [i, i / 2])`; every third vector is null.
pub fn dataset(n: usize, partitions: usize) -> Dataset {
    let schema = schema();
    let rows = (0..n)
        .map(|i| {
            let builder = RowBuilder::new().value(i as i64).value(format!("n{i}"));
            let builder = if i % 3 == 2 {
                builder.null()
            } else {
                builder.host(Floats(vec![i as f64, i as f64 / 2.0]))
            };
            builder.finish(&schema).unwrap()
        })
        .collect();
    Dataset::from_rows(schema, rows, partitions)
}

/// A fresh directory under the system temp dir, removed on drop.
pub struct TempDir(pub PathBuf);

impl TempDir {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("tyr_storage_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&path);
        Self(path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
