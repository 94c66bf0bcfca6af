//! Shared fixtures for operator tests.

use std::sync::Arc;

use tyr_catalog::{Dataset, Field, RowBuilder, Schema};
use tyr_common::{TyrError, TyrResult};
use tyr_types::{LogicalType, TypedValue};
use tyr_udt::{UserDefinedType, udt_ref};

/// A small vector host type stored as `DOUBLE[]`.
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

/// `{id: INT64 NOT NULL, grp: INT64, vec: floats}`.
pub fn schema() -> Arc<Schema> {
    Schema::new(vec![
        Field::new("id", LogicalType::Int64, false),
        Field::new("grp", LogicalType::Int64, true),
        Field::new("vec", udt_ref(FloatsUdt), true),
    ])
    .unwrap()
    .into_arc()
}

/// Rows `(i, i % groups, [i, 10 * i])` for `i` in `0..n`.
pub fn dataset(n: usize, groups: i64, partitions: usize) -> Dataset {
    let schema = schema();
    let rows = (0..n)
        .map(|i| {
            RowBuilder::new()
                .value(i as i64)
                .value(i as i64 % groups)
                .host(Floats(vec![i as f64, 10.0 * i as f64]))
                .finish(&schema)
                .unwrap()
        })
        .collect();
    Dataset::from_rows(schema, rows, partitions)
}

pub fn ids(ds: &Dataset) -> Vec<i64> {
    ds.column_values("id")
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect()
}
