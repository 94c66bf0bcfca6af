//! Small user-defined types for unit tests.

use smol_str::SmolStr;
use tyr_common::{TyrError, TyrResult};
use tyr_types::{LogicalType, TypedValue};

use crate::udt::UserDefinedType;

#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Point stored as `STRUCT(x: DOUBLE, y: DOUBLE)`.
#[derive(Debug)]
pub struct PointUdt;

impl UserDefinedType for PointUdt {
    type Host = Point;

    fn name(&self) -> &str {
        "point"
    }

    fn sql_type(&self) -> LogicalType {
        LogicalType::Struct(vec![
            (SmolStr::new("x"), LogicalType::Double),
            (SmolStr::new("y"), LogicalType::Double),
        ])
    }

    fn serialize(&self, host: &Point) -> TyrResult<TypedValue> {
        Ok(TypedValue::Struct(vec![
            (SmolStr::new("x"), TypedValue::Double(host.x)),
            (SmolStr::new("y"), TypedValue::Double(host.y)),
        ]))
    }

    fn deserialize(&self, datum: &TypedValue) -> TyrResult<Point> {
        match datum {
            TypedValue::Struct(fields) if fields.len() == 2 => {
                let x = fields[0].1.as_f64();
                let y = fields[1].1.as_f64();
                match (x, y) {
                    (Some(x), Some(y)) => Ok(Point { x, y }),
                    _ => Err(TyrError::Shape("point fields must be doubles".into())),
                }
            }
            other => Err(TyrError::Shape(format!(
                "point expects a 2-field struct, found {}",
                other.kind_name()
            ))),
        }
    }
}

/// Drops the last element on serialize; used to exercise mismatch reporting.
#[derive(Debug)]
pub struct LossyUdt;

impl UserDefinedType for LossyUdt {
    type Host = Vec<i64>;

    fn name(&self) -> &str {
        "lossy"
    }

    fn sql_type(&self) -> LogicalType {
        LogicalType::list(LogicalType::Int64)
    }

    fn serialize(&self, host: &Vec<i64>) -> TyrResult<TypedValue> {
        let kept = host.len().saturating_sub(1);
        Ok(TypedValue::List(
            host[..kept].iter().map(|v| TypedValue::Int64(*v)).collect(),
        ))
    }

    fn deserialize(&self, datum: &TypedValue) -> TyrResult<Vec<i64>> {
        datum
            .as_list()
            .ok_or_else(|| TyrError::Shape("expected list".into()))?
            .iter()
            .map(|v| {
                v.as_i64()
                    .ok_or_else(|| TyrError::Shape("expected INT64 element".into()))
            })
            .collect()
    }
}

/// Emits an element of the wrong type; used to exercise output validation.
#[derive(Debug)]
pub struct BrokenUdt;

impl UserDefinedType for BrokenUdt {
    type Host = i64;

    fn name(&self) -> &str {
        "broken"
    }

    fn sql_type(&self) -> LogicalType {
        LogicalType::list(LogicalType::Double)
    }

    fn serialize(&self, host: &i64) -> TyrResult<TypedValue> {
        Ok(TypedValue::List(vec![TypedValue::Int64(*host)]))
    }

    fn deserialize(&self, _datum: &TypedValue) -> TyrResult<i64> {
        Ok(0)
    }
}
