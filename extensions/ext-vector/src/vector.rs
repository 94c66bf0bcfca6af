//! `DenseVector` and its descriptor.

use std::fmt;

use tyr_common::{TyrError, TyrResult};
use tyr_types::{LogicalType, TypedValue};
use tyr_udt::UserDefinedType;

/// A dense vector of doubles.
///
/// Equality is element-wise and bitwise, so `NaN == NaN` and `0.0 != -0.0`.
#[derive(Clone, Debug, Default)]
pub struct DenseVector(pub Vec<f64>);

impl DenseVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }
}

impl PartialEq for DenseVector {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl From<Vec<f64>> for DenseVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

// Human-facing only; query output is rendered from the internal form.
impl fmt::Display for DenseVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DenseVector[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}

/// Stores a `DenseVector` as `DOUBLE[]` without nested nulls.
#[derive(Clone, Copy, Debug, Default)]
pub struct VectorUdt;

impl VectorUdt {
    pub const NAME: &'static str = "dense_vector";
}

impl UserDefinedType for VectorUdt {
    type Host = DenseVector;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn sql_type(&self) -> LogicalType {
        LogicalType::list(LogicalType::Double)
    }

    fn serialize(&self, host: &DenseVector) -> TyrResult<TypedValue> {
        Ok(TypedValue::List(host.0.iter().map(|v| TypedValue::Double(*v)).collect()))
    }

    fn deserialize(&self, datum: &TypedValue) -> TyrResult<DenseVector> {
        let items = datum.as_list().ok_or_else(|| {
            TyrError::Shape(format!("dense_vector expects DOUBLE[], found {}", datum.kind_name()))
        })?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                TypedValue::Double(v) => Ok(*v),
                other => Err(TyrError::Shape(format!(
                    "dense_vector element {i}: expected DOUBLE, found {}",
                    other.kind_name()
                ))),
            })
            .collect::<TyrResult<Vec<_>>>()
            .map(DenseVector)
    }
}
