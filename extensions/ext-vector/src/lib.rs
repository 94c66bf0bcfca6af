//! ext-vector: the `dense_vector` column type and functions over it.
//!
//! Functions (null-propagating except `is_dense_vector`):
//! - `vec_size(v)` → INT64
//! - `vec_norm(v)` → DOUBLE
//! - `vec_dot(a, b)`, `vec_l2_distance(a, b)`, `vec_cosine_distance(a, b)` → DOUBLE
//! - `is_dense_vector(v)` → BOOL, true when the argument is a `DenseVector` host value, false for null

pub mod distance;
pub mod vector;

use tyr_common::{TyrError, TyrResult};
use tyr_expression::{FunctionArg, FunctionRegistry};
use tyr_extension::Extension;
use tyr_types::{LogicalType, TypedValue};
use tyr_udt::{UdtRef, udt_ref};

pub use distance::DistanceMetric;
pub use vector::{DenseVector, VectorUdt};

/// Vector extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct VectorExtension;

impl VectorExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Extension for VectorExtension {
    fn name(&self) -> &str {
        "vector"
    }

    fn types(&self) -> Vec<UdtRef> {
        vec![udt_ref(VectorUdt)]
    }

    fn register_functions(&self, registry: &mut FunctionRegistry) {
        registry.register_host_fn::<DenseVector, i64, _>("vec_size", LogicalType::Int64, |v| {
            Ok(v.len() as i64)
        });
        registry.register_host_fn::<DenseVector, f64, _>("vec_norm", LogicalType::Double, |v| {
            Ok(distance::norm(v.values()))
        });
        registry.register("vec_dot", 2, LogicalType::Double, |args| {
            binary(args, "vec_dot", distance::dot)
        });
        registry.register("vec_l2_distance", 2, LogicalType::Double, |args| {
            binary(args, "vec_l2_distance", |a, b| DistanceMetric::L2.distance(a, b))
        });
        registry.register("vec_cosine_distance", 2, LogicalType::Double, |args| {
            binary(args, "vec_cosine_distance", |a, b| DistanceMetric::Cosine.distance(a, b))
        });
        registry.register("is_dense_vector", 1, LogicalType::Bool, |args| {
            Ok(TypedValue::Bool(
                args[0].as_host().is_some_and(|h| h.is::<DenseVector>()),
            ))
        });
    }
}

fn binary(args: &[FunctionArg], name: &str, f: impl Fn(&[f64], &[f64]) -> f64) -> TyrResult<TypedValue> {
    if args.iter().any(FunctionArg::is_null) {
        return Ok(TypedValue::Null);
    }
    let a = args[0].host_as::<DenseVector>()?;
    let b = args[1].host_as::<DenseVector>()?;
    if a.len() != b.len() {
        return Err(TyrError::Function(format!(
            "{name}() needs vectors of equal length, got {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok(TypedValue::Double(f(a.values(), b.values())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(v: &[f64]) -> FunctionArg {
        FunctionArg::Host(Box::new(DenseVector(v.to_vec())))
    }

    fn registry() -> FunctionRegistry {
        let mut reg = FunctionRegistry::new();
        VectorExtension.register_functions(&mut reg);
        reg
    }

    #[test]
    fn extension_metadata() {
        let ext = VectorExtension::new();
        assert_eq!(ext.name(), "vector");
        let types = ext.types();
        assert_eq!(types[0].name(), "dense_vector");
        assert_eq!(types[0].sql_type(), LogicalType::list(LogicalType::Double));
        assert!(!types[0].contains_null());
    }

    #[test]
    fn unary_functions() {
        let reg = registry();
        assert_eq!(reg.invoke("vec_size", &[host(&[1.0, 2.0, 3.0])]).unwrap(), TypedValue::Int64(3));
        assert_eq!(reg.invoke("vec_norm", &[host(&[3.0, 4.0])]).unwrap(), TypedValue::Double(5.0));
        assert!(reg.invoke("vec_size", &[FunctionArg::Value(TypedValue::Null)]).unwrap().is_null());
    }

    #[test]
    fn binary_functions() {
        let reg = registry();
        let out = reg.invoke("vec_dot", &[host(&[1.0, 2.0]), host(&[3.0, 4.0])]).unwrap();
        assert_eq!(out, TypedValue::Double(11.0));
        let out = reg
            .invoke("vec_l2_distance", &[host(&[1.0, 0.0]), host(&[0.0, 1.0])])
            .unwrap();
        assert_eq!(out, TypedValue::Double(2.0));
        assert!(matches!(
            reg.invoke("vec_dot", &[host(&[1.0]), host(&[1.0, 2.0])]),
            Err(TyrError::Function(_))
        ));
    }

    #[test]
    fn is_dense_vector() {
        let reg = registry();
        assert_eq!(reg.invoke("is_dense_vector", &[host(&[])]).unwrap(), TypedValue::Bool(true));
        assert_eq!(
            reg.invoke("is_dense_vector", &[FunctionArg::Value(TypedValue::Int64(1))])
                .unwrap(),
            TypedValue::Bool(false)
        );
    }

    #[test]
    fn wrong_host_type() {
        let reg = registry();
        let err = reg
            .invoke("vec_size", &[FunctionArg::Host(Box::new(7i64))])
            .unwrap_err();
        assert!(matches!(err, TyrError::TypeMismatch { .. }));
    }
}
