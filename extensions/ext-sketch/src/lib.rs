//! ext-sketch: the `hyperloglog` column type.
//!
//! Functions:
//! - `hll_cardinality(h)` → INT64, the rounded estimate
//! - `hll_precision(h)` → INT32
//! - `is_hyperloglog(h)` → BOOL, true when the argument is a `HyperLogLog` host value

pub mod hll;

use tyr_common::{TyrError, TyrResult};
use tyr_expression::FunctionRegistry;
use tyr_extension::Extension;
use tyr_types::{LogicalType, TypedValue};
use tyr_udt::{UdtRef, UserDefinedType, udt_ref};

pub use hll::HyperLogLog;

/// Stores a `HyperLogLog` as a `BLOB` in its versioned byte layout.
#[derive(Clone, Copy, Debug, Default)]
pub struct HyperLogLogUdt;

impl HyperLogLogUdt {
    pub const NAME: &'static str = "hyperloglog";
}

impl UserDefinedType for HyperLogLogUdt {
    type Host = HyperLogLog;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn sql_type(&self) -> LogicalType {
        LogicalType::Blob
    }

    fn serialize(&self, host: &HyperLogLog) -> TyrResult<TypedValue> {
        Ok(TypedValue::Blob(host.to_bytes()))
    }

    fn deserialize(&self, datum: &TypedValue) -> TyrResult<HyperLogLog> {
        let bytes = datum.as_blob().ok_or_else(|| {
            TyrError::Shape(format!("hyperloglog expects BLOB, found {}", datum.kind_name()))
        })?;
        HyperLogLog::from_bytes(bytes)
    }
}

/// Sketch extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct SketchExtension;

impl Extension for SketchExtension {
    fn name(&self) -> &str {
        "sketch"
    }

    fn types(&self) -> Vec<UdtRef> {
        vec![udt_ref(HyperLogLogUdt)]
    }

    fn register_functions(&self, registry: &mut FunctionRegistry) {
        registry.register_host_fn::<HyperLogLog, i64, _>(
            "hll_cardinality",
            LogicalType::Int64,
            |h| Ok(h.cardinality()),
        );
        registry.register_host_fn::<HyperLogLog, i32, _>("hll_precision", LogicalType::Int32, |h| {
            Ok(i32::from(h.precision()))
        });
        registry.register("is_hyperloglog", 1, LogicalType::Bool, |args| {
            Ok(TypedValue::Bool(
                args[0].as_host().is_some_and(|h| h.is::<HyperLogLog>()),
            ))
        });
    }
}
