//! Row evaluator: evaluate a BoundExpression against a single row.

use std::cmp::Ordering;

use tyr_catalog::{ColumnType, Row, Schema};
use tyr_common::{TyrError, TyrResult};
use tyr_types::TypedValue;
use tyr_udt::HostRef;

use crate::bound_expr::{BoundExpression, ComparisonOp};
use crate::function_registry::{FunctionArg, FunctionRegistry};

/// Evaluate `expr` against `row`, producing a value in internal form.
///
/// A function argument that is a bare column of a user-defined type is
/// deserialized through the schema's descriptor and passed as
/// `FunctionArg::Host`; a null cell is passed as `FunctionArg::Value(Null)`.
pub fn evaluate(
    expr: &BoundExpression,
    row: &Row,
    schema: &Schema,
    registry: &FunctionRegistry,
) -> TyrResult<TypedValue> {
    match expr {
        BoundExpression::Column { index } => row
            .get(*index)
            .cloned()
            .ok_or_else(|| TyrError::Execution(format!("column index {index} out of range"))),

        BoundExpression::Literal { value, .. } => Ok(value.clone()),

        BoundExpression::FunctionCall { name, args } => {
            let args = args
                .iter()
                .map(|arg| function_arg(arg, row, schema, registry))
                .collect::<TyrResult<Vec<_>>>()?;
            registry.invoke(name, &args)
        }

        BoundExpression::Comparison { op, left, right } => {
            let lv = evaluate(left, row, schema, registry)?;
            let rv = evaluate(right, row, schema, registry)?;
            eval_comparison(*op, &lv, &rv)
        }

        BoundExpression::IsNull { expr, negated } => {
            let is_null = evaluate(expr, row, schema, registry)?.is_null();
            Ok(TypedValue::Bool(is_null != *negated))
        }
    }
}

fn function_arg(
    arg: &BoundExpression,
    row: &Row,
    schema: &Schema,
    registry: &FunctionRegistry,
) -> TyrResult<FunctionArg> {
    if let BoundExpression::Column { index } = arg
        && let Some(field) = schema.field(*index)
        && let ColumnType::UserDefined(udt) = &field.column_type
    {
        return match row.get(*index) {
            None => Err(TyrError::Execution(format!("column index {index} out of range"))),
            Some(TypedValue::Null) => Ok(FunctionArg::Value(TypedValue::Null)),
            Some(datum) => Ok(FunctionArg::Host(udt.deserialize_host(HostRef::Internal(datum))?)),
        };
    }
    evaluate(arg, row, schema, registry).map(FunctionArg::Value)
}

fn eval_comparison(op: ComparisonOp, left: &TypedValue, right: &TypedValue) -> TyrResult<TypedValue> {
    if left.is_null() || right.is_null() {
        return Ok(TypedValue::Null);
    }

    let ord = compare_values(left, right)?;

    let result = match op {
        ComparisonOp::Eq => ord == Ordering::Equal,
        ComparisonOp::Neq => ord != Ordering::Equal,
        ComparisonOp::Lt => ord == Ordering::Less,
        ComparisonOp::Le => ord != Ordering::Greater,
        ComparisonOp::Gt => ord == Ordering::Greater,
        ComparisonOp::Ge => ord != Ordering::Less,
    };

    Ok(TypedValue::Bool(result))
}

/// Total order over comparable non-null values.
///
/// Integers of either width compare exactly; mixed integer/float compares as
/// f64. Floats use `total_cmp` so the order is deterministic for NaN.
pub fn compare_values(left: &TypedValue, right: &TypedValue) -> TyrResult<Ordering> {
    match (left, right) {
        (TypedValue::Int32(_) | TypedValue::Int64(_), TypedValue::Int32(_) | TypedValue::Int64(_)) => {
            Ok(left.as_i64().cmp(&right.as_i64()))
        }
        (
            TypedValue::Int32(_) | TypedValue::Int64(_) | TypedValue::Float(_) | TypedValue::Double(_),
            TypedValue::Int32(_) | TypedValue::Int64(_) | TypedValue::Float(_) | TypedValue::Double(_),
        ) => {
            let a = left.as_f64().or_else(|| left.as_i64().map(|v| v as f64));
            let b = right.as_f64().or_else(|| right.as_i64().map(|v| v as f64));
            match (a, b) {
                (Some(a), Some(b)) => Ok(a.total_cmp(&b)),
                _ => Err(cannot_compare(left, right)),
            }
        }
        (TypedValue::String(a), TypedValue::String(b)) => Ok(a.cmp(b)),
        (TypedValue::Bool(a), TypedValue::Bool(b)) => Ok(a.cmp(b)),
        _ => Err(cannot_compare(left, right)),
    }
}

fn cannot_compare(left: &TypedValue, right: &TypedValue) -> TyrError {
    TyrError::Execution(format!(
        "cannot compare {} and {}",
        left.kind_name(),
        right.kind_name()
    ))
}
