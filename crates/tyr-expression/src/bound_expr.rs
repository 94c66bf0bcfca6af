//! Bound expression types: resolved expressions ready for execution.
//!
//! Columns are referenced by position, never by name, so evaluation does no
//! string comparison on the hot path.

use smol_str::SmolStr;
use tyr_catalog::{ColumnType, Schema};
use tyr_common::{TyrError, TyrResult};
use tyr_types::{LogicalType, TypedValue};

use crate::function_registry::FunctionRegistry;

/// Unique function identifier for O(1) registry lookup after resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BoundExpression {
    Column {
        index: usize,
    },
    Literal {
        value: TypedValue,
        result_type: LogicalType,
    },
    FunctionCall {
        name: SmolStr,
        args: Vec<BoundExpression>,
    },
    Comparison {
        op: ComparisonOp,
        left: Box<BoundExpression>,
        right: Box<BoundExpression>,
    },
    IsNull {
        expr: Box<BoundExpression>,
        negated: bool,
    },
}

impl BoundExpression {
    pub fn column(index: usize) -> Self {
        Self::Column { index }
    }

    pub fn literal(value: TypedValue, result_type: LogicalType) -> Self {
        Self::Literal { value, result_type }
    }

    pub fn int(v: i64) -> Self {
        Self::literal(TypedValue::Int64(v), LogicalType::Int64)
    }

    pub fn double(v: f64) -> Self {
        Self::literal(TypedValue::Double(v), LogicalType::Double)
    }

    pub fn string(v: &str) -> Self {
        Self::literal(TypedValue::from(v), LogicalType::String)
    }

    pub fn call(name: &str, args: Vec<BoundExpression>) -> Self {
        Self::FunctionCall {
            name: SmolStr::new(name),
            args,
        }
    }

    pub fn compare(op: ComparisonOp, left: BoundExpression, right: BoundExpression) -> Self {
        Self::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_null(expr: BoundExpression, negated: bool) -> Self {
        Self::IsNull {
            expr: Box::new(expr),
            negated,
        }
    }

    /// The column type this expression produces against `schema`.
    ///
    /// A bare column keeps its declared type, including a user-defined one.
    /// Comparing user-defined values is rejected: their internal form has no
    /// meaningful order.
    pub fn column_type(&self, schema: &Schema, registry: &FunctionRegistry) -> TyrResult<ColumnType> {
        match self {
            Self::Column { index } => Ok(schema.field_at(*index)?.column_type.clone()),
            Self::Literal { result_type, .. } => Ok(ColumnType::Native(result_type.clone())),
            Self::FunctionCall { name, args } => {
                let sig = registry.resolve(name)?;
                if args.len() != sig.arity {
                    return Err(TyrError::Function(format!(
                        "{}() expects {} argument(s), got {}",
                        sig.name,
                        sig.arity,
                        args.len()
                    )));
                }
                for arg in args {
                    arg.column_type(schema, registry)?;
                }
                Ok(ColumnType::Native(sig.return_type.clone()))
            }
            Self::Comparison { left, right, .. } => {
                for side in [left, right] {
                    let ty = side.column_type(schema, registry)?;
                    if ty.is_user_defined() || !ty.storage_type().is_orderable() {
                        return Err(TyrError::Schema(format!("cannot compare values of type {ty}")));
                    }
                }
                Ok(ColumnType::Native(LogicalType::Bool))
            }
            Self::IsNull { expr, .. } => {
                expr.column_type(schema, registry)?;
                Ok(ColumnType::Native(LogicalType::Bool))
            }
        }
    }

    /// Whether this expression can evaluate to null against `schema`.
    pub fn nullable(&self, schema: &Schema) -> bool {
        match self {
            Self::Column { index } => schema.field(*index).is_none_or(|f| f.nullable),
            Self::Literal { value, .. } => value.is_null(),
            Self::IsNull { .. } => false,
            Self::FunctionCall { .. } | Self::Comparison { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyr_catalog::Field;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", LogicalType::Int64, false),
            Field::new("tags", LogicalType::list(LogicalType::String), true),
        ])
        .unwrap()
    }

    #[test]
    fn column_keeps_declared_type() {
        let reg = FunctionRegistry::new();
        let ty = BoundExpression::column(1).column_type(&schema(), &reg).unwrap();
        assert_eq!(ty, ColumnType::Native(LogicalType::list(LogicalType::String)));
        assert!(BoundExpression::column(2).column_type(&schema(), &reg).is_err());
    }

    #[test]
    fn function_call_type() {
        let mut reg = FunctionRegistry::new();
        reg.register("len", 1, LogicalType::Int64, |_| Ok(TypedValue::Int64(0)));
        let call = BoundExpression::call("LEN", vec![BoundExpression::column(1)]);
        let ty = call.column_type(&schema(), &reg).unwrap();
        assert_eq!(ty, ColumnType::Native(LogicalType::Int64));

        let bad = BoundExpression::call("len", vec![]);
        assert!(matches!(bad.column_type(&schema(), &reg), Err(TyrError::Function(_))));
    }

    #[test]
    fn comparison_of_lists_rejected() {
        let reg = FunctionRegistry::new();
        let cmp = BoundExpression::compare(
            ComparisonOp::Eq,
            BoundExpression::column(1),
            BoundExpression::column(1),
        );
        assert!(matches!(cmp.column_type(&schema(), &reg), Err(TyrError::Schema(_))));
    }

    #[test]
    fn nullability() {
        let s = schema();
        assert!(!BoundExpression::column(0).nullable(&s));
        assert!(BoundExpression::column(1).nullable(&s));
        assert!(!BoundExpression::int(1).nullable(&s));
        assert!(!BoundExpression::is_null(BoundExpression::column(1), false).nullable(&s));
    }
}
