//! Value coercion: make a function's result conform to its declared return type.

use tyr_common::{TyrError, TyrResult};
use tyr_types::type_utils::implicit_cast_cost;
use tyr_types::{LogicalType, TypedValue};

/// Coerce `value` to `target` using implicit widening casts only.
///
/// Nulls pass through. Lists coerce element-wise, structs field-wise with
/// matching names. Anything needing a narrowing or cross-kind cast is a
/// `TypeMismatch`.
pub fn coerce_value(value: TypedValue, target: &LogicalType) -> TyrResult<TypedValue> {
    match (value, target) {
        (TypedValue::Null, _) => Ok(TypedValue::Null),
        (TypedValue::List(items), LogicalType::List(elem)) => items
            .into_iter()
            .map(|item| coerce_value(item, elem))
            .collect::<TyrResult<Vec<_>>>()
            .map(TypedValue::List),
        (TypedValue::Struct(fields), LogicalType::Struct(types)) => {
            if fields.len() != types.len()
                || fields.iter().zip(types).any(|((a, _), (b, _))| a != b)
            {
                return Err(TyrError::type_mismatch(
                    target.type_name(),
                    TypedValue::Struct(fields).kind_name(),
                ));
            }
            fields
                .into_iter()
                .zip(types)
                .map(|((name, v), (_, ty))| Ok((name, coerce_value(v, ty)?)))
                .collect::<TyrResult<Vec<_>>>()
                .map(TypedValue::Struct)
        }
        (value, target) => {
            let castable = scalar_type(&value)
                .and_then(|from| implicit_cast_cost(&from, target))
                .is_some();
            if !castable {
                return Err(TyrError::type_mismatch(target.type_name(), value.kind_name()));
            }
            Ok(cast_scalar(value, target))
        }
    }
}

fn scalar_type(value: &TypedValue) -> Option<LogicalType> {
    Some(match value {
        TypedValue::Bool(_) => LogicalType::Bool,
        TypedValue::Int32(_) => LogicalType::Int32,
        TypedValue::Int64(_) => LogicalType::Int64,
        TypedValue::Float(_) => LogicalType::Float,
        TypedValue::Double(_) => LogicalType::Double,
        TypedValue::String(_) => LogicalType::String,
        TypedValue::Blob(_) => LogicalType::Blob,
        _ => return None,
    })
}

fn cast_scalar(value: TypedValue, target: &LogicalType) -> TypedValue {
    match (value, target) {
        (TypedValue::Int32(v), LogicalType::Int64) => TypedValue::Int64(v as i64),
        (TypedValue::Int32(v), LogicalType::Double) => TypedValue::Double(v as f64),
        (TypedValue::Int64(v), LogicalType::Double) => TypedValue::Double(v as f64),
        (TypedValue::Int32(v), LogicalType::Float) => TypedValue::Float(v as f32),
        (TypedValue::Int64(v), LogicalType::Float) => TypedValue::Float(v as f32),
        (TypedValue::Float(v), LogicalType::Double) => TypedValue::Double(v as f64),
        (value, _) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity() {
        let v = coerce_value(TypedValue::Int64(5), &LogicalType::Int64).unwrap();
        assert_eq!(v, TypedValue::Int64(5));
    }

    #[test]
    fn widening() {
        assert_eq!(
            coerce_value(TypedValue::Int32(5), &LogicalType::Int64).unwrap(),
            TypedValue::Int64(5)
        );
        assert_eq!(
            coerce_value(TypedValue::Int64(2), &LogicalType::Double).unwrap(),
            TypedValue::Double(2.0)
        );
        assert_eq!(
            coerce_value(TypedValue::Float(0.5), &LogicalType::Double).unwrap(),
            TypedValue::Double(0.5)
        );
    }

    #[test]
    fn null_passes() {
        assert_eq!(
            coerce_value(TypedValue::Null, &LogicalType::Blob).unwrap(),
            TypedValue::Null
        );
    }

    #[test]
    fn list_element_wise() {
        let v = TypedValue::List(vec![TypedValue::Int64(1), TypedValue::Int64(2)]);
        let out = coerce_value(v, &LogicalType::list(LogicalType::Double)).unwrap();
        assert_eq!(
            out,
            TypedValue::List(vec![TypedValue::Double(1.0), TypedValue::Double(2.0)])
        );
    }

    #[test]
    fn mismatch() {
        let err = coerce_value(TypedValue::from("x"), &LogicalType::Int64).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected INT64, found STRING");
        let err = coerce_value(TypedValue::Double(1.0), &LogicalType::Int64).unwrap_err();
        assert!(matches!(err, TyrError::TypeMismatch { .. }));
    }
}
