//! Structural conformance of a value to a `LogicalType`.

use tyr_common::{TyrError, TyrResult};

use crate::logical_type::LogicalType;
use crate::value::TypedValue;

/// Check that `value` has exactly the shape `ty` describes.
///
/// A top-level `Null` always conforms; column nullability is the schema's
/// business. Below the top level, `Null` is accepted only when
/// `allow_nested_nulls` is set. Errors name the offending path (`$[2].x`).
pub fn validate_shape(
    value: &TypedValue,
    ty: &LogicalType,
    allow_nested_nulls: bool,
) -> TyrResult<()> {
    if value.is_null() {
        return Ok(());
    }
    validate_at(value, ty, allow_nested_nulls, &mut String::from("$"))
}

fn validate_at(
    value: &TypedValue,
    ty: &LogicalType,
    allow_nested_nulls: bool,
    path: &mut String,
) -> TyrResult<()> {
    if !value.matches_variant(ty) {
        return Err(TyrError::Shape(format!(
            "{path}: expected {}, found {}",
            ty.type_name(),
            value.kind_name()
        )));
    }

    match (value, ty) {
        (TypedValue::List(items), LogicalType::List(elem)) => {
            for (i, item) in items.iter().enumerate() {
                let len = path.len();
                path.push_str(&format!("[{i}]"));
                check_nested(item, elem, allow_nested_nulls, path)?;
                path.truncate(len);
            }
            Ok(())
        }
        (TypedValue::Struct(values), LogicalType::Struct(fields)) => {
            if values.len() != fields.len() {
                return Err(TyrError::Shape(format!(
                    "{path}: expected {} struct fields, found {}",
                    fields.len(),
                    values.len()
                )));
            }
            for ((name, item), (field_name, field_ty)) in values.iter().zip(fields) {
                if name != field_name {
                    return Err(TyrError::Shape(format!(
                        "{path}: expected struct field '{field_name}', found '{name}'"
                    )));
                }
                let len = path.len();
                path.push('.');
                path.push_str(name);
                check_nested(item, field_ty, allow_nested_nulls, path)?;
                path.truncate(len);
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn check_nested(
    value: &TypedValue,
    ty: &LogicalType,
    allow_nested_nulls: bool,
    path: &mut String,
) -> TyrResult<()> {
    if value.is_null() {
        if allow_nested_nulls {
            return Ok(());
        }
        return Err(TyrError::Shape(format!(
            "{path}: null not allowed in {}",
            ty.type_name()
        )));
    }
    validate_at(value, ty, allow_nested_nulls, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smol_str::SmolStr;

    fn doubles(vals: &[f64]) -> TypedValue {
        TypedValue::List(vals.iter().map(|v| TypedValue::Double(*v)).collect())
    }

    #[test]
    fn top_level_null_conforms() {
        assert!(validate_shape(&TypedValue::Null, &LogicalType::Blob, false).is_ok());
    }

    #[test]
    fn list_of_doubles_conforms() {
        let ty = LogicalType::list(LogicalType::Double);
        assert!(validate_shape(&doubles(&[1.0, 2.0]), &ty, false).is_ok());
        assert!(validate_shape(&doubles(&[]), &ty, false).is_ok());
    }

    #[test]
    fn wrong_element_type_reports_path() {
        let ty = LogicalType::list(LogicalType::Double);
        let value = TypedValue::List(vec![TypedValue::Double(1.0), TypedValue::Int64(2)]);
        let err = validate_shape(&value, &ty, false).unwrap_err();
        assert!(matches!(err, TyrError::Shape(_)));
        assert!(err.to_string().contains("$[1]"));
        assert!(err.to_string().contains("INT64"));
    }

    #[test]
    fn nested_null_respects_flag() {
        let ty = LogicalType::list(LogicalType::Double);
        let value = TypedValue::List(vec![TypedValue::Double(1.0), TypedValue::Null]);
        assert!(validate_shape(&value, &ty, false).is_err());
        assert!(validate_shape(&value, &ty, true).is_ok());
    }

    #[test]
    fn struct_field_checks() {
        let ty = LogicalType::Struct(vec![
            (SmolStr::new("x"), LogicalType::Double),
            (SmolStr::new("y"), LogicalType::Double),
        ]);
        let ok = TypedValue::Struct(vec![
            (SmolStr::new("x"), TypedValue::Double(1.0)),
            (SmolStr::new("y"), TypedValue::Double(2.0)),
        ]);
        assert!(validate_shape(&ok, &ty, false).is_ok());

        let short = TypedValue::Struct(vec![(SmolStr::new("x"), TypedValue::Double(1.0))]);
        assert!(validate_shape(&short, &ty, false).is_err());

        let renamed = TypedValue::Struct(vec![
            (SmolStr::new("x"), TypedValue::Double(1.0)),
            (SmolStr::new("z"), TypedValue::Double(2.0)),
        ]);
        let err = validate_shape(&renamed, &ty, false).unwrap_err();
        assert!(err.to_string().contains("'y'"));
    }

    #[test]
    fn top_level_variant_mismatch() {
        let err = validate_shape(&TypedValue::Int64(1), &LogicalType::Blob, false).unwrap_err();
        assert_eq!(err.to_string(), "shape error: $: expected BLOB, found INT64");
    }
}
