//! JSON-lines reader: one object per non-blank line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use smol_str::SmolStr;
use tyr_catalog::{Row, Schema};
use tyr_common::{TyrError, TyrResult};
use tyr_types::{LogicalType, TypedValue};

use crate::DataReader;

/// Reads rows from JSON lines, parsing each field according to the schema.
pub struct JsonReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
    schema: Arc<Schema>,
}

impl<R: BufRead> JsonReader<R> {
    pub fn new(reader: R, schema: Arc<Schema>) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            schema,
        }
    }
}

impl JsonReader<BufReader<File>> {
    pub fn open(path: &Path, schema: Arc<Schema>) -> TyrResult<Self> {
        let file = File::open(path)
            .map_err(|e| TyrError::Storage(format!("cannot open '{}': {e}", path.display())))?;
        Ok(Self::new(BufReader::new(file), schema))
    }
}

impl<R: BufRead> DataReader for JsonReader<R> {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

impl<R: BufRead> Iterator for JsonReader<R> {
    type Item = TyrResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                tracing::warn!(line = self.line_no, "skipping blank line");
                continue;
            }
            return Some(parse_json_record(&line, self.line_no, &self.schema));
        }
    }
}

/// Parse every record in `text`. Fails on the first bad record, returning
/// no rows at all.
pub fn read_json_lines(text: &str, schema: Arc<Schema>) -> TyrResult<Vec<Row>> {
    JsonReader::new(text.as_bytes(), schema).collect()
}

/// Parse one JSON object into a row of `schema`.
///
/// Missing or `null` fields are null; unknown fields are ignored.
pub fn parse_json_record(line: &str, line_no: usize, schema: &Schema) -> TyrResult<Row> {
    let record: Value = serde_json::from_str(line)
        .map_err(|e| TyrError::SchemaMismatch(format!("line {line_no}: invalid JSON: {e}")))?;
    let Value::Object(object) = record else {
        return Err(TyrError::SchemaMismatch(format!(
            "line {line_no}: expected a JSON object"
        )));
    };

    let mut values = Vec::with_capacity(schema.len());
    for field in schema.fields() {
        let value = match object.get(field.name.as_str()) {
            None | Some(Value::Null) if field.nullable => TypedValue::Null,
            None | Some(Value::Null) => {
                return Err(TyrError::SchemaMismatch(format!(
                    "line {line_no}, column '{}': missing value for a non-nullable column",
                    field.name
                )));
            }
            Some(literal) => parse_json_value(
                literal,
                &field.storage_type(),
                field.column_type.allows_nested_nulls(),
            )
            .map_err(|msg| {
                TyrError::SchemaMismatch(format!(
                    "line {line_no}, column '{}' ({}): {msg}",
                    field.name, field.column_type
                ))
            })?,
        };
        values.push(value);
    }

    schema
        .validate_row(&values)
        .map_err(|e| TyrError::SchemaMismatch(format!("line {line_no}: {e}")))?;
    Ok(Row::new(values))
}

/// Parse a JSON literal as a value of `ty`.
///
/// Errors are plain messages; the caller adds the line and column.
pub fn parse_json_value(value: &Value, ty: &LogicalType, allow_nested_nulls: bool) -> Result<TypedValue, String> {
    let mismatch = || format!("expected {ty}, found {}", json_kind(value));
    match ty {
        LogicalType::Bool => value.as_bool().map(TypedValue::Bool).ok_or_else(mismatch),
        LogicalType::Int32 => {
            let v = integer(value).ok_or_else(mismatch)?;
            i32::try_from(v)
                .map(TypedValue::Int32)
                .map_err(|_| format!("{v} is out of range for INT32"))
        }
        LogicalType::Int64 => integer(value).map(TypedValue::Int64).ok_or_else(mismatch),
        LogicalType::Float => value.as_f64().map(|v| TypedValue::Float(v as f32)).ok_or_else(mismatch),
        LogicalType::Double => value.as_f64().map(TypedValue::Double).ok_or_else(mismatch),
        LogicalType::String => value
            .as_str()
            .map(|s| TypedValue::String(SmolStr::new(s)))
            .ok_or_else(mismatch),
        LogicalType::Blob => {
            let items = value.as_array().ok_or_else(mismatch)?;
            items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|b| u8::try_from(b).ok())
                        .ok_or_else(|| format!("blob element {item} is not a byte"))
                })
                .collect::<Result<Vec<u8>, _>>()
                .map(TypedValue::Blob)
        }
        LogicalType::List(elem) => {
            let items = value.as_array().ok_or_else(mismatch)?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    nested(item, elem, allow_nested_nulls).map_err(|msg| format!("element {i}: {msg}"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(TypedValue::List)
        }
        LogicalType::Struct(fields) => {
            let object = value.as_object().ok_or_else(mismatch)?;
            fields
                .iter()
                .map(|(name, fty)| {
                    let member = object.get(name.as_str()).unwrap_or(&Value::Null);
                    nested(member, fty, allow_nested_nulls)
                        .map(|v| (name.clone(), v))
                        .map_err(|msg| format!("field '{name}': {msg}"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(TypedValue::Struct)
        }
    }
}

fn nested(value: &Value, ty: &LogicalType, allow_nested_nulls: bool) -> Result<TypedValue, String> {
    match value {
        Value::Null if allow_nested_nulls => Ok(TypedValue::Null),
        Value::Null => Err("null is not allowed here".to_string()),
        _ => parse_json_value(value, ty, allow_nested_nulls),
    }
}

/// A JSON integer that fits in i64. `1.0` is not an integer.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => n.as_i64(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer out of range",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyr_catalog::Field;
    use tyr_udt::{UserDefinedType, udt_ref};

    /// Refuses to serialize, so any call from the parser fails the test.
    #[derive(Debug)]
    struct PointsUdt;

    impl UserDefinedType for PointsUdt {
        type Host = Vec<f64>;

        fn name(&self) -> &str {
            "points"
        }

        fn sql_type(&self) -> LogicalType {
            LogicalType::list(LogicalType::Double)
        }

        fn serialize(&self, _host: &Vec<f64>) -> TyrResult<TypedValue> {
            Err(TyrError::Internal("serialize must not be called by the parser".into()))
        }

        fn deserialize(&self, datum: &TypedValue) -> TyrResult<Vec<f64>> {
            datum
                .as_list()
                .ok_or_else(|| TyrError::Shape("expected a list".into()))?
                .iter()
                .map(|v| v.as_f64().ok_or_else(|| TyrError::Shape("expected DOUBLE".into())))
                .collect()
        }
    }

    fn schema() -> Arc<Schema> {
        Schema::new(vec![
            Field::new("id", LogicalType::Int64, false),
            Field::new("vec", udt_ref(PointsUdt), true),
        ])
        .unwrap()
        .into_arc()
    }

    #[test]
    fn udt_literal_parsed_into_internal_form() {
        let text = "{\"id\":1,\"vec\":[1.1,2.2,3.3,4.4]}\n{\"id\":2,\"vec\":[2.25,4.5,8.75]}\n";
        let rows = read_json_lines(text, schema()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1].values(),
            &[
                TypedValue::Int64(2),
                TypedValue::List(vec![
                    TypedValue::Double(2.25),
                    TypedValue::Double(4.5),
                    TypedValue::Double(8.75)
                ])
            ]
        );
        let host = rows[0].host_as::<Vec<f64>>(&schema(), 1).unwrap();
        assert_eq!(host, Some(vec![1.1, 2.2, 3.3, 4.4]));
    }

    #[test]
    fn integers_in_a_double_list() {
        let rows = read_json_lines("{\"id\":1,\"vec\":[1,2]}", schema()).unwrap();
        assert_eq!(
            rows[0].get(1),
            Some(&TypedValue::List(vec![TypedValue::Double(1.0), TypedValue::Double(2.0)]))
        );
    }

    #[test]
    fn missing_null_and_unknown_fields() {
        let text = "{\"id\":1}\n\n{\"id\":2,\"vec\":null,\"extra\":true}";
        let rows = read_json_lines(text, schema()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.get(1) == Some(&TypedValue::Null)));
    }

    #[test]
    fn shape_disagreement_names_line_and_column() {
        let text = "{\"id\":1,\"vec\":[1.0]}\n{\"id\":2,\"vec\":[1.0,\"x\"]}";
        let err = read_json_lines(text, schema()).unwrap_err();
        assert!(matches!(err, TyrError::SchemaMismatch(_)));
        let msg = err.to_string();
        assert!(msg.contains("line 2"), "{msg}");
        assert!(msg.contains("column 'vec'"), "{msg}");
    }

    #[test]
    fn nested_null_rejected_for_udt() {
        let err = read_json_lines("{\"id\":1,\"vec\":[1.0,null]}", schema()).unwrap_err();
        assert!(err.to_string().contains("null is not allowed"));
    }

    #[test]
    fn non_nullable_missing() {
        let err = read_json_lines("{\"vec\":[]}", schema()).unwrap_err();
        assert!(err.to_string().contains("column 'id'"));
    }

    #[test]
    fn integers_must_be_integers() {
        assert!(read_json_lines("{\"id\":1.5}", schema()).is_err());
        assert!(read_json_lines("{\"id\":\"1\"}", schema()).is_err());
        assert!(parse_json_value(&serde_json::json!(3_000_000_000i64), &LogicalType::Int32, true).is_err());
        assert!(parse_json_value(&serde_json::json!(u64::MAX), &LogicalType::Int64, true).is_err());
    }

    #[test]
    fn blobs_and_structs() {
        let ty = LogicalType::Struct(vec![
            (SmolStr::new("raw"), LogicalType::Blob),
            (SmolStr::new("ok"), LogicalType::Bool),
        ]);
        let v = parse_json_value(&serde_json::json!({"raw": [0, 255], "other": 1}), &ty, true).unwrap();
        assert_eq!(
            v,
            TypedValue::Struct(vec![
                (SmolStr::new("raw"), TypedValue::Blob(vec![0, 255])),
                (SmolStr::new("ok"), TypedValue::Null),
            ])
        );
        assert!(parse_json_value(&serde_json::json!([256]), &LogicalType::Blob, true).is_err());
    }

    #[test]
    fn not_an_object() {
        assert!(matches!(
            parse_json_record("[1,2]", 7, &schema()),
            Err(TyrError::SchemaMismatch(msg)) if msg.contains("line 7")
        ));
    }
}
