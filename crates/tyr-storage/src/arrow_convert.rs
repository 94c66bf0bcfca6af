//! Conversion between internal-form rows and Arrow arrays.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BinaryArray, BooleanArray, Float32Array, Float64Array, Int32Array,
    Int64Array, ListArray, StringArray, StructArray,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{
    DataType, Field as ArrowField, Fields, Float32Type, Float64Type, Int32Type, Int64Type,
    Schema as ArrowSchema, SchemaRef,
};
use arrow::record_batch::RecordBatch;
use smol_str::SmolStr;
use tyr_catalog::{Field, Row, Schema};
use tyr_common::{TyrError, TyrResult};
use tyr_types::{LogicalType, TypedValue};

/// Arrow field metadata key naming a column's user-defined type.
pub const UDT_NAME_KEY: &str = "tyr.udt.name";

/// Arrow type for a storage type. Nested fields (list items, struct members)
/// are nullable only when `nested_nullable` is set.
pub fn to_arrow_type(ty: &LogicalType, nested_nullable: bool) -> DataType {
    match ty {
        LogicalType::Bool => DataType::Boolean,
        LogicalType::Int32 => DataType::Int32,
        LogicalType::Int64 => DataType::Int64,
        LogicalType::Float => DataType::Float32,
        LogicalType::Double => DataType::Float64,
        LogicalType::String => DataType::Utf8,
        LogicalType::Blob => DataType::Binary,
        LogicalType::List(elem) => DataType::List(Arc::new(ArrowField::new(
            "item",
            to_arrow_type(elem, nested_nullable),
            nested_nullable,
        ))),
        LogicalType::Struct(fields) => DataType::Struct(
            fields
                .iter()
                .map(|(name, ty)| {
                    ArrowField::new(name.as_str(), to_arrow_type(ty, nested_nullable), nested_nullable)
                })
                .collect::<Fields>(),
        ),
    }
}

pub fn to_arrow_field(field: &Field) -> ArrowField {
    let arrow = ArrowField::new(
        field.name.as_str(),
        to_arrow_type(&field.storage_type(), field.column_type.allows_nested_nulls()),
        field.nullable,
    );
    match field.column_type.udt() {
        Some(udt) => arrow.with_metadata(HashMap::from([(
            UDT_NAME_KEY.to_string(),
            udt.name().to_string(),
        )])),
        None => arrow,
    }
}

pub fn to_arrow_schema(schema: &Schema) -> SchemaRef {
    Arc::new(ArrowSchema::new(
        schema.fields().iter().map(to_arrow_field).collect::<Vec<_>>(),
    ))
}

/// Build one record batch holding `rows`, column by column.
pub fn build_batch(arrow_schema: &SchemaRef, rows: &[Row]) -> TyrResult<RecordBatch> {
    let columns = arrow_schema
        .fields()
        .iter()
        .enumerate()
        .map(|(col, field)| {
            let values: Vec<&TypedValue> = rows
                .iter()
                .map(|row| row.get(col).unwrap_or(&TypedValue::Null))
                .collect();
            build_array(&values, field.data_type())
                .map_err(|e| TyrError::Storage(format!("column '{}': {e}", field.name())))
        })
        .collect::<TyrResult<Vec<_>>>()?;
    RecordBatch::try_new(arrow_schema.clone(), columns)
        .map_err(|e| TyrError::Storage(format!("cannot assemble record batch: {e}")))
}

/// Build an Arrow array of `data_type` from internal-form values.
pub fn build_array(values: &[&TypedValue], data_type: &DataType) -> TyrResult<ArrayRef> {
    let array: ArrayRef = match data_type {
        DataType::Boolean => Arc::new(collect_leaf::<_, BooleanArray>(values, data_type, |v| match v {
            TypedValue::Bool(b) => Some(*b),
            _ => None,
        })?),
        DataType::Int32 => Arc::new(collect_leaf::<_, Int32Array>(values, data_type, |v| match v {
            TypedValue::Int32(x) => Some(*x),
            _ => None,
        })?),
        DataType::Int64 => Arc::new(collect_leaf::<_, Int64Array>(values, data_type, |v| match v {
            TypedValue::Int64(x) => Some(*x),
            _ => None,
        })?),
        DataType::Float32 => Arc::new(collect_leaf::<_, Float32Array>(values, data_type, |v| match v {
            TypedValue::Float(x) => Some(*x),
            _ => None,
        })?),
        DataType::Float64 => Arc::new(collect_leaf::<_, Float64Array>(values, data_type, |v| match v {
            TypedValue::Double(x) => Some(*x),
            _ => None,
        })?),
        DataType::Utf8 => Arc::new(collect_leaf::<_, StringArray>(values, data_type, |v| v.as_str())?),
        DataType::Binary => Arc::new(collect_leaf::<_, BinaryArray>(values, data_type, |v| v.as_blob())?),
        DataType::List(item) => {
            let mut lengths = Vec::with_capacity(values.len());
            let mut validity = Vec::with_capacity(values.len());
            let mut children: Vec<&TypedValue> = Vec::new();
            for value in values {
                match value {
                    TypedValue::Null => {
                        lengths.push(0);
                        validity.push(false);
                    }
                    TypedValue::List(items) => {
                        lengths.push(items.len());
                        validity.push(true);
                        children.extend(items.iter());
                    }
                    other => return Err(cannot_store(other, data_type)),
                }
            }
            let child = build_array(&children, item.data_type())?;
            let nulls = validity.contains(&false).then(|| NullBuffer::from(validity));
            Arc::new(
                ListArray::try_new(item.clone(), OffsetBuffer::from_lengths(lengths), child, nulls)
                    .map_err(|e| TyrError::Storage(e.to_string()))?,
            )
        }
        DataType::Struct(fields) => {
            if fields.is_empty() {
                return Err(TyrError::Storage("cannot store a struct with no fields".into()));
            }
            let mut validity = Vec::with_capacity(values.len());
            let mut columns: Vec<Vec<&TypedValue>> = vec![Vec::with_capacity(values.len()); fields.len()];
            for value in values {
                match value {
                    TypedValue::Null => {
                        validity.push(false);
                        for column in &mut columns {
                            column.push(&TypedValue::Null);
                        }
                    }
                    TypedValue::Struct(members) if members.len() == fields.len() => {
                        validity.push(true);
                        for (column, (_, member)) in columns.iter_mut().zip(members) {
                            column.push(member);
                        }
                    }
                    other => return Err(cannot_store(other, data_type)),
                }
            }
            let arrays = fields
                .iter()
                .zip(&columns)
                .map(|(field, column)| build_array(column, field.data_type()))
                .collect::<TyrResult<Vec<_>>>()?;
            let nulls = validity.contains(&false).then(|| NullBuffer::from(validity));
            Arc::new(
                StructArray::try_new(fields.clone(), arrays, nulls)
                    .map_err(|e| TyrError::Storage(e.to_string()))?,
            )
        }
        other => {
            return Err(TyrError::Storage(format!("unsupported Arrow type {other}")));
        }
    };
    Ok(array)
}

fn collect_leaf<'a, T, A>(
    values: &[&'a TypedValue],
    data_type: &DataType,
    get: impl Fn(&'a TypedValue) -> Option<T>,
) -> TyrResult<A>
where
    A: FromIterator<Option<T>>,
{
    values
        .iter()
        .map(|&value| {
            if value.is_null() {
                return Ok(None);
            }
            get(value).map(Some).ok_or_else(|| cannot_store(value, data_type))
        })
        .collect()
}

fn cannot_store(value: &TypedValue, data_type: &DataType) -> TyrError {
    TyrError::Storage(format!(
        "cannot store a {} value in an Arrow {data_type} column",
        value.kind_name()
    ))
}

/// Extract the internal-form value at `row` of an Arrow array.
pub fn extract_value(array: &dyn Array, row: usize, ty: &LogicalType) -> TyrResult<TypedValue> {
    if array.is_null(row) {
        return Ok(TypedValue::Null);
    }

    let value = match ty {
        LogicalType::Bool => array.as_boolean_opt().map(|a| TypedValue::Bool(a.value(row))),
        LogicalType::Int32 => array
            .as_primitive_opt::<Int32Type>()
            .map(|a| TypedValue::Int32(a.value(row))),
        LogicalType::Int64 => array
            .as_primitive_opt::<Int64Type>()
            .map(|a| TypedValue::Int64(a.value(row))),
        LogicalType::Float => array
            .as_primitive_opt::<Float32Type>()
            .map(|a| TypedValue::Float(a.value(row))),
        LogicalType::Double => array
            .as_primitive_opt::<Float64Type>()
            .map(|a| TypedValue::Double(a.value(row))),
        LogicalType::String => array
            .as_string_opt::<i32>()
            .map(|a| TypedValue::String(SmolStr::new(a.value(row)))),
        LogicalType::Blob => array
            .as_binary_opt::<i32>()
            .map(|a| TypedValue::Blob(a.value(row).to_vec())),
        LogicalType::List(elem) => match array.as_list_opt::<i32>() {
            Some(list) => {
                let items = list.value(row);
                let values = (0..items.len())
                    .map(|i| extract_value(items.as_ref(), i, elem))
                    .collect::<TyrResult<Vec<_>>>()?;
                Some(TypedValue::List(values))
            }
            None => None,
        },
        LogicalType::Struct(fields) => match array.as_struct_opt() {
            Some(strukt) if strukt.num_columns() == fields.len() => {
                let members = fields
                    .iter()
                    .enumerate()
                    .map(|(i, (name, fty))| {
                        Ok((name.clone(), extract_value(strukt.column(i).as_ref(), row, fty)?))
                    })
                    .collect::<TyrResult<Vec<_>>>()?;
                Some(TypedValue::Struct(members))
            }
            _ => None,
        },
    };

    value.ok_or_else(|| {
        TyrError::Storage(format!(
            "expected {ty} data, found Arrow {}",
            array.data_type()
        ))
    })
}

/// Convert a whole batch into rows of `schema`.
pub fn batch_to_rows(batch: &RecordBatch, schema: &Schema) -> TyrResult<Vec<Row>> {
    if batch.num_columns() != schema.len() {
        return Err(TyrError::SchemaMismatch(format!(
            "expected {} columns, found {}",
            schema.len(),
            batch.num_columns()
        )));
    }
    let types: Vec<LogicalType> = schema.fields().iter().map(Field::storage_type).collect();
    (0..batch.num_rows())
        .map(|row| {
            types
                .iter()
                .enumerate()
                .map(|(col, ty)| extract_value(batch.column(col).as_ref(), row, ty))
                .collect::<TyrResult<Vec<_>>>()
                .map(Row::new)
        })
        .collect()
}
