//! Redistribution wire format.
//!
//! Rows cross partition boundaries only as bytes. Each value is a one-byte
//! tag followed by a little-endian payload; lists and structs carry a u32
//! element count and nest recursively. Only internal form is encoded, so a
//! user-defined column travels exactly as its descriptor serialized it.

use smol_str::SmolStr;
use tyr_catalog::Row;
use tyr_common::{TyrError, TyrResult};
use tyr_types::TypedValue;

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT32: u8 = 2;
const TAG_INT64: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_DOUBLE: u8 = 5;
const TAG_STRING: u8 = 6;
const TAG_BLOB: u8 = 7;
const TAG_LIST: u8 = 8;
const TAG_STRUCT: u8 = 9;

/// Append one row: a u32 value count followed by the values.
pub fn encode_row(buf: &mut Vec<u8>, row: &Row) {
    buf.extend_from_slice(&(row.len() as u32).to_le_bytes());
    for value in row.values() {
        encode_value(buf, value);
    }
}

/// Read one row starting at `offset`, advancing it.
pub fn decode_row(data: &[u8], offset: &mut usize) -> TyrResult<Row> {
    let n = read_u32_le(data, offset)? as usize;
    let mut values = Vec::with_capacity(n.min(data.len()));
    for _ in 0..n {
        values.push(decode_value(data, offset)?);
    }
    Ok(Row::new(values))
}

/// Decode every row in `data`.
pub fn decode_rows(data: &[u8]) -> TyrResult<Vec<Row>> {
    let mut offset = 0;
    let mut rows = Vec::new();
    while offset < data.len() {
        rows.push(decode_row(data, &mut offset)?);
    }
    Ok(rows)
}

/// Append the values at `columns`, without a count prefix. Used as hash input.
pub fn encode_key(buf: &mut Vec<u8>, row: &Row, columns: &[usize]) {
    for &col in columns {
        encode_value(buf, row.get(col).unwrap_or(&TypedValue::Null));
    }
}

pub fn encode_value(buf: &mut Vec<u8>, val: &TypedValue) {
    match val {
        TypedValue::Null => buf.push(TAG_NULL),
        TypedValue::Bool(v) => {
            buf.push(TAG_BOOL);
            buf.push(u8::from(*v));
        }
        TypedValue::Int32(v) => {
            buf.push(TAG_INT32);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        TypedValue::Int64(v) => {
            buf.push(TAG_INT64);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        TypedValue::Float(v) => {
            buf.push(TAG_FLOAT);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        TypedValue::Double(v) => {
            buf.push(TAG_DOUBLE);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        TypedValue::String(s) => {
            buf.push(TAG_STRING);
            let bytes = s.as_bytes();
            buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            buf.extend_from_slice(bytes);
        }
        TypedValue::Blob(b) => {
            buf.push(TAG_BLOB);
            buf.extend_from_slice(&(b.len() as u32).to_le_bytes());
            buf.extend_from_slice(b);
        }
        TypedValue::List(items) => {
            buf.push(TAG_LIST);
            buf.extend_from_slice(&(items.len() as u32).to_le_bytes());
            for item in items {
                encode_value(buf, item);
            }
        }
        TypedValue::Struct(fields) => {
            buf.push(TAG_STRUCT);
            buf.extend_from_slice(&(fields.len() as u32).to_le_bytes());
            for (name, value) in fields {
                let bytes = name.as_bytes();
                buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                buf.extend_from_slice(bytes);
                encode_value(buf, value);
            }
        }
    }
}

pub fn decode_value(data: &[u8], offset: &mut usize) -> TyrResult<TypedValue> {
    let [tag] = read_array::<1>(data, offset)?;

    match tag {
        TAG_NULL => Ok(TypedValue::Null),
        TAG_BOOL => {
            let [b] = read_array::<1>(data, offset)?;
            Ok(TypedValue::Bool(b != 0))
        }
        TAG_INT32 => Ok(TypedValue::Int32(i32::from_le_bytes(read_array(data, offset)?))),
        TAG_INT64 => Ok(TypedValue::Int64(i64::from_le_bytes(read_array(data, offset)?))),
        TAG_FLOAT => Ok(TypedValue::Float(f32::from_le_bytes(read_array(data, offset)?))),
        TAG_DOUBLE => Ok(TypedValue::Double(f64::from_le_bytes(read_array(data, offset)?))),
        TAG_STRING => Ok(TypedValue::String(read_str(data, offset)?)),
        TAG_BLOB => {
            let len = read_u32_le(data, offset)? as usize;
            Ok(TypedValue::Blob(read_slice(data, offset, len)?.to_vec()))
        }
        TAG_LIST => {
            let n = read_u32_le(data, offset)? as usize;
            let mut items = Vec::with_capacity(n.min(data.len()));
            for _ in 0..n {
                items.push(decode_value(data, offset)?);
            }
            Ok(TypedValue::List(items))
        }
        TAG_STRUCT => {
            let n = read_u32_le(data, offset)? as usize;
            let mut fields = Vec::with_capacity(n.min(data.len()));
            for _ in 0..n {
                let name = read_str(data, offset)?;
                fields.push((name, decode_value(data, offset)?));
            }
            Ok(TypedValue::Struct(fields))
        }
        _ => Err(TyrError::Execution(format!("unknown wire tag: {tag}"))),
    }
}

fn read_str(data: &[u8], offset: &mut usize) -> TyrResult<SmolStr> {
    let len = read_u32_le(data, offset)? as usize;
    let bytes = read_slice(data, offset, len)?;
    let s = std::str::from_utf8(bytes)
        .map_err(|e| TyrError::Execution(format!("invalid UTF-8 in wire data: {e}")))?;
    Ok(SmolStr::new(s))
}

fn read_u32_le(data: &[u8], offset: &mut usize) -> TyrResult<u32> {
    read_array(data, offset).map(u32::from_le_bytes)
}

fn read_array<const N: usize>(data: &[u8], offset: &mut usize) -> TyrResult<[u8; N]> {
    let slice = read_slice(data, offset, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    Ok(out)
}

fn read_slice<'a>(data: &'a [u8], offset: &mut usize, len: usize) -> TyrResult<&'a [u8]> {
    let end = offset
        .checked_add(len)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| TyrError::Execution("unexpected end of wire data".into()))?;
    let slice = &data[*offset..end];
    *offset = end;
    Ok(slice)
}
