//! QueryResult: the collected output of a dataset, plus rendering.

use std::fmt;
use std::sync::Arc;

use tyr_catalog::{Dataset, Row, Schema};
use tyr_types::value::hex_encode;
use tyr_types::{LogicalType, TypedValue};

/// Collected rows together with the schema that interprets them.
#[derive(Clone, Debug)]
pub struct QueryResult {
    pub schema: Arc<Schema>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn new(schema: Arc<Schema>, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    /// Gather every partition in partition order.
    pub fn from_dataset(dataset: Dataset) -> Self {
        let schema = dataset.schema().clone();
        let rows = dataset.into_partitions().into_iter().flatten().collect();
        Self { schema, rows }
    }

    pub fn num_columns(&self) -> usize {
        self.schema.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Compact rendering: `[c1,c2],[c1,c2]`.
    ///
    /// Every cell is rendered from its column's storage type, so a
    /// user-defined column prints its internal form.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push('[');
            for (col, value) in row.values().iter().enumerate() {
                if col > 0 {
                    out.push(',');
                }
                let ty = self.schema.field(col).map(|f| f.storage_type());
                render_value(&mut out, value, ty.as_ref());
            }
            out.push(']');
        }
        out
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<&str> = self.schema.fields().iter().map(|field| field.name.as_str()).collect();
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                row.values()
                    .iter()
                    .enumerate()
                    .map(|(col, value)| {
                        let mut s = String::new();
                        let ty = self.schema.field(col).map(|f| f.storage_type());
                        render_value(&mut s, value, ty.as_ref());
                        s
                    })
                    .collect()
            })
            .collect();
        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(col, h)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(col).map(String::len))
                    .chain(std::iter::once(h.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{h:<w$}"))
            .collect();
        writeln!(f, "| {} |", header.join(" | "))?;
        writeln!(
            f,
            "|{}|",
            widths
                .iter()
                .map(|w| "-".repeat(w + 2))
                .collect::<Vec<_>>()
                .join("|")
        )?;
        for row in &cells {
            let row: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{cell:>w$}"))
                .collect();
            writeln!(f, "| {} |", row.join(" | "))?;
        }
        writeln!(f, "({} row{})", self.rows.len(), if self.rows.len() == 1 { "" } else { "s" })
    }
}

/// Render one cell. The declared type decides float precision: a `FLOAT`
/// column prints single-precision digits even when the cell carries a double.
fn render_value(out: &mut String, value: &TypedValue, ty: Option<&LogicalType>) {
    match (value, ty) {
        (TypedValue::Null, _) => out.push_str("null"),
        (TypedValue::Bool(v), _) => out.push_str(if *v { "true" } else { "false" }),
        (TypedValue::Int32(v), _) => out.push_str(&v.to_string()),
        (TypedValue::Int64(v), _) => out.push_str(&v.to_string()),
        (TypedValue::Float(v), _) => out.push_str(&format_f64(f64::from(*v), v.to_string())),
        (TypedValue::Double(v), Some(LogicalType::Float)) => {
            let narrow = *v as f32;
            out.push_str(&format_f64(f64::from(narrow), narrow.to_string()))
        }
        (TypedValue::Double(v), _) => out.push_str(&format_f64(*v, v.to_string())),
        (TypedValue::String(s), _) => out.push_str(s),
        (TypedValue::Blob(b), _) => {
            out.push_str("\\x");
            out.push_str(&hex_encode(b));
        }
        (TypedValue::List(items), ty) => {
            let elem = match ty {
                Some(LogicalType::List(elem)) => Some(elem.as_ref()),
                _ => None,
            };
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                render_value(out, item, elem);
            }
            out.push(']');
        }
        (TypedValue::Struct(fields), ty) => {
            let declared = match ty {
                Some(LogicalType::Struct(declared)) => Some(declared.as_slice()),
                _ => None,
            };
            out.push('[');
            for (i, (_, field)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let field_ty = declared.and_then(|d| d.get(i)).map(|(_, t)| t);
                render_value(out, field, field_ty);
            }
            out.push(']');
        }
    }
}

/// Integral finite values keep one decimal (`1.0`); everything else uses
/// the shortest representation that round-trips.
fn format_f64(v: f64, shortest: String) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        shortest
    }
}
