use std::sync::Arc;

use tyr_common::{TyrError, TyrResult};
use tyr_types::TypedValue;
use tyr_udt::{HostRef, HostValue};

use crate::schema::{ColumnType, Schema};

/// An immutable row of column values in internal form.
///
/// Cloning is cheap: the values are shared. A row holds no reference to any
/// type descriptor; host access goes through the schema by column position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Row {
    values: Arc<[TypedValue]>,
}

impl Row {
    pub fn new(values: Vec<TypedValue>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn get(&self, idx: usize) -> Option<&TypedValue> {
        self.values.get(idx)
    }

    pub fn values(&self) -> &[TypedValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row with only the values at `indices`, in that order.
    pub fn project(&self, indices: &[usize]) -> TyrResult<Self> {
        let values = indices
            .iter()
            .map(|&i| {
                self.values.get(i).cloned().ok_or_else(|| {
                    TyrError::Schema(format!(
                        "column index {i} out of range for row of {} values",
                        self.values.len()
                    ))
                })
            })
            .collect::<TyrResult<Vec<_>>>()?;
        Ok(Self::new(values))
    }

    /// Deserialize the value at `idx` through the schema's descriptor.
    ///
    /// Returns `None` for a null cell. Fails with a schema error when the
    /// column is not user-defined.
    pub fn host(&self, schema: &Schema, idx: usize) -> TyrResult<Option<Box<dyn HostValue>>> {
        let field = schema.field_at(idx)?;
        let ColumnType::UserDefined(udt) = &field.column_type else {
            return Err(TyrError::Schema(format!(
                "column '{}' has native type {}, not a user-defined type",
                field.name, field.column_type
            )));
        };
        match self.values.get(idx) {
            None | Some(TypedValue::Null) => Ok(None),
            Some(datum) => udt.deserialize_host(HostRef::Internal(datum)).map(Some),
        }
    }

    /// Like [`Row::host`], downcast to the concrete host type `H`.
    pub fn host_as<H: HostValue + Clone>(&self, schema: &Schema, idx: usize) -> TyrResult<Option<H>> {
        match self.host(schema, idx)? {
            None => Ok(None),
            Some(host) => host.downcast_ref::<H>().cloned().map(Some).ok_or_else(|| {
                TyrError::type_mismatch(std::any::type_name::<H>(), host.host_type_name())
            }),
        }
    }
}

impl From<Vec<TypedValue>> for Row {
    fn from(values: Vec<TypedValue>) -> Self {
        Self::new(values)
    }
}

enum Cell {
    Value(TypedValue),
    Host(Box<dyn HostValue>),
}

/// Builds a row from a mix of internal values and host values.
///
/// Host values are serialized by the target column's descriptor in
/// [`RowBuilder::finish`], which also validates the finished row.
#[derive(Default)]
pub struct RowBuilder {
    cells: Vec<Cell>,
}

impl RowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value already in internal form.
    pub fn value(mut self, value: impl Into<TypedValue>) -> Self {
        self.cells.push(Cell::Value(value.into()));
        self
    }

    pub fn null(self) -> Self {
        self.value(TypedValue::Null)
    }

    /// Append a host value for a user-defined column.
    pub fn host<H: HostValue>(mut self, host: H) -> Self {
        self.cells.push(Cell::Host(Box::new(host)));
        self
    }

    /// Append an optional host value; `None` becomes a null cell.
    pub fn host_opt<H: HostValue>(self, host: Option<H>) -> Self {
        match host {
            Some(h) => self.host(h),
            None => self.null(),
        }
    }

    /// Serialize host cells and validate the row against `schema`.
    pub fn finish(self, schema: &Schema) -> TyrResult<Row> {
        if self.cells.len() != schema.len() {
            return Err(TyrError::Schema(format!(
                "row has {} values, schema has {} columns",
                self.cells.len(),
                schema.len()
            )));
        }
        let values = self
            .cells
            .into_iter()
            .zip(schema.fields())
            .map(|(cell, field)| match cell {
                Cell::Value(v) => Ok(v),
                Cell::Host(host) => match &field.column_type {
                    ColumnType::UserDefined(udt) => udt.serialize_host(host.as_ref()),
                    ColumnType::Native(ty) => Err(TyrError::type_mismatch(
                        ty.type_name(),
                        host.host_type_name(),
                    )),
                },
            })
            .collect::<TyrResult<Vec<_>>>()?;
        schema.validate_row(&values)?;
        Ok(Row::new(values))
    }
}
