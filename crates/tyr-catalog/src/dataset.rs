use std::sync::Arc;

use tyr_common::{TyrError, TyrResult};
use tyr_types::TypedValue;
use tyr_udt::HostValue;

use crate::row::Row;
use crate::schema::Schema;

/// A logically partitioned, immutable sequence of rows sharing one schema.
#[derive(Clone, Debug)]
pub struct Dataset {
    schema: Arc<Schema>,
    partitions: Vec<Vec<Row>>,
}

impl Dataset {
    pub fn new(schema: Arc<Schema>, partitions: Vec<Vec<Row>>) -> Self {
        Self { schema, partitions }
    }

    /// Split `rows` into `num_partitions` contiguous partitions.
    ///
    /// Earlier partitions receive one extra row when the count does not
    /// divide evenly, so every partition is non-empty while rows remain.
    pub fn from_rows(schema: Arc<Schema>, rows: Vec<Row>, num_partitions: usize) -> Self {
        let n = num_partitions.max(1);
        let base = rows.len() / n;
        let extra = rows.len() % n;
        let mut partitions = Vec::with_capacity(n);
        let mut iter = rows.into_iter();
        for i in 0..n {
            let take = base + usize::from(i < extra);
            partitions.push(iter.by_ref().take(take).collect());
        }
        Self { schema, partitions }
    }

    pub fn empty(schema: Arc<Schema>) -> Self {
        Self::new(schema, vec![Vec::new()])
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn partitions(&self) -> &[Vec<Row>] {
        &self.partitions
    }

    pub fn into_partitions(self) -> Vec<Vec<Row>> {
        self.partitions
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn num_rows(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    /// All rows, partition by partition.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.partitions.iter().flatten()
    }

    /// Internal-form values of one column, in row order.
    pub fn column_values(&self, name: &str) -> TyrResult<Vec<TypedValue>> {
        let idx = self.schema.column_index(name)?;
        Ok(self
            .rows()
            .map(|row| row.get(idx).cloned().unwrap_or(TypedValue::Null))
            .collect())
    }

    /// Deserialized host values of a user-defined column, in row order.
    pub fn host_column(&self, name: &str) -> TyrResult<Vec<Option<Box<dyn HostValue>>>> {
        let idx = self.schema.column_index(name)?;
        self.rows().map(|row| row.host(&self.schema, idx)).collect()
    }

    /// Like [`Dataset::host_column`], downcast to `H`.
    pub fn host_column_as<H: HostValue + Clone>(&self, name: &str) -> TyrResult<Vec<Option<H>>> {
        let idx = self.schema.column_index(name)?;
        self.rows()
            .map(|row| row.host_as::<H>(&self.schema, idx))
            .collect()
    }

    /// Check every row against the schema.
    pub fn validate(&self) -> TyrResult<()> {
        for (p, rows) in self.partitions.iter().enumerate() {
            for row in rows {
                self.schema.validate_row(row.values()).map_err(|e| match e {
                    TyrError::Schema(msg) => TyrError::Schema(format!("partition {p}: {msg}")),
                    other => other,
                })?;
            }
        }
        Ok(())
    }
}
