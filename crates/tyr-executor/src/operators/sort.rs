//! OrderBy operator: materializes all rows, sorts, then emits one partition.

use std::cmp::Ordering;

use tyr_catalog::{Dataset, Row};
use tyr_common::{TyrError, TyrResult};
use tyr_expression::compare_values;
use tyr_types::TypedValue;

use crate::context::ExecutionContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Clone, Debug)]
pub struct OrderByOp {
    pub keys: Vec<(usize, SortOrder)>,
}

impl OrderByOp {
    pub fn new(keys: Vec<(usize, SortOrder)>) -> Self {
        Self { keys }
    }

    /// Stable global sort. Nulls sort last in either direction.
    ///
    /// User-defined key columns are rejected: ordering them would mean
    /// comparing internal forms that carry no order.
    pub fn execute(&self, _ctx: &ExecutionContext<'_>, input: Dataset) -> TyrResult<Dataset> {
        let schema = input.schema().clone();
        for &(col, _) in &self.keys {
            let field = schema.field_at(col)?;
            if field.column_type.is_user_defined() || !field.storage_type().is_orderable() {
                return Err(TyrError::Schema(format!(
                    "cannot order by column '{}' of type {}",
                    field.name, field.column_type
                )));
            }
        }

        let mut rows: Vec<Row> = input.into_partitions().into_iter().flatten().collect();
        rows.sort_by(|a, b| {
            for &(col, order) in &self.keys {
                let cmp = compare_nulls_last(a.get(col), b.get(col), order);
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            Ordering::Equal
        });

        Ok(Dataset::new(schema, vec![rows]))
    }
}

fn compare_nulls_last(a: Option<&TypedValue>, b: Option<&TypedValue>, order: SortOrder) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let cmp = compare_values(a, b).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => cmp,
                SortOrder::Descending => cmp.reverse(),
            }
        }
    }
}
