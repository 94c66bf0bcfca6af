//! Filter operator: evaluates a predicate per row, keeps passing rows.

use rayon::prelude::*;
use tyr_catalog::{Dataset, Row};
use tyr_common::{TyrError, TyrResult};
use tyr_expression::{BoundExpression, evaluate};
use tyr_types::{LogicalType, TypedValue};

use crate::context::ExecutionContext;

#[derive(Clone, Debug)]
pub struct FilterOp {
    pub predicate: BoundExpression,
}

impl FilterOp {
    pub fn new(predicate: BoundExpression) -> Self {
        Self { predicate }
    }

    /// Keep rows where the predicate is `true`; `false` and null drop the row.
    pub fn execute(&self, ctx: &ExecutionContext<'_>, input: Dataset) -> TyrResult<Dataset> {
        let schema = input.schema().clone();
        let ty = self.predicate.column_type(&schema, ctx.registry)?;
        if ty.is_user_defined() || ty.storage_type() != LogicalType::Bool {
            return Err(TyrError::type_mismatch("BOOL predicate", ty.type_name()));
        }
        let registry = ctx.registry;

        let partitions = ctx.install(|| {
            input
                .partitions()
                .par_iter()
                .map(|rows| {
                    let mut kept: Vec<Row> = Vec::with_capacity(rows.len());
                    for row in rows {
                        match evaluate(&self.predicate, row, &schema, registry)? {
                            TypedValue::Bool(true) => kept.push(row.clone()),
                            TypedValue::Bool(false) | TypedValue::Null => {}
                            other => {
                                return Err(TyrError::type_mismatch("BOOL", other.kind_name()));
                            }
                        }
                    }
                    Ok(kept)
                })
                .collect::<TyrResult<Vec<_>>>()
        })?;

        Ok(Dataset::new(schema, partitions))
    }
}
