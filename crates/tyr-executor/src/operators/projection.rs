//! Projection operator: evaluates an expression list per row.
//!
//! A bare column keeps its declared type, so a user-defined column passes
//! through untouched: its internal form is copied, never deserialized.

use rayon::prelude::*;
use smol_str::SmolStr;
use tyr_catalog::{Dataset, Field, Row, Schema};
use tyr_common::TyrResult;
use tyr_expression::{BoundExpression, FunctionRegistry, evaluate};

use crate::context::ExecutionContext;

#[derive(Clone, Debug)]
pub struct ProjectionOp {
    pub items: Vec<(SmolStr, BoundExpression)>,
}

impl ProjectionOp {
    pub fn new(items: Vec<(SmolStr, BoundExpression)>) -> Self {
        Self { items }
    }

    /// Keep the named columns, in order.
    pub fn columns(schema: &Schema, names: &[&str]) -> TyrResult<Self> {
        let items = names
            .iter()
            .map(|name| {
                let index = schema.column_index(name)?;
                Ok((SmolStr::new(name), BoundExpression::column(index)))
            })
            .collect::<TyrResult<Vec<_>>>()?;
        Ok(Self::new(items))
    }

    pub fn output_schema(&self, input: &Schema, registry: &FunctionRegistry) -> TyrResult<Schema> {
        let fields = self
            .items
            .iter()
            .map(|(alias, expr)| {
                Ok(Field::new(
                    alias.clone(),
                    expr.column_type(input, registry)?,
                    expr.nullable(input),
                ))
            })
            .collect::<TyrResult<Vec<_>>>()?;
        Schema::new(fields)
    }

    pub fn execute(&self, ctx: &ExecutionContext<'_>, input: Dataset) -> TyrResult<Dataset> {
        let in_schema = input.schema().clone();
        let out_schema = self.output_schema(&in_schema, ctx.registry)?.into_arc();
        let registry = ctx.registry;

        let partitions = ctx.install(|| {
            input
                .partitions()
                .par_iter()
                .map(|rows| {
                    rows.iter()
                        .map(|row| {
                            let values = self
                                .items
                                .iter()
                                .map(|(_, expr)| evaluate(expr, row, &in_schema, registry))
                                .collect::<TyrResult<Vec<_>>>()?;
                            Ok(Row::new(values))
                        })
                        .collect::<TyrResult<Vec<_>>>()
                })
                .collect::<TyrResult<Vec<_>>>()
        })?;

        Ok(Dataset::new(out_schema, partitions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{Floats, dataset};
    use tyr_common::EngineConfig;
    use tyr_types::{LogicalType, TypedValue};

    #[test]
    fn keeps_user_defined_column_type() {
        let reg = FunctionRegistry::new();
        let config = EngineConfig::default();
        let ctx = ExecutionContext::new(&reg, &config);
        let input = dataset(4, 2, 2);
        let op = ProjectionOp::columns(input.schema(), &["vec", "id"]).unwrap();
        let out = op.execute(&ctx, input.clone()).unwrap();

        assert_eq!(out.schema().field(0).unwrap().column_type, input.schema().field(2).unwrap().column_type);
        assert_eq!(out.num_partitions(), 2);
        assert_eq!(
            out.host_column_as::<Floats>("vec").unwrap(),
            input.host_column_as::<Floats>("vec").unwrap()
        );
    }

    #[test]
    fn function_over_host_value() {
        let mut reg = FunctionRegistry::new();
        reg.register_host_fn::<Floats, i64, _>("len", LogicalType::Int64, |f| Ok(f.0.len() as i64));
        let config = EngineConfig::default();
        let ctx = ExecutionContext::new(&reg, &config);
        let op = ProjectionOp::new(vec![(
            SmolStr::new("n"),
            BoundExpression::call("len", vec![BoundExpression::column(2)]),
        )]);
        let out = op.execute(&ctx, dataset(3, 1, 1)).unwrap();
        assert_eq!(out.column_values("n").unwrap(), vec![TypedValue::Int64(2); 3]);
        assert!(!out.schema().field(0).unwrap().column_type.is_user_defined());
    }

    #[test]
    fn unknown_column() {
        let input = dataset(1, 1, 1);
        assert!(ProjectionOp::columns(input.schema(), &["missing"]).is_err());
    }
}
