//! Aggregate operator: hash-based GROUP BY + aggregation.
//!
//! Rows are first redistributed by the hash of their group keys, so every
//! group lives in exactly one partition; each partition then aggregates
//! independently. Groups are emitted in first-seen order per partition.

use hashbrown::HashMap;
use rayon::prelude::*;
use smol_str::SmolStr;
use tyr_catalog::{ColumnType, Dataset, Field, Row, Schema};
use tyr_common::{TyrError, TyrResult};
use tyr_expression::compare_values;
use tyr_types::{LogicalType, TypedValue};

use crate::context::ExecutionContext;
use crate::operators::repartition::RepartitionOp;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateFunction {
    /// First value seen in the group, of any column type.
    First,
    /// Rows in the group (no column) or non-null values (with a column).
    Count,
    Min,
    Max,
    Sum,
}

impl AggregateFunction {
    /// Parse a function name (case-insensitive).
    pub fn from_name(name: &str) -> TyrResult<Self> {
        match name.to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "count" => Ok(Self::Count),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "sum" => Ok(Self::Sum),
            _ => Err(TyrError::Function(format!("unknown aggregate function '{name}'"))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AggregateSpec {
    pub function: AggregateFunction,
    /// Input column; `None` only for `count(*)`.
    pub column: Option<usize>,
    pub alias: SmolStr,
}

impl AggregateSpec {
    pub fn new(function: AggregateFunction, column: Option<usize>, alias: impl Into<SmolStr>) -> Self {
        Self {
            function,
            column,
            alias: alias.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AggregateOp {
    pub group_by: Vec<usize>,
    pub aggregates: Vec<AggregateSpec>,
}

impl AggregateOp {
    pub fn new(group_by: Vec<usize>, aggregates: Vec<AggregateSpec>) -> Self {
        Self {
            group_by,
            aggregates,
        }
    }

    /// Group columns keep their fields; `first` keeps its input column type,
    /// including a user-defined one.
    pub fn output_schema(&self, input: &Schema) -> TyrResult<Schema> {
        let mut fields = Vec::with_capacity(self.group_by.len() + self.aggregates.len());
        for &col in &self.group_by {
            fields.push(input.field_at(col)?.clone());
        }
        for agg in &self.aggregates {
            let column_type = match (agg.function, agg.column) {
                (AggregateFunction::Count, _) => ColumnType::Native(LogicalType::Int64),
                (_, None) => {
                    return Err(TyrError::Schema(format!(
                        "{}() needs an input column",
                        agg.function.name()
                    )));
                }
                (AggregateFunction::First, Some(col)) => input.field_at(col)?.column_type.clone(),
                (AggregateFunction::Min | AggregateFunction::Max, Some(col)) => {
                    let field = input.field_at(col)?;
                    if field.column_type.is_user_defined() || !field.storage_type().is_orderable() {
                        return Err(TyrError::Schema(format!(
                            "{}() is not defined for column '{}' of type {}",
                            agg.function.name(),
                            field.name,
                            field.column_type
                        )));
                    }
                    field.column_type.clone()
                }
                (AggregateFunction::Sum, Some(col)) => {
                    let field = input.field_at(col)?;
                    match &field.column_type {
                        ColumnType::Native(ty) if ty.is_integer() => ColumnType::Native(LogicalType::Int64),
                        ColumnType::Native(LogicalType::Float | LogicalType::Double) => {
                            ColumnType::Native(LogicalType::Double)
                        }
                        other => {
                            return Err(TyrError::Schema(format!(
                                "sum() is not defined for column '{}' of type {other}",
                                field.name
                            )));
                        }
                    }
                }
            };
            let nullable = agg.function != AggregateFunction::Count;
            fields.push(Field::new(agg.alias.clone(), column_type, nullable));
        }
        Schema::new(fields)
    }

    pub fn execute(&self, ctx: &ExecutionContext<'_>, input: Dataset) -> TyrResult<Dataset> {
        let out_schema = self.output_schema(input.schema())?.into_arc();

        // A global aggregate yields exactly one row, even for empty input.
        if self.group_by.is_empty() {
            let mut groups = Groups::new(self.aggregates.len());
            for row in input.rows() {
                groups.accumulate(self, row)?;
            }
            groups.ensure_empty_group(self.aggregates.len());
            return Ok(Dataset::new(out_schema, vec![groups.finish(self)]));
        }

        let shuffled = RepartitionOp::hash(self.group_by.clone(), ctx.config.default_partitions)
            .execute(ctx, input)?;

        let partitions = ctx.install(|| {
            shuffled
                .partitions()
                .par_iter()
                .map(|rows| {
                    let mut groups = Groups::new(self.aggregates.len());
                    for row in rows {
                        groups.accumulate(self, row)?;
                    }
                    Ok(groups.finish(self))
                })
                .collect::<TyrResult<Vec<_>>>()
        })?;

        tracing::debug!(
            groups = partitions.iter().map(Vec::len).sum::<usize>(),
            "aggregated"
        );
        Ok(Dataset::new(out_schema, partitions))
    }
}

/// Group key -> accumulators, plus first-seen order.
struct Groups {
    num_aggs: usize,
    states: HashMap<Vec<TypedValue>, Vec<AccState>>,
    insertion_order: Vec<Vec<TypedValue>>,
}

impl Groups {
    fn new(num_aggs: usize) -> Self {
        Self {
            num_aggs,
            states: HashMap::new(),
            insertion_order: Vec::new(),
        }
    }

    fn accumulate(&mut self, op: &AggregateOp, row: &Row) -> TyrResult<()> {
        let key: Vec<TypedValue> = op
            .group_by
            .iter()
            .map(|&col| row.get(col).cloned().unwrap_or(TypedValue::Null))
            .collect();

        if !self.states.contains_key(&key) {
            self.insertion_order.push(key.clone());
        }
        let num_aggs = self.num_aggs;
        let accs = self
            .states
            .entry(key)
            .or_insert_with(|| (0..num_aggs).map(|_| AccState::new()).collect());

        for (acc, agg) in accs.iter_mut().zip(&op.aggregates) {
            let val = agg.column.and_then(|col| row.get(col));
            acc.accumulate(agg.function, agg.column.is_none(), val)?;
        }
        Ok(())
    }

    fn ensure_empty_group(&mut self, num_aggs: usize) {
        if self.states.is_empty() {
            self.states
                .insert(Vec::new(), (0..num_aggs).map(|_| AccState::new()).collect());
            self.insertion_order.push(Vec::new());
        }
    }

    fn finish(mut self, op: &AggregateOp) -> Vec<Row> {
        let mut rows = Vec::with_capacity(self.insertion_order.len());
        for key in std::mem::take(&mut self.insertion_order) {
            let Some(accs) = self.states.remove(&key) else {
                continue;
            };
            let mut values = key;
            for (acc, agg) in accs.into_iter().zip(&op.aggregates) {
                values.push(acc.finalize(agg.function));
            }
            rows.push(Row::new(values));
        }
        rows
    }
}

/// Per-group accumulator state.
struct AccState {
    count: i64,
    sum_i64: i64,
    sum_f64: f64,
    is_float: bool,
    seen: bool,
    first: Option<TypedValue>,
    min: Option<TypedValue>,
    max: Option<TypedValue>,
}

impl AccState {
    fn new() -> Self {
        Self {
            count: 0,
            sum_i64: 0,
            sum_f64: 0.0,
            is_float: false,
            seen: false,
            first: None,
            min: None,
            max: None,
        }
    }

    fn accumulate(&mut self, func: AggregateFunction, star: bool, val: Option<&TypedValue>) -> TyrResult<()> {
        let val = val.unwrap_or(&TypedValue::Null);
        match func {
            AggregateFunction::First => {
                if self.first.is_none() {
                    self.first = Some(val.clone());
                }
            }
            AggregateFunction::Count => {
                if star || !val.is_null() {
                    self.count += 1;
                }
            }
            AggregateFunction::Sum => match val {
                TypedValue::Int32(_) | TypedValue::Int64(_) => {
                    let v = val.as_i64().unwrap_or_default();
                    self.sum_i64 = self
                        .sum_i64
                        .checked_add(v)
                        .ok_or_else(|| TyrError::Execution("integer overflow in sum()".into()))?;
                    self.seen = true;
                }
                TypedValue::Float(_) | TypedValue::Double(_) => {
                    self.sum_f64 += val.as_f64().unwrap_or_default();
                    self.is_float = true;
                    self.seen = true;
                }
                _ => {}
            },
            AggregateFunction::Min => {
                if !val.is_null() {
                    let replace = match &self.min {
                        None => true,
                        Some(current) => compare_values(val, current)?.is_lt(),
                    };
                    if replace {
                        self.min = Some(val.clone());
                    }
                }
            }
            AggregateFunction::Max => {
                if !val.is_null() {
                    let replace = match &self.max {
                        None => true,
                        Some(current) => compare_values(val, current)?.is_gt(),
                    };
                    if replace {
                        self.max = Some(val.clone());
                    }
                }
            }
        }
        Ok(())
    }

    fn finalize(self, func: AggregateFunction) -> TypedValue {
        match func {
            AggregateFunction::First => self.first.unwrap_or(TypedValue::Null),
            AggregateFunction::Count => TypedValue::Int64(self.count),
            AggregateFunction::Sum if !self.seen => TypedValue::Null,
            AggregateFunction::Sum if self.is_float => TypedValue::Double(self.sum_f64 + self.sum_i64 as f64),
            AggregateFunction::Sum => TypedValue::Int64(self.sum_i64),
            AggregateFunction::Min => self.min.unwrap_or(TypedValue::Null),
            AggregateFunction::Max => self.max.unwrap_or(TypedValue::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{Floats, dataset};
    use tyr_common::EngineConfig;
    use tyr_expression::FunctionRegistry;

    fn by_group(out: &Dataset) -> Vec<Vec<TypedValue>> {
        let mut rows: Vec<Vec<TypedValue>> = out.rows().map(|r| r.values().to_vec()).collect();
        rows.sort_by_key(|r| r[0].as_i64());
        rows
    }

    #[test]
    fn group_by_with_count_sum_min_max() {
        let reg = FunctionRegistry::new();
        let config = EngineConfig::default();
        let ctx = ExecutionContext::new(&reg, &config);
        let op = AggregateOp::new(
            vec![1],
            vec![
                AggregateSpec::new(AggregateFunction::Count, None, "n"),
                AggregateSpec::new(AggregateFunction::Sum, Some(0), "total"),
                AggregateSpec::new(AggregateFunction::Min, Some(0), "lo"),
                AggregateSpec::new(AggregateFunction::Max, Some(0), "hi"),
            ],
        );
        let out = op.execute(&ctx, dataset(6, 2, 3)).unwrap();
        assert_eq!(
            by_group(&out),
            vec![
                vec![
                    TypedValue::Int64(0),
                    TypedValue::Int64(3),
                    TypedValue::Int64(6),
                    TypedValue::Int64(0),
                    TypedValue::Int64(4)
                ],
                vec![
                    TypedValue::Int64(1),
                    TypedValue::Int64(3),
                    TypedValue::Int64(9),
                    TypedValue::Int64(1),
                    TypedValue::Int64(5)
                ],
            ]
        );
    }

    #[test]
    fn first_keeps_user_defined_type() {
        let reg = FunctionRegistry::new();
        let config = EngineConfig::default();
        let ctx = ExecutionContext::new(&reg, &config);
        let input = dataset(6, 2, 2);
        let op = AggregateOp::new(
            vec![1],
            vec![AggregateSpec::new(AggregateFunction::First, Some(2), "v")],
        );
        let out = op.execute(&ctx, input.clone()).unwrap();
        assert!(out.schema().field(1).unwrap().column_type.is_user_defined());

        let originals: Vec<Floats> = input.host_column_as::<Floats>("vec").unwrap().into_iter().flatten().collect();
        for v in out.host_column_as::<Floats>("v").unwrap() {
            assert!(originals.contains(&v.unwrap()));
        }
    }

    #[test]
    fn global_aggregate_on_empty_input() {
        let reg = FunctionRegistry::new();
        let config = EngineConfig::default();
        let ctx = ExecutionContext::new(&reg, &config);
        let op = AggregateOp::new(
            vec![],
            vec![
                AggregateSpec::new(AggregateFunction::Count, None, "n"),
                AggregateSpec::new(AggregateFunction::Sum, Some(0), "s"),
            ],
        );
        let out = op.execute(&ctx, dataset(0, 1, 2)).unwrap();
        assert_eq!(
            out.rows().next().unwrap().values(),
            &[TypedValue::Int64(0), TypedValue::Null]
        );
    }

    #[test]
    fn min_on_user_defined_rejected() {
        let op = AggregateOp::new(
            vec![],
            vec![AggregateSpec::new(AggregateFunction::Min, Some(2), "m")],
        );
        let err = op.output_schema(dataset(1, 1, 1).schema()).unwrap_err();
        assert!(matches!(err, TyrError::Schema(_)));
    }

    #[test]
    fn parse_names() {
        assert_eq!(AggregateFunction::from_name("FIRST").unwrap(), AggregateFunction::First);
        assert!(AggregateFunction::from_name("median").is_err());
    }
}
