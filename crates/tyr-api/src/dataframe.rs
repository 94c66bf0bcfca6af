//! DataFrame: a lazily built operator chain over one source dataset.
//!
//! Every builder step resolves column names against the current output
//! schema, so a bad name fails when the step is added rather than at
//! `collect`.

use std::path::Path;
use std::sync::Arc;

use smol_str::SmolStr;
use tyr_catalog::{ColumnType, Dataset, Schema};
use tyr_common::{TyrError, TyrResult};
use tyr_executor::{
    AggregateFunction, AggregateOp, AggregateSpec, FilterOp, LimitOp, OrderByOp, PhysicalOperator,
    ProjectionOp, QueryResult, RepartitionOp, SortOrder, execute_plan,
};
use tyr_expression::BoundExpression;
use tyr_storage::Manifest;
use tyr_types::LogicalType;

use crate::session::Session;

#[derive(Clone, Debug)]
pub struct DataFrame<'s> {
    session: &'s Session,
    source: Dataset,
    plan: Vec<PhysicalOperator>,
    schema: Arc<Schema>,
}

impl<'s> DataFrame<'s> {
    pub(crate) fn new(session: &'s Session, source: Dataset) -> Self {
        let schema = Arc::clone(source.schema());
        Self {
            session,
            source,
            plan: Vec::new(),
            schema,
        }
    }

    /// Output schema of the chain built so far.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Operators added so far, in execution order.
    pub fn plan(&self) -> &[PhysicalOperator] {
        &self.plan
    }

    fn push(mut self, op: impl Into<PhysicalOperator>) -> TyrResult<Self> {
        let op = op.into();
        self.schema = op
            .output_schema(&self.schema, self.session.registry())?
            .into_arc();
        self.plan.push(op);
        Ok(self)
    }

    fn column_indices(&self, names: &[&str]) -> TyrResult<Vec<usize>> {
        names.iter().map(|n| self.schema.column_index(n)).collect()
    }

    pub fn limit(self, n: u64) -> TyrResult<Self> {
        self.skip_limit(0, n)
    }

    pub fn skip_limit(self, skip: u64, limit: u64) -> TyrResult<Self> {
        self.push(LimitOp::new(skip, limit))
    }

    /// Keep the named columns, in the given order.
    pub fn select(self, names: &[&str]) -> TyrResult<Self> {
        let op = ProjectionOp::columns(&self.schema, names)?;
        self.push(op)
    }

    /// Project arbitrary expressions under the given aliases.
    pub fn project(self, items: Vec<(&str, BoundExpression)>) -> TyrResult<Self> {
        let items = items
            .into_iter()
            .map(|(alias, expr)| (SmolStr::new(alias), expr))
            .collect();
        self.push(ProjectionOp::new(items))
    }

    /// Keep rows where `predicate` is true. The predicate must be boolean.
    pub fn filter(self, predicate: BoundExpression) -> TyrResult<Self> {
        let ty = predicate.column_type(&self.schema, self.session.registry())?;
        if ty != ColumnType::Native(LogicalType::Bool) {
            return Err(TyrError::type_mismatch("BOOL predicate", ty.type_name()));
        }
        self.push(FilterOp::new(predicate))
    }

    pub fn order_by(self, keys: &[(&str, SortOrder)]) -> TyrResult<Self> {
        let keys = keys
            .iter()
            .map(|(name, order)| Ok((self.schema.column_index(name)?, *order)))
            .collect::<TyrResult<Vec<_>>>()?;
        self.push(OrderByOp::new(keys))
    }

    /// Redistribute rows round-robin over `n` partitions.
    pub fn repartition(self, n: usize) -> TyrResult<Self> {
        self.push(RepartitionOp::round_robin(n))
    }

    /// Redistribute rows by the hash of the named columns.
    pub fn repartition_by(self, columns: &[&str], n: usize) -> TyrResult<Self> {
        let columns = self.column_indices(columns)?;
        self.push(RepartitionOp::hash(columns, n))
    }

    pub fn group_by(self, columns: &[&str]) -> TyrResult<GroupedDataFrame<'s>> {
        let group_by = self.column_indices(columns)?;
        Ok(GroupedDataFrame { frame: self, group_by })
    }

    /// Global aggregate: one output row even when the input is empty.
    pub fn agg(self, aggregates: &[(&str, &str, &str)]) -> TyrResult<Self> {
        GroupedDataFrame {
            frame: self,
            group_by: Vec::new(),
        }
        .agg(aggregates)
    }

    /// Run the chain on the session's pool.
    pub fn collect(self) -> TyrResult<Dataset> {
        let ctx = self.session.context();
        execute_plan(&ctx, &self.plan, self.source)
    }

    pub fn collect_result(self) -> TyrResult<QueryResult> {
        self.collect().map(QueryResult::from_dataset)
    }

    /// Run the chain and persist its output under `dir`.
    pub fn write(self, dir: &Path) -> TyrResult<Manifest> {
        let session = self.session;
        let out = self.collect()?;
        session.write_dataset(&out, dir)
    }
}

/// A DataFrame waiting for its aggregate list.
#[derive(Clone, Debug)]
pub struct GroupedDataFrame<'s> {
    frame: DataFrame<'s>,
    group_by: Vec<usize>,
}

impl<'s> GroupedDataFrame<'s> {
    /// Aggregate each group. Every entry is `(function, column, alias)`;
    /// the column is `*` for `count(*)`.
    pub fn agg(self, aggregates: &[(&str, &str, &str)]) -> TyrResult<DataFrame<'s>> {
        let specs = aggregates
            .iter()
            .map(|&(function, column, alias)| {
                let function = AggregateFunction::from_name(function)?;
                let column = match column {
                    "*" => None,
                    name => Some(self.frame.schema.column_index(name)?),
                };
                Ok(AggregateSpec::new(function, column, alias))
            })
            .collect::<TyrResult<Vec<_>>>()?;
        self.frame.push(AggregateOp::new(self.group_by, specs))
    }
}
