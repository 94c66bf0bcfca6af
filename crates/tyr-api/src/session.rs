//! Session: top-level entry point owning the thread pool and registries.

use std::path::Path;
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use smol_str::SmolStr;
use tyr_catalog::{Dataset, Row, RowBuilder, Schema, TypeCatalog};
use tyr_common::{EngineConfig, TyrError, TyrResult};
use tyr_copy::JsonReader;
use tyr_executor::ExecutionContext;
use tyr_expression::FunctionRegistry;
use tyr_extension::Extension;
use tyr_storage::Manifest;
use tyr_udt::UdtRef;

use crate::dataframe::DataFrame;

/// An engine session.
///
/// Owns the configuration, a dedicated rayon pool, the catalog of
/// user-defined types and the function registry. Nothing is global: two
/// sessions never see each other's types or functions.
pub struct Session {
    config: EngineConfig,
    pool: ThreadPool,
    types: TypeCatalog,
    registry: FunctionRegistry,
    extensions: Vec<SmolStr>,
}

impl Session {
    /// Create a session with empty registries.
    pub fn new(config: EngineConfig) -> TyrResult<Self> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.max_threads)
            .thread_name(|i| format!("tyr-worker-{i}"))
            .build()
            .map_err(|e| TyrError::Internal(format!("cannot build thread pool: {e}")))?;
        Ok(Self {
            config,
            pool,
            types: TypeCatalog::new(),
            registry: FunctionRegistry::new(),
            extensions: Vec::new(),
        })
    }

    /// A session with the bundled `vector`, `sketch` and `set` extensions.
    pub fn with_builtin_extensions(config: EngineConfig) -> TyrResult<Self> {
        let mut session = Self::new(config)?;
        session.register_extension(&ext_vector::VectorExtension)?;
        session.register_extension(&ext_sketch::SketchExtension)?;
        session.register_extension(&ext_set::SetExtension)?;
        Ok(session)
    }

    /// Register an extension's types and functions.
    ///
    /// All or nothing: if any type clashes with a registered one, neither
    /// the catalog nor the function registry changes.
    pub fn register_extension(&mut self, ext: &dyn Extension) -> TyrResult<()> {
        let types = ext.types();
        let mut staged = self.types.clone();
        for udt in &types {
            staged.register(Arc::clone(udt))?;
        }
        self.types = staged;
        let before = self.registry.len();
        ext.register_functions(&mut self.registry);
        tracing::info!(
            extension = ext.name(),
            types = types.len(),
            functions = self.registry.len() - before,
            "extension registered"
        );
        self.extensions.push(SmolStr::new(ext.name()));
        Ok(())
    }

    /// Register a single user-defined type.
    pub fn register_type(&mut self, udt: UdtRef) -> TyrResult<()> {
        self.types.register(udt)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn types(&self) -> &TypeCatalog {
        &self.types
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    /// Names of registered extensions, in registration order.
    pub fn extensions(&self) -> &[SmolStr] {
        &self.extensions
    }

    /// Context for running operators on this session's pool.
    pub fn context(&self) -> ExecutionContext<'_> {
        ExecutionContext::new(&self.registry, &self.config).with_pool(&self.pool)
    }

    /// Build a dataset from rows in internal form, spread over
    /// `default_partitions`.
    pub fn create_dataset(&self, schema: Arc<Schema>, rows: Vec<Row>) -> TyrResult<Dataset> {
        for row in &rows {
            schema.validate_row(row.values())?;
        }
        Ok(Dataset::from_rows(schema, rows, self.config.default_partitions))
    }

    /// Build a dataset from row builders, serializing host cells.
    pub fn create_dataset_from_builders(
        &self,
        schema: Arc<Schema>,
        builders: Vec<RowBuilder>,
    ) -> TyrResult<Dataset> {
        let rows = builders
            .into_iter()
            .map(|b| b.finish(&schema))
            .collect::<TyrResult<Vec<_>>>()?;
        Ok(Dataset::from_rows(schema, rows, self.config.default_partitions))
    }

    /// Parse JSON lines against `schema`. Fails as a whole on the first bad record.
    pub fn read_json_lines(&self, schema: Arc<Schema>, text: &str) -> TyrResult<Dataset> {
        let rows = tyr_copy::read_json_lines(text, Arc::clone(&schema))?;
        Ok(Dataset::from_rows(schema, rows, self.config.default_partitions))
    }

    pub fn read_json_file(&self, schema: Arc<Schema>, path: &Path) -> TyrResult<Dataset> {
        let reader = JsonReader::open(path, Arc::clone(&schema))?;
        let rows = reader.collect::<TyrResult<Vec<_>>>()?;
        tracing::debug!(path = %path.display(), rows = rows.len(), "json file loaded");
        Ok(Dataset::from_rows(schema, rows, self.config.default_partitions))
    }

    /// Persist `dataset` as a directory of Parquet files plus a manifest.
    pub fn write_dataset(&self, dataset: &Dataset, dir: &Path) -> TyrResult<Manifest> {
        self.pool
            .install(|| tyr_storage::write_dataset(dataset, dir, &self.config))
    }

    /// Load a dataset, resolving user-defined columns through this
    /// session's type catalog.
    pub fn read_dataset(&self, dir: &Path) -> TyrResult<Dataset> {
        self.pool
            .install(|| tyr_storage::read_dataset(dir, &self.types))
    }

    /// Load a dataset under an explicit schema, which must agree with the
    /// persisted one.
    pub fn read_dataset_with_schema(&self, dir: &Path, schema: Arc<Schema>) -> TyrResult<Dataset> {
        self.pool
            .install(|| tyr_storage::read_dataset_with_schema(dir, schema))
    }

    /// Start a lazy operator chain over `dataset`.
    pub fn dataframe(&self, dataset: Dataset) -> DataFrame<'_> {
        DataFrame::new(self, dataset)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("threads", &self.pool.current_num_threads())
            .field("types", &self.types.len())
            .field("functions", &self.registry.len())
            .field("extensions", &self.extensions)
            .finish()
    }
}
