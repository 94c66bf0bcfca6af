use crate::error::{TyrError, TyrResult};

/// Configuration for a session.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Number of partitions for new datasets and aggregation shuffles. Default: 4.
    pub default_partitions: usize,
    /// Maximum number of worker threads. Default: number of CPUs.
    pub max_threads: usize,
    /// Split a partition into several Parquet files above this many rows.
    /// Zero means one file per partition. Default: 0.
    pub max_rows_per_file: usize,
    /// Snappy-compress Parquet pages. Default: true.
    pub compression: bool,
    /// Maximum Parquet row group size. Default: 8192.
    pub parquet_row_group_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_partitions: 4,
            max_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            max_rows_per_file: 0,
            compression: true,
            parquet_row_group_size: 8192,
        }
    }
}

impl EngineConfig {
    /// Reject settings no session can run with.
    pub fn validate(&self) -> TyrResult<()> {
        if self.default_partitions == 0 {
            return Err(TyrError::Internal(
                "default_partitions must be at least 1".into(),
            ));
        }
        if self.max_threads == 0 {
            return Err(TyrError::Internal("max_threads must be at least 1".into()));
        }
        if self.parquet_row_group_size == 0 {
            return Err(TyrError::Internal(
                "parquet_row_group_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
