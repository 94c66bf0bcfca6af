//! Dataset writer: one or more Parquet files per non-empty partition.

use std::fs::File;
use std::path::Path;

use arrow::datatypes::SchemaRef;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rayon::prelude::*;
use tyr_catalog::{Dataset, Row};
use tyr_common::{EngineConfig, PartitionId, TyrError, TyrResult};

use crate::arrow_convert::{build_batch, to_arrow_schema};
use crate::manifest::{Manifest, SCHEMA_FILE};

/// Write `dataset` into `dir`, which must not already hold a dataset.
///
/// Partitions are written in parallel on the current rayon pool. A partition
/// larger than `config.max_rows_per_file` is split into numbered files.
pub fn write_dataset(dataset: &Dataset, dir: &Path, config: &EngineConfig) -> TyrResult<Manifest> {
    if dir.join(SCHEMA_FILE).exists() {
        return Err(TyrError::Storage(format!(
            "'{}' already contains a dataset",
            dir.display()
        )));
    }
    std::fs::create_dir_all(dir)?;

    let arrow_schema = to_arrow_schema(dataset.schema());
    let props = writer_properties(config);

    let files = dataset
        .partitions()
        .par_iter()
        .enumerate()
        .map(|(p, rows)| {
            let id = PartitionId(p as u32);
            if rows.is_empty() {
                tracing::warn!(partition = %id, "skipping empty partition");
                return Ok(Vec::new());
            }
            write_partition(dir, id, rows, &arrow_schema, &props, config.max_rows_per_file)
        })
        .collect::<TyrResult<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

    let manifest = Manifest::from_schema(dataset.schema(), files, dataset.num_rows() as u64);
    manifest.write(dir)?;

    tracing::info!(
        path = %dir.display(),
        rows = manifest.num_rows,
        files = manifest.files.len(),
        "dataset written"
    );
    Ok(manifest)
}

fn writer_properties(config: &EngineConfig) -> WriterProperties {
    let compression = if config.compression {
        Compression::SNAPPY
    } else {
        Compression::UNCOMPRESSED
    };
    WriterProperties::builder()
        .set_compression(compression)
        .set_max_row_group_size(config.parquet_row_group_size)
        .build()
}

fn write_partition(
    dir: &Path,
    id: PartitionId,
    rows: &[Row],
    arrow_schema: &SchemaRef,
    props: &WriterProperties,
    max_rows_per_file: usize,
) -> TyrResult<Vec<String>> {
    let chunk_size = if max_rows_per_file == 0 {
        rows.len()
    } else {
        max_rows_per_file
    };
    let chunks: Vec<&[Row]> = rows.chunks(chunk_size).collect();

    let mut files = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let name = if chunks.len() == 1 {
            format!("{}.parquet", id.file_stem())
        } else {
            format!("{}-{i:03}.parquet", id.file_stem())
        };
        write_file(&dir.join(&name), chunk, arrow_schema, props)?;
        files.push(name);
    }

    tracing::debug!(partition = %id, rows = rows.len(), files = files.len(), "partition written");
    Ok(files)
}

fn write_file(path: &Path, rows: &[Row], arrow_schema: &SchemaRef, props: &WriterProperties) -> TyrResult<()> {
    let batch = build_batch(arrow_schema, rows)?;
    let file = File::create(path)
        .map_err(|e| TyrError::Storage(format!("cannot create '{}': {e}", path.display())))?;

    let mut writer = ArrowWriter::try_new(file, arrow_schema.clone(), Some(props.clone()))
        .map_err(|e| TyrError::Storage(format!("failed to create Parquet writer: {e}")))?;
    writer
        .write(&batch)
        .map_err(|e| TyrError::Storage(format!("failed to write '{}': {e}", path.display())))?;
    writer
        .close()
        .map_err(|e| TyrError::Storage(format!("failed to close '{}': {e}", path.display())))?;
    Ok(())
}
