//! Dataset reader: one partition per data file.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rayon::prelude::*;
use tyr_catalog::{Dataset, Row, Schema, TypeCatalog};
use tyr_common::{TyrError, TyrResult};

use crate::arrow_convert::{UDT_NAME_KEY, batch_to_rows, to_arrow_schema};
use crate::manifest::Manifest;

/// Read the dataset in `dir`, resolving user-defined columns through `catalog`.
pub fn read_dataset(dir: &Path, catalog: &TypeCatalog) -> TyrResult<Dataset> {
    let manifest = Manifest::read(dir)?;
    let schema = manifest.resolve_schema(catalog)?.into_arc();
    read_files(dir, &manifest, schema)
}

/// Read the dataset in `dir` with a caller-supplied schema.
pub fn read_dataset_with_schema(dir: &Path, schema: Arc<Schema>) -> TyrResult<Dataset> {
    let manifest = Manifest::read(dir)?;
    manifest.check_schema(&schema)?;
    read_files(dir, &manifest, schema)
}

fn read_files(dir: &Path, manifest: &Manifest, schema: Arc<Schema>) -> TyrResult<Dataset> {
    if manifest.files.is_empty() {
        return Ok(Dataset::empty(schema));
    }
    let expected = to_arrow_schema(&schema);

    let partitions = manifest
        .files
        .par_iter()
        .map(|name| read_file(&dir.join(name), &schema, &expected))
        .collect::<TyrResult<Vec<_>>>()?;

    let dataset = Dataset::new(schema, partitions);
    if dataset.num_rows() as u64 != manifest.num_rows {
        return Err(TyrError::Storage(format!(
            "'{}' holds {} rows, the manifest records {}",
            dir.display(),
            dataset.num_rows(),
            manifest.num_rows
        )));
    }
    tracing::info!(
        path = %dir.display(),
        rows = dataset.num_rows(),
        partitions = dataset.num_partitions(),
        "dataset loaded"
    );
    Ok(dataset)
}

fn read_file(path: &Path, schema: &Schema, expected: &SchemaRef) -> TyrResult<Vec<Row>> {
    let file = File::open(path)
        .map_err(|e| TyrError::Storage(format!("cannot open '{}': {e}", path.display())))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| TyrError::Storage(format!("invalid Parquet file '{}': {e}", path.display())))?;
    check_file_schema(path, builder.schema(), expected)?;

    let reader = builder
        .build()
        .map_err(|e| TyrError::Storage(format!("cannot read Parquet '{}': {e}", path.display())))?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| TyrError::Storage(format!("Parquet batch error: {e}")))?;
        rows.extend(batch_to_rows(&batch, schema)?);
    }
    for row in &rows {
        schema.validate_row(row.values()).map_err(|e| {
            TyrError::SchemaMismatch(format!("'{}': {e}", path.display()))
        })?;
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "file read");
    Ok(rows)
}

fn check_file_schema(path: &Path, found: &SchemaRef, expected: &SchemaRef) -> TyrResult<()> {
    if found.fields().len() != expected.fields().len() {
        return Err(TyrError::SchemaMismatch(format!(
            "'{}' has {} columns, expected {}",
            path.display(),
            found.fields().len(),
            expected.fields().len()
        )));
    }
    for (f, e) in found.fields().iter().zip(expected.fields()) {
        let same = f.name() == e.name()
            && f.data_type() == e.data_type()
            && f.metadata().get(UDT_NAME_KEY) == e.metadata().get(UDT_NAME_KEY);
        if !same {
            return Err(TyrError::SchemaMismatch(format!(
                "'{}': column '{}' is stored as {}, expected '{}' as {}",
                path.display(),
                f.name(),
                f.data_type(),
                e.name(),
                e.data_type()
            )));
        }
    }
    Ok(())
}
