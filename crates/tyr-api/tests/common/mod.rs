#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ext_set::OpenHashSet;
use ext_sketch::HyperLogLog;
use ext_vector::DenseVector;
use tyr_api::{Dataset, EngineConfig, Field, LogicalType, Row, RowBuilder, Schema, Session};

/// A fresh directory under the system temp dir, removed on drop.
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("tyr_api_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&path);
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

pub fn session(partitions: usize) -> Session {
    Session::with_builtin_extensions(EngineConfig {
        default_partitions: partitions,
        max_threads: 2,
        ..EngineConfig::default()
    })
    .unwrap()
}

/// id INT64 NOT NULL, grp INT64, vec dense_vector, seen hyperloglog, tags set_string.
pub fn mixed_schema(session: &Session) -> Arc<Schema> {
    let types = session.types();
    Schema::new(vec![
        Field::new("id", LogicalType::Int64, false),
        Field::new("grp", LogicalType::Int64, true),
        Field::new("vec", types.resolve("dense_vector").unwrap(), true),
        Field::new("seen", types.resolve("hyperloglog").unwrap(), true),
        Field::new("tags", types.resolve("set_string").unwrap(), true),
    ])
    .unwrap()
    .into_arc()
}

/// `n` rows of every reference type; every fourth row has null host cells.
pub fn mixed_dataset(session: &Session, n: i64) -> Dataset {
    let schema = mixed_schema(session);
    let builders = (0..n)
        .map(|i| {
            let b = RowBuilder::new().value(i).value(i % 3);
            if i % 4 == 3 {
                return b.null().null().null();
            }
            let vec = DenseVector::new((0..=i % 5).map(|j| i as f64 + j as f64 * 0.1).collect());
            let mut hll = HyperLogLog::new(10).unwrap();
            for v in 0..i * 7 {
                hll.add_i64(v);
            }
            let tags: OpenHashSet<smol_str::SmolStr> =
                (0..i % 6).map(|t| smol_str::format_smolstr!("t{t}")).collect();
            b.host(vec).host(hll).host(tags)
        })
        .collect();
    session.create_dataset_from_builders(schema, builders).unwrap()
}

/// Rows sorted by the INT64 id in column 0.
pub fn sorted_rows(ds: &Dataset) -> Vec<Row> {
    let mut rows: Vec<Row> = ds.rows().cloned().collect();
    rows.sort_by_key(|r| r.get(0).and_then(|v| v.as_i64()));
    rows
}
