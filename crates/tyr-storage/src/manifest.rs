//! `_schema.json`: the dataset-level description written next to the files.

use std::path::Path;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tyr_catalog::{ColumnType, Field, Schema, TypeCatalog};
use tyr_common::{TyrError, TyrResult};
use tyr_types::LogicalType;

pub const SCHEMA_FILE: &str = "_schema.json";
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnManifest {
    pub name: SmolStr,
    pub storage_type: LogicalType,
    pub nullable: bool,
    pub contains_null: bool,
    /// Name of the column's user-defined type, if it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udt: Option<SmolStr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub columns: Vec<ColumnManifest>,
    /// Data files relative to the dataset directory, in partition order.
    pub files: Vec<String>,
    pub num_rows: u64,
}

impl Manifest {
    pub fn from_schema(schema: &Schema, files: Vec<String>, num_rows: u64) -> Self {
        let columns = schema
            .fields()
            .iter()
            .map(|field| ColumnManifest {
                name: field.name.clone(),
                storage_type: field.storage_type(),
                nullable: field.nullable,
                contains_null: field.column_type.allows_nested_nulls(),
                udt: field.column_type.udt().map(|udt| SmolStr::new(udt.name())),
            })
            .collect();
        Self {
            version: MANIFEST_VERSION,
            columns,
            files,
            num_rows,
        }
    }

    pub fn write(&self, dir: &Path) -> TyrResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TyrError::Storage(format!("cannot encode manifest: {e}")))?;
        std::fs::write(dir.join(SCHEMA_FILE), json)?;
        Ok(())
    }

    pub fn read(dir: &Path) -> TyrResult<Self> {
        let path = dir.join(SCHEMA_FILE);
        let json = std::fs::read_to_string(&path)
            .map_err(|e| TyrError::Storage(format!("cannot read '{}': {e}", path.display())))?;
        let manifest: Self = serde_json::from_str(&json)
            .map_err(|e| TyrError::Storage(format!("invalid manifest '{}': {e}", path.display())))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(TyrError::Storage(format!(
                "unsupported manifest version {} in '{}'",
                manifest.version,
                path.display()
            )));
        }
        Ok(manifest)
    }

    /// Rebuild the schema, resolving user-defined types by name.
    ///
    /// A resolved descriptor must store exactly what the dataset holds.
    pub fn resolve_schema(&self, catalog: &TypeCatalog) -> TyrResult<Schema> {
        let fields = self
            .columns
            .iter()
            .map(|col| {
                let column_type = match &col.udt {
                    None => ColumnType::Native(col.storage_type.clone()),
                    Some(name) => {
                        let udt = catalog.resolve(name)?;
                        if udt.sql_type() != col.storage_type || udt.contains_null() != col.contains_null {
                            return Err(TyrError::SchemaMismatch(format!(
                                "column '{}': type '{name}' stores {}, but the dataset holds {}",
                                col.name,
                                udt.sql_type(),
                                col.storage_type
                            )));
                        }
                        ColumnType::UserDefined(udt)
                    }
                };
                Ok(Field::new(col.name.clone(), column_type, col.nullable))
            })
            .collect::<TyrResult<Vec<_>>>()?;
        Schema::new(fields)
    }

    /// Check that an explicit `schema` can read this dataset.
    pub fn check_schema(&self, schema: &Schema) -> TyrResult<()> {
        if schema.len() != self.columns.len() {
            return Err(TyrError::SchemaMismatch(format!(
                "schema has {} columns, the dataset has {}",
                schema.len(),
                self.columns.len()
            )));
        }
        for (field, col) in schema.fields().iter().zip(&self.columns) {
            if field.name != col.name {
                return Err(TyrError::SchemaMismatch(format!(
                    "expected column '{}', found '{}'",
                    col.name, field.name
                )));
            }
            if field.storage_type() != col.storage_type {
                return Err(TyrError::SchemaMismatch(format!(
                    "column '{}': schema stores {}, the dataset holds {}",
                    col.name,
                    field.storage_type(),
                    col.storage_type
                )));
            }
            if !field.nullable && col.nullable {
                return Err(TyrError::SchemaMismatch(format!(
                    "column '{}' is nullable in the dataset",
                    col.name
                )));
            }
            let declared = field.column_type.udt().map(|udt| udt.name());
            if declared != col.udt.as_deref() {
                return Err(TyrError::SchemaMismatch(format!(
                    "column '{}': schema declares {}, the dataset holds {}",
                    col.name,
                    declared.map_or("a native type".to_string(), |n| format!("type '{n}'")),
                    col.udt.as_deref().map_or("a native type".to_string(), |n| format!("type '{n}'")),
                )));
            }
        }
        Ok(())
    }
}
