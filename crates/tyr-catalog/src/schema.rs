use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;
use tyr_common::{TyrError, TyrResult};
use tyr_types::{LogicalType, TypedValue, validate_shape};
use tyr_udt::UdtRef;

/// The declared type of a column: a built-in logical type or a user-defined
/// type backed by a descriptor.
#[derive(Clone)]
pub enum ColumnType {
    Native(LogicalType),
    UserDefined(UdtRef),
}

impl ColumnType {
    /// The type values of this column are stored as.
    pub fn storage_type(&self) -> LogicalType {
        match self {
            Self::Native(ty) => ty.clone(),
            Self::UserDefined(udt) => udt.sql_type(),
        }
    }

    /// Whether nulls may appear below the top level of a stored value.
    /// Native columns allow them; user-defined columns follow the descriptor.
    pub fn allows_nested_nulls(&self) -> bool {
        match self {
            Self::Native(_) => true,
            Self::UserDefined(udt) => udt.contains_null(),
        }
    }

    pub fn udt(&self) -> Option<&UdtRef> {
        match self {
            Self::UserDefined(udt) => Some(udt),
            Self::Native(_) => None,
        }
    }

    pub fn is_user_defined(&self) -> bool {
        matches!(self, Self::UserDefined(_))
    }

    /// Human-readable type name: the logical type name, or the descriptor name.
    pub fn type_name(&self) -> String {
        match self {
            Self::Native(ty) => ty.type_name().into_owned(),
            Self::UserDefined(udt) => udt.name().to_string(),
        }
    }
}

// Descriptors compare by identity of what they persist, not by pointer.
impl PartialEq for ColumnType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Native(a), Self::Native(b)) => a == b,
            (Self::UserDefined(a), Self::UserDefined(b)) => {
                a.name() == b.name()
                    && a.sql_type() == b.sql_type()
                    && a.contains_null() == b.contains_null()
                    && a.host_type_id() == b.host_type_id()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(ty) => write!(f, "Native({ty:?})"),
            Self::UserDefined(udt) => {
                write!(f, "UserDefined({}: {})", udt.name(), udt.sql_type())
            }
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

impl From<LogicalType> for ColumnType {
    fn from(ty: LogicalType) -> Self {
        Self::Native(ty)
    }
}

impl From<UdtRef> for ColumnType {
    fn from(udt: UdtRef) -> Self {
        Self::UserDefined(udt)
    }
}

/// A single named column.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: SmolStr,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<SmolStr>, column_type: impl Into<ColumnType>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            nullable,
        }
    }

    pub fn storage_type(&self) -> LogicalType {
        self.column_type.storage_type()
    }
}

/// Ordered, immutable list of columns. Shared as `Arc<Schema>`.
#[derive(Clone, Debug)]
pub struct Schema {
    fields: Vec<Field>,
    /// name -> position.
    name_index: HashMap<SmolStr, usize>,
}

impl Schema {
    /// Build a schema. Column names must be unique.
    pub fn new(fields: Vec<Field>) -> TyrResult<Self> {
        let mut name_index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if name_index.insert(field.name.clone(), i).is_some() {
                return Err(TyrError::Schema(format!(
                    "duplicate column name '{}'",
                    field.name
                )));
            }
        }
        Ok(Self { fields, name_index })
    }

    pub fn empty() -> Self {
        Self {
            fields: Vec::new(),
            name_index: HashMap::new(),
        }
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    /// Position of a column, or a schema error naming it.
    pub fn column_index(&self, name: &str) -> TyrResult<usize> {
        self.index_of(name)
            .ok_or_else(|| TyrError::Schema(format!("unknown column '{name}'")))
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    /// Field at `idx`, or a schema error.
    pub fn field_at(&self, idx: usize) -> TyrResult<&Field> {
        self.fields.get(idx).ok_or_else(|| {
            TyrError::Schema(format!(
                "column index {idx} out of range for {} columns",
                self.fields.len()
            ))
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Schema with only the columns at `indices`, in that order.
    pub fn project(&self, indices: &[usize]) -> TyrResult<Self> {
        let fields = indices
            .iter()
            .map(|&i| self.field_at(i).cloned())
            .collect::<TyrResult<Vec<_>>>()?;
        Self::new(fields)
    }

    /// Check arity, nullability and per-column shape of a row's values.
    pub fn validate_row(&self, values: &[TypedValue]) -> TyrResult<()> {
        if values.len() != self.fields.len() {
            return Err(TyrError::Schema(format!(
                "row has {} values, schema has {} columns",
                values.len(),
                self.fields.len()
            )));
        }
        for (value, field) in values.iter().zip(&self.fields) {
            if value.is_null() {
                if !field.nullable {
                    return Err(TyrError::Schema(format!(
                        "column '{}' is not nullable",
                        field.name
                    )));
                }
                continue;
            }
            validate_shape(
                value,
                &field.storage_type(),
                field.column_type.allows_nested_nulls(),
            )
            .map_err(|e| match e {
                TyrError::Shape(msg) => TyrError::Shape(format!("column '{}': {msg}", field.name)),
                other => other,
            })?;
        }
        Ok(())
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.name, field.column_type)?;
            if !field.nullable {
                write!(f, " NOT NULL")?;
            }
        }
        write!(f, "}}")
    }
}
