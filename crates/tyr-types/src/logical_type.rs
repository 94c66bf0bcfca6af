use smol_str::SmolStr;

/// Closed, recursive type tag for everything a row or a file can physically hold.
///
/// User-defined types never appear here: a descriptor declares one of these
/// as its internal shape, and that shape is what flows through operators,
/// files and the wire.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LogicalType {
    Bool,
    Int32,
    Int64,
    Float,
    Double,
    String,
    Blob,
    List(Box<LogicalType>),
    Struct(Vec<(SmolStr, LogicalType)>),
}

impl LogicalType {
    /// Convenience constructor for `List(elem)`.
    pub fn list(element: LogicalType) -> Self {
        Self::List(Box::new(element))
    }

    /// Human-readable type name for error messages.
    pub fn type_name(&self) -> std::borrow::Cow<'static, str> {
        match self {
            Self::Bool => "BOOL".into(),
            Self::Int32 => "INT32".into(),
            Self::Int64 => "INT64".into(),
            Self::Float => "FLOAT".into(),
            Self::Double => "DOUBLE".into(),
            Self::String => "STRING".into(),
            Self::Blob => "BLOB".into(),
            Self::List(inner) => format!("{}[]", inner.type_name()).into(),
            Self::Struct(fields) => {
                let fields_str: Vec<_> = fields
                    .iter()
                    .map(|(name, ty)| format!("{name}: {}", ty.type_name()))
                    .collect();
                format!("STRUCT({})", fields_str.join(", ")).into()
            }
        }
    }

    /// Element type of a list, `None` for everything else.
    pub fn element_type(&self) -> Option<&LogicalType> {
        match self {
            Self::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// Whether this is a numeric type (integer or floating-point).
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int32 | Self::Int64 | Self::Float | Self::Double
        )
    }

    /// Whether this is an integer type.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }

    /// Whether this is a nested type (List, Struct).
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::List(_) | Self::Struct(_))
    }

    /// Whether values of this type have a total order usable for sorting.
    pub fn is_orderable(&self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Int32 | Self::Int64 | Self::Float | Self::Double | Self::String
        )
    }
}

impl std::fmt::Display for LogicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}
