use crate::logical_type::LogicalType;

/// Cost of an implicit cast from `from` to `to`.
/// Returns `None` if no implicit cast is possible.
/// Lower cost = more preferred.
pub fn implicit_cast_cost(from: &LogicalType, to: &LogicalType) -> Option<u32> {
    if from == to {
        return Some(0);
    }

    match (from, to) {
        // Integer widening
        (LogicalType::Int32, LogicalType::Int64) => Some(1),

        // Integer to float
        (from, LogicalType::Float) if from.is_integer() => Some(10),
        (from, LogicalType::Double) if from.is_integer() => Some(10),

        // Float to double
        (LogicalType::Float, LogicalType::Double) => Some(1),

        // Lists cast element-wise.
        (LogicalType::List(a), LogicalType::List(b)) => implicit_cast_cost(a, b),

        _ => None,
    }
}
