//! tyr-types: LogicalType, TypedValue (internal form), shape validation.

pub mod logical_type;
pub mod shape;
pub mod type_utils;
pub mod value;

pub use logical_type::LogicalType;
pub use shape::validate_shape;
pub use value::TypedValue;
