//! The statically typed user-defined type capability.

use std::fmt;

use tyr_common::{TyrError, TyrResult};
use tyr_types::{LogicalType, TypedValue, validate_shape};

/// Input to [`UserDefinedType::to_host`]: either internal form or a value
/// that is already a host instance.
#[derive(Clone, Debug, PartialEq)]
pub enum HostInput<H> {
    Internal(TypedValue),
    Host(H),
}

/// A host value type that can live in a column.
///
/// Implementations are immutable and carry only fixed configuration, so one
/// instance is shared by every partition of every dataset in a session.
///
/// Laws:
/// - `deserialize(serialize(v)) == v` for every valid `v`.
/// - `serialize(v)` conforms to `sql_type()`, with nested nulls only when
///   `contains_null()` is true.
/// - `deserialize` rejects malformed input with `TyrError::Shape`; it never
///   truncates or pads.
pub trait UserDefinedType: Send + Sync + fmt::Debug + 'static {
    /// The wrapped host type. Its `PartialEq` must be structural.
    type Host: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// Stable name, unique within a session. Persisted with datasets.
    fn name(&self) -> &str;

    /// The internal shape values of this type are stored as.
    fn sql_type(&self) -> LogicalType;

    /// Whether the internal shape may hold nulls below the top level.
    fn contains_null(&self) -> bool {
        false
    }

    fn serialize(&self, host: &Self::Host) -> TyrResult<TypedValue>;

    fn deserialize(&self, datum: &TypedValue) -> TyrResult<Self::Host>;

    /// Deserialize internal form, or pass a host instance through unchanged.
    fn to_host(&self, input: HostInput<Self::Host>) -> TyrResult<Self::Host> {
        match input {
            HostInput::Host(host) => Ok(host),
            HostInput::Internal(datum) => self.deserialize(&datum),
        }
    }

    /// Rust type name of the host type.
    fn host_class(&self) -> &'static str {
        std::any::type_name::<Self::Host>()
    }
}

/// Serialize, check the shape, deserialize, and compare with the original.
///
/// Returns the deserialized value on success. A mismatch reports both sides.
pub fn verify_round_trip<U: UserDefinedType>(udt: &U, value: &U::Host) -> TyrResult<U::Host> {
    let datum = udt.serialize(value)?;
    validate_shape(&datum, &udt.sql_type(), udt.contains_null())?;
    let back = udt.deserialize(&datum)?;
    if &back != value {
        return Err(TyrError::RoundTripMismatch {
            expected: format!("{value:?}"),
            actual: format!("{back:?}"),
        });
    }
    Ok(back)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Point, PointUdt};

    #[test]
    fn point_round_trip() {
        let udt = PointUdt;
        let p = Point { x: 1.5, y: -2.0 };
        assert_eq!(verify_round_trip(&udt, &p).unwrap(), p);
    }

    #[test]
    fn to_host_passes_host_through() {
        let udt = PointUdt;
        let p = Point { x: 3.0, y: 4.0 };
        assert_eq!(udt.to_host(HostInput::Host(p.clone())).unwrap(), p);
    }

    #[test]
    fn to_host_deserializes_internal() {
        let udt = PointUdt;
        let p = Point { x: 3.0, y: 4.0 };
        let datum = udt.serialize(&p).unwrap();
        assert_eq!(udt.to_host(HostInput::Internal(datum)).unwrap(), p);
    }

    #[test]
    fn lossy_type_reports_both_values() {
        let udt = crate::fixtures::LossyUdt;
        let err = verify_round_trip(&udt, &vec![1, 2, 3]).unwrap_err();
        match err {
            TyrError::RoundTripMismatch { expected, actual } => {
                assert_eq!(expected, "[1, 2, 3]");
                assert_eq!(actual, "[1, 2]");
            }
            other => panic!("expected RoundTripMismatch, got {other:?}"),
        }
    }

    #[test]
    fn host_class_names_the_host_type() {
        assert!(PointUdt.host_class().ends_with("Point"));
    }
}
