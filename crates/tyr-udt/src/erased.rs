//! The type-erased view of a user-defined type.
//!
//! Schemas hold columns of many different user-defined types side by side, so
//! they store `Arc<dyn DynUserDefinedType>` rather than a generic parameter.
//! [`udt_ref`] wraps any [`UserDefinedType`] into that form.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use tyr_common::{TyrError, TyrResult};
use tyr_types::{LogicalType, TypedValue, validate_shape};

use crate::host::HostValue;
use crate::udt::UserDefinedType;

/// Shared handle to a registered user-defined type.
pub type UdtRef = Arc<dyn DynUserDefinedType>;

/// Input to [`DynUserDefinedType::deserialize_host`].
#[derive(Clone, Copy, Debug)]
pub enum HostRef<'a> {
    Internal(&'a TypedValue),
    Host(&'a dyn HostValue),
}

/// Object-safe counterpart of [`UserDefinedType`].
///
/// Unlike the typed trait, both directions validate: `serialize_host` checks
/// the produced datum against `sql_type()`, and `deserialize_host` checks its
/// input before handing it to the type.
pub trait DynUserDefinedType: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn sql_type(&self) -> LogicalType;

    fn contains_null(&self) -> bool;

    fn host_class(&self) -> &'static str;

    fn host_type_id(&self) -> TypeId;

    /// Convert a host value to internal form.
    ///
    /// Fails with `TypeMismatch` when `host` is not this type's host type and
    /// with `Shape` when the type produces a datum that does not conform.
    fn serialize_host(&self, host: &dyn HostValue) -> TyrResult<TypedValue>;

    /// Convert internal form to a host value; host values pass through as a
    /// clone when they already have this type's host type.
    fn deserialize_host(&self, input: HostRef<'_>) -> TyrResult<Box<dyn HostValue>>;
}

struct ErasedUdt<U>(U);

impl<U: fmt::Debug> fmt::Debug for ErasedUdt<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<U: UserDefinedType> DynUserDefinedType for ErasedUdt<U> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn sql_type(&self) -> LogicalType {
        self.0.sql_type()
    }

    fn contains_null(&self) -> bool {
        self.0.contains_null()
    }

    fn host_class(&self) -> &'static str {
        self.0.host_class()
    }

    fn host_type_id(&self) -> TypeId {
        TypeId::of::<U::Host>()
    }

    fn serialize_host(&self, host: &dyn HostValue) -> TyrResult<TypedValue> {
        let Some(host) = host.downcast_ref::<U::Host>() else {
            return Err(TyrError::type_mismatch(
                format!("{} ({})", self.0.host_class(), self.0.name()),
                host.host_type_name(),
            ));
        };
        let datum = self.0.serialize(host)?;
        if datum.is_null() {
            return Err(TyrError::Shape(format!(
                "{} serialized a value to NULL",
                self.0.name()
            )));
        }
        validate_shape(&datum, &self.0.sql_type(), self.0.contains_null())?;
        Ok(datum)
    }

    fn deserialize_host(&self, input: HostRef<'_>) -> TyrResult<Box<dyn HostValue>> {
        match input {
            HostRef::Host(host) => {
                if host.is::<U::Host>() {
                    Ok(host.clone_host())
                } else {
                    Err(TyrError::type_mismatch(
                        format!("{} ({})", self.0.host_class(), self.0.name()),
                        host.host_type_name(),
                    ))
                }
            }
            HostRef::Internal(datum) => {
                if datum.is_null() {
                    return Err(TyrError::Shape(format!(
                        "cannot deserialize NULL as {}",
                        self.0.name()
                    )));
                }
                validate_shape(datum, &self.0.sql_type(), self.0.contains_null())?;
                Ok(Box::new(self.0.deserialize(datum)?))
            }
        }
    }
}

/// Erase a user-defined type into a shareable handle.
pub fn udt_ref<U: UserDefinedType>(udt: U) -> UdtRef {
    Arc::new(ErasedUdt(udt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{BrokenUdt, Point, PointUdt};
    use smol_str::SmolStr;

    #[test]
    fn metadata_is_forwarded() {
        let udt = udt_ref(PointUdt);
        assert_eq!(udt.name(), "point");
        assert!(!udt.contains_null());
        assert_eq!(udt.host_type_id(), TypeId::of::<Point>());
        assert!(matches!(udt.sql_type(), LogicalType::Struct(ref f) if f.len() == 2));
    }

    #[test]
    fn serialize_then_deserialize() {
        let udt = udt_ref(PointUdt);
        let p = Point { x: 1.0, y: 2.0 };
        let datum = udt.serialize_host(&p).unwrap();
        let back = udt.deserialize_host(HostRef::Internal(&datum)).unwrap();
        assert_eq!(back.downcast_ref::<Point>(), Some(&p));
    }

    #[test]
    fn serialize_rejects_foreign_host() {
        let udt = udt_ref(PointUdt);
        let err = udt.serialize_host(&42i64).unwrap_err();
        match err {
            TyrError::TypeMismatch { expected, found } => {
                assert!(expected.contains("point"));
                assert_eq!(found, "i64");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn serialize_validates_output() {
        let udt = udt_ref(BrokenUdt);
        let err = udt.serialize_host(&7i64).unwrap_err();
        assert!(matches!(err, TyrError::Shape(_)));
    }

    #[test]
    fn host_input_passes_through() {
        let udt = udt_ref(PointUdt);
        let p = Point { x: 5.0, y: 6.0 };
        let back = udt.deserialize_host(HostRef::Host(&p)).unwrap();
        assert_eq!(back.downcast_ref::<Point>(), Some(&p));
    }

    #[test]
    fn foreign_host_input_rejected() {
        let udt = udt_ref(PointUdt);
        let err = udt.deserialize_host(HostRef::Host(&"text".to_string())).unwrap_err();
        assert!(matches!(err, TyrError::TypeMismatch { .. }));
    }

    #[test]
    fn malformed_internal_rejected() {
        let udt = udt_ref(PointUdt);
        let short = TypedValue::Struct(vec![(SmolStr::new("x"), TypedValue::Double(1.0))]);
        assert!(matches!(
            udt.deserialize_host(HostRef::Internal(&short)),
            Err(TyrError::Shape(_))
        ));
        assert!(matches!(
            udt.deserialize_host(HostRef::Internal(&TypedValue::Null)),
            Err(TyrError::Shape(_))
        ));
    }
}
