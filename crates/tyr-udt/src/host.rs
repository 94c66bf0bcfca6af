//! Type-erased host values.

use std::any::Any;
use std::fmt;

/// A host value of some user-defined type, viewed without knowing its type.
///
/// Implemented for every `Clone + PartialEq + Debug + Send + Sync` type, so
/// host types only need ordinary derives. Equality across the erased view is
/// structural: two values are equal iff they have the same concrete type and
/// that type's `PartialEq` says so.
pub trait HostValue: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    /// Structural equality against another erased value.
    fn eq_host(&self, other: &dyn HostValue) -> bool;

    fn clone_host(&self) -> Box<dyn HostValue>;

    /// Rust type name of the concrete host type.
    fn host_type_name(&self) -> &'static str;
}

impl<T> HostValue for T
where
    T: Any + Send + Sync + fmt::Debug + Clone + PartialEq,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_host(&self, other: &dyn HostValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn clone_host(&self) -> Box<dyn HostValue> {
        Box::new(self.clone())
    }

    fn host_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl dyn HostValue {
    /// Borrow the concrete host value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Whether the concrete host value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl PartialEq for dyn HostValue {
    fn eq(&self, other: &Self) -> bool {
        self.eq_host(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Celsius(f64);

    #[derive(Clone, Debug, PartialEq)]
    struct Fahrenheit(f64);

    #[test]
    fn downcast_and_is() {
        let boxed: Box<dyn HostValue> = Box::new(Celsius(21.5));
        assert!(boxed.is::<Celsius>());
        assert!(!boxed.is::<Fahrenheit>());
        assert_eq!(boxed.downcast_ref::<Celsius>(), Some(&Celsius(21.5)));
    }

    #[test]
    fn structural_equality_across_erasure() {
        let a: Box<dyn HostValue> = Box::new(Celsius(1.0));
        let b: Box<dyn HostValue> = Box::new(Celsius(1.0));
        let c: Box<dyn HostValue> = Box::new(Celsius(2.0));
        assert!(a == b);
        assert!(a != c);
    }

    #[test]
    fn different_types_never_equal() {
        let a: Box<dyn HostValue> = Box::new(Celsius(1.0));
        let b: Box<dyn HostValue> = Box::new(Fahrenheit(1.0));
        assert!(a != b);
    }

    #[test]
    fn clone_host_is_deep() {
        let a: Box<dyn HostValue> = Box::new(vec![1i64, 2, 3]);
        let b = a.clone_host();
        assert!(*a == *b);
        assert!(b.host_type_name().contains("Vec"));
    }
}
