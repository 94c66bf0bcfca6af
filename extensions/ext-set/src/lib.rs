//! ext-set: `set_int32`, `set_int64` and `set_string` column types backed
//! by [`OpenHashSet`].
//!
//! Functions:
//! - `set_size(s)` → INT64
//! - `set_contains(s, v)` → BOOL, null when either argument is null

pub mod open_hash_set;

use std::fmt;
use std::marker::PhantomData;

use smol_str::SmolStr;
use tyr_common::{TyrError, TyrResult};
use tyr_expression::{FunctionArg, FunctionRegistry};
use tyr_extension::Extension;
use tyr_types::{LogicalType, TypedValue};
use tyr_udt::{HostValue, UdtRef, UserDefinedType, udt_ref};

pub use open_hash_set::{OpenHashSet, SetElement};

/// Stores an `OpenHashSet<T>` as `T[]` in slot order, without nested nulls.
pub struct OpenHashSetUdt<T> {
    name: String,
    _element: PhantomData<fn() -> T>,
}

impl<T: SetElement> OpenHashSetUdt<T> {
    pub fn new() -> Self {
        Self {
            name: format!("set_{}", T::TYPE_NAME),
            _element: PhantomData,
        }
    }
}

impl<T: SetElement> Default for OpenHashSetUdt<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for OpenHashSetUdt<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenHashSetUdt").field("name", &self.name).finish()
    }
}

impl<T: SetElement> UserDefinedType for OpenHashSetUdt<T> {
    type Host = OpenHashSet<T>;

    fn name(&self) -> &str {
        &self.name
    }

    fn sql_type(&self) -> LogicalType {
        LogicalType::list(T::logical_type())
    }

    fn serialize(&self, host: &OpenHashSet<T>) -> TyrResult<TypedValue> {
        Ok(TypedValue::List(host.iter().map(SetElement::to_value).collect()))
    }

    fn deserialize(&self, datum: &TypedValue) -> TyrResult<OpenHashSet<T>> {
        let items = datum.as_list().ok_or_else(|| {
            TyrError::Shape(format!(
                "{} expects {}, found {}",
                self.name,
                self.sql_type(),
                datum.kind_name()
            ))
        })?;
        let mut set = OpenHashSet::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let value = T::from_value(item).ok_or_else(|| {
                TyrError::Shape(format!(
                    "{} element {i}: expected {}, found {}",
                    self.name,
                    T::logical_type(),
                    item.kind_name()
                ))
            })?;
            set.insert(value);
        }
        Ok(set)
    }
}

/// Set extension: one column type per supported element type.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetExtension;

impl Extension for SetExtension {
    fn name(&self) -> &str {
        "set"
    }

    fn types(&self) -> Vec<UdtRef> {
        vec![
            udt_ref(OpenHashSetUdt::<i32>::new()),
            udt_ref(OpenHashSetUdt::<i64>::new()),
            udt_ref(OpenHashSetUdt::<SmolStr>::new()),
        ]
    }

    fn register_functions(&self, registry: &mut FunctionRegistry) {
        registry.register("set_size", 1, LogicalType::Int64, |args| {
            if args[0].is_null() {
                return Ok(TypedValue::Null);
            }
            let host = host_arg(&args[0])?;
            let len = set_len::<i32>(host)
                .or_else(|| set_len::<i64>(host))
                .or_else(|| set_len::<SmolStr>(host))
                .ok_or_else(|| not_a_set(host))?;
            Ok(TypedValue::Int64(len as i64))
        });
        registry.register("set_contains", 2, LogicalType::Bool, |args| {
            if args.iter().any(FunctionArg::is_null) {
                return Ok(TypedValue::Null);
            }
            let host = host_arg(&args[0])?;
            let probe = args[1].as_value().ok_or_else(|| {
                TyrError::type_mismatch("a scalar probe value", "a host value")
            })?;
            let found = contains::<i32>(host, probe)
                .or_else(|| contains::<i64>(host, probe))
                .or_else(|| contains::<SmolStr>(host, probe))
                .ok_or_else(|| not_a_set(host))?;
            Ok(TypedValue::Bool(found))
        });
    }
}

fn host_arg(arg: &FunctionArg) -> TyrResult<&dyn HostValue> {
    arg.as_host().ok_or_else(|| {
        TyrError::type_mismatch(
            "an open hash set",
            arg.as_value().map_or("a host value", TypedValue::kind_name),
        )
    })
}

fn set_len<T: SetElement>(host: &dyn HostValue) -> Option<usize> {
    host.downcast_ref::<OpenHashSet<T>>().map(OpenHashSet::len)
}

/// `None` when `host` is not a set of `T`; `Some(false)` when the probe
/// cannot be a `T`.
fn contains<T: SetElement>(host: &dyn HostValue, probe: &TypedValue) -> Option<bool> {
    let set = host.downcast_ref::<OpenHashSet<T>>()?;
    Some(T::from_probe(probe).is_some_and(|v| set.contains(&v)))
}

fn not_a_set(host: &dyn HostValue) -> TyrError {
    TyrError::type_mismatch("an open hash set", host.host_type_name())
}
