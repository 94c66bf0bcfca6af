//! Function registry: named host-invocable scalar functions.
//!
//! Owned by a session. Functions are indexed by `FunctionId` (O(1) lookup)
//! and by name (case-insensitive, O(1) via HashMap). Registering a name that
//! already exists replaces the previous definition in place.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use smol_str::SmolStr;
use tyr_common::{TyrError, TyrResult};
use tyr_types::{LogicalType, TypedValue};
use tyr_udt::HostValue;

use crate::bound_expr::FunctionId;
use crate::coercion::coerce_value;

/// One argument passed to a registered function.
///
/// A column of a user-defined type arrives as `Host`, already deserialized;
/// everything else, including a null user-defined cell, arrives as `Value`.
#[derive(Debug)]
pub enum FunctionArg {
    Value(TypedValue),
    Host(Box<dyn HostValue>),
}

impl FunctionArg {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(TypedValue::Null))
    }

    pub fn as_value(&self) -> Option<&TypedValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Host(_) => None,
        }
    }

    pub fn as_host(&self) -> Option<&dyn HostValue> {
        match self {
            Self::Host(h) => Some(h.as_ref()),
            Self::Value(_) => None,
        }
    }

    /// Borrow the host value as `H`, or fail with a type mismatch.
    pub fn host_as<H: HostValue>(&self) -> TyrResult<&H> {
        match self {
            Self::Host(h) => h.downcast_ref::<H>().ok_or_else(|| {
                TyrError::type_mismatch(std::any::type_name::<H>(), h.as_ref().host_type_name())
            }),
            Self::Value(v) => Err(TyrError::type_mismatch(
                std::any::type_name::<H>(),
                v.kind_name(),
            )),
        }
    }
}

/// A host-invocable scalar function.
pub type ScalarFn = Arc<dyn Fn(&[FunctionArg]) -> TyrResult<TypedValue> + Send + Sync>;

/// A registered function's signature.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionSignature {
    pub id: FunctionId,
    pub name: SmolStr,
    pub arity: usize,
    pub return_type: LogicalType,
}

struct RegisteredFunction {
    signature: FunctionSignature,
    func: ScalarFn,
}

/// Registry of the functions known to one session.
pub struct FunctionRegistry {
    functions: Vec<RegisteredFunction>,
    name_index: HashMap<SmolStr, usize>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.functions.iter().map(|r| &r.signature))
            .finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
            name_index: HashMap::new(),
        }
    }

    /// Register a function. Returns the assigned FunctionId.
    ///
    /// Re-registering an existing name replaces its definition and keeps its id.
    pub fn register<F>(
        &mut self,
        name: &str,
        arity: usize,
        return_type: LogicalType,
        func: F,
    ) -> FunctionId
    where
        F: Fn(&[FunctionArg]) -> TyrResult<TypedValue> + Send + Sync + 'static,
    {
        let lower_name = SmolStr::new(name.to_lowercase());
        let func: ScalarFn = Arc::new(func);
        if let Some(&idx) = self.name_index.get(&lower_name) {
            let entry = &mut self.functions[idx];
            entry.signature.arity = arity;
            entry.signature.return_type = return_type;
            entry.func = func;
            return entry.signature.id;
        }
        let id = FunctionId(self.functions.len() as u32);
        self.name_index.insert(lower_name.clone(), self.functions.len());
        self.functions.push(RegisteredFunction {
            signature: FunctionSignature {
                id,
                name: lower_name,
                arity,
                return_type,
            },
            func,
        });
        id
    }

    /// Register a unary function over host values of type `H`.
    ///
    /// A null argument yields null without calling `func`; an argument that is
    /// not an `H` host value is a type mismatch.
    pub fn register_host_fn<H, R, F>(
        &mut self,
        name: &str,
        return_type: LogicalType,
        func: F,
    ) -> FunctionId
    where
        H: HostValue,
        R: Into<TypedValue>,
        F: Fn(&H) -> TyrResult<R> + Send + Sync + 'static,
    {
        self.register(name, 1, return_type, move |args| {
            if args[0].is_null() {
                return Ok(TypedValue::Null);
            }
            let host = args[0].host_as::<H>()?;
            func(host).map(Into::into)
        })
    }

    /// Look up a function by name (case-insensitive).
    pub fn resolve(&self, name: &str) -> TyrResult<&FunctionSignature> {
        self.lookup(name).map(|r| &r.signature)
    }

    /// Call a function by name.
    ///
    /// Checks the argument count, runs the function, and coerces its result
    /// to the declared return type.
    pub fn invoke(&self, name: &str, args: &[FunctionArg]) -> TyrResult<TypedValue> {
        let entry = self.lookup(name)?;
        let sig = &entry.signature;
        if args.len() != sig.arity {
            return Err(TyrError::Function(format!(
                "{}() expects {} argument(s), got {}",
                sig.name,
                sig.arity,
                args.len()
            )));
        }
        let result = (entry.func)(args)?;
        coerce_value(result, &sig.return_type).map_err(|e| match e {
            TyrError::TypeMismatch { expected, found } => TyrError::TypeMismatch {
                expected: format!("{expected} (return type of {}())", sig.name),
                found,
            },
            other => other,
        })
    }

    /// Look up by FunctionId (O(1)).
    pub fn get(&self, id: FunctionId) -> Option<&FunctionSignature> {
        self.functions.get(id.0 as usize).map(|r| &r.signature)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_index.contains_key(name.to_lowercase().as_str())
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn lookup(&self, name: &str) -> TyrResult<&RegisteredFunction> {
        let lower = name.to_lowercase();
        let idx = self
            .name_index
            .get(lower.as_str())
            .ok_or_else(|| TyrError::Function(format!("unknown function '{name}'")))?;
        Ok(&self.functions[*idx])
    }
}
