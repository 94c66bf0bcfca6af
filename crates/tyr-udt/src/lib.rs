//! tyr-udt: user-defined column types.
//!
//! A user-defined type wraps an arbitrary host value and declares a structural
//! internal shape (a `LogicalType`). Rows, files and the redistribution wire
//! only ever see the internal form; host values exist only at the edges, when
//! a row is built from host objects or a function dereferences a column.
//!
//! - [`UserDefinedType`]: the statically typed capability each type implements.
//! - [`DynUserDefinedType`] / [`UdtRef`]: the type-erased view a schema stores.
//! - [`HostValue`]: a type-erased host value with structural equality.

pub mod erased;
#[cfg(test)]
mod fixtures;
pub mod host;
pub mod udt;

pub use erased::{DynUserDefinedType, HostRef, UdtRef, udt_ref};
pub use host::HostValue;
pub use udt::{HostInput, UserDefinedType, verify_round_trip};
