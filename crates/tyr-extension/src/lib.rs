//! tyr-extension: Extension trait bundling user-defined types with functions.
//!
//! An extension contributes descriptors to a session's type catalog and
//! functions to its function registry. Functions over a user-defined column
//! receive the deserialized host value (`FunctionArg::Host`).

use tyr_expression::FunctionRegistry;
use tyr_udt::UdtRef;

/// Trait that every extension must implement.
pub trait Extension: Send + Sync {
    /// Extension name (e.g., "vector").
    fn name(&self) -> &str;

    /// User-defined types this extension provides.
    fn types(&self) -> Vec<UdtRef>;

    /// Register this extension's functions.
    fn register_functions(&self, registry: &mut FunctionRegistry);
}
