//! tyr-expression: bound expressions, function registry, result coercion, row evaluation.

pub mod bound_expr;
pub mod coercion;
pub mod evaluator;
pub mod function_registry;

pub use bound_expr::{BoundExpression, ComparisonOp, FunctionId};
pub use coercion::coerce_value;
pub use evaluator::{compare_values, evaluate};
pub use function_registry::{FunctionArg, FunctionRegistry, FunctionSignature, ScalarFn};
