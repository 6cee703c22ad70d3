//! XPath 1.0 Engine
//!
//! XPath 1.0 implementation with:
//! - All 13 axes (namespace is always empty)
//! - The core function library
//! - Stack-compiled expressions, evaluated per call

pub mod axes;
pub mod compiler;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use compiler::{compile, CompiledExpr};
pub use eval::{evaluate, evaluate_compiled, evaluate_from_node, EvalContext};
pub use value::XPathValue;
