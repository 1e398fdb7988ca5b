//! Script runtime: values, scopes, the command registry, host binding and
//! the evaluator that ties them to a [`Scene`](crate::scene::Scene).

pub mod builtins;
pub mod eval;
pub mod host;
pub mod registry;
pub mod scope;
pub mod value;

pub use eval::{Flow, Runtime, MAX_CALL_DEPTH};
pub use host::{HostError, HostContext};
pub use registry::{CallArgs, CommandRegistry, Operation, TypeTag};
pub use value::{ObjectRef, PropertyMap, RuntimeObject, Value};
