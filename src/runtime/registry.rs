//! Command registry: the bridge from script names to native handlers.
//!
//! Methods are keyed by `(TypeTag, Operation)`. A method name is parsed into
//! an [`Operation`] once; a handler registered for [`TypeTag::Any`] serves
//! every primitive kind without a more specific entry. Globals are keyed by
//! lower-cased name and constructor hooks by lower-cased type name.

use std::collections::HashMap;

use super::value::{ObjectRef, Value};
use super::Runtime;
use crate::scene::{PrimitiveKind, Scene};

/// Evaluated call arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub named: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn new(positional: Vec<Value>, named: Vec<(String, Value)>) -> Self {
        Self { positional, named }
    }

    pub fn positional(values: Vec<Value>) -> Self {
        Self::new(values, Vec::new())
    }

    pub fn at(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Named argument, matched case-insensitively.
    pub fn named(&self, name: &str) -> Option<&Value> {
        self.named
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// The named argument `name` if given, else positional `index`.
    pub fn get(&self, index: usize, name: &str) -> Option<&Value> {
        self.named(name).or_else(|| self.at(index))
    }

    pub fn number(&self, index: usize, name: &str) -> Option<f64> {
        self.get(index, name).map(Value::to_number)
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// The fixed set of operations a primitive understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Move,
    Scale,
    Rotate,
    Color,
    Fade,
    Draw,
    Morph,
    MorphTo,
    SetColor,
    SetPosition,
    Velocity,
    Remove,
}

impl Operation {
    const NAMES: [(&'static str, Operation); 12] = [
        ("move", Operation::Move),
        ("scale", Operation::Scale),
        ("rotate", Operation::Rotate),
        ("color", Operation::Color),
        ("fade", Operation::Fade),
        ("draw", Operation::Draw),
        ("morph", Operation::Morph),
        ("morphto", Operation::MorphTo),
        ("setcolor", Operation::SetColor),
        ("setposition", Operation::SetPosition),
        ("velocity", Operation::Velocity),
        ("remove", Operation::Remove),
    ];

    /// Parse a method name. Case-insensitive; an `a` prefix marks the
    /// animated form (`aColor`, `aMove`) and names the same operation.
    pub fn from_method(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Self::lookup(&lower).or_else(|| lower.strip_prefix('a').and_then(Self::lookup))
    }

    fn lookup(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, op)| *op)
    }
}

/// What a method handler is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Any,
    Kind(PrimitiveKind),
}

pub type MethodHandler = fn(&mut Runtime, &mut Scene, &ObjectRef, &CallArgs) -> Value;
pub type GlobalHandler = fn(&mut Runtime, &mut Scene, &CallArgs) -> Value;
pub type ConstructorHook = fn(&mut Runtime, &mut Scene, &ObjectRef);

#[derive(Default)]
pub struct CommandRegistry {
    methods: HashMap<(TypeTag, Operation), MethodHandler>,
    globals: HashMap<String, GlobalHandler>,
    hooks: HashMap<String, ConstructorHook>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_method(&mut self, tag: TypeTag, op: Operation, handler: MethodHandler) {
        self.methods.insert((tag, op), handler);
    }

    pub fn register_global(&mut self, name: &str, handler: GlobalHandler) {
        self.globals.insert(name.to_ascii_lowercase(), handler);
    }

    pub fn register_hook(&mut self, type_name: &str, hook: ConstructorHook) {
        self.hooks.insert(type_name.to_ascii_lowercase(), hook);
    }

    /// Handler for `op` on `kind`, falling back to one registered for any kind.
    pub fn method(&self, kind: PrimitiveKind, op: Operation) -> Option<MethodHandler> {
        self.methods
            .get(&(TypeTag::Kind(kind), op))
            .or_else(|| self.methods.get(&(TypeTag::Any, op)))
            .copied()
    }

    /// Resolve `type_name.method`. None is a dispatch miss.
    pub fn resolve(&self, type_name: &str, method: &str) -> Option<MethodHandler> {
        let kind = PrimitiveKind::from_name(type_name)?;
        self.method(kind, Operation::from_method(method)?)
    }

    pub fn global(&self, name: &str) -> Option<GlobalHandler> {
        self.globals.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn hook(&self, type_name: &str) -> Option<ConstructorHook> {
        self.hooks.get(&type_name.to_ascii_lowercase()).copied()
    }

    pub fn global_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.globals.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
