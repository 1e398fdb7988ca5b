//! Runtime values and script objects.
//!
//! Coercions never fail: anything can be read as a number, a truth value or
//! display text.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::dsl::{BinaryOp, FuncDef, UnaryOp};
use crate::scene::PrimitiveId;

/// A shared handle to a script object. Method calls mutate through it.
pub type ObjectRef = Rc<RefCell<RuntimeObject>>;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Number(f64),
    String(String),
    Bool(bool),
    Array(Vec<Value>),
    Object(ObjectRef),
    Func(Rc<FuncDef>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Func(_) => "func",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric reading. Unparseable or non-finite strings and non-scalars are 0.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Non-empty strings, non-zero numbers and `true` are truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            _ => false,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Numbers of an array value, coerced. Non-arrays yield nothing.
    pub fn numbers(&self) -> Vec<f64> {
        self.as_array()
            .map(|items| items.iter().map(Value::to_number).collect())
            .unwrap_or_default()
    }

    /// The host primitive behind an object value.
    pub fn host(&self) -> Option<PrimitiveId> {
        self.as_object().and_then(|o| o.borrow().host)
    }

    /// Evaluate a binary operator. Both operands are already evaluated.
    pub fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
        if op == BinaryOp::Add
            && (matches!(lhs, Value::String(_)) || matches!(rhs, Value::String(_)))
        {
            return Value::String(format!("{lhs}{rhs}"));
        }
        match op {
            BinaryOp::And => return Value::Bool(lhs.truthy() && rhs.truthy()),
            BinaryOp::Or => return Value::Bool(lhs.truthy() || rhs.truthy()),
            _ => {}
        }

        let a = lhs.to_number();
        let b = rhs.to_number();
        match op {
            BinaryOp::Add => Value::Number(a + b),
            BinaryOp::Sub => Value::Number(a - b),
            BinaryOp::Mul => Value::Number(a * b),
            BinaryOp::Div if b == 0.0 => Value::Number(0.0),
            BinaryOp::Div => Value::Number(a / b),
            BinaryOp::Rem if b == 0.0 => Value::Number(0.0),
            BinaryOp::Rem => Value::Number(a % b),
            BinaryOp::Eq => Value::Bool(a == b),
            BinaryOp::NotEq => Value::Bool(a != b),
            BinaryOp::Lt => Value::Bool(a < b),
            BinaryOp::Gt => Value::Bool(a > b),
            BinaryOp::LtEq => Value::Bool(a <= b),
            BinaryOp::GtEq => Value::Bool(a >= b),
            BinaryOp::And | BinaryOp::Or => Value::Null,
        }
    }

    pub fn unary(op: UnaryOp, operand: &Value) -> Value {
        match op {
            UnaryOp::Neg => Value::Number(-operand.to_number()),
            UnaryOp::Not => Value::Bool(!operand.truthy()),
        }
    }
}

/// Objects and functions compare by identity, everything else by content.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Func(a), Value::Func(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Number(n) => fmt_number(*n, f),
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(o) => {
                let o = o.borrow();
                write!(f, "<{}#{}>", o.type_name, o.id)
            }
            Value::Func(func) => write!(f, "<func {}>", func.name),
        }
    }
}

/// Integral numbers print without a fraction.
fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{n}")
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Property map that keeps declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, Value)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_ignore_case(&self, name: &str) -> Option<&Value> {
        self.get(name).or_else(|| {
            self.entries
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    pub fn contains_ignore_case(&self, name: &str) -> bool {
        self.get_ignore_case(name).is_some()
    }

    /// Set `name`, replacing an existing entry in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = PropertyMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// A constructed script object, optionally bound to a scene primitive.
#[derive(Debug, Clone)]
pub struct RuntimeObject {
    pub id: u64,
    pub type_name: String,
    pub props: PropertyMap,
    pub host: Option<PrimitiveId>,
}

impl RuntimeObject {
    pub fn new(id: u64, type_name: impl Into<String>, props: PropertyMap) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            props,
            host: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn string_coercion_defaults_to_zero() {
        assert_eq!(Value::from("2.5").to_number(), 2.5);
        assert_eq!(Value::from(" 7 ").to_number(), 7.0);
        assert_eq!(Value::from("abc").to_number(), 0.0);
        assert_eq!(Value::from("nan").to_number(), 0.0);
        assert_eq!(Value::from("-inf").to_number(), 0.0);
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert_eq!(Value::Null.to_number(), 0.0);
    }

    #[test]
    fn truthiness() {
        assert!(Value::from("x").truthy());
        assert!(!Value::from("").truthy());
        assert!(num(-1.0).truthy());
        assert!(!num(0.0).truthy());
        assert!(!Value::Null.truthy());
        assert!(!Value::Array(vec![num(1.0)]).truthy());
    }

    #[test]
    fn plus_concatenates_with_any_string() {
        assert_eq!(
            Value::binary(BinaryOp::Add, &Value::from("n="), &num(3.0)),
            Value::from("n=3")
        );
        assert_eq!(
            Value::binary(BinaryOp::Add, &num(1.5), &Value::from("s")),
            Value::from("1.5s")
        );
        assert_eq!(Value::binary(BinaryOp::Add, &num(1.0), &Value::Bool(true)), num(2.0));
    }

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(Value::binary(BinaryOp::Div, &num(5.0), &num(0.0)), num(0.0));
        assert_eq!(Value::binary(BinaryOp::Rem, &num(5.0), &num(0.0)), num(0.0));
        assert_eq!(Value::binary(BinaryOp::Div, &num(5.0), &num(2.0)), num(2.5));
        assert_eq!(Value::binary(BinaryOp::Rem, &num(5.0), &num(3.0)), num(2.0));
    }

    #[test]
    fn comparisons_coerce_to_numbers() {
        assert_eq!(Value::binary(BinaryOp::Eq, &Value::from("2"), &num(2.0)), Value::Bool(true));
        assert_eq!(Value::binary(BinaryOp::Lt, &Value::Bool(false), &num(0.5)), Value::Bool(true));
        assert_eq!(Value::binary(BinaryOp::NotEq, &num(1.0), &num(1.0)), Value::Bool(false));
    }

    #[test]
    fn logical_operators_return_bools() {
        assert_eq!(Value::binary(BinaryOp::And, &num(1.0), &Value::from("a")), Value::Bool(true));
        assert_eq!(Value::binary(BinaryOp::Or, &num(0.0), &Value::from("")), Value::Bool(false));
        assert_eq!(Value::unary(UnaryOp::Not, &num(0.0)), Value::Bool(true));
        assert_eq!(Value::unary(UnaryOp::Neg, &Value::from("4")), num(-4.0));
    }

    #[test]
    fn display_formats() {
        assert_eq!(num(3.0).to_string(), "3");
        assert_eq!(num(-0.25).to_string(), "-0.25");
        assert_eq!(Value::Array(vec![num(1.0), Value::from("a")]).to_string(), "[1, a]");
        let obj = Value::Object(Rc::new(RefCell::new(RuntimeObject::new(4, "rect", PropertyMap::new()))));
        assert_eq!(obj.to_string(), "<rect#4>");
    }

    #[test]
    fn objects_compare_by_identity() {
        let make = || Rc::new(RefCell::new(RuntimeObject::new(1, "rect", PropertyMap::new())));
        let a = make();
        assert_eq!(Value::Object(a.clone()), Value::Object(a));
        assert_ne!(Value::Object(make()), Value::Object(make()));
    }

    #[test]
    fn property_map_keeps_order_and_replaces() {
        let mut props = PropertyMap::new();
        props.insert("width", num(0.2));
        props.insert("height", num(0.1));
        props.insert("width", num(0.3));
        assert_eq!(props.keys(), vec!["width", "height"]);
        assert_eq!(props.get("width"), Some(&num(0.3)));
        assert_eq!(props.get_ignore_case("HEIGHT"), Some(&num(0.1)));
        assert!(props.get("Height").is_none());
    }
}
