//! Value types for understudy
//!
//! This module defines:
//! - Value: Unified enum for all argument and return values
//! - ProxyHandle: Opaque reference to a mock proxy (chained stubs)
//! - ArgCell: Shared, mutable argument cell with snapshot support
//!
//! ## Value Model
//!
//! The Value enum has exactly 9 variants:
//! - Null, Bool, Int, Float, Str, Bytes, List, Map, Handle
//!
//! ### Type Rules
//!
//! - No implicit type coercions
//! - `Int(1) != Float(1.0)` - different types are NEVER equal
//! - `Bytes` are not `Str`
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//! - `Handle` equality is pointer identity of the proxy target
//!
//! ## Snapshots
//!
//! Mocked calls receive their arguments as [`ArgCell`]s: shared cells the
//! caller may keep mutating after the call returns. The engine snapshots
//! every cell at capture time, so a later mutation never changes what a
//! match or a report saw. `Value` trees are acyclic by construction, so a
//! snapshot is a plain deep clone.

use parking_lot::RwLock;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Canonical understudy value type for all mocked arguments and results
///
/// ## Type Equality
///
/// Different types are NEVER equal, even if they contain the same "value":
/// - `Int(1) != Float(1.0)`
/// - `Bytes(b"hello") != Str("hello")`
///
/// Float equality follows IEEE-754 semantics:
/// - `NaN != NaN`
/// - `-0.0 == 0.0`
#[derive(Debug, Clone)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// List of values
    List(Vec<Value>),
    /// Map with string keys
    Map(BTreeMap<String, Value>),
    /// Reference to a mock proxy (returned by chained stubs)
    Handle(ProxyHandle),
}

// Custom PartialEq implementation for IEEE-754 float semantics and
// pointer-identity handle semantics
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Handle(a), Value::Handle(b)) => a.ptr_eq(b),
            // Different types are NEVER equal
            _ => false,
        }
    }
}

impl Value {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "Str",
            Value::Bytes(_) => "Bytes",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Handle(_) => "Handle",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this is a boolean value
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Check if this is an integer value
    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    /// Check if this is a float value
    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    /// Check if this is a string value
    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    /// Check if this is a bytes value
    pub fn is_bytes(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    /// Check if this is a list value
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Check if this is a map value
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Check if this is a proxy handle
    pub fn is_handle(&self) -> bool {
        matches!(self, Value::Handle(_))
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a Str value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[u8] if this is a Bytes value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get as &[Value] if this is a List value
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Get as map if this is a Map value
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Get as proxy handle if this is a Handle value
    pub fn as_handle(&self) -> Option<&ProxyHandle> {
        match self {
            Value::Handle(h) => Some(h),
            _ => None,
        }
    }

    /// Check whether this value is the "default" for its type
    ///
    /// Default means: Null, false, 0, 0.0, empty string/bytes/list/map.
    /// Handles are never default. Used by the match resolver's specificity
    /// tie-break: a stub declared with more not-default arguments wins over
    /// a wildcard-heavy one with the same matching score.
    pub fn is_default(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Str(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::List(l) => l.is_empty(),
            Value::Map(m) => m.is_empty(),
            Value::Handle(_) => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Bytes(b) => write!(f, "0x{}", hex(b)),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Handle(h) => write!(f, "Mock<{}>", h.name()),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        match o {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Opaque reference to a mock proxy
///
/// A chained stub returns its chained mock's proxy as `Value::Handle`.
/// Equality is pointer identity of the underlying proxy, mirroring
/// reference identity in the mocked-object model.
#[derive(Clone)]
pub struct ProxyHandle {
    name: String,
    target: Arc<dyn Any + Send + Sync>,
}

impl ProxyHandle {
    /// Create a handle to the given proxy target
    pub fn new(name: impl Into<String>, target: Arc<dyn Any + Send + Sync>) -> Self {
        ProxyHandle {
            name: name.into(),
            target,
        }
    }

    /// The name of the mock this handle points to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type-erased proxy target
    pub fn target(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.target
    }

    /// Pointer identity of the underlying proxy target
    pub fn ptr_eq(&self, other: &ProxyHandle) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
    }
}

impl fmt::Debug for ProxyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyHandle")
            .field("name", &self.name)
            .finish()
    }
}

/// A shared, mutable argument cell
///
/// Callers of a mocked method pass each argument as an `ArgCell`. Cloning
/// the cell clones the reference, not the value, so the caller can keep a
/// handle and mutate the argument after the call. [`ArgCell::snapshot`]
/// deep-clones the current value; the engine takes one snapshot per
/// argument at capture time.
#[derive(Clone)]
pub struct ArgCell {
    inner: Arc<RwLock<Value>>,
}

impl ArgCell {
    /// Create a new cell holding the given value
    pub fn new(value: impl Into<Value>) -> Self {
        ArgCell {
            inner: Arc::new(RwLock::new(value.into())),
        }
    }

    /// Deep-clone the current value
    pub fn snapshot(&self) -> Value {
        self.inner.read().clone()
    }

    /// Replace the held value
    pub fn set(&self, value: impl Into<Value>) {
        *self.inner.write() = value.into();
    }

    /// Pointer identity: do both cells alias the same storage?
    pub fn ptr_eq(&self, other: &ArgCell) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ArgCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArgCell").field(&*self.inner.read()).finish()
    }
}

impl<T: Into<Value>> From<T> for ArgCell {
    fn from(value: T) -> Self {
        ArgCell::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_different_types_never_equal() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Bytes(b"hello".to_vec()), Value::Str("hello".into()));
        assert_ne!(Value::Null, Value::Bool(false));
    }

    #[test]
    fn test_float_ieee754_equality() {
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_eq!(Value::Float(-0.0), Value::Float(0.0));
    }

    #[test]
    fn test_handle_equality_is_pointer_identity() {
        let target: Arc<dyn Any + Send + Sync> = Arc::new(1u8);
        let a = ProxyHandle::new("a", target.clone());
        let b = ProxyHandle::new("b", target);
        let c = ProxyHandle::new("a", Arc::new(1u8));

        // Same target, different names: equal
        assert_eq!(Value::Handle(a.clone()), Value::Handle(b));
        // Same name, different target: not equal
        assert_ne!(Value::Handle(a), Value::Handle(c));
    }

    #[test]
    fn test_is_default() {
        assert!(Value::Null.is_default());
        assert!(Value::Bool(false).is_default());
        assert!(Value::Int(0).is_default());
        assert!(Value::Str(String::new()).is_default());
        assert!(Value::List(vec![]).is_default());

        assert!(!Value::Bool(true).is_default());
        assert!(!Value::Int(7).is_default());
        assert!(!Value::Str("x".into()).is_default());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Str("hi".into()).to_string(), "\"hi\"");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "[1, 2]"
        );
        assert_eq!(Value::Bytes(vec![0xab, 0x01]).to_string(), "0xab01");
    }

    #[test]
    fn test_arg_cell_snapshot_is_immune_to_later_mutation() {
        let cell = ArgCell::new("before");
        let snapshot = cell.snapshot();
        cell.set("after");

        assert_eq!(snapshot, Value::Str("before".into()));
        assert_eq!(cell.snapshot(), Value::Str("after".into()));
    }

    #[test]
    fn test_arg_cell_ptr_eq() {
        let cell = ArgCell::new(1);
        let alias = cell.clone();
        let other = ArgCell::new(1);

        assert!(cell.ptr_eq(&alias));
        assert!(!cell.ptr_eq(&other));
        // Value equality still holds across distinct cells
        assert_eq!(cell.snapshot(), other.snapshot());
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(3i64), Value::Int(3));
        assert_eq!(Value::from("s"), Value::Str("s".into()));
        assert_eq!(Value::from(Option::<i64>::None), Value::Null);
        assert_eq!(Value::from(Some(2i64)), Value::Int(2));
    }
}
