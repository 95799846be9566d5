//! Method signatures and the mocked-type description
//!
//! This module defines:
//! - ReturnKind: Closed set of return-value kinds with a default-value table
//! - MethodSig: Method identifier (name + arity + return kind)
//! - MockedType: The interface description a mock is created from
//!
//! There is no reflection here. A mock knows about its methods only through
//! the `MockedType` the test author (or a generated stub) registers, and
//! default return values come from an explicit kind table instead of
//! runtime type inspection.

use crate::value::Value;
use std::collections::BTreeMap;

/// The kind of value a mocked method returns
///
/// A closed table: every kind maps to a fixed default value, which is what
/// an unstubbed, non-void call returns. `Reference` and `Mockable` default
/// to `Null`; `Mockable` additionally marks the method as chainable (its
/// return value can itself be mocked).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnKind {
    /// No return value; the default behavior for an unstubbed call is "do nothing"
    Void,
    /// Boolean, defaults to `false`
    Bool,
    /// Integer, defaults to `0`
    Int,
    /// Float, defaults to `0.0`
    Float,
    /// String, defaults to `""`
    Str,
    /// Bytes, defaults to empty
    Bytes,
    /// List, defaults to empty
    List,
    /// Map, defaults to empty
    Map,
    /// Opaque reference type, defaults to `Null`
    Reference,
    /// Reference type that can itself be mocked, enabling chained stubbing.
    /// `type_name` names the `MockedType` to use for the chained mock.
    Mockable {
        /// Name of the mocked type standing in for the return value
        type_name: String,
    },
}

impl ReturnKind {
    /// A `Mockable` return kind for the named type
    pub fn mockable(type_name: impl Into<String>) -> Self {
        ReturnKind::Mockable {
            type_name: type_name.into(),
        }
    }

    /// The type-appropriate default value for this kind
    ///
    /// Returned by an unstubbed call on a regular (non-partial) mock.
    pub fn default_value(&self) -> Value {
        match self {
            ReturnKind::Void => Value::Null,
            ReturnKind::Bool => Value::Bool(false),
            ReturnKind::Int => Value::Int(0),
            ReturnKind::Float => Value::Float(0.0),
            ReturnKind::Str => Value::Str(String::new()),
            ReturnKind::Bytes => Value::Bytes(Vec::new()),
            ReturnKind::List => Value::List(Vec::new()),
            ReturnKind::Map => Value::Map(BTreeMap::new()),
            ReturnKind::Reference => Value::Null,
            ReturnKind::Mockable { .. } => Value::Null,
        }
    }

    /// Whether a stubbed return value is acceptable for this kind
    ///
    /// `Null` is accepted by every non-void kind (an absent reference).
    /// `Void` accepts nothing: defining a return value for a void method is
    /// a stub-authoring mistake and is rejected at validation time.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ReturnKind::Void => false,
            ReturnKind::Bool => matches!(value, Value::Null | Value::Bool(_)),
            ReturnKind::Int => matches!(value, Value::Null | Value::Int(_)),
            ReturnKind::Float => matches!(value, Value::Null | Value::Float(_)),
            ReturnKind::Str => matches!(value, Value::Null | Value::Str(_)),
            ReturnKind::Bytes => matches!(value, Value::Null | Value::Bytes(_)),
            ReturnKind::List => matches!(value, Value::Null | Value::List(_)),
            ReturnKind::Map => matches!(value, Value::Null | Value::Map(_)),
            // Opaque references cannot be kind-checked further
            ReturnKind::Reference => true,
            ReturnKind::Mockable { .. } => {
                matches!(value, Value::Null | Value::Handle(_))
            }
        }
    }

    /// Whether this kind marks the method as chainable
    pub fn is_mockable(&self) -> bool {
        matches!(self, ReturnKind::Mockable { .. })
    }

    /// Whether this is the void kind
    pub fn is_void(&self) -> bool {
        matches!(self, ReturnKind::Void)
    }
}

/// Identifier of a mockable method: name, parameter count and return kind
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    /// Method name, unique within its `MockedType`
    pub name: String,
    /// Number of formal parameters
    pub arity: usize,
    /// Kind of the return value
    pub return_kind: ReturnKind,
}

impl MethodSig {
    /// Create a method signature
    pub fn new(name: impl Into<String>, arity: usize, return_kind: ReturnKind) -> Self {
        MethodSig {
            name: name.into(),
            arity,
            return_kind,
        }
    }
}

/// Description of a mocked interface: a type name plus its method table
///
/// This is what proxy creation consumes in place of a real Rust type. The
/// engine never inspects concrete types; every mock is driven by one of
/// these descriptions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MockedType {
    /// Name of the mocked interface
    pub name: String,
    methods: Vec<MethodSig>,
}

impl MockedType {
    /// Start describing an interface with the given name
    pub fn new(name: impl Into<String>) -> Self {
        MockedType {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// Add a method (builder style)
    pub fn method(
        mut self,
        name: impl Into<String>,
        arity: usize,
        return_kind: ReturnKind,
    ) -> Self {
        self.methods.push(MethodSig::new(name, arity, return_kind));
        self
    }

    /// Look up a method by name
    pub fn find_method(&self, name: &str) -> Option<&MethodSig> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// All declared methods, in declaration order
    pub fn methods(&self) -> &[MethodSig] {
        &self.methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_value_table() {
        assert_eq!(ReturnKind::Void.default_value(), Value::Null);
        assert_eq!(ReturnKind::Bool.default_value(), Value::Bool(false));
        assert_eq!(ReturnKind::Int.default_value(), Value::Int(0));
        assert_eq!(ReturnKind::Float.default_value(), Value::Float(0.0));
        assert_eq!(ReturnKind::Str.default_value(), Value::Str(String::new()));
        assert_eq!(ReturnKind::List.default_value(), Value::List(vec![]));
        assert_eq!(ReturnKind::Reference.default_value(), Value::Null);
        assert_eq!(ReturnKind::mockable("Session").default_value(), Value::Null);
    }

    #[test]
    fn test_void_accepts_nothing() {
        assert!(!ReturnKind::Void.accepts(&Value::Null));
        assert!(!ReturnKind::Void.accepts(&Value::Int(1)));
    }

    #[test]
    fn test_accepts_matching_kind_and_null() {
        assert!(ReturnKind::Int.accepts(&Value::Int(5)));
        assert!(ReturnKind::Int.accepts(&Value::Null));
        assert!(!ReturnKind::Int.accepts(&Value::Str("5".into())));
        assert!(ReturnKind::Reference.accepts(&Value::Int(5)));
    }

    #[test]
    fn test_mocked_type_lookup() {
        let mocked_type = MockedType::new("UserService")
            .method("find_user", 1, ReturnKind::Map)
            .method("delete_user", 1, ReturnKind::Void)
            .method("session", 0, ReturnKind::mockable("Session"));

        let find_user = mocked_type.find_method("find_user").unwrap();
        assert_eq!(find_user.arity, 1);
        assert_eq!(find_user.return_kind, ReturnKind::Map);

        assert!(mocked_type.find_method("session").unwrap().return_kind.is_mockable());
        assert!(mocked_type.find_method("missing").is_none());
        assert_eq!(mocked_type.methods().len(), 3);
    }
}
