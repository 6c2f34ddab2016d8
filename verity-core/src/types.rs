// Type checking and coercion capability

use crate::{ConfigurationError, Result, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap()
});

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap());

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
type Via = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// A conversion from values of type `from` into the target type.
#[derive(Clone)]
pub struct Coercion {
    from: String,
    via: Via,
}

impl Coercion {
    pub fn new<F>(from: impl Into<String>, via: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            from: from.into(),
            via: Arc::new(via),
        }
    }

    pub fn from_type(&self) -> &str {
        &self.from
    }

    pub fn apply(&self, value: &Value) -> Option<Value> {
        (self.via)(value)
    }
}

impl fmt::Debug for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coercion").field("from", &self.from).finish()
    }
}

/// How the type stage may convert a value that does not already conform.
///
/// `coerce` enables the target type's own coercions; `coercion` is only
/// consulted when `coerce` is false.
#[derive(Debug, Clone, Default)]
pub struct CoerceOptions {
    pub coerce: bool,
    pub coercion: Option<Coercion>,
}

/// Outcome of a type check.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeCheck {
    /// The value conforms, possibly after coercion.
    Passed(Value),
    /// The value does not conform; carries a reason.
    Failed(String),
}

/// The capability the verifier calls into for the type stage.
///
/// Implementations are shared across concurrent `verify` calls and must be
/// read-only once built.
pub trait TypeChecker: Send + Sync {
    /// Check `value` against the type named `type_name`. An unknown type
    /// name is a configuration error, not a failed check.
    fn check(&self, type_name: &str, value: &Value, options: &CoerceOptions) -> Result<TypeCheck>;

    /// Whether `type_name` names a type this checker can check. Consulted
    /// before any value is looked at, so a profile naming an unknown type
    /// fails even when the field is absent.
    fn knows(&self, type_name: &str) -> bool {
        let _ = type_name;
        true
    }
}

/// A named type: a membership predicate plus coercions into it.
#[derive(Clone)]
pub struct TypeConstraint {
    name: String,
    predicate: Predicate,
    coercions: Vec<Coercion>,
}

impl TypeConstraint {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
            coercions: Vec::new(),
        }
    }

    /// Register a coercion used when a check runs with `coerce` enabled.
    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercions.push(coercion);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accepts(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }
}

impl fmt::Debug for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConstraint")
            .field("name", &self.name)
            .field("coercions", &self.coercions)
            .finish()
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn str_coercion<F>(via: F) -> Coercion
where
    F: Fn(&str) -> Option<Value> + Send + Sync + 'static,
{
    Coercion::new("Str", move |value| value.as_str().and_then(|s| via(s)))
}

/// Registry of named types; the default [`TypeChecker`].
///
/// Built-in types: `Str`, `Int`, `Num`, `Bool`, `ArrayRef`, `HashRef`,
/// `Email`, `Url`, `Uuid`. `Int`, `Num` and `Bool` can be coerced from
/// strings.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, TypeConstraint>,
}

impl TypeRegistry {
    /// A registry holding the built-in types.
    pub fn new() -> Self {
        let builtins = [
            TypeConstraint::new("Str", Value::is_string),
            TypeConstraint::new("Int", |v| v.is_i64() || v.is_u64()).with_coercion(str_coercion(
                |s| s.trim().parse::<i64>().ok().map(Value::from),
            )),
            TypeConstraint::new("Num", Value::is_number).with_coercion(str_coercion(|s| {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
            })),
            TypeConstraint::new("Bool", Value::is_boolean)
                .with_coercion(str_coercion(|s| parse_bool(s).map(Value::Bool))),
            TypeConstraint::new("ArrayRef", Value::is_array),
            TypeConstraint::new("HashRef", Value::is_object),
            TypeConstraint::new("Email", |v| v.as_str().is_some_and(|s| EMAIL_REGEX.is_match(s))),
            TypeConstraint::new("Url", |v| v.as_str().is_some_and(|s| URL_REGEX.is_match(s))),
            TypeConstraint::new("Uuid", |v| v.as_str().is_some_and(|s| UUID_REGEX.is_match(s))),
        ];

        let mut registry = Self::empty();
        for constraint in builtins {
            registry.insert(constraint);
        }
        registry
    }

    /// A registry with no types at all.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Add or replace a type, builder style.
    pub fn register(mut self, constraint: TypeConstraint) -> Self {
        self.insert(constraint);
        self
    }

    pub fn insert(&mut self, constraint: TypeConstraint) {
        self.types.insert(constraint.name.clone(), constraint);
    }

    pub fn get(&self, name: &str) -> Option<&TypeConstraint> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    fn lookup(&self, name: &str) -> Result<&TypeConstraint> {
        self.get(name)
            .ok_or_else(|| ConfigurationError::UnknownType(name.to_string()))
    }

    fn try_coercion(
        &self,
        target: &TypeConstraint,
        coercion: &Coercion,
        value: &Value,
    ) -> Result<Option<Value>> {
        if !self.lookup(&coercion.from)?.accepts(value) {
            return Ok(None);
        }
        Ok(coercion.apply(value).filter(|coerced| target.accepts(coerced)))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker for TypeRegistry {
    fn knows(&self, type_name: &str) -> bool {
        self.contains(type_name)
    }

    fn check(&self, type_name: &str, value: &Value, options: &CoerceOptions) -> Result<TypeCheck> {
        let target = self.lookup(type_name)?;
        if target.accepts(value) {
            return Ok(TypeCheck::Passed(value.clone()));
        }

        if options.coerce {
            for coercion in &target.coercions {
                if let Some(coerced) = self.try_coercion(target, coercion, value)? {
                    return Ok(TypeCheck::Passed(coerced));
                }
            }
        } else if let Some(coercion) = &options.coercion {
            if let Some(coerced) = self.try_coercion(target, coercion, value)? {
                return Ok(TypeCheck::Passed(coerced));
            }
        }

        Ok(TypeCheck::Failed(format!("value is not a valid {}", type_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(ty: &str, value: Value, coerce: bool) -> TypeCheck {
        let options = CoerceOptions {
            coerce,
            coercion: None,
        };
        TypeRegistry::new().check(ty, &value, &options).unwrap()
    }

    #[test]
    fn test_builtin_membership() {
        assert_eq!(check("Str", json!("a"), false), TypeCheck::Passed(json!("a")));
        assert_eq!(check("Int", json!(4), false), TypeCheck::Passed(json!(4)));
        assert!(matches!(check("Int", json!(4.5), false), TypeCheck::Failed(_)));
        assert!(matches!(check("Bool", json!("yes"), false), TypeCheck::Failed(_)));
        assert_eq!(
            check("Email", json!("user@example.com"), false),
            TypeCheck::Passed(json!("user@example.com"))
        );
        assert!(matches!(check("Url", json!("not a url"), false), TypeCheck::Failed(_)));
        assert!(matches!(
            check("Uuid", json!("550e8400-e29b-41d4-a716-446655440000"), false),
            TypeCheck::Passed(_)
        ));
    }

    #[test]
    fn test_builtin_coercions() {
        assert_eq!(check("Int", json!(" 42 "), true), TypeCheck::Passed(json!(42)));
        assert_eq!(check("Num", json!("2.5"), true), TypeCheck::Passed(json!(2.5)));
        assert_eq!(check("Bool", json!("off"), true), TypeCheck::Passed(json!(false)));
        assert_eq!(
            check("Int", json!("forty"), true),
            TypeCheck::Failed("value is not a valid Int".into())
        );
    }

    #[test]
    fn test_explicit_coercion_ignored_when_coerce_set() {
        let registry = TypeRegistry::new();
        let doubled = Coercion::new("Int", |v| v.as_i64().map(|n| json!(n * 2)));
        let to_string = CoerceOptions {
            coerce: false,
            coercion: Some(Coercion::new("Int", |v| Some(json!(v.to_string())))),
        };
        assert_eq!(
            registry.check("Str", &json!(7), &to_string).unwrap(),
            TypeCheck::Passed(json!("7"))
        );

        // Str has no coercions of its own, so with coerce set the explicit
        // rule is never consulted.
        let both = CoerceOptions {
            coerce: true,
            coercion: Some(doubled),
        };
        assert!(matches!(
            registry.check("Str", &json!(7), &both).unwrap(),
            TypeCheck::Failed(_)
        ));
    }

    #[test]
    fn test_custom_type() {
        let registry = TypeRegistry::new().register(
            TypeConstraint::new("Even", |v| v.as_i64().is_some_and(|n| n % 2 == 0))
                .with_coercion(Coercion::new("Int", |v| v.as_i64().map(|n| json!(n * 2)))),
        );
        let coerce = CoerceOptions {
            coerce: true,
            coercion: None,
        };
        assert_eq!(
            registry.check("Even", &json!(3), &coerce).unwrap(),
            TypeCheck::Passed(json!(6))
        );
    }

    #[test]
    fn test_unknown_type() {
        let err = TypeRegistry::new()
            .check("Decimal", &json!(1), &CoerceOptions::default())
            .unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownType("Decimal".into()));
    }

    #[test]
    fn test_registry_knows_registered_names() {
        let registry = TypeRegistry::new();
        assert!(registry.knows("Int"));
        assert!(!registry.knows("Decimal"));
        assert!(!TypeRegistry::empty().knows("Str"));
    }
}
