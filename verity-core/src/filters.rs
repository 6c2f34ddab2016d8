// Filter resolution and composition

use crate::{ConfigurationError, Result, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A resolved string transform.
pub type Transform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Names accepted by [`Filter::Named`].
pub const BUILTIN_FILTERS: &[&str] = &["collapse", "flatten", "lower", "trim", "upper"];

fn builtin(name: &str) -> Option<fn(&str) -> String> {
    let transform: fn(&str) -> String = match name {
        "trim" => |s| s.trim().to_string(),
        "collapse" => |s| WHITESPACE_RUN.replace_all(s, " ").into_owned(),
        "flatten" => |s| s.chars().filter(|c| !c.is_whitespace()).collect(),
        "lower" => |s| s.to_lowercase(),
        "upper" => |s| s.to_uppercase(),
        _ => return None,
    };
    Some(transform)
}

/// A filter identifier: either the name of a built-in transform or a
/// caller-supplied function.
#[derive(Clone)]
pub enum Filter {
    Named(String),
    Custom(Transform),
}

impl Filter {
    pub fn named(name: impl Into<String>) -> Self {
        Filter::Named(name.into())
    }

    pub fn custom<F>(transform: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Filter::Custom(Arc::new(transform))
    }

    /// Resolve to a callable transform, failing on unknown names.
    pub fn resolve(&self) -> Result<Transform> {
        match self {
            Filter::Custom(transform) => Ok(Arc::clone(transform)),
            Filter::Named(name) => builtin(name)
                .map(|f| Arc::new(f) as Transform)
                .ok_or_else(|| ConfigurationError::UnknownFilter(name.clone())),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Filter::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

impl From<&str> for Filter {
    fn from(name: &str) -> Self {
        Filter::named(name)
    }
}

impl From<String> for Filter {
    fn from(name: String) -> Self {
        Filter::Named(name)
    }
}

/// An ordered sequence of resolved transforms, applied left to right.
#[derive(Clone, Default)]
pub struct FilterChain {
    transforms: Vec<Transform>,
}

impl FilterChain {
    /// Resolve every filter up front so an unknown name fails before any
    /// value is touched.
    pub fn resolve<'a, I>(filters: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Filter>,
    {
        let transforms = filters
            .into_iter()
            .map(Filter::resolve)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { transforms })
    }

    /// This chain followed by `other`.
    pub fn then(&self, other: &FilterChain) -> FilterChain {
        let mut transforms = self.transforms.clone();
        transforms.extend(other.transforms.iter().cloned());
        FilterChain { transforms }
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn apply_str(&self, input: &str) -> String {
        self.transforms
            .iter()
            .fold(input.to_string(), |acc, transform| transform(&acc))
    }

    /// Filter a raw value. Strings are transformed, lists element by
    /// element; anything else is returned unchanged.
    pub fn apply(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.apply_str(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.apply(v)).collect()),
            other => other.clone(),
        }
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("len", &self.transforms.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(name: &str, input: &str) -> String {
        let transform = Filter::named(name).resolve().unwrap();
        transform(input)
    }

    #[test]
    fn test_builtins() {
        assert_eq!(run("trim", "  foo bar \n"), "foo bar");
        assert_eq!(run("collapse", "foo\t bar\n\nbaz"), "foo bar baz");
        assert_eq!(run("flatten", " f o\to "), "foo");
        assert_eq!(run("lower", "FoO"), "foo");
        assert_eq!(run("upper", "foo bar"), "FOO BAR");
    }

    #[test]
    fn test_every_listed_builtin_resolves() {
        for name in BUILTIN_FILTERS {
            assert!(Filter::named(*name).resolve().is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_unknown_filter() {
        let err = Filter::named("foobazgorch").resolve().err().unwrap();
        assert_eq!(err, ConfigurationError::UnknownFilter("foobazgorch".into()));
        assert_eq!(err.to_string(), "Unknown filter: foobazgorch");
    }

    #[test]
    fn test_chain_order() {
        let global = FilterChain::resolve(&[Filter::named("trim")]).unwrap();
        let field = FilterChain::resolve(&[
            Filter::custom(|s| format!("{}!", s)),
            Filter::named("upper"),
        ])
        .unwrap();

        let chain = global.then(&field);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.apply_str("  hi  "), "HI!");
    }

    #[test]
    fn test_apply_values() {
        let chain = FilterChain::resolve(&[Filter::named("trim")]).unwrap();
        assert_eq!(chain.apply(&json!(" a ")), json!("a"));
        assert_eq!(chain.apply(&json!([" a", "b "])), json!(["a", "b"]));
        assert_eq!(chain.apply(&json!(42)), json!(42));
    }

    #[test]
    fn test_filters_are_idempotent() {
        let chain = FilterChain::resolve(&[Filter::named("collapse"), Filter::named("trim")])
            .unwrap();
        let once = chain.apply_str(" foo \t bar ");
        assert_eq!(chain.apply_str(&once), once);
    }
}
