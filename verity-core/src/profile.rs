// Profiles: declarative per-field verification specs

use crate::{Coercion, Filter, Results, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Context object handed through to a post-check untouched.
pub type PostCheckArgument = dyn Any + Send + Sync;

/// `Ok(true)` keeps the field valid, `Ok(false)` invalidates it with a
/// generic reason, `Err(message)` invalidates it with `message` as reason.
pub type PostCheckResult = std::result::Result<bool, String>;

pub type PostCheck =
    Arc<dyn Fn(&Results, Option<&PostCheckArgument>) -> PostCheckResult + Send + Sync>;

pub type Deriver = Arc<dyn Fn(&Results) -> Option<Value> + Send + Sync>;

/// Verification spec for one field.
#[derive(Clone, Default)]
pub struct FieldSpec {
    pub required: bool,
    pub type_name: Option<String>,
    pub coerce: bool,
    /// Ignored when `coerce` is set.
    pub coercion: Option<Coercion>,
    pub filters: Vec<Filter>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub dependent: Option<Profile>,
    pub post_check: Option<PostCheck>,
    pub post_check_argument: Option<Arc<PostCheckArgument>>,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `FieldSpec::new().required()`.
    pub fn required_field() -> Self {
        Self::new().required()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn of_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    pub fn coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = Some(coercion);
        self
    }

    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn filters<I, F>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Filter>,
    {
        self.filters.extend(filters.into_iter().map(Into::into));
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Fields verified against the same record whenever this field is.
    pub fn dependent(mut self, profile: Profile) -> Self {
        self.dependent = Some(profile);
        self
    }

    pub fn post_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&Results, Option<&PostCheckArgument>) -> PostCheckResult + Send + Sync + 'static,
    {
        self.post_check = Some(Arc::new(check));
        self
    }

    pub fn post_check_argument<A: Any + Send + Sync>(mut self, argument: A) -> Self {
        self.post_check_argument = Some(Arc::new(argument));
        self
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("required", &self.required)
            .field("type_name", &self.type_name)
            .field("coerce", &self.coerce)
            .field("coercion", &self.coercion)
            .field("filters", &self.filters)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("dependent", &self.dependent)
            .field("post_check", &self.post_check.is_some())
            .finish()
    }
}

/// A field whose value is computed from the verified results rather than
/// read from the record.
#[derive(Clone)]
pub struct DerivedSpec {
    pub required: bool,
    /// Source fields invalidated when a required derivation fails.
    pub fields: Vec<String>,
    pub deriver: Deriver,
}

impl DerivedSpec {
    pub fn new<F>(deriver: F) -> Self
    where
        F: Fn(&Results) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            required: false,
            fields: Vec::new(),
            deriver: Arc::new(deriver),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn from_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }
}

impl fmt::Debug for DerivedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedSpec")
            .field("required", &self.required)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Ordered mapping of field name to [`FieldSpec`].
///
/// Fields are verified in insertion order, which keeps diagnostics
/// reproducible. Adding a field under an existing name replaces its spec in
/// place.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    fields: Vec<(String, FieldSpec)>,
    derived: Vec<(String, DerivedSpec)>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.insert(name, spec);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = spec,
            None => self.fields.push((name, spec)),
        }
    }

    pub fn derived(mut self, name: impl Into<String>, spec: DerivedSpec) -> Self {
        let name = name.into();
        self.derived.retain(|(existing, _)| *existing != name);
        self.derived.push((name, spec));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, spec)| spec)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn derived_fields(&self) -> impl Iterator<Item = (&str, &DerivedSpec)> {
        self.derived.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Ready-made post-checks.
pub mod post_checks {
    use super::{PostCheckArgument, PostCheckResult};
    use crate::Results;

    /// Passes when `field` and `other` have equal final values.
    pub fn equals(
        field: impl Into<String>,
        other: impl Into<String>,
    ) -> impl Fn(&Results, Option<&PostCheckArgument>) -> PostCheckResult + Send + Sync + 'static
    {
        let field = field.into();
        let other = other.into();
        move |results, _| Ok(results.get_value(&field) == results.get_value(&other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_spec_builder() {
        let spec = FieldSpec::required_field()
            .of_type("Int")
            .coerce()
            .filters(["trim", "collapse"])
            .min_length(1)
            .max_length(8);

        assert!(spec.required);
        assert!(spec.coerce);
        assert_eq!(spec.type_name.as_deref(), Some("Int"));
        assert_eq!(spec.filters.len(), 2);
        assert_eq!((spec.min_length, spec.max_length), (Some(1), Some(8)));
    }

    #[test]
    fn test_profile_keeps_insertion_order() {
        let profile = Profile::new()
            .field("zeta", FieldSpec::new())
            .field("alpha", FieldSpec::new())
            .field("zeta", FieldSpec::required_field());

        let names: Vec<_> = profile.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert!(profile.get("zeta").unwrap().required);
        assert_eq!(profile.len(), 2);
    }

    #[test]
    fn test_post_check_argument_downcast() {
        let spec = FieldSpec::new().post_check_argument(5usize);
        let argument = spec.post_check_argument.as_deref().unwrap();
        assert_eq!(argument.downcast_ref::<usize>(), Some(&5));
    }
}
