// Single-field verification pipeline

use crate::{
    CoerceOptions, ConfigurationError, FieldSpec, FilterChain, Result, TypeCheck, TypeChecker,
    Value,
};
use serde::{Deserialize, Serialize};
use verity_log::trace;

pub(crate) const REQUIRED_MISSING: &str = "required field missing";

/// Which of the three mutually exclusive states a field is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    Valid,
    Invalid,
    Missing,
}

/// Outcome of verifying one field.
///
/// The final `value` is never serialized: after a round trip it is absent
/// and only the plain-data attributes remain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResult {
    #[serde(skip)]
    value: Option<Value>,
    original_value: Option<Value>,
    post_filter_value: Option<Value>,
    valid: bool,
    reason: Option<String>,
    set: bool,
    #[serde(default)]
    required: bool,
}

impl FieldResult {
    pub(crate) fn valid(original: Option<Value>, post_filter: Option<Value>, value: Value) -> Self {
        Self {
            value: Some(value),
            original_value: original,
            post_filter_value: post_filter,
            valid: true,
            reason: None,
            set: true,
            required: false,
        }
    }

    pub(crate) fn invalid(
        original: Option<Value>,
        post_filter: Option<Value>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            value: None,
            original_value: original,
            post_filter_value: post_filter,
            valid: false,
            reason: Some(reason.into()),
            set: true,
            required: false,
        }
    }

    pub(crate) fn missing(original: Option<Value>, post_filter: Option<Value>, required: bool) -> Self {
        Self {
            value: None,
            original_value: original,
            post_filter_value: post_filter,
            valid: false,
            reason: required.then(|| REQUIRED_MISSING.to_string()),
            set: false,
            required,
        }
    }

    pub(crate) fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// The same outcome, now invalid for `reason`. The final value is
    /// dropped along with validity.
    pub(crate) fn invalidated(mut self, reason: impl Into<String>) -> Self {
        self.value = None;
        self.valid = false;
        self.reason = Some(reason.into());
        self
    }

    pub fn status(&self) -> FieldStatus {
        match (self.set, self.valid, self.required) {
            (true, true, _) => FieldStatus::Valid,
            (true, false, _) | (false, _, true) => FieldStatus::Invalid,
            (false, _, false) => FieldStatus::Missing,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status() == FieldStatus::Valid
    }

    pub fn is_invalid(&self) -> bool {
        self.status() == FieldStatus::Invalid
    }

    pub fn is_missing(&self) -> bool {
        self.status() == FieldStatus::Missing
    }

    /// Final, possibly coerced value; present only while the field is valid.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn original_value(&self) -> Option<&Value> {
        self.original_value.as_ref()
    }

    pub fn post_filter_value(&self) -> Option<&Value> {
        self.post_filter_value.as_ref()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Whether the field was present at all.
    pub fn is_set(&self) -> bool {
        self.set
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// What the field verifier needs beyond the field spec and the raw value.
pub struct FieldContext<'a> {
    /// Profile-wide filters, applied before the field's own.
    pub global_filters: &'a FilterChain,
    pub types: &'a dyn TypeChecker,
}

/// Null, the empty string, and lists left empty once empty elements are
/// dropped all count as absent.
fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(items) => {
            let kept: Vec<Value> = items.into_iter().filter_map(normalize).collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
        other => Some(other),
    }
}

fn measured_length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Number(n) => Some(n.to_string().chars().count()),
        _ => None,
    }
}

fn check_length(spec: &FieldSpec, value: &Value) -> Option<String> {
    if let Value::Array(items) = value {
        return items.iter().find_map(|item| check_length(spec, item));
    }

    let length = measured_length(value)?;
    if let Some(min) = spec.min_length.filter(|min| length < *min) {
        return Some(format!("value is shorter than the minimum length of {}", min));
    }
    if let Some(max) = spec.max_length.filter(|max| length > *max) {
        return Some(format!("value is longer than the maximum length of {}", max));
    }
    None
}

/// Run the single-field pipeline: filter, empty normalization, required
/// check, length check, then type check with optional coercion. The first
/// failing stage decides the outcome.
///
/// Only configuration problems (unknown filter or type, contradictory
/// length bounds) are returned as errors, whether or not a value is present.
pub fn verify_field(
    name: &str,
    spec: &FieldSpec,
    raw: Option<Value>,
    ctx: &FieldContext<'_>,
) -> Result<FieldResult> {
    let chain = ctx
        .global_filters
        .then(&FilterChain::resolve(&spec.filters)?);

    if let (Some(min), Some(max)) = (spec.min_length, spec.max_length) {
        if min > max {
            return Err(ConfigurationError::MalformedProfile(format!(
                "field '{}' has min_length {} greater than max_length {}",
                name, min, max
            )));
        }
    }

    if let Some(type_name) = spec.type_name.as_deref().filter(|t| !ctx.types.knows(t)) {
        return Err(ConfigurationError::UnknownType(type_name.to_string()));
    }

    let post_filter = raw.as_ref().map(|value| {
        if chain.is_empty() {
            value.clone()
        } else {
            chain.apply(value)
        }
    });

    let Some(value) = post_filter.clone().and_then(normalize) else {
        trace!(target: "verity::field", "{}: not set (required: {})", name, spec.required);
        return Ok(FieldResult::missing(raw, post_filter, spec.required));
    };

    let result = if let Some(reason) = check_length(spec, &value) {
        FieldResult::invalid(raw, post_filter, reason)
    } else if let Some(type_name) = &spec.type_name {
        let options = CoerceOptions {
            coerce: spec.coerce,
            coercion: spec.coercion.clone(),
        };
        match ctx.types.check(type_name, &value, &options)? {
            TypeCheck::Passed(checked) => FieldResult::valid(raw, post_filter, checked),
            TypeCheck::Failed(reason) => FieldResult::invalid(raw, post_filter, reason),
        }
    } else {
        FieldResult::valid(raw, post_filter, value)
    };

    trace!(target: "verity::field", "{}: {:?}", name, result.status());
    Ok(result.with_required(spec.required))
}
