// Profile documents

use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use verity_core::{ConfigurationError, FieldSpec, Filter, Profile, TypeRegistry, post_checks};

const FIELD_KEYS: &[&str] = &[
    "coerce",
    "dependent",
    "equals",
    "filters",
    "max_length",
    "min_length",
    "required",
    "type",
];

/// A parsed profile document: global filter names plus the profile.
///
/// ```toml
/// filters = ["trim"]
///
/// [fields.email]
/// required = true
/// type = "Email"
/// equals = "email2"
///
/// [fields.email.dependent.email2]
/// required = true
/// ```
#[derive(Debug, Clone)]
pub struct ProfileDocument {
    pub filters: Vec<String>,
    pub profile: Profile,
}

impl ProfileDocument {
    /// Build from an already parsed document. Filter and type names are
    /// checked here, so a document that loads cleanly cannot fail `verify`
    /// with an unknown filter or type.
    pub fn from_value(document: &Value, types: &TypeRegistry) -> Result<Self> {
        let root = document
            .as_object()
            .ok_or_else(|| malformed("profile document must be a mapping"))?;

        if let Some(key) = root.keys().find(|k| *k != "filters" && *k != "fields") {
            return Err(malformed(format!("unknown top-level key '{}'", key)));
        }

        let filters = match root.get("filters") {
            Some(value) => filter_names("filters", value)?,
            None => Vec::new(),
        };
        let fields = root
            .get("fields")
            .ok_or_else(|| malformed("profile document has no 'fields' mapping"))?;

        Ok(Self {
            filters,
            profile: build_profile("fields", fields, types)?,
        })
    }
}

fn malformed(message: impl Into<String>) -> ConfigError {
    ConfigError::MalformedProfile(message.into())
}

fn filter_names(path: &str, value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| malformed(format!("{} must be a list of filter names", path)))?;

    let mut names = Vec::with_capacity(items.len());
    for item in items {
        let name = item
            .as_str()
            .ok_or_else(|| malformed(format!("{} must contain only strings", path)))?;
        Filter::named(name).resolve()?;
        names.push(name.to_string());
    }
    Ok(names)
}

fn build_profile(path: &str, value: &Value, types: &TypeRegistry) -> Result<Profile> {
    let fields = value
        .as_object()
        .ok_or_else(|| malformed(format!("{} must be a mapping of field names", path)))?;

    let mut profile = Profile::new();
    for (name, spec) in fields {
        let field = build_field(&format!("{}.{}", path, name), name, spec, types)?;
        profile.insert(name.clone(), field);
    }
    Ok(profile)
}

fn flag(path: &str, spec: &Map<String, Value>, key: &str) -> Result<bool> {
    match spec.get(key) {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        // `required = 1` reads naturally in hand-written profiles.
        Some(Value::Number(n)) if n.is_u64() => Ok(n.as_u64() != Some(0)),
        Some(_) => Err(malformed(format!("{}.{} must be a boolean", path, key))),
    }
}

fn length(path: &str, spec: &Map<String, Value>, key: &str) -> Result<Option<usize>> {
    match spec.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                malformed(format!("{}.{} must be a non-negative integer", path, key))
            }),
    }
}

fn string<'a>(path: &str, spec: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>> {
    match spec.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| malformed(format!("{}.{} must be a string", path, key))),
    }
}

fn build_field(path: &str, name: &str, value: &Value, types: &TypeRegistry) -> Result<FieldSpec> {
    let spec = value
        .as_object()
        .ok_or_else(|| malformed(format!("{} must be a mapping", path)))?;

    if let Some(key) = spec.keys().find(|k| !FIELD_KEYS.contains(&k.as_str())) {
        return Err(malformed(format!("{} has unknown key '{}'", path, key)));
    }

    let mut field = FieldSpec::new();
    field.required = flag(path, spec, "required")?;
    field.coerce = flag(path, spec, "coerce")?;
    field.min_length = length(path, spec, "min_length")?;
    field.max_length = length(path, spec, "max_length")?;

    if let (Some(min), Some(max)) = (field.min_length, field.max_length) {
        if min > max {
            return Err(malformed(format!(
                "{} has min_length {} greater than max_length {}",
                path, min, max
            )));
        }
    }

    if let Some(type_name) = string(path, spec, "type")? {
        if !types.contains(type_name) {
            return Err(ConfigurationError::UnknownType(type_name.to_string()).into());
        }
        field.type_name = Some(type_name.to_string());
    }

    if let Some(filters) = spec.get("filters") {
        field.filters = filter_names(&format!("{}.filters", path), filters)?
            .into_iter()
            .map(Filter::Named)
            .collect();
    }

    if let Some(other) = string(path, spec, "equals")? {
        field = field.post_check(post_checks::equals(name, other));
    }

    if let Some(dependent) = spec.get("dependent") {
        field.dependent = Some(build_profile(
            &format!("{}.dependent", path),
            dependent,
            types,
        )?);
    }

    Ok(field)
}
