// Verification results aggregate

use crate::{FieldResult, FieldStatus, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counts {
    valid: usize,
    invalid: usize,
    missing: usize,
}

impl Counts {
    fn tally(fields: &BTreeMap<String, FieldResult>) -> Self {
        fields.values().fold(Self::default(), |mut counts, field| {
            match field.status() {
                FieldStatus::Valid => counts.valid += 1,
                FieldStatus::Invalid => counts.invalid += 1,
                FieldStatus::Missing => {}
            }
            if !field.is_set() {
                counts.missing += 1;
            }
            counts
        })
    }
}

/// Every field's outcome from one `verify` call, dependents included,
/// keyed by field name.
///
/// Lookups on a name that was never verified return `false` / `None`
/// instead of failing.
///
/// Serializes as a map of field name to [`FieldResult`] without final
/// values; deserializing rebuilds the counts without re-running
/// verification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, FieldResult>",
    into = "BTreeMap<String, FieldResult>"
)]
pub struct Results {
    fields: BTreeMap<String, FieldResult>,
    counts: Counts,
}

impl Results {
    pub fn new(fields: BTreeMap<String, FieldResult>) -> Self {
        let counts = Counts::tally(&fields);
        Self { fields, counts }
    }

    // Only the verifier mutates results, and only before handing them out.
    pub(crate) fn invalidate(&mut self, name: &str, reason: impl Into<String>) {
        if let Some(field) = self.fields.remove(name) {
            self.fields
                .insert(name.to_string(), field.invalidated(reason));
            self.counts = Counts::tally(&self.fields);
        }
    }

    pub(crate) fn record(&mut self, name: impl Into<String>, field: FieldResult) {
        self.fields.insert(name.into(), field);
        self.counts = Counts::tally(&self.fields);
    }

    pub fn field(&self, name: &str) -> Option<&FieldResult> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldResult)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn status(&self, name: &str) -> Option<FieldStatus> {
        self.field(name).map(FieldResult::status)
    }

    pub fn is_valid(&self, name: &str) -> bool {
        self.status(name) == Some(FieldStatus::Valid)
    }

    /// True for fields present but rejected, and for required fields that
    /// were absent.
    pub fn is_invalid(&self, name: &str) -> bool {
        self.status(name) == Some(FieldStatus::Invalid)
    }

    /// True only for absent fields that were not required.
    pub fn is_missing(&self, name: &str) -> bool {
        self.status(name) == Some(FieldStatus::Missing)
    }

    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.field(name).and_then(FieldResult::value)
    }

    pub fn get_original_value(&self, name: &str) -> Option<&Value> {
        self.field(name).and_then(FieldResult::original_value)
    }

    pub fn get_post_filter_value(&self, name: &str) -> Option<&Value> {
        self.field(name).and_then(FieldResult::post_filter_value)
    }

    pub fn reason(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldResult::reason)
    }

    /// No field is invalid. Absent optional fields do not count against
    /// success.
    pub fn success(&self) -> bool {
        self.counts.invalid == 0
    }

    pub fn valid_count(&self) -> usize {
        self.counts.valid
    }

    pub fn invalid_count(&self) -> usize {
        self.counts.invalid
    }

    /// Fields that were absent, required or not.
    pub fn missing_count(&self) -> usize {
        self.counts.missing
    }

    fn names_with(&self, status: FieldStatus) -> Vec<&str> {
        self.fields()
            .filter(|(_, field)| field.status() == status)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn valids(&self) -> Vec<&str> {
        self.names_with(FieldStatus::Valid)
    }

    pub fn invalids(&self) -> Vec<&str> {
        self.names_with(FieldStatus::Invalid)
    }

    pub fn missings(&self) -> Vec<&str> {
        self.names_with(FieldStatus::Missing)
    }

    /// Final values of every valid field.
    pub fn valid_values(&self) -> BTreeMap<String, Value> {
        self.fields
            .iter()
            .filter_map(|(name, field)| {
                field
                    .is_valid()
                    .then(|| field.value().cloned())
                    .flatten()
                    .map(|value| (name.clone(), value))
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": self.success(),
            "valid_count": self.valid_count(),
            "invalid_count": self.invalid_count(),
            "missing_count": self.missing_count(),
            "fields": self.fields,
        })
    }
}

impl From<BTreeMap<String, FieldResult>> for Results {
    fn from(fields: BTreeMap<String, FieldResult>) -> Self {
        Self::new(fields)
    }
}

impl From<Results> for BTreeMap<String, FieldResult> {
    fn from(results: Results) -> Self {
        results.fields
    }
}
