// Profile verification

use crate::field::{FieldContext, verify_field};
use crate::{
    ConfigurationError, DerivedSpec, FieldResult, FieldSpec, Filter, FilterChain, Profile, Record,
    Result, Results, TypeChecker, TypeRegistry,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use verity_log::{debug, warn};

const POST_CHECK_FAILED: &str = "post check failed";

/// Verifies records against a [`Profile`].
///
/// The profile, global filters and type checker are shared read-only
/// configuration, so a `Verifier` is cheap to clone and safe to use from
/// many threads at once. Each `verify` call builds its own [`Results`].
#[derive(Clone)]
pub struct Verifier {
    profile: Arc<Profile>,
    filters: Arc<Vec<Filter>>,
    types: Arc<dyn TypeChecker>,
}

/// Work collected while walking a profile, run once every field has its
/// pipeline outcome.
#[derive(Default)]
struct Deferred<'p> {
    post_checks: Vec<(&'p str, &'p FieldSpec)>,
    /// Each parent with the flattened names of its dependents, innermost
    /// parents first.
    dependents: Vec<(&'p str, Vec<String>)>,
    derived: Vec<(&'p str, &'p DerivedSpec)>,
}

impl Verifier {
    /// A verifier using the built-in [`TypeRegistry`] and no global filters.
    pub fn new(profile: Profile) -> Self {
        Self {
            profile: Arc::new(profile),
            filters: Arc::new(Vec::new()),
            types: Arc::new(TypeRegistry::new()),
        }
    }

    /// Filters applied to every field before its own filters.
    pub fn with_filters<I, F>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Filter>,
    {
        self.filters = Arc::new(filters.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_type_checker<T: TypeChecker + 'static>(mut self, types: T) -> Self {
        self.types = Arc::new(types);
        self
    }

    pub fn with_shared_type_checker(mut self, types: Arc<dyn TypeChecker>) -> Self {
        self.types = types;
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Verify `record` against the profile.
    ///
    /// Data problems are recorded per field in the returned [`Results`];
    /// only configuration errors (unknown filter or type, malformed
    /// profile) abort the call.
    pub fn verify<R: Record + ?Sized>(&self, record: &R) -> Result<Results> {
        let global = FilterChain::resolve(self.filters.iter()).inspect_err(|e| {
            warn!(target: "verity::verifier", "global filters rejected: {}", e);
        })?;

        let mut fields = BTreeMap::new();
        let mut deferred = Deferred::default();
        self.verify_profile(&self.profile, record, &global, &mut fields, &mut deferred)
            .inspect_err(|e| {
                warn!(target: "verity::verifier", "verification aborted: {}", e);
            })?;

        let mut results = Results::new(fields);
        run_post_checks(&mut results, &deferred.post_checks);
        cascade_dependents(&mut results, &deferred.dependents);
        run_derivations(&mut results, &deferred.derived);

        debug!(
            target: "verity::verifier",
            "verified {} fields: {} valid, {} invalid, {} missing",
            results.fields().count(),
            results.valid_count(),
            results.invalid_count(),
            results.missing_count()
        );
        Ok(results)
    }

    fn verify_profile<'p, R: Record + ?Sized>(
        &self,
        profile: &'p Profile,
        record: &R,
        global: &FilterChain,
        fields: &mut BTreeMap<String, FieldResult>,
        deferred: &mut Deferred<'p>,
    ) -> Result<()> {
        let ctx = FieldContext {
            global_filters: global,
            types: self.types.as_ref(),
        };

        for (name, spec) in profile.fields() {
            let mut result = verify_field(name, spec, record.field(name), &ctx)?;

            if let Some(dependent) = &spec.dependent {
                // Dependents are looked up at the top level of the record and
                // evaluated whether or not the parent is set.
                let mut dependent_fields = BTreeMap::new();
                self.verify_profile(dependent, record, global, &mut dependent_fields, deferred)?;

                let failed: Vec<&str> = dependent_fields
                    .iter()
                    .filter(|(_, field)| field.is_invalid())
                    .map(|(name, _)| name.as_str())
                    .collect();

                // A parent that is absent, or already invalid for its own
                // reasons, is left alone.
                if result.is_valid() && !failed.is_empty() {
                    debug!(
                        target: "verity::verifier",
                        "{} invalidated by dependents: {}",
                        name,
                        failed.join(", ")
                    );
                    result = result.invalidated(dependent_failure(&failed));
                }
                deferred
                    .dependents
                    .push((name, dependent_fields.keys().cloned().collect()));
                fields.extend(dependent_fields);
            }

            if spec.post_check.is_some() {
                deferred.post_checks.push((name, spec));
            }
            fields.insert(name.to_string(), result);
        }

        deferred.derived.extend(profile.derived_fields());
        Ok(())
    }

    /// Verify independent records concurrently on the tokio runtime.
    ///
    /// Results come back in input order. The first configuration error
    /// encountered is returned instead.
    pub async fn verify_parallel<R>(&self, records: Vec<R>) -> Result<Vec<Results>>
    where
        R: Record + Send + 'static,
    {
        use tokio::task::JoinSet;

        let total = records.len();
        let mut set = JoinSet::new();
        for (index, record) in records.into_iter().enumerate() {
            let verifier = self.clone();
            set.spawn(async move { (index, verifier.verify(&record)) });
        }

        let mut slots: Vec<Option<Results>> =
            std::iter::repeat_with(|| None).take(total).collect();
        while let Some(joined) = set.join_next().await {
            let (index, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => return Err(ConfigurationError::Interrupted(e.to_string())),
            };
            slots[index] = Some(outcome?);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

fn dependent_failure(failed: &[&str]) -> String {
    format!("dependent field invalid: {}", failed.join(", "))
}

/// Dependents can still fail in the post-check pass, so parents that are
/// valid at this point get the same treatment as during the walk.
fn cascade_dependents(results: &mut Results, links: &[(&str, Vec<String>)]) {
    for (parent, dependents) in links {
        if !results.is_valid(parent) {
            continue;
        }

        let failed: Vec<&str> = dependents
            .iter()
            .map(String::as_str)
            .filter(|name| results.is_invalid(name))
            .collect();
        if failed.is_empty() {
            continue;
        }

        let reason = dependent_failure(&failed);
        debug!(
            target: "verity::verifier",
            "{} invalidated by dependents after post checks: {}",
            parent,
            failed.join(", ")
        );
        results.invalidate(parent, reason);
    }
}

fn run_post_checks(results: &mut Results, post_checks: &[(&str, &FieldSpec)]) {
    for (name, spec) in post_checks {
        let Some(check) = &spec.post_check else {
            continue;
        };
        if !results.is_valid(name) {
            continue;
        }

        match check(&*results, spec.post_check_argument.as_deref()) {
            Ok(true) => {}
            Ok(false) => results.invalidate(name, POST_CHECK_FAILED),
            Err(reason) => results.invalidate(name, reason),
        }
    }
}

fn run_derivations(results: &mut Results, derived: &[(&str, &DerivedSpec)]) {
    for (name, spec) in derived {
        match (spec.deriver)(&*results) {
            Some(value) => results.record(*name, FieldResult::valid(None, None, value)),
            None => {
                results.record(*name, FieldResult::missing(None, None, spec.required));
                if spec.required {
                    let reason = format!("derived field {} failed", name);
                    for source in &spec.fields {
                        results.invalidate(source, reason.clone());
                    }
                }
            }
        }
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("profile", &self.profile)
            .field("filters", &self.filters)
            .finish()
    }
}
