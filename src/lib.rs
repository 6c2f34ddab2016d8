// Verity - profile-driven data verification for Rust
//
// A profile names the fields a record must or may carry and, per field, the
// filters, type, length bounds, dependents and cross-field checks that apply.
// Verifying a record produces per-field results plus aggregate counts.

// Re-export core functionality
pub use verity_core::*;

// Re-export logging
pub use verity_log;

// Re-export JSON helpers used to build records
pub use serde_json::json;

// Re-export optional crates
#[cfg(feature = "config")]
pub use verity_config;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AccessorRecord,
        CoerceOptions,
        Coercion,
        ConfigurationError,
        DerivedSpec,
        FieldSpec,
        FieldStatus,
        Filter,
        Profile,
        Record,
        Results,
        TypeCheck,
        TypeChecker,
        TypeConstraint,
        TypeRegistry,
        Value,
        Verifier,
        json,
        post_checks,
    };

    #[cfg(feature = "config")]
    pub use verity_config::{FileFormat, ProfileLoader};
}
