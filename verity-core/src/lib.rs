//! Profile-driven record verification
//!
//! A [`Profile`] names the fields of a record and, for each one, how to
//! verify it: filters, required-ness, length bounds, a type with optional
//! coercion, dependent sub-profiles and post-checks. A [`Verifier`] runs a
//! record through the profile and returns [`Results`] describing every
//! field as valid, invalid or missing, together with its original,
//! filtered and final values.
//!
//! # Examples
//!
//! ## Basic Verification
//!
//! ```
//! use serde_json::json;
//! use verity_core::{FieldSpec, Profile, Verifier};
//!
//! let profile = Profile::new()
//!     .field("name", FieldSpec::required_field().filter("trim").max_length(32))
//!     .field("age", FieldSpec::new().of_type("Int").coerce());
//!
//! let results = Verifier::new(profile)
//!     .verify(&json!({"name": "  Ada ", "age": "36"}))
//!     .unwrap();
//!
//! assert!(results.success());
//! assert_eq!(results.get_value("name"), Some(&json!("Ada")));
//! assert_eq!(results.get_original_value("name"), Some(&json!("  Ada ")));
//! assert_eq!(results.get_value("age"), Some(&json!(36)));
//! ```
//!
//! ## Dependents and Post-checks
//!
//! ```
//! use serde_json::json;
//! use verity_core::{post_checks, FieldSpec, Profile, Verifier};
//!
//! let profile = Profile::new().field(
//!     "email",
//!     FieldSpec::required_field()
//!         .dependent(Profile::new().field("email2", FieldSpec::required_field()))
//!         .post_check(post_checks::equals("email", "email2")),
//! );
//!
//! let results = Verifier::new(profile)
//!     .verify(&json!({"email": "a@example.com", "email2": "b@example.com"}))
//!     .unwrap();
//!
//! assert!(!results.success());
//! assert!(results.is_invalid("email"));
//! assert!(results.is_valid("email2"));
//! ```
//!
//! ## Configuration Errors
//!
//! ```
//! use serde_json::json;
//! use verity_core::{FieldSpec, Profile, Verifier};
//!
//! let profile = Profile::new().field("name", FieldSpec::new().filter("foobazgorch"));
//! let err = Verifier::new(profile).verify(&json!({})).unwrap_err();
//! assert_eq!(err.to_string(), "Unknown filter: foobazgorch");
//! ```

mod errors;
mod field;
mod filters;
mod profile;
mod record;
mod results;
mod types;
mod verifier;

pub use errors::*;
pub use field::{FieldContext, FieldResult, FieldStatus, verify_field};
pub use filters::*;
pub use profile::*;
pub use record::*;
pub use results::*;
pub use types::*;
pub use verifier::*;

/// Raw and final field values.
pub use serde_json::Value;
