//! Integration tests for common Verity workflows.
//!
//! These tests verify that the most common use cases work correctly.

use std::collections::HashMap;
use verity::prelude::*;

fn signup_profile() -> Profile {
    Profile::new()
        .field(
            "username",
            FieldSpec::required_field()
                .filters(["trim", "lower"])
                .min_length(3)
                .max_length(16),
        )
        .field(
            "email",
            FieldSpec::required_field()
                .of_type("Email")
                .dependent(Profile::new().field("email2", FieldSpec::required_field()))
                .post_check(post_checks::equals("email", "email2")),
        )
        .field("age", FieldSpec::new().of_type("Int").coerce())
        .field("website", FieldSpec::new().of_type("Url"))
}

// =============================================================================
// Form Submission Tests
// =============================================================================

#[test]
fn test_signup_form_success() {
    let verifier = Verifier::new(signup_profile()).with_filters(["collapse"]);

    let results = verifier
        .verify(&json!({
            "username": "  AdaL  ",
            "email": "ada@example.com",
            "email2": "ada@example.com",
            "age": "36"
        }))
        .unwrap();

    assert!(results.success());
    assert_eq!(results.valid_count(), 4);
    assert_eq!(results.missing_count(), 1);
    assert_eq!(results.get_value("username"), Some(&json!("adal")));
    assert_eq!(results.get_original_value("username"), Some(&json!("  AdaL  ")));
    assert_eq!(results.get_value("age"), Some(&json!(36)));
    assert!(results.is_missing("website"));
}

#[test]
fn test_signup_form_errors() {
    let verifier = Verifier::new(signup_profile());

    let results = verifier
        .verify(&json!({
            "username": "al",
            "email": "ada@example.com",
            "email2": "ada@example.org",
            "website": "not a url"
        }))
        .unwrap();

    assert!(!results.success());
    assert_eq!(
        results.reason("username"),
        Some("value is shorter than the minimum length of 3")
    );
    assert_eq!(results.reason("email"), Some("post check failed"));
    assert!(results.is_valid("email2"));
    assert_eq!(results.reason("website"), Some("value is not a valid Url"));
    assert_eq!(results.invalids(), vec!["email", "username", "website"]);
}

#[test]
fn test_form_posted_as_string_map() {
    let mut form = HashMap::new();
    form.insert("username".to_string(), "grace".to_string());
    form.insert("email".to_string(), "grace@example.com".to_string());
    form.insert("email2".to_string(), "grace@example.com".to_string());
    form.insert("age".to_string(), "".to_string());

    let results = Verifier::new(signup_profile()).verify(&form).unwrap();

    assert!(results.success());
    assert_eq!(results.status("age"), Some(FieldStatus::Missing));
}

// =============================================================================
// Redirect Workflow Tests
// =============================================================================

#[test]
fn test_results_survive_redirect() {
    let results = Verifier::new(signup_profile())
        .verify(&json!({"username": " x ", "email": "nope"}))
        .unwrap();

    // Stash the results, redirect, and re-render the form from the copy.
    let stashed = serde_json::to_string(&results).unwrap();
    let restored: Results = serde_json::from_str(&stashed).unwrap();

    assert_eq!(restored.success(), results.success());
    assert_eq!(restored.valid_count(), results.valid_count());
    assert_eq!(restored.invalid_count(), results.invalid_count());
    assert_eq!(restored.missing_count(), results.missing_count());
    assert_eq!(restored.get_original_value("username"), Some(&json!(" x ")));
    assert_eq!(restored.get_post_filter_value("username"), Some(&json!("x")));
    assert_eq!(restored.reason("email"), results.reason("email"));
    assert_eq!(restored.get_value("username"), None);
}

// =============================================================================
// Derived Field Tests
// =============================================================================

#[test]
fn test_derived_full_name() {
    let profile = Profile::new()
        .field("first", FieldSpec::required_field().filter("trim"))
        .field("last", FieldSpec::new().filter("trim"))
        .derived(
            "full_name",
            DerivedSpec::new(|results| {
                let first = results.get_value("first")?.as_str()?;
                let last = results.get_value("last")?.as_str()?;
                Some(json!(format!("{} {}", first, last)))
            })
            .required()
            .from_fields(["first", "last"]),
        );
    let verifier = Verifier::new(profile);

    let results = verifier
        .verify(&json!({"first": " Grace ", "last": "Hopper"}))
        .unwrap();
    assert_eq!(results.get_value("full_name"), Some(&json!("Grace Hopper")));

    let partial = verifier.verify(&json!({"first": "Grace"})).unwrap();
    assert!(partial.is_invalid("full_name"));
    assert!(partial.is_invalid("first"));
}

// =============================================================================
// Batch Verification Tests
// =============================================================================

#[tokio::test]
async fn test_batch_verification() {
    let verifier = Verifier::new(signup_profile());
    let records: Vec<Value> = (0..20)
        .map(|i| {
            json!({
                "username": format!("user{:02}", i),
                "email": format!("user{}@example.com", i),
                "email2": if i % 5 == 0 { "typo@example.com".to_string() } else { format!("user{}@example.com", i) },
            })
        })
        .collect();

    let batch = verifier.verify_parallel(records).await.unwrap();

    assert_eq!(batch.len(), 20);
    for (i, results) in batch.iter().enumerate() {
        assert_eq!(
            results.get_value("username"),
            Some(&json!(format!("user{:02}", i)))
        );
        assert_eq!(results.success(), i % 5 != 0);
    }
}

#[tokio::test]
async fn test_batch_configuration_error() {
    let verifier = Verifier::new(signup_profile()).with_filters(["shout"]);
    let err = verifier
        .verify_parallel(vec![json!({}), json!({})])
        .await
        .unwrap_err();
    assert_eq!(err, ConfigurationError::UnknownFilter("shout".into()));
}

// =============================================================================
// Declarative Profile Tests
// =============================================================================

#[cfg(feature = "config")]
#[test]
fn test_profile_from_document() {
    let verifier = ProfileLoader::new(FileFormat::Json)
        .parse(
            r#"{
                "filters": ["trim"],
                "fields": {
                    "password": {"required": true, "min_length": 8, "equals": "password2"},
                    "password2": {"required": true}
                }
            }"#,
        )
        .unwrap();

    let results = verifier
        .verify(&json!({"password": " hunter22 ", "password2": "hunter22"}))
        .unwrap();
    assert!(results.success());
}
