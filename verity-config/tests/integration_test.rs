//! Integration tests for verity-config

use serde_json::json;
use std::env;
use std::io::Write;
use verity_config::*;
use verity_core::{Coercion, TypeConstraint, TypeRegistry};

const SIGNUP: &str = r#"
filters = ["trim"]

[fields.email]
required = true
type = "Email"
equals = "email2"

[fields.email.dependent.email2]
required = true

[fields.password]
required = 1
min_length = 8
"#;

fn write_profile(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_toml_file() {
    let file = write_profile(".toml", SIGNUP);
    let verifier = ProfileLoader::auto(file.path())
        .unwrap()
        .load_file(file.path())
        .unwrap();

    let results = verifier
        .verify(&json!({
            "email": " ada@example.com ",
            "email2": "ada@example.com",
            "password": "correct horse"
        }))
        .unwrap();
    assert!(results.success());
    assert_eq!(results.valid_count(), 3);

    let mismatch = verifier
        .verify(&json!({
            "email": "ada@example.com",
            "email2": "bob@example.com",
            "password": "short"
        }))
        .unwrap();
    assert!(mismatch.is_invalid("email"));
    assert!(mismatch.is_valid("email2"));
    assert_eq!(
        mismatch.reason("password"),
        Some("value is shorter than the minimum length of 8")
    );
}

#[test]
fn test_load_json_file() {
    let file = write_profile(
        ".json",
        r#"{"fields": {"age": {"type": "Int", "coerce": true}}}"#,
    );
    let verifier = ProfileLoader::auto(file.path())
        .unwrap()
        .load_file(file.path())
        .unwrap();

    let results = verifier.verify(&json!({"age": "41"})).unwrap();
    assert_eq!(results.get_value("age"), Some(&json!(41)));
}

#[test]
fn test_missing_file() {
    let err = ProfileLoader::new(FileFormat::Json)
        .load_file("/definitely/not/here.json")
        .unwrap_err();
    assert!(matches!(err, ConfigError::LoadError(_)));
    assert!(
        err.to_string()
            .starts_with("Failed to load profile: Failed to read /definitely/not/here.json")
    );
}

#[test]
fn test_custom_types() {
    let types = TypeRegistry::new().register(
        TypeConstraint::new("Cents", |v| v.as_i64().is_some_and(|n| n >= 0)).with_coercion(
            Coercion::new("Str", |v| {
                let dollars: f64 = v.as_str()?.trim_start_matches('$').parse().ok()?;
                Some(json!((dollars * 100.0).round() as i64))
            }),
        ),
    );

    let loader = ProfileLoader::new(FileFormat::Json).with_types(types);
    let verifier = loader
        .parse(r#"{"fields": {"price": {"type": "Cents", "coerce": true}}}"#)
        .unwrap();

    let results = verifier.verify(&json!({"price": "$12.50"})).unwrap();
    assert_eq!(results.get_value("price"), Some(&json!(1250)));

    // The default registry has never heard of Cents.
    let err = ProfileLoader::new(FileFormat::Json)
        .parse(r#"{"fields": {"price": {"type": "Cents"}}}"#)
        .unwrap_err();
    assert_eq!(err.to_string(), "Unknown type: Cents");
}

#[test]
fn test_from_env() {
    let file = write_profile(".json", r#"{"fields": {"name": {"required": true}}}"#);

    unsafe {
        env::set_var(PROFILE_ENV, file.path());
    }
    let verifier = ProfileLoader::from_env();
    unsafe {
        env::remove_var(PROFILE_ENV);
    }

    let results = verifier.unwrap().verify(&json!({})).unwrap();
    assert!(results.is_invalid("name"));
}
