#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use serde_json::Map;
use serde_json::json;

use super::*;
use crate::auth::Claims;
use crate::auth::ClaimsMap;

fn args(value: serde_json::Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn int_param(name: &str) -> Parameter {
    Parameter {
        param_type: ParameterType::Integer,
        ..Parameter::string(name, "an integer")
    }
}

fn claim_param(name: &str, services: &[&str]) -> Parameter {
    Parameter {
        auth_sources: services.iter().map(ToString::to_string).collect(),
        ..Parameter::string(name, "claim sourced")
    }
}

// ============================================================================
// SECTION: Coercion Tests
// ============================================================================

#[test]
fn string_param_accepts_strings_only() {
    let params = vec![Parameter::string("name", "a name")];
    let values = parse_params(&params, &args(json!({"name": "alice"})), &ClaimsMap::new()).unwrap();
    assert_eq!(values.0[0].value, json!("alice"));

    let err = parse_params(&params, &args(json!({"name": 7})), &ClaimsMap::new()).unwrap_err();
    assert!(err.to_string().contains("must be a string"), "unexpected error: {err}");
}

#[test]
fn integer_param_preserves_exact_value() {
    let params = vec![int_param("id")];
    let big = 9_007_199_254_740_993_i64;
    let values =
        parse_params(&params, &args(json!({ "id": big })), &ClaimsMap::new()).unwrap();
    assert_eq!(values.0[0].value.as_i64(), Some(big));
}

#[test]
fn integer_param_rejects_fractions() {
    let params = vec![int_param("id")];
    let err = parse_params(&params, &args(json!({"id": 3.5})), &ClaimsMap::new()).unwrap_err();
    assert!(err.to_string().contains("fractional"), "unexpected error: {err}");
}

#[test]
fn integer_param_narrows_zero_fraction_floats() {
    let params = vec![int_param("id")];
    let values = parse_params(&params, &args(json!({"id": 3.0})), &ClaimsMap::new()).unwrap();
    assert_eq!(values.0[0].value, json!(3));
}

#[test]
fn integer_param_accepts_integer_strings() {
    let params = vec![int_param("id")];
    let values = parse_params(&params, &args(json!({"id": "42"})), &ClaimsMap::new()).unwrap();
    assert_eq!(values.0[0].value, json!(42));
}

#[test]
fn float_param_widens_integers() {
    let params = vec![Parameter {
        param_type: ParameterType::Float,
        ..Parameter::string("ratio", "a ratio")
    }];
    let values = parse_params(&params, &args(json!({"ratio": 2})), &ClaimsMap::new()).unwrap();
    assert_eq!(values.0[0].value, json!(2.0));
}

#[test]
fn array_param_validates_every_element() {
    let params = vec![Parameter {
        param_type: ParameterType::Array,
        items: Some(Box::new(ItemSchema {
            param_type: ParameterType::Integer,
            description: String::new(),
            items: None,
        })),
        ..Parameter::string("ids", "identifiers")
    }];
    let values =
        parse_params(&params, &args(json!({"ids": [1, 2, 3]})), &ClaimsMap::new()).unwrap();
    assert_eq!(values.0[0].value, json!([1, 2, 3]));

    let err =
        parse_params(&params, &args(json!({"ids": [1, "x"]})), &ClaimsMap::new()).unwrap_err();
    assert!(err.to_string().contains("ids[1]"), "unexpected error: {err}");
}

#[test]
fn object_param_rejects_undeclared_keys_when_closed() {
    let params = vec![Parameter {
        param_type: ParameterType::Object,
        properties: Some(vec![Parameter::string("city", "a city")]),
        additional_properties: Some(false),
        ..Parameter::string("address", "an address")
    }];
    let ok = parse_params(&params, &args(json!({"address": {"city": "Kyoto"}})), &ClaimsMap::new());
    assert!(ok.is_ok());

    let err =
        parse_params(&params, &args(json!({"address": {"zip": "604"}})), &ClaimsMap::new())
            .unwrap_err();
    assert!(err.to_string().contains("zip"), "unexpected error: {err}");
}

// ============================================================================
// SECTION: Parse Flow Tests
// ============================================================================

#[test]
fn missing_required_and_bad_kind_errors_are_batched() {
    let params = vec![Parameter::string("name", "a name"), int_param("id")];
    let err = parse_params(&params, &args(json!({"id": "nope"})), &ClaimsMap::new()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("\"name\" is required"), "unexpected error: {message}");
    assert!(message.contains("\"id\" must be an integer"), "unexpected error: {message}");
}

#[test]
fn default_applies_when_argument_is_absent() {
    let params = vec![Parameter {
        default: Some(json!("fallback")),
        ..Parameter::string("name", "a name")
    }];
    let values = parse_params(&params, &Map::new(), &ClaimsMap::new()).unwrap();
    assert_eq!(values.0[0].value, json!("fallback"));
}

#[test]
fn optional_absent_parameter_binds_null() {
    let params = vec![Parameter {
        required: Some(false),
        ..Parameter::string("note", "a note")
    }];
    let values = parse_params(&params, &Map::new(), &ClaimsMap::new()).unwrap();
    assert_eq!(values.0[0].value, Value::Null);
}

#[test]
fn values_follow_declaration_order() {
    let params =
        vec![Parameter::string("b", "second"), Parameter::string("a", "first")];
    let values =
        parse_params(&params, &args(json!({"a": "1", "b": "2"})), &ClaimsMap::new()).unwrap();
    let names: Vec<&str> = values.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["b", "a"]);
}

// ============================================================================
// SECTION: Claim-Sourced Tests
// ============================================================================

fn claims_for(service: &str, claims: serde_json::Value) -> ClaimsMap {
    let Value::Object(map) = claims else {
        panic!("claims must be an object");
    };
    let mut out = ClaimsMap::new();
    let claims: Claims = map;
    out.insert(service.to_string(), claims);
    out
}

#[test]
fn claim_param_resolves_from_first_matching_service() {
    let params = vec![claim_param("email", &["google", "corp"])];
    let mut claims = claims_for("corp", json!({"email": "corp@example.com"}));
    claims.extend(claims_for("google", json!({"email": "alice@example.com"})));

    let values = parse_params(&params, &Map::new(), &claims).unwrap();
    assert_eq!(values.0[0].value, json!("alice@example.com"));
}

#[test]
fn claim_param_in_argument_map_is_rejected() {
    let params = vec![claim_param("email", &["google"])];
    let claims = claims_for("google", json!({"email": "alice@example.com"}));
    let err =
        parse_params(&params, &args(json!({"email": "spoof"})), &claims).unwrap_err();
    assert!(matches!(err, ParamError::Invalid(_)), "unexpected error: {err}");
}

#[test]
fn claim_param_without_verified_service_is_unauthorized() {
    let params = vec![claim_param("email", &["google"])];
    let err = parse_params(&params, &Map::new(), &ClaimsMap::new()).unwrap_err();
    assert!(matches!(err, ParamError::Unauthorized { .. }), "unexpected error: {err}");
}

// ============================================================================
// SECTION: Manifest Tests
// ============================================================================

#[test]
fn mcp_schema_omits_claim_sourced_parameters() {
    let params = vec![Parameter::string("q", "a query"), claim_param("email", &["google"])];
    let (all, manifest, schema) = process_parameters(&params, &[]);
    assert_eq!(all.len(), 2);
    assert_eq!(manifest.len(), 2);
    assert!(schema.properties.contains_key("q"));
    assert!(!schema.properties.contains_key("email"));
    assert_eq!(schema.required, ["q"]);
}

#[test]
fn template_parameters_follow_bind_parameters_in_the_merged_list() {
    let binds = vec![int_param("id")];
    let templates = vec![Parameter::string("tableName", "table to query")];
    let (all, _, schema) = process_parameters(&binds, &templates);
    let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["id", "tableName"]);
    assert!(schema.properties.contains_key("tableName"));
}

#[test]
fn array_declaration_requires_items() {
    let param = Parameter {
        param_type: ParameterType::Array,
        ..Parameter::string("ids", "identifiers")
    };
    assert!(param.validate_declaration().is_err());
}

#[test]
fn claim_sourced_parameter_is_never_required_of_the_caller() {
    let param = claim_param("email", &["google"]);
    assert!(!param.is_required());

    let (_, manifest, schema) = process_parameters(&[param], &[]);
    assert!(!manifest[0].required);
    assert!(schema.required.is_empty());
}

#[test]
fn claim_sourced_declaration_rejects_explicit_required() {
    let param = Parameter {
        required: Some(true),
        ..claim_param("email", &["google"])
    };
    let err = param.validate_declaration().unwrap_err();
    assert!(
        err.to_string().contains("may not be required of the caller"),
        "unexpected error: {err}"
    );

    let optional = Parameter {
        required: Some(false),
        ..claim_param("email", &["google"])
    };
    assert!(optional.validate_declaration().is_ok());
}

#[test]
fn claim_sourced_declaration_rejects_defaults() {
    let param = Parameter {
        default: Some(json!("fallback")),
        ..claim_param("email", &["google"])
    };
    assert!(param.validate_declaration().is_err());
}
