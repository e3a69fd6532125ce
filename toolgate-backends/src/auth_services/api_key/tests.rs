#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use http::HeaderValue;
use serde_json::json;

use super::*;

fn service() -> Arc<dyn AuthService> {
    let entry: serde_yaml::Value = serde_yaml::from_str(
        r"
        kind: api-key
        keys:
          - key: supersecret
            claims:
              email: alice@example.com
              sub: alice
        ",
    )
    .unwrap();
    let config = configure("google", &entry).unwrap();
    config.initialize().unwrap()
}

#[tokio::test]
async fn known_key_produces_configured_claims() {
    let service = service();
    let mut headers = HeaderMap::new();
    headers.insert("google_token", HeaderValue::from_static("supersecret"));
    let claims = service.verify(&headers).await.unwrap().unwrap();
    assert_eq!(claims.get("email"), Some(&json!("alice@example.com")));
}

#[tokio::test]
async fn absent_header_is_none_not_an_error() {
    let service = service();
    let headers = HeaderMap::new();
    assert!(service.verify(&headers).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_key_fails_verification() {
    let service = service();
    let mut headers = HeaderMap::new();
    headers.insert("google_token", HeaderValue::from_static("wrong"));
    assert!(service.verify(&headers).await.is_err());
}

#[test]
fn empty_key_list_fails_initialization() {
    let entry: serde_yaml::Value = serde_yaml::from_str("kind: api-key\nkeys: []").unwrap();
    let config = configure("corp", &entry).unwrap();
    assert!(config.initialize().is_err());
}

#[test]
fn unknown_fields_are_rejected() {
    let entry: serde_yaml::Value =
        serde_yaml::from_str("kind: api-key\nkeys: []\nextra: nope").unwrap();
    assert!(configure("corp", &entry).is_err());
}
