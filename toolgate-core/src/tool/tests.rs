#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use super::*;

#[test]
fn empty_auth_required_authorizes_everyone() {
    assert!(is_authorized(&[], &[]));
    assert!(is_authorized(&[], &["google".to_string()]));
}

#[test]
fn any_listed_service_authorizes() {
    let required = vec!["google".to_string(), "corp".to_string()];
    assert!(is_authorized(&required, &["corp".to_string()]));
    assert!(!is_authorized(&required, &["other".to_string()]));
    assert!(!is_authorized(&required, &[]));
}

#[test]
fn bearer_token_parses_scheme_case_insensitively() {
    assert_eq!(AccessToken::new("Bearer abc").bearer(), Some("abc"));
    assert_eq!(AccessToken::new("bearer abc").bearer(), Some("abc"));
    assert_eq!(AccessToken::new("Basic abc").bearer(), None);
    assert_eq!(AccessToken::new("Bearer ").bearer(), None);
    assert_eq!(AccessToken::new("").bearer(), None);
    assert!(AccessToken::new("").is_empty());
}

#[test]
fn upstream_auth_classification_checks_typed_then_text() {
    let typed = InvokeError::UpstreamAuth {
        status: 401,
        message: "bad credentials".to_string(),
    };
    assert!(typed.is_upstream_auth());

    let textual = InvokeError::Failed("googleapi: Error 403: permission denied".to_string());
    assert!(textual.is_upstream_auth());

    let plain = InvokeError::Failed("syntax error at or near SELEC".to_string());
    assert!(!plain.is_upstream_auth());

    let unauthorized = InvokeError::Unauthorized("missing access token".to_string());
    assert!(!unauthorized.is_upstream_auth());
}
