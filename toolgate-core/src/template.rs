// toolgate-core/src/template.rs
// ============================================================================
// Module: Template Parameters
// Description: Restricted textual substitution into statement templates.
// Purpose: Splice identifiers into statements ahead of bind resolution.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Template parameters are spliced into the statement text before bind
//! parameters are resolved, so operators can parameterize table and column
//! names. The substitution grammar is deliberately restricted: a value must
//! be a single identifier token, or for `{{array .name}}` a list of
//! identifier tokens joined with commas. Free-text values are rejected
//! before any driver interaction; a failed substitution is a client error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::params::Parameter;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Template substitution failures. All are client errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template parameter has no resolved value.
    #[error("template parameter {0:?} was not resolved")]
    Missing(String),
    /// The resolved value has the wrong JSON kind for its placeholder.
    #[error("template parameter {name:?} must be {expected}")]
    WrongKind {
        /// Parameter name.
        name: String,
        /// Expected value shape.
        expected: &'static str,
    },
    /// A value is not a valid identifier token.
    #[error("template parameter {name:?} value {value:?} is not a valid identifier")]
    NotIdentifier {
        /// Parameter name.
        name: String,
        /// Offending value.
        value: String,
    },
}

// ============================================================================
// SECTION: Identifier Grammar
// ============================================================================

/// Whether a token matches the identifier grammar
/// `[A-Za-z_][A-Za-z0-9_.`-]*`.
#[must_use]
pub fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '`' | '-'))
}

// ============================================================================
// SECTION: Substitution
// ============================================================================

/// Substitutes declared template parameters into a statement template.
///
/// Supports `{{.name}}` for a single identifier and `{{array .name}}` for a
/// comma-joined identifier list. Substitution happens before bind-parameter
/// resolution; bind placeholders in the statement are untouched.
///
/// # Errors
///
/// Returns [`TemplateError`] when a value is missing, has the wrong kind,
/// or fails the identifier grammar.
pub fn resolve_template_params(
    template_params: &[Parameter],
    statement: &str,
    values: &Map<String, Value>,
) -> Result<String, TemplateError> {
    let mut resolved = statement.to_string();
    for parameter in template_params {
        let scalar_token = format!("{{{{.{}}}}}", parameter.name);
        let array_token = format!("{{{{array .{}}}}}", parameter.name);
        let needs_scalar = resolved.contains(&scalar_token);
        let needs_array = resolved.contains(&array_token);
        if !needs_scalar && !needs_array {
            continue;
        }

        let value = values
            .get(&parameter.name)
            .ok_or_else(|| TemplateError::Missing(parameter.name.clone()))?;

        if needs_array {
            let joined = identifier_list(&parameter.name, value)?;
            resolved = resolved.replace(&array_token, &joined);
        }
        if needs_scalar {
            let token = identifier(&parameter.name, value)?;
            resolved = resolved.replace(&scalar_token, token);
        }
    }
    Ok(resolved)
}

/// Validates a scalar placeholder value as one identifier token.
fn identifier<'a>(name: &str, value: &'a Value) -> Result<&'a str, TemplateError> {
    let Value::String(token) = value else {
        return Err(TemplateError::WrongKind {
            name: name.to_string(),
            expected: "a string identifier",
        });
    };
    if !is_identifier(token) {
        return Err(TemplateError::NotIdentifier {
            name: name.to_string(),
            value: token.clone(),
        });
    }
    Ok(token)
}

/// Validates an array placeholder value and joins its identifier tokens.
fn identifier_list(name: &str, value: &Value) -> Result<String, TemplateError> {
    let Value::Array(elements) = value else {
        return Err(TemplateError::WrongKind {
            name: name.to_string(),
            expected: "an array of string identifiers",
        });
    };
    let mut tokens = Vec::with_capacity(elements.len());
    for element in elements {
        tokens.push(identifier(name, element)?.to_string());
    }
    Ok(tokens.join(", "))
}
