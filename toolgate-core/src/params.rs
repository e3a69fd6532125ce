// toolgate-core/src/params.rs
// ============================================================================
// Module: Parameter Model
// Description: Declared parameter descriptors and argument coercion.
// Purpose: Turn raw JSON argument maps into typed, ordered value lists.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Tools declare their inputs as [`Parameter`] descriptors. At invocation
//! time [`parse_params`] consumes the caller's decoded argument map and the
//! verified claims collected for the request, producing an ordered
//! [`ParamValues`] list that preserves declaration order for positional
//! drivers. Field-level validation errors are batched so a model-driven
//! caller sees every problem at once. Numeric fidelity is preserved by
//! validating [`serde_json::Number`] tokens directly; integer and float
//! tokens are never round-tripped through a common float type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use thiserror::Error;

use crate::auth::ClaimsMap;
use crate::manifest::McpPropertySchema;
use crate::manifest::McpToolsSchema;
use crate::manifest::ParameterManifest;

// ============================================================================
// SECTION: Parameter Types
// ============================================================================

/// Declared kind of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// JSON string.
    String,
    /// JSON number with no fractional part.
    Integer,
    /// JSON number, integers widened.
    Float,
    /// JSON boolean.
    Boolean,
    /// JSON array validated against an item schema.
    Array,
    /// JSON object, optionally closed over a declared subschema.
    Object,
}

impl ParameterType {
    /// JSON-Schema type label for manifests.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Element schema for array parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemSchema {
    /// Element kind.
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    /// Element description.
    #[serde(default)]
    pub description: String,
    /// Nested element schema for arrays of arrays.
    #[serde(default)]
    pub items: Option<Box<ItemSchema>>,
}

/// Declared input slot on a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Parameter {
    /// Parameter name, unique within a tool.
    pub name: String,
    /// Declared kind.
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    /// Human/agent description.
    pub description: String,
    /// Whether the caller must supply a value. Defaults to true unless a
    /// default is declared.
    #[serde(default)]
    pub required: Option<bool>,
    /// Default applied when the caller omits the parameter.
    #[serde(default)]
    pub default: Option<Value>,
    /// Element schema, required for array parameters.
    #[serde(default)]
    pub items: Option<Box<ItemSchema>>,
    /// Auth services permitted to supply this value from verified claims.
    #[serde(default)]
    pub auth_sources: Vec<String>,
    /// Declared subschema for object parameters.
    #[serde(default)]
    pub properties: Option<Vec<Parameter>>,
    /// Whether object values may carry keys outside the declared subschema.
    #[serde(default)]
    pub additional_properties: Option<bool>,
}

impl Parameter {
    /// Builds a required string parameter.
    #[must_use]
    pub fn string(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type: ParameterType::String,
            description: description.to_string(),
            required: None,
            default: None,
            items: None,
            auth_sources: Vec::new(),
            properties: None,
            additional_properties: None,
        }
    }

    /// Whether the caller must supply this parameter.
    ///
    /// Claim-sourced parameters are never required of the caller; their
    /// values come from verified claims.
    #[must_use]
    pub fn is_required(&self) -> bool {
        if self.is_claim_sourced() {
            return false;
        }
        self.required.unwrap_or(self.default.is_none())
    }

    /// Whether this parameter is sourced from verified claims.
    #[must_use]
    pub fn is_claim_sourced(&self) -> bool {
        !self.auth_sources.is_empty()
    }

    /// Validates the descriptor itself. Called once at configuration load.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::InvalidDeclaration`] when the descriptor is
    /// internally inconsistent.
    pub fn validate_declaration(&self) -> Result<(), ParamError> {
        if self.name.is_empty() {
            return Err(ParamError::InvalidDeclaration("parameter name must not be empty".into()));
        }
        if self.param_type == ParameterType::Array && self.items.is_none() {
            return Err(ParamError::InvalidDeclaration(format!(
                "array parameter {:?} must declare items",
                self.name
            )));
        }
        if self.is_claim_sourced() && self.default.is_some() {
            return Err(ParamError::InvalidDeclaration(format!(
                "parameter {:?} is claim-sourced and may not declare a default",
                self.name
            )));
        }
        if self.is_claim_sourced() && self.required == Some(true) {
            return Err(ParamError::InvalidDeclaration(format!(
                "parameter {:?} is claim-sourced and may not be required of the caller",
                self.name
            )));
        }
        Ok(())
    }

    /// Manifest entry for the HTTP catalog.
    #[must_use]
    pub fn manifest(&self) -> ParameterManifest {
        ParameterManifest {
            name: self.name.clone(),
            param_type: self.param_type.label(),
            description: self.description.clone(),
            required: self.is_required(),
            auth_sources: self.auth_sources.clone(),
            items: self.items.as_deref().map(item_property_schema),
            additional_properties: self.additional_properties,
        }
    }

    /// JSON-Schema property for the agent manifest.
    #[must_use]
    pub fn mcp_property(&self) -> McpPropertySchema {
        McpPropertySchema {
            param_type: self.param_type.label(),
            description: self.description.clone(),
            items: self.items.as_deref().map(item_property_schema),
            additional_properties: self.additional_properties,
        }
    }
}

fn item_property_schema(items: &ItemSchema) -> Box<McpPropertySchema> {
    Box::new(McpPropertySchema {
        param_type: items.param_type.label(),
        description: items.description.clone(),
        items: items.items.as_deref().map(item_property_schema),
        additional_properties: None,
    })
}

// ============================================================================
// SECTION: Parameter Values
// ============================================================================

/// A resolved `(name, value)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamValue {
    /// Declared parameter name.
    pub name: String,
    /// Coerced JSON value.
    pub value: Value,
}

/// Ordered list of resolved parameter values.
///
/// Order follows declaration order so positional drivers can bind directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamValues(pub Vec<ParamValue>);

impl ParamValues {
    /// Unordered map form, used for template substitution and named binds.
    #[must_use]
    pub fn as_map(&self) -> Map<String, Value> {
        self.0.iter().map(|p| (p.name.clone(), p.value.clone())).collect()
    }

    /// Number of resolved values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no values were resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ParamValue> {
        self.0.iter()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Parameter declaration and resolution errors.
#[derive(Debug, Error)]
pub enum ParamError {
    /// The descriptor itself is inconsistent (configuration-time).
    #[error("invalid parameter declaration: {0}")]
    InvalidDeclaration(String),
    /// One or more caller-supplied arguments failed validation.
    #[error("invalid parameters: {}", .0.join("; "))]
    Invalid(Vec<String>),
    /// A claim-sourced parameter could not be resolved from verified claims.
    #[error("missing claims for parameter {parameter:?}: one of the auth services {services:?} must verify the request")]
    Unauthorized {
        /// Parameter that required a claim.
        parameter: String,
        /// Auth services permitted to supply the claim.
        services: Vec<String>,
    },
}

// ============================================================================
// SECTION: Coercion
// ============================================================================

/// Validates and coerces one value against a declared kind.
fn check_value(
    name: &str,
    param_type: ParameterType,
    items: Option<&ItemSchema>,
    properties: Option<&[Parameter]>,
    additional_properties: Option<bool>,
    value: &Value,
) -> Result<Value, String> {
    match param_type {
        ParameterType::String => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(format!("parameter {name:?} must be a string")),
        },
        ParameterType::Integer => coerce_integer(name, value),
        ParameterType::Float => match value {
            Value::Number(n) => n
                .as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("parameter {name:?} is not a representable float")),
            _ => Err(format!("parameter {name:?} must be a number")),
        },
        ParameterType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(format!("parameter {name:?} must be a boolean")),
        },
        ParameterType::Array => {
            let Value::Array(elements) = value else {
                return Err(format!("parameter {name:?} must be an array"));
            };
            let Some(schema) = items else {
                return Err(format!("array parameter {name:?} has no item schema"));
            };
            let mut checked = Vec::with_capacity(elements.len());
            for (index, element) in elements.iter().enumerate() {
                let label = format!("{name}[{index}]");
                checked.push(check_value(
                    &label,
                    schema.param_type,
                    schema.items.as_deref(),
                    None,
                    None,
                    element,
                )?);
            }
            Ok(Value::Array(checked))
        }
        ParameterType::Object => {
            let Value::Object(fields) = value else {
                return Err(format!("parameter {name:?} must be an object"));
            };
            let declared = properties.unwrap_or(&[]);
            if additional_properties == Some(false) {
                for key in fields.keys() {
                    if !declared.iter().any(|p| p.name == *key) {
                        return Err(format!(
                            "parameter {name:?} does not accept the key {key:?}"
                        ));
                    }
                }
            }
            let mut checked = fields.clone();
            for property in declared {
                if let Some(field) = fields.get(&property.name) {
                    let label = format!("{name}.{}", property.name);
                    let coerced = check_value(
                        &label,
                        property.param_type,
                        property.items.as_deref(),
                        property.properties.as_deref(),
                        property.additional_properties,
                        field,
                    )?;
                    checked.insert(property.name.clone(), coerced);
                } else if property.is_required() {
                    return Err(format!(
                        "parameter {name:?} is missing the required key {:?}",
                        property.name
                    ));
                }
            }
            Ok(Value::Object(checked))
        }
    }
}

/// Coerces an integer token without losing numeric fidelity.
///
/// Integer tokens pass through unchanged. Float tokens with a zero
/// fractional part narrow to an integer; everything else is rejected.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "the zero-fraction range check precedes the narrowing cast"
)]
fn coerce_integer(name: &str, value: &Value) -> Result<Value, String> {
    match value {
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return Ok(value.clone());
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    // Zero-fraction float tokens narrow losslessly.
                    Ok(Value::Number(Number::from(f as i64)))
                }
                Some(_) => Err(format!("parameter {name:?} must not have a fractional part")),
                None => Err(format!("parameter {name:?} overflows the integer range")),
            }
        }
        Value::String(s) => s
            .parse::<i64>()
            .map(|i| Value::Number(Number::from(i)))
            .map_err(|_| format!("parameter {name:?} must be an integer")),
        _ => Err(format!("parameter {name:?} must be an integer")),
    }
}

// ============================================================================
// SECTION: Parse Flow
// ============================================================================

/// Resolves declared parameters against the caller's argument map and the
/// request's verified claims.
///
/// Client-sourced parameters are looked up in `data`, defaults applied, and
/// coerced per kind; all field-level failures are collected before
/// returning. Claim-sourced parameters must not appear in `data` and are
/// resolved from the first listed auth service that produced claims.
///
/// # Errors
///
/// Returns [`ParamError::Invalid`] for caller mistakes and
/// [`ParamError::Unauthorized`] when a claim-sourced parameter has no
/// matching verified service.
pub fn parse_params(
    parameters: &[Parameter],
    data: &Map<String, Value>,
    claims: &ClaimsMap,
) -> Result<ParamValues, ParamError> {
    let mut values = Vec::with_capacity(parameters.len());
    let mut errors = Vec::new();

    for parameter in parameters {
        if parameter.is_claim_sourced() {
            if data.contains_key(&parameter.name) {
                errors.push(format!(
                    "parameter {:?} is resolved from auth claims and must not be supplied",
                    parameter.name
                ));
                continue;
            }
            match resolve_claim_value(parameter, claims) {
                Some(value) => values.push(ParamValue {
                    name: parameter.name.clone(),
                    value,
                }),
                None => {
                    // Authorization-class failure: the caller presented no
                    // claims from any permitted service.
                    return Err(ParamError::Unauthorized {
                        parameter: parameter.name.clone(),
                        services: parameter.auth_sources.clone(),
                    });
                }
            }
            continue;
        }

        let raw = data.get(&parameter.name).cloned().or_else(|| parameter.default.clone());
        match raw {
            Some(value) => match check_value(
                &parameter.name,
                parameter.param_type,
                parameter.items.as_deref(),
                parameter.properties.as_deref(),
                parameter.additional_properties,
                &value,
            ) {
                Ok(coerced) => values.push(ParamValue {
                    name: parameter.name.clone(),
                    value: coerced,
                }),
                Err(message) => errors.push(message),
            },
            None if parameter.is_required() => {
                errors.push(format!("parameter {:?} is required", parameter.name));
            }
            None => {
                // Optional parameter with no default binds as null.
                values.push(ParamValue {
                    name: parameter.name.clone(),
                    value: Value::Null,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(ParamValues(values))
    } else {
        Err(ParamError::Invalid(errors))
    }
}

/// First-wins claim resolution in auth-source declaration order.
fn resolve_claim_value(parameter: &Parameter, claims: &ClaimsMap) -> Option<Value> {
    for service in &parameter.auth_sources {
        if let Some(service_claims) = claims.get(service) {
            if let Some(value) = service_claims.get(&parameter.name) {
                return Some(value.clone());
            }
        }
    }
    None
}

/// Extracts the ordered bind values for a subset of declared parameters.
///
/// Used by SQL-shaped tools after template substitution: template parameters
/// were consumed textually, so only bind parameters reach the driver.
///
/// # Errors
///
/// Returns [`ParamError::Invalid`] when a declared parameter is absent from
/// the resolved map.
pub fn bind_values(
    parameters: &[Parameter],
    resolved: &Map<String, Value>,
) -> Result<ParamValues, ParamError> {
    let mut values = Vec::with_capacity(parameters.len());
    let mut errors = Vec::new();
    for parameter in parameters {
        match resolved.get(&parameter.name) {
            Some(value) => values.push(ParamValue {
                name: parameter.name.clone(),
                value: value.clone(),
            }),
            None => errors.push(format!("parameter {:?} was not resolved", parameter.name)),
        }
    }
    if errors.is_empty() {
        Ok(ParamValues(values))
    } else {
        Err(ParamError::Invalid(errors))
    }
}

// ============================================================================
// SECTION: Manifest Assembly
// ============================================================================

/// Merges bind and template parameters into the declaration-order list used
/// for parsing, and precomputes both manifest surfaces.
///
/// Claim-sourced parameters are omitted from the agent schema: the caller
/// cannot and must not provide them.
#[must_use]
pub fn process_parameters(
    parameters: &[Parameter],
    template_parameters: &[Parameter],
) -> (Vec<Parameter>, Vec<ParameterManifest>, McpToolsSchema) {
    let all: Vec<Parameter> =
        parameters.iter().chain(template_parameters.iter()).cloned().collect();

    let manifest = all.iter().map(Parameter::manifest).collect();

    let mut properties = std::collections::BTreeMap::new();
    let mut required = Vec::new();
    for parameter in &all {
        if parameter.is_claim_sourced() {
            continue;
        }
        properties.insert(parameter.name.clone(), parameter.mcp_property());
        if parameter.is_required() {
            required.push(parameter.name.clone());
        }
    }
    let schema = McpToolsSchema {
        schema_type: "object",
        properties,
        required,
    };

    (all, manifest, schema)
}

#[cfg(test)]
mod tests;
