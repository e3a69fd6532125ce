// toolgate-config/src/config.rs
// ============================================================================
// Module: Configuration Loader
// Description: Strict YAML decoding and factory-driven wiring.
// Purpose: Validate the document and initialize the runtime catalog.
// Dependencies: toolgate-core, serde, serde_yaml
// ============================================================================

//! ## Overview
//! The document carries four top-level maps keyed by user-chosen names:
//! `sources`, `authServices`, `tools`, and `toolsets`. Each entry's `kind`
//! selects a registered factory, which decodes the entry strictly. Syntax
//! errors carry the parser's line/column; entry-level failures name the
//! entry path so an operator can find the mistake without guessing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use toolgate_core::AuthService;
use toolgate_core::Registry;
use toolgate_core::Source;
use toolgate_core::Tool;
use toolgate_core::Toolset;
use toolgate_core::ToolsetError;
use tracing::info;

/// Maximum configuration document size in bytes.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading failures. All abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be read.
    #[error("unable to read config: {0}")]
    Io(String),
    /// The document is not valid YAML or violates the top-level schema.
    #[error("unable to parse config: {0}")]
    Parse(String),
    /// One entry failed decoding or validation.
    #[error("{path}: {message}")]
    Entry {
        /// Dotted path of the failing entry, e.g. `tools.my-tool`.
        path: String,
        /// Failure detail.
        message: String,
    },
    /// A source failed to initialize.
    #[error("unable to initialize source {name:?}: {message}")]
    Source {
        /// Source entry name.
        name: String,
        /// Failure detail.
        message: String,
    },
    /// A tool failed to bind to its source.
    #[error("unable to initialize tool {name:?}: {message}")]
    Tool {
        /// Tool entry name.
        name: String,
        /// Failure detail.
        message: String,
    },
    /// An auth service failed to initialize.
    #[error("unable to initialize auth service {name:?}: {message}")]
    AuthService {
        /// Auth-service entry name.
        name: String,
        /// Failure detail.
        message: String,
    },
    /// A toolset references missing or duplicate tools.
    #[error(transparent)]
    Toolset(#[from] ToolsetError),
}

// ============================================================================
// SECTION: Document
// ============================================================================

/// Decoded configuration document before factory dispatch.
///
/// Entries stay as raw YAML values; kind-specific decoding happens inside
/// the registered factories so unknown kinds can be reported with their
/// entry path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ToolsFile {
    /// Source entries keyed by name.
    #[serde(default)]
    pub sources: BTreeMap<String, serde_yaml::Value>,
    /// Auth-service entries keyed by name.
    #[serde(default)]
    pub auth_services: BTreeMap<String, serde_yaml::Value>,
    /// Tool entries keyed by name.
    #[serde(default)]
    pub tools: BTreeMap<String, serde_yaml::Value>,
    /// Toolset entries keyed by name.
    #[serde(default)]
    pub toolsets: BTreeMap<String, Vec<String>>,
}

impl ToolsFile {
    /// Parses a document, rejecting unknown top-level fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] with the parser's location on
    /// failure.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))
    }
}

/// Reads the `kind` discriminator from a raw entry.
fn entry_kind(section: &str, name: &str, entry: &serde_yaml::Value) -> Result<String, ConfigError> {
    entry
        .as_mapping()
        .and_then(|mapping| mapping.get("kind"))
        .and_then(serde_yaml::Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ConfigError::Entry {
            path: format!("{section}.{name}"),
            message: "missing required field `kind`".to_string(),
        })
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Initialized runtime catalog: everything the dispatch pipeline serves.
#[derive(Debug)]
pub struct Gateway {
    /// Initialized sources keyed by name.
    pub sources: BTreeMap<String, Arc<dyn Source>>,
    /// Initialized auth services in name order.
    pub auth_services: Vec<Arc<dyn AuthService>>,
    /// Initialized tools keyed by name.
    pub tools: BTreeMap<String, Arc<dyn Tool>>,
    /// Toolsets keyed by name; the empty name holds every tool.
    pub toolsets: BTreeMap<String, Toolset>,
}

/// Loads and wires a configuration document from disk.
///
/// # Errors
///
/// Returns [`ConfigError`] when reading, decoding, or wiring fails.
pub async fn load_file(path: &Path, registry: &Registry) -> Result<Gateway, ConfigError> {
    let metadata = std::fs::metadata(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Io("config file exceeds size limit".to_string()));
    }
    let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    load_str(&text, registry).await
}

/// Loads and wires a configuration document from a string.
///
/// # Errors
///
/// Returns [`ConfigError`] when decoding or wiring fails.
pub async fn load_str(text: &str, registry: &Registry) -> Result<Gateway, ConfigError> {
    let file = ToolsFile::parse(text)?;

    let mut sources: BTreeMap<String, Arc<dyn Source>> = BTreeMap::new();
    for (name, entry) in &file.sources {
        let kind = entry_kind("sources", name, entry)?;
        let factory =
            registry.source_factory(&kind).map_err(|err| ConfigError::Entry {
                path: format!("sources.{name}"),
                message: err.to_string(),
            })?;
        let config = factory(name, entry).map_err(|err| ConfigError::Entry {
            path: format!("sources.{name}"),
            message: err.to_string(),
        })?;
        let source = config.initialize().await.map_err(|err| ConfigError::Source {
            name: name.clone(),
            message: err.to_string(),
        })?;
        info!(source = %name, kind = %kind, "initialized source");
        sources.insert(name.clone(), source);
    }

    let mut auth_services: Vec<Arc<dyn AuthService>> = Vec::new();
    for (name, entry) in &file.auth_services {
        let kind = entry_kind("authServices", name, entry)?;
        let factory =
            registry.auth_service_factory(&kind).map_err(|err| ConfigError::Entry {
                path: format!("authServices.{name}"),
                message: err.to_string(),
            })?;
        let config = factory(name, entry).map_err(|err| ConfigError::Entry {
            path: format!("authServices.{name}"),
            message: err.to_string(),
        })?;
        let service = config.initialize().map_err(|err| ConfigError::AuthService {
            name: name.clone(),
            message: err.to_string(),
        })?;
        info!(auth_service = %name, kind = %kind, "initialized auth service");
        auth_services.push(service);
    }

    let mut tools: BTreeMap<String, Arc<dyn Tool>> = BTreeMap::new();
    for (name, entry) in &file.tools {
        let kind = entry_kind("tools", name, entry)?;
        let factory = registry.tool_factory(&kind).map_err(|err| ConfigError::Entry {
            path: format!("tools.{name}"),
            message: err.to_string(),
        })?;
        let config = factory(name, entry).map_err(|err| ConfigError::Entry {
            path: format!("tools.{name}"),
            message: err.to_string(),
        })?;
        let tool = config.initialize(&sources).map_err(|err| ConfigError::Tool {
            name: name.clone(),
            message: err.to_string(),
        })?;
        tools.insert(name.clone(), tool);
    }

    let mut toolsets: BTreeMap<String, Toolset> = BTreeMap::new();
    for (name, members) in &file.toolsets {
        let toolset = Toolset::new(name.clone(), members.clone(), &tools)?;
        toolsets.insert(name.clone(), toolset);
    }
    // The default toolset exposes every tool, sorted by name.
    let all_names: Vec<String> = tools.keys().cloned().collect();
    let default_toolset = Toolset::new(String::new(), all_names, &tools)?;
    toolsets.insert(String::new(), default_toolset);

    info!(
        sources = sources.len(),
        tools = tools.len(),
        toolsets = toolsets.len(),
        "configuration loaded"
    );

    Ok(Gateway {
        sources,
        auth_services,
        tools,
        toolsets,
    })
}
