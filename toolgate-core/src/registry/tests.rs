#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::*;
use crate::source::Source;
use crate::source::SourceError;
use crate::tool::Tool;
use crate::tool::ToolInitError;

struct FakeSourceConfig;

#[async_trait]
impl SourceConfig for FakeSourceConfig {
    fn kind(&self) -> &'static str {
        "fake"
    }

    async fn initialize(&self) -> Result<Arc<dyn Source>, SourceError> {
        Err(SourceError::Config("fake source never initializes".to_string()))
    }
}

struct FakeToolConfig;

impl ToolConfig for FakeToolConfig {
    fn kind(&self) -> &'static str {
        "fake-sql"
    }

    fn initialize(
        &self,
        _sources: &BTreeMap<String, Arc<dyn Source>>,
    ) -> Result<Arc<dyn Tool>, ToolInitError> {
        Err(ToolInitError::Invalid("fake tool never initializes".to_string()))
    }
}

fn fake_source_factory(
    _name: &str,
    _entry: &serde_yaml::Value,
) -> Result<Box<dyn SourceConfig>, DecodeError> {
    Ok(Box::new(FakeSourceConfig))
}

fn fake_tool_factory(
    _name: &str,
    _entry: &serde_yaml::Value,
) -> Result<Box<dyn ToolConfig>, DecodeError> {
    Ok(Box::new(FakeToolConfig))
}

#[test]
fn registered_kind_resolves_to_its_factory() {
    let mut registry = Registry::new();
    assert!(registry.register_source("fake", fake_source_factory));
    assert!(registry.register_tool("fake-sql", fake_tool_factory));

    let factory = registry.source_factory("fake").unwrap();
    let config = factory("s1", &serde_yaml::Value::Null).unwrap();
    assert_eq!(config.kind(), "fake");

    let factory = registry.tool_factory("fake-sql").unwrap();
    let config = factory("t1", &serde_yaml::Value::Null).unwrap();
    assert_eq!(config.kind(), "fake-sql");
}

#[test]
fn duplicate_registration_returns_false() {
    let mut registry = Registry::new();
    assert!(registry.register_source("fake", fake_source_factory));
    assert!(!registry.register_source("fake", fake_source_factory));
}

#[test]
fn unknown_kind_lookup_names_the_family_and_kind() {
    let registry = Registry::new();
    let err = registry.tool_factory("ghost-sql").unwrap_err();
    assert_eq!(err.to_string(), "unknown tool kind \"ghost-sql\"");
    let err = registry.source_factory("ghost").unwrap_err();
    assert_eq!(err.to_string(), "unknown source kind \"ghost\"");
}

#[test]
fn empty_registry_lists_no_kinds() {
    let registry = Registry::new();
    assert_eq!(registry.source_kinds().count(), 0);
    assert_eq!(registry.tool_kinds().count(), 0);
}
