//! Document payload stored with each SOW.
//!
//! The payload is free-form at the storage layer: any JSON object is accepted and
//! serialized back unchanged, nested keys and number types included. The server
//! only reads a handful of well-known paths (`project.title`, `pricing.total`,
//! `pricing.currency`) to render emails and filter the dashboard.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key some older forms used for the project title before `project.title`.
const LEGACY_PROJECT_NAME: &str = "projectName";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SowData(Map<String, Value>);

impl SowData {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    fn lookup(&self, section: &str, key: &str) -> Option<&Value> {
        self.0.get(section)?.get(key)
    }

    pub fn project_title(&self) -> Option<&str> {
        self.lookup("project", "title")?.as_str()
    }

    /// `project.title`, falling back to the legacy top-level `projectName`.
    pub fn display_title(&self) -> Option<&str> {
        self.project_title()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.0.get(LEGACY_PROJECT_NAME)?.as_str())
    }

    /// Total as text. Forms send it either as a string or as a number.
    pub fn pricing_total(&self) -> Option<String> {
        match self.lookup("pricing", "total")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn pricing_currency(&self) -> Option<&str> {
        self.lookup("pricing", "currency")?.as_str()
    }
}

impl From<Map<String, Value>> for SowData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
