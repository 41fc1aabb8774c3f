//! Host Facts Module
//!
//! Typed registry of host facts: each fact has a typed name, a typed payload,
//! and a tagged resolution so "unknown" is an explicit state instead of a
//! magic empty string. Facts resolve once per evaluation pass and are cached
//! for that pass only; a fresh pass re-runs every provider.

pub mod providers;
pub mod registry;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::identity::{MacAddress, ServerId};

pub use providers::{
    FixedMacProvider, HostnameProvider, MysqldVersionProvider, ServerIdProvider,
    SystemMacProvider,
};
pub use registry::{Evaluation, FactProvider, FactRegistry};

// ============================================================================
// Fact Vocabulary
// ============================================================================

/// Names of the facts this crate can resolve
///
/// The wire and CLI spellings keep the classic fact names (`hostname`,
/// `macaddress`, `mysql_server_id`, `mysqld_version`) so downstream tooling
/// sees the vocabulary it already knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FactName {
    Hostname,
    MacAddress,
    MysqlServerId,
    MysqldVersion,
}

impl FactName {
    /// All known fact names, in render order
    pub const ALL: [FactName; 4] = [
        FactName::Hostname,
        FactName::MacAddress,
        FactName::MysqlServerId,
        FactName::MysqldVersion,
    ];

    /// The wire/CLI spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            FactName::Hostname => "hostname",
            FactName::MacAddress => "macaddress",
            FactName::MysqlServerId => "mysql_server_id",
            FactName::MysqldVersion => "mysqld_version",
        }
    }
}

impl std::fmt::Display for FactName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FactName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hostname" => Ok(FactName::Hostname),
            "macaddress" => Ok(FactName::MacAddress),
            "mysql_server_id" => Ok(FactName::MysqlServerId),
            "mysqld_version" => Ok(FactName::MysqldVersion),
            _ => Err(Error::UnknownFact(s.to_string())),
        }
    }
}

impl Serialize for FactName {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Typed payload of a resolved fact
///
/// Serializes untagged: text and MAC values as JSON strings, server ids as
/// JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FactValue {
    /// Free-form text (hostname, version strings)
    Text(String),
    /// A hardware address
    Mac(MacAddress),
    /// A derived replication server-id
    ServerId(ServerId),
}

impl std::fmt::Display for FactValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactValue::Text(text) => f.write_str(text),
            FactValue::Mac(mac) => write!(f, "{mac}"),
            FactValue::ServerId(id) => write!(f, "{id}"),
        }
    }
}

/// Outcome of resolving one fact
///
/// `Undetectable` means the provider ran and the host genuinely has no
/// answer (no NIC reporting a MAC, no mysqld binary on the path). It renders
/// as the empty string and serializes as JSON `null`; it is a defined state,
/// not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolution {
    Resolved(FactValue),
    Undetectable,
}

impl Resolution {
    /// Render to the classic string form
    ///
    /// Resolved values render as their display text, undetectable as the
    /// empty string ("unknown", never a zero id).
    pub fn render(&self) -> String {
        match self {
            Resolution::Resolved(value) => value.to_string(),
            Resolution::Undetectable => String::new(),
        }
    }

    /// The resolved value, if any
    pub fn value(&self) -> Option<&FactValue> {
        match self {
            Resolution::Resolved(value) => Some(value),
            Resolution::Undetectable => None,
        }
    }

    /// The resolved MAC address, if this resolution carries one
    pub fn as_mac(&self) -> Option<&MacAddress> {
        match self {
            Resolution::Resolved(FactValue::Mac(mac)) => Some(mac),
            _ => None,
        }
    }
}

/// Result of one full evaluation pass over a registry
#[derive(Debug, Clone, Serialize)]
pub struct FactSnapshot {
    /// When the pass ran
    pub evaluated_at: DateTime<Utc>,
    /// Every registered fact, in name order
    pub facts: BTreeMap<FactName, Resolution>,
}

impl FactSnapshot {
    /// Look up one fact's resolution
    pub fn get(&self, name: FactName) -> Option<&Resolution> {
        self.facts.get(&name)
    }
}
