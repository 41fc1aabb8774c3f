//! Replident - MySQL/MariaDB Replication Identity
//!
//! Derives a stable, host-unique replication `server-id` from the host's MAC
//! address and exposes it alongside a small set of host inventory facts, so
//! configuration tooling for MySQL/MariaDB replication fleets can assign ids
//! without central coordination.
//!
//! # Architecture
//!
//! The derivation itself is a pure function in [`identity`]: MAC address in,
//! `server-id` out, identical on every run and host. Around it sits a typed
//! fact registry ([`facts`]) where each fact has a typed name and payload and
//! an explicit undetectable state; facts resolve once per evaluation pass and
//! are cached only for that pass. The optional HTTP agent ([`api`]) serves
//! the same facts to fleet tooling.
//!
//! # Features
//!
//! - Deterministic server-id derivation with defined fallbacks for missing
//!   and all-zero MAC addresses
//! - Typed fact registry with per-pass caching and explicit fact dependencies
//! - Built-in facts: `hostname`, `macaddress`, `mysql_server_id`,
//!   `mysqld_version`
//! - CLI for one-shot evaluation and a read-only HTTP API for agents

pub mod api;
pub mod config;
pub mod error;
pub mod facts;
pub mod identity;

pub use config::ReplidentConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::ReplidentConfig;
    pub use crate::error::{Error, Result};
    pub use crate::facts::{FactName, FactRegistry, FactSnapshot, Resolution};
    pub use crate::identity::{derive_server_id, MacAddress, ServerId};
}
