//! Built-in Fact Providers
//!
//! The standard set a host agent needs: network identity, hostname, the
//! local mysqld version, and the derived replication server-id. Providers
//! that cannot determine their fact on a given host resolve as
//! `Undetectable` rather than erroring.

use std::process::Command;

use tracing::{debug, warn};

use crate::error::Result;
use crate::facts::registry::{Evaluation, FactProvider};
use crate::facts::{FactName, FactValue, Resolution};
use crate::identity::{server_id_for, MacAddress};

// ============================================================================
// Network Identity
// ============================================================================

/// `macaddress` — the primary NIC's hardware address
///
/// Asks the OS for the first non-loopback interface, or for the interface
/// named in `[facts] interface` when one is configured.
pub struct SystemMacProvider {
    interface: Option<String>,
}

impl SystemMacProvider {
    pub fn new(interface: Option<String>) -> Self {
        Self { interface }
    }

    fn discover(&self) -> Option<MacAddress> {
        let found = match &self.interface {
            Some(name) => mac_address::mac_address_by_name(name),
            None => mac_address::get_mac_address(),
        };
        match found {
            Ok(Some(mac)) => Some(MacAddress::new(mac.bytes())),
            Ok(None) => None,
            Err(err) => {
                warn!("MAC address discovery failed: {}", err);
                None
            }
        }
    }
}

impl FactProvider for SystemMacProvider {
    fn name(&self) -> FactName {
        FactName::MacAddress
    }

    fn resolve(&self, _eval: &mut Evaluation<'_>) -> Result<Resolution> {
        Ok(match self.discover() {
            Some(mac) => Resolution::Resolved(FactValue::Mac(mac)),
            None => Resolution::Undetectable,
        })
    }
}

/// `macaddress` — a fixed, injected address
///
/// Registered over the system provider to pin the fact for tests and
/// `--mac` runs; carrying `None` pins it to undetectable.
pub struct FixedMacProvider {
    mac: Option<MacAddress>,
}

impl FixedMacProvider {
    pub fn new(mac: Option<MacAddress>) -> Self {
        Self { mac }
    }
}

impl FactProvider for FixedMacProvider {
    fn name(&self) -> FactName {
        FactName::MacAddress
    }

    fn resolve(&self, _eval: &mut Evaluation<'_>) -> Result<Resolution> {
        Ok(match self.mac {
            Some(mac) => Resolution::Resolved(FactValue::Mac(mac)),
            None => Resolution::Undetectable,
        })
    }
}

// ============================================================================
// Host Introspection
// ============================================================================

/// `hostname` — the host's name as reported by the OS
pub struct HostnameProvider;

impl FactProvider for HostnameProvider {
    fn name(&self) -> FactName {
        FactName::Hostname
    }

    fn resolve(&self, _eval: &mut Evaluation<'_>) -> Result<Resolution> {
        Ok(match sysinfo::System::host_name() {
            Some(name) if !name.is_empty() => Resolution::Resolved(FactValue::Text(name)),
            _ => Resolution::Undetectable,
        })
    }
}

/// `mysqld_version` — version reported by the local mysqld binary
///
/// Runs `<mysqld_path> --no-defaults --version` and extracts the token after
/// `Ver`, e.g. `10.11.6-MariaDB-1` out of
/// `/usr/sbin/mariadbd Ver 10.11.6-MariaDB-1 for debian-linux-gnu ...`.
pub struct MysqldVersionProvider {
    mysqld_path: String,
}

impl MysqldVersionProvider {
    pub fn new(mysqld_path: String) -> Self {
        Self { mysqld_path }
    }
}

impl FactProvider for MysqldVersionProvider {
    fn name(&self) -> FactName {
        FactName::MysqldVersion
    }

    fn resolve(&self, _eval: &mut Evaluation<'_>) -> Result<Resolution> {
        let output = match Command::new(&self.mysqld_path)
            .args(["--no-defaults", "--version"])
            .output()
        {
            Ok(output) => output,
            Err(err) => {
                debug!("mysqld not probeable at {:?}: {}", self.mysqld_path, err);
                return Ok(Resolution::Undetectable);
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(match parse_mysqld_version(&stdout) {
            Some(version) => Resolution::Resolved(FactValue::Text(version)),
            None => Resolution::Undetectable,
        })
    }
}

/// Extract the version token from `mysqld --version` output
pub fn parse_mysqld_version(output: &str) -> Option<String> {
    let mut tokens = output.split_whitespace();
    tokens.by_ref().find(|token| *token == "Ver")?;
    tokens.next().map(str::to_string)
}

// ============================================================================
// Derived Identity
// ============================================================================

/// `mysql_server_id` — replication server-id derived from the MAC fact
///
/// Depends on `macaddress` through the evaluation pass, so an injected MAC
/// flows into the derived id and the MAC provider still runs only once per
/// pass.
pub struct ServerIdProvider;

impl FactProvider for ServerIdProvider {
    fn name(&self) -> FactName {
        FactName::MysqlServerId
    }

    fn resolve(&self, eval: &mut Evaluation<'_>) -> Result<Resolution> {
        let mac = eval.resolve(FactName::MacAddress)?;
        Ok(match mac.as_mac() {
            Some(mac) => Resolution::Resolved(FactValue::ServerId(server_id_for(mac))),
            None => Resolution::Undetectable,
        })
    }
}
