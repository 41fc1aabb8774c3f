//! Host identity and server-id derivation
//!
//! Derives a stable MySQL/MariaDB replication `server-id` from the host's
//! primary MAC address, so every host in a replication topology ends up with
//! a unique id without any coordination.
//!
//! Derivation:
//! - MAC undetectable: no id (rendered as the empty string downstream)
//! - `00:00:00:00:00:00` (loopback-only host): fixed fallback id 1
//! - otherwise: the 48-bit MAC value reduced modulo 2^31 - 1, plus one
//!
//! The derivation is a pure function: `3c:97:0e:69:fb:e1` derives 241857808
//! on every host, every run.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Reduction modulus for MAC-derived ids; derived ids fall in 1..=2^31-1
const SERVER_ID_MODULUS: u64 = (1 << 31) - 1;

/// A six-octet hardware (MAC) address
///
/// Parsed strictly from the conventional colon-separated form, e.g.
/// `3c:97:0e:69:fb:e1`. Hex digits may be upper or lower case; anything
/// else (wrong group count, separators other than `:`, non-hex digits)
/// is a `MalformedMac` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Create from raw octets
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Get the raw octets
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// All-zero address, as reported by loopback-only hosts with no real NIC
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }

    /// The address read as a 48-bit big-endian integer
    ///
    /// Equivalent to stripping the colons and parsing the remaining twelve
    /// hex digits as one base-16 number.
    pub fn value(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, &octet| (acc << 8) | u64::from(octet))
    }
}

impl std::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl std::str::FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedMac {
            mac: s.to_string(),
            reason,
        };

        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(malformed(format!(
                "expected 6 colon-separated octets, found {}",
                parts.len()
            )));
        }

        let mut octets = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            // from_str_radix alone is too lenient here (it accepts a sign)
            if part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(malformed(format!("octet {:?} is not two hex digits", part)));
            }
            octets[i] = u8::from_str_radix(part, 16)
                .map_err(|_| malformed(format!("octet {:?} is not two hex digits", part)))?;
        }

        Ok(Self(octets))
    }
}

impl Serialize for MacAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// MySQL `server-id` wrapper type
///
/// MySQL accepts any unsigned 32-bit value for the `server-id` directive;
/// derived ids only ever occupy 1..=2^31-1 (0 means "replication disabled"
/// and is never produced).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerId(pub u32);

impl ServerId {
    /// Fixed id assigned to hosts reporting the all-zero MAC
    pub const FALLBACK: ServerId = ServerId(1);

    /// Get the raw u32 value
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ServerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ServerId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<ServerId> for u32 {
    fn from(id: ServerId) -> Self {
        id.0
    }
}

/// Server-id for a known MAC address
///
/// The all-zero address maps to [`ServerId::FALLBACK`]; every other address
/// maps to its 48-bit value modulo 2^31 - 1, plus one. Distinct addresses
/// almost always derive distinct ids, but the reduction from 48 bits into
/// 2^31 - 1 buckets makes collisions structurally possible (for example
/// `00:00:7f:ff:ff:ff` also derives 1).
pub fn server_id_for(mac: &MacAddress) -> ServerId {
    if mac.is_zero() {
        return ServerId::FALLBACK;
    }
    ServerId((mac.value() % SERVER_ID_MODULUS + 1) as u32)
}

/// Derive the replication server-id for a host
///
/// `None` means the host's MAC could not be detected; no id is derived and
/// the caller must treat the identity as unknown, never as id 0.
pub fn derive_server_id(mac: Option<&MacAddress>) -> Option<ServerId> {
    mac.map(server_id_for)
}

/// Derive the server-id from an optional MAC string, rendered as decimal text
///
/// Undetected input renders as the empty string. A present but unparseable
/// MAC is a loud [`Error::MalformedMac`], never a silent fallback.
pub fn derive_server_id_str(mac: Option<&str>) -> Result<String> {
    match mac {
        None => Ok(String::new()),
        Some(s) => {
            let mac: MacAddress = s.parse()?;
            Ok(server_id_for(&mac).to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn test_reference_mac_derives_documented_id() {
        let mac: MacAddress = "3c:97:0e:69:fb:e1".parse().unwrap();
        assert_eq!(server_id_for(&mac), ServerId(241857808));
        assert_eq!(
            derive_server_id_str(Some("3c:97:0e:69:fb:e1")).unwrap(),
            "241857808"
        );
    }

    #[test]
    fn test_zero_mac_falls_back_to_one() {
        let mac: MacAddress = "00:00:00:00:00:00".parse().unwrap();
        assert!(mac.is_zero());
        assert_eq!(server_id_for(&mac), ServerId::FALLBACK);
        assert_eq!(
            derive_server_id_str(Some("00:00:00:00:00:00")).unwrap(),
            "1"
        );
    }

    #[test]
    fn test_missing_mac_renders_empty() {
        assert_eq!(derive_server_id(None), None);
        assert_eq!(derive_server_id_str(None).unwrap(), "");
    }

    #[test]
    fn test_known_vectors() {
        let vectors = [
            ("ff:ff:ff:ff:ff:ff", 131072),
            ("aa:bb:cc:dd:ee:ff", 1289700471),
            ("00:00:00:00:00:01", 2),
            ("52:54:00:12:34:56", 1235199),
            ("08:00:27:bd:2f:50", 666713937),
        ];
        for (mac, expected) in vectors {
            assert_eq!(
                derive_server_id_str(Some(mac)).unwrap(),
                expected.to_string(),
                "vector {mac}"
            );
        }
    }

    #[test]
    fn test_uppercase_parses_identically() {
        let lower: MacAddress = "3c:97:0e:69:fb:e1".parse().unwrap();
        let upper: MacAddress = "3C:97:0E:69:FB:E1".parse().unwrap();
        assert_eq!(lower, upper);
        assert_eq!(server_id_for(&lower), server_id_for(&upper));
        // Display is always lowercase regardless of input case
        assert_eq!(upper.to_string(), "3c:97:0e:69:fb:e1");
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let mac: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(server_id_for(&mac), server_id_for(&mac));
        assert_eq!(
            derive_server_id_str(Some("aa:bb:cc:dd:ee:ff")).unwrap(),
            derive_server_id_str(Some("aa:bb:cc:dd:ee:ff")).unwrap()
        );
    }

    #[test]
    fn test_malformed_inputs_error() {
        let bad = [
            "",
            "3c:97:0e:69:fb",
            "3c:97:0e:69:fb:e1:aa",
            "3c-97-0e-69-fb-e1",
            "3c970e69fbe1",
            "zz:97:0e:69:fb:e1",
            "3c:97:0e:69:fb:e",
            "3c:97:0e:69:fb:e1 ",
            "+c:97:0e:69:fb:e1",
        ];
        for input in bad {
            let err = derive_server_id_str(Some(input)).unwrap_err();
            assert!(
                matches!(err, Error::MalformedMac { .. }),
                "input {input:?} should be rejected as malformed, got {err}"
            );
        }
    }

    #[test]
    fn test_value_is_48_bit_reading() {
        let mac = MacAddress::new([0x3c, 0x97, 0x0e, 0x69, 0xfb, 0xe1]);
        assert_eq!(mac.value(), 0x3c970e69fbe1);
        assert_eq!(mac.to_string(), "3c:97:0e:69:fb:e1");
    }

    #[test]
    fn test_modulus_boundary_collides_with_fallback() {
        // 0x7fffffff is exactly the modulus, so this address reduces to 0
        // and derives the same id as the zero-MAC fallback. Collisions of
        // this kind are accepted.
        let mac: MacAddress = "00:00:7f:ff:ff:ff".parse().unwrap();
        assert_eq!(server_id_for(&mac), ServerId::FALLBACK);
    }

    #[test]
    fn test_random_macs_derive_distinct_ids() {
        let mut rng = StdRng::seed_from_u64(0x3c970e69fbe1);
        let mut macs = HashSet::new();
        while macs.len() < 128 {
            let octets: [u8; 6] = rng.gen();
            let mac = MacAddress::new(octets);
            if !mac.is_zero() {
                macs.insert(mac);
            }
        }

        let ids: HashSet<ServerId> = macs.iter().map(server_id_for).collect();
        assert_eq!(ids.len(), macs.len());
    }

    #[test]
    fn test_ids_stay_in_directive_range() {
        let mut rng = StdRng::seed_from_u64(7654);
        for _ in 0..1000 {
            let mac = MacAddress::new(rng.gen());
            let id = server_id_for(&mac).as_u32();
            assert!(id >= 1);
            assert!(u64::from(id) <= SERVER_ID_MODULUS);
        }
    }
}
