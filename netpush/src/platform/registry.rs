//! Static dialect registry.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::definition::Dialect;
use super::vendors;
use crate::error::{DialectError, Result};

/// Supported device kinds.
///
/// Deserializes through [`FromStr`], so inventory records accept the same
/// spellings as [`DialectRegistry::resolve`] and reject the same ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum DialectKind {
    CiscoIos,
    CiscoXe,
    CiscoNxos,
    Huawei,
    #[serde(rename = "huawei_vrpv8")]
    HuaweiVrpV8,
}

/// Vendor family of a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Commands apply immediately.
    Cisco,
    /// Commands are staged, then committed and saved.
    Huawei,
}

impl DialectKind {
    /// Every supported kind.
    pub const ALL: [DialectKind; 5] = [
        DialectKind::CiscoIos,
        DialectKind::CiscoXe,
        DialectKind::CiscoNxos,
        DialectKind::Huawei,
        DialectKind::HuaweiVrpV8,
    ];

    /// Canonical tag, as recorded in device inventory.
    pub fn tag(self) -> &'static str {
        match self {
            DialectKind::CiscoIos => "cisco_ios",
            DialectKind::CiscoXe => "cisco_xe",
            DialectKind::CiscoNxos => "cisco_nxos",
            DialectKind::Huawei => "huawei",
            DialectKind::HuaweiVrpV8 => "huawei_vrpv8",
        }
    }

    /// Vendor family.
    pub fn family(self) -> Family {
        match self {
            DialectKind::CiscoIos | DialectKind::CiscoXe | DialectKind::CiscoNxos => Family::Cisco,
            DialectKind::Huawei | DialectKind::HuaweiVrpV8 => Family::Huawei,
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DialectKind {
    type Err = DialectError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        DialectKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == normalized)
            .ok_or_else(|| DialectError::UnknownDialect { tag: s.to_string() })
    }
}

impl TryFrom<String> for DialectKind {
    type Error = DialectError;

    fn try_from(tag: String) -> std::result::Result<Self, Self::Error> {
        tag.parse()
    }
}

static REGISTRY: Lazy<DialectRegistry> = Lazy::new(DialectRegistry::builtin);

/// Registry mapping each [`DialectKind`] to its [`Dialect`].
///
/// Built once, never mutated; lookups need no locking.
#[derive(Debug)]
pub struct DialectRegistry {
    /// Indexed by `DialectKind as usize`.
    dialects: [Dialect; 5],
}

impl DialectRegistry {
    fn builtin() -> Self {
        Self {
            dialects: [
                vendors::cisco::ios(),
                vendors::cisco::xe(),
                vendors::cisco::nxos(),
                vendors::huawei::vrp(),
                vendors::huawei::vrp_v8(),
            ],
        }
    }

    /// Get the global registry.
    pub fn global() -> &'static DialectRegistry {
        &REGISTRY
    }

    /// Rules for a known kind.
    pub fn lookup(kind: DialectKind) -> &'static Dialect {
        &Self::global().dialects[kind as usize]
    }

    /// Resolve a recorded device kind tag.
    ///
    /// Unknown tags are a configuration error and are never retried.
    pub fn resolve(tag: &str) -> Result<&'static Dialect> {
        let kind: DialectKind = tag.parse()?;
        Ok(Self::lookup(kind))
    }

    /// All registered dialects.
    pub fn dialects(&self) -> impl Iterator<Item = &Dialect> {
        self.dialects.iter()
    }
}
