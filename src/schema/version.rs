//! Supported Entity Framework schema versions.

use std::fmt;
use std::str::FromStr;

use crate::error::EdmxError;

/// A four-part version number (`major.minor.build.revision`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}

impl VersionNumber {
    pub const fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl FromStr for VersionNumber {
    type Err = EdmxError;

    /// Accepts one to four dot-separated components; missing ones are zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || EdmxError::UnsupportedVersion {
            version: s.to_string(),
        };
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.is_empty() || parts.len() > 4 {
            return Err(unsupported());
        }
        let mut numbers = [0u32; 4];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part.trim().parse().map_err(|_| unsupported())?;
        }
        Ok(VersionNumber::new(numbers[0], numbers[1], numbers[2], numbers[3]))
    }
}

/// The three schema versions the XML vocabularies exist in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityFrameworkVersion {
    V1,
    V2,
    V3,
}

impl EntityFrameworkVersion {
    pub const ALL: [EntityFrameworkVersion; 3] = [
        EntityFrameworkVersion::V1,
        EntityFrameworkVersion::V2,
        EntityFrameworkVersion::V3,
    ];

    pub const LATEST: EntityFrameworkVersion = EntityFrameworkVersion::V3;

    pub const OLDEST: EntityFrameworkVersion = EntityFrameworkVersion::V1;

    pub const fn version_number(self) -> VersionNumber {
        match self {
            EntityFrameworkVersion::V1 => VersionNumber::new(1, 0, 0, 0),
            EntityFrameworkVersion::V2 => VersionNumber::new(2, 0, 0, 0),
            EntityFrameworkVersion::V3 => VersionNumber::new(3, 0, 0, 0),
        }
    }

    /// Schema version as the `1.0`/`2.0`/`3.0` double used by store metadata.
    pub fn as_f64(self) -> f64 {
        f64::from(self.version_number().major)
    }

    /// A version number is valid only if it is exactly one of the three
    /// supported constants.
    pub fn is_valid(version: VersionNumber) -> bool {
        Self::ALL.iter().any(|v| v.version_number() == version)
    }
}

impl TryFrom<VersionNumber> for EntityFrameworkVersion {
    type Error = EdmxError;

    fn try_from(version: VersionNumber) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|v| v.version_number() == version)
            .ok_or_else(|| EdmxError::UnsupportedVersion {
                version: version.to_string(),
            })
    }
}

impl FromStr for EntityFrameworkVersion {
    type Err = EdmxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        trimmed.parse::<VersionNumber>()?.try_into()
    }
}

impl fmt::Display for EntityFrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.version_number();
        write!(f, "{}.{}", v.major, v.minor)
    }
}
