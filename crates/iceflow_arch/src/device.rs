//! iCE40 device identifiers: `family-size-package` strings.
//!
//! The place-and-route tool only knows about densities, but the timing
//! analyzer needs the exact series (LP vs HX), and the two series of the same
//! density support different packages. Packages are therefore validated
//! against a per-size allow-list. Some sizes list a package twice, once with
//! a `:4k` density suffix; the suffixed string is a distinct package.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors produced while parsing a device string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The string does not have exactly three `-`-separated fields.
    #[error("malformed device string '{0}': expected <family>-<size>-<package>")]
    Malformed(String),

    /// The family field is not a supported family.
    #[error("unknown device family '{0}'")]
    InvalidFamily(String),

    /// The size field is not a known device series/size.
    #[error("invalid device series/size '{0}'")]
    InvalidSize(String),

    /// The package is not available for the given size.
    #[error("invalid device package '{package}' for size '{size}'")]
    InvalidPackage {
        /// The validated size the package was checked against.
        size: DeviceSize,
        /// The rejected package string.
        package: String,
    },
}

/// Supported device families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Lattice iCE40.
    Ice40,
}

impl Family {
    /// Returns the identifier used in device strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Family::Ice40 => "ice40",
        }
    }
}

impl FromStr for Family {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ice40" => Ok(Family::Ice40),
            _ => Err(DeviceError::InvalidFamily(s.to_string())),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// iCE40 device series and density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSize {
    /// LP series, 384 LUTs.
    Lp384,
    /// LP series, 1K LUTs.
    Lp1k,
    /// HX series, 1K LUTs.
    Hx1k,
    /// LP series, 8K LUTs.
    Lp8k,
    /// HX series, 8K LUTs.
    Hx8k,
}

/// Packages available for each size.
const PACKAGES: &[(DeviceSize, &[&str])] = &[
    (DeviceSize::Lp384, &["qn32", "cm36", "cm49"]),
    (
        DeviceSize::Lp1k,
        &["swg16tr", "cm36", "cm49", "cm81", "cb81", "qn84", "cm121", "cb121"],
    ),
    (DeviceSize::Hx1k, &["vq100", "cb132", "tq144"]),
    (
        DeviceSize::Lp8k,
        &["cm81", "cm81:4k", "cm121", "cm121:4k", "cm225", "cm225:4k"],
    ),
    (
        DeviceSize::Hx8k,
        &["cb132", "cb132:4k", "tq144:4k", "cm225", "ct256"],
    ),
];

impl DeviceSize {
    /// Every supported size, in density order.
    pub const ALL: [DeviceSize; 5] = [
        DeviceSize::Lp384,
        DeviceSize::Lp1k,
        DeviceSize::Hx1k,
        DeviceSize::Lp8k,
        DeviceSize::Hx8k,
    ];

    /// Returns the size label used in device strings (e.g. `"hx8k"`).
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceSize::Lp384 => "lp384",
            DeviceSize::Lp1k => "lp1k",
            DeviceSize::Hx1k => "hx1k",
            DeviceSize::Lp8k => "lp8k",
            DeviceSize::Hx8k => "hx8k",
        }
    }

    /// Returns the density code passed to the place-and-route tool
    /// (the label without its series prefix, e.g. `"8k"`).
    pub fn size_code(self) -> &'static str {
        size_code(self.as_str())
    }

    /// Returns the packages this size is available in.
    pub fn packages(self) -> &'static [&'static str] {
        PACKAGES
            .iter()
            .find(|(size, _)| *size == self)
            .map(|(_, packages)| *packages)
            .unwrap_or(&[])
    }

    /// Returns `true` if `package` is in this size's allow-list.
    pub fn supports_package(self, package: &str) -> bool {
        self.packages().contains(&package)
    }
}

impl FromStr for DeviceSize {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceSize::ALL
            .into_iter()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| DeviceError::InvalidSize(s.to_string()))
    }
}

impl fmt::Display for DeviceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strips the two-character series prefix from a size label.
///
/// Only meaningful for labels that already passed validation; a label
/// shorter than the prefix yields an empty string.
pub fn size_code(size: &str) -> &str {
    size.get(2..).unwrap_or("")
}

/// A validated device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    family: Family,
    size: DeviceSize,
    package: String,
}

impl DeviceDescriptor {
    /// Parses and validates a `family-size-package` string.
    ///
    /// Checks run in field order, so a string with both a bad family and a
    /// bad size reports the family.
    pub fn parse(device: &str) -> Result<Self, DeviceError> {
        let fields: Vec<&str> = device.split('-').collect();
        let [family, size, package] = fields.as_slice() else {
            return Err(DeviceError::Malformed(device.to_string()));
        };

        let family: Family = family.parse()?;
        let size: DeviceSize = size.parse()?;
        if !size.supports_package(package) {
            return Err(DeviceError::InvalidPackage {
                size,
                package: package.to_string(),
            });
        }

        Ok(Self {
            family,
            size,
            package: package.to_string(),
        })
    }

    /// Returns the device family.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Returns the device size.
    pub fn size(&self) -> DeviceSize {
        self.size
    }

    /// Returns the package string, including any density suffix.
    pub fn package(&self) -> &str {
        &self.package
    }
}

impl FromStr for DeviceDescriptor {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.family, self.size, self.package)
    }
}
