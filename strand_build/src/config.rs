// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf layout selection and build configuration.

use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// Largest group size any layout accepts.
pub const MAX_GROUP_SIZE: usize = 16;

/// Default tolerance for divisions by a box extent.
pub const DEFAULT_MIN_EXTENT: f32 = 1e-19;

/// Default leaf alignment in bytes.
pub const DEFAULT_BYTE_ALIGNMENT: usize = 16;

/// The four mutually exclusive leaf encodings.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LeafKind {
    /// Per-primitive full-precision affine transform into a unit box.
    #[default]
    Full,
    /// One shared transform per block, bounds quantized to bytes.
    SharedTransform,
    /// Shared offset/scale, per-primitive byte basis and 16-bit bounds.
    Compressed,
    /// Fixed-size array of per-primitive normalized boxes.
    AabbArray,
}

impl LeafKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Full,
        Self::SharedTransform,
        Self::Compressed,
        Self::AabbArray,
    ];

    /// Short name used by [`FromStr`] and [`Display`](fmt::Display).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::SharedTransform => "shared",
            Self::Compressed => "compressed",
            Self::AabbArray => "aabb",
        }
    }

    /// Group size used when the configuration does not override it.
    pub const fn default_group_size(self) -> usize {
        match self {
            Self::AabbArray => 4,
            _ => 8,
        }
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for LeafKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownKind { name: s.into() })
    }
}

/// Invalid leaf configuration.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Group size outside `1..=MAX_GROUP_SIZE`.
    #[error("max group size {size} outside 1..=16")]
    GroupSize {
        /// Requested group size.
        size: usize,
    },
    /// The extent tolerance must be a finite positive number.
    #[error("minimum extent must be finite and positive, got {value}")]
    MinExtent {
        /// Requested tolerance.
        value: f32,
    },
    /// Leaf alignment must be a power of two.
    #[error("byte alignment {align} is not a power of two")]
    Alignment {
        /// Requested alignment.
        align: usize,
    },
    /// A layout name that matches no [`LeafKind`].
    #[error("unknown leaf layout `{name}` (expected full, shared, compressed or aabb)")]
    UnknownKind {
        /// The name that failed to parse.
        name: String,
    },
}

/// Build-time choice of leaf layout and its parameters.
///
/// ```
/// use strand_build::{LeafConfig, LeafKind};
///
/// let config = LeafConfig::new(LeafKind::AabbArray).with_max_group_size(8);
/// assert!(config.validate().is_ok());
/// assert!(LeafConfig::default().with_byte_alignment(12).validate().is_err());
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LeafConfig {
    /// Selected layout.
    pub kind: LeafKind,
    /// Most primitives stored in one block.
    pub max_group_size: usize,
    /// Lower clamp for box extents before they are used as divisors.
    pub min_extent: f32,
    /// Alignment requested from the allocator.
    pub byte_alignment: usize,
}

impl Default for LeafConfig {
    fn default() -> Self {
        Self::new(LeafKind::default())
    }
}

impl LeafConfig {
    /// Configuration for `kind` with that layout's default group size.
    pub const fn new(kind: LeafKind) -> Self {
        Self {
            kind,
            max_group_size: kind.default_group_size(),
            min_extent: DEFAULT_MIN_EXTENT,
            byte_alignment: DEFAULT_BYTE_ALIGNMENT,
        }
    }

    /// Override the group size.
    #[must_use]
    pub const fn with_max_group_size(mut self, size: usize) -> Self {
        self.max_group_size = size;
        self
    }

    /// Override the extent tolerance.
    #[must_use]
    pub const fn with_min_extent(mut self, value: f32) -> Self {
        self.min_extent = value;
        self
    }

    /// Override the leaf alignment.
    #[must_use]
    pub const fn with_byte_alignment(mut self, align: usize) -> Self {
        self.byte_alignment = align;
        self
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_GROUP_SIZE).contains(&self.max_group_size) {
            return Err(ConfigError::GroupSize {
                size: self.max_group_size,
            });
        }
        if !self.min_extent.is_finite() || self.min_extent <= 0.0 {
            return Err(ConfigError::MinExtent {
                value: self.min_extent,
            });
        }
        if !self.byte_alignment.is_power_of_two() {
            return Err(ConfigError::Alignment {
                align: self.byte_alignment,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn names_round_trip() {
        for kind in LeafKind::ALL {
            assert_eq!(kind.to_string().parse::<LeafKind>(), Ok(kind));
        }
        assert_eq!("AABB".parse::<LeafKind>(), Ok(LeafKind::AabbArray));
        assert!(matches!(
            "bezier".parse::<LeafKind>(),
            Err(ConfigError::UnknownKind { .. })
        ));
    }

    #[test]
    fn defaults_follow_layout() {
        assert_eq!(LeafConfig::new(LeafKind::Full).max_group_size, 8);
        assert_eq!(LeafConfig::new(LeafKind::AabbArray).max_group_size, 4);
        let config = LeafConfig::default();
        assert_eq!(config.min_extent, DEFAULT_MIN_EXTENT);
        assert_eq!(config.byte_alignment, 16);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        let base = LeafConfig::default();
        assert_eq!(
            base.with_max_group_size(0).validate(),
            Err(ConfigError::GroupSize { size: 0 })
        );
        assert!(base.with_max_group_size(17).validate().is_err());
        assert!(base.with_min_extent(0.0).validate().is_err());
        assert!(base.with_min_extent(f32::NAN).validate().is_err());
        assert_eq!(
            base.with_byte_alignment(24).validate(),
            Err(ConfigError::Alignment { align: 24 })
        );
    }
}
