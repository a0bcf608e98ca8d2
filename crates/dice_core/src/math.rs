//! Fixed-point coordinates for die placement.
//!
//! The engine stores where the presentation layer put each die so the
//! layout survives a reload, but never reads the values back. Fixed-point
//! keeps snapshots bit-exact and the state hash stable.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for stored coordinates.
pub type Fixed = I32F32;

/// Fixed-point 2D position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point position.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Origin.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Convert host coordinates (pixels, usually `f64`) into a stored position.
    ///
    /// Non-finite input collapses to zero; out-of-range values saturate.
    #[must_use]
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self::new(to_fixed(x), to_fixed(y))
    }

    /// Convert back to host coordinates.
    #[must_use]
    pub fn to_f64(self) -> (f64, f64) {
        (self.x.to_num(), self.y.to_num())
    }
}

fn to_fixed(v: f64) -> Fixed {
    if v.is_finite() {
        Fixed::saturating_from_num(v)
    } else {
        Fixed::ZERO
    }
}
