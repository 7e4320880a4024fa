//! core_units: strongly-typed measures used by the scale pipeline.
//!
//! Scope
//! - Provide `Length` (meters) and `SceneUnit` (scene units per meter) newtypes
//!   (f64 under the hood).
//! - Implement basic arithmetic with scalars and same-typed values.
//! - Keep this crate tiny and dependency-free; conversions are explicit.
//!
//! Extending
//! - Add area/volume types if the catalog ever needs footprint-based sizing.
//! - Consider `serde` feature-gated derives when units cross process boundaries.

use core::fmt;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

/// Length in meters (f64).
#[derive(Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Length(pub f64);

/// Scene units per meter (f64). Multiplying a `Length` by a `SceneUnit`
/// yields a raw scene-space scalar.
#[derive(Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct SceneUnit(pub f64);

impl fmt::Debug for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} m", self.0)
    }
}
impl fmt::Debug for SceneUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} su/m", self.0)
    }
}

// Conversions
impl From<f64> for Length {
    fn from(v: f64) -> Self {
        Length(v)
    }
}
impl From<Length> for f64 {
    fn from(v: Length) -> Self {
        v.0
    }
}
impl From<f64> for SceneUnit {
    fn from(v: f64) -> Self {
        SceneUnit(v)
    }
}
impl From<SceneUnit> for f64 {
    fn from(v: SceneUnit) -> Self {
        v.0
    }
}

/// A `Length` scaled into scene space: meters times scene-units-per-meter.
impl Mul<SceneUnit> for Length {
    type Output = f64;
    fn mul(self, rhs: SceneUnit) -> f64 {
        self.0 * rhs.0
    }
}

// Basic arithmetic with same-type values
macro_rules! impl_ops_same {
    ($T:ty) => {
        impl Add for $T {
            type Output = $T;
            fn add(self, rhs: $T) -> $T {
                <$T>::from(f64::from(self) + f64::from(rhs))
            }
        }
        impl AddAssign for $T {
            fn add_assign(&mut self, rhs: $T) {
                *self = *self + rhs;
            }
        }
        impl Sub for $T {
            type Output = $T;
            fn sub(self, rhs: $T) -> $T {
                <$T>::from(f64::from(self) - f64::from(rhs))
            }
        }
        impl SubAssign for $T {
            fn sub_assign(&mut self, rhs: $T) {
                *self = *self - rhs;
            }
        }
        impl Mul<f64> for $T {
            type Output = $T;
            fn mul(self, rhs: f64) -> $T {
                <$T>::from(f64::from(self) * rhs)
            }
        }
        impl MulAssign<f64> for $T {
            fn mul_assign(&mut self, rhs: f64) {
                *self = *self * rhs;
            }
        }
        impl Div<f64> for $T {
            type Output = $T;
            fn div(self, rhs: f64) -> $T {
                <$T>::from(f64::from(self) / rhs)
            }
        }
        impl DivAssign<f64> for $T {
            fn div_assign(&mut self, rhs: f64) {
                *self = *self / rhs;
            }
        }
    };
}

impl_ops_same!(Length);
impl_ops_same!(SceneUnit);

impl SceneUnit {
    /// Identity mapping: one scene unit per meter.
    pub const ONE: SceneUnit = SceneUnit(1.0);

    pub fn min(self, other: SceneUnit) -> SceneUnit {
        if other.0 < self.0 { other } else { self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_ops_and_convert() {
        let a = Length::from(2.0);
        let b = Length::from(3.5);
        let c = a + b;
        assert!((f64::from(c) - 5.5).abs() < 1e-12);
        let mut d = c;
        d *= 2.0;
        assert!((f64::from(d) - 11.0).abs() < 1e-12);
        d /= 4.0;
        assert!((f64::from(d) - 2.75).abs() < 1e-12);
    }

    #[test]
    fn scene_unit_scales_length() {
        let h = Length(3_474_800.0);
        let u = SceneUnit(0.001);
        assert!((h * u - 3474.8).abs() < 1e-9);
    }

    #[test]
    fn scene_unit_min_prefers_smaller() {
        let a = SceneUnit(0.1);
        let b = SceneUnit(0.001);
        assert_eq!(f64::from(a.min(b)), 0.001);
        assert_eq!(f64::from(SceneUnit::ONE.min(a)), 0.1);
    }
}
