// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The little bit of linear algebra the tracer needs: a three-component
//! vector, a ray, and a 3x3 matrix.  None of these own anything; they
//! are small `Copy` values and get passed around by value.

use num::clamp;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// A three-component vector of doubles.  Used interchangeably for
/// points, directions and RGB colors, since the arithmetic is the same.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vec3 {
    /// First component (or red).
    pub x: f64,
    /// Second component (or green).
    pub y: f64,
    /// Third component (or blue).
    pub z: f64,
}

impl Vec3 {
    /// All zeroes.
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    /// All ones.
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };

    /// Constructor.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Vec3 {
        Vec3 { x, y, z }
    }

    /// A vector with the same value in all three components.
    #[inline]
    pub const fn splat(v: f64) -> Vec3 {
        Vec3 { x: v, y: v, z: v }
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    #[inline]
    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction.  A zero vector stays zero
    /// rather than turning into a vector of NaNs.
    #[inline]
    pub fn normalize(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 {
            self / len
        } else {
            self
        }
    }

    /// Componentwise absolute value.
    #[inline]
    pub fn abs(self) -> Vec3 {
        Vec3::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Componentwise maximum.
    #[inline]
    pub fn max(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Componentwise minimum.
    #[inline]
    pub fn min(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Largest of the three components.
    #[inline]
    pub fn max_component(self) -> f64 {
        self.x.max(self.y).max(self.z)
    }

    /// Clamp every component into `[low, high]`.
    #[inline]
    pub fn clamp(self, low: f64, high: f64) -> Vec3 {
        Vec3::new(
            clamp(self.x, low, high),
            clamp(self.y, low, high),
            clamp(self.z, low, high),
        )
    }

    /// Linear interpolation: `self` at `t == 0`, `other` at `t == 1`.
    #[inline]
    pub fn mix(self, other: Vec3, t: f64) -> Vec3 {
        self * (1.0 - t) + other * t
    }

    /// Mirror `self` about the plane whose normal is `normal`.
    #[inline]
    pub fn reflect(self, normal: Vec3) -> Vec3 {
        self - normal * (2.0 * self.dot(normal))
    }

    /// Raise every component to `exponent`.
    #[inline]
    pub fn powf(self, exponent: f64) -> Vec3 {
        Vec3::new(self.x.powf(exponent), self.y.powf(exponent), self.z.powf(exponent))
    }

    /// True when no component is NaN or infinite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, r: Vec3) -> Vec3 {
        Vec3::new(self.x + r.x, self.y + r.y, self.z + r.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, r: Vec3) -> Vec3 {
        Vec3::new(self.x - r.x, self.y - r.y, self.z - r.z)
    }
}

impl Mul for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, r: Vec3) -> Vec3 {
        Vec3::new(self.x * r.x, self.y * r.y, self.z * r.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, v: f64) -> Vec3 {
        Vec3::new(self.x * v, self.y * v, self.z * v)
    }
}

impl Div for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, r: Vec3) -> Vec3 {
        Vec3::new(self.x / r.x, self.y / r.y, self.z / r.z)
    }
}

impl Div<f64> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, v: f64) -> Vec3 {
        Vec3::new(self.x / v, self.y / v, self.z / v)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, r: Vec3) {
        *self = *self + r;
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, r: Vec3) {
        *self = *self - r;
    }
}

impl MulAssign for Vec3 {
    #[inline]
    fn mul_assign(&mut self, r: Vec3) {
        *self = *self * r;
    }
}

impl MulAssign<f64> for Vec3 {
    #[inline]
    fn mul_assign(&mut self, v: f64) {
        *self = *self * v;
    }
}

impl DivAssign<f64> for Vec3 {
    #[inline]
    fn div_assign(&mut self, v: f64) {
        *self = *self / v;
    }
}

/// A half-line: everything at `origin + direction * t` for `t >= 0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Where the ray starts.
    pub origin: Vec3,
    /// Which way it goes.  Expected to be unit length.
    pub direction: Vec3,
}

impl Ray {
    /// Constructor.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Ray {
        Ray { origin, direction }
    }

    /// The point `t` units along the ray.
    #[inline]
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A row-major 3x3 matrix.  The only use for one here is holding a
/// rotation that gets applied to every camera ray, so it only knows
/// how to build the two elementary rotations and multiply a vector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mat3(pub [Vec3; 3]);

impl Mat3 {
    /// The identity matrix.
    pub const IDENTITY: Mat3 = Mat3([
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
    ]);

    /// Right-handed rotation by `angle` radians about the x axis.
    pub fn rotation_x(angle: f64) -> Mat3 {
        let (s, c) = angle.sin_cos();
        Mat3([
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, c, -s),
            Vec3::new(0.0, s, c),
        ])
    }

    /// Right-handed rotation by `angle` radians about the y axis.
    pub fn rotation_y(angle: f64) -> Mat3 {
        let (s, c) = angle.sin_cos();
        Mat3([
            Vec3::new(c, 0.0, s),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(-s, 0.0, c),
        ])
    }

    /// Matrix times column vector.
    #[inline]
    pub fn apply(&self, v: Vec3) -> Vec3 {
        Vec3::new(self.0[0].dot(v), self.0[1].dot(v), self.0[2].dot(v))
    }
}
