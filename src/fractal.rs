// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The fractal itself, as a signed distance field.
//!
//! The whole shape comes from one small map that folds a point into
//! the positive octant, folds it again across a few diagonal planes,
//! rotates it a little and nudges it sideways.  Apply that map a dozen
//! or so times and measure how far the result is from a plain box (or
//! sphere): that number is the distance estimate.  Every piece of the
//! map is a reflection, a rotation or a translation, none of which
//! ever stretches distances, so the estimate never claims more room
//! than there really is and the ray marcher can trust it.
//!
//! Color, normals and soft shadows are all built out of the same map
//! and the same estimate.

use num::clamp;

use crate::seed::{IteratorKind, Seed};
use crate::vector::{Ray, Vec3};

/// Half-extent of the bounding box (or radius of the bounding sphere)
/// that the iterated point is measured against.
pub const BOUND_SCALE: f64 = 1.0;

/// Offset of the tetrahedron used for normals.
pub const NORMAL_EPSILON: f64 = 1e-5;

/// A shadow ray that comes this close to something is blocked.
pub const SHADOW_HIT: f64 = 5e-5;
const SHADOW_START: f64 = 0.01;
const SHADOW_STEPS: usize = 128;
const SHADOW_MAX_DIST: f64 = 16.0;

/// Sine and cosine of one rotation angle, worked out once.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rotation {
    sin: f64,
    cos: f64,
}

impl Rotation {
    /// Precompute the rotation by `angle` radians.
    pub fn new(angle: f64) -> Rotation {
        let (sin, cos) = angle.sin_cos();
        Rotation { sin, cos }
    }

    #[inline]
    fn about_x(&self, p: &mut Vec3) {
        let (y, z) = (p.y, p.z);
        p.y = self.cos * y - self.sin * z;
        p.z = self.sin * y + self.cos * z;
    }

    #[inline]
    fn about_y(&self, p: &mut Vec3) {
        let (x, z) = (p.x, p.z);
        p.x = self.cos * x + self.sin * z;
        p.z = -self.sin * x + self.cos * z;
    }

    #[inline]
    fn about_z(&self, p: &mut Vec3) {
        let (x, y) = (p.x, p.y);
        p.x = self.cos * x - self.sin * y;
        p.y = self.sin * x + self.cos * y;
    }
}

/// Reflect across the planes `x = y`, `x = z` and `y = z`, in that
/// order, whenever the point is on the "wrong" side.  Leaves the
/// coordinates sorted largest first.
#[inline]
fn menger_fold(p: &mut Vec3) {
    let a = (p.x - p.y).min(0.0);
    p.x -= a;
    p.y += a;
    let a = (p.x - p.z).min(0.0);
    p.x -= a;
    p.z += a;
    let a = (p.y - p.z).min(0.0);
    p.y -= a;
    p.z += a;
}

/// Reflect across the planes `x + y = 0`, `x + z = 0` and `y + z = 0`.
#[inline]
fn sierpinski_fold(p: &mut Vec3) {
    let a = (p.x + p.y).min(0.0);
    p.x -= a;
    p.y -= a;
    let a = (p.x + p.z).min(0.0);
    p.x -= a;
    p.z -= a;
    let a = (p.y + p.z).min(0.0);
    p.y -= a;
    p.z -= a;
}

/// The closed family of point iterators.  Each one carries its own
/// precomputed rotations, and is picked once when the field is built.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PointIterator {
    /// `abs`, rotate about z, Menger fold, rotate about x.
    Menger {
        /// First rotation.
        z: Rotation,
        /// Second rotation.
        x: Rotation,
    },
    /// `abs`, rotate about x, Sierpinski fold, rotate about y.
    Sierpinski {
        /// First rotation.
        x: Rotation,
        /// Second rotation.
        y: Rotation,
    },
    /// `abs`, Menger fold, rotate about z, Sierpinski fold, rotate about x.
    MengerSierpinski {
        /// First rotation.
        z: Rotation,
        /// Second rotation.
        x: Rotation,
    },
}

impl PointIterator {
    /// Build the iterator `kind` with rotation angles `angles`.
    pub fn new(kind: IteratorKind, angles: [f64; 2]) -> PointIterator {
        let (a, b) = (Rotation::new(angles[0]), Rotation::new(angles[1]));
        match kind {
            IteratorKind::Menger => PointIterator::Menger { z: a, x: b },
            IteratorKind::Sierpinski => PointIterator::Sierpinski { x: a, y: b },
            IteratorKind::MengerSierpinski => PointIterator::MengerSierpinski { z: a, x: b },
        }
    }

    /// Everything but the translation.
    #[inline]
    fn fold_and_rotate(&self, p: &mut Vec3) {
        *p = p.abs();
        match self {
            PointIterator::Menger { z, x } => {
                z.about_z(p);
                menger_fold(p);
                x.about_x(p);
            }
            PointIterator::Sierpinski { x, y } => {
                x.about_x(p);
                sierpinski_fold(p);
                y.about_y(p);
            }
            PointIterator::MengerSierpinski { z, x } => {
                menger_fold(p);
                z.about_z(p);
                sierpinski_fold(p);
                x.about_x(p);
            }
        }
    }

    /// Distance from an iterated point to the shape this iterator is
    /// measured against.
    #[inline]
    fn bound(&self, p: Vec3, scale: f64) -> f64 {
        match self {
            PointIterator::Sierpinski { .. } => p.length() - scale,
            _ => de_box(p, Vec3::splat(scale)),
        }
    }
}

/// Exact signed distance to an axis-aligned box centred on the origin
/// with half-extents `size`.
pub fn de_box(p: Vec3, size: Vec3) -> f64 {
    let q = p.abs() - size;
    q.max(Vec3::ZERO).length() + q.max_component().min(0.0)
}

/// The fractal, ready to be measured.  Immutable once built, so any
/// number of render threads can read it at once.
#[derive(Clone, Debug)]
pub struct FractalField {
    iterations: u32,
    iterator: PointIterator,
    shift: Vec3,
    color: Vec3,
    scale: f64,
    softness: f64,
    /// Sky color at the top of the frame.
    pub gradient_top: Vec3,
    /// Sky color at the bottom of the frame.
    pub gradient_bottom: Vec3,
}

impl FractalField {
    /// Take the fractal's share of a seed.
    pub fn new(seed: &Seed) -> FractalField {
        FractalField {
            iterations: seed.iterations.max(1),
            iterator: PointIterator::new(seed.iterator, seed.angles),
            shift: seed.shift,
            color: seed.fractal_color,
            scale: BOUND_SCALE,
            softness: seed.shadow_softness,
            gradient_top: seed.gradient_top,
            gradient_bottom: seed.gradient_bottom,
        }
    }

    /// How many times the map is applied.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Apply the map once, in place.
    #[inline]
    pub fn iterate_point(&self, p: &mut Vec3) {
        self.iterator.fold_and_rotate(p);
        *p += self.shift;
    }

    /// Lower bound on the distance from `p` to the surface; negative
    /// inside.  May be NaN or infinite for hopeless inputs, which the
    /// marcher reads as a miss.
    pub fn distance_estimate(&self, p: Vec3) -> f64 {
        let mut p = p;
        for _ in 0..self.iterations {
            self.iterate_point(&mut p);
        }
        self.iterator.bound(p, self.scale)
    }

    /// Orbit-trap color: the per-channel maximum of the iterated point
    /// weighted by the seed's fractal color.  Not clamped.
    pub fn surface_color(&self, p: Vec3) -> Vec3 {
        let mut p = p;
        let mut orbit = Vec3::ZERO;
        for _ in 0..self.iterations {
            self.iterate_point(&mut p);
            orbit = orbit.max(p * self.color);
        }
        orbit
    }

    /// Unit surface normal from four estimates taken at the corners of
    /// a small tetrahedron around `p`.  Falls back to the radial
    /// direction where the field is flat.
    pub fn surface_normal(&self, p: Vec3) -> Vec3 {
        let h = NORMAL_EPSILON;
        let corners = [
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
        ];
        let mut n = Vec3::ZERO;
        for k in corners.iter() {
            n += *k * self.distance_estimate(p + *k * h);
        }
        let len = n.length();
        if len > 0.0 && len.is_finite() {
            return n / len;
        }
        let radial = p.normalize();
        if radial.length() > 0.0 {
            radial
        } else {
            Vec3::new(0.0, 1.0, 0.0)
        }
    }

    /// How much light gets through along `ray`: 0 when something is in
    /// the way, 1 when nothing comes near, and in between for rays that
    /// graze an edge.  The softness coefficient sets how wide that
    /// in-between band is.
    pub fn shadow_attenuation(&self, ray: &Ray) -> f64 {
        let mut res: f64 = 1.0;
        let mut t = SHADOW_START;
        for _ in 0..SHADOW_STEPS {
            let h = self.distance_estimate(ray.at(t));
            if !h.is_finite() {
                break;
            }
            if h < SHADOW_HIT {
                return 0.0;
            }
            res = res.min(self.softness * h / t);
            t += h;
            if t > SHADOW_MAX_DIST {
                break;
            }
        }
        clamp(res, 0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{Dice, SEED_STREAM};

    fn seed_with(kind: IteratorKind, iterations: u32) -> Seed {
        let mut seed = Seed::generate(&mut Dice::new(21, SEED_STREAM));
        seed.iterator = kind;
        seed.iterations = iterations;
        seed
    }

    // One iteration, no rotation, no shift: the Sierpinski iterator
    // collapses to a unit sphere and the Menger one to a unit box.
    fn plain(kind: IteratorKind) -> FractalField {
        let mut seed = seed_with(kind, 1);
        seed.angles = [0.0, 0.0];
        seed.shift = Vec3::ZERO;
        seed.shadow_softness = 8.0;
        FractalField::new(&seed)
    }

    #[test]
    fn plain_sierpinski_is_a_sphere() {
        let f = plain(IteratorKind::Sierpinski);
        assert!((f.distance_estimate(Vec3::new(0.0, 3.0, 0.0)) - 2.0).abs() < 1e-12);
        assert!((f.distance_estimate(Vec3::new(-2.0, 0.0, 0.0)) - 1.0).abs() < 1e-12);
        assert!(f.distance_estimate(Vec3::ZERO) < 0.0);
    }

    #[test]
    fn plain_menger_is_a_box() {
        let f = plain(IteratorKind::Menger);
        assert!((f.distance_estimate(Vec3::new(0.0, 0.0, -4.0)) - 3.0).abs() < 1e-12);
        let corner = Vec3::new(2.0, 2.0, 2.0);
        assert!((f.distance_estimate(corner) - 3f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn folds_are_reflections() {
        let mut p = Vec3::new(0.1, 0.7, 0.3);
        let before = p.length();
        menger_fold(&mut p);
        assert!((p.length() - before).abs() < 1e-12);
        assert!(p.x >= p.y && p.y >= p.z);

        let mut q = Vec3::new(-0.9, 0.2, -0.1);
        let before = q.length();
        sierpinski_fold(&mut q);
        assert!((q.length() - before).abs() < 1e-12);
        assert!(q.x + q.y >= 0.0 && q.x + q.z >= 0.0 && q.y + q.z >= 0.0);
    }

    #[test]
    fn estimate_is_positive_far_away() {
        for kind in IteratorKind::ALL.iter() {
            let f = FractalField::new(&seed_with(*kind, 16));
            for p in &[
                Vec3::new(20.0, 0.0, 0.0),
                Vec3::new(0.0, -20.0, 0.0),
                Vec3::new(10.0, 10.0, 10.0),
            ] {
                assert!(f.distance_estimate(*p) > 0.0);
            }
        }
    }

    #[test]
    fn estimate_never_overshoots_one_unit_per_unit() {
        // A 1-Lipschitz estimate can't change faster than the point moves.
        let f = FractalField::new(&seed_with(IteratorKind::MengerSierpinski, 12));
        let mut dice = Dice::new(4, SEED_STREAM);
        for _ in 0..500 {
            let p = dice.unit_sphere() * dice.real(0.0, 3.0);
            let q = p + dice.unit_sphere() * 0.01;
            let dp = f.distance_estimate(p);
            let dq = f.distance_estimate(q);
            assert!((dp - dq).abs() <= (p - q).length() + 1e-9);
        }
    }

    #[test]
    fn normals_are_unit_length_near_the_surface() {
        let f = plain(IteratorKind::Sierpinski);
        let mut dice = Dice::new(8, SEED_STREAM);
        for _ in 0..100 {
            let dir = dice.unit_sphere();
            let n = f.surface_normal(dir * 1.0001);
            assert!((n.length() - 1.0).abs() < 1e-9);
            assert!(n.dot(dir) > 0.99);
        }
        let g = FractalField::new(&seed_with(IteratorKind::Menger, 14));
        let n = g.surface_normal(Vec3::new(0.3, 1.7, -0.2));
        assert!((n.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn orbit_trap_is_non_negative() {
        let f = FractalField::new(&seed_with(IteratorKind::Menger, 10));
        let c = f.surface_color(Vec3::new(0.5, -0.2, 1.1));
        assert!(c.x >= 0.0 && c.y >= 0.0 && c.z >= 0.0);
    }

    #[test]
    fn shadow_is_clear_with_nothing_in_the_way() {
        let f = plain(IteratorKind::Sierpinski);
        let ray = Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(f.shadow_attenuation(&ray), 1.0);
    }

    #[test]
    fn shadow_is_black_behind_an_occluder() {
        let f = plain(IteratorKind::Sierpinski);
        let ray = Ray::new(Vec3::new(0.0, -3.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(f.shadow_attenuation(&ray), 0.0);
        // Starting right on the occluder's surface.
        let touching = Ray::new(Vec3::new(0.0, -1.0 - SHADOW_START - 1e-6, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(f.shadow_attenuation(&touching), 0.0);
    }

    #[test]
    fn shadow_darkens_towards_the_occluder() {
        // Light straight up, unit sphere at the origin; slide the shaded
        // point sideways under the sphere.
        let f = plain(IteratorKind::Sierpinski);
        let up = Vec3::new(0.0, 1.0, 0.0);
        let mut last = 1.0;
        for x in &[3.0, 2.0, 1.5, 1.25, 1.1, 1.02, 0.9, 0.5, 0.0] {
            let s = f.shadow_attenuation(&Ray::new(Vec3::new(*x, -3.0, 0.0), up));
            assert!(s <= last + 1e-9, "x = {}: {} after {}", x, s, last);
            last = s;
        }
        assert_eq!(last, 0.0);
    }
}
