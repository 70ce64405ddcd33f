// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The random stream.  Seeds are drawn from one, and the path tracer
//! needs a steady supply of them for picking bounce directions.
//!
//! A single generator shared between render threads would need a lock
//! on every bounce, and would make the image depend on how the
//! threads happened to interleave.  So every consumer gets its own
//! `Dice`, seeded from the run seed and a stream number, and every
//! pixel is its own stream.  Two runs with the same run seed draw the
//! same numbers for the same pixels no matter how many threads there
//! are.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::vector::Vec3;

/// Stream used to generate seed parameters.
pub const SEED_STREAM: u64 = 0;
/// Stream used by the camera seeker.
pub const CAMERA_STREAM: u64 = 1;

/// Stream for the pixel at row-major offset `index`.
pub fn pixel_stream(index: usize) -> u64 {
    2 + index as u64
}

// Spreads neighbouring stream numbers far apart in seed space.
const STREAM_SPREAD: u64 = 0x9E37_79B9_7F4A_7C15;

/// A seeded, independently owned random stream.
pub struct Dice {
    rng: StdRng,
    unit: Uniform<f64>,
}

impl Dice {
    /// A deterministic stream derived from `run_seed` and `stream`.
    pub fn new(run_seed: u64, stream: u64) -> Dice {
        let seed = run_seed ^ stream.wrapping_add(1).wrapping_mul(STREAM_SPREAD);
        Dice {
            rng: StdRng::seed_from_u64(seed),
            unit: Uniform::new(0.0, 1.0),
        }
    }

    /// A run seed drawn from the operating system, for when the user
    /// didn't ask for a reproducible run.
    pub fn fresh_run_seed() -> u64 {
        rand::thread_rng().gen()
    }

    /// Uniform integer in `[min, max]`, both ends included.
    pub fn int(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        Uniform::new_inclusive(min, max).sample(&mut self.rng)
    }

    /// Uniform real in `[min, max)`.
    pub fn real(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.unit()
    }

    /// Uniform real in `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.unit.sample(&mut self.rng)
    }

    /// A fair coin.
    pub fn coin(&mut self) -> bool {
        self.unit() < 0.5
    }

    /// Pick one element of a non-empty slice.
    pub fn choose<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.rng.gen_range(0, items.len())]
    }

    /// A point uniformly distributed on the unit sphere.  Uses the
    /// cylinder projection (pick a height and an angle), which needs
    /// no rejection loop.
    pub fn unit_sphere(&mut self) -> Vec3 {
        let theta = 2.0 * std::f64::consts::PI * self.unit();
        let h = 2.0 * self.unit() - 1.0;
        let r = (1.0 - h * h).sqrt();
        Vec3::new(r * theta.cos(), r * theta.sin(), h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream_same_numbers() {
        let mut a = Dice::new(42, 3);
        let mut b = Dice::new(42, 3);
        for _ in 0..100 {
            assert_eq!(a.unit(), b.unit());
        }
    }

    #[test]
    fn streams_differ() {
        let mut a = Dice::new(42, pixel_stream(0));
        let mut b = Dice::new(42, pixel_stream(1));
        let same = (0..32).filter(|_| a.unit() == b.unit()).count();
        assert!(same < 32);
    }

    #[test]
    fn int_is_inclusive() {
        let mut d = Dice::new(7, SEED_STREAM);
        let mut seen = [false; 3];
        for _ in 0..1000 {
            let v = d.int(0, 2);
            assert!(v >= 0 && v <= 2);
            seen[v as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn real_is_half_open() {
        let mut d = Dice::new(7, SEED_STREAM);
        for _ in 0..1000 {
            let v = d.real(-0.4, 0.4);
            assert!(v >= -0.4 && v < 0.4);
        }
        assert_eq!(d.real(1.0, 1.0), 1.0);
    }

    #[test]
    fn unit_sphere_points_are_unit_length() {
        let mut d = Dice::new(11, CAMERA_STREAM);
        for _ in 0..1000 {
            assert!((d.unit_sphere().length() - 1.0).abs() < 1e-9);
        }
    }
}
