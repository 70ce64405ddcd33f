// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A seed is every knob the scene has, written down.  Given the same
//! seed you get the same fractal, the same camera, the same light and
//! the same sky; only the Monte Carlo noise differs from run to run.
//!
//! Seeds travel as short strings like
//! `[0.31,0.2;-0.5|0.7:...]`.  The brackets and separators are picked
//! at random every time a seed is written and mean nothing; only the
//! numbers and their order matter.  There are two layouts: the first
//! one had no iterator variant selector, the current one appends it.
//! A string is read as whichever layout its value count matches.

use std::fmt;
use std::str::FromStr;

use crate::dice::Dice;
use crate::errors::{IdyllError, Result};
use crate::vector::Vec3;

/// Characters that may open a seed string.
pub const OPENERS: [char; 4] = ['(', '[', '{', '<'];
/// Characters that may close a seed string.
pub const CLOSERS: [char; 4] = [')', ']', '}', '>'];
/// Characters that may separate two values.
pub const SEPARATORS: [char; 8] = [',', ';', ':', '|', '/', '^', '_', '!'];

/// Upper bound on the iteration count, whatever a seed says.
pub const MAX_ITERATIONS: u32 = 64;

/// Names of the values in a seed string, in the order they're written.
/// The first layout stops one short of the end.
pub const FIELD_NAMES: [&str; 32] = [
    "glossinessChance",
    "glossinessAmount",
    "xcameraDirection",
    "ycameraDirection",
    "zcameraDirection",
    "cameraDistance",
    "xlightDirection",
    "ylightDirection",
    "zlightDirection",
    "xlightColor",
    "ylightColor",
    "zlightColor",
    "xskyColor",
    "yskyColor",
    "zskyColor",
    "iterations",
    "xfractalColor",
    "yfractalColor",
    "zfractalColor",
    "xgradientTop",
    "ygradientTop",
    "zgradientTop",
    "xgradientBottom",
    "ygradientBottom",
    "zgradientBottom",
    "xshift",
    "yshift",
    "zshift",
    "firstAngle",
    "secondAngle",
    "shadowSoftness",
    "iterator",
];

/// The versions of the seed string layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SeedLayout {
    /// No iterator selector; always reads as the Menger iterator.
    V1,
    /// Current layout, with the iterator selector last.
    V2,
}

impl SeedLayout {
    /// Number of values a string in this layout carries.
    pub fn arity(self) -> usize {
        match self {
            SeedLayout::V1 => FIELD_NAMES.len() - 1,
            SeedLayout::V2 => FIELD_NAMES.len(),
        }
    }

    /// The layout with exactly `count` values, if there is one.
    pub fn from_arity(count: usize) -> Option<SeedLayout> {
        [SeedLayout::V1, SeedLayout::V2]
            .iter()
            .cloned()
            .find(|l| l.arity() == count)
    }
}

/// Which fold-and-rotate recipe the fractal iterates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IteratorKind {
    /// z rotation, Menger fold, x rotation; bounded by a box.
    Menger,
    /// x rotation, Sierpinski fold, y rotation; bounded by a sphere.
    Sierpinski,
    /// Menger fold, z rotation, Sierpinski fold, x rotation; bounded by a box.
    MengerSierpinski,
}

impl IteratorKind {
    /// All of them, in selector order.
    pub const ALL: [IteratorKind; 3] = [
        IteratorKind::Menger,
        IteratorKind::Sierpinski,
        IteratorKind::MengerSierpinski,
    ];

    /// The number a seed string uses for this kind.
    pub fn selector(self) -> f64 {
        match self {
            IteratorKind::Menger => 0.0,
            IteratorKind::Sierpinski => 1.0,
            IteratorKind::MengerSierpinski => 2.0,
        }
    }

    /// Read a selector back.  Anything out of range wraps around, so
    /// every number names some iterator.
    pub fn from_selector(value: f64) -> IteratorKind {
        let n = IteratorKind::ALL.len() as i64;
        let index = (value.round() as i64).rem_euclid(n);
        IteratorKind::ALL[index as usize]
    }
}

/// The complete set of procedural parameters for one scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Seed {
    /// Probability that a bounce is glossy rather than diffuse.
    pub gloss_chance: f64,
    /// How far a glossy bounce may stray from a mirror reflection.
    pub gloss_amount: f64,
    /// Direction from the origin along which the camera is placed.
    pub camera_direction: Vec3,
    /// Smallest distance estimate the camera may sit at.
    pub camera_distance: f64,
    /// Direction towards the directional light.
    pub light_direction: Vec3,
    /// Color (and intensity) of the directional light.
    pub light_color: Vec3,
    /// Color of the light arriving from the sky.
    pub sky_color: Vec3,
    /// How many times the point transformation is applied.
    pub iterations: u32,
    /// Per-channel weights for the orbit trap.
    pub fractal_color: Vec3,
    /// Background color at the top of the image.
    pub gradient_top: Vec3,
    /// Background color at the bottom of the image.
    pub gradient_bottom: Vec3,
    /// Translation applied on every iteration.
    pub shift: Vec3,
    /// The two rotation angles, in radians.
    pub angles: [f64; 2],
    /// Penumbra sharpness; bigger is harder.
    pub shadow_softness: f64,
    /// Which point iterator to use.
    pub iterator: IteratorKind,
}

/// Sample a direction uniformly by rejection from the unit cube.
fn random_direction(dice: &mut Dice) -> Vec3 {
    loop {
        let v = Vec3::new(
            dice.real(-1.0, 1.0),
            dice.real(-1.0, 1.0),
            dice.real(-1.0, 1.0),
        );
        let len = v.length();
        if len > 1e-3 && len <= 1.0 {
            return v / len;
        }
    }
}

fn random_color(dice: &mut Dice, low: f64, high: f64) -> Vec3 {
    Vec3::new(dice.real(low, high), dice.real(low, high), dice.real(low, high))
}

impl Seed {
    /// Draw a brand new scene.  Every parameter is sampled on its own
    /// from a fixed range.
    pub fn generate(dice: &mut Dice) -> Seed {
        let gloss_chance = dice.real(0.0, 0.5);
        let gloss_amount = dice.real(0.05, 0.5);
        let camera_direction = random_direction(dice);
        let camera_distance = dice.real(0.5, 1.5);
        let light_direction = random_direction(dice);
        let light_color = random_color(dice, 1.0, 3.0);
        let sky_color = random_color(dice, 0.05, 0.4);
        let iterations = dice.int(8, 16) as u32;
        let fractal_color = random_color(dice, 0.1, 1.0);
        let mut gradient_top = random_color(dice, 0.0, 1.0);
        let mut gradient_bottom = random_color(dice, 0.0, 1.0);
        if dice.coin() {
            std::mem::swap(&mut gradient_top, &mut gradient_bottom);
        }
        let shift = random_color(dice, -0.4, 0.0);
        let angles = [dice.real(-0.4, 0.4), dice.real(-0.4, 0.4)];
        let shadow_softness = dice.real(4.0, 32.0);
        let iterator = IteratorKind::ALL[dice.int(0, 2) as usize];

        Seed {
            gloss_chance,
            gloss_amount,
            camera_direction,
            camera_distance,
            light_direction,
            light_color,
            sky_color,
            iterations,
            fractal_color,
            gradient_top,
            gradient_bottom,
            shift,
            angles,
            shadow_softness,
            iterator,
        }
    }

    /// The values in string order, current layout.
    pub fn values(&self) -> Vec<f64> {
        let mut v = Vec::with_capacity(SeedLayout::V2.arity());
        v.push(self.gloss_chance);
        v.push(self.gloss_amount);
        push_vec(&mut v, self.camera_direction);
        v.push(self.camera_distance);
        push_vec(&mut v, self.light_direction);
        push_vec(&mut v, self.light_color);
        push_vec(&mut v, self.sky_color);
        v.push(f64::from(self.iterations));
        push_vec(&mut v, self.fractal_color);
        push_vec(&mut v, self.gradient_top);
        push_vec(&mut v, self.gradient_bottom);
        push_vec(&mut v, self.shift);
        v.push(self.angles[0]);
        v.push(self.angles[1]);
        v.push(self.shadow_softness);
        v.push(self.iterator.selector());
        v
    }

    /// Build a seed from a list of values in either layout.
    pub fn from_values(values: &[f64]) -> Result<Seed> {
        let layout = SeedLayout::from_arity(values.len()).ok_or(IdyllError::SeedArity {
            found: values.len(),
            expected_v1: SeedLayout::V1.arity(),
            expected_v2: SeedLayout::V2.arity(),
        })?;
        let vec_at = |i: usize| Vec3::new(values[i], values[i + 1], values[i + 2]);
        let iterator = match layout {
            SeedLayout::V1 => IteratorKind::Menger,
            SeedLayout::V2 => IteratorKind::from_selector(values[31]),
        };
        Ok(Seed {
            gloss_chance: values[0],
            gloss_amount: values[1],
            camera_direction: vec_at(2),
            camera_distance: values[5],
            light_direction: vec_at(6),
            light_color: vec_at(9),
            sky_color: vec_at(12),
            iterations: clamp_iterations(values[15]),
            fractal_color: vec_at(16),
            gradient_top: vec_at(19),
            gradient_bottom: vec_at(22),
            shift: vec_at(25),
            angles: [values[28], values[29]],
            shadow_softness: values[30],
            iterator,
        })
    }

    /// Read a seed string.  Either the whole seed comes back or an
    /// error does; nothing is ever half-filled.
    pub fn parse(text: &str) -> Result<Seed> {
        let text = text.trim();
        let mut chars = text.chars();
        match chars.next() {
            Some(c) if OPENERS.contains(&c) => {}
            _ => {
                return Err(IdyllError::SeedFraming {
                    reason: "missing opening bracket",
                })
            }
        }
        match chars.next_back() {
            Some(c) if CLOSERS.contains(&c) => {}
            _ => {
                return Err(IdyllError::SeedFraming {
                    reason: "missing closing bracket",
                })
            }
        }

        let runs: Vec<&str> = chars
            .as_str()
            .split(|c: char| !is_numeric(c))
            .filter(|run| !run.is_empty())
            .collect();

        if SeedLayout::from_arity(runs.len()).is_none() {
            return Err(IdyllError::SeedArity {
                found: runs.len(),
                expected_v1: SeedLayout::V1.arity(),
                expected_v2: SeedLayout::V2.arity(),
            });
        }

        let values = runs
            .iter()
            .enumerate()
            .map(|(index, run)| {
                f64::from_str(run).map_err(|_| IdyllError::SeedNumber {
                    index,
                    text: run.to_string(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        Seed::from_values(&values)
    }

    /// Write the seed out in the current layout, with freshly picked
    /// brackets and separators.
    pub fn encode(&self, dice: &mut Dice) -> String {
        let open = dice.choose(&OPENERS);
        let close = dice.choose(&CLOSERS);
        let mut out = String::new();
        out.push(open);
        let values = self.values();
        let last = values.len() - 1;
        for (i, v) in values.iter().enumerate() {
            out.push_str(&v.to_string());
            if i < last {
                out.push(dice.choose(&SEPARATORS));
            }
        }
        out.push(close);
        out
    }
}

fn push_vec(v: &mut Vec<f64>, x: Vec3) {
    v.push(x.x);
    v.push(x.y);
    v.push(x.z);
}

fn is_numeric(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || c == '-'
}

fn clamp_iterations(value: f64) -> u32 {
    if !value.is_finite() || value < 1.0 {
        return 1;
    }
    (value.round() as u32).min(MAX_ITERATIONS)
}

impl FromStr for Seed {
    type Err = IdyllError;

    fn from_str(s: &str) -> Result<Seed> {
        Seed::parse(s)
    }
}

/// The plain `[v0,v1,...]` form, for logs.  Use `encode` for the
/// decorated form.
impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let values: Vec<String> = self.values().iter().map(|v| v.to_string()).collect();
        write!(f, "[{}]", values.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::SEED_STREAM;

    fn sample() -> Seed {
        Seed::generate(&mut Dice::new(1234, SEED_STREAM))
    }

    #[test]
    fn encode_then_parse_gives_back_the_values() {
        let mut dice = Dice::new(99, SEED_STREAM);
        for _ in 0..50 {
            let seed = Seed::generate(&mut dice);
            let text = seed.encode(&mut dice);
            let back = Seed::parse(&text).unwrap();
            assert_eq!(back.values(), seed.values());
            assert_eq!(back, seed);
        }
    }

    #[test]
    fn decoration_does_not_matter() {
        let seed = sample();
        let mut a = Dice::new(1, SEED_STREAM);
        let mut b = Dice::new(2, SEED_STREAM);
        let ta = seed.encode(&mut a);
        let tb = seed.encode(&mut b);
        assert_ne!(ta, tb);
        assert_eq!(Seed::parse(&ta).unwrap(), Seed::parse(&tb).unwrap());
    }

    #[test]
    fn display_form_parses() {
        let seed = sample();
        assert_eq!(seed.to_string().parse::<Seed>().unwrap(), seed);
    }

    #[test]
    fn every_truncation_fails() {
        let text = sample().encode(&mut Dice::new(5, SEED_STREAM));
        for cut in 0..text.len() {
            assert!(Seed::parse(&text[..cut]).is_err(), "accepted {:?}", &text[..cut]);
        }
    }

    #[test]
    fn wrong_arity_fails() {
        let values: Vec<String> = (0..30).map(|i| i.to_string()).collect();
        let text = format!("[{}]", values.join(","));
        match Seed::parse(&text) {
            Err(IdyllError::SeedArity { found, .. }) => assert_eq!(found, 30),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bad_number_fails() {
        let mut values: Vec<String> = (0..32).map(|i| i.to_string()).collect();
        values[7] = "1.2.3".to_string();
        let text = format!("[{}]", values.join(";"));
        match Seed::parse(&text) {
            Err(IdyllError::SeedNumber { index, .. }) => assert_eq!(index, 7),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn letters_split_runs() {
        let text = sample().to_string().replacen("0.", "0x", 1);
        assert!(Seed::parse(&text).is_err());
    }

    #[test]
    fn first_layout_reads_as_menger() {
        let mut values = sample().values();
        values.pop();
        let text: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        let seed = Seed::parse(&format!("{{{}}}", text.join("|"))).unwrap();
        assert_eq!(seed.iterator, IteratorKind::Menger);
        assert_eq!(&seed.values()[..31], &values[..]);
    }

    #[test]
    fn iterations_are_clamped() {
        let mut values = sample().values();
        values[15] = 1000.0;
        assert_eq!(Seed::from_values(&values).unwrap().iterations, MAX_ITERATIONS);
        values[15] = -3.0;
        assert_eq!(Seed::from_values(&values).unwrap().iterations, 1);
    }

    #[test]
    fn selectors_wrap() {
        assert_eq!(IteratorKind::from_selector(4.0), IteratorKind::Sierpinski);
        assert_eq!(IteratorKind::from_selector(-1.0), IteratorKind::MengerSierpinski);
        for kind in IteratorKind::ALL.iter() {
            assert_eq!(IteratorKind::from_selector(kind.selector()), *kind);
        }
    }

    #[test]
    fn generated_values_stay_in_range() {
        let mut dice = Dice::new(3, SEED_STREAM);
        for _ in 0..200 {
            let s = Seed::generate(&mut dice);
            assert!(s.gloss_chance >= 0.0 && s.gloss_chance < 0.5);
            assert!((s.camera_direction.length() - 1.0).abs() < 1e-9);
            assert!((s.light_direction.length() - 1.0).abs() < 1e-9);
            assert!(s.iterations >= 8 && s.iterations <= 16);
            assert!(s.shift.max_component() <= 0.0);
            assert!(s.angles.iter().all(|a| a.abs() <= 0.4));
        }
    }
}
