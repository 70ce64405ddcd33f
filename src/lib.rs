#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Idyll: procedural fractal renderer
//!
//! Idyll turns a seed, a few dozen numbers, into a picture of a 3-D
//! fractal.  The fractal is defined implicitly: a point belongs to it
//! if folding, rotating and shifting that point over and over lands it
//! inside a small box.  That recipe also gives a cheap lower bound on
//! how far any point is from the fractal's surface, which is all a ray
//! marcher needs to find where camera rays hit it.
//!
//! On top of that sits a small Monte Carlo path tracer: each pixel
//! fires a few rays, each ray bounces off the surface a couple of
//! times, picking up color from the surface, light from a directional
//! lamp and from the sky, and soft shadows from the fractal itself.
//! The image is split into contiguous runs of pixels that are rendered
//! on separate threads.
//!
//! The pieces, leaves first:
//!
//! * `vector`: vectors, rays and rotation matrices.
//! * `dice`: seeded random streams.
//! * `seed`: the scene parameters and their string form.
//! * `fractal`: the distance field and everything derived from it.
//! * `renderer`: camera placement and path tracing.
//! * `scheduler`: splitting the frame between threads.
//! * `config` and `output`: reading settings, writing images.

extern crate crossbeam;
extern crate failure;
extern crate image;
extern crate log;
extern crate num;
extern crate num_cpus;
extern crate rand;

pub mod config;
pub mod dice;
pub mod errors;
pub mod fractal;
pub mod output;
pub mod renderer;
pub mod scheduler;
pub mod seed;
pub mod vector;

pub use config::RenderConfig;
pub use dice::Dice;
pub use errors::{IdyllError, Result};
pub use fractal::FractalField;
pub use renderer::{RenderSettings, Renderer};
pub use scheduler::{partition, render_chunk, render_image, Frame};
pub use seed::Seed;
pub use vector::{Ray, Vec3};
