// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can go wrong in a run.  Misses, exhausted marches
//! and degenerate distance estimates are not in here: those are
//! ordinary outcomes of tracing a ray and end up as sky color.

use failure::Fail;
use std::io;

/// The error type for the whole crate.
#[derive(Debug, Fail)]
pub enum IdyllError {
    /// A seed string held the wrong number of values.
    #[fail(
        display = "seed holds {} values, expected {} or {}",
        found, expected_v1, expected_v2
    )]
    SeedArity {
        /// How many numeric runs were found.
        found: usize,
        /// Field count of the first seed layout.
        expected_v1: usize,
        /// Field count of the current seed layout.
        expected_v2: usize,
    },

    /// One of the runs in a seed string isn't a number.
    #[fail(display = "seed value #{} ({:?}) is not a number", index, text)]
    SeedNumber {
        /// Position of the bad run.
        index: usize,
        /// The bad run itself.
        text: String,
    },

    /// The seed string isn't wrapped in brackets, or a value runs off
    /// the end of it.
    #[fail(display = "seed is not bracketed: {}", reason)]
    SeedFraming {
        /// What was wrong.
        reason: &'static str,
    },

    /// A configuration entry has a value we can't use.
    #[fail(display = "invalid value {:?} for '{}': {}", value, key, reason)]
    ConfigValue {
        /// The configuration key.
        key: String,
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A configuration entry we've never heard of.
    #[fail(display = "unknown configuration key '{}'", key)]
    ConfigKey {
        /// The configuration key.
        key: String,
    },

    /// Zero-sized images or zero workers.
    #[fail(display = "cannot render a {}x{} image with {} workers", width, height, workers)]
    Dimensions {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
        /// Requested worker count.
        workers: usize,
    },

    /// A render worker died.
    #[fail(display = "render worker panicked")]
    WorkerPanicked,

    /// Writing the image (or a seed file) failed.
    #[fail(display = "i/o failure: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for IdyllError {
    fn from(e: io::Error) -> Self {
        IdyllError::Io(e)
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, IdyllError>;
