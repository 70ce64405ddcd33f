// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Splitting the image up between threads.
//!
//! The frame is one long row-major run of pixels.  It gets cut into as
//! many contiguous pieces as there are workers, and each worker is
//! handed a mutable slice of the frame covering exactly its piece.
//! The slices never overlap, so nobody needs a lock; the borrow
//! checker is satisfied because they were carved out of the same
//! buffer with `split_at_mut`.  One piece is rendered on the calling
//! thread, which is also the one that reports progress.

use log::{debug, info};
use std::ops::Range;

use crate::errors::{IdyllError, Result};
use crate::renderer::Renderer;
use crate::vector::Vec3;

/// A finished (or in-progress) image: row-major, one color per pixel,
/// each channel in `0..=255`.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// `width * height` colors, top row first.
    pub pixels: Vec<Vec3>,
}

impl Frame {
    /// A black frame.
    pub fn new(width: usize, height: usize) -> Frame {
        Frame {
            width,
            height,
            pixels: vec![Vec3::ZERO; width * height],
        }
    }

    /// The color at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Vec3 {
        self.pixels[y * self.width + x]
    }

    /// Interleaved 8-bit RGB, ready for an encoder.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for p in &self.pixels {
            let p = p.clamp(0.0, 255.0);
            out.push(p.x as u8);
            out.push(p.y as u8);
            out.push(p.z as u8);
        }
        out
    }
}

/// Cut `width * height` pixels into contiguous, row-major ranges of
/// `ceil(pixels / workers)` each.  The last range is shorter when the
/// pixel count doesn't divide evenly, and there are fewer ranges than
/// workers when the image has fewer pixels than that.  A pixel count
/// that doesn't fit in a `usize` has no ranges at all.
pub fn partition(width: usize, height: usize, workers: usize) -> Vec<Range<usize>> {
    let total = match width.checked_mul(height) {
        Some(total) => total,
        None => return vec![],
    };
    if total == 0 || workers == 0 {
        return vec![];
    }
    let workers = workers.min(total);
    let chunk = total / workers + (total % workers != 0) as usize;
    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    while total - start >= chunk {
        ranges.push(start..start + chunk);
        start += chunk;
    }
    if start < total {
        ranges.push(start..total);
    }
    ranges
}

/// Render every pixel in `range` into `cells`, which must be the slice
/// of the frame covering exactly that range.  `progress` hears
/// `(done, total)` after every pixel.  A slice of the wrong length, or
/// a range running past the end of the frame, is a `Dimensions` error
/// and nothing is rendered.
pub fn render_chunk<F>(
    range: Range<usize>,
    renderer: &Renderer,
    cells: &mut [Vec3],
    mut progress: F,
) -> Result<()>
where
    F: FnMut(usize, usize),
{
    let settings = renderer.settings();
    let fits = settings
        .width
        .checked_mul(settings.height)
        .map_or(false, |total| range.end <= total);
    if cells.len() != range.len() || !fits {
        return Err(IdyllError::Dimensions {
            width: settings.width,
            height: settings.height,
            workers: 1,
        });
    }
    let width = settings.width;
    let total = range.len();
    for (done, (offset, cell)) in range.zip(cells.iter_mut()).enumerate() {
        *cell = renderer.render(offset % width, offset / width);
        progress(done + 1, total);
    }
    Ok(())
}

/// Render a whole `width` x `height` frame on `workers` threads.  The
/// dimensions have to be the ones the renderer was built for.
pub fn render_image<F>(
    width: usize,
    height: usize,
    workers: usize,
    renderer: &Renderer,
    progress: F,
) -> Result<Frame>
where
    F: FnMut(usize, usize),
{
    let settings = renderer.settings();
    if width == 0
        || height == 0
        || workers == 0
        || width.checked_mul(height).is_none()
        || width != settings.width
        || height != settings.height
    {
        return Err(IdyllError::Dimensions {
            width,
            height,
            workers,
        });
    }

    let ranges = partition(width, height, workers);
    let mut frame = Frame::new(width, height);
    info!(
        "rendering {}x{} in {} chunks of up to {} pixels",
        width,
        height,
        ranges.len(),
        ranges[0].len()
    );

    // Carve the frame into one disjoint slice per range.
    let mut cells: Vec<&mut [Vec3]> = Vec::with_capacity(ranges.len());
    {
        let mut rest: &mut [Vec3] = &mut frame.pixels;
        for range in &ranges {
            let (head, tail) = std::mem::replace(&mut rest, &mut []).split_at_mut(range.len());
            cells.push(head);
            rest = tail;
        }
    }

    let outcome = crossbeam::scope(|spawner| -> Result<()> {
        let mut jobs = ranges.into_iter().zip(cells.into_iter()).enumerate();
        let local = jobs.next();

        let mut handles = Vec::new();
        for (index, (range, cells)) in jobs {
            let handle = spawner
                .builder()
                .name(format!("idyll-chunk-{}", index))
                .spawn(move |_| -> Result<()> {
                    debug!("chunk {} starting on {:?}", index, range);
                    render_chunk(range, renderer, cells, |_, _| {})?;
                    debug!("chunk {} done", index);
                    Ok(())
                })?;
            handles.push(handle);
        }

        let mut outcome = match local {
            Some((_, (range, cells))) => render_chunk(range, renderer, cells, progress),
            None => Ok(()),
        };

        for handle in handles {
            let joined = handle.join().unwrap_or(Err(IdyllError::WorkerPanicked));
            if outcome.is_ok() {
                outcome = joined;
            }
        }
        outcome
    });

    match outcome {
        Ok(Ok(())) => Ok(frame),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(IdyllError::WorkerPanicked),
    }
}
