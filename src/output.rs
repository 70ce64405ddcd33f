// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing finished frames to disk, either as a plain-text PPM (one
//! pixel per group of three numbers, easy to eyeball or diff) or as a
//! PNG.

use image::png::PNGEncoder;
use image::pnm::{PNMEncoder, PNMSubtype, SampleEncoding};
use image::ColorType;
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::errors::Result;
use crate::scheduler::Frame;

/// Write `frame` as an ASCII (`P3`) pixmap.
pub fn write_ppm<P: AsRef<Path>>(path: P, frame: &Frame) -> Result<()> {
    let output = BufWriter::new(File::create(path.as_ref())?);
    let mut encoder =
        PNMEncoder::new(output).with_subtype(PNMSubtype::Pixmap(SampleEncoding::Ascii));
    encoder.encode(
        &frame.to_rgb8()[..],
        frame.width as u32,
        frame.height as u32,
        ColorType::RGB(8),
    )?;
    Ok(())
}

/// Write `frame` as an 8-bit RGB PNG.
pub fn write_png<P: AsRef<Path>>(path: P, frame: &Frame) -> Result<()> {
    let output = BufWriter::new(File::create(path.as_ref())?);
    PNGEncoder::new(output).encode(
        &frame.to_rgb8(),
        frame.width as u32,
        frame.height as u32,
        ColorType::RGB(8),
    )?;
    Ok(())
}

/// Write `frame` in whichever format `png` selects.
pub fn write_image<P: AsRef<Path>>(path: P, frame: &Frame, png: bool) -> Result<()> {
    let path = path.as_ref();
    if png {
        write_png(path, frame)?;
    } else {
        write_ppm(path, frame)?;
    }
    info!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vec3;
    use std::fs;

    fn frame() -> Frame {
        let mut f = Frame::new(2, 2);
        f.pixels[0] = Vec3::new(255.0, 0.0, 0.0);
        f.pixels[3] = Vec3::new(1.0, 2.0, 3.0);
        f
    }

    #[test]
    fn ppm_is_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ppm");
        write_image(&path, &frame(), false).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("P3"));
        let numbers: Vec<u32> = text
            .split_whitespace()
            .skip(1)
            .map(|n| n.parse::<u32>().unwrap())
            .collect();
        // width, height, maxval, then the samples
        assert_eq!(&numbers[..3], &[2, 2, 255]);
        assert_eq!(&numbers[3..6], &[255, 0, 0]);
        assert_eq!(&numbers[12..], &[1, 2, 3]);
    }

    #[test]
    fn png_has_a_png_signature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        write_image(&path, &frame(), true).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
