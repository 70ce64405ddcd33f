// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run configuration.
//!
//! The configuration file is a list of `key value` lines.  Lines that
//! start with `#` are comments.  A file doesn't need to mention every
//! key; anything missing keeps its default.  Anything present has to
//! make sense, though: a bad value or a key we don't know is an error,
//! reported once, and the run stops.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::errors::{IdyllError, Result};
use crate::renderer::RenderSettings;

/// The integer keys, in the order the default file lists them.
pub const INT_KEYS: [&str; 7] = ["width", "height", "png", "samples", "fov", "bounces", "threads"];

/// Most render threads a configuration may ask for.
pub const MAX_THREADS: usize = 1024;

/// Everything a run needs besides the seed itself.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Write PNG (true) or plain-text PPM (false).
    pub png: bool,
    /// Paths per pixel.
    pub samples: usize,
    /// Vertical field of view in degrees.
    pub fov: u32,
    /// Surface hits per path.
    pub bounces: usize,
    /// Render threads.
    pub threads: usize,
    /// A seed string to render, or `None` for a fresh random seed.
    pub seed: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 1920,
            height: 1080,
            png: true,
            samples: 4,
            fov: 45,
            bounces: 2,
            threads: num_cpus::get().min(MAX_THREADS),
            seed: None,
        }
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> IdyllError {
    IdyllError::ConfigValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_int<T: FromStr>(key: &str, value: &str) -> Result<T> {
    if value.is_empty() {
        return Err(invalid(key, value, "missing value"));
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(key, value, "not a non-negative integer"));
    }
    T::from_str(value).map_err(|_| invalid(key, value, "out of range"))
}

impl RenderConfig {
    /// Read configuration text on top of the defaults, then validate.
    pub fn parse(text: &str) -> Result<RenderConfig> {
        let mut config = RenderConfig::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = match line.find(char::is_whitespace) {
                Some(i) => (&line[..i], line[i..].trim()),
                None => (line, ""),
            };
            match key {
                "width" => config.width = parse_int(key, value)?,
                "height" => config.height = parse_int(key, value)?,
                "samples" => config.samples = parse_int(key, value)?,
                "fov" => config.fov = parse_int(key, value)?,
                "bounces" => config.bounces = parse_int(key, value)?,
                "threads" => config.threads = parse_int(key, value)?,
                "png" => {
                    config.png = match parse_int::<u8>(key, value)? {
                        0 => false,
                        1 => true,
                        _ => return Err(invalid(key, value, "must be 0 or 1")),
                    }
                }
                "seed" => {
                    config.seed = match value {
                        "" => return Err(invalid(key, value, "missing value")),
                        "~" => None,
                        s => Some(s.to_string()),
                    }
                }
                // Written back by older runs; the seed is saved separately now.
                "lastSeed" => {}
                _ => {
                    return Err(IdyllError::ConfigKey {
                        key: key.to_string(),
                    })
                }
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RenderConfig> {
        let text = fs::read_to_string(path)?;
        RenderConfig::parse(&text)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("samples", self.samples),
            ("bounces", self.bounces),
            ("threads", self.threads),
        ];
        for (key, value) in positive.iter() {
            if *value == 0 {
                return Err(invalid(key, "0", "must be at least 1"));
            }
        }
        if self.threads > MAX_THREADS {
            return Err(invalid(
                "threads",
                &self.threads.to_string(),
                &format!("must be at most {}", MAX_THREADS),
            ));
        }
        if self.width.checked_mul(self.height).is_none() {
            return Err(invalid(
                "height",
                &self.height.to_string(),
                "too many pixels for this width",
            ));
        }
        if self.fov == 0 || self.fov >= 180 {
            return Err(invalid("fov", &self.fov.to_string(), "must be between 1 and 179"));
        }
        Ok(())
    }

    /// Look up one of the integer settings by name.
    pub fn get_int(&self, name: &str) -> Result<i64> {
        let value = match name {
            "width" => self.width as i64,
            "height" => self.height as i64,
            "png" => self.png as i64,
            "samples" => self.samples as i64,
            "fov" => i64::from(self.fov),
            "bounces" => self.bounces as i64,
            "threads" => self.threads as i64,
            _ => {
                return Err(IdyllError::ConfigKey {
                    key: name.to_string(),
                })
            }
        };
        Ok(value)
    }

    /// The renderer's share of the configuration.
    pub fn settings(&self) -> RenderSettings {
        RenderSettings {
            width: self.width,
            height: self.height,
            fov: f64::from(self.fov),
            samples: self.samples,
            bounces: self.bounces,
        }
    }

    /// A commented configuration file holding the defaults.
    pub fn default_text() -> String {
        let d = RenderConfig::default();
        format!(
            "#======== o u t p u t    f i l e ========#\n\
             \n\
             # resolution in pixels #\n\
             width {}\n\
             height {}\n\
             \n\
             # set to one to get a png file #\n\
             # set to zero to get a ppm file #\n\
             png {}\n\
             \n\
             #======== s e e d ========#\n\
             \n\
             # leave the character '~' to get a random seed #\n\
             # otherwise, replace it with a seed of your choice #\n\
             seed ~\n\
             \n\
             #======== r e n d e r i n g ========#\n\
             \n\
             # number of samples #\n\
             # more samples equals less noise #\n\
             samples {}\n\
             \n\
             # camera field of view in degrees #\n\
             fov {}\n\
             \n\
             # surface bounces per path traced ray #\n\
             bounces {}\n\
             \n\
             #======== c p u ========#\n\
             \n\
             # number of render threads #\n\
             threads {}\n",
            d.width, d.height, d.png as u8, d.samples, d.fov, d.bounces, d.threads
        )
    }
}
