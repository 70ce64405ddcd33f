// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate idyll;
extern crate log;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use idyll::dice::{Dice, SEED_STREAM};
use idyll::{output, render_image, FractalField, IdyllError, RenderConfig, Renderer, Seed};
use log::info;
use std::fs;
use std::path::Path;
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const SAMPLES: &str = "samples";
const BOUNCES: &str = "bounces";
const FOV: &str = "fov";
const THREADS: &str = "threads";
const SEED: &str = "seed";
const SEED_FILE: &str = "seed-file";
const RNG_SEED: &str = "rng-seed";
const CONFIG: &str = "config";
const WRITE_CONFIG: &str = "write-config";
const SAVE_SEED: &str = "save-seed";
const VERBOSE: &str = "verbose";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("idyll")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Procedural fractal path tracer")
        .arg(
            Arg::with_name(OUTPUT)
                .required_unless(WRITE_CONFIG)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; .png or .ppm picks the format"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image, WIDTHxHEIGHT"),
        )
        .arg(
            Arg::with_name(SAMPLES)
                .long(SAMPLES)
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        65_536,
                        "Could not parse sample count",
                        "Sample count must be between 1 and 65536",
                    )
                })
                .help("Paths traced per pixel"),
        )
        .arg(
            Arg::with_name(BOUNCES)
                .long(BOUNCES)
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        64,
                        "Could not parse bounce count",
                        "Bounce count must be between 1 and 64",
                    )
                })
                .help("Surface bounces per path"),
        )
        .arg(
            Arg::with_name(FOV)
                .long(FOV)
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        179,
                        "Could not parse field of view",
                        "Field of view must be between 1 and 179 degrees",
                    )
                })
                .help("Vertical field of view in degrees"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in renderer"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .allow_hyphen_values(true)
                .conflicts_with(SEED_FILE)
                .help("Seed string to render instead of a random one"),
        )
        .arg(
            Arg::with_name(SEED_FILE)
                .long(SEED_FILE)
                .takes_value(true)
                .help("File holding the seed string to render"),
        )
        .arg(
            Arg::with_name(RNG_SEED)
                .long(RNG_SEED)
                .takes_value(true)
                .validator(|s| {
                    u64::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Could not parse random seed".to_string())
                })
                .help("Fixes every random draw, for reproducible runs"),
        )
        .arg(
            Arg::with_name(CONFIG)
                .long(CONFIG)
                .short("c")
                .takes_value(true)
                .help("Configuration file"),
        )
        .arg(
            Arg::with_name(WRITE_CONFIG)
                .long(WRITE_CONFIG)
                .takes_value(true)
                .help("Write a default configuration file and exit"),
        )
        .arg(
            Arg::with_name(SAVE_SEED)
                .long(SAVE_SEED)
                .takes_value(true)
                .help("Also store this run's seed string in a file"),
        )
        .arg(
            Arg::with_name(VERBOSE)
                .short("v")
                .help("Log progress and scene details"),
        )
        .get_matches()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn configure(matches: &ArgMatches) -> Result<RenderConfig, IdyllError> {
    let mut config = match matches.value_of(CONFIG) {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };

    // The validators have already vetted every value below.
    if let Some((w, h)) = matches.value_of(SIZE).and_then(|s| parse_pair(s, 'x')) {
        config.width = w;
        config.height = h;
    }
    if let Some(v) = matches.value_of(SAMPLES).and_then(|s| s.parse().ok()) {
        config.samples = v;
    }
    if let Some(v) = matches.value_of(BOUNCES).and_then(|s| s.parse().ok()) {
        config.bounces = v;
    }
    if let Some(v) = matches.value_of(FOV).and_then(|s| s.parse().ok()) {
        config.fov = v;
    }
    if let Some(v) = matches.value_of(THREADS).and_then(|s| s.parse().ok()) {
        config.threads = v;
    }
    if let Some(text) = matches.value_of(SEED) {
        config.seed = Some(text.to_string());
    }
    if let Some(path) = matches.value_of(SEED_FILE) {
        config.seed = Some(fs::read_to_string(path)?.trim().to_string());
    }
    if let Some(output) = matches.value_of(OUTPUT) {
        match Path::new(output).extension().and_then(|e| e.to_str()) {
            Some("png") => config.png = true,
            Some("ppm") => config.png = false,
            _ => {}
        }
    }

    config.validate()?;
    Ok(config)
}

fn run(matches: &ArgMatches) -> Result<(), IdyllError> {
    if let Some(path) = matches.value_of(WRITE_CONFIG) {
        fs::write(path, RenderConfig::default_text())?;
        info!("wrote default configuration to {}", path);
        return Ok(());
    }

    let config = configure(matches)?;
    let run_seed = match matches.value_of(RNG_SEED) {
        Some(s) => u64::from_str(s).unwrap_or(0),
        None => Dice::fresh_run_seed(),
    };
    info!("run seed {}", run_seed);

    let seed = match config.seed {
        Some(ref text) => Seed::parse(text)?,
        None => Seed::generate(&mut Dice::new(run_seed, SEED_STREAM)),
    };
    let seed_text = seed.encode(&mut Dice::new(run_seed, SEED_STREAM));
    println!("{}", seed_text);
    if let Some(path) = matches.value_of(SAVE_SEED) {
        fs::write(path, format!("{}\n", seed_text))?;
    }

    let field = FractalField::new(&seed);
    let renderer = Renderer::new(&field, &seed, config.settings(), run_seed);

    let mut reported = 0;
    let frame = render_image(
        config.width,
        config.height,
        config.threads,
        &renderer,
        |done, total| {
            let percent = done * 100 / total;
            if percent >= reported + 10 || done == total {
                reported = percent;
                info!("{}% of the first chunk done", percent);
            }
        },
    )?;

    let output = matches.value_of(OUTPUT).unwrap_or("idyll.png");
    output::write_image(output, &frame, config.png)?;
    Ok(())
}

fn main() {
    let matches = args();
    init_logging(matches.is_present(VERBOSE));

    if let Err(e) = run(&matches) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
