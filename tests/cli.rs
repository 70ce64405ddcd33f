// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate assert_cmd;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

const SEED: &str = "(0.2;0.1;0.6;0.5;0.62;1;0.3;0.8;0.5;2;1.8;1.5;0.2;0.25;0.3;12;\
                    0.8;0.5;0.3;0.6;0.7;0.9;0.1;0.1;0.2;-0.2;-0.25;-0.15;0.1;-0.15;12;0)";

fn idyll() -> Command {
    Command::cargo_bin("idyll").unwrap()
}

#[test]
fn renders_a_small_ppm() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tiny.ppm");
    idyll()
        .args(&["--size", "12x8", "--samples", "1", "--bounces", "1", "-t", "1"])
        .args(&["--rng-seed", "5", "--seed", SEED])
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("0.62"));
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("P3"));
}

#[test]
fn same_rng_seed_same_picture() {
    let dir = tempfile::tempdir().unwrap();
    let mut images = Vec::new();
    for name in &["a.png", "b.png"] {
        let out = dir.path().join(name);
        idyll()
            .args(&["-s", "8x8", "--samples", "2", "--rng-seed", "11"])
            .arg("-o")
            .arg(&out)
            .assert()
            .success();
        images.push(fs::read(&out).unwrap());
    }
    assert_eq!(&images[0][..8], b"\x89PNG\r\n\x1a\n");
    assert_eq!(images[0], images[1]);
}

#[test]
fn saves_the_seed_for_later() {
    let dir = tempfile::tempdir().unwrap();
    let seed_file = dir.path().join("seed.txt");
    idyll()
        .args(&["-s", "6x4", "--samples", "1", "--rng-seed", "3"])
        .arg("--save-seed")
        .arg(&seed_file)
        .arg("-o")
        .arg(dir.path().join("first.ppm"))
        .assert()
        .success();
    let saved = fs::read_to_string(&seed_file).unwrap();

    idyll()
        .args(&["-s", "6x4", "--samples", "1"])
        .arg("--seed-file")
        .arg(&seed_file)
        .arg("-o")
        .arg(dir.path().join("second.ppm"))
        .assert()
        .success();
    assert!(saved.trim().len() > 2);
}

#[test]
fn bad_seed_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    idyll()
        .args(&["-s", "4x4", "--seed", "[1,2,3]"])
        .arg("-o")
        .arg(dir.path().join("never.ppm"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn bad_size_is_rejected() {
    idyll()
        .args(&["-s", "twelve", "-o", "x.ppm"])
        .assert()
        .failure();
}

#[test]
fn writes_a_default_config_that_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("idyll.cfg");
    idyll().arg("--write-config").arg(&cfg).assert().success();
    let text = fs::read_to_string(&cfg).unwrap();
    assert!(text.contains("seed ~"));

    let out = dir.path().join("from-config.ppm");
    idyll()
        .arg("-c")
        .arg(&cfg)
        .args(&["-s", "4x4", "--samples", "1", "-t", "1", "--rng-seed", "1"])
        .arg("-o")
        .arg(&out)
        .assert()
        .success();
    assert!(out.exists());
}

#[test]
fn unknown_config_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("bad.cfg");
    fs::write(&cfg, "colour 3\n").unwrap();
    idyll()
        .arg("-c")
        .arg(&cfg)
        .arg("-o")
        .arg(dir.path().join("never.ppm"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("colour"));
}
