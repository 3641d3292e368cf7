// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn bifurcate() -> Command {
    let mut cmd = Command::cargo_bin("bifurcate").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn draws_the_default_domain() {
    bifurcate()
        .args(&["--size", "64x48"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Drawing 64x48 in [2.0000, 4.0000] at 1x subsampling"))
        .stdout(predicate::str::contains("Done after 64 columns"));
}

#[test]
fn follows_a_script_of_interactions() {
    bifurcate()
        .args(&["--size", "64x48", "--script", "in,wait,box:0:0:32:24,right,home,up"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Drawing 64x48 in [2.0000, 4.0000] at 2x subsampling"))
        .stdout(predicate::str::contains("Done after"));
}

#[test]
fn computes_on_a_worker() {
    bifurcate()
        .args(&["--size", "64x48", "--worker", "--queue", "4", "--script", "out,in,pan:8:0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Done after"));
}

#[test]
fn resizes() {
    bifurcate()
        .args(&["--size", "64x48", "--script", "resize:32x16"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Drawing 32x16"));
}

#[test]
fn quits_when_asked() {
    bifurcate()
        .args(&["--size", "64x48", "--script", "quit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Quit after 0 columns"));
}

#[test]
fn rejects_a_malformed_size() {
    bifurcate()
        .args(&["--size", "sixty-four"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse surface size"));
}

#[test]
fn rejects_a_parameter_range_outside_the_domain() {
    bifurcate()
        .args(&["--size", "64x48", "--param=1.0,5.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Render failure"));
}

#[test]
fn rejects_a_malformed_script() {
    bifurcate()
        .args(&["--size", "64x48", "--script", "in,sideways"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse script"));
}

#[test]
fn rejects_a_subsample_outside_its_bounds() {
    bifurcate()
        .args(&["--size", "64x48", "--subsample", "1000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Subsample factor must be between"));
}
