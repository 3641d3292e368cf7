// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;
use std::time::{Duration, Instant};

use bifurcate::sink::{Key, MouseButton, ScrollDirection};
use bifurcate::{Config, ExecutionMode, Flow, HeadlessSink, InputEvent, Pixel, Session};
use clap::{App, Arg, ArgMatches};
use failure::err_msg;
use tracing_subscriber::EnvFilter;

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

fn validate_range<T: FromStr + PartialOrd>(
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

fn center(config: &Config) -> Pixel {
    Pixel((config.width / 2) as i32, (config.height / 2) as i32)
}

fn ints(args: &[&str]) -> Option<Vec<i32>> {
    args.iter().map(|a| i32::from_str(a).ok()).collect()
}

/// Turns one token of the script into the events of one frame.
fn parse_step(token: &str, config: &Config) -> Option<Vec<InputEvent>> {
    let mut parts = token.split(':');
    let name = parts.next()?;
    let args: Vec<&str> = parts.collect();
    let step = match (name, args.len()) {
        ("in", 0) => vec![InputEvent::Scroll(ScrollDirection::Up)],
        ("out", 0) => vec![InputEvent::Scroll(ScrollDirection::Down)],
        ("up", 0) => vec![InputEvent::KeyUp(Key::Up)],
        ("down", 0) => vec![InputEvent::KeyUp(Key::Down)],
        ("left", 0) => vec![InputEvent::KeyUp(Key::Left)],
        ("right", 0) => vec![InputEvent::KeyUp(Key::Right)],
        ("home", 0) => vec![InputEvent::KeyUp(Key::Home)],
        ("quit", 0) => vec![InputEvent::KeyUp(Key::Q)],
        ("wait", 0) => vec![],
        ("box", 4) => {
            let corners = ints(&args)?;
            let (from, to) = (Pixel(corners[0], corners[1]), Pixel(corners[2], corners[3]));
            vec![
                InputEvent::MouseDown(from, MouseButton::Left),
                InputEvent::MouseMove(to),
                InputEvent::MouseUp(to, MouseButton::Left),
            ]
        }
        ("pan", 2) => {
            let delta = ints(&args)?;
            let from = center(config);
            let to = Pixel(from.0 + delta[0], from.1 + delta[1]);
            vec![
                InputEvent::MouseDown(from, MouseButton::Right),
                InputEvent::MouseMove(to),
                InputEvent::MouseUp(to, MouseButton::Right),
            ]
        }
        ("resize", 1) => {
            let (width, height) = parse_pair::<usize>(args[0], 'x')?;
            vec![InputEvent::Resize(width, height)]
        }
        _ => return None,
    };
    Some(step)
}

fn parse_script(script: &str, config: &Config) -> Option<Vec<Vec<InputEvent>>> {
    script
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| parse_step(token, config))
        .collect()
}

const SIZE: &str = "size";
const PARAM: &str = "param";
const VALUE: &str = "value";
const SUBSAMPLE: &str = "subsample";
const BURN_IN: &str = "burn-in";
const WINDOW: &str = "window";
const TOLERANCE: &str = "tolerance";
const COMPUTE_BUDGET: &str = "compute-budget";
const FRAME_BUDGET: &str = "frame-budget";
const FPS: &str = "fps";
const WORKER: &str = "worker";
const QUEUE: &str = "queue";
const SCRIPT: &str = "script";

fn args<'a>() -> ArgMatches<'a> {
    App::new("bifurcate")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Incremental bifurcation diagram renderer")
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1280x768")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse surface size"))
                .help("Size of the surface"),
        )
        .arg(
            Arg::with_name(PARAM)
                .long(PARAM)
                .short("p")
                .takes_value(true)
                .default_value("2.0,4.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse parameter range"))
                .help("Initial parameter range, left to right"),
        )
        .arg(
            Arg::with_name(VALUE)
                .long(VALUE)
                .short("v")
                .takes_value(true)
                .default_value("0.0,1.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse value range"))
                .help("Initial value range, bottom to top"),
        )
        .arg(
            Arg::with_name(SUBSAMPLE)
                .long(SUBSAMPLE)
                .takes_value(true)
                .default_value("1.0")
                .validator(|s| {
                    validate_range(
                        &s,
                        1.0 / 16.0,
                        64.0,
                        "Could not parse subsample factor",
                        "Subsample factor must be between 0.0625 and 64",
                    )
                })
                .help("Vertical oversampling factor"),
        )
        .arg(
            Arg::with_name(BURN_IN)
                .long(BURN_IN)
                .takes_value(true)
                .default_value("1000")
                .validator(|s| {
                    validate_range(
                        &s,
                        0,
                        1_000_000,
                        "Could not parse burn-in count",
                        "Burn-in count must be between 0 and 1000000",
                    )
                })
                .help("Iterations discarded before sampling"),
        )
        .arg(
            Arg::with_name(WINDOW)
                .long(WINDOW)
                .takes_value(true)
                .default_value("16")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        32,
                        "Could not parse convergence window",
                        "Convergence window must be between 1 and 32",
                    )
                })
                .help("Recent values compared against for early exit"),
        )
        .arg(
            Arg::with_name(TOLERANCE)
                .long(TOLERANCE)
                .takes_value(true)
                .default_value("1e-8")
                .validator(|s| {
                    validate_range(
                        &s,
                        1e-15,
                        1e-2,
                        "Could not parse convergence tolerance",
                        "Convergence tolerance must be between 1e-15 and 1e-2",
                    )
                })
                .help("Distance under which two values are the same state"),
        )
        .arg(
            Arg::with_name(COMPUTE_BUDGET)
                .long(COMPUTE_BUDGET)
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        10_000,
                        "Could not parse compute budget",
                        "Compute budget must be between 1 and 10000 milliseconds",
                    )
                })
                .help("Milliseconds of inline computation per frame"),
        )
        .arg(
            Arg::with_name(FRAME_BUDGET)
                .long(FRAME_BUDGET)
                .takes_value(true)
                .default_value("33")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1000,
                        "Could not parse frame budget",
                        "Frame budget must be between 1 and 1000 milliseconds",
                    )
                })
                .help("Milliseconds spent draining worker results per frame"),
        )
        .arg(
            Arg::with_name(FPS)
                .long(FPS)
                .takes_value(true)
                .default_value("30")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        240,
                        "Could not parse frame rate",
                        "Frame rate must be between 1 and 240",
                    )
                })
                .help("Target frame rate"),
        )
        .arg(
            Arg::with_name(WORKER)
                .long(WORKER)
                .short("w")
                .help("Compute columns on a background thread"),
        )
        .arg(
            Arg::with_name(QUEUE)
                .long(QUEUE)
                .takes_value(true)
                .default_value("64")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        65_536,
                        "Could not parse queue capacity",
                        "Queue capacity must be between 1 and 65536",
                    )
                })
                .help("Capacity of the worker's result queue"),
        )
        .arg(
            Arg::with_name(SCRIPT)
                .long(SCRIPT)
                .takes_value(true)
                .help(
                    "Comma-separated input, one step per frame: in, out, up, down, left, \
                     right, home, quit, wait, box:X0:Y0:X1:Y1, pan:DX:DY, resize:WxH",
                ),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, failure::Error> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| err_msg(format!("Could not parse --{}", name)))
}

fn pair<T: FromStr>(
    matches: &ArgMatches,
    name: &str,
    separator: char,
) -> Result<(T, T), failure::Error> {
    matches
        .value_of(name)
        .and_then(|s| parse_pair(s, separator))
        .ok_or_else(|| err_msg(format!("Could not parse --{}", name)))
}

fn config(matches: &ArgMatches) -> Result<Config, failure::Error> {
    let (width, height) = pair::<usize>(matches, SIZE, 'x')?;
    let mode = if matches.is_present(WORKER) {
        ExecutionMode::Worker {
            queue: value(matches, QUEUE)?,
        }
    } else {
        ExecutionMode::Cooperative
    };
    Ok(Config {
        width,
        height,
        param_range: pair(matches, PARAM, ',')?,
        value_range: pair(matches, VALUE, ',')?,
        subsample: value(matches, SUBSAMPLE)?,
        burn_in: value(matches, BURN_IN)?,
        window: value(matches, WINDOW)?,
        tolerance: value(matches, TOLERANCE)?,
        compute_budget: Duration::from_millis(value(matches, COMPUTE_BUDGET)?),
        frame_budget: Duration::from_millis(value(matches, FRAME_BUDGET)?),
        target_fps: value(matches, FPS)?,
        mode,
    })
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let config = config(matches)?;
    let script = matches.value_of(SCRIPT).unwrap_or("");
    let script = parse_script(script, &config)
        .ok_or_else(|| err_msg(format!("Could not parse script {:?}", script)))?;

    let started = Instant::now();
    let mut session = Session::new(config, HeadlessSink::new(script))?;
    let flow = session.run_while(|s| {
        !(s.scheduler().state().is_finished() && s.sink().script_exhausted())
    })?;

    let viewport = session.viewport();
    let (param_start, param_end) = viewport.param_range();
    println!(
        "Drawing {}x{} in [{:.4}, {:.4}] at {}x subsampling",
        viewport.width(),
        viewport.height(),
        param_start,
        param_end,
        viewport.subsample()
    );
    println!(
        "{} after {} columns over {} frames in {:.2}s",
        if flow == Flow::Quit { "Quit" } else { "Done" },
        session.sink().columns_presented(),
        session.frames(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
