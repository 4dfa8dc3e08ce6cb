extern crate clap;
#[macro_use]
extern crate failure;
extern crate mandelzoom;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use mandelzoom::movie::{drive, FrameSequenceSpec, ProcessSpawner};
use num::Complex;
use std::env;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

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

fn validate_float(s: &str, err: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(_) => Ok(()),
        Err(_) => Err(err.to_string()),
    }
}

fn validate_positive_float(s: &str, err: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(v) if v > 0.0 => Ok(()),
        _ => Err(err.to_string()),
    }
}

const PROCESSES: &str = "processes";
const FRAMES: &str = "frames";
const ZOOM_START: &str = "zoom-start";
const ZOOM_END: &str = "zoom-end";
const XCENTER: &str = "xcenter";
const YCENTER: &str = "ycenter";
const MAX: &str = "max";
const WIDTH: &str = "width";
const HEIGHT: &str = "height";
const THREADS: &str = "threads";
const OUTDIR: &str = "outdir";
const MANDEL: &str = "mandel";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    let app = App::new("mandelmovie")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Renders a smooth Mandelbrot zoom as a numbered frame sequence")
        .arg(
            Arg::with_name(PROCESSES)
                .index(1)
                .required(false)
                .default_value("1")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        std::usize::MAX,
                        "Process count must be a number",
                        "Process count must be at least 1",
                    )
                })
                .help("Number of frame processes allowed to run at once"),
        )
        .arg(
            Arg::with_name(FRAMES)
                .required(false)
                .long(FRAMES)
                .takes_value(true)
                .default_value("50")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        std::usize::MAX,
                        "Could not parse frame count",
                        "Frame count must be at least 1",
                    )
                })
                .help("Number of frames in the sequence"),
        )
        .arg(
            Arg::with_name(ZOOM_START)
                .required(false)
                .long(ZOOM_START)
                .takes_value(true)
                .default_value("2")
                .validator(|s| validate_positive_float(&s, "Starting zoom must be a positive number"))
                .help("Scale of the first frame"),
        )
        .arg(
            Arg::with_name(ZOOM_END)
                .required(false)
                .long(ZOOM_END)
                .takes_value(true)
                .default_value("0.00000000001")
                .validator(|s| validate_positive_float(&s, "Final zoom must be a positive number"))
                .help("Scale the last frame closes in on"),
        )
        .arg(
            Arg::with_name(XCENTER)
                .required(false)
                .long(XCENTER)
                .short("x")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0.2929859127507")
                .validator(|s| validate_float(&s, "Could not parse x coordinate"))
                .help("X coordinate of the zoom target"),
        )
        .arg(
            Arg::with_name(YCENTER)
                .required(false)
                .long(YCENTER)
                .short("y")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0.6117848324958")
                .validator(|s| validate_float(&s, "Could not parse y coordinate"))
                .help("Y coordinate of the zoom target"),
        )
        .arg(
            Arg::with_name(MAX)
                .required(false)
                .long(MAX)
                .short("m")
                .takes_value(true)
                .default_value("10000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        std::u32::MAX,
                        "Could not parse iteration count",
                        "Iteration count must be at least 1",
                    )
                })
                .help("The maximum number of iterations per point"),
        )
        .arg(
            Arg::with_name(WIDTH)
                .required(false)
                .long(WIDTH)
                .short("W")
                .takes_value(true)
                .default_value("1024")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        std::usize::MAX,
                        "Could not parse image width",
                        "Image width must be at least 1",
                    )
                })
                .help("Width of every frame in pixels"),
        )
        .arg(
            Arg::with_name(HEIGHT)
                .required(false)
                .long(HEIGHT)
                .short("H")
                .takes_value(true)
                .default_value("1024")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        std::usize::MAX,
                        "Could not parse image height",
                        "Image height must be at least 1",
                    )
                })
                .help("Height of every frame in pixels"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("n")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of worker threads inside each frame process"),
        )
        .arg(
            Arg::with_name(OUTDIR)
                .required(false)
                .long(OUTDIR)
                .short("O")
                .takes_value(true)
                .default_value(".")
                .help("Directory that receives the numbered frames"),
        )
        .arg(
            Arg::with_name(MANDEL)
                .required(false)
                .long(MANDEL)
                .takes_value(true)
                .help("Single-frame renderer to run (default: the mandel binary next to this one)"),
        );

    match app.get_matches_safe() {
        Ok(matches) => matches,
        Err(e) => {
            eprintln!("{}", e.message);
            process::exit(1);
        }
    }
}

/// An explicit --mandel wins; otherwise prefer the renderer that
/// shipped next to this binary, and fall back to PATH lookup.
fn mandel_program(matches: &ArgMatches) -> PathBuf {
    if let Some(path) = matches.value_of(MANDEL) {
        return PathBuf::from(path);
    }
    if let Ok(me) = env::current_exe() {
        let sibling = me.with_file_name("mandel");
        if sibling.exists() {
            return sibling;
        }
    }
    PathBuf::from("mandel")
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let spec = FrameSequenceSpec {
        frames: usize::from_str(matches.value_of(FRAMES).unwrap())
            .expect("Could not parse frame count."),
        zoom_start: f64::from_str(matches.value_of(ZOOM_START).unwrap())
            .expect("Could not parse starting zoom."),
        zoom_end: f64::from_str(matches.value_of(ZOOM_END).unwrap())
            .expect("Could not parse final zoom."),
        center: Complex::new(
            f64::from_str(matches.value_of(XCENTER).unwrap())
                .expect("Could not parse x coordinate."),
            f64::from_str(matches.value_of(YCENTER).unwrap())
                .expect("Could not parse y coordinate."),
        ),
        limit: u32::from_str(matches.value_of(MAX).unwrap())
            .expect("Could not parse iteration count."),
        width: usize::from_str(matches.value_of(WIDTH).unwrap())
            .expect("Could not parse image width."),
        height: usize::from_str(matches.value_of(HEIGHT).unwrap())
            .expect("Could not parse image height."),
        threads: usize::from_str(matches.value_of(THREADS).unwrap())
            .expect("Could not parse thread count."),
        max_concurrent: usize::from_str(matches.value_of(PROCESSES).unwrap())
            .expect("Could not parse process count."),
        program: mandel_program(matches),
        outdir: PathBuf::from(matches.value_of(OUTDIR).unwrap()),
    };

    let results = drive(&spec, &mut ProcessSpawner)?;

    let mut failed = 0;
    for result in &results {
        if !result.exit.success {
            match result.exit.code {
                Some(code) => eprintln!(
                    "mandelmovie: frame {} exited with status {}",
                    result.frame, code
                ),
                None => eprintln!("mandelmovie: frame {} was killed by a signal", result.frame),
            }
            failed += 1;
        }
    }
    if failed > 0 {
        return Err(format_err!("{} of {} frames failed", failed, results.len()));
    }
    Ok(())
}

fn main() {
    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("mandelmovie: {}", e);
        process::exit(1);
    }
}
