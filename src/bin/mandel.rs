extern crate clap;
#[macro_use]
extern crate failure;
extern crate image;
extern crate mandelzoom;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use image::bmp::BMPEncoder;
use image::ColorType;
use mandelzoom::{ImageSpec, RenderJob, Viewport};
use num::Complex;
use std::fs::File;
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

const THREADS: &str = "threads";
const MAX: &str = "max";
const XCENTER: &str = "xcenter";
const YCENTER: &str = "ycenter";
const SCALE: &str = "scale";
const WIDTH: &str = "width";
const HEIGHT: &str = "height";
const OUTPUT: &str = "output";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    let app = App::new("mandel")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Renders one escape-time image of the Mandelbrot set")
        .after_help(
            "EXAMPLES:\n    \
             mandel -x -0.5 -y -0.5 -s 0.2\n    \
             mandel -x -.38 -y -.665 -s .05 -m 100\n    \
             mandel -x 0.286932 -y 0.014287 -s .0005 -m 1000",
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
                .help("Number of worker threads to cut the image across"),
        )
        .arg(
            Arg::with_name(MAX)
                .required(false)
                .long(MAX)
                .short("m")
                .takes_value(true)
                .default_value("1000")
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
            Arg::with_name(XCENTER)
                .required(false)
                .long(XCENTER)
                .short("x")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0")
                .validator(|s| validate_float(&s, "Could not parse x coordinate"))
                .help("X coordinate of the image center point"),
        )
        .arg(
            Arg::with_name(YCENTER)
                .required(false)
                .long(YCENTER)
                .short("y")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0")
                .validator(|s| validate_float(&s, "Could not parse y coordinate"))
                .help("Y coordinate of the image center point"),
        )
        .arg(
            Arg::with_name(SCALE)
                .required(false)
                .long(SCALE)
                .short("s")
                .takes_value(true)
                .default_value("4")
                .validator(|s| validate_positive_float(&s, "Scale must be a positive number"))
                .help("Scale of the image in Mandelbrot coordinates"),
        )
        .arg(
            Arg::with_name(WIDTH)
                .required(false)
                .long(WIDTH)
                .short("W")
                .takes_value(true)
                .default_value("500")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        std::usize::MAX,
                        "Could not parse image width",
                        "Image width must be at least 1",
                    )
                })
                .help("Width of the image in pixels"),
        )
        .arg(
            Arg::with_name(HEIGHT)
                .required(false)
                .long(HEIGHT)
                .short("H")
                .takes_value(true)
                .default_value("500")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        std::usize::MAX,
                        "Could not parse image height",
                        "Image height must be at least 1",
                    )
                })
                .help("Height of the image in pixels"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .required(false)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("mandel.bmp")
                .help("Output file"),
        );

    match app.get_matches_safe() {
        Ok(matches) => matches,
        Err(e) => {
            // Help, version, and every configuration mistake land
            // here; all of them exit 1.
            eprintln!("{}", e.message);
            process::exit(1);
        }
    }
}

fn write_image(outfile: &str, pixels: &[u32], bounds: (usize, usize)) -> Result<(), std::io::Error> {
    let mut bytes = Vec::with_capacity(pixels.len() * 4);
    for p in pixels {
        bytes.push((p >> 24) as u8);
        bytes.push((p >> 16) as u8);
        bytes.push((p >> 8) as u8);
        bytes.push(*p as u8);
    }
    let mut output = File::create(outfile)?;
    let mut encoder = BMPEncoder::new(&mut output);
    encoder.encode(&bytes, bounds.0 as u32, bounds.1 as u32, ColorType::RGBA(8))?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let threads =
        usize::from_str(matches.value_of(THREADS).unwrap()).expect("Could not parse thread count.");
    let limit =
        u32::from_str(matches.value_of(MAX).unwrap()).expect("Could not parse iteration count.");
    let xcenter =
        f64::from_str(matches.value_of(XCENTER).unwrap()).expect("Could not parse x coordinate.");
    let ycenter =
        f64::from_str(matches.value_of(YCENTER).unwrap()).expect("Could not parse y coordinate.");
    let scale = f64::from_str(matches.value_of(SCALE).unwrap()).expect("Could not parse scale.");
    let width =
        usize::from_str(matches.value_of(WIDTH).unwrap()).expect("Could not parse image width.");
    let height =
        usize::from_str(matches.value_of(HEIGHT).unwrap()).expect("Could not parse image height.");
    let outfile = matches.value_of(OUTPUT).unwrap();

    println!(
        "mandel: x={} y={} scale={} max={} outfile={}",
        xcenter, ycenter, scale, limit, outfile
    );

    let viewport = Viewport::centered(Complex::new(xcenter, ycenter), scale)?;
    let spec = ImageSpec::new(width, height, limit)?;
    let job = RenderJob::new(viewport, spec, threads)?;
    let pixels = job.render();

    write_image(outfile, &pixels, (width, height))
        .map_err(|e| format_err!("couldn't write to {}: {}", outfile, e))?;
    Ok(())
}

fn main() {
    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("mandel: {}", e);
        process::exit(1);
    }
}
