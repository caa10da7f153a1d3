use clap::Parser;
use data::output::Output;
use eyre::{ensure, Result};
use image::{Rgb, RgbImage};
use log::info;
use std::path::PathBuf;

/// Convert heat equation simulation output to an image
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input file
    #[arg(short, long)]
    input: PathBuf,

    /// Path to the output PNG image, defaults to the input path with a .png
    /// extension
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Enable logging to stderr
    ui::init_logger();

    // Parse CLI arguments
    let args = Args::parse();
    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("png"));

    // Load the simulation output
    let input = Output::read(&args.input)?;
    let header = input.header();
    info!(
        "Loaded {}x{} temperature field at t = {}",
        header.rows, header.cols, header.time
    );
    let (rows, cols) = input.values().dim();
    ensure!(
        rows <= u32::MAX as usize && cols <= u32::MAX as usize,
        "{rows}x{cols} field is too large for an image"
    );

    // Generate image
    let mut image = RgbImage::new(cols as u32, rows as u32);
    for (&value, pixel) in input.values().iter().zip(image.pixels_mut()) {
        *pixel = Rgb(ui::heat_color(value));
    }

    // Save image
    image.save(&output)?;
    info!("Image saved to {}", output.display());
    Ok(())
}
