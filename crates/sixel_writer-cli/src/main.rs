//! sixelconv - Draw images on SIXEL capable terminals
//!
//! Reads an image file (or stdin), reduces it to at most 256 colors and writes
//! it as SIXEL to stdout, optionally positioned and resized in cells or pixels.

mod cellsize;
mod units;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser};
use image::imageops::FilterType;
use image::DynamicImage;
use sixel_writer::{quantize_rgba, BitMode, EncodeMode, EncodeOptions, Placement, SixelError, SixelWriter};
use std::io::{self, BufWriter, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cellsize::CellSize;
use crate::units::{parse_length, Length};

// 128 + SIGINT, as shells report it.
const INTERRUPTED_EXIT: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "sixelconv")]
#[command(version, disable_version_flag = true)]
#[command(about = "View full-pixel color graphics on SIXEL capable terminals", long_about = None)]
struct Cli {
    /// Input image file (PNG, JPEG, GIF, WebP); `-` or nothing reads stdin
    input: Option<PathBuf>,

    /// Generate a sixel image for 8bit terminal or printer
    #[arg(short = '8', long = "8bit-mode", overrides_with = "seven_bit")]
    eight_bit: bool,

    /// Generate a sixel image for 7bit terminal or printer (default)
    #[arg(short = '7', long = "7bit-mode", overrides_with = "eight_bit")]
    seven_bit: bool,

    /// Treat the specified position as absolute
    #[arg(short = 'a', long = "absolute-position", overrides_with = "relative")]
    absolute: bool,

    /// Treat the specified position as relative to the cursor (default)
    #[arg(short = 'r', long = "relative-position", overrides_with = "absolute")]
    relative: bool,

    /// Left position in cells, or pixels with unit `px`
    #[arg(short = 'x', long, value_parser = parse_length, allow_hyphen_values = true)]
    left: Option<Length>,

    /// Top position in cells, or pixels with unit `px`
    #[arg(short = 'y', long, value_parser = parse_length, allow_hyphen_values = true)]
    top: Option<Length>,

    /// Width in cells, or pixels with unit `px`
    #[arg(short = 'w', long, value_parser = parse_length)]
    width: Option<Length>,

    /// Height in cells, or pixels with unit `px`
    #[arg(short = 'e', long, value_parser = parse_length)]
    height: Option<Length>,

    /// Alpha threshold; pixels below it stay transparent (0 disables)
    #[arg(short = 't', long, default_value_t = 0)]
    alpha_threshold: u8,

    /// Treat the color of the top-left pixel as transparent
    #[arg(short = 'c', long)]
    chromakey: bool,

    /// Number of colors (at most 256)
    #[arg(short = 'n', long, default_value_t = 256)]
    ncolor: u16,

    /// Output sixel data without header and DCS envelope
    #[arg(short = 'b', long)]
    body_only: bool,

    /// Speed priority mode (default)
    #[arg(short = 'f', long, overrides_with = "size")]
    fast: bool,

    /// Size priority mode
    #[arg(short = 's', long, overrides_with = "fast")]
    size: bool,

    /// Show version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,
}

impl Cli {
    fn wants_geometry(&self) -> bool {
        self.left.is_some() || self.top.is_some() || self.width.is_some() || self.height.is_some()
    }

    fn encode_options(&self) -> EncodeOptions {
        let mode = if self.alpha_threshold > 0 {
            EncodeMode::AlphaThreshold
        } else if self.size {
            EncodeMode::Quality
        } else {
            EncodeMode::Fast
        };
        EncodeOptions {
            bit_mode: if self.eight_bit {
                BitMode::Eight
            } else {
                BitMode::Seven
            },
            mode,
            ncolor: self.ncolor.clamp(1, 256),
            alpha_threshold: self.alpha_threshold,
            chroma_key: self.chromakey,
            body_only: self.body_only,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    // Ctrl-C only raises the flag; the draw stops at the next row, closes the
    // sixel data and restores the cursor.
    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = interrupt.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;

    let cell = if cli.wants_geometry() {
        cellsize::query()
    } else {
        CellSize::FALLBACK
    };

    let img = load_image(cli.input.as_ref())?;
    let img = resize(img, &cli, cell)?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let opts = cli.encode_options();
    log::info!(
        "drawing {}x{} image, {} colors, {:?} mode",
        width,
        height,
        opts.ncolor,
        opts.mode
    );
    let image = quantize_rgba(rgba.as_raw(), width as usize, height as usize, opts.ncolor)?;

    if interrupt.load(Ordering::SeqCst) {
        log::warn!("interrupted before drawing");
        return Ok(ExitCode::from(INTERRUPTED_EXIT));
    }

    let placement = Placement {
        absolute: cli.absolute && !cli.relative,
        x: cli.left.map(|l| l.columns(cell)),
        y: cli.top.map(|t| t.rows(cell)),
    };

    let stdout = io::stdout();
    let interactive = stdout.is_terminal();
    let mut out = BufWriter::new(stdout.lock());
    let drawn = SixelWriter::new(opts)
        .with_interrupt(interrupt)
        .draw(&mut out, &image, &placement, interactive);
    let flushed = out.flush();

    match drawn {
        Ok(()) => {
            flushed.context("Failed to write to stdout")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(SixelError::Interrupted) => {
            log::warn!("interrupted");
            Ok(ExitCode::from(INTERRUPTED_EXIT))
        }
        Err(e) => Err(e.into()),
    }
}

fn load_image(input: Option<&PathBuf>) -> anyhow::Result<DynamicImage> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            image::open(path).with_context(|| format!("Failed to open '{}'", path.display()))
        }
        _ => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read image from stdin")?;
            image::load_from_memory(&buf).context("Failed to decode image from stdin")
        }
    }
}

fn resize(img: DynamicImage, cli: &Cli, cell: CellSize) -> anyhow::Result<DynamicImage> {
    if cli.width.is_none() && cli.height.is_none() {
        return Ok(img);
    }
    let width = target_dimension(cli.width.map(|w| w.width_px(cell)), img.width())?;
    let height = target_dimension(cli.height.map(|h| h.height_px(cell)), img.height())?;
    log::debug!("resizing {}x{} to {}x{}", img.width(), img.height(), width, height);
    Ok(img.resize_exact(width, height, FilterType::Lanczos3))
}

fn target_dimension(requested: Option<i32>, source: u32) -> anyhow::Result<u32> {
    match requested {
        None => Ok(source),
        Some(px) if px > 0 => Ok(px as u32),
        Some(px) => bail!("image size must be positive, got {px} pixels"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sixelconv").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        let opts = cli.encode_options();
        assert_eq!(opts.mode, EncodeMode::Fast);
        assert_eq!(opts.bit_mode, BitMode::Seven);
        assert_eq!(opts.ncolor, 256);
        assert!(!cli.wants_geometry());
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(parse(&["-s"]).encode_options().mode, EncodeMode::Quality);
        assert_eq!(parse(&["-s", "-f"]).encode_options().mode, EncodeMode::Fast);
        assert_eq!(
            parse(&["-s", "-t", "10"]).encode_options().mode,
            EncodeMode::AlphaThreshold
        );
    }

    #[test]
    fn test_flags() {
        let cli = parse(&["-8", "-c", "-b", "-n", "1000", "-a", "-x", "40px", "-y", "-2", "img.png"]);
        let opts = cli.encode_options();
        assert_eq!(opts.bit_mode, BitMode::Eight);
        assert!(opts.chroma_key && opts.body_only);
        assert_eq!(opts.ncolor, 256);
        assert!(cli.absolute);
        assert_eq!(cli.left, Some(Length::Pixels(40)));
        assert_eq!(cli.top, Some(Length::Cells(-2)));
        assert_eq!(cli.input, Some(PathBuf::from("img.png")));
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["sixelconv", "-v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_target_dimension() {
        assert_eq!(target_dimension(None, 33).unwrap(), 33);
        assert_eq!(target_dimension(Some(80), 33).unwrap(), 80);
        assert!(target_dimension(Some(0), 33).is_err());
    }

    #[test]
    fn test_resize_keeps_missing_dimension() {
        let img = DynamicImage::new_rgba8(30, 12);
        let cli = parse(&["-w", "6"]);
        let resized = resize(img, &cli, CellSize::FALLBACK).unwrap();
        assert_eq!((resized.width(), resized.height()), (60, 12));
    }
}
