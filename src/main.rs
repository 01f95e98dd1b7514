//! Main Program for Tiledescramble
//! Run with `--help` for more instruction

// Copyright (C) 2023 Dheatly23
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Error};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tiledescramble::codec::{self, OutputFormat, DEFAULT_JPEG_QUALITY};
use tiledescramble::fetch::{Fetcher, DEFAULT_TIMEOUT};
use tiledescramble::metadata::{PageInfo, DEFAULT_LOCATION_API};
use tiledescramble::{
    batch, crop, descramble, scramble, Config, ConfigBuilder, Pattern, PixelBuffer, Rect,
    DEFAULT_TILE_HEIGHT, DEFAULT_TILE_WIDTH,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Only print warnings and errors
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download a chapter and unscramble every page
    Chapter(ChapterArgs),
    /// Unscramble (or scramble) a single local image
    File(FileArgs),
}

#[derive(Args, Debug)]
struct ChapterArgs {
    /// Chapter id, the `cid` parameter of the viewer URL
    cid: String,

    /// Output directory (created if missing)
    #[arg(short = 'o', long, default_value = ".")]
    output: PathBuf,

    /// Pages processed at once [default: number of CPUs]
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Chapter location API, the chapter id is appended to it
    #[arg(long, default_value = DEFAULT_LOCATION_API)]
    api: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Keep the whole page instead of cutting out the content area
    #[arg(long)]
    no_crop: bool,

    #[command(flatten)]
    tiles: TileArgs,

    #[command(flatten)]
    out: OutputArgs,
}

#[derive(Args, Debug)]
struct FileArgs {
    /// Input file
    input: PathBuf,

    /// Output file
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Pattern id
    #[arg(
        short = 'p',
        long,
        value_parser = clap::value_parser!(u8).range(1..=4),
        required_unless_present = "key",
        conflicts_with = "key"
    )]
    pattern: Option<u8>,

    /// Page key to derive the pattern from (e.g. `item/xhtml/p-001.xhtml/0`)
    #[arg(short = 'k', long)]
    key: Option<String>,

    /// Cut out X,Y,WIDTH,HEIGHT after unscrambling
    #[arg(long)]
    crop: Option<Rect>,

    /// Scramble instead of unscramble
    #[arg(long)]
    scramble: bool,

    #[command(flatten)]
    tiles: TileArgs,

    #[command(flatten)]
    out: OutputArgs,
}

#[derive(Args, Debug)]
struct TileArgs {
    /// Tile width
    #[arg(long, default_value_t = DEFAULT_TILE_WIDTH)]
    tile_width: usize,

    /// Tile height
    #[arg(long, default_value_t = DEFAULT_TILE_HEIGHT)]
    tile_height: usize,
}

impl TileArgs {
    fn config(&self) -> Config {
        ConfigBuilder::new()
            .tile_width(self.tile_width)
            .tile_height(self.tile_height)
            .build()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Jpeg,
    Png,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output format [default: jpeg, or the output file's extension]
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// JPEG quality
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Store pages that are grey anyway with a single channel
    #[arg(long)]
    grayscale: bool,

    /// Largest channel spread still counted as grey
    #[arg(long, default_value_t = 8)]
    gray_tolerance: u8,
}

impl OutputArgs {
    fn format(&self, path: Option<&Path>) -> OutputFormat {
        let inferred = path
            .and_then(Path::extension)
            .and_then(|e| e.to_str())
            .filter(|e| e.eq_ignore_ascii_case("png"))
            .map(|_| Format::Png);
        match self.format.or(inferred).unwrap_or(Format::Jpeg) {
            Format::Jpeg => OutputFormat::Jpeg {
                quality: self.quality,
            },
            Format::Png => OutputFormat::Png,
        }
    }

    fn finish(&self, image: PixelBuffer) -> PixelBuffer {
        if self.grayscale {
            codec::reduce_to_gray(image, self.gray_tolerance)
        } else {
            image
        }
    }
}

fn init_logging(quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match cli.command {
        Command::Chapter(args) => run_chapter(args),
        Command::File(args) => run_file(args),
    }
}

fn run_chapter(args: ChapterArgs) -> Result<(), Error> {
    fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let fetcher = Fetcher::new(args.api.as_str(), Duration::from_secs(args.timeout))?;
    let chapter_url = fetcher.chapter_url(&args.cid)?;
    let pages = fetcher.configuration(&chapter_url)?.pages(&chapter_url);
    info!("{} pages.", pages.len());

    let config = args.tiles.config();
    let report = batch::run(
        &pages,
        args.threads.unwrap_or(0),
        |page| page.name.clone(),
        |page| save_page(&fetcher, page, &args, &config),
    )?;

    if !report.is_success() {
        bail!(
            "{} of {} pages failed: {}",
            report.failed.len(),
            report.total,
            report.failed.join(", ")
        );
    }
    info!("All Done!");
    Ok(())
}

fn save_page(
    fetcher: &Fetcher,
    page: &PageInfo,
    args: &ChapterArgs,
    config: &Config,
) -> Result<(), Error> {
    let bytes = fetcher.get(&page.url)?;
    info!("Got {}", page.url);

    let scrambled =
        codec::decode(&bytes).with_context(|| format!("decoding {}", page.url))?;
    let mut image = descramble(&scrambled, page.pattern, config)?;

    if let Some(area) = page.content_area.filter(|_| !args.no_crop) {
        image = crop(image, area).unwrap_or_else(|e| {
            warn!("{}: {e}, keeping the whole page", page.name);
            e.into_buffer()
        });
    }

    let image = args.out.finish(image);
    let format = args.out.format(None);
    let path = args
        .output
        .join(format!("{}.{}", page.name, format.extension()));
    codec::save(&image, &path, format)?;
    info!("Saved {}", path.display());
    Ok(())
}

fn run_file(args: FileArgs) -> Result<(), Error> {
    let pattern = match (args.pattern, &args.key) {
        (Some(id), _) => Pattern::new(id).context("pattern must be in 1..=4")?,
        (None, Some(key)) => Pattern::from_key(key),
        (None, None) => bail!("either --pattern or --key is required"),
    };

    let input = codec::load(&args.input)?;
    let config = args.tiles.config();
    let mut image = if args.scramble {
        scramble(&input, pattern, &config)?
    } else {
        descramble(&input, pattern, &config)?
    };

    if let Some(rect) = args.crop {
        image = crop(image, rect)?;
    }

    let image = args.out.finish(image);
    codec::save(&image, &args.output, args.out.format(Some(args.output.as_path())))?;
    info!(
        "{} -> {} (pattern {pattern})",
        args.input.display(),
        args.output.display()
    );
    Ok(())
}
