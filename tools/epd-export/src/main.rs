//! epd-export - epdiy asset export tool
//!
//! Converts TTF/OTF fonts and PNG/JPG/BMP images to C source arrays for
//! the epdiy display driver.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use epd_export::font::{self, FontRequest, Selection, Validation};
use epd_export::image::{self as image_export, ImageOptions};
use epd_export::manifest;
use epd_export::CodePointInterval;

#[derive(Parser)]
#[command(name = "epd-export")]
#[command(about = "epdiy font and image export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a header file from one or more font files
    Font {
        /// Name of the generated font, used as C identifier
        name: String,

        /// Font size in points
        size: u32,

        /// Font files, first one has priority, later ones are fallbacks
        #[arg(required = true, num_args = 1..)]
        fonts: Vec<PathBuf>,

        /// Compress glyph bitmaps with zlib
        #[arg(long)]
        compress: bool,

        /// Extra unicode range MIN,MAX to include (repeatable)
        #[arg(long = "additional-intervals", value_name = "MIN,MAX")]
        additional_intervals: Vec<CodePointInterval>,

        /// Only export the characters of this string (plus space)
        #[arg(long)]
        string: Option<String>,

        /// Keep string characters found in any font, not only the first one
        #[arg(long, requires = "string")]
        validate_fallbacks: bool,

        /// Output header file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a header file from an image
    Image {
        /// Input image file
        #[arg(short, long)]
        input: PathBuf,

        /// Name of the generated arrays, used as C identifier
        #[arg(short, long)]
        name: String,

        /// Output header file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum width of the generated image
        #[arg(long, default_value_t = 1200)]
        max_width: u32,

        /// Maximum height of the generated image
        #[arg(long, default_value_t = 825)]
        max_height: u32,

        /// Number of gray levels (2-16)
        #[arg(short, long, default_value_t = 16)]
        levels: u8,

        /// Quantize without Floyd-Steinberg dithering
        #[arg(long)]
        no_dither: bool,
    },

    /// Build assets from a manifest file
    Build {
        /// Path to epd-assets.toml manifest
        #[arg(default_value = "epd-assets.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without building
    Check {
        /// Path to epd-assets.toml manifest
        #[arg(default_value = "epd-assets.toml")]
        manifest: PathBuf,
    },
}

fn main() -> Result<()> {
    // Log to stderr, generated sources may go to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let command_line = std::env::args().collect::<Vec<_>>().join(" ");
    let cli = Cli::parse();

    match cli.command {
        Commands::Font {
            name,
            size,
            fonts,
            compress,
            additional_intervals,
            string,
            validate_fallbacks,
            output,
        } => {
            let selection = match string {
                Some(text) => {
                    let validation = if validate_fallbacks {
                        Validation::AnySource
                    } else {
                        Validation::Primary
                    };
                    Selection::text(text, validation)
                }
                None => Selection::default(),
            };
            let request = FontRequest {
                name,
                size,
                sources: fonts,
                compress,
                selection: selection.with_additional(additional_intervals),
            };
            font::convert_font(&request, output.as_deref(), &command_line)?;
        }

        Commands::Image {
            input,
            name,
            output,
            max_width,
            max_height,
            levels,
            no_dither,
        } => {
            let options = ImageOptions {
                max_width,
                max_height,
                levels,
                dither: !no_dither,
            };
            image_export::convert_image(&input, &name, output.as_deref(), &options)?;
        }

        Commands::Build { manifest, output } => {
            tracing::info!("Building assets from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete!");
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }
    }

    Ok(())
}
