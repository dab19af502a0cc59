//! epd - send images to an epdiy display over HTTP

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use epd_cli::{DisplayClient, prepare_frame};

#[derive(Parser)]
#[command(name = "epd")]
#[command(about = "Control an epdiy display over HTTP")]
#[command(version)]
struct Cli {
    /// Hostname or URL of the display
    hostname: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print display size and temperature
    Info,

    /// Clear the screen
    Clear,

    /// Draw an image filling the whole screen
    Draw {
        /// Clear the screen before drawing
        #[arg(short, long)]
        clear: bool,

        /// Image file (PNG/JPG/BMP)
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = DisplayClient::new(&cli.hostname)?;

    match cli.command {
        Commands::Info => {
            let info = client
                .info()
                .with_context(|| format!("Failed to query {}", client.base_url()))?;
            println!("width: {}", info.width);
            println!("height: {}", info.height);
            println!("temperature: {}", info.temperature);
        }

        Commands::Clear => {
            client
                .clear()
                .with_context(|| format!("Failed to clear {}", client.base_url()))?;
            tracing::info!("Screen cleared");
        }

        Commands::Draw { clear, file } => {
            let image =
                image::open(&file).with_context(|| format!("Failed to open image: {:?}", file))?;
            let info = client
                .info()
                .with_context(|| format!("Failed to query {}", client.base_url()))?;
            tracing::info!(
                "Display is {}x{} at {} C",
                info.width,
                info.height,
                info.temperature
            );

            let frame = prepare_frame(&image, &info);
            let request = frame.full_screen(clear);
            client
                .draw(&request, frame.data)
                .with_context(|| format!("Failed to draw on {}", client.base_url()))?;
            tracing::info!("Done!");
        }
    }

    Ok(())
}
