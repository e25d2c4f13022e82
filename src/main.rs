use std::path::Path;

use anyhow::{Result, anyhow};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "caption-overlay-rust",
    version,
    about = "Fit caption text into the regions of a template image"
)]
struct Cli {
    /// Template image to caption (png/jpeg/gif/webp/bmp/tiff)
    #[arg(short = 'i', long = "image")]
    image: Option<String>,

    /// Caption for the upper region
    #[arg(short = 'u', long = "upper")]
    upper: Option<String>,

    /// Caption for the lower region
    #[arg(short = 'l', long = "lower")]
    lower: Option<String>,

    /// Font scale applied to the starting size (0.25 - 2.0)
    #[arg(short = 's', long = "font-scale", default_value_t = 1.0)]
    font_scale: f32,

    /// Output file (default: <image>-captioned.<ext>)
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Output image mime (image/png, image/jpeg, image/webp, ...)
    #[arg(short = 'M', long = "output-mime")]
    output_mime: Option<String>,

    /// Font file to measure and paint with
    #[arg(long = "font-path")]
    font_path: Option<String>,

    /// Installed font family to measure and paint with
    #[arg(long = "font-family")]
    font_family: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Print fitted caption layout as JSON instead of writing an image
    #[arg(long = "show-layout")]
    show_layout: bool,

    /// Write the SVG scene instead of a raster image
    #[arg(long = "svg")]
    svg: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,

    /// Run the HTTP render server
    #[arg(long = "server")]
    server: bool,

    /// Server bind address (default from settings [server] addr)
    #[arg(long = "addr")]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    caption_overlay_rust::logging::init(cli.verbose)?;

    if cli.server {
        let settings =
            caption_overlay_rust::settings::load_settings(cli.read_settings.as_deref().map(Path::new))?;
        let addr = cli.addr.unwrap_or_else(|| settings.server_addr.clone());
        return caption_overlay_rust::run_server(settings, addr, cli.font_path, cli.font_family)
            .await;
    }

    let image = cli
        .image
        .ok_or_else(|| anyhow!("--image is required (or use --server)"))?;
    let output = caption_overlay_rust::run(caption_overlay_rust::Config {
        image,
        upper: cli.upper,
        lower: cli.lower,
        font_scale: cli.font_scale,
        output: cli.output,
        output_mime: cli.output_mime,
        font_path: cli.font_path,
        font_family: cli.font_family,
        settings_path: cli.read_settings,
        show_layout: cli.show_layout,
        svg: cli.svg,
    })?;

    println!("{}", output);
    Ok(())
}
