use anyhow::{Context, Result};
use clap::Parser;
use collagekit::{CollageConfig, CollageRequest, RenderSurface, SourceImage};
use log::info;
use std::path::{Path, PathBuf};

/// Compose images into a rounded-cell grid collage and save it as PNG
#[derive(Debug, Parser)]
#[command(name = "collagekit", version, about)]
struct Cli {
    /// Encoded images in grid order (row-major). Files ending in .b64 or .txt
    /// are read as base64 payloads or data URLs.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Title label drawn on top of the collage
    #[arg(short, long, default_value = "")]
    style: String,

    /// Prompt text carried along with the collage (repeatable)
    #[arg(short, long = "prompt")]
    prompts: Vec<String>,

    /// JSON configuration file; command-line flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    rows: Option<u32>,

    #[arg(long)]
    cols: Option<u32>,

    #[arg(long)]
    gap: Option<u32>,

    /// Square canvas size in pixels
    #[arg(long)]
    size: Option<u32>,

    #[arg(long)]
    radius: Option<f32>,

    /// Directory the collage is saved into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Override the exported file name
    #[arg(long)]
    file_name: Option<String>,
}

impl Cli {
    fn config(&self) -> Result<CollageConfig> {
        let mut config = match &self.config {
            Some(path) => CollageConfig::from_json_file(path)?,
            None => CollageConfig::default(),
        };
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.cols = cols;
        }
        if let Some(gap) = self.gap {
            config.gap = gap;
        }
        if let Some(size) = self.size {
            config.canvas_width = size;
            config.canvas_height = size;
        }
        if let Some(radius) = self.radius {
            config.corner_radius = radius;
        }
        if let Some(name) = &self.file_name {
            config.export_file_name = name.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn read_source(index: usize, path: &Path) -> Result<SourceImage> {
    let is_base64 = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("b64") || ext.eq_ignore_ascii_case("txt"));

    if is_base64 {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(SourceImage::from_base64(index, &text)?);
    }

    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(SourceImage::from(bytes))
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.config()?;

    let images = cli
        .images
        .iter()
        .enumerate()
        .map(|(i, path)| read_source(i, path))
        .collect::<Result<Vec<_>>>()?;

    let mut compositor = collagekit::new_compositor(&config)?;
    let mut surface = RenderSurface::new(config.canvas_width, config.canvas_height)?;
    let request = CollageRequest::new(images, cli.style.clone(), config.grid_spec())
        .with_prompts(cli.prompts.clone());

    let artifact = compositor
        .compose_blocking(&mut surface, &request)
        .context("Composition failed")?;
    let exported = artifact
        .export(&surface, &config.export_file_name)
        .context("Export failed")?;
    let path = exported.save(&cli.output_dir)?;

    info!("collage digest {}", exported.digest());
    for (i, prompt) in artifact.prompts.iter().enumerate() {
        info!("prompt {}: {}", i + 1, prompt);
    }
    println!("{}", path.display());
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("collagekit: {:#}", e);
        std::process::exit(1);
    }
}
