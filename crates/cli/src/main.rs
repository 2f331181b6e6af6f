//! loupe command-line entry point.
//!
//! Loads one resource through the full cache/revalidate/decode pipeline and
//! reports where the bytes came from. Logging goes to stderr so the report on
//! stdout stays machine-readable with `--json`.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use loupe_client::{LoadOptions, ResourceLoader};
use loupe_core::{AppConfig, StorageLocation};
use tracing_subscriber::EnvFilter;

mod report;

use report::Report;

#[derive(Debug, Parser)]
#[command(name = "loupe", about = "Load an image through the loupe two-tier cache", version)]
struct Cli {
    /// URL of the resource to load.
    url: String,

    /// Display width to downsample toward (requires --height).
    #[arg(long, value_name = "PX", requires = "height")]
    width: Option<u32>,

    /// Display height to downsample toward (requires --width).
    #[arg(long, value_name = "PX", requires = "width")]
    height: Option<u32>,

    /// Pixels per display unit.
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Storage location to persist into.
    #[arg(long, value_enum, default_value_t = Location::Cache)]
    location: Location,

    /// Write the decoded image here; the format follows the extension.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Emit the report (and logs) as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Location {
    Cache,
    Document,
}

impl From<Location> for StorageLocation {
    fn from(location: Location) -> Self {
        match location {
            Location::Cache => StorageLocation::Cache,
            Location::Document => StorageLocation::Document,
        }
    }
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        match (self.width, self.height) {
            (Some(w), Some(h)) => LoadOptions::downsampled(w, h, self.scale),
            _ => LoadOptions { target_size: None, scale: self.scale },
        }
    }
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(user_agent = %config.user_agent, key_strategy = ?config.key_strategy, "starting loupe");

    let loader = ResourceLoader::from_config(&config)
        .await?
        .with_location(cli.location.into());

    let location = loader.location();
    if loader.cache().roots().resolve(location).is_none() {
        tracing::warn!(%location, "no storage root; results will not persist across runs");
    }

    let loaded = match loader.load(&cli.url, cli.load_options()).await {
        Ok(loaded) => loaded,
        Err(e) => bail!("failed to load {}: {}", cli.url, e),
    };

    if let Some(path) = &cli.output {
        loaded
            .resource
            .save(path)
            .with_context(|| format!("writing decoded image to {}", path.display()))?;
    }

    let report = Report::new(&cli.url, &loaded, cli.output.as_deref());
    if cli.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print!("{}", report.render_text());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["loupe", "https://x/a.png"]);
        assert_eq!(cli.load_options(), LoadOptions::default());
        assert!(matches!(cli.location, Location::Cache));
        assert!(!cli.json);
    }

    #[test]
    fn test_target_size_options() {
        let cli = Cli::parse_from(["loupe", "https://x/a.png", "--width", "64", "--height", "32", "--scale", "2"]);
        assert_eq!(cli.load_options(), LoadOptions::downsampled(64, 32, 2.0));
    }

    #[test]
    fn test_width_requires_height() {
        let result = Cli::try_parse_from(["loupe", "https://x/a.png", "--width", "64"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_document_location() {
        let cli = Cli::parse_from(["loupe", "https://x/a.png", "--location", "document"]);
        assert_eq!(StorageLocation::from(cli.location), StorageLocation::Document);
    }
}
