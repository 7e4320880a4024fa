use anyhow::{Context, Result};
use clap::Parser;
use sizeview::data_runtime;
use sizeview::platform_winit::{self, RunOptions};
use std::path::PathBuf;

/// Interactive scale-comparison viewer: pick models from the panel and see
/// them side by side at true relative size.
#[derive(Parser, Debug)]
#[command(name = "sizeview", version, about)]
struct Cli {
    /// Data directory holding models/, config/, and the catalog.
    /// Defaults to ./data (or SIZEVIEW_DATA).
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Catalog JSON to load instead of <data-root>/models.json.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Present without vsync (uncapped frame rate where supported).
    #[arg(long)]
    no_vsync: bool,
}

fn run(cli: Cli) -> Result<()> {
    let data_root = cli.data_root.unwrap_or_else(data_runtime::data_root);
    let catalog = match &cli.catalog {
        Some(path) => {
            let txt = std::fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?;
            data_runtime::catalog::parse(&txt)
                .with_context(|| format!("parse {}", path.display()))?
        }
        None => data_runtime::catalog::load_default(&data_root)?,
    };
    let cfg = data_runtime::viewer_cfg::load_default(&data_root)?;
    log::info!(
        "catalog: {} models; data root {}",
        catalog.len(),
        data_root.display()
    );
    platform_winit::run(RunOptions {
        data_root,
        catalog,
        cfg,
        vsync: !cli.no_vsync,
    })
}

fn main() {
    // Developer-friendly default logging (info+) unless RUST_LOG overrides.
    // Suppress noisy GPU backend logs by default; honor RUST_LOG if set.
    let default = "info,sizeview=info,wgpu_hal=off,wgpu_core=off,wgpu=off,naga=off";
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_secs()
        .try_init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
