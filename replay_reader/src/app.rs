//! Command-line front end: arguments, logging setup and replay rendering.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    output::{self, OutputFormat, ReplaySummary},
    store::ReplayStore,
};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "replay-reader",
    author,
    version,
    about = "Reconstruct recorded browser sessions into a single timeline",
    long_about = None
)]
pub struct Args {
    /// Replay ids to read (directory names below the root)
    #[arg(required = true, value_name = "REPLAY_ID")]
    pub replay_ids: Vec<String>,

    /// Root directory containing one directory per replay
    #[arg(long, value_name = "PATH", env = "REPLAY_ROOT", default_value = "./replays")]
    pub root: PathBuf,

    /// Output format: text or json
    #[arg(long, short, default_value = "text")]
    pub format: OutputFormat,

    /// Also print the breadcrumb timeline
    #[arg(long)]
    pub crumbs: bool,

    /// Maximum number of cached replay readers
    #[arg(long, default_value_t = 16)]
    pub cache_size: usize,

    /// Cache time-to-live in seconds
    #[arg(long, default_value_t = 300)]
    pub cache_ttl: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub replay_ids: Vec<String>,
    pub root: PathBuf,
    pub format: OutputFormat,
    pub show_crumbs: bool,
    pub cache_size: usize,
    pub cache_ttl: Duration,
}

impl From<Args> for AppConfig {
    fn from(value: Args) -> Self {
        Self {
            replay_ids: value.replay_ids,
            root: value.root,
            format: value.format,
            show_crumbs: value.crumbs,
            cache_size: value.cache_size,
            cache_ttl: Duration::from_secs(value.cache_ttl),
        }
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub async fn run(config: AppConfig) -> Result<()> {
    ensure_root(&config.root).await?;

    let store = ReplayStore::new(config.root.clone(), config.cache_size, config.cache_ttl);

    info!(
        root = %config.root.display(),
        replays = config.replay_ids.len(),
        cache_size = config.cache_size,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "Reading replays",
    );

    let rendered = render_replays(&store, &config).await;
    for block in &rendered.blocks {
        println!("{block}");
    }

    if rendered.failed > 0 {
        anyhow::bail!(
            "{} of {} replays could not be read",
            rendered.failed,
            config.replay_ids.len()
        );
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct Rendered {
    pub blocks: Vec<String>,
    pub failed: usize,
}

/// Render every requested replay; failures are logged and counted.
pub async fn render_replays(store: &ReplayStore, config: &AppConfig) -> Rendered {
    let mut rendered = Rendered::default();

    for replay_id in &config.replay_ids {
        match store.open(replay_id).await {
            Ok(Some(reader)) => {
                let summary = ReplaySummary::from_reader(&reader);
                let mut block = output::format_summary(&summary, config.format);
                if config.show_crumbs {
                    block.push('\n');
                    block.push_str(&output::format_timeline(
                        reader.raw_crumbs(),
                        reader.time_range().start_ms,
                        config.format,
                    ));
                }
                rendered.blocks.push(block);
            }
            Ok(None) => {
                warn!(replay_id = %replay_id, "Replay data incomplete, skipping");
                rendered.failed += 1;
            }
            Err(err) => {
                error!(replay_id = %replay_id, error = %err, "Failed to read replay");
                rendered.failed += 1;
            }
        }
    }

    rendered
}

pub async fn ensure_root(path: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("failed to inspect replay root at {}", path.display()))?;
    if !metadata.is_dir() {
        anyhow::bail!("replay root is not a directory: {}", path.display());
    }
    Ok(())
}
