// SPDX-License-Identifier: MIT
//
// randimg: Random Noise Images from random.org
// Copyright (c) 2025 randimg Contributors

//! randimg - Random Noise Image Generator
//!
//! Fills a 128x128 RGB image with random bytes and writes it to `rand.png`.
//!
//! # Flow
//!
//! ```text
//! ┌──────────────┐   quota    ┌──────────────┐   y / n    ┌──────────────┐
//! │  random.org  │ ─────────> │    Prompt    │ ─────────> │    Source    │
//! │  (HTTPS)     │            │  (terminal)  │            │ remote/local │
//! └──────────────┘            └──────────────┘            └──────┬───────┘
//!                                                                │ 49152 bytes
//!                                                                v
//!                                                          ┌──────────────┐
//!                                                          │   rand.png   │
//!                                                          └──────────────┘
//! ```
//!
//! The remote source needs five sequential requests (10000 x 4 + 9152 integers).
//! Any failure ends the process with status 1 before a file is written.

mod prompt;

use anyhow::{Context, Result};
use clap::Parser;
use randimg_core::{
    config::ClientConfig,
    encode,
    fetcher::{FetcherConfig, RandomOrgClient},
    BufferSource, RandomBuffer, RandomBufferSource, SourceKind,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "randimg", version)]
#[command(about = "Generate a random noise PNG from random.org or a local generator", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Skip the prompt and use this source (remote or local)
    #[arg(short, long)]
    source: Option<SourceKind>,

    /// Seed for the local generator (ignored by the remote source)
    #[arg(long)]
    seed: Option<u64>,

    /// Output file (overrides RANDIMG_OUTPUT_PATH)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// random.org base URL (overrides RANDIMG_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,
}

impl Args {
    /// Apply command-line overrides on top of the environment configuration
    fn apply_to(&self, config: &mut ClientConfig) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        config.validate()?;
        Ok(())
    }
}

/// Resolve the source, build the buffer and write the image
///
/// Returns the path of the written file.
async fn run<R, W>(args: &Args, mut config: ClientConfig, input: R, output: W) -> Result<PathBuf>
where
    R: BufRead,
    W: Write,
{
    args.apply_to(&mut config)?;

    // only created once random.org is actually needed
    let mut client = None;

    let kind = match args.source {
        Some(kind) => kind,
        None => {
            let quota_client = build_client(&config).context("Failed to create HTTP client")?;
            let quota = quota_client
                .get_quota()
                .await
                .context("Failed to read random.org quota")?;
            info!("Quota: {} bits", quota);
            client = Some(quota_client);

            let use_remote =
                prompt::ask_use_remote(quota, input, output).context("Failed to read answer")?;
            SourceKind::from_local_flag(!use_remote)
        }
    };

    let source = BufferSource::select(kind, args.seed, || match client.take() {
        Some(client) => Ok(client),
        None => build_client(&config),
    })
    .context("Failed to create HTTP client")?;
    let buffer = generate(&source).await?;

    if let BufferSource::Remote(remote) = &source {
        let metrics = remote.client().metrics();
        info!(
            "random.org: {} requests, {} integers, p50 latency {} us, max {} us",
            metrics.requests_total(),
            metrics.integers_fetched(),
            metrics.latency_p50().unwrap_or_default(),
            metrics.latency_max().unwrap_or_default()
        );
    }

    encode::write_png(&buffer, &config.output_path)
        .with_context(|| format!("Failed to write {}", config.output_path.display()))?;

    Ok(config.output_path)
}

fn build_client(config: &ClientConfig) -> randimg_core::Result<RandomOrgClient> {
    let client = RandomOrgClient::new(FetcherConfig::from_client_config(config)?)?;
    info!("Using random.org at {}", client.config().base_url);
    Ok(client)
}

/// Load the environment configuration and run against the terminal
async fn run_from_env(args: &Args) -> Result<PathBuf> {
    let config =
        ClientConfig::from_env().context("Failed to load configuration from environment")?;
    let stdin = std::io::stdin();
    run(args, config, stdin.lock(), std::io::stdout()).await
}

async fn generate<S: RandomBufferSource>(source: &S) -> Result<RandomBuffer> {
    info!("Generating buffer from {} source", source.name());
    let started = Instant::now();
    let buffer = source
        .produce()
        .await
        .with_context(|| format!("Failed to fill buffer from {} source", source.name()))?;

    info!("Buffer ready in {} ms", started.elapsed().as_millis());
    Ok(buffer)
}

fn init_tracing(args: &Args) {
    let log_level = args
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    // stdout belongs to the prompt
    let builder = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command-line arguments
    let args = Args::parse();
    init_tracing(&args);

    info!("randimg v{}", randimg_core::VERSION);

    match run_from_env(&args).await {
        Ok(path) => info!("Saved {}", path.display()),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
