use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use flashdeck::{FlashdeckConfig, HttpImageFetcher, ImageFetcher, OfflineFetcher, convert_bytes};
use tracing_subscriber::EnvFilter;

/// Convert LLM-produced flashcard JSON into a normalized deck.
///
/// Prints the deck as JSON on stdout. Warnings and diagnostics go to stderr.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "FLASHDECK_CONFIG")]
    config: Option<PathBuf>,

    /// Deck name; overrides any name found in the payload
    #[arg(short = 'n', long)]
    deck_name: Option<String>,

    /// Keep image URLs instead of downloading them
    #[arg(long)]
    no_images: bool,

    /// Directory to write downloaded images into
    #[arg(long)]
    media_dir: Option<PathBuf>,

    /// Pretty-print the deck JSON
    #[arg(long)]
    pretty: bool,

    /// Log pipeline progress, not just warnings
    #[arg(short, long)]
    verbose: bool,

    /// Input file; reads stdin when omitted or `-`
    input: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut cfg = match &args.config {
        Some(path) => FlashdeckConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => FlashdeckConfig::default(),
    };
    if args.no_images {
        cfg.normalize.fetch_images = false;
    }

    let raw = read_input(args.input.as_ref())?;

    let http;
    let fetcher: &dyn ImageFetcher = if cfg.normalize.fetch_images {
        http = HttpImageFetcher::new(&cfg.normalize).context("building image client")?;
        &http
    } else {
        &OfflineFetcher
    };

    let deck = convert_bytes(&raw, args.deck_name.as_deref(), &cfg, fetcher)?;

    if let Some(dir) = &args.media_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        for media in &deck.media {
            let path = dir.join(&media.filename);
            fs::write(&path, &media.bytes).with_context(|| format!("writing {}", path.display()))?;
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.pretty {
        serde_json::to_writer_pretty(&mut out, &deck)?;
    } else {
        serde_json::to_writer(&mut out, &deck)?;
    }
    writeln!(out)?;
    Ok(())
}

fn read_input(input: Option<&PathBuf>) -> Result<Vec<u8>> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            fs::read(path).with_context(|| format!("reading {}", path.display()))
        }
        _ => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
