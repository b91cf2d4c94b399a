use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tilechunk_split::{DEFAULT_CHUNK_SIZE, DEFAULT_OUTPUT_DIR, SplitConfig, split_file};
use tracing_subscriber::EnvFilter;

/// `-h` is the chunk height, so help is only available as `--help`.
#[derive(Parser, Debug)]
#[command(
    name = "tilechunk-split",
    about = "Split a tile map into fixed-size chunk files plus a master descriptor",
    disable_help_flag = true
)]
struct Cli {
    /// Path to the JSON map to split (with or without the .json extension)
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    input: PathBuf,

    /// Directory where the chunks are generated; cleared on every run
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Width of the chunks, in tiles
    #[arg(
        short = 'w',
        long = "width",
        default_value_t = DEFAULT_CHUNK_SIZE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    width: u32,

    /// Height of the chunks, in tiles
    #[arg(
        short = 'h',
        long = "height",
        default_value_t = DEFAULT_CHUNK_SIZE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    height: u32,

    /// Print out the progress of creating the chunks
    #[arg(short, long)]
    verbose: bool,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,
}

impl Cli {
    fn split_config(&self) -> SplitConfig {
        SplitConfig {
            input: self.input.clone(),
            output: self.output.clone(),
            chunk_width: self.width,
            chunk_height: self.height,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let summary = split_file(&cli.split_config())
        .with_context(|| format!("failed to split {}", cli.input.display()))?;

    println!(
        "{} chunks ({} x {}, {} layers) written to {}",
        summary.chunk_count,
        summary.nb_chunks_x,
        summary.nb_chunks_y,
        summary.layer_count,
        summary.output.display()
    );
    Ok(())
}
