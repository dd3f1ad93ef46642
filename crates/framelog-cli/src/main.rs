use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use framelog::{
    PipelineConfig, RecordSource, read_records, write_records, write_records_sequential,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Timing harness for the framelog write/read pipelines
#[derive(Parser)]
#[command(name = "framelog", version)]
struct Cli {
    /// Path of the framed data file to write (and optionally read back)
    data_file: PathBuf,

    /// Number of records to generate
    #[arg(long, default_value_t = 1_000_000)]
    count: u64,

    /// Producer pool size (default: available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// Capacity of the pending write queue
    #[arg(long, default_value_t = 1024)]
    queue_capacity: usize,

    /// Write one record at a time instead of using the producer pool
    #[arg(long)]
    sequential: bool,

    /// Compress each payload with zstd before framing
    #[arg(long)]
    compress: bool,

    /// Scan the file back and fan decoding out after writing
    #[arg(long)]
    read_back: bool,

    /// Randomize record fields instead of using the fixed record
    #[arg(long)]
    random: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    if cli.compress && cli.read_back {
        anyhow::bail!("--read-back expects uncompressed frames; drop --compress to scan back");
    }

    let mut config = PipelineConfig {
        queue_capacity: cli.queue_capacity,
        source: if cli.random {
            RecordSource::Random
        } else {
            RecordSource::Fixed
        },
        compress: cli.compress,
        decode_delay: true,
        ..Default::default()
    };
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }

    let start = Instant::now();
    let written = if cli.sequential {
        write_records_sequential(&cli.data_file, cli.count, &config).await?
    } else {
        write_records(&cli.data_file, cli.count, &config).await?
    };
    info!(
        frames = written.frames,
        elapsed = ?start.elapsed(),
        mode = if cli.sequential { "sequential" } else { "concurrent" },
        "Write phase complete"
    );

    if cli.read_back {
        let start = Instant::now();
        let summary = read_records(&cli.data_file, &config).await?;
        info!(
            frames = summary.frames,
            succeeded = summary.succeeded,
            elapsed = ?start.elapsed(),
            "Read phase complete"
        );
    }

    Ok(())
}
