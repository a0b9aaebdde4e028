use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use interlacer::image_pipeline::{InterlaceConfig, InterlacePipeline, InterlaceSummary};
use interlacer::logger;
use interlacer::report::{ResultReporter, TerminalReporter};

use tracing::{error, info};

/// Combines two TIFF images by alternating pixels between them, like
/// interlaced video when switching on rows only.
#[derive(Parser, Debug)]
#[command(
    name = "interlacer",
    version,
    after_help = "Default: -r 1 (alternates every row). Set -r 0 or -c 0 to disable that axis.\n\n\
Examples:\n  \
interlacer a.tif b.tif              (alternate rows)\n  \
interlacer a.tif b.tif -c 1         (alternate columns)\n  \
interlacer a.tif b.tif -r 2 -c 2    (2x2 checkerboard)\n  \
interlacer a.tif b.tif -r 0 -c 0    (no interlacing, copy file1)"
)]
struct Args {
    /// First input image; wins photometric ties and fills the (0, 0) tile
    file1: PathBuf,

    /// Second input image
    file2: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "interlacedOutput.tif")]
    output: PathBuf,

    /// Switch images every N rows (0 disables)
    #[arg(short = 'r', long = "rows", value_name = "N")]
    rows: Option<u32>,

    /// Switch images every N columns (0 disables)
    #[arg(short = 'c', long = "cols", value_name = "N")]
    cols: Option<u32>,

    /// Show the output file in the system file browser afterwards
    #[arg(long)]
    reveal: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Composite rows on a single thread
    #[arg(long)]
    sequential: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> InterlaceConfig {
        let mut builder = InterlaceConfig::builder().parallel(!self.sequential);
        if let Some(rows) = self.rows {
            builder = builder.row_interval(rows);
        }
        if let Some(cols) = self.cols {
            builder = builder.col_interval(cols);
        }
        builder.build()
    }
}

fn run(args: &Args, reporter: &dyn ResultReporter) -> anyhow::Result<InterlaceSummary> {
    let config = args.config();
    info!("Mode: {}", config.spec.mode());

    let pipeline = InterlacePipeline::new(config);
    let summary = pipeline
        .interlace_files_with(&args.file1, &args.file2, &args.output, |path| reporter.loaded(path))
        .with_context(|| {
            format!(
                "interlacing {} and {} into {}",
                args.file1.display(),
                args.file2.display(),
                args.output.display()
            )
        })?;

    Ok(summary)
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(args.verbose);

    let color = !args.no_color && std::io::stdout().is_terminal();
    let reporter = TerminalReporter::new(color, args.reveal);
    println!("\n{}\n", reporter.banner());

    match run(&args, &reporter) {
        Ok(summary) => {
            reporter.success(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Interlace failed: {:#}", e);
            reporter.failure(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
