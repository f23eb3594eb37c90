//! Trellis command-line interface.
//!
//! # Usage
//!
//! ```bash
//! # Render a container as CSV
//! trellis print -i lineitem.trl
//!
//! # Pushdown scan: project two columns, filter on price
//! trellis scan -i lineitem.trl -p "ORDERKEY,EXTENDEDPRICE" \
//!     -s ";EXTENDEDPRICE,gt,95000" -o result.trl
//!
//! # Convert a row container to the columnar layout
//! trellis transform -i lineitem.trl -o lineitem.trlc --to columnar
//!
//! # Time a synthetic sharded workload
//! trellis bench --num-rows 100000 --rows-per-obj 10000 --selectivity 0.1
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

/// Trellis pushdown-executor command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "trellis",
    version,
    about = "Scan, transform, and inspect Trellis containers"
)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Target layout for `transform`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetFormat {
    /// Row-oriented container.
    Row,
    /// Columnar container.
    Columnar,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a container as CSV (or a full dump).
    Print {
        /// Container file.
        #[arg(short, long)]
        input: PathBuf,

        /// Input is a columnar container.
        #[arg(long)]
        columnar: bool,

        /// Suppress the CSV header row.
        #[arg(long)]
        no_header: bool,

        /// Full dump with container and record headers.
        #[arg(long)]
        dump: bool,

        /// Stop after this many rows.
        #[arg(long, default_value_t = u64::MAX)]
        max_rows: u64,
    },

    /// Run a pushdown scan over one container file.
    Scan {
        /// Container file.
        #[arg(short, long)]
        input: PathBuf,

        /// Projected columns: `*`, `RID`, or a CSV of names.
        #[arg(short, long, default_value = "*")]
        project: String,

        /// Predicate chain: `;col,op,val;…` or `*` for none.
        #[arg(short, long, default_value = "*")]
        select: String,

        /// Input is a columnar container (projection only).
        #[arg(long)]
        columnar: bool,

        /// Write the result container here instead of printing CSV.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a container between the row and columnar layouts.
    Transform {
        /// Input container file.
        #[arg(short, long)]
        input: PathBuf,

        /// Output container file.
        #[arg(short, long)]
        output: PathBuf,

        /// Target layout.
        #[arg(long, value_enum)]
        to: TargetFormat,
    },

    /// Generate a synthetic sharded workload and time a scan over it.
    Bench {
        /// Total rows across all objects.
        #[arg(long)]
        num_rows: u32,

        /// Rows per generated object.
        #[arg(long)]
        rows_per_obj: u32,

        /// Scan in explicit row-number ranges of this size (0 = full
        /// object scans).
        #[arg(long, default_value_t = 0)]
        range_size: u32,

        /// Fraction of rows the predicate should select.
        #[arg(long, default_value_t = 0.1)]
        selectivity: f64,

        /// Pool label reported in the summary.
        #[arg(long, default_value = "local")]
        pool: String,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Print {
            input,
            columnar,
            no_header,
            dump,
            max_rows,
        } => commands::print_container(&input, columnar, !no_header, dump, max_rows),
        Command::Scan {
            input,
            project,
            select,
            columnar,
            output,
        } => commands::scan(&input, &project, &select, columnar, output.as_deref()),
        Command::Transform { input, output, to } => {
            commands::transform(&input, &output, matches!(to, TargetFormat::Columnar))
        }
        Command::Bench {
            num_rows,
            rows_per_obj,
            range_size,
            selectivity,
            pool,
        } => commands::bench(num_rows, rows_per_obj, range_size, selectivity, &pool),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("trellis_cli=debug,trellis_query=debug,trellis_format=debug")
    } else {
        EnvFilter::new("trellis_cli=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
