use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use turntable::{ingest, CallLog, DelimitedOptions, DelimitedSource, SortOrder, TrackedTable};

#[derive(Parser, Debug)]
#[command(
    name = "turntable",
    about = "Load, transform, and inspect delimited tables with a replayable call history"
)]
struct Cli {
    /// Print delimited text instead of a formatted grid
    #[arg(long, global = true)]
    csv: bool,

    /// Also print the recorded call history as JSON
    #[arg(long, global = true)]
    history: bool,

    /// Field delimiter of the input files
    #[arg(long, global = true, default_value = ",")]
    delimiter: char,

    /// Treat input files as headerless
    #[arg(long, global = true)]
    no_headers: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a file and print it
    Show {
        /// File to load
        file: PathBuf,
    },

    /// Keep only the named columns, in the order given
    Select {
        file: PathBuf,

        /// Comma-separated column names
        #[arg(long, required = true, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Sort rows by one column
    Sort {
        file: PathBuf,

        /// Column to sort by
        #[arg(long)]
        by: String,

        /// asc or desc
        #[arg(long, default_value = "asc")]
        order: SortOrder,
    },

    /// Keep rows whose column matches a regular expression in full
    Filter {
        file: PathBuf,

        #[arg(long)]
        column: String,

        #[arg(long)]
        pattern: String,
    },

    /// Equi-join two files on column indexes
    Join {
        left: PathBuf,
        right: PathBuf,

        /// Left and right join columns, like 0,2
        #[arg(long, value_name = "L,R")]
        on: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = DelimitedOptions {
        delimiter: cli.delimiter,
        has_headers: !cli.no_headers,
    };
    let log = Arc::new(CallLog::new());

    let tracked = match &cli.command {
        Commands::Show { file } => load(file, options, &log)?,
        Commands::Select { file, columns } => {
            let mut tracked = load(file, options, &log)?;
            tracked.select(columns)?;
            tracked
        }
        Commands::Sort { file, by, order } => {
            let mut tracked = load(file, options, &log)?;
            tracked.sort(by, *order)?;
            tracked
        }
        Commands::Filter {
            file,
            column,
            pattern,
        } => {
            let mut tracked = load(file, options, &log)?;
            tracked.filter(column, pattern)?;
            tracked
        }
        Commands::Join { left, right, on } => {
            let (left_col, right_col) = parse_on(on)?;
            let mut tracked = load(left, options, &log)?;
            let mut source = DelimitedSource::open(right, options)
                .with_context(|| format!("failed to open {}", right.display()))?;
            let right_table = ingest::load(&mut source)?;
            tracked.join(&right_table, left_col, right_col)?;
            tracked
        }
    };

    let rendered = if cli.csv {
        tracked.table().to_delimited()?
    } else {
        tracked.table().to_text()?
    };
    print!("{rendered}");

    if cli.history {
        println!("{}", tracked.export_history()?);
    }

    Ok(())
}

fn load(file: &Path, options: DelimitedOptions, log: &Arc<CallLog>) -> Result<TrackedTable> {
    TrackedTable::from_delimited(file, options, Arc::clone(log))
        .with_context(|| format!("failed to load {}", file.display()))
}

fn parse_on(on: &str) -> Result<(usize, usize)> {
    let (left, right) = on
        .split_once(',')
        .context("--on expects two comma-separated column indexes, like 0,2")?;
    Ok((
        left.trim().parse().context("left join column")?,
        right.trim().parse().context("right join column")?,
    ))
}
