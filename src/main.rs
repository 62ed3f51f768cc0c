//! Command-line interface for the imvbench workload tooling.
//!
//! ```bash
//! # Interleave writes into a select workload under match budgets
//! imvbench-workload match \
//!   --write-file write_statements.sql \
//!   --select-file imv_test_workload.sql \
//!   --max-writes-per-table 8 \
//!   --max-matches-per-select 4 \
//!   --max-total-matches 500 \
//!   --output-file matched_workload.sql
//!
//! # Strip unsupported clauses from the select workload in place
//! imvbench-workload clean-reads --filename imv_test_workload.sql --dry-run
//!
//! # Pull the write statements out of a collected workload CSV
//! imvbench-workload filter-writes \
//!   --input workload.csv --output write_statements.sql --format sql
//!
//! # Turn a dbgen refresh stream into SQL
//! imvbench-workload refresh-to-sql \
//!   --update-dir /data/updates --stream 1 --output refresh_1.sql
//! ```

//Vendor Imports
#[macro_use]
extern crate log;
extern crate simplelog;
use clap::{Parser, Subcommand, ValueEnum};
use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode};
use std::error::Error;
use std::path::PathBuf;
use std::process;

//Application Imports
use imvbenchlib::cleaner::StatementCleaner;
use imvbenchlib::filter::{FilterFormat, WriteFilter};
use imvbenchlib::refresh::RefreshConverter;
use imvbenchlib::workload::objects::MatchBudget;
use imvbenchlib::workload::WorkloadPipeline;

#[derive(Parser)]
#[command(name = "imvbench-workload")]
#[command(about = "Workload preparation and read/write matching for IMV benchmarking")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interleave write statements into a select workload under match budgets
    Match {
        /// File containing INSERT/UPDATE/DELETE statements
        #[arg(long)]
        write_file: PathBuf,

        /// File containing SELECT statements
        #[arg(long)]
        select_file: PathBuf,

        /// Cap on matched writes targeting any single table
        #[arg(long)]
        max_writes_per_table: u32,

        /// Cap on writes attached to one select
        #[arg(long)]
        max_matches_per_select: u32,

        /// Cap on total writes across the whole run
        #[arg(long)]
        max_total_matches: u32,

        /// Destination for the interleaved workload
        #[arg(long)]
        output_file: PathBuf,
    },

    /// Remove unsupported clauses from a select workload file in place
    CleanReads {
        /// SQL file to clean, one statement per line
        #[arg(long)]
        filename: PathBuf,

        /// Skip writing a .backup copy before modifying
        #[arg(long)]
        no_backup: bool,

        /// Report what would change without modifying the file
        #[arg(long)]
        dry_run: bool,
    },

    /// Extract the write statements from a collected workload CSV
    FilterWrites {
        /// Input workload CSV file
        #[arg(long)]
        input: PathBuf,

        /// Output file for the write statements
        #[arg(long)]
        output: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },

    /// Convert TPC-H refresh stream files into SQL statements
    RefreshToSql {
        /// Directory containing the dbgen update files
        #[arg(long)]
        update_dir: PathBuf,

        /// Update stream number
        #[arg(long)]
        stream: u32,

        /// Output SQL file
        #[arg(long)]
        output: PathBuf,

        /// Field delimiter used in the data files
        #[arg(long, default_value_t = '|')]
        delimiter: char,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Csv,
    Sql,
}

impl From<OutputFormat> for FilterFormat {
    fn from(format: OutputFormat) -> FilterFormat {
        match format {
            OutputFormat::Csv => FilterFormat::Csv,
            OutputFormat::Sql => FilterFormat::Sql,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .unwrap();

    if let Err(e) = run(cli.command) {
        error!("{}", e);
        let mut cause = e.source();
        while let Some(c) = cause {
            error!("  caused by: {}", c);
            cause = c.source();
        }
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Match {
            write_file,
            select_file,
            max_writes_per_table,
            max_matches_per_select,
            max_total_matches,
            output_file,
        } => {
            let budget = MatchBudget::new(
                max_writes_per_table,
                max_matches_per_select,
                max_total_matches,
            );
            let pipeline = WorkloadPipeline::new(budget);
            pipeline.run(&select_file, &write_file, &output_file)?;
            info!("Matched workload written to {}", output_file.display());
        }
        Commands::CleanReads {
            filename,
            no_backup,
            dry_run,
        } => {
            let cleaner = StatementCleaner::new(!no_backup, dry_run);
            cleaner.clean_file(&filename)?;
        }
        Commands::FilterWrites {
            input,
            output,
            format,
        } => {
            let filter = WriteFilter::new(format.into());
            filter.filter_file(&input, &output)?;
        }
        Commands::RefreshToSql {
            update_dir,
            stream,
            output,
            delimiter,
        } => {
            let converter = RefreshConverter::new(update_dir, stream, delimiter);
            converter.convert(&output)?;
        }
    }
    Ok(())
}
