use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::{config::RoundingMode, io_utils::parse_delimiter};

#[derive(Debug, Parser)]
#[command(author, version, about = "Consolidate sales spreadsheets into one master view", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve the directory holding the four source files
    Locate(LocateArgs),
    /// Run the full pipeline and show the master view
    Run(RunArgs),
    /// List the columns of the master view and where each comes from
    Columns,
}

/// Flags shared by every command that touches the source files.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// YAML configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Candidate data directory, probed in the order given (repeatable)
    #[arg(long = "search-path", action = clap::ArgAction::Append)]
    pub search_path: Vec<PathBuf>,
    /// Base directory for relative search-path entries
    #[arg(long = "working-dir")]
    pub working_dir: Option<PathBuf>,
    /// File name of the customers table
    #[arg(long)]
    pub clientes: Option<String>,
    /// File name of the products table
    #[arg(long)]
    pub productos: Option<String>,
    /// File name of the sales table
    #[arg(long)]
    pub ventas: Option<String>,
    /// File name of the sale line items table
    #[arg(long)]
    pub detalle: Option<String>,
}

#[derive(Debug, Args)]
pub struct LocateArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Margin over cost used to back the unit cost out of the price (e.g. 0.30)
    #[arg(long)]
    pub margin: Option<Decimal>,
    /// Rounding convention for the unit cost
    #[arg(long, value_enum)]
    pub rounding: Option<RoundingMode>,
    /// Delimiter for .csv/.tsv inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Number of master rows to preview
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Emit every master row as a JSON object per line instead of tables
    #[arg(long)]
    pub json: bool,
}
