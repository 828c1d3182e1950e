use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Read spreadsheet worksheets as typed records", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the header row of a worksheet with column ordinals
    Headers(HeadersArgs),
    /// Preview the first few rows of a worksheet in a formatted table
    Preview(PreviewArgs),
    /// Write every row of a worksheet as a JSON array of objects
    Dump(DumpArgs),
}

/// Worksheet selection shared by every command.
#[derive(Debug, Args)]
pub struct SheetArgs {
    /// 1-based position of the worksheet to read
    #[arg(long = "sheet", conflicts_with = "sheet_name")]
    pub sheet: Option<usize>,
    /// Name of the worksheet to read
    #[arg(long = "sheet-name")]
    pub sheet_name: Option<String>,
}

#[derive(Debug, Args)]
pub struct HeadersArgs {
    /// Input workbook (xlsx, xlsm, xlsb, xls or ods)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    #[command(flatten)]
    pub sheet: SheetArgs,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input workbook (xlsx, xlsm, xlsb, xls or ods)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of data rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Treat the first used row as data instead of column names
    #[arg(long = "no-header")]
    pub no_header: bool,
    #[command(flatten)]
    pub sheet: SheetArgs,
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    /// Input workbook (xlsx, xlsm, xlsb, xls or ods)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output JSON file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Treat the first used row as data instead of column names
    #[arg(long = "no-header")]
    pub no_header: bool,
    /// YAML file with extraction options; explicit flags take precedence
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub sheet: SheetArgs,
}
