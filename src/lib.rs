pub mod cell;
pub mod cli;
pub mod coerce;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod field;
pub mod header;
pub mod io_utils;
pub mod mapping;
pub mod preview;
pub mod schema;
pub mod setter;
pub mod table;

use std::{
    collections::HashMap,
    env,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    sync::OnceLock,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

pub use crate::{
    cell::CellValue,
    coerce::{Coerced, Kind, Shape},
    config::{ExtractOptions, SheetSelector},
    error::{BoxError, CoercionError, ExportError, ExtractError},
    extract::{Extractor, ExtractorBuilder},
    field::CellType,
    header::HeaderIndex,
    io_utils::{Row, Worksheet},
    mapping::FieldMapping,
    schema::{Field, Record, ResolvedSchema},
    setter::Setter,
};

use crate::cli::{Cli, Commands, SheetArgs};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sheet_records", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Headers(args) => handle_headers(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Dump(args) => handle_dump(&args),
    }
}

fn handle_headers(args: &cli::HeadersArgs) -> Result<()> {
    let options = resolve_options(None, false, &args.sheet)?;
    let extractor = open_extractor(&args.input, options)?;
    let header = extractor
        .header_index()
        .with_context(|| format!("Reading header row of {:?}", args.input))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (ordinal, name) in header.entries() {
        writeln!(out, "{ordinal}\t{name}").context("Writing header listing")?;
    }
    info!("Listed {} header column(s) from {:?}", header.len(), args.input);
    Ok(())
}

fn handle_dump(args: &cli::DumpArgs) -> Result<()> {
    let options = resolve_options(args.config.as_deref(), args.no_header, &args.sheet)?;
    let has_header = options.has_header;
    let extractor = open_extractor(&args.input, options)?;
    let names = if has_header {
        extractor
            .header_index()?
            .entries()
            .into_iter()
            .map(|(ordinal, name)| (ordinal, name.to_string()))
            .collect::<HashMap<_, _>>()
    } else {
        HashMap::new()
    };
    let records = extractor
        .extract_with(|row| {
            let object = row
                .cells()
                .map(|(ordinal, value)| {
                    let key = names
                        .get(&ordinal)
                        .cloned()
                        .unwrap_or_else(|| synthetic_label(ordinal));
                    (key, value.to_json())
                })
                .collect::<serde_json::Map<_, _>>();
            serde_json::Value::Object(object)
        })
        .with_context(|| format!("Reading rows from {:?}", args.input))?;

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
        )),
        None => Box::new(io::stdout()),
    };
    serde_json::to_writer_pretty(&mut writer, &records).context("Writing JSON output")?;
    writeln!(writer).context("Writing JSON output")?;
    writer.flush().context("Flushing JSON output")?;
    info!("Dumped {} row(s) from {:?}", records.len(), args.input);
    Ok(())
}

/// Merge a YAML options file (if any) with command line overrides.
pub(crate) fn resolve_options(
    config: Option<&Path>,
    no_header: bool,
    sheet: &SheetArgs,
) -> Result<ExtractOptions> {
    let mut options = match config {
        Some(path) => ExtractOptions::load(path)
            .with_context(|| format!("Loading extraction options from {path:?}"))?,
        None => ExtractOptions::default(),
    };
    if no_header {
        options.has_header = false;
    }
    if let Some(index) = sheet.sheet {
        options.worksheet = SheetSelector::Index(index);
    }
    if let Some(name) = &sheet.sheet_name {
        options.worksheet = SheetSelector::Name(name.clone());
    }
    debug!("Extraction options: {options:?}");
    Ok(options)
}

pub(crate) fn open_extractor(path: &Path, options: ExtractOptions) -> Result<Extractor> {
    Extractor::builder()
        .options(options)
        .from_path(path)
        .with_context(|| format!("Opening workbook {path:?}"))
}

/// Column labels for a set of rows: header names where known, otherwise
/// `column_N`, ordered by ordinal.
pub(crate) fn column_labels(
    header: Option<&HeaderIndex>,
    rows: &[Vec<(u32, CellValue)>],
) -> Vec<(u32, String)> {
    let mut labels = header
        .map(|h| {
            h.entries()
                .into_iter()
                .map(|(ordinal, name)| (ordinal, name.to_string()))
                .collect::<HashMap<_, _>>()
        })
        .unwrap_or_default();
    for (ordinal, _) in rows.iter().flatten() {
        labels
            .entry(*ordinal)
            .or_insert_with(|| synthetic_label(*ordinal));
    }
    let mut columns = labels.into_iter().collect::<Vec<_>>();
    columns.sort_by_key(|(ordinal, _)| *ordinal);
    columns
}

fn synthetic_label(ordinal: u32) -> String {
    format!("column_{ordinal}")
}
