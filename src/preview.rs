use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::PreviewArgs,
    column_labels,
    table::{self, TableCell},
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let options = crate::resolve_options(None, args.no_header, &args.sheet)?;
    let has_header = options.has_header;
    let extractor = crate::open_extractor(&args.input, options)?;
    let header = if has_header {
        Some(extractor.header_index()?)
    } else {
        None
    };
    let mut rows = extractor
        .extract_with(|row| row.cells().collect::<Vec<_>>())
        .with_context(|| format!("Reading rows from {:?}", args.input))?;
    rows.truncate(args.rows);

    let columns = column_labels(header.as_ref(), &rows);
    let headers = columns
        .iter()
        .map(|(_, label)| label.clone())
        .collect::<Vec<_>>();
    let cells = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|(ordinal, _)| {
                    let value = row
                        .iter()
                        .find(|(col, _)| col == ordinal)
                        .map(|(_, value)| value);
                    TableCell::from_value(value)
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    table::print_table(&headers, &cells);
    info!("Displayed {} row(s) from {:?}", cells.len(), args.input);
    Ok(())
}
