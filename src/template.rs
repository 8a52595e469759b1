use std::{
    io::{Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::StringRecord;
use log::info;

use crate::{
    cli::TemplateArgs,
    error::CsvUtilError,
    io_utils::{self, InputFormat},
};

pub fn execute(args: &TemplateArgs, format: &InputFormat) -> Result<()> {
    if !has_csv_extension(&args.input) {
        return Err(CsvUtilError::NotCsv(args.input.clone()).into());
    }
    let reader = io_utils::open_input(&args.input, format.encoding)?;
    let writer = io_utils::open_output(args.output.as_deref())?;
    let columns = generate_template(reader, writer, format.delimiter)
        .with_context(|| format!("Generating template from {:?}", args.input))?;
    info!(
        "Template for {} column(s) from {:?} written to {}",
        columns,
        args.input,
        args.output
            .as_ref()
            .map(|p| format!("{p:?}"))
            .unwrap_or_else(|| "stdout".to_string())
    );
    Ok(())
}

/// Writes one `column,` record per header column, ready to be filled in with
/// replacement names. Returns the number of columns.
pub fn generate_template<R, W>(input: R, output: W, delimiter: u8) -> Result<usize>
where
    R: Read,
    W: Write,
{
    let mut reader = io_utils::open_csv_reader(input, delimiter, true);
    let mut writer = io_utils::open_csv_writer(output, delimiter);

    let mut header = StringRecord::new();
    let found = reader
        .read_record(&mut header)
        .context("Reading header row");
    let result = match found {
        Ok(true) => header.iter().try_for_each(|column| {
            writer
                .write_record([column, ""])
                .with_context(|| format!("Writing template entry for '{column}'"))
        }),
        Ok(false) => Err(CsvUtilError::MissingHeader.into()),
        Err(err) => Err(err),
    };
    let flushed = writer.flush().context("Flushing template output");
    result?;
    flushed?;
    Ok(header.len())
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
