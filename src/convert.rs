//! Header renaming and date reformatting for one or more CSV files.
//!
//! [`convert_csv`] works on already-opened streams: it reads the header row,
//! builds a [`HeaderPlan`] from the schema, writes the renamed header, then
//! streams every data row through the plan. [`execute`] is the batch driver
//! behind the `convert` subcommand.

use std::{
    fs,
    io::{Read, Write},
    path::{Component, Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use csv::StringRecord;
use encoding_rs::Encoding;
use log::{debug, info, warn};

use crate::{
    cli::ConvertArgs,
    date_format::{convert_date, is_date_type, parse_date_format},
    error::CsvUtilError,
    io_utils::{self, InputFormat},
    schema::HeaderSchema,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Drop columns without a schema entry instead of keeping their name.
    pub skip_unmapped_columns: bool,
    pub delimiter: u8,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            skip_unmapped_columns: false,
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnAction {
    Skip,
    Pass,
    Date { layout: String },
}

/// Per-input-column decisions plus the renamed output header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPlan {
    actions: Vec<ColumnAction>,
    output_headers: Vec<String>,
}

impl HeaderPlan {
    pub fn build<'a, I>(headers: I, schema: &HeaderSchema, skip_unmapped_columns: bool) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut actions = Vec::new();
        let mut output_headers = Vec::new();
        for column in headers {
            match schema.get(column) {
                Some(entry) => {
                    output_headers.push(entry.name.clone());
                    if is_date_type(&entry.column_type) {
                        actions.push(ColumnAction::Date {
                            layout: parse_date_format(&entry.column_type),
                        });
                    } else {
                        actions.push(ColumnAction::Pass);
                    }
                }
                None if skip_unmapped_columns => actions.push(ColumnAction::Skip),
                None => {
                    output_headers.push(column.to_string());
                    actions.push(ColumnAction::Pass);
                }
            }
        }
        Self {
            actions,
            output_headers,
        }
    }

    pub fn actions(&self) -> &[ColumnAction] {
        &self.actions
    }

    pub fn output_headers(&self) -> &[String] {
        &self.output_headers
    }

    pub fn skipped_columns(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| matches!(action, ColumnAction::Skip))
            .count()
    }

    pub fn date_columns(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| matches!(action, ColumnAction::Date { .. }))
            .count()
    }

    /// Rebuilds `out` from scratch for `row`; returns the number of date
    /// fields that failed to parse and were emptied.
    fn apply(&self, row: &StringRecord, out: &mut StringRecord, row_number: usize) -> usize {
        out.clear();
        let mut failures = 0;
        for (idx, (field, action)) in row.iter().zip(&self.actions).enumerate() {
            match action {
                ColumnAction::Skip => {}
                ColumnAction::Pass => out.push_field(field),
                ColumnAction::Date { layout } => match convert_date(field, layout) {
                    Ok(converted) => out.push_field(&converted),
                    Err(err) => {
                        warn!("Row {row_number} column {}: {err}", idx + 1);
                        failures += 1;
                        out.push_field("");
                    }
                },
            }
        }
        failures
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub rows: usize,
    pub output_columns: usize,
    pub skipped_columns: usize,
    pub date_failures: usize,
}

/// Converts one CSV stream. The writer is flushed on every exit path, so rows
/// written before a read error are kept.
pub fn convert_csv<R, W>(
    input: R,
    output: W,
    schema: &HeaderSchema,
    options: &ConvertOptions,
) -> Result<ConvertSummary>
where
    R: Read,
    W: Write,
{
    let mut reader = io_utils::open_csv_reader(input, options.delimiter, false);
    let mut writer = io_utils::open_csv_writer(output, options.delimiter);
    let result = convert_records(&mut reader, &mut writer, schema, options);
    let flushed = writer.flush().context("Flushing output");
    let summary = result?;
    flushed?;
    Ok(summary)
}

fn convert_records<R, W>(
    reader: &mut csv::Reader<R>,
    writer: &mut csv::Writer<W>,
    schema: &HeaderSchema,
    options: &ConvertOptions,
) -> Result<ConvertSummary>
where
    R: Read,
    W: Write,
{
    let mut header = StringRecord::new();
    if !reader
        .read_record(&mut header)
        .context("Reading header row")?
    {
        return Err(CsvUtilError::MissingHeader.into());
    }

    let plan = HeaderPlan::build(header.iter(), schema, options.skip_unmapped_columns);
    debug!(
        "Header plan: {} output column(s), {} skipped, {} date column(s)",
        plan.output_headers().len(),
        plan.skipped_columns(),
        plan.date_columns()
    );
    writer
        .write_record(plan.output_headers())
        .context("Writing output header")?;

    let mut summary = ConvertSummary {
        output_columns: plan.output_headers().len(),
        skipped_columns: plan.skipped_columns(),
        ..ConvertSummary::default()
    };
    let mut row = StringRecord::new();
    let mut out = StringRecord::with_capacity(0, summary.output_columns);
    loop {
        let row_number = summary.rows + 2;
        if !reader
            .read_record(&mut row)
            .with_context(|| format!("Reading row {row_number}"))?
        {
            break;
        }
        summary.date_failures += plan.apply(&row, &mut out, row_number);
        writer
            .write_record(&out)
            .with_context(|| format!("Writing row {row_number}"))?;
        summary.rows += 1;
    }
    Ok(summary)
}

/// Runs the `convert` subcommand: every input is converted into `output_dir`
/// in order, stopping at the first failure.
pub fn execute(args: &ConvertArgs, format: &InputFormat) -> Result<()> {
    let (inputs, schema_path) = args
        .inputs_and_schema()
        .ok_or_else(|| anyhow!("Needs at least one CSV file and a schema file"))?;
    ensure_output_dir(&args.output_dir)?;

    let schema = HeaderSchema::load(schema_path, format.encoding, format.delimiter)?;
    info!(
        "Loaded {} schema entr(ies) from {:?} (encoding {}, delimiter '{}')",
        schema.len(),
        schema_path,
        format.encoding.name(),
        crate::printable_delimiter(format.delimiter)
    );

    let options = ConvertOptions {
        skip_unmapped_columns: args.skip_empty,
        delimiter: format.delimiter,
    };
    for input in inputs {
        let output = output_file_path(input, &args.output_dir)?;
        info!("Converting {:?} -> {:?}", input, output);
        let summary = convert_file(input, &output, &schema, format.encoding, &options)
            .with_context(|| format!("Converting {input:?}"))?;
        if summary.date_failures > 0 {
            warn!(
                "{} date field(s) in {:?} could not be parsed and were left empty",
                summary.date_failures, input
            );
        }
        info!(
            "✓ Wrote {} row(s) across {} column(s) to {:?}",
            summary.rows, summary.output_columns, output
        );
    }
    Ok(())
}

fn convert_file(
    input: &Path,
    output: &Path,
    schema: &HeaderSchema,
    encoding: &'static Encoding,
    options: &ConvertOptions,
) -> Result<ConvertSummary> {
    let reader = io_utils::open_input(input, encoding)?;
    let writer = io_utils::open_output(Some(output))?;
    convert_csv(reader, writer, schema, options)
}

pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    let metadata =
        fs::metadata(dir).with_context(|| format!("Inspecting output directory {dir:?}"))?;
    if !metadata.is_dir() {
        return Err(CsvUtilError::NotADirectory(dir.to_path_buf()).into());
    }
    Ok(())
}

/// Places `input`'s file name under `output_dir`, refusing to overwrite the
/// input itself.
pub fn output_file_path(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    if io_utils::is_dash(input) {
        return Err(anyhow!("Reading from stdin is not supported by convert"));
    }
    let file_name = input
        .file_name()
        .ok_or_else(|| anyhow!("Input path {input:?} has no file name"))?;
    let output = output_dir.join(file_name);
    if same_file(input, &output) {
        return Err(CsvUtilError::SameOutputFile {
            input: input.to_path_buf(),
            output,
        }
        .into());
    }
    Ok(output)
}

fn same_file(left: &Path, right: &Path) -> bool {
    if lexical_components(left) == lexical_components(right) {
        return true;
    }
    match (fs::canonicalize(left), fs::canonicalize(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

fn lexical_components(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}
